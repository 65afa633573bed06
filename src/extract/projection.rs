// src/extract/projection.rs

use std::io::{self, Read};

use csv::{ByteRecord, ReaderBuilder};
use tracing::trace;

use crate::config::CsvOptions;
use crate::errors::{CollectorError, Result};

/// Projected values of one extraction pass, flattened row-major in column
/// declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    pub values: Vec<String>,
    pub column_count: usize,
}

impl Extracted {
    pub fn row_count(&self) -> usize {
        if self.column_count == 0 {
            0
        } else {
            self.values.len() / self.column_count
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Parse `reader` as delimited text and project the configured columns.
///
/// Records may have any number of fields and need not be UTF-8; only the
/// projected fields are decoded, lossily. The first `skip_rows` records are
/// discarded; running out of input while skipping is an error. Row indices in
/// errors count from the first record after the skipped ones.
pub fn project_records<R: Read>(reader: R, opts: &CsvOptions) -> Result<Extracted> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(opts.delimiter)
        .from_reader(reader);

    let mut record = ByteRecord::new();

    for row in 0..opts.skip_rows {
        let more = rdr
            .read_byte_record(&mut record)
            .map_err(|source| CollectorError::SkipRow { row, source })?;
        if !more {
            return Err(CollectorError::SkipRow {
                row,
                source: io::Error::new(io::ErrorKind::UnexpectedEof, "input ended").into(),
            });
        }
    }

    let column_count = opts.columns.len();
    let mut values = Vec::new();

    for row in 0.. {
        let more = rdr
            .read_byte_record(&mut record)
            .map_err(|source| CollectorError::CsvRead { row, source })?;
        if !more {
            break;
        }

        for col in &opts.columns {
            let field = record
                .get(col.index)
                .ok_or_else(|| CollectorError::ColumnOutOfRange {
                    row,
                    column: col.name.clone(),
                    index: col.index,
                    len: record.len(),
                })?;
            values.push(String::from_utf8_lossy(field).into_owned());
        }
    }

    trace!(values = values.len(), "projected csv records");

    Ok(Extracted {
        values,
        column_count,
    })
}
