#![allow(dead_code)]

use std::path::PathBuf;

use csv_collector::config::{ColumnSpec, CsvOptions, SourceLocation, SourceSpec};
use url::Url;

/// Builder for `SourceSpec` to simplify test setup.
///
/// Produces the validated type directly; config validation has its own tests.
pub struct SourceSpecBuilder {
    source: SourceSpec,
}

impl SourceSpecBuilder {
    /// Source reading the local file at `path`.
    pub fn file(name: &str, path: impl Into<PathBuf>) -> Self {
        Self::with_location(name, SourceLocation::File(path.into()))
    }

    /// Source fetched from `url`. Panics on an unparsable URL.
    pub fn http(name: &str, url: &str) -> Self {
        let url = Url::parse(url).expect("test url must parse");
        Self::with_location(name, SourceLocation::Http(url))
    }

    fn with_location(name: &str, location: SourceLocation) -> Self {
        Self {
            source: SourceSpec {
                name: name.to_string(),
                location,
                interval_minutes: 0,
                csv: CsvOptions {
                    skip_rows: 0,
                    delimiter: b',',
                    create_table_options: String::new(),
                    columns: vec![],
                },
            },
        }
    }

    pub fn column(mut self, index: usize, name: &str, sql_type: &str) -> Self {
        self.source.csv.columns.push(ColumnBuilder::new(index, name, sql_type).build());
        self
    }

    pub fn column_spec(mut self, column: ColumnSpec) -> Self {
        self.source.csv.columns.push(column);
        self
    }

    pub fn skip_rows(mut self, rows: usize) -> Self {
        self.source.csv.skip_rows = rows;
        self
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.source.csv.delimiter = delimiter;
        self
    }

    pub fn create_table_options(mut self, opts: &str) -> Self {
        self.source.csv.create_table_options = opts.to_string();
        self
    }

    pub fn interval_minutes(mut self, minutes: u64) -> Self {
        self.source.interval_minutes = minutes;
        self
    }

    pub fn build(self) -> SourceSpec {
        self.source
    }
}

/// Builder for `ColumnSpec`.
pub struct ColumnBuilder {
    column: ColumnSpec,
}

impl ColumnBuilder {
    pub fn new(index: usize, name: &str, sql_type: &str) -> Self {
        Self {
            column: ColumnSpec {
                index,
                name: name.to_string(),
                sql_type: sql_type.to_string(),
                formatter: None,
            },
        }
    }

    pub fn formatter(mut self, expr: &str) -> Self {
        self.column.formatter = Some(expr.to_string());
        self
    }

    pub fn build(self) -> ColumnSpec {
        self.column
    }
}

/// The `sensors` source used across tests: `ts` from index 0, `val` from
/// index 1, one header row.
pub fn sensors_source(path: impl Into<PathBuf>) -> SourceSpec {
    SourceSpecBuilder::file("sensors", path)
        .skip_rows(1)
        .column(0, "ts", "DATE")
        .column(1, "val", "INT")
        .build()
}
