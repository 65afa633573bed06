// src/config/validate.rs

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::config::model::{
    ColumnSpec, ConfigFile, CsvOptions, DbConnectionInfo, RawColumn, RawConfigFile, RawDbInfo,
    RawDevice, SourceLocation, SourceSpec, DEFAULT_DB_ADDRESS, DEFAULT_DB_PORT, DEFAULT_DB_USERNAME,
};
use crate::errors::{CollectorError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::sql::PLACEHOLDER;

static SQL_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").expect("identifier regex is valid")
});

const DEFAULT_DELIMITER: u8 = b',';

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = CollectorError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        ConfigFile::from_raw(raw, &RealFileSystem)
    }
}

impl ConfigFile {
    /// Validate `raw`, checking local source files through `fs`.
    pub fn from_raw(raw: RawConfigFile, fs: &dyn FileSystem) -> Result<Self> {
        if raw.devices.is_empty() {
            return Err(config_error("no devices provided".to_string()));
        }

        let db_info = validate_db_info(&raw.db_info)?;

        let mut seen = HashSet::new();
        let mut sources = Vec::with_capacity(raw.devices.len());
        for (i, device) in raw.devices.iter().enumerate() {
            let source = validate_device(device, i, fs)?;
            if !seen.insert(source.name.to_ascii_lowercase()) {
                return Err(config_error(format!(
                    "duplicate device name {:?} at json index {i}; each device needs its own table",
                    source.name
                )));
            }
            sources.push(source);
        }

        Ok(ConfigFile::new_unchecked(db_info, sources, raw.settings))
    }
}

fn config_error(msg: String) -> CollectorError {
    CollectorError::ConfigError(msg)
}

fn validate_db_info(raw: &RawDbInfo) -> Result<DbConnectionInfo> {
    if raw.name.is_empty() {
        return Err(config_error("no database name provided".to_string()));
    }

    let username = if raw.username.is_empty() {
        DEFAULT_DB_USERNAME.to_string()
    } else {
        raw.username.clone()
    };

    let address = if raw.address.is_empty() {
        DEFAULT_DB_ADDRESS
    } else {
        raw.address.as_str()
    };

    let (host, port) = split_host_port(address).ok_or_else(|| {
        config_error(format!(
            "database address {address:?} is not in host[:port] form"
        ))
    })?;

    Ok(DbConnectionInfo {
        username,
        password: raw.password.clone(),
        host: host.to_string(),
        port,
        database: raw.name.clone(),
    })
}

/// `host`, `host:port`, `[v6]` or `[v6]:port`; the port defaults to 3306.
/// A bare IPv6 literal is taken as a host without a port.
fn split_host_port(address: &str) -> Option<(&str, u16)> {
    let (host, port) = if let Some(rest) = address.strip_prefix('[') {
        let (host, tail) = rest.split_once(']')?;
        match tail {
            "" => (host, None),
            _ => (host, Some(tail.strip_prefix(':')?)),
        }
    } else if address.matches(':').count() > 1 {
        (address, None)
    } else {
        match address.split_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (address, None),
        }
    };

    let port = match port {
        Some(port) => port.parse::<u16>().ok()?,
        None => DEFAULT_DB_PORT,
    };

    (!host.is_empty()).then_some((host, port))
}

fn validate_device(device: &RawDevice, i: usize, fs: &dyn FileSystem) -> Result<SourceSpec> {
    if device.name.is_empty() {
        return Err(config_error(format!(
            "no device name specified at json index {i}"
        )));
    }

    if !SQL_IDENTIFIER.is_match(&device.name) {
        return Err(config_error(format!(
            "device name {:?} at json index {i} is not a valid table name",
            device.name
        )));
    }

    let location = validate_location(device, i, fs)?;

    let opts = &device.csv_options;
    if opts.columns.is_empty() {
        return Err(config_error(format!(
            "no columns specified for device {:?} at json index {i}",
            device.name
        )));
    }

    let delimiter = match opts.delimiter.as_bytes() {
        [] => DEFAULT_DELIMITER,
        [b] if b.is_ascii() => *b,
        _ => {
            return Err(config_error(format!(
                "csv delimiter {:?} for device {:?} is not valid at json index {i}",
                opts.delimiter, device.name
            )));
        }
    };

    let columns = validate_columns(&opts.columns).map_err(|e| {
        config_error(format!(
            "columns validation failed for device {:?} with error: {e}",
            device.name
        ))
    })?;

    Ok(SourceSpec {
        name: device.name.clone(),
        location,
        interval_minutes: device.interval,
        csv: CsvOptions {
            skip_rows: opts.skip_rows,
            delimiter,
            create_table_options: opts.create_table_options.trim().to_string(),
            columns,
        },
    })
}

fn validate_location(device: &RawDevice, i: usize, fs: &dyn FileSystem) -> Result<SourceLocation> {
    match (device.filepath.is_empty(), device.address.is_empty()) {
        (false, false) => Err(config_error(format!(
            "can't have both device data url address and data filepath set for device {:?} at json index {i}",
            device.name
        ))),
        (true, true) => Err(config_error(format!(
            "no device url address or filepath specified for device {:?} at json index {i}",
            device.name
        ))),
        (false, true) => {
            let path = Path::new(&device.filepath);
            if !fs.is_file(path) {
                return Err(config_error(format!(
                    "could not stat device data file path {:?} for device {:?} at json index {i}",
                    device.filepath, device.name
                )));
            }
            Ok(SourceLocation::File(path.to_path_buf()))
        }
        (true, false) => {
            let url = Url::parse(&device.address).map_err(|e| {
                config_error(format!(
                    "could not parse device data url address {:?} for device {:?} at json index {i} with error: {e}",
                    device.address, device.name
                ))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(config_error(format!(
                    "device data url address {:?} for device {:?} at json index {i} must use http or https",
                    device.address, device.name
                )));
            }
            Ok(SourceLocation::Http(url))
        }
    }
}

/// Validate a device's column list. The error string is wrapped with the
/// device name by the caller.
pub fn validate_columns(columns: &[RawColumn]) -> std::result::Result<Vec<ColumnSpec>, String> {
    if columns.is_empty() {
        return Err("column options are empty".to_string());
    }

    columns
        .iter()
        .enumerate()
        .map(|(i, col)| {
            if col.name.is_empty() {
                return Err(format!("column name cannot be empty at index {i}"));
            }

            let index = usize::try_from(col.column_index)
                .map_err(|_| format!("invalid index for column {:?}", col.name))?;

            if col.sql_type.is_empty() {
                return Err(format!("sql type for column {:?} is empty", col.name));
            }

            let formatter = match col.sql_formatter.trim() {
                "" => None,
                f if f.matches(PLACEHOLDER).count() == 1 => Some(f.to_string()),
                f => {
                    return Err(format!(
                        "sql formatter {f:?} for column {:?} must contain exactly one {PLACEHOLDER:?} placeholder",
                        col.name
                    ));
                }
            };

            Ok(ColumnSpec {
                index,
                name: col.name.clone(),
                sql_type: col.sql_type.clone(),
                formatter,
            })
        })
        .collect()
}
