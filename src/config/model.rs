// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

pub const DEFAULT_DB_USERNAME: &str = "root";
pub const DEFAULT_DB_ADDRESS: &str = "localhost:3306";
pub const DEFAULT_DB_PORT: u16 = 3306;

/// Top-level configuration exactly as read from disk.
///
/// ```json
/// {
///   "db_info": { "username": "root", "password": "", "dbname": "metrics" },
///   "devices": [
///     {
///       "name": "sensors",
///       "filepath": "data/sensors.csv",
///       "interval": 5,
///       "csv_options": {
///         "skip_rows": 1,
///         "create_table_opts": "PRIMARY KEY (ts)",
///         "columns": [
///           { "column_index": 0, "name": "ts", "sql_type": "DATETIME",
///             "sql_formatter": "STR_TO_DATE(?, '%Y-%m-%d')" },
///           { "column_index": 1, "name": "val", "sql_type": "INT" }
///         ]
///       }
///     }
///   ]
/// }
/// ```
///
/// Nothing here is trusted until it has gone through
/// `ConfigFile::try_from`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub db_info: RawDbInfo,

    #[serde(default)]
    pub devices: Vec<RawDevice>,

    #[serde(default)]
    pub settings: Settings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDbInfo {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, rename = "dbname")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDevice {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub filepath: String,

    #[serde(default)]
    pub address: String,

    /// Repeat interval in minutes; 0 means run once.
    #[serde(default)]
    pub interval: u64,

    #[serde(default)]
    pub csv_options: RawCsvOptions,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCsvOptions {
    #[serde(default)]
    pub skip_rows: usize,

    #[serde(default)]
    pub delimiter: String,

    #[serde(default, rename = "create_table_opts")]
    pub create_table_options: String,

    #[serde(default)]
    pub columns: Vec<RawColumn>,
}

/// `column_index` stays signed here so a negative value is reported as a
/// configuration error instead of a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawColumn {
    #[serde(default)]
    pub column_index: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sql_type: String,
    #[serde(default)]
    pub sql_formatter: String,
}

/// Timeouts applied to every suspension point of a source run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Settings {
    #[serde(default = "default_operation_timeout_secs")]
    pub operation_timeout_secs: u64,

    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

fn default_operation_timeout_secs() -> u64 {
    30
}

fn default_fetch_timeout_secs() -> u64 {
    15
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            operation_timeout_secs: default_operation_timeout_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

impl Settings {
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Validated configuration.
///
/// Can only be obtained through `TryFrom<RawConfigFile>` (or
/// [`ConfigFile::from_raw`]), so holding one means every invariant has been
/// checked. It is never mutated afterwards; periodic re-runs share it.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub db_info: DbConnectionInfo,
    pub sources: Vec<SourceSpec>,
    pub settings: Settings,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        db_info: DbConnectionInfo,
        sources: Vec<SourceSpec>,
        settings: Settings,
    ) -> Self {
        Self {
            db_info,
            sources,
            settings,
        }
    }

    pub fn has_periodic_sources(&self) -> bool {
        self.sources.iter().any(|s| s.interval_minutes > 0)
    }
}

/// Database connection info with defaults already applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConnectionInfo {
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database: String,
}

impl DbConnectionInfo {
    pub fn address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Where a source's CSV bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    File(PathBuf),
    Http(Url),
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceLocation::File(path) => write!(f, "file {}", path.display()),
            SourceLocation::Http(url) => write!(f, "url {url}"),
        }
    }
}

/// One device: a CSV origin mapped onto a table named after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub name: String,
    pub location: SourceLocation,
    pub interval_minutes: u64,
    pub csv: CsvOptions,
}

impl SourceSpec {
    /// The repeat period, or `None` for one-shot sources.
    pub fn interval(&self) -> Option<Duration> {
        (self.interval_minutes > 0).then(|| Duration::from_secs(self.interval_minutes * 60))
    }

    pub fn column_count(&self) -> usize {
        self.csv.columns.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvOptions {
    pub skip_rows: usize,
    pub delimiter: u8,
    pub create_table_options: String,
    pub columns: Vec<ColumnSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub index: usize,
    pub name: String,
    pub sql_type: String,
    pub formatter: Option<String>,
}
