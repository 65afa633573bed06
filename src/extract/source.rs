// src/extract/source.rs

use std::io::{Cursor, Read};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use reqwest::Client;
use tracing::debug;

use crate::config::{SourceLocation, SourceSpec};
use crate::errors::{CollectorError, Result};
use crate::extract::projection::{project_records, Extracted};
use crate::fs::FileSystem;

/// An opened source, ready to be parsed.
pub type SourceReader = Box<dyn Read + Send>;

/// Opens sources and runs the projection over them.
///
/// Holds one HTTP client for the whole process; its request timeout comes
/// from configuration rather than any global default.
#[derive(Debug, Clone)]
pub struct Extractor {
    fs: Arc<dyn FileSystem>,
    http: Client,
}

impl Extractor {
    pub fn new(fs: Arc<dyn FileSystem>, fetch_timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(fetch_timeout).build()?;
        Ok(Self { fs, http })
    }

    /// Read the source to completion and return its projected values.
    pub async fn extract(&self, source: &SourceSpec) -> Result<Extracted> {
        let reader = self.open(&source.location).await?;
        let opts = source.csv.clone();

        // csv parsing is synchronous; keep it off the async workers.
        tokio::task::spawn_blocking(move || project_records(reader, &opts))
            .await
            .map_err(|e| CollectorError::Other(anyhow!("extraction task failed: {e}")))?
    }

    /// Open the byte stream behind `location`.
    pub async fn open(&self, location: &SourceLocation) -> Result<SourceReader> {
        match location {
            SourceLocation::File(path) => {
                debug!(path = %path.display(), "opening source file");
                Ok(self.fs.open_read(path)?)
            }
            SourceLocation::Http(url) => {
                debug!(%url, "fetching source over http");
                let body = self
                    .http
                    .get(url.clone())
                    .send()
                    .await?
                    .error_for_status()?
                    .bytes()
                    .await?;
                Ok(Box::new(Cursor::new(body)))
            }
        }
    }
}
