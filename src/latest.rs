use anyhow::{Context, Result};
use reqwest::blocking::Response;
use std::io::Read;

use crate::search::FileRecord;

/// Content of the newest file matching a filename query.
///
/// The body is not buffered: read it as a stream through [`Read`], or take it
/// whole with [`LatestFile::bytes`] / [`LatestFile::text`].
#[derive(Debug)]
pub struct LatestFile {
    record: FileRecord,
    response: Response,
}

impl LatestFile {
    pub(crate) fn new(record: FileRecord, response: Response) -> Self {
        Self { record, response }
    }

    /// The search record the content was fetched for.
    pub fn record(&self) -> &FileRecord {
        &self.record
    }

    pub fn content_length(&self) -> Option<u64> {
        self.response.content_length()
    }

    pub fn bytes(self) -> Result<Vec<u8>> {
        let file_id = self.record.file_id;
        let body = self
            .response
            .bytes()
            .with_context(|| format!("failed to read content of file {}", file_id))?;
        Ok(body.to_vec())
    }

    pub fn text(self) -> Result<String> {
        let file_id = self.record.file_id;
        self.response
            .text()
            .with_context(|| format!("failed to read content of file {}", file_id))
    }

    pub fn into_parts(self) -> (FileRecord, Response) {
        (self.record, self.response)
    }
}

impl Read for LatestFile {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.response.read(buf)
    }
}
