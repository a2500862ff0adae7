use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::error::IoError;
use crate::domain::CustomerOrder;

/// Writes joined records as newline-delimited JSON
pub struct JsonLinesWriter<W> {
    writer: W,
    written: usize,
}

impl<W> JsonLinesWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Write one record as a single JSON line
    pub async fn write(&mut self, record: &CustomerOrder) -> Result<(), IoError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        self.writer.write_all(&line).await?;
        self.written += 1;
        Ok(())
    }

    /// Number of records written so far
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush buffered output and return the underlying writer
    pub async fn finish(mut self) -> Result<W, IoError> {
        self.writer.flush().await?;
        Ok(self.writer)
    }
}
