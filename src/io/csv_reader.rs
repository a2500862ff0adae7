use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tokio::fs::File;
use tokio_util::compat::TokioAsyncReadCompatExt;

use super::error::IoError;
use crate::domain::Customer;

/// Raw CSV row as read from a customer body
#[derive(Debug, Deserialize)]
struct RawCustomerRecord {
    id: u32,
    name: String,
}

impl RawCustomerRecord {
    fn parse(self) -> Result<Customer, IoError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(IoError::InvalidRecord(format!(
                "customer {} has an empty name",
                self.id
            )));
        }
        Ok(Customer::new(self.id, name))
    }
}

/// Async stream of customers from a CSV body with an `id,name` header
pub struct CsvCustomerStream {
    inner: Pin<Box<dyn Stream<Item = Result<Customer, IoError>> + Send>>,
}

impl CsvCustomerStream {
    /// Create a new customer stream from an async reader
    pub fn new<R>(reader: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let csv_reader = AsyncReaderBuilder::new()
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        let stream = csv_reader
            .into_deserialize::<RawCustomerRecord>()
            .map(|result| result.map_err(IoError::from).and_then(RawCustomerRecord::parse));

        Self {
            inner: Box::pin(stream),
        }
    }

    /// Open a CSV file and stream its customers
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let file = File::open(path.as_ref()).await?;
        Ok(Self::new(file.compat()))
    }
}

impl Stream for CsvCustomerStream {
    type Item = Result<Customer, IoError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}
