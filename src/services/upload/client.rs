use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use tracing::debug;

use super::record::SessionRecord;
use crate::error::UploadError;

pub type UploadFuture<'a> = Pin<Box<dyn Future<Output = Result<(), UploadError>> + Send + 'a>>;

/// Delivers one session record. Called off the controller's own context;
/// the controller never awaits it.
pub trait UploadClient: Send + Sync {
    fn upload<'a>(&'a self, record: &'a SessionRecord) -> UploadFuture<'a>;
}

/// POSTs the record as JSON to the collector endpoint. No retry.
#[derive(Clone)]
pub struct HttpUploadClient {
    client: Client,
    endpoint: String,
}

impl HttpUploadClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, record: &SessionRecord) -> Result<(), UploadError> {
        let body = record.to_json()?;
        debug!(endpoint = %self.endpoint, bytes = body.len(), "posting session record");

        let response = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Status(status.as_u16()));
        }

        debug!(status = status.as_u16(), "collector accepted record");
        Ok(())
    }
}

impl UploadClient for HttpUploadClient {
    fn upload<'a>(&'a self, record: &'a SessionRecord) -> UploadFuture<'a> {
        Box::pin(self.post(record))
    }
}
