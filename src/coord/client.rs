use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use super::protocol::{
    ENDPOINT_HEALTH, ENDPOINT_RECORD, ENDPOINT_WAIT, RecordQuery, RecordResponse, SetRequest,
    SetResponse, WaitQuery,
};
use super::store::CoordinationStore;
use super::types::{CoordError, CoordinationRecord, Revision};

/// Coordination store reached over HTTP.
///
/// Requests carry no timeout: watches are long polls that stay open until the
/// store has something newer to report.
#[derive(Clone)]
pub struct HttpStoreClient {
    base: String,
    client: Client,
}

impl HttpStoreClient {
    /// Opens a client against `address` (`host:port` or a full `http://` URL)
    /// and verifies the store answers.
    pub async fn connect(address: &str) -> Result<Self, CoordError> {
        let trimmed = address.trim_end_matches('/');
        let base = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("http://{}", trimmed)
        };

        let store = Self {
            base,
            client: Client::new(),
        };

        let response = store
            .client
            .get(store.url(ENDPOINT_HEALTH))
            .send()
            .await
            .map_err(|e| CoordError::Connection(format!("{}: {}", store.base, e)))?;

        if !response.status().is_success() {
            return Err(CoordError::Connection(format!(
                "{} answered health check with {}",
                store.base,
                response.status()
            )));
        }

        tracing::info!("Connected to coordination store at {}", store.base);
        Ok(store)
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base, endpoint)
    }
}

#[async_trait]
impl CoordinationStore for HttpStoreClient {
    async fn fetch(&self, path: &str) -> Result<CoordinationRecord, CoordError> {
        let response = self
            .client
            .get(self.url(ENDPOINT_RECORD))
            .query(&RecordQuery {
                path: path.to_string(),
            })
            .send()
            .await
            .map_err(|e| CoordError::Connection(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(CoordError::NotFound(path.to_string()));
        }
        if !response.status().is_success() {
            return Err(CoordError::Protocol(format!(
                "fetch {} returned {}",
                path,
                response.status()
            )));
        }

        let record: RecordResponse = response
            .json()
            .await
            .map_err(|e| CoordError::Protocol(e.to_string()))?;
        Ok(record.into())
    }

    async fn set_if_revision(
        &self,
        path: &str,
        expected: Revision,
        value: Vec<u8>,
    ) -> Result<Revision, CoordError> {
        let payload = SetRequest {
            path: path.to_string(),
            expected_revision: expected,
            value,
        };

        let response = self
            .client
            .post(self.url(ENDPOINT_RECORD))
            .json(&payload)
            .send()
            .await
            .map_err(|e| CoordError::Connection(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::CONFLICT {
            return Err(CoordError::Protocol(format!(
                "set {} returned {}",
                path, status
            )));
        }

        let body: SetResponse = response
            .json()
            .await
            .map_err(|e| CoordError::Protocol(e.to_string()))?;

        if status == StatusCode::CONFLICT {
            return Err(CoordError::Conflict {
                path: path.to_string(),
                expected,
                current: body.revision,
            });
        }

        Ok(body.revision)
    }

    async fn watch(&self, path: &str, after: Revision) -> Result<CoordinationRecord, CoordError> {
        let watch_error = |reason: String| CoordError::Watch {
            path: path.to_string(),
            reason,
        };

        let response = self
            .client
            .get(self.url(ENDPOINT_WAIT))
            .query(&WaitQuery {
                path: path.to_string(),
                after,
            })
            .send()
            .await
            .map_err(|e| watch_error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(watch_error(format!("store returned {}", response.status())));
        }

        let record: RecordResponse = response
            .json()
            .await
            .map_err(|e| watch_error(e.to_string()))?;
        Ok(record.into())
    }
}
