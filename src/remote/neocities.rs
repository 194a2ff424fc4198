//! Neocities API backend.
//!
//! | Operation | Endpoint |
//! |---|---|
//! | list | `GET {api_url}/list?path=<dir>` |
//! | upload | `POST {api_url}/upload`, multipart, field name = remote path |
//!
//! The API also accepts several files per upload request, but rejects requests
//! with "too many" files or "too large" a payload without saying where the
//! limits are. This backend only ever sends one file per request.

use super::backend::{RemoteEntry, RemoteError, RemoteStore};
use reqwest::blocking::{Client, RequestBuilder, Response, multipart};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://neocities.org/api";

/// Body of a `/list` response.
#[derive(Debug, Deserialize)]
struct ListResponse {
    result: String,
    #[serde(default)]
    files: Vec<RemoteEntry>,
    #[serde(default)]
    message: Option<String>,
}

/// Body of an error response (`{"result": "error", "error_type": ..., "message": ...}`).
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RemoteError::Timeout
        } else {
            RemoteError::Http(err.to_string())
        }
    }
}

pub struct NeocitiesBackend {
    client: Client,
    api_url: String,
    api_key: String,
}

impl NeocitiesBackend {
    /// Create a backend. `timeout` applies to every request individually.
    pub fn new(api_url: &str, api_key: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.api_url, name)
    }

    /// `GET /list`; the site root is listed without a `path` query.
    fn list_request(&self, dir: &str) -> RequestBuilder {
        let request = self
            .client
            .get(self.endpoint("list"))
            .bearer_auth(&self.api_key);
        if dir.is_empty() {
            request
        } else {
            request.query(&[("path", dir)])
        }
    }

    /// `POST /upload` with a single part whose field name is the remote path.
    ///
    /// Field names are sent as-is: the API reads `a/b.json` literally, not its
    /// percent-encoded form.
    fn upload_request(
        &self,
        local_path: &Path,
        remote_path: &str,
    ) -> Result<RequestBuilder, RemoteError> {
        let form = multipart::Form::new()
            .percent_encode_noop()
            .file(remote_path.to_string(), local_path)?;
        Ok(self
            .client
            .post(self.endpoint("upload"))
            .bearer_auth(&self.api_key)
            .multipart(form))
    }
}

impl RemoteStore for NeocitiesBackend {
    fn list(&self, dir: &str) -> Result<Vec<RemoteEntry>, RemoteError> {
        tracing::debug!(dir, "listing remote directory");
        let response = check_status(self.list_request(dir).send()?)?;
        let body: ListResponse = response
            .json()
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        into_entries(body)
    }

    fn upload(&self, local_path: &Path, remote_path: &str) -> Result<(), RemoteError> {
        let request = self.upload_request(local_path, remote_path)?;

        tracing::debug!(local = %local_path.display(), remote_path, "uploading file");
        check_status(request.send()?)?;
        Ok(())
    }
}

fn into_entries(body: ListResponse) -> Result<Vec<RemoteEntry>, RemoteError> {
    if body.result != "success" {
        return Err(RemoteError::Decode(
            body.message
                .unwrap_or_else(|| format!("list result was {:?}", body.result)),
        ));
    }
    Ok(body.files)
}

/// Turn a non-2xx response into [`RemoteError::Api`], using the API's own
/// message when the body has one.
fn check_status(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .json::<ErrorResponse>()
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_else(|| status.to_string());
    Err(RemoteError::Api {
        status: status.as_u16(),
        message,
    })
}
