//! Image hosting for template thumbnails
//!
//! Templates carry a thumbnail URL; the file itself lives with an external
//! image host. The host takes the file as a base64 form field and answers
//! with the public URL.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("image host API key is not configured")]
    Unconfigured,
    #[error("could not read {0}")]
    Read(String),
    #[error("upload failed: {0}")]
    Http(String),
    #[error("unusable response: {0}")]
    BadResponse(String),
}

pub trait ImageHost: Send + Sync {
    /// Upload the file and return its public URL.
    fn upload(&self, path: &Path) -> Result<String, UploadError>;
}

/// ImgBB-style upload endpoint.
pub struct HttpImageHost {
    endpoint: String,
    api_key: String,
}

impl HttpImageHost {
    pub fn new(endpoint: String, api_key: String) -> Self {
        Self { endpoint, api_key }
    }
}

impl ImageHost for HttpImageHost {
    fn upload(&self, path: &Path) -> Result<String, UploadError> {
        use base64::Engine as _;

        if self.api_key.is_empty() {
            return Err(UploadError::Unconfigured);
        }

        let bytes =
            std::fs::read(path).map_err(|_| UploadError::Read(path.display().to_string()))?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);

        let url = format!("{}?key={}", self.endpoint, self.api_key);
        tracing::debug!(file = %path.display(), "Uploading template thumbnail");
        let response = ureq::post(&url)
            .timeout(Duration::from_secs(30))
            .send_form(&[("image", encoded.as_str())])
            .map_err(|e| UploadError::Http(e.to_string()))?;

        let payload: serde_json::Value = response
            .into_json()
            .map_err(|e| UploadError::BadResponse(e.to_string()))?;

        payload
            .pointer("/data/url")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| UploadError::BadResponse("no url in response".to_string()))
    }
}

/// Handle to a single in-flight upload, polled without blocking.
pub struct UploadHandle {
    receiver: Receiver<Result<String, UploadError>>,
    #[allow(dead_code)]
    thread: JoinHandle<()>,
    done: bool,
}

impl UploadHandle {
    pub fn try_result(&mut self) -> Option<Result<String, UploadError>> {
        if self.done {
            return None;
        }
        match self.receiver.try_recv() {
            Ok(result) => {
                self.done = true;
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.done = true;
                Some(Err(UploadError::Http("upload worker died".to_string())))
            }
        }
    }
}

/// Run one upload in the background.
pub fn spawn_upload(host: Arc<dyn ImageHost>, path: PathBuf) -> UploadHandle {
    let (tx, rx) = mpsc::channel();
    let thread = std::thread::spawn(move || {
        let result = host.upload(&path);
        if let Err(e) = &result {
            tracing::warn!("Thumbnail upload failed: {e}");
        }
        let _ = tx.send(result);
    });
    UploadHandle {
        receiver: rx,
        thread,
        done: false,
    }
}
