use std::path::{Path, PathBuf};

use reqwest::StatusCode;
use reqwest::header::{CONTENT_DISPOSITION, HeaderMap};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::errors::Error;

use super::DownloadTarget;

#[derive(Debug)]
enum SinkState {
    Undetermined,
    Buffering(Vec<u8>),
    StreamingToFile {
        path: PathBuf,
        file: Option<File>,
        written: u64,
    },
}

/// Collects one response body. The routing decision is taken once, from the
/// headers, and holds for the rest of the response.
#[derive(Debug)]
pub struct ResponseSink {
    download: Option<DownloadTarget>,
    state: SinkState,
}

impl ResponseSink {
    pub fn new(download: Option<DownloadTarget>) -> Self {
        Self {
            download,
            state: SinkState::Undetermined,
        }
    }

    /// Picks buffering or file streaming. Later calls are no-ops.
    pub async fn route(&mut self, headers: &HeaderMap) -> Result<(), Error> {
        if !matches!(self.state, SinkState::Undetermined) {
            return Ok(());
        }
        let disposition = headers
            .get(CONTENT_DISPOSITION)
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());
        self.state = match (disposition, self.download.as_ref()) {
            (Some(disposition), Some(target)) => {
                let name = filename_from_disposition(&disposition)
                    .unwrap_or_else(|| target.default_name.clone());
                let path = target.directory.join(name);
                let file = File::create(&path).await?;
                debug!(path = %path.display(), "response routed to file");
                SinkState::StreamingToFile {
                    path,
                    file: Some(file),
                    written: 0,
                }
            }
            _ => SinkState::Buffering(Vec::new()),
        };
        Ok(())
    }

    pub async fn write(&mut self, chunk: &[u8]) -> Result<(), Error> {
        match &mut self.state {
            state @ SinkState::Undetermined => *state = SinkState::Buffering(chunk.to_vec()),
            SinkState::Buffering(buf) => buf.extend_from_slice(chunk),
            SinkState::StreamingToFile { file, written, path } => {
                let file = file.as_mut().ok_or_else(|| {
                    Error::Io(std::io::Error::other(format!(
                        "download file '{}' already closed",
                        path.display()
                    )))
                })?;
                file.write_all(chunk).await?;
                *written += chunk.len() as u64;
            }
        }
        Ok(())
    }

    /// Flushes and closes the download file, if any. Safe to call more than once.
    pub async fn close(&mut self) -> Result<(), Error> {
        if let SinkState::StreamingToFile { file, .. } = &mut self.state
            && let Some(mut handle) = file.take()
        {
            handle.flush().await?;
        }
        Ok(())
    }

    pub fn is_streaming_to_file(&self) -> bool {
        matches!(self.state, SinkState::StreamingToFile { .. })
    }

    pub fn has_open_file(&self) -> bool {
        matches!(self.state, SinkState::StreamingToFile { file: Some(_), .. })
    }

    pub fn bytes_written(&self) -> u64 {
        match &self.state {
            SinkState::StreamingToFile { written, .. } => *written,
            SinkState::Buffering(buf) => buf.len() as u64,
            SinkState::Undetermined => 0,
        }
    }

    /// Closes any open file and produces the final outcome.
    pub async fn finish(mut self, status: StatusCode) -> Result<ResponseOutcome, Error> {
        self.close().await?;
        let body = match self.state {
            SinkState::Undetermined => ResponseBody::Buffered(Vec::new()),
            SinkState::Buffering(buf) => ResponseBody::Buffered(buf),
            SinkState::StreamingToFile { path, .. } => ResponseBody::File(path),
        };
        Ok(ResponseOutcome { status, body })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponseBody {
    Buffered(Vec<u8>),
    File(PathBuf),
}

#[derive(Clone, Debug)]
pub struct ResponseOutcome {
    pub status: StatusCode,
    pub body: ResponseBody,
}

impl ResponseOutcome {
    pub fn is_file_download(&self) -> bool {
        matches!(self.body, ResponseBody::File(_))
    }

    pub fn body_bytes(&self) -> Option<&[u8]> {
        match &self.body {
            ResponseBody::Buffered(buf) => Some(buf),
            ResponseBody::File(_) => None,
        }
    }

    pub fn saved_file_path(&self) -> Option<&Path> {
        match &self.body {
            ResponseBody::File(path) => Some(path),
            ResponseBody::Buffered(_) => None,
        }
    }

    /// The buffered body as JSON. `None` for downloads and unparseable bodies.
    pub fn json(&self) -> Option<serde_json::Value> {
        self.body_bytes()
            .and_then(|bytes| serde_json::from_slice(bytes).ok())
    }

    /// The buffered body as JSON, failing when it is missing or not JSON.
    pub fn require_json(&self) -> Result<serde_json::Value, Error> {
        let bytes = self.body_bytes().ok_or_else(|| {
            Error::InvalidResponse("expected a JSON body but the response was a file".into())
        })?;
        serde_json::from_slice(bytes)
            .map_err(|e| Error::InvalidResponse(format!("response body is not JSON: {}", e)))
    }

    /// Value of a top-level string `error` field in a buffered JSON object.
    pub fn error_message(&self) -> Option<String> {
        self.json()?
            .get("error")?
            .as_str()
            .map(str::to_string)
    }
}

/// Extracts `filename=` from a `Content-Disposition` value. Quoted names need their
/// closing quote. Only the final path component is kept.
pub fn filename_from_disposition(disposition: &str) -> Option<String> {
    let start = disposition.find("filename=")? + "filename=".len();
    let rest = &disposition[start..];
    let raw = if let Some(quoted) = rest.strip_prefix('"') {
        &quoted[..quoted.find('"')?]
    } else {
        rest.split(';').next().unwrap_or("").trim()
    };
    let name = Path::new(raw).file_name()?.to_str()?;
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
