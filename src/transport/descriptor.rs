use std::fmt;
use std::path::PathBuf;

use crate::path::{PathSegments, QueryParams};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Put => write!(f, "PUT"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

/// Where a file response should land if the server decides to send one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadTarget {
    pub directory: PathBuf,
    /// Used when the `Content-Disposition` header carries no usable filename.
    pub default_name: String,
}

impl DownloadTarget {
    pub fn new(directory: impl Into<PathBuf>, default_name: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            default_name: default_name.into(),
        }
    }
}

/// Per-call settings.
#[derive(Clone, Debug)]
pub struct RequestOptions {
    pub method: Method,
    pub retry_on_auth_failure: bool,
    pub download: Option<DownloadTarget>,
    pub upload: Option<PathBuf>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::Get,
            retry_on_auth_failure: true,
            download: None,
            upload: None,
        }
    }
}

impl RequestOptions {
    pub fn method(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// OAuth calls carry no access token and must never trigger a refresh.
    pub fn oauth(method: Method) -> Self {
        Self {
            method,
            retry_on_auth_failure: false,
            ..Self::default()
        }
    }

    pub fn with_download(mut self, target: DownloadTarget) -> Self {
        self.download = Some(target);
        self
    }

    pub fn with_upload(mut self, path: impl Into<PathBuf>) -> Self {
        self.upload = Some(path.into());
        self
    }
}

/// One logical request. Only the access token parameter changes after it is built.
#[derive(Clone, Debug)]
pub struct RequestDescriptor {
    pub segments: PathSegments,
    pub params: QueryParams,
    pub options: RequestOptions,
}

impl RequestDescriptor {
    pub fn new(segments: PathSegments, params: QueryParams, options: RequestOptions) -> Self {
        Self {
            segments,
            params,
            options,
        }
    }

    pub fn method(&self) -> Method {
        self.options.method
    }
}
