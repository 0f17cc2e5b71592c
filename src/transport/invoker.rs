use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use tracing::debug;

use crate::errors::Error;
use crate::path::{build_url, with_query};

use super::{Method, RequestDescriptor, ResponseOutcome, ResponseSink};

/// Multipart field carrying a submission upload.
pub const UPLOAD_FIELD: &str = "submission[file]";

const USER_AGENT: &str = "autolab-rust-client/0.1.0";

/// Performs exactly one HTTP exchange per `execute` call. No retries happen here.
#[derive(Clone)]
pub struct Transport {
    http: Client,
    base_url: String,
}

impl Transport {
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, Error> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn execute(&self, request: &RequestDescriptor) -> Result<ResponseOutcome, Error> {
        request.segments.validate()?;
        let url = build_url(&self.base_url, &request.segments);
        debug!(
            method = %request.method(),
            path = %request.segments.to_path(),
            upload = request.options.upload.is_some(),
            "sending request"
        );

        let builder = match (request.method(), request.options.upload.as_ref()) {
            (Method::Post, Some(upload)) => {
                let part = Part::file(upload).await?;
                self.http
                    .post(with_query(url, &request.params))
                    .multipart(Form::new().part(UPLOAD_FIELD, part))
            }
            (Method::Post, None) => self
                .http
                .post(url)
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(request.params.encode()),
            (method, _) => self
                .http
                .request(method.to_reqwest(), with_query(url, &request.params)),
        };

        let response = builder.send().await?;
        let status = response.status();
        let mut sink = ResponseSink::new(request.options.download.clone());
        let pumped = pump(response, &mut sink).await;
        // the file is closed before any error is surfaced
        let closed = sink.close().await;
        pumped?;
        closed?;
        debug!(
            status = status.as_u16(),
            file = sink.is_streaming_to_file(),
            bytes = sink.bytes_written(),
            "response received"
        );
        sink.finish(status).await
    }
}

async fn pump(mut response: Response, sink: &mut ResponseSink) -> Result<(), Error> {
    sink.route(response.headers()).await?;
    while let Some(chunk) = response.chunk().await? {
        sink.write(&chunk).await?;
    }
    Ok(())
}
