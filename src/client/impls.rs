use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::auth::{AuthorizeOutcome, DeviceFlowPrompt, TokenPair, TokenStore};
use crate::catalog::Endpoint;
use crate::config::Config;
use crate::errors::Error;
use crate::path::QueryParams;
use crate::transport::ResponseOutcome;
use crate::types::{
    Assessment, AssessmentDetails, Attachment, Course, Enrollment, EnrollmentOptions, Problem,
    Submission, User,
};

use super::{Client, RawClient};

impl Client {
    pub fn new(config: Config) -> Result<Self, Error> {
        Ok(Self {
            raw: RawClient::new(config)?,
        })
    }

    pub fn from_raw(raw: RawClient) -> Self {
        Self { raw }
    }

    pub fn with_token_store(self, store: Arc<dyn TokenStore>) -> Self {
        Self {
            raw: self.raw.with_token_store(store),
        }
    }

    pub fn raw(&self) -> &RawClient {
        &self.raw
    }

    pub fn raw_mut(&mut self) -> &mut RawClient {
        &mut self.raw
    }

    pub fn set_tokens(&mut self, tokens: TokenPair) {
        self.raw.set_tokens(tokens);
    }

    pub fn load_tokens(&mut self) -> Result<bool, Error> {
        self.raw.load_tokens()
    }

    pub async fn device_flow_init(&mut self) -> Result<DeviceFlowPrompt, Error> {
        self.raw.device_flow_init().await
    }

    pub async fn device_flow_authorize(
        &mut self,
        timeout: Duration,
    ) -> Result<AuthorizeOutcome, Error> {
        self.raw.device_flow_authorize(timeout).await
    }

    pub async fn user_info(&mut self) -> Result<User, Error> {
        self.fetch(Endpoint::UserInfo, QueryParams::new()).await
    }

    pub async fn courses(&mut self) -> Result<Vec<Course>, Error> {
        self.fetch(Endpoint::Courses, QueryParams::new()).await
    }

    pub async fn assessments(&mut self, course: &str) -> Result<Vec<Assessment>, Error> {
        let endpoint = Endpoint::Assessments {
            course: course.to_string(),
        };
        self.fetch(endpoint, QueryParams::new()).await
    }

    pub async fn assessment_details(
        &mut self,
        course: &str,
        assessment: &str,
    ) -> Result<AssessmentDetails, Error> {
        let endpoint = Endpoint::AssessmentDetails {
            course: course.to_string(),
            assessment: assessment.to_string(),
        };
        self.fetch(endpoint, QueryParams::new()).await
    }

    pub async fn problems(&mut self, course: &str, assessment: &str) -> Result<Vec<Problem>, Error> {
        let endpoint = Endpoint::Problems {
            course: course.to_string(),
            assessment: assessment.to_string(),
        };
        self.fetch(endpoint, QueryParams::new()).await
    }

    pub async fn submissions(
        &mut self,
        course: &str,
        assessment: &str,
    ) -> Result<Vec<Submission>, Error> {
        let endpoint = Endpoint::Submissions {
            course: course.to_string(),
            assessment: assessment.to_string(),
        };
        self.fetch(endpoint, QueryParams::new()).await
    }

    pub async fn feedback(
        &mut self,
        course: &str,
        assessment: &str,
        version: u32,
        problem: &str,
    ) -> Result<String, Error> {
        let endpoint = Endpoint::Feedback {
            course: course.to_string(),
            assessment: assessment.to_string(),
            version,
            problem: problem.to_string(),
        };
        let body = self.fetch_value(endpoint, QueryParams::new()).await?;
        required_field(&body, "feedback")?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::InvalidResponse("'feedback' is not a string".into()))
    }

    pub async fn enrollments(&mut self, course: &str) -> Result<Vec<Enrollment>, Error> {
        let endpoint = Endpoint::Enrollments {
            course: course.to_string(),
        };
        self.fetch(endpoint, QueryParams::new()).await
    }

    pub async fn create_enrollment(
        &mut self,
        course: &str,
        email: &str,
        options: &EnrollmentOptions,
    ) -> Result<Enrollment, Error> {
        let endpoint = Endpoint::CreateEnrollment {
            course: course.to_string(),
            email: email.to_string(),
        };
        self.fetch(endpoint, options.to_params()).await
    }

    pub async fn update_enrollment(
        &mut self,
        course: &str,
        email: &str,
        options: &EnrollmentOptions,
    ) -> Result<Enrollment, Error> {
        let endpoint = Endpoint::UpdateEnrollment {
            course: course.to_string(),
            email: email.to_string(),
        };
        self.fetch(endpoint, options.to_params()).await
    }

    pub async fn delete_enrollment(&mut self, course: &str, email: &str) -> Result<Enrollment, Error> {
        let endpoint = Endpoint::DeleteEnrollment {
            course: course.to_string(),
            email: email.to_string(),
        };
        self.fetch(endpoint, QueryParams::new()).await
    }

    pub async fn download_handout(
        &mut self,
        course: &str,
        assessment: &str,
        directory: impl Into<PathBuf>,
    ) -> Result<Attachment, Error> {
        let endpoint = Endpoint::Handout {
            course: course.to_string(),
            assessment: assessment.to_string(),
        };
        let outcome = self.raw.download(&endpoint, directory).await?;
        attachment_from_outcome(&outcome)
    }

    pub async fn download_writeup(
        &mut self,
        course: &str,
        assessment: &str,
        directory: impl Into<PathBuf>,
    ) -> Result<Attachment, Error> {
        let endpoint = Endpoint::Writeup {
            course: course.to_string(),
            assessment: assessment.to_string(),
        };
        let outcome = self.raw.download(&endpoint, directory).await?;
        attachment_from_outcome(&outcome)
    }

    /// Uploads `file` as a new submission and returns its version number.
    pub async fn submit(
        &mut self,
        course: &str,
        assessment: &str,
        file: impl AsRef<Path>,
    ) -> Result<u32, Error> {
        let endpoint = Endpoint::Submit {
            course: course.to_string(),
            assessment: assessment.to_string(),
        };
        let outcome = self.raw.upload(&endpoint, file.as_ref()).await?;
        let body = checked_json(&outcome)?;
        required_field(&body, "version")?
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| Error::InvalidResponse("'version' is not a valid number".into()))
    }

    async fn fetch<T: DeserializeOwned>(
        &mut self,
        endpoint: Endpoint,
        extra: QueryParams,
    ) -> Result<T, Error> {
        let name = endpoint.name();
        let body = self.fetch_value(endpoint, extra).await?;
        serde_json::from_value(body)
            .map_err(|e| Error::InvalidResponse(format!("{}: {}", name, e)))
    }

    async fn fetch_value(&mut self, endpoint: Endpoint, extra: QueryParams) -> Result<Value, Error> {
        let outcome = self.raw.call(&endpoint, extra).await?;
        checked_json(&outcome)
    }
}

/// Parses the body and turns a server `error` field into `ServerRejected`.
fn checked_json(outcome: &ResponseOutcome) -> Result<Value, Error> {
    let body = outcome.require_json()?;
    if let Some(message) = body.get("error") {
        let message = message
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| message.to_string());
        debug!(error = %message, "server returned error");
        return Err(Error::ServerRejected(message));
    }
    Ok(body)
}

fn required_field<'a>(body: &'a Value, key: &str) -> Result<&'a Value, Error> {
    body.get(key)
        .ok_or_else(|| Error::InvalidResponse(format!("expected key '{}' not found", key)))
}

fn attachment_from_outcome(outcome: &ResponseOutcome) -> Result<Attachment, Error> {
    if let Some(path) = outcome.saved_file_path() {
        return Ok(Attachment::File(path.to_path_buf()));
    }
    let body = checked_json(outcome)?;
    if !body.is_object() {
        return Err(Error::InvalidResponse("expected json object not found".into()));
    }
    match body.get("url") {
        Some(url) => url
            .as_str()
            .map(|u| Attachment::Url(u.to_string()))
            .ok_or_else(|| Error::InvalidResponse("'url' is not a string".into())),
        None => Ok(Attachment::None),
    }
}
