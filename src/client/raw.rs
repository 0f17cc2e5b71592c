use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::auth::{
    AuthController, AuthorizeOutcome, ClientCredentials, DeviceFlowPrompt, DeviceFlowSession,
    DeviceFlowState, TokenPair, TokenStore,
};
use crate::catalog::Endpoint;
use crate::config::Config;
use crate::errors::Error;
use crate::path::{ACCESS_TOKEN_PARAM, PathSegments, QueryParams};
use crate::retry::RetryOutcome;
use crate::telemetry::refresh::{RefreshOutcome, RefreshTelemetry};
use crate::transport::{
    DownloadTarget, RequestDescriptor, RequestOptions, ResponseOutcome, Transport,
};

use super::RawClient;

/// Error string the server puts in the body when the access token is not accepted.
pub const AUTH_FAILED_SENTINEL: &str = "OAuth2 authorization failed";

impl RawClient {
    pub fn new(config: Config) -> Result<Self, Error> {
        let base_url = config.resolved_base_url()?;
        let transport = Transport::new(
            base_url,
            config.request_timeout_secs.map(Duration::from_secs),
        )?;
        let auth = AuthController::new(
            ClientCredentials {
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
                redirect_uri: config.redirect_uri.clone(),
            },
            config.poll_interval(),
        );
        Ok(RawClient {
            transport,
            auth,
            tokens: None,
            store: None,
            api_version: config.api_version,
        })
    }

    /// Store notified whenever new tokens are issued.
    pub fn with_token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn set_tokens(&mut self, tokens: TokenPair) {
        self.tokens = Some(tokens);
    }

    pub fn tokens(&self) -> Option<&TokenPair> {
        self.tokens.as_ref()
    }

    /// Loads tokens from the configured store. Returns whether any were found.
    pub fn load_tokens(&mut self) -> Result<bool, Error> {
        let Some(store) = self.store.as_ref() else {
            return Ok(false);
        };
        match store.load_tokens()? {
            Some(tokens) => {
                self.tokens = Some(tokens);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn api_version(&self) -> u32 {
        self.api_version
    }

    pub fn device_flow_state(&self) -> DeviceFlowState {
        self.auth.state()
    }

    pub fn device_flow_session(&self) -> Option<&DeviceFlowSession> {
        self.auth.session()
    }

    pub async fn device_flow_init(&mut self) -> Result<DeviceFlowPrompt, Error> {
        self.auth.device_flow_init(&self.transport).await
    }

    pub async fn device_flow_authorize(
        &mut self,
        timeout: Duration,
    ) -> Result<AuthorizeOutcome, Error> {
        let result = self
            .auth
            .device_flow_authorize(&self.transport, timeout)
            .await?;
        if let Some(tokens) = result.tokens {
            self.install_tokens(tokens);
        }
        Ok(result.outcome)
    }

    /// Refresh-token grant. Returns false when there is no refresh token or the
    /// server did not hand out a new pair; the current tokens are then left alone.
    pub async fn refresh_tokens(&mut self) -> Result<bool, Error> {
        let telemetry = RefreshTelemetry::new("request.auth_failure");
        let Some(refresh_token) = self.tokens.as_ref().map(|t| t.refresh_token.clone()) else {
            telemetry.emit_failure(
                RefreshOutcome::Rejected,
                "no refresh token available",
                SystemTime::now(),
            );
            return Ok(false);
        };

        telemetry.emit_start(SystemTime::now());
        match self.auth.refresh(&self.transport, &refresh_token).await {
            Ok(Some(tokens)) => {
                self.install_tokens(tokens);
                telemetry.emit_success(SystemTime::now());
                Ok(true)
            }
            Ok(None) => {
                telemetry.emit_failure(
                    RefreshOutcome::Rejected,
                    "token response missing access_token or refresh_token",
                    SystemTime::now(),
                );
                Ok(false)
            }
            Err(err) => {
                telemetry.emit_failure(RefreshOutcome::Failed, &err.to_string(), SystemTime::now());
                Err(err)
            }
        }
    }

    /// Runs an endpoint whose response is always buffered.
    pub async fn call(
        &mut self,
        endpoint: &Endpoint,
        extra: QueryParams,
    ) -> Result<ResponseOutcome, Error> {
        let route = endpoint.route();
        let descriptor = self.descriptor(endpoint, extra, RequestOptions::method(route.method));
        self.execute(endpoint.name(), descriptor).await
    }

    /// Runs an endpoint that may answer with a file, saved under `directory`.
    pub async fn download(
        &mut self,
        endpoint: &Endpoint,
        directory: impl Into<PathBuf>,
    ) -> Result<ResponseOutcome, Error> {
        let route = endpoint.route();
        let default_name = route.download_name.ok_or_else(|| {
            Error::Config(format!("{} does not return files", endpoint.name()))
        })?;
        let options = RequestOptions::method(route.method)
            .with_download(DownloadTarget::new(directory, default_name));
        let descriptor = self.descriptor(endpoint, QueryParams::new(), options);
        self.execute(endpoint.name(), descriptor).await
    }

    /// Runs an endpoint that takes a multipart file upload.
    pub async fn upload(
        &mut self,
        endpoint: &Endpoint,
        file: impl Into<PathBuf>,
    ) -> Result<ResponseOutcome, Error> {
        let route = endpoint.route();
        if !route.upload {
            return Err(Error::Config(format!(
                "{} does not accept uploads",
                endpoint.name()
            )));
        }
        let options = RequestOptions::method(route.method).with_upload(file);
        let descriptor = self.descriptor(endpoint, QueryParams::new(), options);
        self.execute(endpoint.name(), descriptor).await
    }

    /// Builds the descriptor for `endpoint` with the current access token first,
    /// then the endpoint's own parameters, then `extra`.
    pub fn descriptor(
        &self,
        endpoint: &Endpoint,
        extra: QueryParams,
        options: RequestOptions,
    ) -> RequestDescriptor {
        let route = endpoint.route();
        let mut segments = PathSegments::new()
            .with("api")
            .with(format!("v{}", self.api_version));
        for segment in route.segments {
            segments.push(segment);
        }

        let mut params = QueryParams::new().with(ACCESS_TOKEN_PARAM, self.access_token());
        params.extend(route.params);
        params.extend(extra.pairs().iter().cloned());

        RequestDescriptor::new(segments, params, options)
    }

    /// Sends `descriptor`; on an authorization failure refreshes the tokens once and
    /// resends it with the new access token. A second failure is terminal.
    pub async fn execute(
        &mut self,
        operation: &str,
        mut descriptor: RequestDescriptor,
    ) -> Result<ResponseOutcome, Error> {
        let start = Instant::now();
        let first = self.transport.execute(&descriptor).await?;
        if !descriptor.options.retry_on_auth_failure || !signals_auth_failure(&first) {
            log_outcome(operation, 1, false, true, start);
            return Ok(first);
        }

        warn!(
            operation,
            status = first.status.as_u16(),
            "authorization failed ({}); refreshing tokens",
            first.status.as_u16()
        );
        if !self.refresh_tokens().await? {
            log_outcome(operation, 1, false, false, start);
            return Err(Error::InvalidOrExpiredToken);
        }

        let access_token = self.access_token();
        if !descriptor.params.replace(ACCESS_TOKEN_PARAM, access_token.as_str()) {
            descriptor.params.push(ACCESS_TOKEN_PARAM, access_token);
        }
        debug!(operation, "retrying with refreshed access token");
        let second = self.transport.execute(&descriptor).await?;
        if signals_auth_failure(&second) {
            warn!(
                operation,
                status = second.status.as_u16(),
                "authorization failed again after refresh ({})",
                second.status.as_u16()
            );
            log_outcome(operation, 2, true, false, start);
            return Err(Error::InvalidOrExpiredToken);
        }
        log_outcome(operation, 2, true, true, start);
        Ok(second)
    }

    fn access_token(&self) -> String {
        self.tokens
            .as_ref()
            .map(|t| t.access_token.clone())
            .unwrap_or_default()
    }

    /// Replaces the in-memory pair, then notifies the store before returning.
    fn install_tokens(&mut self, tokens: TokenPair) {
        self.tokens = Some(tokens);
        info!("new tokens installed");
        if let (Some(store), Some(tokens)) = (self.store.as_ref(), self.tokens.as_ref())
            && let Err(err) = store.store_tokens(tokens)
        {
            error!(error = %err, "failed to persist new tokens");
        }
    }
}

/// Buffered, non-200 responses whose JSON `error` is the auth-failure sentinel.
/// File downloads never qualify.
pub fn signals_auth_failure(outcome: &ResponseOutcome) -> bool {
    !outcome.is_file_download()
        && outcome.status != reqwest::StatusCode::OK
        && outcome.error_message().as_deref() == Some(AUTH_FAILED_SENTINEL)
}

fn log_outcome(operation: &str, attempts: u8, refreshed: bool, success: bool, start: Instant) {
    RetryOutcome {
        operation: operation.to_string(),
        attempts,
        refreshed,
        success,
        total_delay: start.elapsed(),
    }
    .log();
}
