use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::errors::Error;
use crate::path::{PathSegments, QueryParams};
use crate::transport::{Method, RequestDescriptor, RequestOptions, Transport};

use super::{
    AuthorizeOutcome, DeviceFlowPrompt, DeviceFlowSession, DeviceFlowState, TokenPair,
};

const AUTHORIZATION_PENDING: &str = "authorization_pending";

#[derive(Clone, Debug)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Result of one `device_flow_authorize` run. `tokens` is set only when granted.
#[derive(Clone, Debug)]
pub struct AuthorizeResult {
    pub outcome: AuthorizeOutcome,
    pub tokens: Option<TokenPair>,
}

/// Drives the device-flow handshake and the token grants. Issued tokens are returned
/// to the caller, which owns installing and persisting them.
#[derive(Debug)]
pub struct AuthController {
    credentials: ClientCredentials,
    session: Option<DeviceFlowSession>,
    state: DeviceFlowState,
    poll_interval: Duration,
}

impl AuthController {
    pub fn new(credentials: ClientCredentials, poll_interval: Duration) -> Self {
        Self {
            credentials,
            session: None,
            state: DeviceFlowState::Idle,
            poll_interval,
        }
    }

    pub fn state(&self) -> DeviceFlowState {
        self.state
    }

    pub fn session(&self) -> Option<&DeviceFlowSession> {
        self.session.as_ref()
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Requests a device code. Replaces any previous session.
    pub async fn device_flow_init(
        &mut self,
        transport: &Transport,
    ) -> Result<DeviceFlowPrompt, Error> {
        self.state = DeviceFlowState::AwaitingDeviceCode;
        let request = RequestDescriptor::new(
            oauth_path("device_flow_init"),
            QueryParams::new().with("client_id", self.credentials.client_id.as_str()),
            RequestOptions::oauth(Method::Get),
        );
        let session = match transport.execute(&request).await.and_then(|outcome| {
            let body = outcome.require_json()?;
            session_from_response(&body)
        }) {
            Ok(session) => session,
            Err(err) => {
                self.state = DeviceFlowState::Idle;
                return Err(err);
            }
        };
        info!(
            verification_uri = %session.verification_uri,
            "device flow initiated"
        );
        let prompt = DeviceFlowPrompt::from(&session);
        self.session = Some(session);
        Ok(prompt)
    }

    /// Polls until the user grants or denies, or `timeout` elapses.
    pub async fn device_flow_authorize(
        &mut self,
        transport: &Transport,
        timeout: Duration,
    ) -> Result<AuthorizeResult, Error> {
        let Some(session) = self.session.clone() else {
            self.state = DeviceFlowState::NotInitiated;
            return Ok(AuthorizeResult {
                outcome: AuthorizeOutcome::NotInitiated,
                tokens: None,
            });
        };
        self.state = DeviceFlowState::Polling;

        let request = RequestDescriptor::new(
            oauth_path("device_flow_authorize"),
            QueryParams::new()
                .with("client_id", self.credentials.client_id.as_str())
                .with("device_code", session.device_code.as_str()),
            RequestOptions::oauth(Method::Get),
        );

        let deadline = Instant::now() + timeout;
        let mut polls: u32 = 0;
        while Instant::now() < deadline {
            polls += 1;
            let body = transport.execute(&request).await?.require_json()?;

            if let Some(code) = body.get("code").and_then(|c| c.as_str()) {
                debug!(polls, "device flow granted; exchanging authorization code");
                self.session = None;
                return match self.exchange_code(transport, code).await? {
                    Some(tokens) => {
                        self.state = DeviceFlowState::Granted;
                        Ok(AuthorizeResult {
                            outcome: AuthorizeOutcome::Granted,
                            tokens: Some(tokens),
                        })
                    }
                    None => {
                        self.state = DeviceFlowState::ExchangeFailed;
                        Err(Error::InvalidResponse(
                            "authorization code exchange returned no token pair".into(),
                        ))
                    }
                };
            }

            match body.get("error").and_then(|e| e.as_str()) {
                Some(AUTHORIZATION_PENDING) => {
                    debug!(polls, "device flow authorization pending");
                    tokio::time::sleep(self.poll_interval).await;
                }
                Some(other) => {
                    warn!(polls, error = other, "device flow denied");
                    self.session = None;
                    self.state = DeviceFlowState::Denied;
                    return Ok(AuthorizeResult {
                        outcome: AuthorizeOutcome::Denied,
                        tokens: None,
                    });
                }
                None => {
                    self.state = DeviceFlowState::AwaitingDeviceCode;
                    return Err(Error::InvalidResponse(
                        "device flow response has neither 'code' nor 'error'".into(),
                    ));
                }
            }
        }

        info!(polls, timeout_ms = timeout.as_millis() as u64, "device flow timed out");
        self.state = DeviceFlowState::TimedOut;
        Ok(AuthorizeResult {
            outcome: AuthorizeOutcome::TimedOut,
            tokens: None,
        })
    }

    /// Authorization-code grant. `None` when the response lacks either token.
    pub async fn exchange_code(
        &self,
        transport: &Transport,
        code: &str,
    ) -> Result<Option<TokenPair>, Error> {
        let params = QueryParams::new()
            .with("grant_type", "authorization_code")
            .with("client_id", self.credentials.client_id.as_str())
            .with("client_secret", self.credentials.client_secret.as_str())
            .with("redirect_uri", self.credentials.redirect_uri.as_str())
            .with("code", code);
        self.token_grant(transport, params).await
    }

    /// Refresh-token grant. `None` when the response lacks either token.
    pub async fn refresh(
        &self,
        transport: &Transport,
        refresh_token: &str,
    ) -> Result<Option<TokenPair>, Error> {
        let params = QueryParams::new()
            .with("grant_type", "refresh_token")
            .with("client_id", self.credentials.client_id.as_str())
            .with("client_secret", self.credentials.client_secret.as_str())
            .with("refresh_token", refresh_token);
        self.token_grant(transport, params).await
    }

    async fn token_grant(
        &self,
        transport: &Transport,
        params: QueryParams,
    ) -> Result<Option<TokenPair>, Error> {
        let request =
            RequestDescriptor::new(oauth_path("token"), params, RequestOptions::oauth(Method::Post));
        let outcome = transport.execute(&request).await?;
        Ok(outcome.json().as_ref().and_then(TokenPair::from_response))
    }
}

fn oauth_path(endpoint: &str) -> PathSegments {
    PathSegments::new().with("oauth").with(endpoint)
}

fn session_from_response(body: &serde_json::Value) -> Result<DeviceFlowSession, Error> {
    if let Some(message) = body.get("error").and_then(|e| e.as_str()) {
        return Err(Error::ServerRejected(message.to_string()));
    }
    let field = |name: &str| {
        body.get(name)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                Error::InvalidResponse(format!("device flow init response missing '{}'", name))
            })
    };
    Ok(DeviceFlowSession {
        device_code: field("device_code")?,
        user_code: field("user_code")?,
        verification_uri: field("verification_uri")?,
    })
}
