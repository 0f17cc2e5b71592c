use serde::{Deserialize, Serialize};

/// Access/refresh credential pair issued by the token endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Reads a pair out of a token endpoint response. Both fields must be strings.
    pub fn from_response(response: &serde_json::Value) -> Option<Self> {
        let access_token = response.get("access_token")?.as_str()?;
        let refresh_token = response.get("refresh_token")?.as_str()?;
        Some(Self::new(access_token, refresh_token))
    }
}
