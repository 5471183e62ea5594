use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::Error;

/// In-body application code the backend uses to reject an expired or
/// invalid credential on an otherwise successful (2xx) response.
pub const CODE_CREDENTIAL_REJECTED: i64 = 401;

/// Uniform response body wrapper used by every backend endpoint.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ApiEnvelope {
    pub code: i64,
    pub msg: Option<String>,
    pub result: Value,
}

impl ApiEnvelope {
    /// Deserialize the `result` payload into a caller-chosen type.
    pub fn parse_result<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_value(self.result.clone()).map_err(Error::from)
    }
}

/// Body shape returned by the bootstrap and refresh endpoints.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenGrant {
    pub is_login: bool,
    pub access_token: Option<String>,
}

impl TokenGrant {
    /// A grant is usable only when the server confirms the session and
    /// includes a non-empty token.
    pub fn usable(&self) -> Option<&str> {
        if !self.is_login {
            return None;
        }
        match self.access_token.as_deref() {
            Some(token) if !token.is_empty() => Some(token),
            _ => None,
        }
    }
}

/// Classified result of one request attempt.
#[derive(Clone, Debug)]
pub enum Outcome {
    Success(ApiEnvelope),
    /// Recoverable in-body rejection; absorbed by the refresh-and-retry path
    /// and never surfaced to callers.
    AuthRejected,
    /// Unrecoverable auth status at the transport level.
    TerminalAuth,
    /// Non-2xx with a server-provided message for user display.
    Application { status: StatusCode, message: String },
    Transport(String),
}

/// Map a raw response to an [`Outcome`].
///
/// Transport-level failures never reach this function; they are mapped to
/// [`Outcome::Transport`] at the transport seam before classification.
pub fn classify(status: StatusCode, body: &str) -> Outcome {
    if status.is_success() {
        return match serde_json::from_str::<ApiEnvelope>(body) {
            Ok(envelope) if envelope.code == CODE_CREDENTIAL_REJECTED => Outcome::AuthRejected,
            Ok(envelope) => Outcome::Success(envelope),
            Err(err) => Outcome::Transport(format!("undecodable response body: {err}")),
        };
    }
    if status == StatusCode::UNAUTHORIZED {
        return Outcome::TerminalAuth;
    }
    let message = serde_json::from_str::<ApiEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.msg)
        .unwrap_or_else(|| "request failed".to_string());
    Outcome::Application { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_xx_with_payload_is_success() {
        let body = r#"{"code": 0, "msg": null, "result": {"id": 7}}"#;
        match classify(StatusCode::OK, body) {
            Outcome::Success(envelope) => assert_eq!(envelope.result["id"], 7),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn two_xx_with_rejection_code_is_auth_rejected() {
        let body = r#"{"code": 401, "msg": "token expired", "result": null}"#;
        assert!(matches!(classify(StatusCode::OK, body), Outcome::AuthRejected));
    }

    #[test]
    fn raw_401_is_terminal() {
        assert!(matches!(
            classify(StatusCode::UNAUTHORIZED, ""),
            Outcome::TerminalAuth
        ));
    }

    #[test]
    fn other_status_carries_server_message() {
        let body = r#"{"code": 500, "msg": "quota exceeded", "result": null}"#;
        match classify(StatusCode::INTERNAL_SERVER_ERROR, body) {
            Outcome::Application { status, message } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(message, "quota exceeded");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn other_status_without_message_falls_back() {
        match classify(StatusCode::BAD_GATEWAY, "<html>") {
            Outcome::Application { message, .. } => assert_eq!(message, "request failed"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn undecodable_two_xx_is_transport() {
        assert!(matches!(
            classify(StatusCode::OK, "not json"),
            Outcome::Transport(_)
        ));
    }

    #[test]
    fn grant_usability_rules() {
        let usable = TokenGrant {
            is_login: true,
            access_token: Some("tok".into()),
        };
        assert_eq!(usable.usable(), Some("tok"));

        let logged_out = TokenGrant {
            is_login: false,
            access_token: Some("tok".into()),
        };
        assert!(logged_out.usable().is_none());

        let empty = TokenGrant {
            is_login: true,
            access_token: Some(String::new()),
        };
        assert!(empty.usable().is_none());
    }
}
