//! Failure taxonomy for append lookups.

use serde_json::Value;

/// Why an append operation produced no usable result.
#[derive(Debug, Clone, PartialEq)]
pub enum AppendError {
    /// A required construction parameter is missing or invalid.
    Configuration(String),
    /// Every attempt failed before a response was obtained (network, timeout).
    Transport(String),
    /// The service answered with a success status but an unexpected body shape.
    Protocol(String),
    /// The service answered with a status other than 200/201.
    Remote {
        status: u16,
        message: Option<String>,
        error_code: Option<Value>,
    },
}

impl AppendError {
    /// Only transport failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppendError::Transport(_))
    }

    /// HTTP status of a remote failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppendError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl std::fmt::Display for AppendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppendError::Configuration(msg) => write!(f, "Invalid configuration: {}", msg),
            AppendError::Transport(msg) => write!(f, "Transport failure: {}", msg),
            AppendError::Protocol(msg) => write!(f, "Unexpected response: {}", msg),
            AppendError::Remote {
                status,
                message,
                error_code,
            } => {
                write!(f, "HTTP request failed with status {}", status)?;
                if let Some(message) = message {
                    write!(f, ": {}", message)?;
                    if let Some(code) = error_code {
                        write!(f, " ({})", render_code(code))?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for AppendError {}

/// Vendor error codes arrive as numbers or strings; strings render unquoted.
fn render_code(code: &Value) -> String {
    match code {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_remote_display_with_message_and_code() {
        let err = AppendError::Remote {
            status: 404,
            message: Some("not found".to_string()),
            error_code: Some(json!(42)),
        };
        assert_eq!(
            err.to_string(),
            "HTTP request failed with status 404: not found (42)"
        );
    }

    #[test]
    fn test_remote_display_string_code_is_unquoted() {
        let err = AppendError::Remote {
            status: 400,
            message: Some("bad field".to_string()),
            error_code: Some(json!("E_FIELD")),
        };
        assert_eq!(
            err.to_string(),
            "HTTP request failed with status 400: bad field (E_FIELD)"
        );
    }

    #[test]
    fn test_remote_display_status_only() {
        let err = AppendError::Remote {
            status: 500,
            message: None,
            error_code: Some(json!(7)),
        };
        // A code without a message is not rendered
        assert_eq!(err.to_string(), "HTTP request failed with status 500");
    }

    #[test]
    fn test_is_retryable() {
        assert!(AppendError::Transport("timed out".into()).is_retryable());
        assert!(!AppendError::Protocol("array".into()).is_retryable());
        assert!(!AppendError::Configuration("api key".into()).is_retryable());
        assert!(
            !AppendError::Remote {
                status: 503,
                message: None,
                error_code: None
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_status() {
        let err = AppendError::Remote {
            status: 401,
            message: None,
            error_code: None,
        };
        assert_eq!(err.status(), Some(401));
        assert_eq!(AppendError::Transport("x".into()).status(), None);
    }
}
