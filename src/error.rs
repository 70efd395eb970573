use serde::Deserialize;
use thiserror::Error;

/// Status reported for failures that never produced an HTTP response.
pub const NETWORK_FAILURE_STATUS: u16 = 0;

/// Status GitHub uses for queries it understood as HTTP but rejected.
pub const VALIDATION_FAILED_STATUS: u16 = 422;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// Page or page size was not positive. Raised before any request is made.
    #[error("Invalid pagination values")]
    InvalidPagination,

    /// Non-2xx response, network failure (status 0) or an unparseable body.
    #[error("GitHub API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        body: String,
    },

    /// A 2xx body that does not honour the search response contract.
    #[error("Malformed search response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl SearchError {
    /// Builds an API error from a response, preferring GitHub's `message` field.
    pub fn from_response(status: u16, body: String) -> Self {
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| body.trim().to_string());

        Self::Api {
            status,
            message,
            body,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Api {
            status: NETWORK_FAILURE_STATUS,
            message: message.into(),
            body: String::new(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when GitHub rejected the query itself (HTTP 422).
    pub fn is_validation(&self) -> bool {
        self.status() == Some(VALIDATION_FAILED_STATUS)
    }

    /// The server-provided message for API errors, the display text otherwise.
    pub fn message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
