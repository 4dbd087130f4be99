use serde::Serialize;
use strum::IntoStaticStr;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything a command can fail with. Each variant maps to one `error` kind
/// in the JSON envelope printed on failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{message}")]
    Authorization {
        message: String,
        hint: Option<String>,
    },
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("remote service returned {status}: {message}")]
    Remote { status: u16, message: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("unexpected payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl Error {
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
            hint: None,
        }
    }

    pub fn authorization_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Authorization { .. } => ErrorKind::Authorization,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Validation(_) => ErrorKind::Validation,
            // transport and payload failures are remote-side from the
            // caller's point of view
            Error::Remote { .. } | Error::Transport(_) | Error::Payload(_) => ErrorKind::Remote,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope<'_> {
        let hint = match self {
            Error::Authorization { hint, .. } => hint.as_deref(),
            _ => None,
        };
        ErrorEnvelope {
            error: self.kind(),
            message: self.to_string(),
            hint,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    Authorization,
    NotFound,
    Validation,
    Remote,
    Io,
}

/// The single JSON document printed on any failure.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope<'a> {
    pub error: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'a str>,
}
