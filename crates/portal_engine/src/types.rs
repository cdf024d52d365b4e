use std::fmt;
use std::path::PathBuf;

/// Opaque correlation id chosen by the caller for one request or ticker.
pub type Ticket = u64;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecognizedText {
    pub text: Option<String>,
    pub confidence: Option<f64>,
}

/// What `GET /ocr/{id}` answered when it answered at all.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Recognized(Vec<RecognizedText>),
    /// Structured `{ "error": ... }` payload.
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Rejected(Option<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub status: u16,
    /// Identifier the upload was submitted under: `{roll_no}/{file_name}`.
    /// When that name is taken the service stores the copy as
    /// `{stem}_v{HHMMSS}{ext}`, a name the client cannot see.
    pub stored_as: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PresenceEvent {
    Opened,
    Count(u64),
    Closed { reason: Option<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Tick {
        ticket: Ticket,
        increment: f64,
    },
    AnalysisSettled {
        ticket: Ticket,
        result: Result<AnalysisOutcome, ServiceError>,
    },
    DeleteSettled {
        ticket: Ticket,
        identifier: String,
        result: Result<DeleteOutcome, ServiceError>,
    },
    UploadSettled {
        ticket: Ticket,
        result: Result<UploadReceipt, ServiceError>,
    },
    DownloadFinished {
        identifier: String,
        result: Result<PathBuf, ServiceError>,
    },
    Presence(PresenceEvent),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ServiceError {
    pub kind: FailureKind,
    pub message: String,
}

impl ServiceError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Decode,
    Io,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::Io => write!(f, "io error"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("presence connect timed out")]
    ConnectTimeout,
    #[error("presence transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("presence channel refused: {0}")]
    Refused(String),
}
