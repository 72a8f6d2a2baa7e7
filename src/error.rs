use std::path::PathBuf;

/// Bytes that can't be turned into (or built from) a protocol frame.
///
/// These are never answered on the wire: a malformed inbound frame is dropped
/// and the connection stays open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FramingError {
    #[error("command longer than {} bytes", crate::network::wire::CMD_FIELD_LENGTH)]
    CommandTooLong,
    #[error("payload longer than {} bytes", crate::network::wire::MAX_DATA_LENGTH)]
    PayloadTooLong,
    #[error("command contains the frame delimiter")]
    InvalidCommand,
    #[error("malformed frame")]
    Malformed,
}

/// A well-formed frame whose payload doesn't fit the command it carries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("{0:?} is not a client command")]
    NotAClientCommand(crate::network::wire::Command),
    #[error("{command:?} payload {payload:?} is missing fields")]
    MissingFields {
        command: crate::network::wire::Command,
        payload: String,
    },
}

/// Failures reported back to the client inside an `ERROR` message.
///
/// The display strings are sent verbatim, so they are part of the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("Unrecognised username")]
    UnrecognisedUsername,
    #[error("Incorrect password")]
    IncorrectPassword,
    #[error("User already logged in")]
    UserAlreadyLoggedIn,
    #[error("User not connected")]
    NotConnected,
    #[error("Unrecognised command")]
    UnrecognisedCommand,
    #[error("Invalid answer")]
    InvalidAnswer,
    #[error("Unknown question")]
    UnknownQuestion,
    #[error("Malformed request")]
    MalformedRequest,
    /// The reply doesn't fit in one frame.
    #[error("Response too long")]
    ResponseTooLong,
}

impl From<RequestError> for GameError {
    fn from(e: RequestError) -> Self {
        match e {
            RequestError::NotAClientCommand(_) => GameError::UnrecognisedCommand,
            RequestError::MissingFields { .. } => GameError::MalformedRequest,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unable to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid json in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path}:{line}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    #[error("duplicate {kind} {key:?}")]
    Duplicate { kind: &'static str, key: String },
    #[error("question {id}: {reason}")]
    InvalidQuestion { id: u32, reason: &'static str },
}
