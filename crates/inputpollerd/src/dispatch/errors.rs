//! Error types for per-message dispatch failures.
//!
//! Every variant is terminal for the message that produced it: the
//! dispatcher logs it, skips the handler, and still deletes the message.

use std::fmt;

use thiserror::Error;

/// Which part of the envelope failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeDefect {
    /// One of the top-level fields is absent, empty, or of the wrong type.
    MissingFields,
    /// `data.workflow` is absent.
    MissingWorkflow,
    /// `data.workflow` is present but a required sub-field is unusable.
    InvalidWorkflow {
        /// Sub-field that was missing or empty.
        field: &'static str,
    },
}

impl fmt::Display for EnvelopeDefect {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFields => formatter
                .write_str("'time', 'type', 'job_id' or 'data' fields missing in JSON message"),
            Self::MissingWorkflow => formatter.write_str(
                "input doesn't contain any workflow information; \
                 provide the workflow this job should be sent to",
            ),
            Self::InvalidWorkflow { field } => {
                write!(formatter, "workflow field '{field}' is missing or empty")
            }
        }
    }
}

/// Errors surfaced while decoding, validating, or routing a message.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Body is not a JSON object.
    #[error("JSON data invalid: {message}")]
    Decode {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Envelope failed structural validation.
    #[error("invalid envelope: {defect}")]
    InvalidEnvelope { defect: EnvelopeDefect },

    /// Command type is not in the registry.
    #[error("command '{command_type}' is unknown")]
    UnknownCommand { command_type: String },

    /// Command payload could not be serialised as workflow input.
    #[error("failed to encode workflow input: {0}")]
    EncodeInput(#[source] serde_json::Error),
}

impl DispatchError {
    /// Creates a decode error from a serde error.
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::Decode {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a decode error with a custom message.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an invalid envelope error.
    pub fn invalid_envelope(defect: EnvelopeDefect) -> Self {
        Self::InvalidEnvelope { defect }
    }

    /// Creates an unknown command error.
    pub fn unknown_command(command_type: impl Into<String>) -> Self {
        Self::UnknownCommand {
            command_type: command_type.into(),
        }
    }

    /// Short machine-readable label used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode { .. } => "decode_error",
            Self::InvalidEnvelope { .. } => "invalid_envelope",
            Self::UnknownCommand { .. } => "unknown_command",
            Self::EncodeInput(_) => "encode_input",
        }
    }
}
