//! Client queue bindings and their validation.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable holding the input queue in single-client mode.
pub const INPUT_QUEUE_ENV: &str = "INPUT_QUEUE";

/// Opaque queue identifier understood by the queue transport (an SQS URL in
/// production).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct QueueLocator(String);

impl QueueLocator {
    /// Wraps a queue identifier.
    #[must_use]
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    /// Borrow the identifier as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for QueueLocator {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// A client and the queue it submits commands on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClientBinding {
    /// Client identifier used in logs.
    pub name: String,
    /// Queue polled for this client's commands.
    pub input_queue: QueueLocator,
}

impl ClientBinding {
    /// Creates a binding.
    #[must_use]
    pub fn new(name: impl Into<String>, input_queue: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input_queue: QueueLocator::new(input_queue),
        }
    }

    /// Client identifier.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Input queue for the client.
    #[must_use]
    pub fn input_queue(&self) -> &QueueLocator {
        &self.input_queue
    }
}

impl fmt::Display for ClientBinding {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}={}", self.name, self.input_queue)
    }
}

/// Errors produced when parsing a `name=queue` binding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientBindingParseError {
    /// The `=` separator was missing.
    #[error("binding '{0}' is missing the '=' separator between client and queue")]
    MissingSeparator(String),
    /// Either side of the separator was blank.
    #[error("binding '{0}' must name both a client and a queue")]
    Blank(String),
}

impl FromStr for ClientBinding {
    type Err = ClientBindingParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (name, queue) = input
            .split_once('=')
            .ok_or_else(|| ClientBindingParseError::MissingSeparator(input.to_string()))?;
        let (name, queue) = (name.trim(), queue.trim());
        if name.is_empty() || queue.is_empty() {
            return Err(ClientBindingParseError::Blank(input.to_string()));
        }
        Ok(Self::new(name, queue))
    }
}

/// Errors raised while turning configuration into client bindings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientResolutionError {
    /// No clients were configured.
    #[error("no clients configured; add [[clients]] entries or set client_name")]
    NoClients,
    /// A configured client had a blank name.
    #[error("client #{index} has an empty name")]
    BlankName {
        /// Position of the entry in the configured list.
        index: usize,
    },
    /// A configured client had a blank input queue.
    #[error("client '{client}' has an empty input queue")]
    BlankQueue {
        /// Offending client.
        client: String,
    },
    /// Two clients shared a name.
    #[error("client '{client}' is configured more than once")]
    DuplicateClient {
        /// Repeated client name.
        client: String,
    },
    /// Single-client mode was requested with a blank name.
    #[error("client_name must not be empty")]
    BlankClientName,
    /// Single-client mode could not read its queue from the environment.
    #[error("client '{client}' requires the {variable} environment variable")]
    MissingInputQueue {
        /// Client served in single-client mode.
        client: String,
        /// Variable that was missing or empty.
        variable: &'static str,
    },
}

pub(crate) fn single_client<F>(name: &str, lookup: F) -> Result<ClientBinding, ClientResolutionError>
where
    F: Fn(&str) -> Option<String>,
{
    let name = name.trim();
    if name.is_empty() {
        return Err(ClientResolutionError::BlankClientName);
    }
    let queue = lookup(INPUT_QUEUE_ENV)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ClientResolutionError::MissingInputQueue {
            client: name.to_string(),
            variable: INPUT_QUEUE_ENV,
        })?;
    Ok(ClientBinding::new(name, queue))
}

pub(crate) fn validate_bindings(
    bindings: &[ClientBinding],
) -> Result<Vec<ClientBinding>, ClientResolutionError> {
    if bindings.is_empty() {
        return Err(ClientResolutionError::NoClients);
    }
    let mut seen = HashSet::new();
    for (index, binding) in bindings.iter().enumerate() {
        if binding.name.trim().is_empty() {
            return Err(ClientResolutionError::BlankName { index });
        }
        if binding.input_queue.is_blank() {
            return Err(ClientResolutionError::BlankQueue {
                client: binding.name.clone(),
            });
        }
        if !seen.insert(binding.name.as_str()) {
            return Err(ClientResolutionError::DuplicateClient {
                client: binding.name.clone(),
            });
        }
    }
    Ok(bindings.to_vec())
}
