use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How the poll loop schedules receive cycles across clients.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PollMode {
    /// A single worker visits each client in configuration order.
    #[default]
    Sequential,
    /// One worker per client; clients never wait on each other's long polls.
    PerClient,
}

/// Errors encountered while parsing a [`PollMode`] from text.
pub type PollModeParseError = strum::ParseError;
