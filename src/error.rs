//! Error types for fetching, profile storage and interactive commands.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to obtain a quote snapshot.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("quote service returned {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed quote response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failure to read or write the profile file.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to create profile directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read profile {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse profile {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write profile {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize profile: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A rejected command-line entry. The message is shown in the command row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("parse error: {0}")]
    InvalidTickers(String),

    #[error("portfolio not found: {0}")]
    PortfolioNotFound(String),

    #[error("missing portfolio name for '{0}'")]
    MissingPortfolioName(String),

    #[error("could not recognize command '{0}'")]
    UnknownCommand(String),

    #[error("couldn't find specified ticker(s): {0}")]
    TickerNotFound(String),
}
