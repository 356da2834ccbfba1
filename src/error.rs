// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{io, path::PathBuf, result};

use ipnet::IpNet;
use thiserror::Error;

pub(crate) type Result<T, E = Error> = result::Result<T, E>;

#[derive(Error, Debug)]
pub(crate) enum Error {
    #[error("IO operation failed: {0}")]
    Io(#[from] io::Error),
    #[error("JSON format error: {0}")]
    Json(serde_json::Error),
    #[error("{0}")]
    Fetch(#[from] Fetch),
    #[error("host source error: {0}")]
    HostSource(#[from] HostSource),
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        // LINT: Deliberate fall-through that should catch future cases added to
        // the enum.
        #[allow(clippy::wildcard_enum_match_arm)]
        match value.classify() {
            serde_json::error::Category::Io => Self::Io(value.into()),
            _ => Self::Json(value),
        }
    }
}

/// A failure to retrieve the authorized keys of a single host. None of these
/// are fatal to a scan as a whole.
#[derive(Error, Debug)]
pub(crate) enum Fetch {
    #[error("connection failed: {message}")]
    Connection { host: String, message: String },
    #[error("command failed: {message}")]
    Command { host: String, message: String },
    #[error("command wrote to stderr: {message}")]
    RemoteStderr { host: String, message: String },
}

impl Fetch {
    pub(crate) fn host(&self) -> &str {
        match self {
            Self::Connection { host, .. }
            | Self::Command { host, .. }
            | Self::RemoteStderr { host, .. } => host,
        }
    }
}

#[derive(Error, Debug)]
pub(crate) enum HostSource {
    #[error("neither a range nor a hosts file was given")]
    Missing,
    #[error("range {0} spans {1} address bits, which is more than we are willing to scan")]
    RangeTooLarge(IpNet, u8),
    #[error("could not read hosts file {}: {source}", .path.display())]
    File { path: PathBuf, source: io::Error },
}
