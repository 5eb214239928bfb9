use std::path::PathBuf;

use crate::timestamp::TimestampError;

#[derive(Debug, thiserror::Error)]
pub enum EpgError {
    #[error("guide not found: {}", .0.display())]
    GuideNotFound(PathBuf),
    #[error("cannot read guide {}: {source}", .path.display())]
    ReadGuide { path: PathBuf, #[source] source: std::io::Error },
    #[error("malformed XML at byte {position}: {source}")]
    MalformedXml { position: u64, #[source] source: quick_xml::Error },
    #[error("malformed XML: {0}")]
    BadStructure(String),
    #[error("{element} #{index} is missing {what}")]
    MissingField { element: &'static str, index: usize, what: &'static str },
    #[error("programme #{index} references unknown channel '{channel}'")]
    UnknownChannel { index: usize, channel: String },
    #[error("programme #{index} on channel '{channel}' has malformed {field} timestamp '{value}': {source}")]
    Timestamp { index: usize, channel: String, field: &'static str, value: String, #[source] source: TimestampError },
    #[error("cannot write {}: {source}", .path.display())]
    WriteOutput { path: PathBuf, #[source] source: std::io::Error },
}

pub type Result<T> = std::result::Result<T, EpgError>;
