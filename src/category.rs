use crate::{FailerError, Result};
use serde::{Deserialize, Serialize};

/// The three kinds of submission the site hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionType {
    Visual,
    Textual,
    Audio,
}

impl SubmissionType {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionType::Visual => "visual",
            SubmissionType::Textual => "textual",
            SubmissionType::Audio => "audio",
        }
    }
}

pub fn classify_category(segment: &str) -> Result<SubmissionType> {
    match segment {
        "/" => Ok(SubmissionType::Visual),
        "/stories/" => Ok(SubmissionType::Textual),
        "/music/" => Ok(SubmissionType::Audio),
        other => Err(FailerError::UnknownCategory(other.to_string())),
    }
}
