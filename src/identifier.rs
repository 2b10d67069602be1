//! PIRSA identifiers.
//!
//! A user-supplied string is either a video ID (`20200101`) or a collection
//! ID (`C00042`). The newtypes here can only be built through validation, so
//! the rest of the crate never handles an unchecked identifier.

use std::fmt;
use std::str::FromStr;

use crate::error::{DownloadError, Result};

const VIDEO_ID_LEN: usize = 8;
const COLLECTION_DIGITS: usize = 5;

/// An 8-digit video identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

/// A collection identifier: `C` followed by 5 digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionId(String);

/// A classified identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    Video(VideoId),
    Collection(CollectionId),
}

fn all_ascii_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

fn is_video_id(raw: &str) -> bool {
    raw.len() == VIDEO_ID_LEN && all_ascii_digits(raw)
}

fn is_collection_id(raw: &str) -> bool {
    match raw.strip_prefix('C') {
        Some(digits) => digits.len() == COLLECTION_DIGITS && all_ascii_digits(digits),
        None => false,
    }
}

/// Classify a raw string as a video or collection identifier.
///
/// The whole string must match; surrounding whitespace or extra characters
/// are rejected.
pub fn classify(raw: &str) -> Result<Identifier> {
    match (is_video_id(raw), is_collection_id(raw)) {
        (true, false) => Ok(Identifier::Video(VideoId(raw.to_string()))),
        (false, true) => Ok(Identifier::Collection(CollectionId(raw.to_string()))),
        _ => Err(DownloadError::invalid_identifier(raw)),
    }
}

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl CollectionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for VideoId {
    type Err = DownloadError;

    fn from_str(s: &str) -> Result<Self> {
        match classify(s)? {
            Identifier::Video(id) => Ok(id),
            Identifier::Collection(_) => Err(DownloadError::invalid_identifier(s)),
        }
    }
}

impl FromStr for CollectionId {
    type Err = DownloadError;

    fn from_str(s: &str) -> Result<Self> {
        match classify(s)? {
            Identifier::Collection(id) => Ok(id),
            Identifier::Video(_) => Err(DownloadError::invalid_identifier(s)),
        }
    }
}

impl FromStr for Identifier {
    type Err = DownloadError;

    fn from_str(s: &str) -> Result<Self> {
        classify(s)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Video(id) => write!(f, "video {}", id),
            Identifier::Collection(id) => write!(f, "collection {}", id),
        }
    }
}
