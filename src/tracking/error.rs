//! Errors raised while creating annotations.
//!
//! Reanchoring itself is total and never produces one of these.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::TextRange;

#[derive(Error, Debug)]
pub enum TrackingError {
    #[error("Cannot annotate an empty range at {range} in {path}")]
    EmptySelection { path: PathBuf, range: TextRange },

    #[error("Range {range} is outside of {path}")]
    OutOfBounds { path: PathBuf, range: TextRange },

    #[error("An annotation needs at least one tag")]
    NoTags,
}

pub type TrackingResult<T> = Result<T, TrackingError>;
