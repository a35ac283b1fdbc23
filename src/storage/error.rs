use std::path::PathBuf;
use thiserror::Error;

use crate::types::{AnnotationId, TagId};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Tag not found: {0}")]
    TagNotFound(TagId),

    #[error("Annotation not found: {0}")]
    AnnotationNotFound(AnnotationId),
}

pub type StorageResult<T> = Result<T, StorageError>;
