pub mod cli;
pub mod config;
pub mod document;
pub mod logging;
pub mod notifications;
pub mod storage;
pub mod tracking;
pub mod types;
pub mod utils;
pub mod watcher;

pub use config::Settings;
pub use document::{DocumentSource, FileSystemDocuments, TextDocument};
pub use notifications::{NotificationBroadcaster, TrackerEvent};
pub use storage::{AnnotationStore, JsonStore, StorageError};
pub use tracking::{
    Anchor, AnnotationDraft, Classification, DocumentEvent, RangeTracker, TextChange,
    TrackingError, TrackingReport, classify_changes, reanchor,
};
pub use types::{Annotation, AnnotationId, Position, Tag, TagId, TextRange};
pub use watcher::{AnnotationWatcher, WatchError};
