//! File watcher that keeps annotations anchored while files change on disk.
//!
//! # Architecture
//!
//! ```text
//! notify::RecommendedWatcher ──> mpsc ──> AnnotationWatcher
//!                                           - PathRegistry (absolute <-> relative)
//!                                           - Debouncer
//!                                           - content hashes
//!                                                 │
//!                                   Arc<Mutex<RangeTracker<S>>>
//! ```

mod annotation_watcher;
mod debouncer;
mod error;
mod path_registry;

pub use annotation_watcher::{AnnotationWatcher, AnnotationWatcherBuilder};
pub use debouncer::Debouncer;
pub use error::WatchError;
pub use path_registry::PathRegistry;
