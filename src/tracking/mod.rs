//! Range tracking: keeps annotation coordinates attached to their text.
//!
//! - [`classifier`] decides per change whether an annotation shifts or
//!   must be reanchored
//! - [`reanchor`] relocates a snapshot by exact search and context scoring
//! - [`capture`] builds new annotations from a selection
//! - [`tracker`] dispatches document events and persists the results

pub mod capture;
pub mod classifier;
pub mod error;
pub mod reanchor;
pub mod tracker;

pub use capture::{AnnotationDraft, DEFAULT_CONTEXT_LINES};
pub use classifier::{Classification, TextChange, classify_changes};
pub use error::{TrackingError, TrackingResult};
pub use reanchor::{Anchor, context_score, find_occurrences, is_anchored, reanchor};
pub use tracker::{DocumentEvent, RangeTracker, TrackingReport};
