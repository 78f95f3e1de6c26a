use crate::dataset::DatasetError;
use crate::visualizer::state::{BookmarkParseError, StateRejection, TransitionError};
use shared::LocusParseError;

/// Errors surfaced by viewer operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViewerError {
    #[error("no dataset is loaded")]
    NoDataset,
    #[error("state rejected: {0}")]
    Rejected(#[from] StateRejection),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("invalid locus: {0}")]
    Locus(#[from] LocusParseError),
    #[error("invalid bookmark: {0}")]
    Bookmark(#[from] BookmarkParseError),
    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),
    #[error("invalid state record: {0}")]
    StateRecord(String),
}
