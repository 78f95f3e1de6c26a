//! Contact-map viewer navigation engine
//!
//! Holds the navigation state of each viewer, turns gestures into validated
//! state transitions, coalesces render requests and keeps synchronized
//! viewers on the same genomic region.

pub mod dataflow;
pub mod dataset;
pub mod error;
pub mod viewer;
pub mod visualizer;

#[cfg(test)]
mod testing;

pub use dataset::{
    ContactRecord, Dataset, DatasetError, DatasetKind, LiveDataset, MatrixDataset, MatrixReader,
    MatrixRegion, build_chromosomes,
};
pub use error::ViewerError;
pub use viewer::{ContactMapViewer, sync_viewers};
pub use visualizer::canvas::{
    FixedViewport, RenderError, RenderScheduler, RenderStats, Renderer, ViewportProvider,
};
pub use visualizer::interaction::{WheelDisposition, WheelGesture};
pub use visualizer::state::{
    AxisRange, BookmarkParseError, NavigationState, StatePublished, StateRejection,
    TransitionError, TransitionOutcome, ZoomDirection,
};
pub use visualizer::sync::{PeerId, PeerSync, PeerTransport};
