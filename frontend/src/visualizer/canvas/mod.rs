// Render collaborators and the scheduler that drives them

mod scheduler;

pub use scheduler::{PendingRenderRequest, RenderScheduler, RenderStats};

use futures::future::LocalBoxFuture;
use shared::ViewDimensions;
use std::cell::Cell;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("canvas is not attached")]
    NoCanvas,
    #[error("repaint failed: {0}")]
    Failed(String),
}

/// Draws the contact map for whatever state is active when it runs.
pub trait Renderer {
    fn repaint(&self) -> LocalBoxFuture<'_, Result<(), RenderError>>;
}

pub trait ViewportProvider {
    fn view_dimensions(&self) -> ViewDimensions;
}

/// Viewport with externally driven size, for headless use.
#[derive(Debug, Default)]
pub struct FixedViewport(Cell<ViewDimensions>);

impl FixedViewport {
    pub fn new(dimensions: ViewDimensions) -> Self {
        Self(Cell::new(dimensions))
    }

    pub fn resize(&self, dimensions: ViewDimensions) {
        self.0.set(dimensions);
    }
}

impl ViewportProvider for FixedViewport {
    fn view_dimensions(&self) -> ViewDimensions {
        self.0.get()
    }
}
