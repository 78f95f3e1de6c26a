// Navigation state, its transitions and the manager holding the active one

mod navigation_state;
mod state_manager;
mod transitions;

pub use navigation_state::{BookmarkParseError, NavigationState};
pub use state_manager::{StateManager, StatePublished, StateRejection};
pub use transitions::{
    AxisRange, NavigationContext, TransitionError, TransitionOutcome, ZoomDirection,
    floor_pixel_size,
};
