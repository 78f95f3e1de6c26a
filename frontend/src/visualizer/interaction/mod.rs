// User gestures: wheel, pinch, double-click, drag and goto

mod handler;
mod wheel;
mod zoom;

pub use handler::{InteractionHandler, WheelDisposition};
pub use wheel::{WheelCoalescer, WheelGesture, WheelPhase};
pub use zoom::{pinch_zoom, zoom_and_center};
