// Visualizer Module - navigation state, gestures and render scheduling
//
// Leaves first: state (navigation state, transitions, state manager),
// interaction (gesture handling and wheel coalescing), canvas (render
// scheduling) and sync (peer propagation policy).

pub mod canvas;
pub mod interaction;
pub mod state;
pub mod sync;
