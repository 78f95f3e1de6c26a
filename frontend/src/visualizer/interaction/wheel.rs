//! Wheel event coalescing.
//!
//! Wheel ticks arrive faster than a zoom transition completes. While one is
//! being processed, further ticks fold into a single pending gesture: the
//! scale factors multiply and the anchor follows the pointer.

use std::cell::Cell;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelGesture {
    pub anchor_x: f64,
    pub anchor_y: f64,
    pub scale_factor: f64,
}

impl WheelGesture {
    fn fold(self, later: WheelGesture) -> WheelGesture {
        WheelGesture {
            anchor_x: later.anchor_x,
            anchor_y: later.anchor_y,
            scale_factor: self.scale_factor * later.scale_factor,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WheelPhase {
    #[default]
    Idle,
    Processing,
}

#[derive(Debug, Default)]
pub struct WheelCoalescer {
    phase: Cell<WheelPhase>,
    pending: Cell<Option<WheelGesture>>,
}

/// Returns the coalescer to `Idle` and discards anything still pending
/// when processing ends, including by error.
pub struct WheelProcessing<'a>(&'a WheelCoalescer);

impl Drop for WheelProcessing<'_> {
    fn drop(&mut self) {
        self.0.pending.set(None);
        self.0.phase.set(WheelPhase::Idle);
    }
}

impl WheelCoalescer {
    pub fn phase(&self) -> WheelPhase {
        self.phase.get()
    }

    pub fn pending(&self) -> Option<WheelGesture> {
        self.pending.get()
    }

    /// Start processing `gesture`, or fold it into the pending buffer when
    /// processing is already under way (`None`).
    pub fn begin(&self, gesture: WheelGesture) -> Option<WheelProcessing<'_>> {
        match self.phase.get() {
            WheelPhase::Processing => {
                let folded = match self.pending.get() {
                    Some(pending) => pending.fold(gesture),
                    None => gesture,
                };
                self.pending.set(Some(folded));
                None
            }
            WheelPhase::Idle => {
                self.phase.set(WheelPhase::Processing);
                Some(WheelProcessing(self))
            }
        }
    }

    /// Take whatever accumulated during the last transition.
    pub fn take_pending(&self) -> Option<WheelGesture> {
        self.pending.take()
    }
}
