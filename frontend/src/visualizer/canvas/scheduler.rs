//! Single-flight render scheduling.
//!
//! At most one repaint runs at a time. Requests that arrive while one is in
//! flight collapse into a single pending slot, last writer wins, and the
//! caller that started the flight drains it before returning.

use super::Renderer;
use crate::visualizer::sync::PeerSync;
use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRenderRequest {
    pub should_sync: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub renders: u64,
    pub syncs_sent: u64,
    pub failures: u64,
}

pub struct RenderScheduler {
    renderer: Rc<dyn Renderer>,
    sync: Rc<PeerSync>,
    in_flight: Cell<bool>,
    pending: Cell<Option<PendingRenderRequest>>,
    stats: Cell<RenderStats>,
}

/// Clears the in-flight flag however the flight ends.
struct InFlight<'a>(&'a Cell<bool>);

impl<'a> InFlight<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl RenderScheduler {
    pub fn new(renderer: Rc<dyn Renderer>, sync: Rc<PeerSync>) -> Self {
        Self {
            renderer,
            sync,
            in_flight: Cell::new(false),
            pending: Cell::new(None),
            stats: Cell::new(RenderStats::default()),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.get()
    }

    pub fn stats(&self) -> RenderStats {
        self.stats.get()
    }

    pub async fn request_update(&self, should_sync: bool) {
        let request = PendingRenderRequest { should_sync };
        if self.in_flight.get() {
            self.pending.set(Some(request));
            return;
        }

        let _in_flight = InFlight::enter(&self.in_flight);
        let mut next = Some(request);
        while let Some(request) = next {
            self.render_once(request).await;
            next = self.pending.take();
        }
    }

    async fn render_once(&self, request: PendingRenderRequest) {
        match self.renderer.repaint().await {
            Ok(()) => {
                self.update_stats(|stats| stats.renders += 1);
                if request.should_sync {
                    let delivered = self.sync.propagate().await as u64;
                    self.update_stats(|stats| stats.syncs_sent += delivered);
                }
            }
            Err(error) => {
                log::error!("{error}");
                self.update_stats(|stats| stats.failures += 1);
            }
        }
    }

    fn update_stats(&self, update: impl FnOnce(&mut RenderStats)) {
        let mut stats = self.stats.get();
        update(&mut stats);
        self.stats.set(stats);
    }
}
