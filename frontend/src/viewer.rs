//! One contact-map viewer: state manager, gesture handling, render
//! scheduling and peer sync wired together.
//!
//! Locally authored changes render with `should_sync` set so peers follow;
//! states received from a peer render without it.

use crate::dataset::{ContactRecord, Dataset, MatrixRegion};
use crate::error::ViewerError;
use crate::visualizer::canvas::{RenderScheduler, RenderStats, Renderer, ViewportProvider};
use crate::visualizer::interaction::{InteractionHandler, WheelDisposition, WheelGesture};
use crate::visualizer::state::{
    AxisRange, NavigationContext, NavigationState, StateManager, StatePublished,
    TransitionOutcome, ZoomDirection,
};
use crate::visualizer::sync::{PeerId, PeerSync, PeerTransport};
use futures::FutureExt;
use futures::channel::mpsc::UnboundedReceiver;
use futures::future::LocalBoxFuture;
use futures_signals::signal::Signal;
use shared::{Normalization, SyncState, ViewDimensions, ViewerSection};
use std::rc::Rc;

pub struct ContactMapViewer {
    id: PeerId,
    manager: Rc<StateManager>,
    handler: InteractionHandler,
    scheduler: RenderScheduler,
    sync: Rc<PeerSync>,
    viewport: Rc<dyn ViewportProvider>,
}

impl ContactMapViewer {
    pub fn new(
        config: &ViewerSection,
        viewport: Rc<dyn ViewportProvider>,
        renderer: Rc<dyn Renderer>,
    ) -> (Rc<Self>, UnboundedReceiver<StatePublished>) {
        let (manager, state_published_stream) =
            StateManager::new(Normalization::new(config.default_normalization.clone()));
        let manager = Rc::new(manager);
        let sync = Rc::new(PeerSync::new(manager.clone(), config.sync_enabled));
        let viewer = Self {
            id: PeerId::next(),
            handler: InteractionHandler::new(
                manager.clone(),
                viewport.clone(),
                config.resolution_locked,
            ),
            scheduler: RenderScheduler::new(renderer, sync.clone()),
            manager,
            sync,
            viewport,
        };
        (Rc::new(viewer), state_published_stream)
    }

    pub fn id(&self) -> PeerId {
        self.id
    }

    pub fn state(&self) -> NavigationState {
        self.manager.current()
    }

    pub fn state_signal(&self) -> impl Signal<Item = NavigationState> + use<> {
        self.manager.state_signal()
    }

    pub fn dataset(&self) -> Option<Rc<dyn Dataset>> {
        self.manager.dataset()
    }

    pub fn view_dimensions(&self) -> ViewDimensions {
        self.viewport.view_dimensions()
    }

    pub fn render_stats(&self) -> RenderStats {
        self.scheduler.stats()
    }

    pub fn interaction(&self) -> &InteractionHandler {
        &self.handler
    }

    // ===== SESSION =====

    pub async fn load_dataset(&self, dataset: Rc<dyn Dataset>) -> Result<TransitionOutcome, ViewerError> {
        let outcome = self
            .manager
            .load_dataset(dataset, self.view_dimensions())
            .await?;
        self.scheduler.request_update(false).await;
        Ok(outcome)
    }

    pub fn set_control_dataset(&self, dataset: Option<Rc<dyn Dataset>>) {
        self.manager.set_control_dataset(dataset);
    }

    pub fn clear_session(&self) {
        self.manager.clear_session();
    }

    // ===== GESTURES =====

    async fn rendered(
        &self,
        result: Result<TransitionOutcome, ViewerError>,
    ) -> Result<TransitionOutcome, ViewerError> {
        let outcome = result?;
        self.scheduler.request_update(true).await;
        Ok(outcome)
    }

    pub async fn pan(&self, dx: f64, dy: f64) -> Result<TransitionOutcome, ViewerError> {
        self.rendered(self.handler.pan(dx, dy).await).await
    }

    pub async fn pinch_zoom(
        &self,
        anchor_x: f64,
        anchor_y: f64,
        factor: f64,
    ) -> Result<TransitionOutcome, ViewerError> {
        self.rendered(self.handler.pinch_zoom(anchor_x, anchor_y, factor).await)
            .await
    }

    pub async fn zoom_and_center(
        &self,
        direction: ZoomDirection,
        anchor_x: f64,
        anchor_y: f64,
    ) -> Result<TransitionOutcome, ViewerError> {
        self.rendered(self.handler.zoom_and_center(direction, anchor_x, anchor_y).await)
            .await
    }

    pub async fn wheel_zoom(&self, gesture: WheelGesture) -> Result<WheelDisposition, ViewerError> {
        let disposition = self.handler.wheel_zoom(gesture).await?;
        if let WheelDisposition::Processed(_) = disposition {
            self.scheduler.request_update(true).await;
        }
        Ok(disposition)
    }

    pub async fn goto_locus(&self, input: &str) -> Result<TransitionOutcome, ViewerError> {
        self.rendered(self.handler.goto_locus(input).await).await
    }

    pub async fn goto(&self, x: AxisRange, y: AxisRange) -> Result<TransitionOutcome, ViewerError> {
        self.rendered(self.handler.goto(x, y).await).await
    }

    pub async fn select_chromosomes(
        &self,
        chr1_index: usize,
        chr2_index: usize,
    ) -> Result<TransitionOutcome, ViewerError> {
        self.rendered(self.handler.select_chromosomes(chr1_index, chr2_index).await)
            .await
    }

    pub async fn set_zoom(&self, zoom_index: usize) -> Result<TransitionOutcome, ViewerError> {
        self.rendered(self.handler.set_zoom(zoom_index).await).await
    }

    // ===== STATE =====

    /// Adopt a complete candidate state, e.g. from a restored session.
    pub async fn set_state(&self, candidate: &NavigationState) -> Result<TransitionOutcome, ViewerError> {
        let result = self
            .manager
            .apply(candidate, self.view_dimensions())
            .await
            .map_err(ViewerError::from);
        self.rendered(result).await
    }

    pub async fn set_state_from_bookmark(&self, bookmark: &str) -> Result<TransitionOutcome, ViewerError> {
        let candidate: NavigationState = bookmark.parse()?;
        self.set_state(&candidate).await
    }

    pub async fn set_state_from_json(&self, json: &str) -> Result<TransitionOutcome, ViewerError> {
        let candidate: NavigationState =
            serde_json::from_str(json).map_err(|error| ViewerError::StateRecord(error.to_string()))?;
        self.set_state(&candidate).await
    }

    pub fn state_json(&self) -> Result<String, ViewerError> {
        serde_json::to_string(&self.state()).map_err(|error| ViewerError::StateRecord(error.to_string()))
    }

    /// Normalization is local to a viewer, so peers are not told.
    pub async fn set_normalization(&self, normalization: Normalization) -> Result<(), ViewerError> {
        let mut state = self.state();
        state.set_normalization(normalization);
        self.manager.apply(&state, self.view_dimensions()).await?;
        self.scheduler.request_update(false).await;
        Ok(())
    }

    pub async fn set_selected_gene(&self, gene: Option<String>) -> Result<(), ViewerError> {
        let mut state = self.state();
        state.set_selected_gene(gene);
        self.manager.apply(&state, self.view_dimensions()).await?;
        Ok(())
    }

    pub fn set_resolution_locked(&self, locked: bool) {
        self.handler.set_resolution_locked(locked);
    }

    /// Matrix region covered by the viewport at the active state.
    pub fn visible_region(&self) -> Option<MatrixRegion> {
        self.manager.dataset()?;
        let state = self.state();
        let viewport = self.view_dimensions();
        let bins_x = viewport.width / state.pixel_size();
        let bins_y = viewport.height / state.pixel_size();
        Some(MatrixRegion {
            chr1_index: state.chr1_index(),
            chr2_index: state.chr2_index(),
            zoom_index: state.zoom_index(),
            bin_x_start: state.bin_x().floor() as u64,
            bin_x_end: (state.bin_x() + bins_x).ceil() as u64,
            bin_y_start: state.bin_y().floor() as u64,
            bin_y_end: (state.bin_y() + bins_y).ceil() as u64,
            normalization: state.normalization().clone(),
        })
    }

    pub async fn visible_records(&self) -> Result<Vec<ContactRecord>, ViewerError> {
        let dataset = self.manager.dataset().ok_or(ViewerError::NoDataset)?;
        let region = self.visible_region().ok_or(ViewerError::NoDataset)?;
        Ok(dataset.contact_records_for(region).await?)
    }

    // ===== PEER SYNC =====

    pub fn sync_state(&self) -> Option<SyncState> {
        self.sync.export_state()
    }

    pub fn set_sync_enabled(&self, enabled: bool) {
        self.sync.set_enabled(enabled);
    }

    pub fn register_peer(&self, peer: &Rc<dyn PeerTransport>) -> bool {
        if peer.peer_id() == self.id {
            return false;
        }
        self.sync.register(peer)
    }

    pub fn unregister_peer(&self, id: PeerId) -> bool {
        self.sync.unregister(id)
    }

    /// Adopt a peer's state. Incompatible states are ignored and reported
    /// as `Ok(false)`; the render that follows never propagates further.
    pub async fn receive_sync_state(&self, peer: SyncState) -> Result<bool, ViewerError> {
        let Some(dataset) = self.manager.dataset() else {
            log::debug!("ignoring peer state, no dataset loaded");
            return Ok(false);
        };
        if !dataset.is_compatible(&peer) {
            log::debug!(
                "ignoring incompatible peer state {}/{} from genome {:?}",
                peer.chr1_name,
                peer.chr2_name,
                peer.genome_id
            );
            return Ok(false);
        }

        let viewport = self.view_dimensions();
        let ctx = NavigationContext::new(dataset.as_ref(), viewport);
        let mut state = self.state();
        state.sync(&peer, &ctx)?;
        self.manager.apply(&state, viewport).await?;
        self.scheduler.request_update(false).await;
        Ok(true)
    }
}

impl PeerTransport for ContactMapViewer {
    fn peer_id(&self) -> PeerId {
        self.id
    }

    fn receive_sync_state(&self, state: SyncState) -> LocalBoxFuture<'_, ()> {
        async move {
            if let Err(error) = ContactMapViewer::receive_sync_state(self, state).await {
                log::warn!("peer state rejected: {error}");
            }
        }
        .boxed_local()
    }
}

/// Make every viewer a peer of every other.
pub fn sync_viewers(viewers: &[Rc<ContactMapViewer>]) {
    for viewer in viewers {
        for other in viewers {
            let peer: Rc<dyn PeerTransport> = other.clone();
            viewer.register_peer(&peer);
        }
    }
}
