//! Gesture entry points. Each gesture clones the active state, runs its
//! transition and commits the result through the state manager.

use super::wheel::{WheelCoalescer, WheelGesture};
use super::zoom;
use crate::dataset::Dataset;
use crate::error::ViewerError;
use crate::visualizer::canvas::ViewportProvider;
use crate::visualizer::state::{
    AxisRange, NavigationContext, NavigationState, StateManager, TransitionError,
    TransitionOutcome, ZoomDirection,
};
use shared::{LocusQuery, LocusTarget, ViewDimensions};
use std::cell::Cell;
use std::rc::Rc;

/// How a wheel tick was handled.
#[derive(Debug, Clone, PartialEq)]
pub enum WheelDisposition {
    /// Folded into the gesture pending behind the running transition.
    Coalesced,
    /// Ran as a transition, followed by every gesture that accumulated
    /// meanwhile, in order.
    Processed(Vec<WheelGesture>),
}

pub struct InteractionHandler {
    manager: Rc<StateManager>,
    viewport: Rc<dyn ViewportProvider>,
    resolution_locked: Cell<bool>,
    wheel: WheelCoalescer,
}

impl InteractionHandler {
    pub fn new(
        manager: Rc<StateManager>,
        viewport: Rc<dyn ViewportProvider>,
        resolution_locked: bool,
    ) -> Self {
        Self {
            manager,
            viewport,
            resolution_locked: Cell::new(resolution_locked),
            wheel: WheelCoalescer::default(),
        }
    }

    pub fn resolution_locked(&self) -> bool {
        self.resolution_locked.get()
    }

    pub fn set_resolution_locked(&self, locked: bool) {
        self.resolution_locked.set(locked);
    }

    pub fn wheel(&self) -> &WheelCoalescer {
        &self.wheel
    }

    fn session(&self) -> Result<(Rc<dyn Dataset>, ViewDimensions, NavigationState), ViewerError> {
        let dataset = self.manager.dataset().ok_or(ViewerError::NoDataset)?;
        Ok((dataset, self.viewport.view_dimensions(), self.manager.current()))
    }

    async fn commit(
        &self,
        state: &NavigationState,
        viewport: ViewDimensions,
    ) -> Result<TransitionOutcome, ViewerError> {
        Ok(self.manager.apply(state, viewport).await?)
    }

    pub async fn pan(&self, dx: f64, dy: f64) -> Result<TransitionOutcome, ViewerError> {
        let (dataset, viewport, mut state) = self.session()?;
        let ctx = NavigationContext::new(dataset.as_ref(), viewport);
        state.pan_shift(dx, dy, &ctx)?;
        self.commit(&state, viewport).await
    }

    pub async fn pinch_zoom(
        &self,
        anchor_x: f64,
        anchor_y: f64,
        factor: f64,
    ) -> Result<TransitionOutcome, ViewerError> {
        let (dataset, viewport, mut state) = self.session()?;
        let ctx = NavigationContext::new(dataset.as_ref(), viewport);
        zoom::pinch_zoom(
            &mut state,
            &ctx,
            self.resolution_locked(),
            anchor_x,
            anchor_y,
            factor,
        )
        .await?;
        self.commit(&state, viewport).await
    }

    /// Double-click zoom.
    pub async fn zoom_and_center(
        &self,
        direction: ZoomDirection,
        anchor_x: f64,
        anchor_y: f64,
    ) -> Result<TransitionOutcome, ViewerError> {
        let (dataset, viewport, mut state) = self.session()?;
        let ctx = NavigationContext::new(dataset.as_ref(), viewport);
        zoom::zoom_and_center(
            &mut state,
            &ctx,
            self.resolution_locked(),
            direction,
            anchor_x,
            anchor_y,
        )
        .await?;
        self.commit(&state, viewport).await
    }

    /// Wheel zoom with coalescing. A tick arriving while an earlier one is
    /// still being processed is folded into the pending gesture and picked
    /// up by the running call once its transition completes.
    ///
    /// If a transition fails the gesture pending behind it is discarded.
    pub async fn wheel_zoom(&self, gesture: WheelGesture) -> Result<WheelDisposition, ViewerError> {
        let Some(_processing) = self.wheel.begin(gesture) else {
            return Ok(WheelDisposition::Coalesced);
        };

        let mut processed = Vec::new();
        let mut next = Some(gesture);
        while let Some(gesture) = next {
            self.pinch_zoom(gesture.anchor_x, gesture.anchor_y, gesture.scale_factor)
                .await?;
            processed.push(gesture);
            next = self.wheel.take_pending();
        }
        Ok(WheelDisposition::Processed(processed))
    }

    /// Goto from the free-text locus syntax, e.g. `chr1:1,000-2,000 chr2`.
    pub async fn goto_locus(&self, input: &str) -> Result<TransitionOutcome, ViewerError> {
        let query: LocusQuery = input.parse()?;
        let (dataset, _, _) = self.session()?;
        match query {
            LocusQuery::WholeGenome => {
                let index = dataset
                    .chromosomes()
                    .iter()
                    .position(|chromosome| chromosome.is_whole_genome())
                    .ok_or_else(|| {
                        TransitionError::UnknownChromosomeName(shared::WHOLE_GENOME_NAME.to_string())
                    })?;
                self.select_chromosomes(index, index).await
            }
            LocusQuery::Loci { x, y } => {
                let x = resolve_target(dataset.as_ref(), &x)?;
                let y = resolve_target(dataset.as_ref(), &y)?;
                self.goto(x, y).await
            }
        }
    }

    pub async fn goto(&self, x: AxisRange, y: AxisRange) -> Result<TransitionOutcome, ViewerError> {
        let (dataset, viewport, mut state) = self.session()?;
        let ctx = NavigationContext::new(dataset.as_ref(), viewport);
        state
            .update_with_loci(x, y, self.resolution_locked(), &ctx)
            .await?;
        self.commit(&state, viewport).await
    }

    /// Chromosome picker.
    pub async fn select_chromosomes(
        &self,
        chr1_index: usize,
        chr2_index: usize,
    ) -> Result<TransitionOutcome, ViewerError> {
        let (dataset, viewport, mut state) = self.session()?;
        let ctx = NavigationContext::new(dataset.as_ref(), viewport);
        state.set_chromosomes(chr1_index, chr2_index, &ctx).await?;
        self.commit(&state, viewport).await
    }

    /// Resolution picker.
    pub async fn set_zoom(&self, zoom_index: usize) -> Result<TransitionOutcome, ViewerError> {
        let (dataset, viewport, mut state) = self.session()?;
        let ctx = NavigationContext::new(dataset.as_ref(), viewport);
        state.set_with_zoom(zoom_index, &ctx).await?;
        self.commit(&state, viewport).await
    }
}

fn resolve_target(dataset: &dyn Dataset, target: &LocusTarget) -> Result<AxisRange, ViewerError> {
    let chromosome = dataset
        .chromosome_index(&target.chr)
        .and_then(|index| dataset.chromosome(index))
        .ok_or_else(|| TransitionError::UnknownChromosomeName(target.chr.clone()))?;
    let (chr_index, length_bp) = (chromosome.index, chromosome.length_bp);
    let (start_bp, end_bp) = target.range.unwrap_or((0, length_bp));
    Ok(AxisRange {
        chr_index,
        start_bp,
        end_bp: end_bp.min(length_bp),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{GatedDataset, fixture_dataset};
    use crate::visualizer::canvas::FixedViewport;
    use crate::visualizer::interaction::WheelPhase;
    use shared::Normalization;

    async fn handler_with(dataset: Rc<dyn Dataset>) -> (InteractionHandler, Rc<StateManager>) {
        let (manager, _stream) = StateManager::new(Normalization::default());
        let manager = Rc::new(manager);
        let viewport = Rc::new(FixedViewport::new(ViewDimensions::new(800.0, 800.0)));
        manager
            .load_dataset(dataset, viewport.view_dimensions())
            .await
            .unwrap();
        (InteractionHandler::new(manager.clone(), viewport, false), manager)
    }

    fn tick(anchor: f64, scale_factor: f64) -> WheelGesture {
        WheelGesture { anchor_x: anchor, anchor_y: anchor, scale_factor }
    }

    #[tokio::test]
    async fn wheel_ticks_during_transition_run_as_one() {
        let dataset = Rc::new(GatedDataset::new(fixture_dataset()));
        let (handler, manager) = handler_with(dataset.clone()).await;
        handler.select_chromosomes(1, 1).await.unwrap();

        let gate = dataset.arm();
        let first = handler.wheel_zoom(tick(400.0, 1.5));
        let burst = async {
            for gesture in [tick(100.0, 2.0), tick(200.0, 0.5), tick(300.0, 3.0)] {
                let disposition = handler.wheel_zoom(gesture).await;
                assert!(matches!(disposition, Ok(WheelDisposition::Coalesced)));
            }
            assert_eq!(handler.wheel().phase(), WheelPhase::Processing);
            gate.open();
        };
        let (result, ()) = futures::join!(first, burst);

        assert_eq!(
            result.unwrap(),
            WheelDisposition::Processed(vec![tick(400.0, 1.5), tick(300.0, 2.0 * 0.5 * 3.0)])
        );
        assert_eq!(handler.wheel().phase(), WheelPhase::Idle);
        assert!(manager.current().chr1_index() <= manager.current().chr2_index());
    }

    #[tokio::test]
    async fn failed_wheel_transition_returns_to_idle() {
        let (manager, _stream) = StateManager::new(Normalization::default());
        let viewport = Rc::new(FixedViewport::new(ViewDimensions::default()));
        let handler = InteractionHandler::new(Rc::new(manager), viewport, false);

        let result = handler.wheel_zoom(tick(10.0, 2.0)).await;

        assert!(matches!(result, Err(ViewerError::NoDataset)));
        assert_eq!(handler.wheel().phase(), WheelPhase::Idle);
        assert!(handler.wheel().pending().is_none());
    }

    #[tokio::test]
    async fn goto_locus_resolves_names_and_ranges() {
        let (handler, manager) = handler_with(Rc::new(fixture_dataset())).await;

        handler.goto_locus("chr2:1,000,001-2,000,000 1").await.unwrap();

        let state = manager.current();
        assert_eq!((state.chr1_index(), state.chr2_index()), (1, 2));
        let locus = state.locus().unwrap();
        assert_eq!((locus.y.chr.as_str(), locus.y.start, locus.y.end), ("chr2", 1_000_000, 2_000_000));
        assert_eq!((locus.x.chr.as_str(), locus.x.start), ("chr1", 0));
    }

    #[tokio::test]
    async fn goto_all_opens_genome_overview() {
        let (handler, manager) = handler_with(Rc::new(fixture_dataset())).await;
        handler.goto_locus("chr3").await.unwrap();
        assert_eq!(manager.current().chr1_index(), 3);

        let outcome = handler.goto_locus("ALL").await.unwrap();

        assert_eq!(manager.current().chr1_index(), 0);
        assert!(outcome.chr_changed);
    }

    #[tokio::test]
    async fn unknown_chromosome_leaves_state_untouched() {
        let (handler, manager) = handler_with(Rc::new(fixture_dataset())).await;
        handler.goto_locus("chr1:1-5000000").await.unwrap();
        let before = manager.current();

        let result = handler.goto_locus("chr1 chrZ:1-10").await;

        assert!(matches!(
            result,
            Err(ViewerError::Transition(TransitionError::UnknownChromosomeName(name))) if name == "chrZ"
        ));
        assert!(matches!(handler.goto_locus("chr1:9-1").await, Err(ViewerError::Locus(_))));
        assert_eq!(manager.current(), before);
    }

    #[tokio::test]
    async fn range_past_chromosome_end_is_rejected() {
        let (handler, manager) = handler_with(Rc::new(fixture_dataset())).await;
        handler.goto_locus("chr1:1-5000000").await.unwrap();
        let before = manager.current();

        let result = handler.goto_locus("chr1:200,000,001-300,000,000").await;

        assert!(matches!(
            result,
            Err(ViewerError::Transition(TransitionError::EmptyRange { chr, start_bp: 200_000_000, .. }))
                if chr == "chr1"
        ));
        assert_eq!(manager.current(), before);
    }

    #[tokio::test]
    async fn locked_resolution_survives_goto() {
        let (handler, manager) = handler_with(Rc::new(fixture_dataset())).await;
        handler.select_chromosomes(1, 1).await.unwrap();
        let zoom = manager.current().zoom_index();
        handler.set_resolution_locked(true);

        handler.goto_locus("chr1:1-100000").await.unwrap();

        assert_eq!(manager.current().zoom_index(), zoom);
    }

    #[tokio::test]
    async fn drag_pans_committed_state() {
        let (handler, manager) = handler_with(Rc::new(fixture_dataset())).await;
        handler.goto_locus("chr1:1-10000000").await.unwrap();
        let before = manager.current().bin_x();

        handler.pan(80.0, 0.0).await.unwrap();

        let after = manager.current();
        assert_eq!(after.bin_x(), before + 80.0 / after.pixel_size());
    }

    #[tokio::test]
    async fn set_zoom_rejects_unknown_resolution() {
        let (handler, manager) = handler_with(Rc::new(fixture_dataset())).await;
        let before = manager.current();
        assert!(matches!(
            handler.set_zoom(42).await,
            Err(ViewerError::Transition(TransitionError::ZoomOutOfRange(42)))
        ));
        assert_eq!(manager.current(), before);
    }
}
