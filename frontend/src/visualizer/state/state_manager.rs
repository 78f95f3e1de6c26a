//! Holder of record for the active navigation state and dataset.

use super::{NavigationContext, NavigationState, TransitionError, TransitionOutcome, floor_pixel_size};
use crate::dataflow::{Relay, relay};
use crate::dataset::Dataset;
use futures::channel::mpsc::UnboundedReceiver;
use futures_signals::signal::{Mutable, Signal};
use shared::{Normalization, ViewDimensions};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateRejection {
    #[error("no dataset is loaded")]
    NoDataset,
    #[error("chromosome index {index} is out of range for {count} chromosomes")]
    ChromosomeOutOfRange { index: usize, count: usize },
    #[error("zoom index {index} is out of range for {count} resolutions")]
    ZoomOutOfRange { index: usize, count: usize },
    #[error("{0} must be a finite number")]
    NonFinite(&'static str),
    #[error(transparent)]
    Inconsistent(#[from] TransitionError),
}

/// Announcement of a newly accepted state.
#[derive(Debug, Clone, PartialEq)]
pub struct StatePublished {
    pub state: NavigationState,
    pub outcome: TransitionOutcome,
}

pub struct StateManager {
    dataset: RefCell<Option<Rc<dyn Dataset>>>,
    control_dataset: RefCell<Option<Rc<dyn Dataset>>>,
    default_normalization: Normalization,
    state: Mutable<NavigationState>,
    state_published_relay: Relay<StatePublished>,
}

impl StateManager {
    pub fn new(default_normalization: Normalization) -> (Self, UnboundedReceiver<StatePublished>) {
        let (state_published_relay, state_published_stream) = relay();
        let manager = Self {
            dataset: RefCell::new(None),
            control_dataset: RefCell::new(None),
            state: Mutable::new(
                NavigationState::default().with_normalization(default_normalization.clone()),
            ),
            default_normalization,
            state_published_relay,
        };
        (manager, state_published_stream)
    }

    pub fn dataset(&self) -> Option<Rc<dyn Dataset>> {
        self.dataset.borrow().clone()
    }

    pub fn control_dataset(&self) -> Option<Rc<dyn Dataset>> {
        self.control_dataset.borrow().clone()
    }

    pub fn set_control_dataset(&self, dataset: Option<Rc<dyn Dataset>>) {
        *self.control_dataset.borrow_mut() = dataset;
    }

    /// Snapshot of the active state.
    pub fn current(&self) -> NavigationState {
        self.state.get_cloned()
    }

    pub fn state_signal(&self) -> impl Signal<Item = NavigationState> + use<> {
        self.state.signal_cloned()
    }

    /// Validate a candidate against the active dataset and make it the
    /// active state. A rejected candidate leaves the previous state in force.
    pub async fn apply(
        &self,
        candidate: &NavigationState,
        viewport: ViewDimensions,
    ) -> Result<TransitionOutcome, StateRejection> {
        let dataset = self.dataset().ok_or(StateRejection::NoDataset)?;
        validate(dataset.as_ref(), candidate)?;

        let ctx = NavigationContext::new(dataset.as_ref(), viewport);
        let mut next = candidate.clone();
        let min_pixel_size = ctx
            .min_pixel_size(next.chr1_index, next.chr2_index, next.zoom_index)
            .await;
        next.pixel_size = floor_pixel_size(next.pixel_size, min_pixel_size);
        next.clamp_xy(&ctx)?;
        if next.locus.is_none() {
            next.configure_locus(&ctx)?;
        }

        let outcome = TransitionOutcome::between(&self.state.lock_ref(), &next);
        self.publish(next, outcome);
        Ok(outcome)
    }

    /// Replace the dataset and start over from the default state.
    pub async fn load_dataset(
        &self,
        dataset: Rc<dyn Dataset>,
        viewport: ViewDimensions,
    ) -> Result<TransitionOutcome, StateRejection> {
        log::info!(
            "loading {:?} dataset with {} chromosomes and {} resolutions",
            dataset.kind(),
            dataset.chromosomes().len(),
            dataset.resolution_ladder().len()
        );
        let previous = self.dataset.replace(Some(dataset));
        let fresh = NavigationState::default().with_normalization(self.default_normalization.clone());
        if let Err(rejection) = self.apply(&fresh, viewport).await {
            log::warn!("dataset rejected, keeping the previous one: {rejection}");
            *self.dataset.borrow_mut() = previous;
            return Err(rejection);
        }
        Ok(TransitionOutcome {
            chr_changed: true,
            resolution_changed: true,
        })
    }

    pub fn clear_session(&self) {
        *self.dataset.borrow_mut() = None;
        *self.control_dataset.borrow_mut() = None;
        let fresh = NavigationState::default().with_normalization(self.default_normalization.clone());
        let outcome = TransitionOutcome::between(&self.state.lock_ref(), &fresh);
        self.publish(fresh, outcome);
    }

    fn publish(&self, state: NavigationState, outcome: TransitionOutcome) {
        self.state.set(state.clone());
        self.state_published_relay.send(StatePublished { state, outcome });
    }
}

fn validate(dataset: &dyn Dataset, candidate: &NavigationState) -> Result<(), StateRejection> {
    for (field, value) in [
        ("x", candidate.bin_x),
        ("y", candidate.bin_y),
        ("pixel size", candidate.pixel_size),
    ] {
        if !value.is_finite() {
            return Err(StateRejection::NonFinite(field));
        }
    }
    let count = dataset.chromosomes().len();
    for index in [candidate.chr1_index, candidate.chr2_index] {
        if index >= count {
            return Err(StateRejection::ChromosomeOutOfRange { index, count });
        }
    }
    let count = dataset.resolution_ladder().len();
    if candidate.zoom_index >= count {
        return Err(StateRejection::ZoomOutOfRange {
            index: candidate.zoom_index,
            count,
        });
    }
    Ok(())
}
