//! Peer synchronization: who receives a viewer's state after a local change.
//!
//! Peers are held weakly in registration order. Only locally authored
//! renders propagate; states received from a peer are rendered without
//! being sent on, which keeps a ring of synchronized viewers from echoing.

use super::state::StateManager;
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use indexmap::IndexMap;
use shared::SyncState;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(u64);

impl PeerId {
    pub fn next() -> Self {
        static NEXT_PEER_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_PEER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

pub trait PeerTransport {
    fn peer_id(&self) -> PeerId;

    /// Adopt a state exported by another viewer.
    fn receive_sync_state(&self, state: SyncState) -> LocalBoxFuture<'_, ()>;
}

#[derive(Default)]
pub struct PeerRegistry {
    peers: IndexMap<PeerId, Weak<dyn PeerTransport>>,
}

impl PeerRegistry {
    /// Returns false when the peer was already registered.
    pub fn register(&mut self, peer: &Rc<dyn PeerTransport>) -> bool {
        let id = peer.peer_id();
        if self.peers.contains_key(&id) {
            return false;
        }
        self.peers.insert(id, Rc::downgrade(peer));
        true
    }

    pub fn unregister(&mut self, id: PeerId) -> bool {
        self.peers.shift_remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Peers still alive, in registration order. Dropped peers are pruned.
    pub fn live_peers(&mut self) -> Vec<Rc<dyn PeerTransport>> {
        self.peers.retain(|_, peer| peer.strong_count() > 0);
        self.peers.values().filter_map(Weak::upgrade).collect()
    }

    /// Deliver `state` to every live peer, one after another. The returned
    /// future owns its peers, so the registry is free again once it exists.
    pub fn broadcast(&mut self, state: &SyncState) -> LocalBoxFuture<'static, usize> {
        let peers = self.live_peers();
        let state = state.clone();
        async move {
            for peer in &peers {
                peer.receive_sync_state(state.clone()).await;
            }
            peers.len()
        }
        .boxed_local()
    }
}

/// Exports the active state and fans it out to registered peers.
pub struct PeerSync {
    manager: Rc<StateManager>,
    registry: RefCell<PeerRegistry>,
    enabled: Cell<bool>,
}

impl PeerSync {
    pub fn new(manager: Rc<StateManager>, enabled: bool) -> Self {
        Self {
            manager,
            registry: RefCell::new(PeerRegistry::default()),
            enabled: Cell::new(enabled),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn register(&self, peer: &Rc<dyn PeerTransport>) -> bool {
        self.registry.borrow_mut().register(peer)
    }

    pub fn unregister(&self, id: PeerId) -> bool {
        self.registry.borrow_mut().unregister(id)
    }

    pub fn peer_count(&self) -> usize {
        self.registry.borrow().len()
    }

    /// The active state in peer form, or `None` without a dataset.
    pub fn export_state(&self) -> Option<SyncState> {
        let dataset = self.manager.dataset()?;
        let state = self.manager.current();
        Some(SyncState {
            genome_id: dataset.genome_id().map(str::to_string),
            chr1_name: dataset.chromosome(state.chr1_index())?.name.clone(),
            chr2_name: dataset.chromosome(state.chr2_index())?.name.clone(),
            bin_size_bp: dataset.bin_size(state.zoom_index())?,
            bin_x: state.bin_x(),
            bin_y: state.bin_y(),
            pixel_size: state.pixel_size(),
        })
    }

    /// Send the active state to every peer. Returns how many received it.
    pub async fn propagate(&self) -> usize {
        if !self.is_enabled() {
            return 0;
        }
        let Some(state) = self.export_state() else {
            log::debug!("nothing to propagate without a dataset");
            return 0;
        };
        let delivery = self.registry.borrow_mut().broadcast(&state);
        let delivered = delivery.await;
        log::debug!("propagated {}:{} to {delivered} peers", state.chr1_name, state.chr2_name);
        delivered
    }
}
