//! Event streaming Relay built on unbounded channels
//!
//! A Relay is the outbound half of a typed event stream. The viewer uses one
//! Relay per publisher so every consumer sees the same ordered sequence of
//! events and there is never a second notification path.

use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded};
use std::sync::{Arc, OnceLock};

/// Type-safe event relay.
///
/// # Event-Source Naming Convention
///
/// Relays follow the `{source}_{event}_relay` pattern, for example
/// `state_published_relay` for the state manager announcing a new active
/// navigation state.
///
/// # Examples
///
/// ```rust
/// use frontend::dataflow::relay;
/// use futures::StreamExt;
///
/// # futures::executor::block_on(async {
/// let (zoom_changed_relay, mut zoom_changed_stream) = relay::<usize>();
/// zoom_changed_relay.send(3);
/// assert_eq!(zoom_changed_stream.next().await, Some(3));
/// # });
/// ```
#[derive(Clone, Debug)]
pub struct Relay<T>
where
    T: Clone + Send + Sync + 'static,
{
    sender: UnboundedSender<T>,
    #[cfg(debug_assertions)]
    emit_location: Arc<OnceLock<&'static std::panic::Location<'static>>>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    #[error("relay receiver was dropped")]
    ChannelClosed,
    /// Relay send called from more than one source location (debug builds only)
    #[cfg(debug_assertions)]
    #[error("relay emitted from {current} after {previous}")]
    MultipleEmitters {
        previous: &'static std::panic::Location<'static>,
        current: &'static std::panic::Location<'static>,
    },
}

impl<T> Relay<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> (Self, UnboundedReceiver<T>) {
        let (sender, receiver) = unbounded();
        (
            Relay {
                sender,
                #[cfg(debug_assertions)]
                emit_location: Arc::new(OnceLock::new()),
            },
            receiver,
        )
    }

    /// In debug builds a relay may only be sent from one code location.
    #[cfg(debug_assertions)]
    #[track_caller]
    fn check_single_source(&self) -> Result<(), RelayError> {
        let caller = std::panic::Location::caller();
        match self.emit_location.set(caller) {
            Ok(()) => Ok(()),
            Err(previous) if previous == caller => Ok(()),
            Err(previous) => Err(RelayError::MultipleEmitters {
                previous,
                current: caller,
            }),
        }
    }

    /// Send an event; silently dropped when nobody listens.
    ///
    /// Panics in debug builds when the relay is sent from a second location.
    #[track_caller]
    pub fn send(&self, value: T) {
        #[cfg(debug_assertions)]
        if let Err(e) = self.check_single_source() {
            panic!("{e}");
        }

        let _ = self.sender.unbounded_send(value);
    }

    #[track_caller]
    pub fn try_send(&self, value: T) -> Result<(), RelayError> {
        #[cfg(debug_assertions)]
        self.check_single_source()?;

        self.sender
            .unbounded_send(value)
            .map_err(|_| RelayError::ChannelClosed)
    }
}

impl<T> Default for Relay<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// A disconnected relay; events are discarded.
    fn default() -> Self {
        let (relay, _receiver) = Self::new();
        relay
    }
}

/// Creates a new Relay with an associated receiver stream.
pub fn relay<T>() -> (Relay<T>, UnboundedReceiver<T>)
where
    T: Clone + Send + Sync + 'static,
{
    Relay::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn delivers_events_in_order() {
        let (chromosome_selected_relay, mut stream) = relay::<(usize, usize)>();

        for pair in [(1, 1), (1, 2), (3, 3)] {
            chromosome_selected_relay.send(pair);
        }

        assert_eq!(stream.next().await, Some((1, 1)));
        assert_eq!(stream.next().await, Some((1, 2)));
        assert_eq!(stream.next().await, Some((3, 3)));
    }

    #[tokio::test]
    async fn try_send_reports_dropped_receiver() {
        let (relay, receiver) = Relay::new();
        let send = |name: &str| relay.try_send(name.to_string());

        assert!(send("chr1").is_ok());
        drop(receiver);
        assert_eq!(send("chr2"), Err(RelayError::ChannelClosed));
    }

    #[test]
    fn default_relay_discards_events() {
        let relay = Relay::<u32>::default();
        relay.send(7);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "relay emitted from")]
    fn second_emitter_location_panics() {
        let relay = Relay::<u32>::default();
        relay.send(1);
        relay.send(2);
    }
}
