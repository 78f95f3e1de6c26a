//! Dataflow primitives shared by the viewer components
//!
//! - **[`Relay`]** - typed, ordered event streaming over unbounded channels
//!
//! Published values that consumers read as "latest state" live in
//! `futures_signals` Mutables; discrete events travel through Relays.

pub mod relay;

pub use relay::{Relay, RelayError, relay};
