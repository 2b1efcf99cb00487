//! Message fan-out and translation routing.
//!
//! A relay operation resolves the source channel's sync group, partitions the
//! sibling channels by language, translates once per non-source language and
//! delivers to every sibling, isolating failures per destination.

pub mod batcher;
pub mod delivery;
pub mod identity;
pub mod orchestrator;
pub mod resolver;

pub use batcher::{partition, LanguagePartition};
pub use delivery::{DeliveryAgent, DeliveryOutcome};
pub use identity::IdentityCache;
pub use orchestrator::{DestinationResult, DestinationStatus, Relay, RelayOutcome, RelayReport};
pub use resolver::{Destination, DestinationResolver, Resolution};
