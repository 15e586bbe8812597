//! The Relaycord relay pipeline.
//!
//! 1. **Classify** the inbound message (text, images, files)
//! 2. **Assemble** the reply-chain history under a weight budget
//! 3. **Stream** the completion into a live-updating reply
//!
//! A typing indicator runs for the duration of steps 1–3.

pub mod classifier;
pub mod context;
pub mod presence;
pub mod service;
pub mod stream;

#[cfg(test)]
mod test_helpers;

pub use classifier::ContentClassifier;
pub use context::ContextAssembler;
pub use presence::{PresenceGuard, PresenceKeeper};
pub use service::{Collaborators, RelayService};
pub use stream::{RelayOutcome, StreamRelayCoordinator};
