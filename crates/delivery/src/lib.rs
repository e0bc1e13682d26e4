//! Ad delivery engine — campaign eligibility matching, banner rotation, and
//! the async banner host.
//!
//! # Modules
//!
//! - [`matcher`] — pure eligibility filtering and priority ordering
//! - [`rotation`] — the stimulus/effect rotation state machine
//! - [`source`] — campaign read seam and in-memory implementation
//! - [`banner`] — tokio adapter owning timers and stimulus plumbing

pub mod banner;
pub mod matcher;
pub mod rotation;
pub mod source;

pub use banner::BannerHost;
pub use matcher::eligible_campaigns;
pub use rotation::{Effect, RotationController, Stimulus};
pub use source::{CampaignSource, InMemoryCampaignSource};
