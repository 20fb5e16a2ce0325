//! Webcam doomscrolling detector that turns sustained phone sessions into
//! micro-donations.
//!
//! Per frame: [`signals`] reduces model output to booleans, [`fusion`] votes
//! on them, [`debounce`] confirms the verdict over time and [`trigger`]
//! decides when to donate. [`session`] drives the chain from a video source.

pub mod config;
pub mod debounce;
pub mod donation;
pub mod error;
pub mod feedback;
pub mod fusion;
pub mod logging;
pub mod perception;
pub mod session;
pub mod settings;
pub mod signals;
pub mod trigger;
pub mod types;
pub mod video;

#[cfg(feature = "camera")]
pub mod camera;

pub use config::AppConfig;
pub use donation::{Charity, DonationError, DonationResult, DonationSink};
pub use feedback::{Feedback, SessionStatus};
pub use perception::PerceptionProvider;
pub use session::{DetectionSession, SessionHandle, TickOutcome};
pub use settings::{LiveSettings, SettingsStore};
pub use video::VideoSource;
