use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use uuid::Uuid;

/// The fixed set of charities a user can pick from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Charity {
    #[default]
    Rc,
    Msf,
    Unicef,
    Wwf,
    Gd,
}

impl Charity {
    pub const ALL: [Charity; 5] = [Charity::Rc, Charity::Msf, Charity::Unicef, Charity::Wwf, Charity::Gd];

    pub fn id(&self) -> &'static str {
        match self {
            Charity::Rc => "rc",
            Charity::Msf => "msf",
            Charity::Unicef => "unicef",
            Charity::Wwf => "wwf",
            Charity::Gd => "gd",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Charity::Rc => "American Red Cross",
            Charity::Msf => "Doctors Without Borders",
            Charity::Unicef => "UNICEF",
            Charity::Wwf => "World Wildlife Fund",
            Charity::Gd => "GiveDirectly",
        }
    }

    /// Unknown or empty ids resolve to the default charity.
    pub fn from_id(id: &str) -> Self {
        Self::parse(id).unwrap_or_default()
    }

    pub fn parse(id: &str) -> Option<Self> {
        let id = id.trim();
        Self::ALL.into_iter().find(|c| c.id().eq_ignore_ascii_case(id))
    }
}

impl fmt::Display for Charity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationResult {
    pub success: bool,
    pub identifier: String,
    pub amount_cents: i64,
    pub status: String,
    pub message: String,
    pub charity_label: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DonationError {
    #[error("network error: {0}")]
    Network(String),

    #[error("donation rejected: {0}")]
    Rejected(String),
}

/// Where donations go. Called off the frame loop; the future must not borrow
/// from the sink.
pub trait DonationSink: Send + Sync {
    fn donate(&self, charity: Charity) -> BoxFuture<'static, Result<DonationResult, DonationError>>;
}

pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!("{}${}.{:02}", sign, cents / 100, cents % 100)
}

/// Sink that pretends every donation went through. Optionally fails every
/// n-th attempt so error handling can be exercised end to end.
pub struct SimulatedDonationSink {
    amount_cents: i64,
    fail_every: Option<u64>,
    attempts: AtomicU64,
}

impl SimulatedDonationSink {
    pub fn new(amount_cents: i64) -> Self {
        Self {
            amount_cents,
            fail_every: None,
            attempts: AtomicU64::new(0),
        }
    }

    pub fn failing_every(mut self, n: u64) -> Self {
        self.fail_every = (n > 0).then_some(n);
        self
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl DonationSink for SimulatedDonationSink {
    fn donate(&self, charity: Charity) -> BoxFuture<'static, Result<DonationResult, DonationError>> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let fail = self.fail_every.map_or(false, |n| attempt % n == 0);
        let amount_cents = self.amount_cents;

        Box::pin(async move {
            if amount_cents <= 0 {
                return Err(DonationError::Rejected(format!(
                    "amount must be positive, got {}",
                    format_cents(amount_cents)
                )));
            }
            if fail {
                return Err(DonationError::Network(format!("simulated outage on attempt {}", attempt)));
            }
            Ok(DonationResult {
                success: true,
                identifier: Uuid::new_v4().to_string(),
                amount_cents,
                status: "succeeded".to_string(),
                message: format!("Donated {} to {}", format_cents(amount_cents), charity.label()),
                charity_label: charity.label().to_string(),
            })
        })
    }
}
