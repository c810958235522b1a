//! Shared subscription types.

use std::fmt;

/// Unique identifier of a subscription within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(uuid::Uuid);

impl SubscriptionId {
    /// Creates a new random subscription ID.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Subscription lifecycle state.
///
/// ```text
/// Uninitialized → Active → Disposed
/// ```
///
/// `Disposed` is terminal and reached exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionState {
    /// Allocated but not yet initialized natively.
    Uninitialized,
    /// Native handle initialized; take and introspection are allowed.
    Active,
    /// Native resources released.
    Disposed,
}

impl SubscriptionState {
    /// Returns the state name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Active => "active",
            Self::Disposed => "disposed",
        }
    }
}

impl fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Outcome of a single non-blocking poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TakeOutcome {
    /// One message was taken and the callback ran once.
    Processed,
    /// Nothing was pending; the callback did not run.
    NoMessage,
}

impl TakeOutcome {
    /// Whether a message was processed.
    #[must_use]
    pub const fn is_processed(&self) -> bool {
        matches!(self, Self::Processed)
    }
}
