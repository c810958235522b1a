//! Quality-of-service seam.

use crate::ffi::rmw_qos_profile_t;

/// Native QoS profile handed to the options constructor.
///
/// The default is a null profile, which the shim maps to the middleware's
/// default subscription profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QosProfile(*const rmw_qos_profile_t);

impl QosProfile {
    /// Middleware default profile.
    #[must_use]
    pub const fn system_default() -> Self {
        Self(std::ptr::null())
    }

    /// Wraps a profile built by the QoS collaborator.
    ///
    /// # Safety
    ///
    /// `raw` must stay valid until every subscription built from it has been
    /// constructed.
    #[must_use]
    pub const unsafe fn from_raw(raw: *const rmw_qos_profile_t) -> Self {
        Self(raw)
    }

    /// Raw profile pointer.
    #[must_use]
    pub const fn as_ptr(&self) -> *const rmw_qos_profile_t {
        self.0
    }

    /// Whether this is the middleware default.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.0.is_null()
    }
}

impl Default for QosProfile {
    fn default() -> Self {
        Self::system_default()
    }
}

// SAFETY: the profile is only read, during subscription construction.
unsafe impl Send for QosProfile {}
// SAFETY: see above.
unsafe impl Sync for QosProfile {}
