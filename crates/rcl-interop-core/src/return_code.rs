//! Native status codes.

use std::fmt;

use crate::error::{RclError, Result};
use crate::ffi::rcl_ret_t;

/// Status returned by the middleware's entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnCode {
    /// `RCL_RET_OK`
    Ok,
    /// `RCL_RET_ERROR`
    Error,
    /// `RCL_RET_TIMEOUT`
    Timeout,
    /// `RCL_RET_UNSUPPORTED`
    Unsupported,
    /// `RCL_RET_BAD_ALLOC`
    BadAlloc,
    /// `RCL_RET_INVALID_ARGUMENT`
    InvalidArgument,
    /// `RCL_RET_TOPIC_NAME_INVALID`
    TopicNameInvalid,
    /// `RCL_RET_NODE_INVALID`
    NodeInvalid,
    /// `RCL_RET_SUBSCRIPTION_INVALID`
    SubscriptionInvalid,
    /// `RCL_RET_SUBSCRIPTION_TAKE_FAILED`: no message is pending.
    SubscriptionTakeFailed,
    /// Any other value.
    Other(rcl_ret_t),
}

impl ReturnCode {
    /// Maps a raw status.
    #[must_use]
    pub const fn from_raw(code: rcl_ret_t) -> Self {
        match code {
            0 => Self::Ok,
            1 => Self::Error,
            2 => Self::Timeout,
            3 => Self::Unsupported,
            10 => Self::BadAlloc,
            11 => Self::InvalidArgument,
            103 => Self::TopicNameInvalid,
            200 => Self::NodeInvalid,
            400 => Self::SubscriptionInvalid,
            401 => Self::SubscriptionTakeFailed,
            other => Self::Other(other),
        }
    }

    /// Raw status value.
    #[must_use]
    pub const fn as_raw(self) -> rcl_ret_t {
        match self {
            Self::Ok => 0,
            Self::Error => 1,
            Self::Timeout => 2,
            Self::Unsupported => 3,
            Self::BadAlloc => 10,
            Self::InvalidArgument => 11,
            Self::TopicNameInvalid => 103,
            Self::NodeInvalid => 200,
            Self::SubscriptionInvalid => 400,
            Self::SubscriptionTakeFailed => 401,
            Self::Other(code) => code,
        }
    }

    /// Whether this is `RCL_RET_OK`.
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Converts a non-success status into [`RclError::NativeCall`].
    pub fn check(self, operation: &'static str) -> Result<()> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(RclError::NativeCall {
                operation,
                code: self,
            })
        }
    }
}

impl From<rcl_ret_t> for ReturnCode {
    fn from(code: rcl_ret_t) -> Self {
        Self::from_raw(code)
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ok => "RCL_RET_OK",
            Self::Error => "RCL_RET_ERROR",
            Self::Timeout => "RCL_RET_TIMEOUT",
            Self::Unsupported => "RCL_RET_UNSUPPORTED",
            Self::BadAlloc => "RCL_RET_BAD_ALLOC",
            Self::InvalidArgument => "RCL_RET_INVALID_ARGUMENT",
            Self::TopicNameInvalid => "RCL_RET_TOPIC_NAME_INVALID",
            Self::NodeInvalid => "RCL_RET_NODE_INVALID",
            Self::SubscriptionInvalid => "RCL_RET_SUBSCRIPTION_INVALID",
            Self::SubscriptionTakeFailed => "RCL_RET_SUBSCRIPTION_TAKE_FAILED",
            Self::Other(code) => return write!(f, "rcl_ret_t({code})"),
        };
        write!(f, "{name} ({})", self.as_raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_map_both_ways() {
        for raw in [0, 1, 2, 3, 10, 11, 103, 200, 400, 401] {
            let code = ReturnCode::from_raw(raw);
            assert!(!matches!(code, ReturnCode::Other(_)), "{raw} unmapped");
            assert_eq!(code.as_raw(), raw);
        }
        assert_eq!(ReturnCode::from_raw(-7), ReturnCode::Other(-7));
        assert_eq!(ReturnCode::Other(-7).as_raw(), -7);
    }

    #[test]
    fn test_check() {
        assert!(ReturnCode::Ok.check("rcl_take").is_ok());
        let err = ReturnCode::Error.check("rcl_take").unwrap_err();
        assert!(matches!(
            err,
            RclError::NativeCall {
                operation: "rcl_take",
                code: ReturnCode::Error
            }
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ReturnCode::SubscriptionTakeFailed.to_string(),
            "RCL_RET_SUBSCRIPTION_TAKE_FAILED (401)"
        );
        assert_eq!(ReturnCode::Other(9999).to_string(), "rcl_ret_t(9999)");
    }
}
