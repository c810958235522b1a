//! Message-type support seam.
//!
//! Serialization lives elsewhere. This layer only needs a type descriptor,
//! a buffer the native side can write into, and a decoder for that buffer.

use std::ffi::c_void;

use crate::ffi::rosidl_message_type_support_t;

/// Pointer to a message type descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeSupportHandle(*const rosidl_message_type_support_t);

impl TypeSupportHandle {
    /// Wraps a descriptor pointer.
    ///
    /// # Safety
    ///
    /// `raw` must point to a descriptor that lives for the rest of the
    /// process (generated type support is static data).
    #[must_use]
    pub const unsafe fn from_raw(raw: *const rosidl_message_type_support_t) -> Self {
        Self(raw)
    }

    /// Raw descriptor pointer.
    #[must_use]
    pub const fn as_ptr(&self) -> *const rosidl_message_type_support_t {
        self.0
    }
}

// SAFETY: descriptors are immutable static data.
unsafe impl Send for TypeSupportHandle {}
// SAFETY: see above.
unsafe impl Sync for TypeSupportHandle {}

/// Native storage for one message, released on drop.
pub trait MessageBuffer: Send {
    /// Pointer handed to `rcl_take` as the destination message.
    fn as_mut_ptr(&mut self) -> *mut c_void;
}

/// A message type usable with [`Subscription`](crate::Subscription).
pub trait Message: Sized + Send + 'static {
    /// Native buffer type.
    type Buffer: MessageBuffer;

    /// Static type descriptor.
    fn type_support() -> TypeSupportHandle;

    /// Allocates an empty native message.
    fn allocate_buffer() -> Self::Buffer;

    /// Decodes a filled buffer.
    fn decode(buffer: &Self::Buffer) -> Self;
}
