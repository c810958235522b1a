//! Native ABI of the subscription entry points.
//!
//! Layouts and signatures match `rcl/subscription.h` plus the four helper
//! exports of the interop shim library. All native structs are opaque here.

#![allow(non_camel_case_types)]

use std::ffi::{c_char, c_void};

/// `rcl_ret_t`
pub type rcl_ret_t = i32;

/// Opaque `rcl_subscription_t`.
#[repr(C)]
pub struct rcl_subscription_t {
    _private: [u8; 0],
}

/// Opaque `rcl_subscription_options_t`.
#[repr(C)]
pub struct rcl_subscription_options_t {
    _private: [u8; 0],
}

/// Opaque `rcl_node_t`.
#[repr(C)]
pub struct rcl_node_t {
    _private: [u8; 0],
}

/// Opaque `rosidl_message_type_support_t`.
#[repr(C)]
pub struct rosidl_message_type_support_t {
    _private: [u8; 0],
}

/// Opaque `rmw_qos_profile_t`.
#[repr(C)]
pub struct rmw_qos_profile_t {
    _private: [u8; 0],
}

/// `rclcs_get_zero_initialized_subscription`: heap-allocates a zeroed handle.
pub type ZeroInitializedSubscriptionFn = unsafe extern "C" fn() -> *mut rcl_subscription_t;

/// `rcl_subscription_init`
pub type SubscriptionInitFn = unsafe extern "C" fn(
    subscription: *mut rcl_subscription_t,
    node: *const rcl_node_t,
    type_support: *const rosidl_message_type_support_t,
    topic_name: *const c_char,
    options: *const rcl_subscription_options_t,
) -> rcl_ret_t;

/// `rcl_subscription_fini`
pub type SubscriptionFiniFn =
    unsafe extern "C" fn(subscription: *mut rcl_subscription_t, node: *mut rcl_node_t) -> rcl_ret_t;

/// `rcl_take`
pub type TakeFn = unsafe extern "C" fn(
    subscription: *const rcl_subscription_t,
    ros_message: *mut c_void,
    message_info: *mut c_void,
    allocation: *mut c_void,
) -> rcl_ret_t;

/// `rcl_subscription_get_publisher_count`
pub type PublisherCountFn = unsafe extern "C" fn(
    subscription: *const rcl_subscription_t,
    publisher_count: *mut usize,
) -> rcl_ret_t;

/// `rcl_subscription_is_valid`
pub type IsValidFn = unsafe extern "C" fn(subscription: *const rcl_subscription_t) -> bool;

/// `rclcs_free_subscription`: releases a handle from the zero-init helper.
pub type FreeSubscriptionFn = unsafe extern "C" fn(subscription: *mut rcl_subscription_t);

/// `rclcs_subscription_create_options`
pub type CreateOptionsFn =
    unsafe extern "C" fn(qos: *const rmw_qos_profile_t) -> *mut rcl_subscription_options_t;

/// `rclcs_subscription_dispose_options`
pub type DisposeOptionsFn = unsafe extern "C" fn(options: *mut rcl_subscription_options_t);

/// Exported symbol names.
pub mod symbols {
    /// In the middleware library.
    pub const SUBSCRIPTION_INIT: &str = "rcl_subscription_init";
    /// In the middleware library.
    pub const SUBSCRIPTION_FINI: &str = "rcl_subscription_fini";
    /// In the middleware library.
    pub const TAKE: &str = "rcl_take";
    /// In the middleware library.
    pub const PUBLISHER_COUNT: &str = "rcl_subscription_get_publisher_count";
    /// In the middleware library.
    pub const IS_VALID: &str = "rcl_subscription_is_valid";
    /// In the interop shim.
    pub const ZERO_INITIALIZED_SUBSCRIPTION: &str = "rclcs_get_zero_initialized_subscription";
    /// In the interop shim.
    pub const FREE_SUBSCRIPTION: &str = "rclcs_free_subscription";
    /// In the interop shim.
    pub const CREATE_OPTIONS: &str = "rclcs_subscription_create_options";
    /// In the interop shim.
    pub const DISPOSE_OPTIONS: &str = "rclcs_subscription_dispose_options";
}
