// Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # rcl-interop-core
//!
//! Safe ownership of native ROS 2 subscriptions reached through runtime
//! loaded entry points.
//!
//! A [`Subscription`] is created on a [`Node`], polled by the node's
//! [`Executor`] through [`Subscription::take`], and disposed exactly once:
//!
//! - explicitly with [`Subscription::dispose`]
//! - by the node during [`Node::shutdown`]
//! - on drop, as a fallback that releases native memory only
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rcl_interop_core::{Node, Subscription, SubscriptionApi};
//! use rcl_interop_dl::{LoaderConfig, create_loader};
//!
//! let api = Arc::new(SubscriptionApi::load(create_loader(&LoaderConfig::default())?)?);
//! let node = Node::new("listener", node_handle);
//! let sub = Subscription::<StringMsg>::new("/chatter", &node, api, None, |msg| {
//!     println!("{}", msg.data);
//! })?;
//! while !sub.take()?.is_processed() {}
//! sub.dispose()?;
//! ```

#![warn(missing_docs, rust_2018_idioms)]

pub mod api;
pub mod error;
pub mod ffi;
pub mod message;
pub mod node;
pub mod qos;
pub mod return_code;
pub mod subscription;
pub mod types;

#[cfg(test)]
mod tests;

pub use api::{SubscriptionApi, SubscriptionFns};
pub use error::{RclError, Result};
pub use message::{Message, MessageBuffer, TypeSupportHandle};
pub use node::{Executor, Node, NodeHandle, RawSubscription};
pub use qos::QosProfile;
pub use return_code::ReturnCode;
pub use subscription::{Callback, Subscription};
pub use types::{SubscriptionId, SubscriptionState, TakeOutcome};
