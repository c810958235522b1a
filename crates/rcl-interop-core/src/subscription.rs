//! Native subscription resource.
//!
//! Owns one native subscription handle and its options block. Teardown has
//! three entry points into the same idempotent transition to `Disposed`:
//!
//! - [`Subscription::dispose`]: explicit; also leaves the node registry and
//!   wakes the executor, and propagates native failures
//! - [`RawSubscription::dispose_from_node`]: the node is tearing down and
//!   already owns the registry
//! - `Drop`: reclamation fallback; releases only what this value owns and
//!   logs failures, since the node may already be gone
//!
//! The lifecycle lock serializes `take` against disposal of the same
//! instance. The user callback runs after the lock is released, so a
//! callback may dispose its own subscription.

use std::ffi::CString;
use std::fmt;
use std::ptr::{self, NonNull};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::api::{SubscriptionApi, SubscriptionFns};
use crate::error::{RclError, Result};
use crate::ffi::{rcl_subscription_options_t, rcl_subscription_t, symbols};
use crate::message::{Message, MessageBuffer, TypeSupportHandle};
use crate::node::{Node, NodeHandle, RawSubscription};
use crate::qos::QosProfile;
use crate::return_code::ReturnCode;
use crate::types::{SubscriptionId, SubscriptionState, TakeOutcome};

/// Handle and options block of an initialized native subscription.
struct NativeSubscription {
    handle: NonNull<rcl_subscription_t>,
    options: NonNull<rcl_subscription_options_t>,
}

// SAFETY: rcl subscription handles are not tied to the creating thread;
// access is serialized by the owning `Subscription`'s lifecycle lock.
unsafe impl Send for NativeSubscription {}

impl NativeSubscription {
    /// Allocates and initializes. On failure nothing stays allocated.
    fn create(
        fns: &SubscriptionFns,
        node: NodeHandle,
        type_support: TypeSupportHandle,
        topic: &CString,
        qos: QosProfile,
    ) -> std::result::Result<Self, ReturnCode> {
        // SAFETY: the QoS profile pointer is null or valid per `QosProfile`.
        let options = NonNull::new(unsafe { (fns.create_options)(qos.as_ptr()) })
            .ok_or(ReturnCode::BadAlloc)?;

        // SAFETY: no preconditions.
        let Some(handle) = NonNull::new(unsafe { (fns.zero_initialized)() }) else {
            // SAFETY: `options` came from `create_options` and is released once.
            unsafe { (fns.dispose_options)(options.as_ptr()) };
            return Err(ReturnCode::BadAlloc);
        };

        let native = Self { handle, options };

        // SAFETY: `handle` is zero-initialized, the node is initialized per
        // `NodeHandle`, `topic` is NUL-terminated and outlives the call.
        let code = ReturnCode::from_raw(unsafe {
            (fns.init)(
                handle.as_ptr(),
                node.as_ptr(),
                type_support.as_ptr(),
                topic.as_ptr(),
                options.as_ptr(),
            )
        });

        if code.is_ok() {
            Ok(native)
        } else {
            native.release(fns);
            Err(code)
        }
    }

    /// Finalizes, then frees the handle and options regardless of the
    /// finalize status.
    fn finalize(self, fns: &SubscriptionFns, node: NodeHandle) -> ReturnCode {
        // SAFETY: the handle is initialized and finalized exactly once here.
        let code =
            ReturnCode::from_raw(unsafe { (fns.fini)(self.handle.as_ptr(), node.as_ptr()) });
        self.release(fns);
        code
    }

    fn release(self, fns: &SubscriptionFns) {
        // SAFETY: both pointers came from the shim allocators and `self` is
        // consumed, so each is freed exactly once.
        unsafe {
            (fns.free)(self.handle.as_ptr());
            (fns.dispose_options)(self.options.as_ptr());
        }
    }

    fn is_valid(&self, fns: &SubscriptionFns) -> bool {
        // SAFETY: the handle is live while `self` exists.
        unsafe { (fns.is_valid)(self.handle.as_ptr()) }
    }
}

enum Lifecycle {
    Uninitialized,
    Active(NativeSubscription),
    Disposed,
}

impl Lifecycle {
    const fn state(&self) -> SubscriptionState {
        match self {
            Self::Uninitialized => SubscriptionState::Uninitialized,
            Self::Active(_) => SubscriptionState::Active,
            Self::Disposed => SubscriptionState::Disposed,
        }
    }

    /// Moves to `Disposed`, returning the native resources if this call did
    /// the transition.
    fn claim(&mut self) -> Option<NativeSubscription> {
        match std::mem::replace(self, Self::Disposed) {
            Self::Active(native) => Some(native),
            Self::Uninitialized | Self::Disposed => None,
        }
    }
}

/// Callback invoked once per delivered message.
pub type Callback<M> = Box<dyn Fn(M) + Send + Sync>;

/// Subscription to a topic with message type `M`.
pub struct Subscription<M: Message> {
    id: SubscriptionId,
    topic: String,
    node: Weak<Node>,
    node_handle: NodeHandle,
    api: Arc<SubscriptionApi>,
    callback: Callback<M>,
    lifecycle: Mutex<Lifecycle>,
}

impl<M: Message> Subscription<M> {
    /// Creates a subscription on `topic` and registers it with `node`.
    ///
    /// `qos` defaults to the middleware profile.
    ///
    /// # Errors
    /// [`RclError::Init`] carrying the native status if initialization
    /// failed; the handle and options block are released first.
    pub fn new(
        topic: impl Into<String>,
        node: &Arc<Node>,
        api: Arc<SubscriptionApi>,
        qos: Option<QosProfile>,
        callback: impl Fn(M) + Send + Sync + 'static,
    ) -> Result<Arc<Self>> {
        let topic = topic.into();
        let c_topic =
            CString::new(topic.as_str()).map_err(|_| RclError::InvalidTopic(topic.clone()))?;

        let subscription = Arc::new(Self {
            id: SubscriptionId::new(),
            topic,
            node: Arc::downgrade(node),
            node_handle: node.handle(),
            api,
            callback: Box::new(callback),
            lifecycle: Mutex::new(Lifecycle::Uninitialized),
        });

        let native = NativeSubscription::create(
            subscription.api.fns(),
            subscription.node_handle,
            M::type_support(),
            &c_topic,
            qos.unwrap_or_default(),
        )
        .map_err(|code| RclError::Init {
            topic: subscription.topic.clone(),
            code,
        })?;

        *subscription.lifecycle.lock() = Lifecycle::Active(native);
        tracing::debug!(
            topic = %subscription.topic,
            node = node.name(),
            id = %subscription.id,
            "subscription active"
        );

        node.register(subscription.clone());
        Ok(subscription)
    }

    /// Identifier within the process.
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Topic name.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Current lifecycle state as tracked by this value.
    #[must_use]
    pub fn state(&self) -> SubscriptionState {
        self.lifecycle.lock().state()
    }

    /// True once disposed, or if the native layer reports the handle invalid.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        match &*self.lifecycle.lock() {
            Lifecycle::Active(native) => !native.is_valid(self.api.fns()),
            Lifecycle::Uninitialized | Lifecycle::Disposed => true,
        }
    }

    fn use_after_dispose(&self) -> RclError {
        RclError::UseAfterDispose {
            topic: self.topic.clone(),
        }
    }

    /// Polls for one message without blocking.
    ///
    /// # Errors
    /// [`RclError::UseAfterDispose`] on a disposed instance,
    /// [`RclError::NativeCall`] for any status other than success or
    /// "no message".
    pub fn take(&self) -> Result<TakeOutcome> {
        let fns = self.api.fns();
        let mut buffer = M::allocate_buffer();

        let code = {
            let lifecycle = self.lifecycle.lock();
            let Lifecycle::Active(native) = &*lifecycle else {
                return Err(self.use_after_dispose());
            };
            if !native.is_valid(fns) {
                return Err(self.use_after_dispose());
            }
            // SAFETY: the handle is live under the lock; the buffer matches
            // the type descriptor the handle was initialized with.
            ReturnCode::from_raw(unsafe {
                (fns.take)(
                    native.handle.as_ptr(),
                    buffer.as_mut_ptr(),
                    ptr::null_mut(),
                    ptr::null_mut(),
                )
            })
        };

        match code {
            ReturnCode::SubscriptionTakeFailed => Ok(TakeOutcome::NoMessage),
            ReturnCode::Ok => {
                (self.callback)(M::decode(&buffer));
                Ok(TakeOutcome::Processed)
            }
            other => Err(RclError::NativeCall {
                operation: symbols::TAKE,
                code: other,
            }),
        }
    }

    /// Number of publishers matched to this subscription.
    ///
    /// # Errors
    /// [`RclError::UseAfterDispose`] on a disposed instance.
    pub fn publisher_count(&self) -> Result<usize> {
        let fns = self.api.fns();
        let lifecycle = self.lifecycle.lock();
        let Lifecycle::Active(native) = &*lifecycle else {
            return Err(self.use_after_dispose());
        };
        if !native.is_valid(fns) {
            return Err(self.use_after_dispose());
        }

        let mut count = 0usize;
        // SAFETY: the handle is live under the lock; `count` is a valid out
        // pointer.
        let code = ReturnCode::from_raw(unsafe {
            (fns.publisher_count)(native.handle.as_ptr(), &mut count)
        });
        code.check(symbols::PUBLISHER_COUNT)?;
        Ok(count)
    }

    /// Disposes explicitly. Idempotent: later calls are no-ops.
    ///
    /// Leaves the node registry and wakes the node's executor before
    /// releasing native resources.
    ///
    /// # Errors
    /// [`RclError::NativeCall`] if native finalization failed. The handle
    /// and options block are freed regardless.
    pub fn dispose(&self) -> Result<()> {
        let Some(native) = self.lifecycle.lock().claim() else {
            return Ok(());
        };

        if let Some(node) = self.node.upgrade() {
            node.remove(self.id);
            node.wake_executor();
        }

        self.finalize(native)
    }

    fn finalize(&self, native: NativeSubscription) -> Result<()> {
        let code = native.finalize(self.api.fns(), self.node_handle);
        tracing::debug!(topic = %self.topic, id = %self.id, %code, "subscription disposed");
        code.check(symbols::SUBSCRIPTION_FINI)
    }
}

impl<M: Message> RawSubscription for Subscription<M> {
    fn id(&self) -> SubscriptionId {
        self.id
    }

    fn topic(&self) -> &str {
        &self.topic
    }

    /// A disposed subscription reports `Ok(false)`: executors poll a
    /// registry snapshot that may still hold it.
    fn try_process(&self) -> Result<bool> {
        match self.take() {
            Ok(outcome) => Ok(outcome.is_processed()),
            Err(RclError::UseAfterDispose { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn is_disposed(&self) -> bool {
        Self::is_disposed(self)
    }

    fn dispose_from_node(&self) -> Result<()> {
        let Some(native) = self.lifecycle.lock().claim() else {
            return Ok(());
        };
        self.finalize(native)
    }
}

impl<M: Message> Drop for Subscription<M> {
    fn drop(&mut self) {
        let Some(native) = self.lifecycle.get_mut().claim() else {
            return;
        };
        if let Err(err) = self.finalize(native) {
            tracing::warn!(
                topic = %self.topic,
                error = %err,
                "failed to finalize reclaimed subscription"
            );
        }
    }
}

impl<M: Message> fmt::Debug for Subscription<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
