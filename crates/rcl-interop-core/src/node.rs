//! Node and executor seams.
//!
//! The node owns the registry of live subscriptions; an executor polls them
//! and is woken when that registry changes. Scheduling policy is the
//! executor's business.

use std::fmt;
use std::ptr::NonNull;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use crate::error::Result;
use crate::ffi::rcl_node_t;
use crate::types::SubscriptionId;

/// Native node handle. Owned by whoever created the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHandle(NonNull<rcl_node_t>);

impl NodeHandle {
    /// Wraps an initialized native node.
    ///
    /// # Safety
    ///
    /// `raw` must be an initialized `rcl_node_t` that outlives every
    /// subscription created on it.
    #[must_use]
    pub unsafe fn from_raw(raw: *mut rcl_node_t) -> Option<Self> {
        NonNull::new(raw).map(Self)
    }

    /// Raw node pointer.
    #[must_use]
    pub const fn as_ptr(&self) -> *mut rcl_node_t {
        self.0.as_ptr()
    }
}

// SAFETY: rcl nodes may be used from any thread; mutation is serialized by
// the middleware.
unsafe impl Send for NodeHandle {}
// SAFETY: see above.
unsafe impl Sync for NodeHandle {}

/// Polls the subscriptions of the nodes it was given.
pub trait Executor: Send + Sync {
    /// Asks the executor to re-evaluate its wait set for `node`.
    fn wake(&self, node: &Node);
}

/// Type-erased view of a subscription, as stored by the node.
pub trait RawSubscription: Send + Sync {
    /// Identifier used for registry removal.
    fn id(&self) -> SubscriptionId;

    /// Topic name.
    fn topic(&self) -> &str;

    /// Polls once. `Ok(true)` if a message was processed, `Ok(false)` if
    /// nothing was pending or the subscription is already disposed.
    fn try_process(&self) -> Result<bool>;

    /// Whether the subscription is disposed or natively invalid.
    fn is_disposed(&self) -> bool;

    /// Releases native resources without touching the node registry.
    ///
    /// Called by the node while it tears itself down.
    fn dispose_from_node(&self) -> Result<()>;
}

/// A node with its subscription registry.
pub struct Node {
    name: String,
    handle: NodeHandle,
    subscriptions: Mutex<Vec<Arc<dyn RawSubscription>>>,
    executor: RwLock<Option<Weak<dyn Executor>>>,
}

impl Node {
    /// Creates a node around an existing native handle.
    #[must_use]
    pub fn new(name: impl Into<String>, handle: NodeHandle) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            handle,
            subscriptions: Mutex::new(Vec::new()),
            executor: RwLock::new(None),
        })
    }

    /// Node name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Native handle.
    #[must_use]
    pub const fn handle(&self) -> NodeHandle {
        self.handle
    }

    /// Attaches an executor. Only a weak reference is kept.
    pub fn attach_executor(&self, executor: &Arc<dyn Executor>) {
        *self.executor.write() = Some(Arc::downgrade(executor));
    }

    /// Detaches the executor, if any.
    pub fn detach_executor(&self) {
        *self.executor.write() = None;
    }

    /// The attached executor, if it is still alive.
    #[must_use]
    pub fn executor(&self) -> Option<Arc<dyn Executor>> {
        self.executor.read().as_ref().and_then(Weak::upgrade)
    }

    /// Wakes the attached executor, if any.
    pub fn wake_executor(&self) {
        if let Some(executor) = self.executor() {
            executor.wake(self);
        }
    }

    /// Snapshot of the live subscriptions, for executors.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<Arc<dyn RawSubscription>> {
        self.subscriptions.lock().clone()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().len()
    }

    pub(crate) fn register(&self, subscription: Arc<dyn RawSubscription>) {
        self.subscriptions.lock().push(subscription);
    }

    /// Removes a subscription from the registry. Returns whether it was
    /// present.
    pub(crate) fn remove(&self, id: SubscriptionId) -> bool {
        let removed = {
            let mut subscriptions = self.subscriptions.lock();
            subscriptions
                .iter()
                .position(|s| s.id() == id)
                .map(|index| subscriptions.swap_remove(index))
        };
        // Dropped outside the lock: the last reference may run a destructor.
        removed.is_some()
    }

    /// Disposes every registered subscription and empties the registry.
    ///
    /// Call before finalizing the native node. All subscriptions are
    /// disposed even if some fail; the first failure is returned.
    pub fn shutdown(&self) -> Result<()> {
        let drained: Vec<_> = std::mem::take(&mut *self.subscriptions.lock());
        tracing::debug!(node = %self.name, count = drained.len(), "shutting down node");

        let mut first_error = None;
        for subscription in drained {
            if let Err(err) = subscription.dispose_from_node() {
                tracing::warn!(
                    topic = subscription.topic(),
                    error = %err,
                    "subscription dispose failed"
                );
                first_error.get_or_insert(err);
            }
        }
        self.wake_executor();
        first_error.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("handle", &self.handle)
            .field("subscriptions", &self.subscription_count())
            .finish_non_exhaustive()
    }
}
