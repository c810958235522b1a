//! Message delivery and introspection.

use std::sync::atomic::Ordering;
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;
use serial_test::serial;

use crate::error::RclError;
use crate::return_code::ReturnCode;
use crate::subscription::Subscription;
use crate::tests::fake::{self, Chatter, FAKE};
use crate::types::{SubscriptionState, TakeOutcome};

/// Nothing pending: no callback, no error.
#[test]
#[serial]
fn take_without_message_skips_callback() {
    fake::reset();
    let node = fake::node("listener");
    let (received, callback) = fake::recorder();
    let sub = Subscription::new("/chatter", &node, fake::api(), None, callback).unwrap();

    assert_eq!(sub.take().unwrap(), TakeOutcome::NoMessage);
    assert!(received.lock().is_empty());
    assert_eq!(fake::count(&FAKE.take_calls), 1);

    sub.dispose().unwrap();
}

/// One pending message runs the callback exactly once.
#[test]
#[serial]
fn take_delivers_one_message() {
    fake::reset();
    let node = fake::node("listener");
    let (received, callback) = fake::recorder();
    let sub = Subscription::new("/chatter", &node, fake::api(), None, callback).unwrap();

    fake::publish("hello");

    assert_eq!(sub.take().unwrap(), TakeOutcome::Processed);
    assert_eq!(*received.lock(), vec!["hello".to_string()]);
    assert_eq!(sub.take().unwrap(), TakeOutcome::NoMessage);
    assert_eq!(received.lock().len(), 1);

    sub.dispose().unwrap();
}

/// Each take consumes exactly one message, in order.
#[test]
#[serial]
fn take_drains_in_order() {
    fake::reset();
    let node = fake::node("listener");
    let (received, callback) = fake::recorder();
    let sub = Subscription::new("/chatter", &node, fake::api(), None, callback).unwrap();

    fake::publish("one");
    fake::publish("two");

    let mut processed = 0;
    while sub.take().unwrap().is_processed() {
        processed += 1;
    }

    assert_eq!(processed, 2);
    assert_eq!(*received.lock(), vec!["one".to_string(), "two".to_string()]);

    sub.dispose().unwrap();
}

/// Statuses other than success and "no message" are errors.
#[test]
#[serial]
fn take_surfaces_native_failure() {
    fake::reset();
    let node = fake::node("listener");
    let (received, callback) = fake::recorder();
    let sub = Subscription::new("/chatter", &node, fake::api(), None, callback).unwrap();
    FAKE.take_error.store(1, Ordering::SeqCst);
    fake::publish("lost");

    let err = sub.take().unwrap_err();

    assert_eq!(
        err,
        RclError::NativeCall {
            operation: "rcl_take",
            code: ReturnCode::Error,
        }
    );
    assert!(received.lock().is_empty());
    assert_eq!(sub.state(), SubscriptionState::Active);

    sub.dispose().unwrap();
}

/// Take after dispose never reaches the native layer.
#[test]
#[serial]
fn take_after_dispose_is_rejected() {
    fake::reset();
    let node = fake::node("listener");
    let (received, callback) = fake::recorder();
    let sub = Subscription::new("/chatter", &node, fake::api(), None, callback).unwrap();
    sub.dispose().unwrap();
    fake::publish("late");

    let err = sub.take().unwrap_err();

    assert_eq!(
        err,
        RclError::UseAfterDispose {
            topic: "/chatter".into()
        }
    );
    assert_eq!(fake::count(&FAKE.take_calls), 0);
    assert!(received.lock().is_empty());
}

/// Publisher count is read from the native layer.
#[test]
#[serial]
fn publisher_count_reports_native_value() {
    fake::reset();
    let node = fake::node("listener");
    let sub = Subscription::new("/chatter", &node, fake::api(), None, |_: Chatter| {}).unwrap();
    FAKE.publisher_count.store(3, Ordering::SeqCst);

    assert_eq!(sub.publisher_count().unwrap(), 3);

    FAKE.count_status.store(200, Ordering::SeqCst);
    assert_eq!(
        sub.publisher_count().unwrap_err().code(),
        Some(ReturnCode::NodeInvalid)
    );

    sub.dispose().unwrap();
    assert!(sub.publisher_count().unwrap_err().is_use_after_dispose());
}

/// A callback may dispose the subscription that delivered to it.
#[test]
#[serial]
fn callback_can_dispose_own_subscription() {
    fake::reset();
    let node = fake::node("listener");
    let slot: Arc<OnceLock<Weak<Subscription<Chatter>>>> = Arc::new(OnceLock::new());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let callback = {
        let slot = slot.clone();
        let seen = seen.clone();
        move |msg: Chatter| {
            seen.lock().push(msg.data);
            if let Some(sub) = slot.get().and_then(Weak::upgrade) {
                sub.dispose().unwrap();
            }
        }
    };
    let sub = Subscription::new("/chatter", &node, fake::api(), None, callback).unwrap();
    slot.set(Arc::downgrade(&sub)).unwrap();

    fake::publish("bye");
    fake::publish("unread");

    assert_eq!(sub.take().unwrap(), TakeOutcome::Processed);
    assert_eq!(sub.state(), SubscriptionState::Disposed);
    assert_eq!(node.subscription_count(), 0);
    assert_eq!(fake::live_handles(), 0);
    assert!(sub.take().unwrap_err().is_use_after_dispose());
    assert_eq!(seen.lock().len(), 1);
}

/// The type-erased view polls the same way.
#[test]
#[serial]
fn try_process_through_registry() {
    fake::reset();
    let node = fake::node("listener");
    let (received, callback) = fake::recorder();
    let sub = Subscription::new("/chatter", &node, fake::api(), None, callback).unwrap();
    fake::publish("via executor");

    let registered = node.subscriptions();
    assert_eq!(registered.len(), 1);
    assert_eq!(registered[0].id(), sub.id());
    assert_eq!(registered[0].topic(), "/chatter");
    assert!(registered[0].try_process().unwrap());
    assert!(!registered[0].try_process().unwrap());
    assert_eq!(received.lock().len(), 1);

    drop(registered);
    sub.dispose().unwrap();
}

/// Concurrent polling on one instance delivers each message once.
#[test]
#[serial]
fn concurrent_take_delivers_each_message_once() {
    fake::reset();
    let node = fake::node("listener");
    let (received, callback) = fake::recorder();
    let sub = Subscription::new("/chatter", &node, fake::api(), None, callback).unwrap();
    for i in 0..32 {
        fake::publish(&format!("msg-{i}"));
    }

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| while sub.take().unwrap().is_processed() {});
        }
    });

    let mut got = received.lock().clone();
    got.sort();
    got.dedup();
    assert_eq!(got.len(), 32);

    sub.dispose().unwrap();
}

/// A registry snapshot taken before dispose polls as idle, not as an error.
#[test]
#[serial]
fn try_process_after_dispose_reports_idle() {
    fake::reset();
    let node = fake::node("listener");
    let (received, callback) = fake::recorder();
    let sub = Subscription::new("/chatter", &node, fake::api(), None, callback).unwrap();
    let snapshot = node.subscriptions();
    fake::publish("late");

    sub.dispose().unwrap();

    assert!(!snapshot[0].try_process().unwrap());
    assert!(snapshot[0].is_disposed());
    assert!(sub.take().unwrap_err().is_use_after_dispose());
    assert_eq!(fake::count(&FAKE.take_calls), 0);
    assert!(received.lock().is_empty());
}

/// Native take failures still reach the executor.
#[test]
#[serial]
fn try_process_surfaces_native_failure() {
    fake::reset();
    let node = fake::node("listener");
    let sub = Subscription::new("/chatter", &node, fake::api(), None, |_: Chatter| {}).unwrap();
    FAKE.take_error.store(1, Ordering::SeqCst);

    let err = node.subscriptions()[0].try_process().unwrap_err();

    assert_eq!(err.code(), Some(ReturnCode::Error));
    sub.dispose().unwrap();
}
