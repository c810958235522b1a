//! Creation, disposal and reclamation of native subscriptions.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use serial_test::serial;

use crate::error::RclError;
use crate::return_code::ReturnCode;
use crate::subscription::Subscription;
use crate::tests::fake::{self, Chatter, FAKE};
use crate::types::SubscriptionState;

fn subscribe(topic: &str) -> (Arc<crate::node::Node>, Arc<Subscription<Chatter>>) {
    let node = fake::node("listener");
    let sub = Subscription::new(topic, &node, fake::api(), None, |_: Chatter| {})
        .expect("subscription should initialize");
    (node, sub)
}

/// Creation initializes natively and leaves the subscription active.
#[test]
#[serial]
fn create_initializes_native_handle() {
    fake::reset();
    let (node, sub) = subscribe("/chatter");

    assert_eq!(sub.state(), SubscriptionState::Active);
    assert!(!sub.is_disposed());
    assert_eq!(sub.topic(), "/chatter");
    assert_eq!(*FAKE.last_topic.lock(), "/chatter");
    assert_eq!(fake::count(&FAKE.init_calls), 1);
    assert_eq!(fake::live_handles(), 1);
    assert_eq!(fake::live_options(), 1);
    assert_eq!(node.subscription_count(), 1);

    sub.dispose().unwrap();
}

/// A failed init reports the native status and leaks nothing.
#[test]
#[serial]
fn init_failure_releases_handle_and_options() {
    fake::reset();
    FAKE.init_status.store(103, Ordering::SeqCst);
    let node = fake::node("listener");

    let err = Subscription::new("bad topic", &node, fake::api(), None, |_: Chatter| {})
        .unwrap_err();

    assert_eq!(
        err,
        RclError::Init {
            topic: "bad topic".into(),
            code: ReturnCode::TopicNameInvalid,
        }
    );
    assert_eq!(err.code(), Some(ReturnCode::TopicNameInvalid));
    assert_eq!(fake::live_handles(), 0);
    assert_eq!(fake::live_options(), 0);
    assert_eq!(fake::count(&FAKE.fini_calls), 0);
    assert_eq!(node.subscription_count(), 0);
}

/// A null options block is an allocation failure.
#[test]
#[serial]
fn options_allocation_failure() {
    fake::reset();
    FAKE.fail_options.store(true, Ordering::SeqCst);
    let node = fake::node("listener");

    let err = Subscription::new("/chatter", &node, fake::api(), None, |_: Chatter| {})
        .unwrap_err();

    assert_eq!(err.code(), Some(ReturnCode::BadAlloc));
    assert_eq!(fake::count(&FAKE.init_calls), 0);
    assert_eq!(fake::live_handles(), 0);
}

/// A null zero-initialized handle releases the options block.
#[test]
#[serial]
fn handle_allocation_failure_releases_options() {
    fake::reset();
    FAKE.fail_zero_init.store(true, Ordering::SeqCst);
    let node = fake::node("listener");

    let err = Subscription::new("/chatter", &node, fake::api(), None, |_: Chatter| {})
        .unwrap_err();

    assert_eq!(err.code(), Some(ReturnCode::BadAlloc));
    assert_eq!(fake::live_options(), 0);
    assert_eq!(fake::count(&FAKE.init_calls), 0);
}

/// Interior NUL never reaches the native layer.
#[test]
#[serial]
fn topic_with_nul_is_rejected() {
    fake::reset();
    let node = fake::node("listener");

    let err = Subscription::new("/chat\0ter", &node, fake::api(), None, |_: Chatter| {})
        .unwrap_err();

    assert!(matches!(err, RclError::InvalidTopic(_)));
    assert_eq!(fake::live_options(), 0);
    assert_eq!(fake::live_handles(), 0);
}

/// Disposing twice finalizes once; the second call is a no-op.
#[test]
#[serial]
fn dispose_is_idempotent() {
    fake::reset();
    let (_node, sub) = subscribe("/chatter");

    sub.dispose().unwrap();
    sub.dispose().unwrap();

    assert_eq!(sub.state(), SubscriptionState::Disposed);
    assert!(sub.is_disposed());
    assert_eq!(fake::count(&FAKE.fini_calls), 1);
    assert_eq!(fake::live_handles(), 0);
    assert_eq!(fake::live_options(), 0);
}

/// A failed fini is reported, but memory is still freed.
#[test]
#[serial]
fn fini_failure_still_frees() {
    fake::reset();
    let (node, sub) = subscribe("/chatter");
    FAKE.fini_status.store(1, Ordering::SeqCst);

    let err = sub.dispose().unwrap_err();

    assert_eq!(
        err,
        RclError::NativeCall {
            operation: "rcl_subscription_fini",
            code: ReturnCode::Error,
        }
    );
    assert_eq!(sub.state(), SubscriptionState::Disposed);
    assert_eq!(fake::live_handles(), 0);
    assert_eq!(fake::live_options(), 0);
    assert_eq!(node.subscription_count(), 0);

    // Already disposed: nothing left to fail.
    sub.dispose().unwrap();
    assert_eq!(fake::count(&FAKE.fini_calls), 1);
}

/// Dropping every reference without disposing reclaims native memory.
#[test]
#[serial]
fn drop_reclaims_undisposed_subscription() {
    fake::reset();
    let (node, sub) = subscribe("/chatter");

    drop(node);
    drop(sub);

    assert_eq!(fake::count(&FAKE.fini_calls), 1);
    assert_eq!(fake::live_handles(), 0);
    assert_eq!(fake::live_options(), 0);
}

/// Reclamation swallows fini failures.
#[test]
#[serial]
fn drop_tolerates_fini_failure() {
    fake::reset();
    let (node, sub) = subscribe("/chatter");
    FAKE.fini_status.store(1, Ordering::SeqCst);

    drop(node);
    drop(sub);

    assert_eq!(fake::live_handles(), 0);
    assert_eq!(fake::live_options(), 0);
}

/// Dropping an already disposed subscription does not finalize again.
#[test]
#[serial]
fn drop_after_dispose_is_noop() {
    fake::reset();
    let (node, sub) = subscribe("/chatter");

    sub.dispose().unwrap();
    drop(sub);
    drop(node);

    assert_eq!(fake::count(&FAKE.fini_calls), 1);
    assert_eq!(fake::live_handles(), 0);
}

/// Native invalidity is reported as disposed.
#[test]
#[serial]
fn natively_invalid_handle_reads_as_disposed() {
    fake::reset();
    let (_node, sub) = subscribe("/chatter");
    FAKE.invalid.store(true, Ordering::SeqCst);

    assert!(sub.is_disposed());
    assert_eq!(sub.state(), SubscriptionState::Active);
    assert!(sub.take().unwrap_err().is_use_after_dispose());

    FAKE.invalid.store(false, Ordering::SeqCst);
    sub.dispose().unwrap();
    assert_eq!(fake::live_handles(), 0);
}

/// Distinct subscriptions get distinct identifiers.
#[test]
#[serial]
fn ids_are_unique() {
    fake::reset();
    let (_node, first) = subscribe("/a");
    let (_other, second) = subscribe("/b");

    assert_ne!(first.id(), second.id());

    first.dispose().unwrap();
    second.dispose().unwrap();
}
