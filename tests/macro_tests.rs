//! Integration tests for the `#[testkit_mock::test]` macro.

#![cfg(feature = "macros")]

use std::time::Duration;

use testkit_mock::prelude::*;

/// Basic test without session injection.
#[testkit_mock::test]
fn test_basic() {
    assert_eq!(2 + 2, 4);
}

/// Test with Session injection.
#[testkit_mock::test]
fn test_with_session(session: Session) {
    assert!(session.test_name().ends_with("test_with_session"));

    let format = MethodMock::<i32, String>::new(&session, "format");
    format
        .expect("two")
        .with(eq(2))
        .will_once(Action::Return("two".to_string()))
        .commit();

    assert_eq!(format.call(2), Some("two".to_string()));
}

/// Expectations nobody waited for are still verified when the test ends.
#[testkit_mock::test]
#[should_panic(expected = "Unfulfilled expectations: forgotten")]
fn test_end_verifies_unwaited(session: Session) {
    let ping = ClosureMock::<(), ()>::new(&session, "ping");
    ping.expect("forgotten").will_once(None).commit();
}

/// Test with a custom default timeout.
#[testkit_mock::test(timeout_ms = 50)]
fn test_timeout_config(session: Session) {
    assert_eq!(session.config().default_timeout, Duration::from_millis(50));
}

/// Test with the lenient unexpected-call policy.
#[testkit_mock::test(unexpected = "warn", enforce_order = true)]
fn test_lenient_config(session: Session) {
    assert!(session.config().enforce_order);
    let lookup = MethodMock::<u8, u8>::new(&session, "lookup");
    assert_eq!(lookup.call(1), None);
}

/// Tests returning a Result keep their return type.
#[testkit_mock::test]
fn test_result_return(session: Session) -> Result<()> {
    let volume = SetterMock::new(&session, "volume", 0);
    volume.expect("raised").with(gt(0)).will_once(None).commit();
    volume.set(3);
    if session.wait_for_expectations() {
        Ok(())
    } else {
        Err(Error::Timeout(session.config().default_timeout))
    }
}

/// Async test on the multi-thread runtime.
#[testkit_mock::test(flavor = "multi_thread")]
async fn test_async_multi_thread(session: Session) {
    let publish = MethodMock::<u32, ()>::new(&session, "publish");
    publish
        .expect("twice")
        .will_repeatedly(Times::exactly(2), None)
        .commit();

    let waiting = session.wait_for_expectations_async(None);
    let handle = tokio::spawn({
        let publish = publish.clone();
        async move {
            publish.call(1);
            publish.call(2);
        }
    });

    assert!(waiting.await);
    handle.await.unwrap();
}
