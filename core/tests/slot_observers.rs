//! Cross-task observation and error identity through deferred slots.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use settle_core::{DeferredSlot, SlotError, SlotState};
use settle_types::{
    ErrorReport, InvalidToolInputError, NoSuchToolError, OriginalToolError, SdkError,
    ToolCallRepairError,
};

fn repair_error() -> ToolCallRepairError {
    let parse_failure: SlotError = Arc::new(io::Error::other("expected object"));
    let original = InvalidToolInputError::new("read_file", "[]", parse_failure);
    let repair_failure: SlotError = Arc::new(io::Error::other("repair model refused"));
    ToolCallRepairError::new(repair_failure, original)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn observers_on_other_threads_see_one_value() {
    let slot = DeferredSlot::<Arc<str>, String>::labeled("multi-thread");
    let early: Vec<_> = (0..16)
        .map(|_| {
            let accessor = slot.accessor();
            tokio::spawn(async move { accessor.await })
        })
        .collect();

    let producer = slot.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(5)).await;
        producer.fulfill(Arc::from("ready"));
    })
    .await
    .unwrap();

    let late: Vec<_> = (0..16)
        .map(|_| {
            let slot = slot.clone();
            tokio::spawn(async move { slot.accessor().await })
        })
        .collect();

    for handle in early.into_iter().chain(late) {
        assert_eq!(handle.await.unwrap().as_deref(), Ok("ready"));
    }
    assert_eq!(slot.state(), SlotState::Fulfilled);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_producers_settle_exactly_once() {
    let slot = DeferredSlot::<usize, String>::new();
    let producers: Vec<_> = (0..32)
        .map(|n| {
            let slot = slot.clone();
            tokio::spawn(async move { slot.try_fulfill(n).is_ok() })
        })
        .collect();

    let mut winners = 0;
    for producer in producers {
        if producer.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);

    let first = slot.accessor().await.unwrap();
    assert_eq!(slot.accessor().await, Ok(first));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn outcome_is_readable_as_soon_as_settlement_returns() {
    for round in 0..200 {
        let slot = DeferredSlot::<usize, String>::new();
        let observers: Vec<_> = (0..4).map(|_| tokio::spawn(slot.accessor())).collect();
        tokio::task::yield_now().await;

        slot.fulfill(round);
        assert_eq!(slot.outcome(), Some(Ok(round)));

        for observer in observers {
            assert_eq!(observer.await.unwrap(), Ok(round));
        }
    }
}

#[tokio::test]
async fn repair_error_identity_survives_erased_slot() {
    let slot = DeferredSlot::<String>::new();
    let pending = slot.accessor();
    slot.reject(Arc::new(repair_error()));

    for outcome in [pending.await, slot.accessor().await] {
        let err = outcome.unwrap_err();
        assert!(ToolCallRepairError::is_instance(&*err));
        assert!(SdkError::is_instance(&*err));
        assert!(!NoSuchToolError::is_instance(&*err));
        assert_eq!(
            err.to_string(),
            "Error repairing tool call: repair model refused"
        );

        let repair = err.downcast_ref::<ToolCallRepairError>().unwrap();
        assert!(matches!(
            repair.original_error(),
            OriginalToolError::InvalidToolInput(original) if original.tool_input() == "[]"
        ));
    }
}

#[tokio::test]
async fn carrier_slot_keeps_markers_after_report_round_trip() {
    let slot = DeferredSlot::<String, SdkError>::new();
    let json = serde_json::to_string(&repair_error().as_sdk_error().report()).unwrap();
    let report: ErrorReport = serde_json::from_str(&json).unwrap();
    slot.reject(SdkError::from(report));

    let err = slot.accessor().await.unwrap_err();
    assert!(ToolCallRepairError::is_instance(&err));
    assert_eq!(err.name(), ToolCallRepairError::NAME);
}

#[tokio::test]
async fn unsettled_slot_can_be_raced_against_a_timeout() {
    let slot = DeferredSlot::<String>::new();
    let waited = tokio::time::timeout(Duration::from_millis(10), slot.accessor()).await;
    assert!(waited.is_err());

    slot.fulfill("late".to_owned());
    let waited = tokio::time::timeout(Duration::from_millis(10), slot.accessor()).await;
    assert_eq!(waited.unwrap().unwrap(), "late");
}
