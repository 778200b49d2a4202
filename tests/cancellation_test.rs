//! Cancellation of single-shot calls and streams.

mod support;

use std::time::{Duration, Instant};

use futures_util::StreamExt;
use support::ScriptedModel;
use unillm::prelude::*;

#[tokio::test]
async fn cancelled_generate_returns_promptly() {
    let model = ScriptedModel::echo().with_delay(Duration::from_secs(30));
    let cancel = CancelHandle::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let err = generate_text(&model, &GenerateTextOptions::new().prompt("hi").cancel(cancel))
        .await
        .unwrap_err();
    assert_eq!(err, LlmError::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn already_cancelled_call_never_reaches_the_model() {
    let model = ScriptedModel::echo();
    let cancel = CancelHandle::new();
    cancel.cancel();
    let err = generate_object::<serde_json::Value>(
        &model,
        &GenerateObjectOptions::new().prompt("x").cancel(cancel),
    )
    .await
    .unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn cancelling_a_text_stream_ends_it_without_terminal_chunk() {
    let model = ScriptedModel::echo()
        .with_text_deltas(&["a", "b", "c", "d"], None)
        .with_delay(Duration::from_millis(50));
    let cancel = CancelHandle::new();
    let mut stream = stream_text(
        &model,
        &GenerateTextOptions::new().prompt("go").cancel(cancel.clone()),
    )
    .await
    .unwrap();

    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.as_text_delta(), Some("a"));
    cancel.cancel();

    let rest: Vec<Result<StreamChunk, LlmError>> = stream.collect().await;
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].as_ref().unwrap_err(), &LlmError::Cancelled);
}

#[tokio::test]
async fn cancelling_an_object_stream_yields_no_final_chunk() {
    let model = ScriptedModel::echo()
        .with_text_deltas(&["{", "\"a\"", ":", "1", "}"], None)
        .with_delay(Duration::from_millis(50));
    let cancel = CancelHandle::new();
    let options = StreamObjectOptions::new(
        GenerateObjectOptions::new().prompt("go").cancel(cancel.clone()),
    );
    let mut stream = stream_object::<serde_json::Value>(&model, &options)
        .await
        .unwrap();

    let first = stream.next().await.unwrap().unwrap();
    assert!(!first.is_complete);
    cancel.cancel();

    let rest: Vec<_> = stream.collect().await;
    assert_eq!(rest.len(), 1);
    assert!(rest[0].as_ref().unwrap_err().is_cancelled());
}
