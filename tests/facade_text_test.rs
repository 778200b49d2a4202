//! Text generation and streaming through the facade.

mod support;

use futures_util::StreamExt;
use support::ScriptedModel;
use unillm::prelude::*;

#[tokio::test]
async fn generate_text_builds_messages_in_order() {
    let model = ScriptedModel::new("scripted", "m1").with_text("done");
    let options = GenerateTextOptions::new()
        .system("be brief")
        .prompt("what is rust?")
        .message(ChatMessage::assistant("a language"))
        .settings(CallSettings::new().temperature(0.2));

    let result = generate_text(&model, &options).await.unwrap();
    assert_eq!(result.text.as_deref(), Some("done"));

    let calls = model.calls();
    assert_eq!(calls.len(), 1);
    let roles: Vec<MessageRole> = calls[0].messages.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![MessageRole::System, MessageRole::User, MessageRole::Assistant]
    );
    assert_eq!(calls[0].messages[1].content, "what is rust?");
    assert_eq!(calls[0].settings.temperature, Some(0.2));
}

#[tokio::test]
async fn empty_prompt_fails_before_model_contact() {
    let model = ScriptedModel::echo();
    let err = generate_text(&model, &GenerateTextOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidPrompt);

    let err = stream_text(&model, &GenerateTextOptions::new().prompt(""))
        .await
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::InvalidPrompt);
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn caller_options_are_not_mutated() {
    let model = ScriptedModel::echo();
    let options = GenerateTextOptions::new()
        .system("sys")
        .prompt("hello")
        .settings(CallSettings::new().max_tokens(10));
    let before_messages = options.build_messages();
    let before_settings = options.settings.clone();

    generate_text(&model, &options).await.unwrap();
    generate_text(&model, &options).await.unwrap();

    assert_eq!(options.build_messages(), before_messages);
    assert_eq!(options.settings, before_settings);
    assert!(options.messages.is_empty());
}

#[tokio::test]
async fn provider_errors_pass_through_unchanged() {
    let original = LlmError::provider_with_status("acme", "rate limited", 429, Some("rate_limit".into()));
    let model = ScriptedModel::echo().with_generate(Err(original.clone()));
    let err = generate_text(&model, &GenerateTextOptions::new().prompt("hi"))
        .await
        .unwrap_err();
    assert_eq!(err, original);
    assert_eq!(err.status_code(), Some(429));
}

#[tokio::test]
async fn stream_text_yields_deltas_then_one_terminal_chunk() {
    let model = ScriptedModel::echo().with_text_deltas(&["Hel", "lo"], Some(Usage::new(3, 2)));
    let stream = stream_text(&model, &GenerateTextOptions::new().prompt("hi"))
        .await
        .unwrap();
    let chunks: Vec<StreamChunk> = stream.map(|c| c.unwrap()).collect().await;

    let text: String = chunks.iter().filter_map(|c| c.as_text_delta()).collect();
    assert_eq!(text, "Hello");
    assert_eq!(chunks.iter().filter(|c| c.is_terminal()).count(), 1);
    assert!(chunks.last().unwrap().is_terminal());
}

#[tokio::test]
async fn unterminated_stream_gets_an_error_chunk() {
    let model = ScriptedModel::echo().with_stream_items(vec![Ok(StreamChunk::text_delta("x"))]);
    let stream = stream_text(&model, &GenerateTextOptions::new().prompt("hi"))
        .await
        .unwrap();
    let chunks: Vec<StreamChunk> = stream.map(|c| c.unwrap()).collect().await;
    assert_eq!(chunks.len(), 2);
    assert!(matches!(chunks[1], StreamChunk::Error { .. }));
}

#[tokio::test]
async fn chunks_after_terminal_are_dropped() {
    let model = ScriptedModel::echo().with_stream_items(vec![
        Ok(StreamChunk::finish(FinishReason::Stop, None)),
        Ok(StreamChunk::text_delta("late")),
    ]);
    let stream = stream_text(&model, &GenerateTextOptions::new().prompt("hi"))
        .await
        .unwrap();
    let chunks: Vec<_> = stream.collect().await;
    assert_eq!(chunks.len(), 1);
}
