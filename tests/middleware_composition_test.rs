//! Onion ordering and concurrency of composed models.

mod support;

use std::sync::Arc;

use futures_util::StreamExt;
use support::ScriptedModel;
use unillm::middleware::{GenerateFn, GenerateFuture, LoggingMiddleware, StreamFn, StreamFuture};
use unillm::prelude::*;

/// Appends `suffix` to the prompt on the way in and `[tag]` to the text on the way out.
struct Tag {
    suffix: &'static str,
    tag: &'static str,
}

impl LanguageModelMiddleware for Tag {
    fn wrap_generate(&self, next: Arc<GenerateFn>) -> Arc<GenerateFn> {
        let suffix = self.suffix;
        let tag = self.tag;
        Arc::new(move |mut options: LanguageModelCallOptions| -> GenerateFuture {
            let next = next.clone();
            Box::pin(async move {
                if let Some(last) = options.messages.last_mut() {
                    last.content.push_str(suffix);
                }
                let mut result = next(options).await?;
                let text = format!("{}[{}]", result.text_or_empty(), tag);
                result.text = Some(text);
                Ok(result)
            })
        })
    }

    fn wrap_stream(&self, next: Arc<StreamFn>) -> Arc<StreamFn> {
        let suffix = self.suffix;
        Arc::new(move |mut options: LanguageModelCallOptions| -> StreamFuture {
            let next = next.clone();
            Box::pin(async move {
                if let Some(last) = options.messages.last_mut() {
                    last.content.push_str(suffix);
                }
                next(options).await
            })
        })
    }
}

struct Upper;

impl LanguageModelMiddleware for Upper {
    fn on_stream_chunk(&self, chunk: StreamChunk) -> Result<Vec<StreamChunk>, LlmError> {
        Ok(match chunk {
            StreamChunk::TextDelta { text } => vec![StreamChunk::text_delta(text.to_uppercase())],
            other => vec![other],
        })
    }
}

/// Emits an extra delta after the terminal chunk, which must never reach callers.
struct Trailing;

impl LanguageModelMiddleware for Trailing {
    fn on_stream_chunk(&self, chunk: StreamChunk) -> Result<Vec<StreamChunk>, LlmError> {
        if chunk.is_terminal() {
            Ok(vec![chunk, StreamChunk::text_delta("after")])
        } else {
            Ok(vec![chunk])
        }
    }
}

fn tagged() -> Vec<Arc<dyn LanguageModelMiddleware>> {
    vec![
        Arc::new(Tag { suffix: "-A", tag: "A" }),
        Arc::new(Tag { suffix: "-B", tag: "B" }),
    ]
}

#[tokio::test]
async fn onion_order_for_requests_and_responses() {
    let inner = Arc::new(ScriptedModel::echo());
    let model = wrap_language_model(inner.clone(), tagged());

    let result = generate_text(model.as_ref(), &GenerateTextOptions::new().prompt("hello"))
        .await
        .unwrap();

    assert_eq!(inner.calls()[0].messages[0].content, "hello-A-B");
    assert_eq!(result.text.as_deref(), Some("hello-A-B[B][A]"));
}

#[tokio::test]
async fn streaming_path_uses_the_same_order() {
    let inner = Arc::new(ScriptedModel::echo().with_text_deltas(&["ab", "c"], None));
    let mut middlewares = tagged();
    middlewares.push(Arc::new(Upper));
    let model = wrap_language_model(inner.clone(), middlewares);

    let stream = stream_text(model.as_ref(), &GenerateTextOptions::new().prompt("p"))
        .await
        .unwrap();
    let chunks: Vec<StreamChunk> = stream.map(|c| c.unwrap()).collect().await;
    let text: String = chunks.iter().filter_map(|c| c.as_text_delta()).collect();

    assert_eq!(inner.calls()[0].messages[0].content, "p-A-B");
    assert_eq!(text, "ABC");
}

#[tokio::test]
async fn nothing_follows_a_terminal_chunk() {
    let inner = Arc::new(ScriptedModel::echo().with_text_deltas(&["x"], None));
    let model = wrap_language_model(inner, vec![Arc::new(Trailing)]);
    let stream = model
        .stream(LanguageModelCallOptions::new(vec![ChatMessage::user("p")]).unwrap())
        .await
        .unwrap();
    let chunks: Vec<StreamChunk> = stream.map(|c| c.unwrap()).collect().await;
    assert_eq!(chunks.len(), 2);
    assert!(chunks[1].is_terminal());
}

#[tokio::test]
async fn composed_model_is_safe_under_concurrent_calls() {
    let model = wrap_language_model(Arc::new(ScriptedModel::echo()), tagged());
    let mut handles = Vec::new();
    for i in 0..16 {
        let model = model.clone();
        handles.push(tokio::spawn(async move {
            let options = GenerateTextOptions::new().prompt(format!("q{i}"));
            generate_text(model.as_ref(), &options).await
        }));
    }
    for (i, handle) in handles.into_iter().enumerate() {
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.text.unwrap(), format!("q{i}-A-B[B][A]"));
    }
}

#[tokio::test]
async fn builder_order_matches_composition_order() {
    let builder = MiddlewareBuilder::new()
        .add("b", Arc::new(Tag { suffix: "-B", tag: "B" }))
        .unwrap()
        .insert_before("b", "a", Arc::new(Tag { suffix: "-A", tag: "A" }))
        .unwrap()
        .add("logging", Arc::new(LoggingMiddleware::new()))
        .unwrap()
        .remove("logging");
    assert_eq!(builder.names(), vec!["a", "b"]);

    let model = builder.wrap(Arc::new(ScriptedModel::echo()));
    let result = generate_text(model.as_ref(), &GenerateTextOptions::new().prompt("x"))
        .await
        .unwrap();
    assert_eq!(result.text.as_deref(), Some("x-A-B[B][A]"));
}

#[tokio::test]
async fn empty_middleware_list_returns_model_unchanged() {
    let inner: Arc<dyn LanguageModel> = Arc::new(ScriptedModel::echo());
    let wrapped = wrap_language_model(inner.clone(), Vec::new());
    assert!(Arc::ptr_eq(&inner, &wrapped));
}
