//! Integration tests for the Anthropic reasoner using wiremock.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use conductor_reasoner_anthropic::AnthropicReasoner;
use flow0::{ContextSnapshot, DurationMs, Reasoner, ReasoningError, ReasoningRequest};
use wiremock::matchers::{body_partial_json, header, method, path};
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(prompt: &str) -> ReasoningRequest {
    ReasoningRequest::new(prompt, ContextSnapshot::default())
}

fn success_response_body() -> serde_json::Value {
    serde_json::json!({
        "id": "msg_01XFDUDYJgAACzvnptvVoYEL",
        "type": "message",
        "role": "assistant",
        "model": "claude-sonnet-4-20250514",
        "content": [{ "type": "text", "text": "Conversion rose 14% week over week." }],
        "stop_reason": "end_turn",
        "stop_sequence": null,
        "usage": { "input_tokens": 12, "output_tokens": 10 }
    })
}

#[tokio::test]
async fn reason_sends_correct_headers_and_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-api-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(serde_json::json!({
            "model": "claude-test",
            "max_tokens": 256,
            "system": "be brief",
            "messages": [{ "role": "user", "content": "Summarize the metrics" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_response_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let reasoner = AnthropicReasoner::new("test-api-key")
        .base_url(mock_server.uri())
        .model("claude-test")
        .max_tokens(256)
        .system("be brief");

    let response = reasoner.reason(request("Summarize the metrics")).await;
    assert!(response.is_ok(), "expected Ok, got: {:?}", response.err());
    assert_eq!(response.unwrap().text, "Conversion rose 14% week over week.");
}

#[tokio::test]
async fn multiple_text_blocks_are_joined() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": [
                { "type": "text", "text": "{\"summary\": " },
                { "type": "text", "text": "\"ok\"}" }
            ]
        })))
        .mount(&mock_server)
        .await;

    let reasoner = AnthropicReasoner::new("key").base_url(mock_server.uri());
    let response = reasoner.reason(request("x")).await.unwrap();
    assert_eq!(response.text, "{\"summary\": \"ok\"}");
}

#[tokio::test]
async fn unauthorized_maps_to_auth() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid x-api-key"))
        .mount(&mock_server)
        .await;

    let reasoner = AnthropicReasoner::new("bad").base_url(mock_server.uri());
    let err = reasoner.reason(request("x")).await.unwrap_err();
    assert_eq!(err, ReasoningError::Auth("invalid x-api-key".into()));
}

#[tokio::test]
async fn rate_limit_maps_to_quota_with_retry_after() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "2")
                .set_body_json(serde_json::json!({
                    "type": "error",
                    "error": { "type": "rate_limit_error", "message": "slow down" }
                })),
        )
        .mount(&mock_server)
        .await;

    let reasoner = AnthropicReasoner::new("key").base_url(mock_server.uri());
    let err = reasoner.reason(request("x")).await.unwrap_err();
    assert_eq!(
        err,
        ReasoningError::Quota {
            retry_after: Some(DurationMs::from_secs(2))
        }
    );
}

#[tokio::test]
async fn server_error_maps_to_transport() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&mock_server)
        .await;

    let reasoner = AnthropicReasoner::new("key").base_url(mock_server.uri());
    let err = reasoner.reason(request("x")).await.unwrap_err();
    assert!(matches!(err, ReasoningError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn garbage_body_is_invalid_output() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let reasoner = AnthropicReasoner::new("key").base_url(mock_server.uri());
    let err = reasoner.reason(request("x")).await.unwrap_err();
    assert!(matches!(err, ReasoningError::InvalidOutput(_)), "got {err:?}");
}

#[tokio::test]
async fn reply_without_text_is_invalid_output() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "content": [] })),
        )
        .mount(&mock_server)
        .await;

    let reasoner = AnthropicReasoner::new("key").base_url(mock_server.uri());
    let err = reasoner.reason(request("x")).await.unwrap_err();
    assert_eq!(
        err,
        ReasoningError::InvalidOutput("response has no text content".into())
    );
}

#[tokio::test]
async fn slow_reply_maps_to_timeout() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(success_response_body())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let reasoner = AnthropicReasoner::new("key")
        .base_url(mock_server.uri())
        .timeout(Duration::from_millis(100));
    let err = reasoner.reason(request("x")).await.unwrap_err();
    assert!(matches!(err, ReasoningError::Timeout(_)), "got {err:?}");
}

#[test]
fn reasoner_is_named_anthropic() {
    assert_eq!(AnthropicReasoner::new("k").name(), "anthropic");
}

/// Collects `(target, message)` of every event.
#[derive(Clone, Default)]
struct Events(Arc<Mutex<Vec<(String, String)>>>);

impl<S: tracing::Subscriber> Layer<S> for Events {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        struct Message(String);
        impl Visit for Message {
            fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
                if field.name() == "message" {
                    self.0 = format!("{value:?}");
                }
            }
        }
        let mut message = Message(String::new());
        event.record(&mut message);
        self.0
            .lock()
            .unwrap()
            .push((event.metadata().target().to_string(), message.0));
    }
}

#[tokio::test]
async fn request_event_uses_the_dotted_name() {
    let events = Events::default();
    let _guard =
        tracing::subscriber::set_default(tracing_subscriber::registry().with(events.clone()));
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_response_body()))
        .mount(&mock_server)
        .await;

    AnthropicReasoner::new("k")
        .base_url(mock_server.uri())
        .reason(request("hi"))
        .await
        .unwrap();

    let ours: Vec<String> = events
        .0
        .lock()
        .unwrap()
        .iter()
        .filter(|(target, _)| target.starts_with("conductor_reasoner_anthropic"))
        .map(|(_, message)| message.clone())
        .collect();
    assert!(
        ours.iter().any(|m| m == "conductor.reasoning.anthropic.request"),
        "{ours:?}"
    );
    assert!(ours.iter().all(|m| m.starts_with("conductor.")), "{ours:?}");
}
