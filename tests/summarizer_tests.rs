use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use newsletter_digest::ai::{ItemLimits, LlmClient, LlmSummarizer, Summarizer};
use newsletter_digest::core::models::{CategoryPlan, ExtractedItem, Link};
use newsletter_digest::errors::DigestError;

fn summarizer(server: &MockServer, max_batch_chars: usize) -> LlmSummarizer {
    let client = LlmClient::with_api_base(
        reqwest::Client::new(),
        SecretString::from("sk-test".to_string()),
        "claude-test".to_string(),
        server.uri(),
    );
    LlmSummarizer::new(
        client,
        ItemLimits {
            max_content_chars: 2_000,
            max_links: 10,
        },
        max_batch_chars,
    )
}

fn plan() -> CategoryPlan {
    CategoryPlan::new(vec!["Papers".into(), "News".into(), "Tools".into()], 2).unwrap()
}

fn item(id: &str) -> ExtractedItem {
    ExtractedItem {
        message_id: id.into(),
        title: format!("Issue {id}"),
        source: "AI Weekly".into(),
        text: "A new open-weights model tops the reasoning leaderboard.".into(),
        links: vec![Link {
            url: format!("https://example.com/{id}"),
            text: "Read more".into(),
        }],
    }
}

fn answer(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "msg_1",
        "type": "message",
        "role": "assistant",
        "content": [{ "type": "text", "text": text }],
        "stop_reason": "end_turn",
        "usage": { "input_tokens": 900, "output_tokens": 120 }
    }))
}

#[tokio::test]
async fn sends_messages_request_and_parses_categories() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-test",
            "max_tokens": 4096,
            "temperature": 0.3
        })))
        .and(body_string_contains("CATEGORIES: Papers, News, Tools"))
        .and(body_string_contains("https://example.com/m1"))
        .respond_with(answer(
            r#"{"News": [{"title": "Open model tops leaderboard", "summary": "It does.", "source": "AI Weekly", "link": "https://example.com/m1"}],
                "Memes": [{"title": "lol"}]}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let sections = summarizer(&server, 60_000)
        .summarize(&[item("m1")], &plan())
        .await
        .unwrap();

    let names: Vec<_> = sections.iter().map(|s| s.category.as_str()).collect();
    assert_eq!(names, vec!["Papers", "News", "Tools"]);
    assert_eq!(sections[1].entries.len(), 1);
    assert_eq!(sections[1].entries[0].headline, "Open model tops leaderboard");
    assert_eq!(
        sections[1].entries[0].link.as_deref(),
        Some("https://example.com/m1")
    );
}

#[tokio::test]
async fn small_batch_limit_splits_requests_and_caps_merge() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(answer(r#"{"Tools": [{"title": "t1"}, {"title": "t2"}]}"#))
        .expect(3)
        .mount(&server)
        .await;

    let sections = summarizer(&server, 100)
        .summarize(&[item("a"), item("b"), item("c")], &plan())
        .await
        .unwrap();

    assert_eq!(sections[2].entries.len(), 2);
}

#[tokio::test]
async fn prompt_template_counts_against_the_batch_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(answer(r#"{"News": [{"title": "n"}]}"#))
        .expect(3)
        .mount(&server)
        .await;

    // The three item blocks fit in 700 characters; the template around them does not.
    summarizer(&server, 700)
        .summarize(&[item("a"), item("b"), item("c")], &plan())
        .await
        .unwrap();
}

#[tokio::test]
async fn api_error_is_summarization_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(529).set_body_json(json!({
            "type": "error",
            "error": { "type": "overloaded_error", "message": "Overloaded" }
        })))
        .mount(&server)
        .await;

    let err = summarizer(&server, 60_000)
        .summarize(&[item("m1")], &plan())
        .await
        .unwrap_err();

    assert!(matches!(err, DigestError::SummarizationError(ref m) if m.contains("529")));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn prose_answer_is_summarization_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(answer("Sorry, I can't help with that."))
        .mount(&server)
        .await;

    let err = summarizer(&server, 60_000)
        .summarize(&[item("m1")], &plan())
        .await
        .unwrap_err();

    assert!(matches!(err, DigestError::SummarizationError(_)));
}
