use std::sync::Arc;

use engine_logging::NullSink;
use pretty_assertions::assert_eq;
use serde_json::json;
use snippet_core::{ErrorCategory, MonitorConfiguration, WaitOptions};
use snippet_engine::{DelegatedSettings, Dispatcher, EngineSettings};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn dispatcher() -> Dispatcher {
    Dispatcher::new(EngineSettings::default(), Arc::new(NullSink))
}

fn config_for(server: &MockServer, selector: &str) -> MonitorConfiguration {
    MonitorConfiguration::delegated("https://example.com/page", selector, server.uri())
}

async fn respond(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/extract"))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn empty_results_are_not_found() {
    let server = MockServer::start().await;
    respond(&server, ResponseTemplate::new(200).set_body_json(json!({"results": []}))).await;

    let result = dispatcher().fetch(&config_for(&server, "h1")).await;
    let error = result.error.expect("error");
    assert_eq!(error.message, "No content found matching selector: h1");
    assert_eq!(error.category, ErrorCategory::NotFound);
}

#[tokio::test]
async fn all_matches_request_is_sent_with_key_and_joined() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/extract"))
        .and(header("content-type", "application/json"))
        .and(header("authorization", "Bearer secret"))
        .and(body_json(json!({
            "url": "https://example.com/page",
            "selector": "li",
            "timeout": 45,
            "first_only": false,
            "render_js": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"text": "first", "html": "<li>first</li>"},
                {"text": "", "html": "<li><img></li>"},
                {"html": ""},
                {"text": "third"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = MonitorConfiguration {
        api_key: "secret".into(),
        fetch_all_matches: true,
        ..config_for(&server, "li")
    };
    let result = dispatcher().fetch(&config).await;

    assert_eq!(result.error, None);
    assert_eq!(result.content, "first\n<li><img></li>\nthird");
    assert_eq!(result.matches().count(), 3);
}

#[tokio::test]
async fn javascript_wait_options_are_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/extract"))
        .and(body_json(json!({
            "url": "https://example.com/page",
            "selector": "#price",
            "timeout": 45,
            "first_only": true,
            "render_js": true,
            "wait_for": {
                "load_state": "networkidle",
                "wait_for_selector": "#price",
                "wait_time": 2.5
            }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"results": [{"text": " 19.99 "}]})),
        )
        .mount(&server)
        .await;

    let config = MonitorConfiguration {
        use_javascript: true,
        wait_options: WaitOptions {
            enabled: true,
            load_state: "networkidle".into(),
            wait_for_selector: "#price".into(),
            additional_wait_time: 2.5,
        },
        ..config_for(&server, "#price")
    };
    let result = dispatcher().fetch(&config).await;
    assert_eq!(result.error, None);
    assert_eq!(result.content, "19.99");
}

#[tokio::test]
async fn server_error_field_is_surfaced() {
    let server = MockServer::start().await;
    respond(
        &server,
        ResponseTemplate::new(500).set_body_json(json!({"error": "Browser crashed"})),
    )
    .await;

    let error = dispatcher()
        .fetch(&config_for(&server, "h1"))
        .await
        .error
        .expect("error");
    assert_eq!(error.message, "Browser crashed");
    assert_eq!(error.category, ErrorCategory::Server);
}

#[tokio::test]
async fn status_is_used_without_error_field() {
    let server = MockServer::start().await;
    respond(&server, ResponseTemplate::new(502).set_body_string("bad gateway")).await;

    let error = dispatcher()
        .fetch(&config_for(&server, "h1"))
        .await
        .error
        .expect("error");
    assert_eq!(error.message, "HTTP error: 502");
    assert_eq!(error.category, ErrorCategory::Server);
}

#[tokio::test]
async fn rejected_key_is_an_auth_error() {
    let server = MockServer::start().await;
    respond(
        &server,
        ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid API key"})),
    )
    .await;

    let error = dispatcher()
        .fetch(&config_for(&server, "h1"))
        .await
        .error
        .expect("error");
    assert_eq!(error.category, ErrorCategory::Auth);
}

#[tokio::test]
async fn javascript_failures_reported_by_the_service_are_categorised() {
    let server = MockServer::start().await;
    respond(
        &server,
        ResponseTemplate::new(500)
            .set_body_json(json!({"error": "JavaScript evaluation failed: ReferenceError"})),
    )
    .await;

    let error = dispatcher()
        .fetch(&config_for(&server, "h1"))
        .await
        .error
        .expect("error");
    assert_eq!(error.category, ErrorCategory::JavaScript);
}

#[tokio::test]
async fn oversized_service_response_is_rejected() {
    let server = MockServer::start().await;
    let text = "x".repeat(4096);
    respond(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({"results": [{"text": text}]})),
    )
    .await;

    let settings = EngineSettings {
        delegated: DelegatedSettings {
            max_bytes: 1024,
            ..DelegatedSettings::default()
        },
        ..EngineSettings::default()
    };
    let result = Dispatcher::new(settings, Arc::new(NullSink))
        .fetch(&config_for(&server, "p"))
        .await;
    assert_eq!(result.content, "");
    assert_eq!(
        result.error.expect("error").message,
        "Response too large (limit 1024 bytes)"
    );
}

#[tokio::test]
async fn malformed_body_is_a_parsing_error() {
    let server = MockServer::start().await;
    respond(&server, ResponseTemplate::new(200).set_body_json(json!({"items": []}))).await;

    let result = dispatcher().fetch(&config_for(&server, "h1")).await;
    let error = result.error.expect("error");
    assert_eq!(error.message, "Invalid response format from server");
    assert_eq!(error.category, ErrorCategory::Generic);
    assert_eq!(result.content, "");
}

#[tokio::test]
async fn results_without_text_are_a_parsing_error() {
    let server = MockServer::start().await;
    respond(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({"results": [{"text": " "}, {}]})),
    )
    .await;

    let error = dispatcher()
        .fetch(&config_for(&server, "h1"))
        .await
        .error
        .expect("error");
    assert_eq!(error.message, "Results contained no text content");
}

#[tokio::test]
async fn unreachable_server_is_a_connection_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = MonitorConfiguration::delegated(
        "https://example.com/page",
        "h1",
        format!("http://127.0.0.1:{port}"),
    );

    let error = dispatcher().fetch(&config).await.error.expect("error");
    assert_eq!(error.category, ErrorCategory::Connection);
    assert!(error.message.starts_with("Could not connect"));
}
