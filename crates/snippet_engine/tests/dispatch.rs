use std::sync::Arc;
use std::time::Duration;

use engine_logging::NullSink;
use pretty_assertions::assert_eq;
use snippet_core::{ErrorCategory, MonitorConfiguration};
use snippet_engine::{Dispatcher, EngineHandle, EngineSettings, FetchPlan, WorkerSettings};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn plan_follows_server_flag() {
    let direct = MonitorConfiguration::direct("https://example.com", "h1");
    assert_eq!(FetchPlan::for_config(&direct), Ok(FetchPlan::DirectFetch));

    let delegated = MonitorConfiguration {
        use_javascript: true,
        ..MonitorConfiguration::delegated("https://example.com", "h1", "http://localhost:5000")
    };
    assert_eq!(
        FetchPlan::for_config(&delegated),
        Ok(FetchPlan::DelegatedExtraction)
    );
}

#[tokio::test]
async fn javascript_without_server_never_touches_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<h1>x</h1>"))
        .mount(&server)
        .await;

    let config = MonitorConfiguration {
        use_javascript: true,
        ..MonitorConfiguration::direct(server.uri(), "h1")
    };
    let result = Dispatcher::new(EngineSettings::default(), Arc::new(NullSink))
        .fetch(&config)
        .await;

    let error = result.error.expect("configuration error");
    assert_eq!(error.category, ErrorCategory::Configuration);
    assert!(error.message.contains("requires server mode"));
    assert_eq!(result.content, "");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[cfg(unix)]
fn worker_settings(script: &str, timeout: Duration) -> EngineSettings {
    EngineSettings {
        worker: Some(WorkerSettings {
            command: "sh".into(),
            args: vec!["-c".into(), script.into(), "snippet-worker".into()],
            timeout,
            ..WorkerSettings::default()
        }),
        ..EngineSettings::default()
    }
}

#[cfg(unix)]
fn worker_config() -> MonitorConfiguration {
    MonitorConfiguration {
        use_javascript: true,
        ..MonitorConfiguration::delegated("https://example.com", "h1", "http://localhost:9")
    }
}

#[cfg(unix)]
#[tokio::test]
async fn worker_output_with_noise_is_parsed() {
    let script = r#"echo garbage; echo '{"content":"ok","error":null,"date":"2024-01-01T00:00:00Z"}'; echo more garbage"#;
    let dispatcher = Dispatcher::new(
        worker_settings(script, Duration::from_secs(10)),
        Arc::new(NullSink),
    );
    let result = dispatcher.fetch(&worker_config()).await;

    assert_eq!(result.error, None);
    assert_eq!(result.content, "ok");
    assert_eq!(result.last_updated.to_rfc3339(), "2024-01-01T00:00:00+00:00");
}

#[cfg(unix)]
#[tokio::test]
async fn worker_receives_request_and_server_address() {
    // $1 is the serialized request appended after the configured arguments.
    let script = r#"case "$1" in *'"render_js":true'*) js=yes;; *) js=no;; esac; printf '{"content":"%s %s","error":null,"date":"2024-01-01T00:00:00Z"}' "$SNIPPET_SERVER_URL" "$js""#;
    let dispatcher = Dispatcher::new(
        worker_settings(script, Duration::from_secs(10)),
        Arc::new(NullSink),
    );
    let result = dispatcher.fetch(&worker_config()).await;
    assert_eq!(result.content, "http://localhost:9 yes");
}

#[cfg(unix)]
#[tokio::test]
async fn worker_reported_error_is_classified() {
    let script = r#"echo '{"content":"","error":"Timed out waiting for #price","date":null}'"#;
    let dispatcher = Dispatcher::new(
        worker_settings(script, Duration::from_secs(10)),
        Arc::new(NullSink),
    );
    let error = dispatcher
        .fetch(&worker_config())
        .await
        .error
        .expect("error");
    assert_eq!(error.category, ErrorCategory::Timeout);
    assert_eq!(error.message, "Timed out waiting for #price");
}

#[cfg(unix)]
#[tokio::test]
async fn hung_worker_times_out() {
    let dispatcher = Dispatcher::new(
        worker_settings("exec sleep 5", Duration::from_millis(200)),
        Arc::new(NullSink),
    );
    let error = dispatcher
        .fetch(&worker_config())
        .await
        .error
        .expect("error");
    assert_eq!(error.category, ErrorCategory::Timeout);
}

#[test]
fn engine_handle_fetches_synchronously() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let server = runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<p class=\"v\">7 items</p>", "text/html; charset=utf-8"),
            )
            .mount(&server)
            .await;
        server
    });

    let engine = EngineHandle::new(EngineSettings::default(), Arc::new(NullSink)).unwrap();
    let result = engine.fetch(&MonitorConfiguration::direct(server.uri(), "p.v"));
    assert_eq!(result.content, "7 items");

    let invalid = engine.fetch(&MonitorConfiguration::direct("", "p"));
    assert_eq!(
        invalid.error.map(|error| error.message),
        Some("Please enter a URL".to_string())
    );
}
