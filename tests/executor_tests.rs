use std::time::Duration;

use serde_json::json;
use suiteql::{Credentials, ExecutorConfig, PageWindow, QueryError, QueryExecutor};
use url::Url;
use wiremock::matchers::{body_json, header, header_exists, header_regex, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const QUERY_PATH: &str = "/services/rest/query/v1/suiteql";

fn executor_for(server: &MockServer, timeout: Duration) -> QueryExecutor {
    QueryExecutor::new(ExecutorConfig {
        credentials: Credentials {
            account_id: "TSTDRV1".to_string(),
            consumer_key: "ck".to_string(),
            consumer_secret: "cs".to_string(),
            token: "tk".to_string(),
            token_secret: "ts".to_string(),
        },
        endpoint: Url::parse(&format!("{}{}", server.uri(), QUERY_PATH)).unwrap(),
        timeout,
    })
    .unwrap()
}

fn rows(n: usize) -> Vec<serde_json::Value> {
    (0..n)
        .map(|i| json!({ "links": [], "id": (100 + i).to_string(), "entityid": format!("C{i}") }))
        .collect()
}

#[tokio::test]
async fn execute_should_send_signed_paged_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(QUERY_PATH))
        .and(query_param("limit", "5"))
        .and(query_param("offset", "10"))
        .and(header("prefer", "transient"))
        .and(header("content-type", "application/json"))
        .and(header_exists("authorization"))
        .and(header_regex(
            "authorization",
            r#"^OAuth realm="TSTDRV1", oauth_consumer_key="ck", oauth_token="tk", oauth_signature_method="HMAC-SHA256""#,
        ))
        .and(body_json(json!({ "q": "SELECT id FROM customer" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "links": [],
            "count": 5,
            "hasMore": true,
            "items": rows(5),
            "offset": 10,
            "totalResults": 42
        })))
        .expect(1)
        .mount(&server)
        .await;

    let executor = executor_for(&server, Duration::from_secs(5));
    let window = PageWindow::with_explicit(Some(5), Some(10)).unwrap();
    let result = executor
        .execute("SELECT id FROM customer", &window)
        .await
        .unwrap();

    assert_eq!(result.rows.len(), 5);
    assert!(result.rows.iter().all(|row| !row.contains_key("links")));
    assert_eq!(result.window.offset(), 10);
    assert_eq!(result.window.limit(), Some(5));
    assert_eq!(result.window.has_more(), Some(true));
    assert_eq!(result.window.total_results(), Some(42));
    // The input window is left alone
    assert_eq!(window.has_more(), None);
}

#[tokio::test]
async fn execute_should_map_401_to_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "type": "https://www.rfc-editor.org/rfc/rfc9110.html#section-15.5.2",
            "title": "Unauthorized",
            "status": 401,
            "o:errorDetails": [
                { "detail": "Invalid login attempt.", "o:errorCode": "INVALID_LOGIN" }
            ]
        })))
        .mount(&server)
        .await;

    let executor = executor_for(&server, Duration::from_secs(5));
    let window = PageWindow::with_explicit(Some(50), Some(100)).unwrap();
    let err = executor.execute("SELECT 1", &window).await.unwrap_err();

    match err {
        QueryError::Auth(detail) => {
            assert_eq!(detail.status, 401);
            assert_eq!(detail.code.as_deref(), Some("INVALID_LOGIN"));
            assert!(detail.message.contains("Invalid login attempt."));
        }
        other => panic!("expected Auth, got {other:?}"),
    }
    assert_eq!(window.offset(), 100);
    assert_eq!(window.limit(), Some(50));
}

#[tokio::test]
async fn execute_should_map_429_to_rate_limited_with_delay() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "3"))
        .mount(&server)
        .await;

    let executor = executor_for(&server, Duration::from_secs(5));
    let err = executor
        .execute("SELECT 1", &PageWindow::default())
        .await
        .unwrap_err();

    assert!(matches!(err, QueryError::RateLimited { .. }));
    assert!(err.is_retryable());
    assert_eq!(err.retry_after(), Some(Duration::from_secs(3)));
}

#[tokio::test]
async fn execute_should_map_400_to_query_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "title": "Bad Request",
            "status": 400,
            "o:errorDetails": [{
                "detail": "Invalid search query. Detailed unprocessed description follows. Search error occurred: Field 'nope' for record 'customer' was not found.",
                "o:errorCode": "INVALID_PARAMETER"
            }]
        })))
        .mount(&server)
        .await;

    let executor = executor_for(&server, Duration::from_secs(5));
    let err = executor
        .execute("SELECT nope FROM customer", &PageWindow::default())
        .await
        .unwrap_err();

    match err {
        QueryError::Query(detail) => {
            assert_eq!(detail.status, 400);
            assert_eq!(detail.code.as_deref(), Some("INVALID_PARAMETER"));
            assert!(detail.message.contains("Field 'nope'"));
        }
        other => panic!("expected Query, got {other:?}"),
    }
}

#[tokio::test]
async fn execute_should_map_5xx_to_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&server)
        .await;

    let executor = executor_for(&server, Duration::from_secs(5));
    let err = executor
        .execute("SELECT 1", &PageWindow::default())
        .await
        .unwrap_err();

    assert!(matches!(err, QueryError::Server(ref detail) if detail.status == 503));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn execute_should_report_timeout_as_transport() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "items": [], "hasMore": false }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let executor = executor_for(&server, Duration::from_millis(200));
    let err = executor
        .execute("SELECT 1", &PageWindow::default())
        .await
        .unwrap_err();

    assert!(matches!(err, QueryError::Transport { timed_out: true, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn execute_should_not_send_limit_when_query_has_fetch_first() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(QUERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 3,
            "hasMore": false,
            "items": rows(3),
            "offset": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let executor = executor_for(&server, Duration::from_secs(5));
    let window = PageWindow::with_explicit(Some(25), None).unwrap();
    let result = executor
        .execute("SELECT id FROM customer FETCH FIRST 3 ROWS ONLY", &window)
        .await
        .unwrap();
    assert_eq!(result.rows.len(), 3);
    assert_eq!(result.window.has_more(), Some(false));

    let requests = server.received_requests().await.unwrap();
    let pairs: Vec<(String, String)> = requests[0]
        .url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert_eq!(pairs, vec![("offset".to_string(), "0".to_string())]);
}
