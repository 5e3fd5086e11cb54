//! Recent-changes client against a loopback axum server.

use axum::{Router, extract::Query, http::StatusCode, response::IntoResponse, routing::get};
use std::collections::HashMap;
use std::time::Duration;
use storyloom_feed::{FeedConfig, RecentChangesClient, RecentChangesResponse};
use storyloom_interface::ChangeFeed;
use tokio::net::TcpListener;

const FIXTURE: &str = r#"{
  "batchcomplete": true,
  "continue": { "rccontinue": "20240101000000|1234", "continue": "-||" },
  "query": {
    "recentchanges": [
      {
        "type": "edit",
        "ns": 0,
        "title": "Ancient temples",
        "pageid": 7,
        "revid": 900,
        "old_revid": 899,
        "rcid": 43,
        "user": "Ann",
        "timestamp": "2024-01-01T00:00:05Z",
        "comment": ""
      },
      {
        "type": "edit",
        "ns": 0,
        "title": "Test",
        "pageid": 8,
        "revid": 901,
        "old_revid": 898,
        "rcid": 42,
        "user": "Bob",
        "timestamp": "2024-01-01T00:00:00Z",
        "comment": "Added [[Category:Test]] information about ancient temples 123"
      },
      {
        "type": "log",
        "ns": 2,
        "title": "User:Hidden",
        "rcid": 41,
        "userhidden": true,
        "commenthidden": true,
        "timestamp": "2023-12-31T23:59:00Z"
      }
    ]
  }
}"#;

async fn recent_changes(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    let expected = [
        ("action", "query"),
        ("list", "recentchanges"),
        ("format", "json"),
        ("rclimit", "3"),
    ];
    for (key, value) in expected {
        if params.get(key).map(String::as_str) != Some(value) {
            return (StatusCode::BAD_REQUEST, format!("bad {key}"));
        }
    }
    (StatusCode::OK, FIXTURE.to_string())
}

async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/w/api.php", addr)
}

#[test]
fn test_fixture_parses() {
    let response: RecentChangesResponse = serde_json::from_str(FIXTURE).unwrap();
    let changes = response.query.unwrap().recentchanges;

    assert_eq!(changes.len(), 3);
    assert_eq!(changes[1].comment.as_deref(), Some(
        "Added [[Category:Test]] information about ancient temples 123"
    ));
    assert_eq!(changes[2].user, None);
}

#[tokio::test]
async fn test_recent_changes_maps_edits_newest_first() {
    let endpoint = spawn(Router::new().route("/w/api.php", get(recent_changes))).await;
    let client = RecentChangesClient::new(FeedConfig::new(endpoint).with_limit(3)).unwrap();

    let edits = client.recent_changes().await.unwrap();

    assert_eq!(edits.len(), 3);
    assert_eq!(edits[0].id(), "43");
    assert_eq!(edits[0].raw_text(), "Ancient temples");
    assert_eq!(edits[1].id(), "42");
    assert_eq!(edits[1].author(), "Bob");
    assert_eq!(
        edits[1].timestamp().to_rfc3339(),
        "2024-01-01T00:00:00+00:00"
    );
    assert_eq!(edits[2].author(), "");
}

#[tokio::test]
async fn test_status_error_is_feed_unavailable() {
    let endpoint = spawn(Router::new().route(
        "/w/api.php",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
    ))
    .await;
    let client = RecentChangesClient::new(FeedConfig::new(endpoint)).unwrap();

    let err = client.recent_changes().await.unwrap_err();
    assert!(err.is_feed_unavailable());
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn test_malformed_body_is_feed_unavailable() {
    let endpoint = spawn(Router::new().route(
        "/w/api.php",
        get(|| async { "<html>not json</html>" }),
    ))
    .await;
    let client = RecentChangesClient::new(FeedConfig::new(endpoint)).unwrap();

    let err = client.recent_changes().await.unwrap_err();
    assert!(err.is_feed_unavailable());
    assert!(err.to_string().contains("Malformed"));
}

#[tokio::test]
async fn test_timeout_is_feed_unavailable() {
    let endpoint = spawn(Router::new().route(
        "/w/api.php",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            FIXTURE
        }),
    ))
    .await;
    let client =
        RecentChangesClient::new(FeedConfig::new(endpoint).with_timeout_secs(1)).unwrap();

    let err = client.recent_changes().await.unwrap_err();
    assert!(err.is_feed_unavailable());
}

#[tokio::test]
async fn test_unreachable_feed_is_feed_unavailable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client =
        RecentChangesClient::new(FeedConfig::new(format!("http://{}/w/api.php", addr))).unwrap();

    let err = client.recent_changes().await.unwrap_err();
    assert!(err.is_feed_unavailable());
}
