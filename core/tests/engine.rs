//! Async `Gig` facade tests.
//!
//! Stub transports pin down delivery semantics (one request per call, one
//! outcome per operation, cancellation); the live tests run `ReqwestTransport`
//! against the mock server, including the multipart upload.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gig_core::{
    Account, ApiError, Gig, GigClient, HttpBody, HttpMethod, HttpRequest, HttpResponse, Operation,
    Parameters, RateLimit, ReqwestTransport, Timeline, Transport, Tweet,
};
use mock_server::{AppState, FRIEND_STATUS_ID, ME_ID, MY_STATUS_ID};

// ---------------------------------------------------------------------------
// Stub transports
// ---------------------------------------------------------------------------

/// Answers every request with the same response and counts calls.
struct Fixed {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
    calls: Arc<AtomicUsize>,
}

impl Fixed {
    fn new(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl Transport for Fixed {
    async fn execute(&self, _request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(HttpResponse {
            status: self.status,
            headers: self.headers.clone(),
            body: self.body.clone(),
        })
    }
}

/// Never answers within a test's lifetime.
struct Stalled;

#[async_trait]
impl Transport for Stalled {
    async fn execute(&self, _request: HttpRequest) -> Result<HttpResponse, ApiError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(ApiError::Transport("timed out".to_string()))
    }
}

/// Fails before any response exists.
struct Refused;

#[async_trait]
impl Transport for Refused {
    async fn execute(&self, _request: HttpRequest) -> Result<HttpResponse, ApiError> {
        Err(ApiError::Transport("connection refused".to_string()))
    }
}

fn stub_client() -> GigClient {
    GigClient::new("http://api.test/1.1", Account::new("stub"))
}

type Outcome = Pin<Box<dyn Future<Output = Result<(), ApiError>> + Send>>;

/// One in-flight operation per endpoint, success values erased.
fn every_operation<T: Transport>(gig: &Gig<T>) -> Vec<Outcome> {
    let p = Parameters::new();
    let mut ops: Vec<Outcome> = Vec::new();
    for timeline in Timeline::ALL {
        ops.push(erase(gig.fetch_timeline(timeline, &p)));
    }
    ops.push(erase(gig.fetch_retweets_for_status(1, &p)));
    ops.push(erase(gig.fetch_status(1, &p)));
    ops.push(erase(gig.remove_status(1, &p)));
    ops.push(erase(gig.update_status("text", &p)));
    ops.push(erase(gig.retweet_status(1, &p)));
    ops.push(erase(gig.update_status_with_media("text", b"img", &p)));
    ops.push(erase(gig.fetch_retweeters_for_status(1, &p)));
    ops
}

fn erase<R: Send + 'static>(op: Operation<R>) -> Outcome {
    Box::pin(async move { op.await.map(|_| ()) })
}

#[tokio::test]
async fn rate_limit_surfaces_from_every_operation() {
    let mut transport = Fixed::new(
        429,
        r#"{"errors":[{"code":88,"message":"Rate limit exceeded"}]}"#,
    );
    transport.headers = vec![
        ("x-rate-limit-limit".to_string(), "180".to_string()),
        ("x-rate-limit-remaining".to_string(), "0".to_string()),
        ("x-rate-limit-reset".to_string(), "1792400000".to_string()),
    ];
    let calls = Arc::clone(&transport.calls);
    let gig = Gig::new(stub_client(), transport);

    let ops = every_operation(&gig);
    let count = ops.len();
    for op in ops {
        let err = op.await.unwrap_err();
        assert!(err.is_rate_limited(), "expected rate limit, got {err:?}");
        assert_eq!(err.status(), Some(429));
        assert_eq!(
            err.rate_limit(),
            Some(RateLimit { limit: 180, remaining: 0, reset: 1_792_400_000 })
        );
    }
    assert_eq!(count, 11);
    assert_eq!(calls.load(Ordering::SeqCst), count);
}

#[tokio::test]
async fn each_call_issues_exactly_one_request() {
    let transport = Fixed::new(200, r#"{"id":1,"text":"x"}"#);
    let calls = Arc::clone(&transport.calls);
    let gig = Gig::new(stub_client(), transport);

    let ops: Vec<_> = (0..8).map(|i| gig.fetch_status(i, &Parameters::new())).collect();
    for op in ops {
        assert_eq!(op.await.unwrap().id, 1);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 8);
}

#[tokio::test]
async fn operation_runs_without_being_awaited() {
    let transport = Fixed::new(200, "[]");
    let calls = Arc::clone(&transport.calls);
    let gig = Gig::new(stub_client(), transport);

    let op = gig.fetch_timeline(Timeline::Home, &Parameters::new());
    for _ in 0..100 {
        if op.is_finished() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(op.is_finished());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(op.await.unwrap().is_empty());
}

#[tokio::test]
async fn cancelled_operation_reports_cancelled() {
    let gig = Gig::new(stub_client(), Stalled);

    let op = gig.fetch_status(1, &Parameters::new());
    op.cancel();
    let err = op.await.unwrap_err();
    assert!(matches!(err, ApiError::Cancelled));
}

#[tokio::test]
async fn transport_failure_is_passed_through() {
    let gig = Gig::new(stub_client(), Refused);

    let err = gig.update_status("hello", &Parameters::new()).await.unwrap_err();
    match err {
        ApiError::Transport(msg) => assert_eq!(msg, "connection refused"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_a_deserialization_error() {
    let gig = Gig::new(stub_client(), Fixed::new(200, "<html>"));

    let err = gig.fetch_retweeters_for_status(1, &Parameters::new()).await.unwrap_err();
    assert!(matches!(err, ApiError::Deserialization(_)));
}

#[tokio::test]
async fn fetch_status_round_trips_tweet_json() {
    let body = r#"{
        "id": 210462857140252672,
        "id_str": "210462857140252672",
        "text": "Along with our new #Twitterbird, we've also updated our Display Guidelines",
        "created_at": "Wed Jun 06 20:07:10 +0000 2012",
        "source": "web",
        "truncated": false,
        "retweet_count": 66,
        "favorite_count": 0,
        "favorited": false,
        "retweeted": false,
        "lang": "en",
        "in_reply_to_status_id": null,
        "in_reply_to_status_id_str": null,
        "in_reply_to_user_id": 783214,
        "in_reply_to_screen_name": "twitter",
        "coordinates": null,
        "geo": null,
        "place": null,
        "contributors": null,
        "entities": {"hashtags": [{"text": "Twitterbird", "indices": [19, 31]}], "urls": []},
        "user": {
            "id": 6253282,
            "id_str": "6253282",
            "name": "Twitter API",
            "screen_name": "twitterapi",
            "url": null,
            "verified": true
        },
        "possibly_sensitive": false
    }"#;
    let gig = Gig::new(stub_client(), Fixed::new(200, body));

    let tweet = gig.fetch_status(210462857140252672, &Parameters::new()).await.unwrap();
    assert_eq!(tweet.id, 210462857140252672);
    assert_eq!(tweet.id_str.as_deref(), Some("210462857140252672"));
    assert_eq!(tweet.retweet_count, Some(66));
    assert_eq!(tweet.in_reply_to_screen_name.as_deref(), Some("twitter"));
    assert_eq!(tweet.in_reply_to_status_id, None);
    assert_eq!(tweet.user.as_ref().unwrap().extra["verified"], true);
    assert_eq!(tweet.extra["possibly_sensitive"], false);

    let input: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(serde_json::to_value(&tweet).unwrap(), input);
}

// ---------------------------------------------------------------------------
// Live mock server over reqwest
// ---------------------------------------------------------------------------

async fn live(state: AppState) -> Gig<ReqwestTransport> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run_with_state(listener, state));

    Gig::new(
        GigClient::new(&format!("http://{addr}/1.1"), Account::new("engine")),
        ReqwestTransport::new(reqwest::Client::new()),
    )
}

#[tokio::test]
async fn every_timeline_over_http() {
    let gig = live(AppState::new()).await;

    for timeline in Timeline::ALL {
        let tweets = gig.fetch_timeline(timeline, &Parameters::new()).await.unwrap();
        assert!(!tweets.is_empty(), "{timeline:?} should have seeded tweets");
        let ids: Vec<u64> = tweets.iter().map(|t| t.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(ids, sorted, "{timeline:?} should be newest first");
    }
}

#[tokio::test]
async fn media_update_uploads_multipart() {
    let gig = live(AppState::new()).await;
    let media = vec![0x89, b'P', b'N', b'G', 0, 1, 2, 3];

    let params = Parameters::new().location(37.78, -122.4);
    let tweet = gig
        .update_status_with_media("with picture", &media, &params)
        .await
        .unwrap();
    assert_eq!(tweet.text, "with picture");
    assert_eq!(tweet.user.as_ref().map(|u| u.id), Some(ME_ID));
    assert_eq!(tweet.extra["extended_entities"]["media"][0]["size"], media.len());
    assert_eq!(
        tweet.extra["extended_entities"]["media"][0]["content_type"],
        "application/octet-stream"
    );

    let fetched = gig.fetch_status(tweet.id, &Parameters::new()).await.unwrap();
    assert_eq!(fetched, tweet);
}

#[tokio::test]
async fn plain_update_is_form_encoded() {
    let gig = live(AppState::new()).await;
    let req = gig.client().build_update_status("form body", &Parameters::new()).unwrap();
    assert!(matches!(req.body, Some(HttpBody::Form(_))));

    let tweet = gig.update_status("form body", &Parameters::new()).await.unwrap();
    assert_eq!(tweet.text, "form body");
}

#[tokio::test]
async fn concurrent_updates_are_independent() {
    let gig = live(AppState::new()).await;

    let ops: Vec<Operation<Tweet>> = (0..5)
        .map(|i| gig.update_status(&format!("concurrent {i}"), &Parameters::new()))
        .collect();
    let mut ids = Vec::new();
    for op in ops {
        ids.push(op.await.unwrap().id);
    }
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 5);
}

#[tokio::test]
async fn retweet_and_retweeters_over_http() {
    let gig = live(AppState::new()).await;

    let retweet = gig.retweet_status(FRIEND_STATUS_ID, &Parameters::new()).await.unwrap();
    assert!(retweet.is_retweet());

    let retweeters = gig
        .fetch_retweeters_for_status(FRIEND_STATUS_ID, &Parameters::new())
        .await
        .unwrap();
    assert_eq!(retweeters.ids, vec![ME_ID]);
}

#[tokio::test]
async fn remove_status_echoes_deleted_status() {
    let gig = live(AppState::new()).await;

    let removed = gig.remove_status(MY_STATUS_ID, &Parameters::new()).await.unwrap();
    assert_eq!(removed.id, MY_STATUS_ID);

    let req = gig.client().build_remove_status(MY_STATUS_ID, &Parameters::new()).unwrap();
    assert_eq!(req.method, HttpMethod::Delete);
    let err = gig.fetch_status(MY_STATUS_ID, &Parameters::new()).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn rate_limited_server_over_http() {
    let state = AppState::new();
    state.set_rate_limited(true);
    let gig = live(state).await;

    for op in every_operation(&gig) {
        let err = op.await.unwrap_err();
        assert!(err.is_rate_limited(), "expected rate limit, got {err:?}");
        assert_eq!(err.rate_limit().map(|w| w.limit), Some(15));
    }
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let gig = Gig::new(
        GigClient::new(&format!("http://{addr}/1.1"), Account::new("engine")),
        ReqwestTransport::new(reqwest::Client::new()),
    );
    let err = gig.fetch_status(1, &Parameters::new()).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}
