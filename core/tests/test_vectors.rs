//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected parse results. Comparing parsed JSON (not raw strings) avoids
//! false negatives from field-ordering differences.

use gig_core::{
    Account, ApiError, GigClient, HttpMethod, HttpRequest, HttpResponse, Parameters, Timeline,
    Tweet, UserIdCollection,
};
use serde_json::Value;

const BASE_URL: &str = "http://localhost:3000/1.1";

fn client() -> GigClient {
    GigClient::new(BASE_URL, Account::new("vector-token"))
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn parse_timeline(s: &str) -> Timeline {
    match s {
        "mentions" => Timeline::Mentions,
        "user" => Timeline::User,
        "home" => Timeline::Home,
        "retweets_of_me" => Timeline::RetweetsOfMe,
        other => panic!("unknown timeline: {other}"),
    }
}

fn pairs(value: &Value) -> Vec<(String, String)> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|pair| {
            let arr = pair.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect()
}

fn params(case: &Value) -> Parameters {
    serde_json::from_value(case["params"].clone()).unwrap()
}

fn simulated(case: &Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse {
        status: sim["status"].as_u64().unwrap() as u16,
        headers: Vec::new(),
        body: sim["body"].as_str().unwrap().to_string(),
    }
}

fn check_request(name: &str, req: &HttpRequest, expected: &Value) {
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    let path = expected["path"].as_str().unwrap();
    assert_eq!(req.path, format!("{BASE_URL}{path}"), "{name}: path");
    assert_eq!(req.header("authorization"), Some("Bearer vector-token"), "{name}: signed");
    if let Some(query) = expected.get("query") {
        assert_eq!(req.query, pairs(query), "{name}: query");
    }
    match expected.get("form") {
        None | Some(Value::Null) => assert!(req.form().is_none(), "{name}: body should be None"),
        Some(form) => assert_eq!(req.form().unwrap(), &pairs(form)[..], "{name}: form"),
    }
}

fn check_error(name: &str, err: ApiError, expected: &str) {
    match expected {
        "RateLimited" => assert!(err.is_rate_limited(), "{name}: expected rate limit, got {err:?}"),
        "NotFound" => assert!(err.is_not_found(), "{name}: expected NotFound, got {err:?}"),
        "Forbidden" => assert_eq!(err.status(), Some(403), "{name}: expected 403"),
        other => panic!("{name}: unknown expected_error: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Timelines
// ---------------------------------------------------------------------------

#[test]
fn timeline_test_vectors() {
    let raw = include_str!("../../test-vectors/timelines.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let timeline = parse_timeline(case["timeline"].as_str().unwrap());

        // Verify build
        let req = c.build_fetch_timeline(timeline, &params(case)).unwrap();
        check_request(name, &req, &case["expected_request"]);

        // Verify parse
        let result = c.parse_tweets(simulated(case));
        if let Some(expected_error) = case.get("expected_error") {
            check_error(name, result.unwrap_err(), expected_error.as_str().unwrap());
        } else {
            let expected: Vec<Tweet> =
                serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(result.unwrap(), expected, "{name}: parsed result");
        }
    }
}

// ---------------------------------------------------------------------------
// Single statuses
// ---------------------------------------------------------------------------

#[test]
fn status_test_vectors() {
    let raw = include_str!("../../test-vectors/statuses.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let id = case["input_id"].as_u64().unwrap();
        let params = params(case);
        let operation = case["operation"].as_str().unwrap();

        // Verify build
        let req = match operation {
            "fetch_status" => c.build_fetch_status(id, &params),
            "remove_status" => c.build_remove_status(id, &params),
            "retweet_status" => c.build_retweet_status(id, &params),
            "fetch_retweets_for_status" => c.build_fetch_retweets_for_status(id, &params),
            other => panic!("{name}: unknown operation: {other}"),
        }
        .unwrap();
        check_request(name, &req, &case["expected_request"]);

        // Verify parse
        let response = simulated(case);
        if operation == "fetch_retweets_for_status" {
            let tweets = c.parse_tweets(response).unwrap();
            let expected: Vec<Tweet> =
                serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(tweets, expected, "{name}: parsed result");
            continue;
        }
        let result = c.parse_tweet(response);
        if let Some(expected_error) = case.get("expected_error") {
            check_error(name, result.unwrap_err(), expected_error.as_str().unwrap());
        } else {
            let tweet = result.unwrap();
            let expected: Tweet = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(tweet, expected, "{name}: parsed result");
            assert_eq!(
                serde_json::to_value(&tweet).unwrap(),
                case["expected_result"],
                "{name}: round trip"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[test]
fn update_test_vectors() {
    let raw = include_str!("../../test-vectors/update.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let text = case["input_text"].as_str().unwrap();

        // Verify build
        let req = c.build_update_status(text, &params(case)).unwrap();
        check_request(name, &req, &case["expected_request"]);
        assert!(req.query.is_empty(), "{name}: query should be empty");

        // Verify parse
        let result = c.parse_tweet(simulated(case));
        if let Some(expected_error) = case.get("expected_error") {
            check_error(name, result.unwrap_err(), expected_error.as_str().unwrap());
        } else {
            let expected: Tweet = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(result.unwrap(), expected, "{name}: parsed result");
        }
    }
}

// ---------------------------------------------------------------------------
// Retweeters
// ---------------------------------------------------------------------------

#[test]
fn retweeters_test_vectors() {
    let raw = include_str!("../../test-vectors/retweeters.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let id = case["input_id"].as_u64().unwrap();

        // Verify build
        let req = c.build_fetch_retweeters_for_status(id, &params(case)).unwrap();
        check_request(name, &req, &case["expected_request"]);

        // Verify parse
        let ids = c.parse_user_ids(simulated(case)).unwrap();
        let expected: UserIdCollection =
            serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(ids, expected, "{name}: parsed result");
    }
}
