//! Stateless HTTP request builder and response parser for the Twitter API.
//!
//! # Design
//! `GigClient` holds the base URL and the signing account and carries no
//! mutable state between calls. Each endpoint is split into a `build_*`
//! method that produces an `HttpRequest` and a `parse_*` method that consumes
//! an `HttpResponse`. The async `Gig` facade pairs them around a `Transport`;
//! a host can just as well execute the requests itself.

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::ApiError;
use crate::http::{HttpBody, HttpMethod, HttpRequest, HttpResponse, MultipartPart};
use crate::params::Parameters;
use crate::types::{Account, Timeline, Tweet, UserIdCollection};

/// Public base URL of the v1.1 REST API.
pub const DEFAULT_BASE_URL: &str = "https://api.twitter.com/1.1";

/// Multipart field name the media upload endpoint expects.
pub const MEDIA_FIELD: &str = "media[]";

/// Synchronous, stateless client for the Twitter API.
#[derive(Debug, Clone)]
pub struct GigClient {
    base_url: String,
    account: Account,
}

impl GigClient {
    pub fn new(base_url: &str, account: Account) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            account,
        }
    }

    /// Client for the public API endpoint.
    pub fn twitter(account: Account) -> Self {
        Self::new(DEFAULT_BASE_URL, account)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    // -----------------------------------------------------------------------
    // Timelines
    // -----------------------------------------------------------------------

    pub fn build_fetch_timeline(
        &self,
        timeline: Timeline,
        params: &Parameters,
    ) -> Result<HttpRequest, ApiError> {
        self.query_request(HttpMethod::Get, timeline.path(), params, Vec::new())
    }

    // -----------------------------------------------------------------------
    // Tweets
    // -----------------------------------------------------------------------

    pub fn build_fetch_retweets_for_status(
        &self,
        status_id: u64,
        params: &Parameters,
    ) -> Result<HttpRequest, ApiError> {
        self.query_request(
            HttpMethod::Get,
            &format!("/statuses/retweets/{status_id}.json"),
            params,
            Vec::new(),
        )
    }

    pub fn build_fetch_status(
        &self,
        status_id: u64,
        params: &Parameters,
    ) -> Result<HttpRequest, ApiError> {
        self.query_request(HttpMethod::Get, &status_path(status_id), params, Vec::new())
    }

    /// Same path as `build_fetch_status`; only the verb differs.
    pub fn build_remove_status(
        &self,
        status_id: u64,
        params: &Parameters,
    ) -> Result<HttpRequest, ApiError> {
        self.query_request(HttpMethod::Delete, &status_path(status_id), params, Vec::new())
    }

    /// Status text is sent as-is; the service enforces its length limit.
    pub fn build_update_status(
        &self,
        text: &str,
        params: &Parameters,
    ) -> Result<HttpRequest, ApiError> {
        self.form_request(
            "/statuses/update.json",
            params,
            vec![("status".to_string(), text.to_string())],
        )
    }

    pub fn build_retweet_status(
        &self,
        status_id: u64,
        params: &Parameters,
    ) -> Result<HttpRequest, ApiError> {
        self.form_request(&format!("/statuses/retweet/{status_id}.json"), params, Vec::new())
    }

    pub fn build_update_status_with_media(
        &self,
        text: &str,
        media: &[u8],
        params: &Parameters,
    ) -> Result<HttpRequest, ApiError> {
        let status = vec![("status".to_string(), text.to_string())];
        let mut parts: Vec<MultipartPart> = merge(params, status)?
            .into_iter()
            .map(|(name, value)| MultipartPart::Text { name, value })
            .collect();
        parts.push(MultipartPart::File {
            name: MEDIA_FIELD.to_string(),
            file_name: "media".to_string(),
            content_type: "application/octet-stream".to_string(),
            bytes: media.to_vec(),
        });
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: self.url("/statuses/update_with_media.json"),
            query: Vec::new(),
            headers: self.signed_headers(),
            body: Some(HttpBody::Multipart(parts)),
        })
    }

    pub fn build_fetch_retweeters_for_status(
        &self,
        status_id: u64,
        params: &Parameters,
    ) -> Result<HttpRequest, ApiError> {
        self.query_request(
            HttpMethod::Get,
            "/statuses/retweeters/ids.json",
            params,
            vec![("id".to_string(), status_id.to_string())],
        )
    }

    // -----------------------------------------------------------------------
    // Parsers
    // -----------------------------------------------------------------------

    /// Timelines and retweet lists. Order is preserved from the response.
    pub fn parse_tweets(&self, response: HttpResponse) -> Result<Vec<Tweet>, ApiError> {
        decode(response)
    }

    /// Any endpoint answering with a single status: show, destroy, update,
    /// retweet, update with media.
    pub fn parse_tweet(&self, response: HttpResponse) -> Result<Tweet, ApiError> {
        decode(response)
    }

    pub fn parse_user_ids(&self, response: HttpResponse) -> Result<UserIdCollection, ApiError> {
        decode(response)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn signed_headers(&self) -> Vec<(String, String)> {
        vec![("authorization".to_string(), self.account.authorization())]
    }

    fn query_request(
        &self,
        method: HttpMethod,
        path: &str,
        params: &Parameters,
        required: Vec<(String, String)>,
    ) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method,
            path: self.url(path),
            query: merge(params, required)?,
            headers: self.signed_headers(),
            body: None,
        })
    }

    fn form_request(
        &self,
        path: &str,
        params: &Parameters,
        required: Vec<(String, String)>,
    ) -> Result<HttpRequest, ApiError> {
        let mut headers = self.signed_headers();
        headers.push((
            "content-type".to_string(),
            "application/x-www-form-urlencoded".to_string(),
        ));
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: self.url(path),
            query: Vec::new(),
            headers,
            body: Some(HttpBody::Form(merge(params, required)?)),
        })
    }
}

fn status_path(status_id: u64) -> String {
    format!("/statuses/show/{status_id}.json")
}

/// Parameter pairs followed by the required arguments; a required argument
/// replaces a parameter with the same key.
fn merge(
    params: &Parameters,
    required: Vec<(String, String)>,
) -> Result<Vec<(String, String)>, ApiError> {
    let mut pairs = params.to_pairs()?;
    pairs.retain(|(key, _)| !required.iter().any(|(k, _)| k == key));
    pairs.extend(required);
    Ok(pairs)
}

/// Map non-success responses to `ApiError::Api`, otherwise decode the body.
fn decode<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    if !response.is_success() {
        let err = ApiError::from_response(&response);
        warn!(status = response.status, error = %err, "request rejected");
        return Err(err);
    }
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}
