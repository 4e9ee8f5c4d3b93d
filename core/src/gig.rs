//! Async facade over `GigClient` and a `Transport`.
//!
//! Every endpoint method builds its request synchronously, then spawns one
//! task that executes it and parses the response. The returned `Operation`
//! is already in flight; concurrent calls share nothing but the read-only
//! client and transport.

use std::sync::Arc;

use tracing::debug;

use crate::client::GigClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::operation::Operation;
use crate::params::Parameters;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{Account, Timeline, Tweet, UserIdCollection};

/// Endpoint methods returning in-flight `Operation`s.
///
/// # Panics
///
/// Every endpoint method spawns onto the current tokio runtime and panics
/// when called outside one.
pub struct Gig<T: Transport> {
    client: GigClient,
    transport: Arc<T>,
}

impl<T: Transport> Clone for Gig<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl Gig<ReqwestTransport> {
    /// Fails with `ApiError::Config` when the config carries no bearer token.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        config.validate()?;
        let client = GigClient::new(&config.base_url, Account::new(config.bearer_token.clone()));
        Ok(Self::new(client, ReqwestTransport::from_config(config)?))
    }
}

impl<T: Transport> Gig<T> {
    pub fn new(client: GigClient, transport: T) -> Self {
        Self {
            client,
            transport: Arc::new(transport),
        }
    }

    pub fn client(&self) -> &GigClient {
        &self.client
    }

    /// Tweets of `timeline`, most recent first.
    pub fn fetch_timeline(&self, timeline: Timeline, params: &Parameters) -> Operation<Vec<Tweet>> {
        self.dispatch(
            self.client.build_fetch_timeline(timeline, params),
            GigClient::parse_tweets,
        )
    }

    /// Up to 100 of the most recent retweets of a status.
    pub fn fetch_retweets_for_status(
        &self,
        status_id: u64,
        params: &Parameters,
    ) -> Operation<Vec<Tweet>> {
        self.dispatch(
            self.client.build_fetch_retweets_for_status(status_id, params),
            GigClient::parse_tweets,
        )
    }

    pub fn fetch_status(&self, status_id: u64, params: &Parameters) -> Operation<Tweet> {
        self.dispatch(self.client.build_fetch_status(status_id, params), GigClient::parse_tweet)
    }

    /// Delete a status owned by the signing account. Resolves to the deleted status.
    pub fn remove_status(&self, status_id: u64, params: &Parameters) -> Operation<Tweet> {
        self.dispatch(self.client.build_remove_status(status_id, params), GigClient::parse_tweet)
    }

    pub fn update_status(&self, text: &str, params: &Parameters) -> Operation<Tweet> {
        self.dispatch(self.client.build_update_status(text, params), GigClient::parse_tweet)
    }

    /// Resolves to the original status with the retweet details embedded.
    pub fn retweet_status(&self, status_id: u64, params: &Parameters) -> Operation<Tweet> {
        self.dispatch(self.client.build_retweet_status(status_id, params), GigClient::parse_tweet)
    }

    pub fn update_status_with_media(
        &self,
        text: &str,
        media: &[u8],
        params: &Parameters,
    ) -> Operation<Tweet> {
        self.dispatch(
            self.client.build_update_status_with_media(text, media, params),
            GigClient::parse_tweet,
        )
    }

    /// Up to 100 IDs of users who retweeted a status.
    pub fn fetch_retweeters_for_status(
        &self,
        status_id: u64,
        params: &Parameters,
    ) -> Operation<UserIdCollection> {
        self.dispatch(
            self.client.build_fetch_retweeters_for_status(status_id, params),
            GigClient::parse_user_ids,
        )
    }

    fn dispatch<R>(
        &self,
        request: Result<HttpRequest, ApiError>,
        parse: fn(&GigClient, HttpResponse) -> Result<R, ApiError>,
    ) -> Operation<R>
    where
        R: Send + 'static,
    {
        let client = self.client.clone();
        let transport = Arc::clone(&self.transport);
        Operation::spawn(async move {
            let request = request?;
            debug!(method = %request.method, path = %request.path, "dispatching request");
            let response = transport.execute(request).await?;
            parse(&client, response)
        })
    }
}
