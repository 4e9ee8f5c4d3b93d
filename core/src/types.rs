//! Domain models for the Twitter API.
//!
//! # Design
//! The typed fields cover what callers commonly read. Every other field on
//! the wire is kept in a flattened `extra` map, and absent optionals are
//! skipped on serialization, so a decoded value re-serializes to the JSON it
//! came from (as long as that JSON contained no explicit nulls).

use std::collections::BTreeSet;
use std::fmt;

use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// String that never reveals its contents in `Debug`/`Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Explicit escape hatch used when signing a request.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<secret>")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<secret>")
    }
}

/// The user account every request is signed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub screen_name: Option<String>,
    token: SecretString,
}

impl Account {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            screen_name: None,
            token: SecretString::new(token),
        }
    }

    pub fn with_screen_name(mut self, screen_name: impl Into<String>) -> Self {
        self.screen_name = Some(screen_name.into());
        self
    }

    /// Value for the `authorization` header.
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.token.expose())
    }
}

/// The timelines a user can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timeline {
    /// Mentions for the authenticating user.
    Mentions,
    /// Tweets posted by a specific user.
    User,
    /// Tweets and retweets by the authenticating user and the users they follow.
    Home,
    /// The authenticating user's tweets that others have retweeted.
    RetweetsOfMe,
}

impl Timeline {
    pub const ALL: [Timeline; 4] = [
        Timeline::Mentions,
        Timeline::User,
        Timeline::Home,
        Timeline::RetweetsOfMe,
    ];

    /// Path relative to the API base URL.
    pub fn path(self) -> &'static str {
        match self {
            Timeline::Mentions => "/statuses/mentions_timeline.json",
            Timeline::User => "/statuses/user_timeline.json",
            Timeline::Home => "/statuses/home_timeline.json",
            Timeline::RetweetsOfMe => "/statuses/retweets_of_me.json",
        }
    }
}

/// Author of a tweet. With `trim_user` only the id fields are populated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_str: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The authenticating user's own retweet of a status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurrentUserRetweet {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_str: Option<String>,
}

/// A single status.
///
/// Typed fields that arrived as explicit `null` are remembered and written
/// back as `null`, so re-serializing yields the keys the service sent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(remote = "Self")]
pub struct Tweet {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_str: Option<String>,
    /// Empty when the status was requested with `tweet_mode=extended`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    /// Untruncated text, present only with `tweet_mode=extended`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to_status_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to_user_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to_screen_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retweet_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorite_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retweeted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorited: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retweeted_status: Option<Box<Tweet>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_user_retweet: Option<CurrentUserRetweet>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(skip)]
    null_fields: BTreeSet<String>,
}

impl Tweet {
    pub fn is_retweet(&self) -> bool {
        self.retweeted_status.is_some()
    }

    /// `full_text` when the service sent it, otherwise `text`.
    pub fn display_text(&self) -> &str {
        self.full_text.as_deref().unwrap_or(&self.text)
    }
}

impl<'de> Deserialize<'de> for Tweet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        let null_fields = map
            .iter()
            .filter(|(_, value)| value.is_null())
            .map(|(key, _)| key.clone())
            .collect();
        let mut tweet = Tweet::deserialize(Value::Object(map)).map_err(de::Error::custom)?;
        tweet.null_fields = null_fields;
        Ok(tweet)
    }
}

impl Serialize for Tweet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.null_fields.is_empty() {
            return Tweet::serialize(self, serializer);
        }
        let mut value =
            Tweet::serialize(self, serde_json::value::Serializer).map_err(ser::Error::custom)?;
        if let Value::Object(map) = &mut value {
            for key in &self.null_fields {
                map.entry(key.clone()).or_insert(Value::Null);
            }
        }
        value.serialize(serializer)
    }
}

/// A page of user IDs, as returned by `statuses/retweeters/ids`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserIdCollection {
    pub ids: Vec<u64>,
    #[serde(default)]
    pub next_cursor: i64,
    #[serde(default)]
    pub previous_cursor: i64,
}

impl UserIdCollection {
    pub fn has_next_page(&self) -> bool {
        self.next_cursor != 0
    }
}
