//! Request options shared by every endpoint.
//!
//! # Design
//! `Parameters` names each option the API documents for these endpoints and
//! leaves it `None` unless set, so the service default applies. Anything not
//! covered by a typed field goes through `extra` unchanged; an `extra` entry
//! with the same key as a typed field replaces it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// Wire names of the recognized option keys.
pub mod keys {
    pub const COUNT: &str = "count";
    pub const SINCE_ID: &str = "since_id";
    pub const MAX_ID: &str = "max_id";
    pub const TRIM_USER: &str = "trim_user";
    pub const INCLUDE_ENTITIES: &str = "include_entities";
    pub const INCLUDE_USER_ENTITIES: &str = "include_user_entities";
    pub const USER_ID: &str = "user_id";
    pub const SCREEN_NAME: &str = "screen_name";
    pub const EXCLUDE_REPLIES: &str = "exclude_replies";
    pub const INCLUDE_RETWEETS: &str = "include_rts";
    pub const IN_REPLY_TO_STATUS_ID: &str = "in_reply_to_status_id";
    pub const LATITUDE: &str = "lat";
    pub const LONGITUDE: &str = "long";
    pub const PLACE_ID: &str = "place_id";
    pub const DISPLAY_COORDINATES: &str = "display_coordinates";
}

/// Per-call request options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim_user: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_entities: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_user_entities: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_replies: Option<bool>,
    #[serde(rename = "include_rts", skip_serializing_if = "Option::is_none")]
    pub include_retweets: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_reply_to_status_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_coordinates: Option<bool>,
    /// Keys the typed fields do not cover, sent verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    pub fn since_id(mut self, id: u64) -> Self {
        self.since_id = Some(id);
        self
    }

    pub fn max_id(mut self, id: u64) -> Self {
        self.max_id = Some(id);
        self
    }

    pub fn trim_user(mut self, trim: bool) -> Self {
        self.trim_user = Some(trim);
        self
    }

    pub fn include_entities(mut self, include: bool) -> Self {
        self.include_entities = Some(include);
        self
    }

    pub fn include_user_entities(mut self, include: bool) -> Self {
        self.include_user_entities = Some(include);
        self
    }

    pub fn user_id(mut self, id: u64) -> Self {
        self.user_id = Some(id);
        self
    }

    pub fn screen_name(mut self, name: impl Into<String>) -> Self {
        self.screen_name = Some(name.into());
        self
    }

    pub fn exclude_replies(mut self, exclude: bool) -> Self {
        self.exclude_replies = Some(exclude);
        self
    }

    pub fn include_retweets(mut self, include: bool) -> Self {
        self.include_retweets = Some(include);
        self
    }

    pub fn in_reply_to_status_id(mut self, id: u64) -> Self {
        self.in_reply_to_status_id = Some(id);
        self
    }

    pub fn location(mut self, lat: f64, long: f64) -> Self {
        self.lat = Some(lat);
        self.long = Some(long);
        self
    }

    pub fn place_id(mut self, id: impl Into<String>) -> Self {
        self.place_id = Some(id.into());
        self
    }

    pub fn display_coordinates(mut self, display: bool) -> Self {
        self.display_coordinates = Some(display);
        self
    }

    /// Add a key outside the recognized set.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Encode as wire pairs, sorted by key.
    pub fn to_pairs(&self) -> Result<Vec<(String, String)>, ApiError> {
        let value = serde_json::to_value(self).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let Value::Object(map) = value else {
            return Err(ApiError::Serialization("parameters must encode to an object".to_string()));
        };
        let mut pairs: BTreeMap<String, String> = BTreeMap::new();
        for (key, value) in map {
            let encoded = match value {
                Value::String(s) => s,
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                other => {
                    return Err(ApiError::Serialization(format!(
                        "unsupported value for `{key}`: {other}"
                    )))
                }
            };
            pairs.insert(key, encoded);
        }
        Ok(pairs.into_iter().collect())
    }
}
