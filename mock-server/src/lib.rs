use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use axum::{
    extract::{Multipart, Path, Query, Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

/// Account the mock treats as the authenticating user.
pub const ME_ID: u64 = 1;
pub const ME_SCREEN_NAME: &str = "gig";
pub const FRIEND_ID: u64 = 2;
pub const FAN_ID: u64 = 3;

/// Seeded statuses.
pub const FRIEND_STATUS_ID: u64 = 100;
pub const MENTION_STATUS_ID: u64 = 101;
pub const MY_STATUS_ID: u64 = 102;

const CREATED_AT: &str = "Mon Oct 19 09:00:00 +0000 2026";
const RATE_LIMIT_WINDOW: u32 = 15;
const RATE_LIMIT_RESET: u64 = 1_792_400_000;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: u64,
    pub id_str: String,
    pub name: String,
    pub screen_name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Tweet {
    pub id: u64,
    pub id_str: String,
    pub text: String,
    pub created_at: String,
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_reply_to_status_id: Option<u64>,
    pub retweet_count: u64,
    pub favorite_count: u64,
    pub retweeted: bool,
    pub favorited: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retweeted_status: Option<Box<Tweet>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_entities: Option<Value>,
}

#[derive(Debug, Default)]
pub struct Db {
    pub tweets: BTreeMap<u64, Tweet>,
    pub retweeters: BTreeMap<u64, Vec<u64>>,
    next_id: u64,
}

impl Db {
    fn seeded() -> Self {
        let mut db = Db {
            next_id: 1000,
            ..Db::default()
        };
        let friend = user(FRIEND_ID, "friend");
        db.tweets.insert(
            FRIEND_STATUS_ID,
            tweet(FRIEND_STATUS_ID, "hello from a friend", friend.clone()),
        );
        db.tweets.insert(
            MENTION_STATUS_ID,
            tweet(MENTION_STATUS_ID, "@gig are you there?", friend),
        );
        let mut mine = tweet(MY_STATUS_ID, "my first tweet", me());
        mine.retweet_count = 2;
        db.tweets.insert(MY_STATUS_ID, mine);
        db.retweeters.insert(MY_STATUS_ID, vec![FRIEND_ID, FAN_ID]);
        db
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn create(&mut self, text: String, in_reply_to_status_id: Option<u64>) -> Tweet {
        let id = self.allocate_id();
        let mut created = tweet(id, &text, me());
        created.in_reply_to_status_id = in_reply_to_status_id;
        self.tweets.insert(id, created.clone());
        created
    }

    /// Newest first.
    fn newest_first(&self) -> impl Iterator<Item = &Tweet> {
        self.tweets.values().rev()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<RwLock<Db>>,
    rate_limited: Arc<AtomicBool>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            db: Arc::new(RwLock::new(Db::seeded())),
            rate_limited: Arc::new(AtomicBool::new(false)),
        }
    }

    /// While set, every route answers 429 after the auth check.
    pub fn set_rate_limited(&self, limited: bool) {
        self.rate_limited.store(limited, Ordering::SeqCst);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn app() -> Router {
    app_with_state(AppState::new())
}

pub fn app_with_state(state: AppState) -> Router {
    let statuses = Router::new()
        .route("/mentions_timeline.json", get(mentions_timeline))
        .route("/user_timeline.json", get(user_timeline))
        .route("/home_timeline.json", get(home_timeline))
        .route("/retweets_of_me.json", get(retweets_of_me))
        .route("/retweets/{file}", get(retweets_for_status))
        .route("/show/{file}", get(show_status).delete(destroy_status))
        .route("/update.json", post(update_status))
        .route("/update_with_media.json", post(update_with_media))
        .route("/retweet/{file}", post(retweet_status))
        .route("/retweeters/ids.json", get(retweeter_ids));

    Router::new()
        .nest("/1.1/statuses", statuses)
        .layer(middleware::from_fn_with_state(state.clone(), guard))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_state(listener, AppState::new()).await
}

pub async fn run_with_state(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

async fn guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Bearer ") && v.len() > "Bearer ".len());
    if !authorized {
        return twitter_error(StatusCode::UNAUTHORIZED, 215, "Bad Authentication data.");
    }
    if state.rate_limited.load(Ordering::SeqCst) {
        let mut response = twitter_error(StatusCode::TOO_MANY_REQUESTS, 88, "Rate limit exceeded");
        let headers = response.headers_mut();
        headers.insert("x-rate-limit-limit", HeaderValue::from(RATE_LIMIT_WINDOW));
        headers.insert("x-rate-limit-remaining", HeaderValue::from(0u32));
        headers.insert("x-rate-limit-reset", HeaderValue::from(RATE_LIMIT_RESET));
        return response;
    }
    next.run(request).await
}

// ---------------------------------------------------------------------------
// Timelines
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct TimelineQuery {
    pub count: Option<usize>,
    pub since_id: Option<u64>,
    pub max_id: Option<u64>,
    pub trim_user: Option<bool>,
    pub user_id: Option<u64>,
    pub screen_name: Option<String>,
    pub exclude_replies: Option<bool>,
}

impl TimelineQuery {
    fn select<'a>(&self, tweets: impl Iterator<Item = &'a Tweet>) -> Vec<Value> {
        tweets
            .filter(|t| self.since_id.is_none_or(|since| t.id > since))
            .filter(|t| self.max_id.is_none_or(|max| t.id <= max))
            .filter(|t| !(self.exclude_replies == Some(true) && t.in_reply_to_status_id.is_some()))
            .take(self.count.unwrap_or(20).min(200))
            .map(|t| render(t, self.trim_user.unwrap_or(false)))
            .collect()
    }
}

async fn mentions_timeline(
    State(state): State<AppState>,
    Query(q): Query<TimelineQuery>,
) -> Json<Vec<Value>> {
    let db = state.db.read().await;
    let needle = format!("@{ME_SCREEN_NAME}");
    Json(q.select(db.newest_first().filter(|t| t.user.id != ME_ID && t.text.contains(&needle))))
}

async fn user_timeline(
    State(state): State<AppState>,
    Query(q): Query<TimelineQuery>,
) -> Json<Vec<Value>> {
    let db = state.db.read().await;
    let wanted = |t: &&Tweet| match (&q.user_id, &q.screen_name) {
        (Some(id), _) => t.user.id == *id,
        (None, Some(name)) => t.user.screen_name == *name,
        (None, None) => t.user.id == ME_ID,
    };
    Json(q.select(db.newest_first().filter(wanted)))
}

async fn home_timeline(
    State(state): State<AppState>,
    Query(q): Query<TimelineQuery>,
) -> Json<Vec<Value>> {
    let db = state.db.read().await;
    Json(q.select(db.newest_first()))
}

async fn retweets_of_me(
    State(state): State<AppState>,
    Query(q): Query<TimelineQuery>,
) -> Json<Vec<Value>> {
    let db = state.db.read().await;
    Json(q.select(db.newest_first().filter(|t| t.user.id == ME_ID && t.retweet_count > 0)))
}

// ---------------------------------------------------------------------------
// Tweets
// ---------------------------------------------------------------------------

async fn retweets_for_status(
    State(state): State<AppState>,
    Path(file): Path<String>,
    Query(q): Query<TimelineQuery>,
) -> Response {
    let id = match status_id(&file) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let db = state.db.read().await;
    let retweets = db
        .newest_first()
        .filter(|t| t.retweeted_status.as_ref().is_some_and(|orig| orig.id == id));
    let q = TimelineQuery {
        count: Some(q.count.unwrap_or(100).min(100)),
        ..q
    };
    Json(q.select(retweets)).into_response()
}

#[derive(Debug, Default, Deserialize)]
pub struct ShowQuery {
    pub trim_user: Option<bool>,
}

async fn show_status(
    State(state): State<AppState>,
    Path(file): Path<String>,
    Query(q): Query<ShowQuery>,
) -> Response {
    let id = match status_id(&file) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let db = state.db.read().await;
    match db.tweets.get(&id) {
        Some(t) => Json(render(t, q.trim_user.unwrap_or(false))).into_response(),
        None => no_status(),
    }
}

async fn destroy_status(
    State(state): State<AppState>,
    Path(file): Path<String>,
    Query(q): Query<ShowQuery>,
) -> Response {
    let id = match status_id(&file) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let mut db = state.db.write().await;
    match db.tweets.get(&id) {
        None => return no_status(),
        Some(t) if t.user.id != ME_ID => {
            return twitter_error(
                StatusCode::FORBIDDEN,
                183,
                "You may not delete another user's status.",
            )
        }
        Some(_) => {}
    }
    let Some(removed) = db.tweets.remove(&id) else {
        return no_status();
    };
    db.retweeters.remove(&id);
    debug!(id, "status removed");
    Json(render(&removed, q.trim_user.unwrap_or(false))).into_response()
}

#[derive(Debug, Deserialize)]
pub struct UpdateForm {
    pub status: String,
    pub in_reply_to_status_id: Option<u64>,
    pub trim_user: Option<bool>,
}

async fn update_status(State(state): State<AppState>, Form(input): Form<UpdateForm>) -> Response {
    let mut db = state.db.write().await;
    if db.tweets.values().any(|t| t.user.id == ME_ID && t.text == input.status) {
        return twitter_error(StatusCode::FORBIDDEN, 187, "Status is a duplicate.");
    }
    let created = db.create(input.status, input.in_reply_to_status_id);
    debug!(id = created.id, "status created");
    Json(render(&created, input.trim_user.unwrap_or(false))).into_response()
}

async fn update_with_media(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut status = None;
    let mut media: Option<(Option<String>, usize)> = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return twitter_error(StatusCode::BAD_REQUEST, 44, &e.to_string()),
        };
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "status" => match field.text().await {
                Ok(text) => status = Some(text),
                Err(e) => return twitter_error(StatusCode::BAD_REQUEST, 44, &e.to_string()),
            },
            "media[]" | "media" => {
                let content_type = field.content_type().map(str::to_string);
                match field.bytes().await {
                    Ok(bytes) => media = Some((content_type, bytes.len())),
                    Err(e) => return twitter_error(StatusCode::BAD_REQUEST, 44, &e.to_string()),
                }
            }
            _ => {}
        }
    }
    let Some(status) = status else {
        return twitter_error(StatusCode::BAD_REQUEST, 170, "Missing required parameter: status.");
    };
    let Some((content_type, size)) = media else {
        return twitter_error(StatusCode::BAD_REQUEST, 189, "Error creating status.");
    };

    let mut db = state.db.write().await;
    let mut created = db.create(status, None);
    created.extended_entities = Some(json!({
        "media": [{ "type": "photo", "size": size, "content_type": content_type }]
    }));
    db.tweets.insert(created.id, created.clone());
    debug!(id = created.id, size, "status with media created");
    Json(render(&created, false)).into_response()
}

async fn retweet_status(State(state): State<AppState>, Path(file): Path<String>) -> Response {
    let id = match status_id(&file) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let mut db = state.db.write().await;
    if db.retweeters.get(&id).is_some_and(|ids| ids.contains(&ME_ID)) {
        return twitter_error(StatusCode::FORBIDDEN, 327, "You have already retweeted this Tweet.");
    }
    let original = match db.tweets.get_mut(&id) {
        Some(original) => {
            original.retweet_count += 1;
            original.retweeted = true;
            original.clone()
        }
        None => return no_status(),
    };
    db.retweeters.entry(id).or_default().push(ME_ID);

    let retweet_id = db.allocate_id();
    let mut retweet = tweet(
        retweet_id,
        &format!("RT @{}: {}", original.user.screen_name, original.text),
        me(),
    );
    retweet.retweet_count = original.retweet_count;
    retweet.retweeted = true;
    retweet.retweeted_status = Some(Box::new(original));
    db.tweets.insert(retweet_id, retweet.clone());
    debug!(id, retweet_id, "status retweeted");
    Json(render(&retweet, false)).into_response()
}

#[derive(Debug, Deserialize)]
pub struct RetweetersQuery {
    pub id: u64,
    pub count: Option<usize>,
}

async fn retweeter_ids(
    State(state): State<AppState>,
    Query(q): Query<RetweetersQuery>,
) -> Response {
    let db = state.db.read().await;
    if !db.tweets.contains_key(&q.id) {
        return no_status();
    }
    let ids: Vec<u64> = db
        .retweeters
        .get(&q.id)
        .map(|ids| ids.iter().copied().take(q.count.unwrap_or(100).min(100)).collect())
        .unwrap_or_default();
    Json(json!({
        "ids": ids,
        "next_cursor": 0,
        "next_cursor_str": "0",
        "previous_cursor": 0,
        "previous_cursor_str": "0"
    }))
    .into_response()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn me() -> User {
    user(ME_ID, ME_SCREEN_NAME)
}

fn user(id: u64, screen_name: &str) -> User {
    User {
        id,
        id_str: id.to_string(),
        name: screen_name.to_uppercase(),
        screen_name: screen_name.to_string(),
    }
}

fn tweet(id: u64, text: &str, author: User) -> Tweet {
    Tweet {
        id,
        id_str: id.to_string(),
        text: text.to_string(),
        created_at: CREATED_AT.to_string(),
        user: author,
        in_reply_to_status_id: None,
        retweet_count: 0,
        favorite_count: 0,
        retweeted: false,
        favorited: false,
        retweeted_status: None,
        extended_entities: None,
    }
}

/// JSON for a status; `trim_user` reduces the author to its ids.
fn render(tweet: &Tweet, trim_user: bool) -> Value {
    let mut value = json!(tweet);
    if trim_user {
        value["user"] = json!({ "id": tweet.user.id, "id_str": tweet.user.id_str });
    }
    value
}

/// Parse the `{id}.json` path segment.
fn status_id(file: &str) -> Result<u64, Response> {
    file.strip_suffix(".json")
        .and_then(|id| id.parse().ok())
        .ok_or_else(|| twitter_error(StatusCode::NOT_FOUND, 34, "Sorry, that page does not exist."))
}

fn no_status() -> Response {
    twitter_error(StatusCode::NOT_FOUND, 144, "No status found with that ID.")
}

fn twitter_error(status: StatusCode, code: i64, message: &str) -> Response {
    (status, Json(json!({ "errors": [{ "code": code, "message": message }] }))).into_response()
}
