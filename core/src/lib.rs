//! Client core for the Twitter REST API v1.1.
//!
//! # Overview
//! `GigClient` builds `HttpRequest` values and parses `HttpResponse` values
//! without touching the network (host-does-IO pattern). `Gig` pairs it with
//! a `Transport` and turns every endpoint into a spawned `Operation` that
//! resolves exactly once to the decoded result or an `ApiError`.
//!
//! # Design
//! - `GigClient` is immutable: a base URL and the signing `Account`.
//! - Each endpoint is split into `build_*` (produces request) and `parse_*`
//!   (consumes response), so the I/O boundary is explicit.
//! - `Parameters` carries the documented options as typed fields plus
//!   verbatim passthrough keys.
//! - No retries, no queueing: one call is one request.

pub mod client;
pub mod config;
pub mod error;
pub mod gig;
pub mod http;
pub mod operation;
pub mod params;
pub mod transport;
pub mod types;

pub use client::GigClient;
pub use config::ClientConfig;
pub use error::{ApiError, ErrorDetail, RateLimit};
pub use gig::Gig;
pub use http::{HttpBody, HttpMethod, HttpRequest, HttpResponse, MultipartPart};
pub use operation::Operation;
pub use params::Parameters;
pub use transport::{ReqwestTransport, Transport};
pub use types::{Account, Timeline, Tweet, User, UserIdCollection};
