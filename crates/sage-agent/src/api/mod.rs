//! HTTP access to the study-planner backend.
//!
//! `ApiClient` implements [`StudyBackend`](crate::StudyBackend) against
//! the REST endpoints and the NDJSON streaming send endpoint.

mod calls;
mod client;
mod config;

pub use client::ApiClient;
pub use config::ApiConfig;
