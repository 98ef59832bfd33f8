//! HTTP adapter for the remote answer service.
//!
//! Implements [`vaani_core::AnswerPort`] over the service's fixed contract:
//! `GET /query?q=<url-encoded question>` returning
//! `{ "message": string, "lang": "hi" | "en" }`. One request, one attempt —
//! retry policy is out of scope for this client, and no client-side timeout
//! is applied (a hung request is the session's concern, not this adapter's).

#![deny(unused_crate_dependencies)]

mod client;
mod http;

pub use client::{AnswerClient, DEFAULT_BASE_URL};
pub use http::{HttpBackend, ReqwestBackend};
