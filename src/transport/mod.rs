//! Shared HTTP session: default headers, TLS/proxy settings and the retry
//! policy for idempotent verbs.

pub mod client;

pub use client::{HttpResponse, Transport};
