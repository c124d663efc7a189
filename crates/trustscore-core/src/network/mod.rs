//! Network utilities shared by the HTTP collaborators.
//!
//! This module provides:
//! - HTTP client with rate limiting awareness and status mapping
//! - Retry logic with exponential backoff and jitter

mod client;
mod retry;

pub use client::{has_next_page, HttpClient, RateLimitState};
pub use retry::{retry_async, RetryConfig};
