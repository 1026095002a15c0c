//! Last-response cache.
//!
//! One slot holding the most recently completed request: its body, its headers
//! and the cookie jar snapshot taken right after it. Every successful request overwrites the
//! slot; there is no history and no way to reset it besides overwriting.
//!
//! Concurrent requests on one client race for the slot with last-write-wins
//! semantics. The lock only keeps the slot consistent; use
//! [`CachedResponse::request_id`] to tell which request a value belongs to.

use std::sync::{PoisonError, RwLock};

use http::HeaderMap;
use url::Url;

use crate::cookies::Cookie;
use crate::errors::NetError;
use crate::net::text::decode_response_body;
use crate::net::RequestId;

#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub request_id: RequestId,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub cookies: Vec<Cookie>,
}

impl CachedResponse {
    /// Decodes the body the same way [`Response::text`](crate::net::Response::text) does.
    pub fn text(&self) -> Result<String, NetError> {
        decode_response_body(&self.headers, &self.body)
    }
}

#[derive(Debug, Default)]
pub struct ResponseCache {
    slot: RwLock<Option<CachedResponse>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the slot.
    pub fn store(&self, entry: CachedResponse) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(entry);
    }

    pub fn last(&self) -> Option<CachedResponse> {
        self.slot.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn last_body(&self) -> Option<Vec<u8>> {
        self.with_last(|e| e.body.clone())
    }

    /// Decoded body of the last response. `None` if nothing completed yet or
    /// the body is not text.
    pub fn last_text(&self) -> Option<String> {
        self.with_last(|e| e.text().ok()).flatten()
    }

    pub fn last_cookies(&self) -> Vec<Cookie> {
        self.with_last(|e| e.cookies.clone()).unwrap_or_default()
    }

    fn with_last<T>(&self, f: impl FnOnce(&CachedResponse) -> T) -> Option<T> {
        self.slot.read().unwrap_or_else(PoisonError::into_inner).as_ref().map(f)
    }
}
