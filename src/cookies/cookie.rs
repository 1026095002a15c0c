//! Cookie core types.
//!
//! # Concurrency model
//! [`CookieJarHandle`] is `Arc<RwLock<dyn CookieJar + Send + Sync>>`. Take a read
//! lock to build a request header and a write lock to store response cookies.
//! The same handle may be given to several clients so they share one session.
//!
//! The [`Cookie`] struct is what [`CookieJar::cookies`] hands out and what the
//! response cache keeps as "last cookie set". It can be (de)serialized with `serde`.
//!
//! ```rust
//! use netbridge::cookies::Cookie;
//!
//! let c = Cookie::new("session", "abc123");
//! assert_eq!(c.pair(), "session=abc123");
//! ```

use crate::cookies::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// A handle to a cookie jar.
pub type CookieJarHandle = Arc<RwLock<dyn CookieJar + Send + Sync>>;

/// A cookie as received from a `Set-Cookie` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name (case-sensitive).
    pub name: String,

    /// Raw cookie value (not URL-decoded).
    pub value: String,

    /// Path scoping. Derived from the request URL when the server sends none.
    pub path: Option<String>,

    /// Domain scoping (host-only if `None`), without a leading dot.
    pub domain: Option<String>,

    /// If `true`, cookie is sent only over HTTPS.
    pub secure: bool,

    /// Raw `Expires` attribute. Stored, not enforced.
    pub expires: Option<String>,

    /// `Max-Age` in seconds, if the server sent one.
    pub max_age: Option<i64>,

    /// SameSite policy (`"Strict"`, `"Lax"`, or `"None"`).
    pub same_site: Option<String>,

    /// If `true`, cookie is not meant for client-side scripts.
    pub http_only: bool,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
            domain: None,
            secure: false,
            expires: None,
            max_age: None,
            same_site: None,
            http_only: false,
        }
    }

    /// `name=value`, as sent in a `Cookie` request header.
    pub fn pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}
