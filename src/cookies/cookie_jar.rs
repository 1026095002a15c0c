//! Cookie jar abstraction and a simple in-memory implementation.
//!
//! ## Notes & limitations
//! - Parsing covers the attributes a session needs: `Path`, `Domain`, `Expires`,
//!   `Max-Age`, `SameSite`, `Secure` and `HttpOnly`. `Expires` is stored but not
//!   enforced; a non-positive `Max-Age` removes the cookie right away.
//! - Cookies are bucketed by **origin** (`url.origin().ascii_serialization()`).
//!   Within a bucket, host/subdomain and path prefix checks are applied.
//! - The jar itself is not synchronized. Share it as a [`CookieJarHandle`].
//!
//! See also: RFC 6265bis (HTTP State Management Mechanism).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use http::header::SET_COOKIE;
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cookies::{Cookie, CookieJarHandle};

/// Storage for the cookies of one client session.
pub trait CookieJar: Send + Sync {
    /// Stores cookies found in response `headers` for the given `url`.
    ///
    /// A cookie with the same name as an existing one in the bucket replaces it.
    fn store_response_cookies(&mut self, url: &Url, headers: &HeaderMap);

    /// Returns the `Cookie` request header value to send for `url`, if any.
    fn get_request_cookies(&self, url: &Url) -> Option<String>;

    /// Snapshot of every cookie in the jar.
    fn cookies(&self) -> Vec<Cookie>;

    /// Removes all cookies from the jar.
    fn clear(&mut self);

    /// Removes a single cookie with `cookie_name` associated with `url`.
    fn remove_cookie(&mut self, url: &Url, cookie_name: &str);
}

/// In-memory cookie jar, bucketed per origin (`scheme://host:port`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultCookieJar {
    /// Key: origin string. Value: cookies for that origin, in arrival order.
    pub entries: HashMap<String, Vec<Cookie>>,
}

impl DefaultCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps the jar into a shareable handle.
    pub fn into_handle(self) -> CookieJarHandle {
        Arc::new(RwLock::new(self))
    }
}

impl CookieJar for DefaultCookieJar {
    fn store_response_cookies(&mut self, url: &Url, headers: &HeaderMap) {
        let origin = url.origin().ascii_serialization();
        let default_path = default_path(url);

        let bucket = self.entries.entry(origin).or_default();

        for header in headers.get_all(SET_COOKIE) {
            let Ok(raw) = header.to_str() else {
                continue;
            };
            let Some(mut cookie) = parse_set_cookie(raw) else {
                continue;
            };

            if cookie.path.is_none() {
                cookie.path = Some(default_path.to_string());
            }

            let expired = matches!(cookie.max_age, Some(age) if age <= 0);
            bucket.retain(|c| c.name != cookie.name);
            if !expired {
                bucket.push(cookie);
            }
        }
    }

    fn get_request_cookies(&self, url: &Url) -> Option<String> {
        let origin = url.origin().ascii_serialization();
        let host = url.host_str().unwrap_or_default();
        let path = url.path();
        let is_https = url.scheme() == "https";

        let header = self
            .entries
            .get(&origin)?
            .iter()
            .filter(|c| match &c.domain {
                Some(domain) => host == domain || host.ends_with(&format!(".{domain}")),
                None => true,
            })
            .filter(|c| c.path.as_deref().map_or(true, |p| path.starts_with(p)))
            .filter(|c| !c.secure || is_https)
            .map(Cookie::pair)
            .collect::<Vec<_>>()
            .join("; ");

        if header.is_empty() {
            None
        } else {
            Some(header)
        }
    }

    fn cookies(&self) -> Vec<Cookie> {
        let mut origins: Vec<_> = self.entries.keys().collect();
        origins.sort();
        origins
            .into_iter()
            .flat_map(|o| self.entries[o].iter().cloned())
            .collect()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn remove_cookie(&mut self, url: &Url, cookie_name: &str) {
        let origin = url.origin().ascii_serialization();
        if let Some(cookies) = self.entries.get_mut(&origin) {
            cookies.retain(|c| c.name != cookie_name);
        }
    }
}

/// Directory of the request path, used when a cookie carries no `Path`.
fn default_path(url: &Url) -> &str {
    url.path()
        .rsplit_once('/')
        .map_or("/", |(dir, _)| if dir.is_empty() { "/" } else { dir })
}

/// Parses a single `Set-Cookie` header value.
fn parse_set_cookie(raw: &str) -> Option<Cookie> {
    let mut parts = raw.split(';');
    let (name, value) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let mut cookie = Cookie::new(name, value.trim());

    for attr in parts.map(str::trim).filter(|p| !p.is_empty()) {
        match attr.split_once('=') {
            Some((k, v)) => {
                let v = v.trim();
                match k.trim().to_ascii_lowercase().as_str() {
                    "path" => cookie.path = Some(v.to_string()),
                    "domain" => cookie.domain = Some(v.trim_start_matches('.').to_ascii_lowercase()),
                    "expires" => cookie.expires = Some(v.to_string()),
                    "max-age" => cookie.max_age = v.parse().ok(),
                    "samesite" => cookie.same_site = Some(normalize_same_site(v)),
                    _ => {}
                }
            }
            None => {
                if attr.eq_ignore_ascii_case("secure") {
                    cookie.secure = true;
                } else if attr.eq_ignore_ascii_case("httponly") {
                    cookie.http_only = true;
                }
            }
        }
    }

    Some(cookie)
}

fn normalize_same_site(v: &str) -> String {
    if v.eq_ignore_ascii_case("lax") {
        "Lax".to_string()
    } else if v.eq_ignore_ascii_case("strict") {
        "Strict".to_string()
    } else if v.eq_ignore_ascii_case("none") {
        "None".to_string()
    } else {
        v.to_string()
    }
}
