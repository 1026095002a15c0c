//! Turns a [`RequestDescriptor`] into a ready-to-send [`HttpRequest`].
//!
//! Every request gets `Connection: close` and the configured `User-Agent`.
//! POST bodies are always sent as `application/x-www-form-urlencoded`:
//! - a form map becomes `k=v&k2=v2` with keys and values percent-encoded;
//! - a JSON structure is serialized with sorted keys and percent-encoded as a
//!   whole, keeping the characters that are legal in a URL host literal.

use std::time::Duration;

use http::header::{HeaderValue, CONNECTION, CONTENT_TYPE, COOKIE, USER_AGENT};
use http::HeaderMap;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use crate::config::ClientConfig;
use crate::errors::NetError;
use crate::net::pinning::PinningHashes;
use crate::net::request::{Method, RequestBody, RequestDescriptor, RequestId};

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Everything but the RFC 3986 unreserved characters.
const FORM_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Characters allowed in a URL host: alphanumerics and `!$&'()*+,-.:;=[]_~`.
const URL_HOST_ALLOWED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b'-')
    .remove(b'.')
    .remove(b':')
    .remove(b';')
    .remove(b'=')
    .remove(b'[')
    .remove(b']')
    .remove(b'_')
    .remove(b'~');

/// A request prepared for a [`Transport`](crate::net::Transport).
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub id: RequestId,
    pub method: http::Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
    /// Applied by the transport below the adapter's own timeout.
    pub timeout: Duration,
    /// Set only when pinning is enforced for this request.
    pub pins: Option<PinningHashes>,
}

/// Parses a URL string, mapping failures to [`NetError::InvalidUrl`].
pub fn parse_url(raw: &str) -> Result<Url, NetError> {
    Url::parse(raw.trim()).map_err(|e| NetError::InvalidUrl(format!("{raw:?}: {e}")))
}

pub fn build_request(
    id: RequestId,
    url: Url,
    descriptor: &RequestDescriptor,
    config: &ClientConfig,
    pins: Option<PinningHashes>,
    cookie_header: Option<String>,
) -> Result<HttpRequest, NetError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONNECTION, HeaderValue::from_static("close"));
    headers.insert(USER_AGENT, header_value(&config.user_agent)?);
    if let Some(cookies) = cookie_header {
        headers.insert(COOKIE, header_value(&cookies)?);
    }

    let body = match descriptor.method {
        Method::Get => None,
        Method::Post => {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
            let encoded = match &descriptor.body {
                Some(body) => encode_body(body)?,
                None => String::new(),
            };
            Some(encoded.into_bytes())
        }
    };

    Ok(HttpRequest {
        id,
        method: descriptor.method.into(),
        url,
        headers,
        body,
        timeout: config.timeout,
        pins,
    })
}

pub fn encode_body(body: &RequestBody) -> Result<String, NetError> {
    match body {
        RequestBody::Form(pairs) => Ok(encode_form(pairs)),
        RequestBody::Json(value) => encode_json(value),
    }
}

pub fn encode_form<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                utf8_percent_encode(k, FORM_COMPONENT),
                utf8_percent_encode(v, FORM_COMPONENT)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Only objects and arrays are accepted at the top level.
pub fn encode_json(value: &serde_json::Value) -> Result<String, NetError> {
    if !(value.is_object() || value.is_array()) {
        return Err(NetError::Serialization(
            "JSON body must be an object or an array".to_string(),
        ));
    }
    let json = serde_json::to_string(value)?;
    Ok(utf8_percent_encode(&json, URL_HOST_ALLOWED).to_string())
}

fn header_value(raw: &str) -> Result<HeaderValue, NetError> {
    HeaderValue::from_str(raw)
        .map_err(|e| NetError::Serialization(format!("invalid header value {raw:?}: {e}")))
}
