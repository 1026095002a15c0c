//! Request descriptors.
//!
//! A [`RequestDescriptor`] is what callers hand to the client: a URL string, a
//! method and an optional body. Nothing is validated here; URL parsing and body
//! serialization happen at dispatch so that their failures surface as
//! [`NetError`](crate::errors::NetError) values from the request call itself.

use std::collections::BTreeMap;
use std::fmt::Display;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::NetError;

/// A unique identifier for a dispatched request, represented as a UUID.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// HTTP method supported by the client.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    /// Plain request, never carries a body.
    Get,
    /// Posts a form or JSON payload.
    Post,
}

impl From<Method> for http::Method {
    fn from(m: Method) -> Self {
        match m {
            Method::Get => http::Method::GET,
            Method::Post => http::Method::POST,
        }
    }
}

/// Payload of a POST request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Plain key-value form, sent as `k=v&k2=v2`.
    Form(BTreeMap<String, String>),
    /// Arbitrary JSON structure, serialized and percent-encoded.
    Json(serde_json::Value),
}

impl RequestBody {
    /// Builds a form body from anything that yields string pairs.
    pub fn form<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        RequestBody::Form(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Builds a JSON body from any serializable value.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, NetError> {
        Ok(RequestBody::Json(serde_json::to_value(value)?))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub url: String,
    pub method: Method,
    pub body: Option<RequestBody>,
}

impl RequestDescriptor {
    pub fn new(url: impl Into<String>, method: Method, body: Option<RequestBody>) -> Self {
        Self {
            url: url.into(),
            method,
            body,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(url, Method::Get, None)
    }

    pub fn post(url: impl Into<String>, body: RequestBody) -> Self {
        Self::new(url, Method::Post, Some(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn form_collects_pairs_in_key_order() {
        let body = RequestBody::form([("b", "2"), ("a", "1")]);
        let RequestBody::Form(map) = body else {
            panic!("expected form body");
        };
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn json_rejects_non_string_keys() {
        let mut map = HashMap::new();
        map.insert(vec![1u8], "x");
        let err = RequestBody::json(&map).unwrap_err();
        assert!(matches!(err, NetError::Serialization(_)));
    }

    #[test]
    fn method_maps_to_http() {
        assert_eq!(http::Method::from(Method::Get), http::Method::GET);
        assert_eq!(http::Method::from(Method::Post), http::Method::POST);
    }

    #[test]
    fn request_ids_are_unique() {
        assert_ne!(RequestId::new(), RequestId::new());
    }
}
