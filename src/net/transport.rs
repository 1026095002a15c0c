//! The transport seam.
//!
//! A [`Transport`] performs one asynchronous HTTP exchange and returns the fully
//! buffered [`Response`]. The client never talks to an HTTP library directly, so
//! tests and embedders can swap in their own implementation.
//!
//! [`ReqwestTransport`] is the production implementation. Requests that carry
//! pinning hashes go through a separate client whose TLS config checks the pins
//! during the handshake, on every hop of a redirect chain. That client only speaks
//! HTTPS, so a pinned request never leaves in plain text.

use std::error::Error as StdError;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::NetError;
use crate::net::builder::HttpRequest;
use crate::net::pinning::{pinned_tls_config, PinningHashes};
use crate::net::Response;

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<Response, NetError>;
}

#[derive(Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    /// Client for the current pin set. Rebuilt when the pins change.
    pinned: Mutex<Option<(PinningHashes, reqwest::Client)>>,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, NetError> {
        Ok(Self::with_client(reqwest::Client::builder().build()?))
    }

    /// Uses `client` for unpinned requests. Pinned requests always get a client
    /// of their own.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            pinned: Mutex::new(None),
        }
    }

    fn client_for(&self, pins: Option<&PinningHashes>) -> Result<reqwest::Client, NetError> {
        let Some(pins) = pins else {
            return Ok(self.client.clone());
        };

        let mut slot = self.pinned.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((cached, client)) = slot.as_ref() {
            if cached == pins {
                return Ok(client.clone());
            }
        }

        let client = reqwest::Client::builder()
            .use_preconfigured_tls(pinned_tls_config(pins.clone())?)
            .https_only(true)
            .build()?;
        *slot = Some((pins.clone(), client.clone()));
        Ok(client)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<Response, NetError> {
        if request.pins.is_some() && request.url.scheme() != "https" {
            return Err(NetError::PinningMismatch(format!(
                "pinned request to {} does not use https",
                request.url
            )));
        }

        let timeout = request.timeout;
        let client = self.client_for(request.pins.as_ref())?;
        let mut builder = client
            .request(request.method, request.url)
            .headers(request.headers)
            .timeout(request.timeout);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let res = builder.send().await.map_err(|e| classify(e, timeout))?;

        // Fetch results
        let final_url = res.url().clone();
        let status = res.status().as_u16();
        let status_text = res.status().canonical_reason().unwrap_or("Unknown").to_string();
        let headers = res.headers().clone();

        // Fetch body. We don't do streaming yet
        let body = res.bytes().await.map_err(|e| classify(e, timeout))?.to_vec();

        Ok(Response {
            url: final_url,
            status,
            status_text,
            headers,
            body,
        })
    }
}

/// reqwest enforces the same deadline as the adapter; report it the same way.
/// A handshake rejected by the pin check surfaces as `PinningMismatch`.
fn classify(e: reqwest::Error, timeout: Duration) -> NetError {
    if e.is_timeout() {
        return NetError::Timeout(timeout);
    }
    match pin_rejection(&e) {
        Some(reason) => NetError::PinningMismatch(reason),
        None => e.into(),
    }
}

/// Finds the reason our verifier gave, if it is somewhere in the error chain.
fn pin_rejection(e: &(dyn StdError + 'static)) -> Option<String> {
    let mut current = Some(e);
    while let Some(err) = current {
        // io::Error hides its payload from source()
        let inner = err
            .downcast_ref::<std::io::Error>()
            .and_then(|io| io.get_ref())
            .map(|inner| inner as &(dyn StdError + 'static));
        for candidate in [Some(err), inner].into_iter().flatten() {
            if let Some(rustls::Error::General(reason)) = candidate.downcast_ref::<rustls::Error>() {
                return Some(reason.clone());
            }
        }
        current = err.source();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::errors::ErrorKind;
    use crate::net::builder::{build_request, parse_url};
    use crate::net::{RequestBody, RequestDescriptor, RequestId};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serves one canned HTTP/1.1 response and hands back the raw request head.
    async fn serve_once(response: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        (format!("http://{addr}/path"), rx)
    }

    fn request(url: &str) -> HttpRequest {
        let descriptor = RequestDescriptor::get(url);
        build_request(
            RequestId::new(),
            parse_url(url).unwrap(),
            &descriptor,
            &ClientConfig::default(),
            None,
            Some("sid=1".into()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn fetches_from_local_server() {
        let (url, head) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 5\r\nSet-Cookie: a=1\r\nConnection: close\r\n\r\nhello",
        )
        .await;

        let transport = ReqwestTransport::new().unwrap();
        let resp = transport.send(request(&url)).await.unwrap();

        assert_eq!(resp.status, 200);
        assert_eq!(resp.status_text, "OK");
        assert_eq!(resp.body, b"hello");
        assert_eq!(resp.headers["set-cookie"], "a=1");

        let head = head.await.unwrap().to_ascii_lowercase();
        assert!(head.starts_with("get /path http/1.1"), "{head}");
        assert!(head.contains("connection: close"), "{head}");
        assert!(head.contains("cookie: sid=1"), "{head}");
        assert!(head.contains("user-agent: netbridge/"), "{head}");
    }

    /// Accepts one connection and returns everything the client wrote before it
    /// hung up or went quiet.
    async fn capture_once() -> (std::net::SocketAddr, oneshot::Receiver<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let mut seen = Vec::new();
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut chunk = [0u8; 4096];
                // Not TLS: answer in plain text so the handshake fails
                let _ = socket.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n").await;
                while let Ok(Ok(n)) =
                    tokio::time::timeout(std::time::Duration::from_millis(500), socket.read(&mut chunk)).await
                {
                    if n == 0 {
                        break;
                    }
                    seen.extend_from_slice(&chunk[..n]);
                }
            }
            let _ = tx.send(seen);
        });

        (addr, rx)
    }

    fn secret_post(url: &str, pins: PinningHashes) -> HttpRequest {
        let descriptor = RequestDescriptor::post(url, RequestBody::form([("password", "hunter2")]));
        build_request(
            RequestId::new(),
            parse_url(url).unwrap(),
            &descriptor,
            &ClientConfig::default(),
            Some(pins),
            Some("sid=secret".into()),
        )
        .unwrap()
    }

    fn pins() -> PinningHashes {
        PinningHashes::new(Some("aa".into()), Some("bb".into()))
    }

    #[tokio::test]
    async fn pinned_request_over_plain_http_never_connects() {
        let (addr, seen) = capture_once().await;
        let url = format!("http://{addr}/login");

        let transport = ReqwestTransport::new().unwrap();
        let err = transport.send(secret_post(&url, pins())).await.unwrap_err();
        assert!(matches!(err, NetError::PinningMismatch(_)), "{err:?}");
        assert_eq!(err.kind(), ErrorKind::Transport);

        // Nothing connected, so the listener is still waiting
        assert!(tokio::time::timeout(std::time::Duration::from_millis(200), seen).await.is_err());
    }

    #[tokio::test]
    async fn failed_handshake_leaks_no_request_data() {
        let (addr, seen) = capture_once().await;
        let url = format!("https://{addr}/login");

        let transport = ReqwestTransport::new().unwrap();
        let err = transport.send(secret_post(&url, pins())).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);

        let seen = String::from_utf8_lossy(&seen.await.unwrap()).into_owned();
        assert!(!seen.contains("hunter2"), "{seen}");
        assert!(!seen.contains("sid=secret"), "{seen}");
        assert!(!seen.contains("POST"), "{seen}");
    }

    #[tokio::test]
    async fn pinned_client_is_reused_until_pins_change() {
        let transport = ReqwestTransport::new().unwrap();
        transport.client_for(Some(&pins())).unwrap();
        transport.client_for(Some(&pins())).unwrap();
        assert_eq!(transport.pinned.lock().unwrap().as_ref().unwrap().0, pins());

        let other = PinningHashes::new(Some("cc".into()), Some("dd".into()));
        transport.client_for(Some(&other)).unwrap();
        assert_eq!(transport.pinned.lock().unwrap().as_ref().unwrap().0, other);

        transport.client_for(None).unwrap();
        assert_eq!(transport.pinned.lock().unwrap().as_ref().unwrap().0, other);
    }

    #[test]
    fn verifier_rejection_is_found_behind_io_errors() {
        let io = std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            rustls::Error::General("certificate hash 00 does not match the pinned hash".into()),
        );
        assert_eq!(
            pin_rejection(&io).as_deref(),
            Some("certificate hash 00 does not match the pinned hash")
        );

        let io = std::io::Error::new(std::io::ErrorKind::InvalidData, "bad record");
        assert!(pin_rejection(&io).is_none());
    }

    #[tokio::test]
    async fn refused_connection_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = ReqwestTransport::new().unwrap();
        let err = transport.send(request(&format!("http://{addr}/"))).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }
}
