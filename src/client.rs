//! The request client.
//!
//! A [`NetClient`] is one HTTP session: configuration, transport, logger, pinning
//! hashes, cookie jar and the last-response cache all live here, so two clients
//! never share state unless they are handed the same [`CookieJarHandle`].
//!
//! Every request follows the same path:
//!
//! 1. parse the URL (fail with `InvalidUrl`, transport untouched);
//! 2. build the request, serializing the body (fail with `Serialization`);
//! 3. send it through the transport under [`wait_with_timeout`];
//! 4. on success store cookies and overwrite the cache.
//!
//! All methods are async. Blocking callers go through
//! [`BlockingClient`](crate::blocking::BlockingClient).

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::adapter::wait_with_timeout;
use crate::cache::{CachedResponse, ResponseCache};
use crate::config::ClientConfig;
use crate::cookies::{Cookie, CookieJarHandle, DefaultCookieJar};
use crate::errors::NetError;
use crate::logging::{DefaultLogger, Logger};
use crate::net::builder::{build_request, parse_url};
use crate::net::{PinningHashes, RequestBody, RequestDescriptor, RequestId, Response, ReqwestTransport, Transport};

const PINNING_WARNING: &str =
    "[WARNING] No public key pinning / certificate pinning configured, the connection is not pinned";

pub struct NetClient {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
    logger: Arc<dyn Logger>,
    pins: RwLock<PinningHashes>,
    cookie_jar: CookieJarHandle,
    cache: ResponseCache,
}

impl std::fmt::Debug for NetClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetClient")
            .field("config", &self.config)
            .field("pins", &self.pins)
            .field("transport", &"Arc<dyn Transport>")
            .finish()
    }
}

impl NetClient {
    /// Creates a client backed by [`ReqwestTransport`].
    pub fn new(config: ClientConfig) -> Result<Self, NetError> {
        let transport = ReqwestTransport::new()?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let pins = PinningHashes::new(config.certificate_hash.clone(), config.public_key_hash.clone());
        Self {
            logger: Arc::new(DefaultLogger::new(config.logging)),
            config: Arc::new(config),
            transport,
            pins: RwLock::new(pins),
            cookie_jar: DefaultCookieJar::new().into_handle(),
            cache: ResponseCache::new(),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Uses `jar` instead of a private in-memory jar.
    pub fn with_cookie_jar(mut self, jar: CookieJarHandle) -> Self {
        self.cookie_jar = jar;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cookie_jar(&self) -> CookieJarHandle {
        self.cookie_jar.clone()
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    // ---------- Pinning ----------

    /// Sets the hash of the server's certificate. Applies to the next request.
    pub fn set_certificate_hash(&self, hash: impl Into<String>) {
        let mut pins = self.pins.write().unwrap_or_else(PoisonError::into_inner);
        let public_key_hash = pins.public_key_hash.take();
        *pins = PinningHashes::new(Some(hash.into()), public_key_hash);
    }

    /// Sets the hash of the server's public key. Applies to the next request.
    pub fn set_public_key_hash(&self, hash: impl Into<String>) {
        let mut pins = self.pins.write().unwrap_or_else(PoisonError::into_inner);
        let certificate_hash = pins.certificate_hash.take();
        *pins = PinningHashes::new(certificate_hash, Some(hash.into()));
    }

    pub fn certificate_hash(&self) -> Option<String> {
        self.pinning().certificate_hash
    }

    pub fn public_key_hash(&self) -> Option<String> {
        self.pinning().public_key_hash
    }

    fn pinning(&self) -> PinningHashes {
        self.pins.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    // ---------- Requests ----------

    /// Issues the request and returns the raw response body.
    pub async fn request(&self, descriptor: RequestDescriptor) -> Result<Vec<u8>, NetError> {
        Ok(self.fetch(descriptor).await?.body)
    }

    /// Like [`request`](Self::request), but gives up with [`NetError::Cancelled`]
    /// as soon as `cancel` fires.
    pub async fn request_with_cancel(
        &self,
        descriptor: RequestDescriptor,
        cancel: CancellationToken,
    ) -> Result<Vec<u8>, NetError> {
        Ok(self.dispatch(descriptor, self.config.timeout, cancel).await?.body)
    }

    /// Issues the request and returns the full response.
    pub async fn fetch(&self, descriptor: RequestDescriptor) -> Result<Response, NetError> {
        self.dispatch(descriptor, self.config.timeout, CancellationToken::new()).await
    }

    pub async fn get_data(&self, url: &str) -> Result<Vec<u8>, NetError> {
        self.request(RequestDescriptor::get(url)).await
    }

    /// GETs `url` and decodes the body as text, using the text timeout.
    pub async fn get_text(&self, url: &str) -> Result<String, NetError> {
        self.dispatch(RequestDescriptor::get(url), self.config.text_timeout, CancellationToken::new())
            .await?
            .text()
    }

    /// POSTs `form` to `url` and decodes the body as text, using the text timeout.
    pub async fn post_text<I, K, V>(&self, url: &str, form: I) -> Result<String, NetError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let descriptor = RequestDescriptor::post(url, RequestBody::form(form));
        self.dispatch(descriptor, self.config.text_timeout, CancellationToken::new())
            .await?
            .text()
    }

    /// Decoded body of the most recent successful request on this client.
    pub fn last_response_string(&self) -> Option<String> {
        self.cache.last_text()
    }

    /// Cookie jar contents right after the most recent successful request.
    pub fn last_cookies(&self) -> Vec<Cookie> {
        self.cache.last_cookies()
    }

    async fn dispatch(
        &self,
        descriptor: RequestDescriptor,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Result<Response, NetError> {
        let id = RequestId::new();
        let url = parse_url(&descriptor.url)?;

        let pins = self.pinning();
        if !pins.is_complete() {
            self.logger.warn(PINNING_WARNING);
        }

        let cookie_header = self
            .cookie_jar
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get_request_cookies(&url);

        let mut request = build_request(id, url, &descriptor, &self.config, pins.complete(), cookie_header)?;
        request.timeout = timeout;

        let transport = self.transport.clone();
        let outcome = wait_with_timeout(async move { transport.send(request).await }, timeout, cancel).await;

        match outcome {
            Ok(resp) => {
                self.record(id, &resp);
                Ok(resp)
            }
            Err(e) => {
                if e.is_diagnosed() {
                    self.logger.log(&format!("Request {id} to {} failed: {e}", descriptor.url));
                }
                Err(e)
            }
        }
    }

    /// Stores response cookies, then overwrites the cache.
    fn record(&self, id: RequestId, resp: &Response) {
        let cookies = {
            let mut jar = self.cookie_jar.write().unwrap_or_else(PoisonError::into_inner);
            jar.store_response_cookies(&resp.url, &resp.headers);
            jar.cookies()
        };

        if self.config.detailed_logging {
            self.logger.log(&format!(
                "Request {id} completed: {} {} ({} bytes)",
                resp.status,
                resp.url,
                resp.body.len()
            ));
        }

        self.cache.store(CachedResponse {
            request_id: id,
            url: resp.url.clone(),
            headers: resp.headers.clone(),
            body: resp.body.clone(),
            cookies,
        });
    }
}
