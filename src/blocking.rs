//! Blocking front-end.
//!
//! [`BlockingClient`] owns a tokio runtime and blocks the calling thread on the
//! async [`NetClient`]. The wait is still bounded by the client's timeout, so a
//! hung server costs at most `timeout` plus scheduling slack.
//!
//! Do not call it from inside an async context: `block_on` panics there. Use the
//! async client directly instead.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use crate::adapter::wait_with_timeout;
use crate::client::NetClient;
use crate::config::ClientConfig;
use crate::cookies::Cookie;
use crate::errors::NetError;
use crate::net::{Method, RequestBody, RequestDescriptor};

pub struct BlockingClient {
    runtime: Arc<Runtime>,
    client: Arc<NetClient>,
}

impl BlockingClient {
    /// Creates a blocking client with its own runtime and a reqwest transport.
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let runtime = build_runtime()?;
        // reqwest wants a runtime context when its client is built
        let client = {
            let _enter = runtime.enter();
            NetClient::new(config)?
        };
        Ok(Self {
            runtime: Arc::new(runtime),
            client: Arc::new(client),
        })
    }

    /// Wraps an existing async client.
    pub fn from_client(client: NetClient) -> anyhow::Result<Self> {
        Ok(Self {
            runtime: Arc::new(build_runtime()?),
            client: Arc::new(client),
        })
    }

    pub fn client(&self) -> &NetClient {
        &self.client
    }

    /// Issues a request and blocks until it completes, fails or times out.
    pub fn request(&self, url: &str, method: Method, body: Option<RequestBody>) -> Result<Vec<u8>, NetError> {
        self.runtime
            .block_on(self.client.request(RequestDescriptor::new(url, method, body)))
    }

    pub fn get_data(&self, url: &str) -> Result<Vec<u8>, NetError> {
        self.runtime.block_on(self.client.get_data(url))
    }

    pub fn get_text(&self, url: &str) -> Result<String, NetError> {
        self.runtime.block_on(self.client.get_text(url))
    }

    pub fn post_text<I, K, V>(&self, url: &str, form: I) -> Result<String, NetError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.runtime.block_on(self.client.post_text(url, form))
    }

    pub fn last_response_string(&self) -> Option<String> {
        self.client.last_response_string()
    }

    pub fn last_cookies(&self) -> Vec<Cookie> {
        self.client.last_cookies()
    }

    /// Blocks on any future for at most `timeout`.
    pub fn wait<T, F>(&self, fut: F, timeout: Duration) -> Result<T, NetError>
    where
        F: Future<Output = Result<T, NetError>> + Send + 'static,
        T: Send + 'static,
    {
        self.runtime
            .block_on(wait_with_timeout(fut, timeout, CancellationToken::new()))
    }
}

fn build_runtime() -> std::io::Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("netbridge-io")
        .enable_all()
        .build()
}
