//! Bounded fire-and-wait HTTP requests.
//!
//! [`NetClient`] issues one request at a time per call, waits for it for at most
//! the configured timeout and remembers the last response and cookie set.
//! [`BlockingClient`] wraps it for callers that cannot await.
//!
//! ```no_run
//! use netbridge::{BlockingClient, ClientConfig};
//!
//! # fn main() -> anyhow::Result<()> {
//! let client = BlockingClient::new(ClientConfig::default())?;
//! let page = client.get_text("https://example.com/")?;
//! assert_eq!(client.last_response_string().as_deref(), Some(page.as_str()));
//! # Ok(()) }
//! ```

pub mod adapter;
pub mod blocking;
pub mod cache;
pub mod client;
pub mod config;
pub mod cookies;
pub mod errors;
pub mod logging;
pub mod net;

pub use blocking::BlockingClient;
pub use client::NetClient;
pub use config::ClientConfig;
pub use errors::{ErrorKind, NetError};
