//! Fetches a URL and prints it as text.
//!
//! ```text
//! RUST_LOG=debug cargo run --example fetch -- https://example.com/ [key=value ...]
//! ```
//!
//! With extra `key=value` arguments the page is POSTed as a form instead.

use std::time::Duration;

use netbridge::{BlockingClient, ClientConfig};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let url = args.next().unwrap_or_else(|| "https://example.com/".to_string());
    let form: Vec<(String, String)> = args
        .filter_map(|arg| arg.split_once('=').map(|(k, v)| (k.to_string(), v.to_string())))
        .collect();

    let config = ClientConfig::builder()
        .timeout(Duration::from_secs(15))
        .detailed_logging(true)
        .build()?;
    let client = BlockingClient::new(config)?;

    let text = if form.is_empty() {
        client.get_text(&url)?
    } else {
        client.post_text(&url, form)?
    };
    println!("{text}");

    for cookie in client.last_cookies() {
        log::info!("cookie {}", cookie.pair());
    }

    Ok(())
}
