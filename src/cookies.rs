//! Cookies: [`Cookie`], the [`CookieJar`] trait and the in-memory [`DefaultCookieJar`].
//!
//! A client owns one [`CookieJarHandle`]. Cookies received from a server are stored
//! after every successful request and replayed on the next request to a matching URL.

mod cookie;
mod cookie_jar;

pub use cookie::Cookie;
pub use cookie::CookieJarHandle;

pub use cookie_jar::CookieJar;
pub use cookie_jar::DefaultCookieJar;
