//! Cookies: the [`CookieStore`] the writer persists into, and its backends.

mod cookies;
mod cookie_jar;
mod domain;
mod store;

pub use cookies::Cookie;
pub use cookies::CookieStoreHandle;
pub use cookies::ExpirationPolicy;

pub use cookie_jar::CookieJar;
pub use domain::{cookie_domain, registrable_domain};

pub use store::CookieStore;
pub use store::InMemoryCookieStore;
pub use store::JsonCookieStore;
