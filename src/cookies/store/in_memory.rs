use std::sync::RwLock;

use anyhow::Result;
use time::OffsetDateTime;
use url::Url;

use crate::cookies::cookie_jar::CookieJar;
use crate::cookies::store::CookieStore;
use crate::cookies::{Cookie, ExpirationPolicy};

/// Cookie store without persistence.
#[derive(Debug, Default)]
pub struct InMemoryCookieStore {
    jar: RwLock<CookieJar>,
}

impl InMemoryCookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cookies held, expired ones included.
    pub fn len(&self) -> usize {
        self.jar.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CookieStore for InMemoryCookieStore {
    fn set_cookie(&self, location: &Url, name: &str, value: &str, policy: &ExpirationPolicy) -> Result<()> {
        let cookie = Cookie::for_location(location, name, value, policy, OffsetDateTime::now_utc())?;
        self.jar.write().unwrap().insert(cookie);
        Ok(())
    }

    fn get_cookie(&self, location: &Url, name: &str) -> Option<String> {
        self.jar.read().unwrap().get(location, name, OffsetDateTime::now_utc())
    }

    fn cookies_for(&self, location: &Url) -> Vec<Cookie> {
        self.jar.read().unwrap().matching(location, OffsetDateTime::now_utc())
    }

    fn clear(&self) -> Result<()> {
        self.jar.write().unwrap().clear();
        Ok(())
    }
}
