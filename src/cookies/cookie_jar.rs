//! In-memory cookie jar shared by the store backends.
//!
//! A [`CookieJar`] holds cookies bucketed by their **domain** attribute. Within
//! a bucket, cookies are unique by name: setting an existing name replaces the
//! previous cookie ("last write wins").
//!
//! This type is **not** internally synchronized; stores wrap it in a lock.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use url::Url;

use crate::cookies::Cookie;

/// Bucket for cookies set from locations without a host.
const HOSTLESS_BUCKET: &str = "";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CookieJar {
    /// Key: cookie domain. Value: cookies for that domain.
    pub entries: HashMap<String, Vec<Cookie>>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `cookie`, replacing a cookie with the same name and domain.
    pub fn insert(&mut self, cookie: Cookie) {
        let key = cookie.domain.clone().unwrap_or_else(|| HOSTLESS_BUCKET.to_string());
        let bucket = self.entries.entry(key).or_default();

        if let Some(existing) = bucket.iter_mut().find(|c| c.name == cookie.name && c.path == cookie.path) {
            *existing = cookie;
        } else {
            bucket.push(cookie);
        }
    }

    /// All unexpired cookies visible to `location`.
    pub fn matching(&self, location: &Url, now: OffsetDateTime) -> Vec<Cookie> {
        self.entries
            .values()
            .flatten()
            .filter(|c| c.matches(location) && !c.is_expired(now))
            .cloned()
            .collect()
    }

    /// Value of the cookie `name` visible to `location`, preferring the longest path.
    pub fn get(&self, location: &Url, name: &str, now: OffsetDateTime) -> Option<String> {
        self.matching(location, now)
            .into_iter()
            .filter(|c| c.name == name)
            .max_by_key(|c| c.path.as_deref().map_or(0, str::len))
            .map(|c| c.value)
    }

    /// Drops expired cookies and empty buckets.
    pub fn purge_expired(&mut self, now: OffsetDateTime) {
        for bucket in self.entries.values_mut() {
            bucket.retain(|c| !c.is_expired(now));
        }
        self.entries.retain(|_, bucket| !bucket.is_empty());
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::ExpirationPolicy;
    use time::macros::datetime;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn cookie(location: &str, name: &str, value: &str, now: OffsetDateTime) -> Cookie {
        Cookie::for_location(&url(location), name, value, &ExpirationPolicy::default(), now).unwrap()
    }

    #[test]
    fn same_name_is_last_write_wins() {
        let now = datetime!(2025-06-01 10:00:00 UTC);
        let mut jar = CookieJar::new();
        jar.insert(cookie("https://www.example.com/", "_cid", "one", now));
        jar.insert(cookie("https://shop.example.com/", "_cid", "two", now));

        assert_eq!(jar.len(), 1);
        assert_eq!(jar.get(&url("https://example.com/"), "_cid", now).as_deref(), Some("two"));
    }

    #[test]
    fn matching_filters_other_sites() {
        let now = datetime!(2025-06-01 10:00:00 UTC);
        let mut jar = CookieJar::new();
        jar.insert(cookie("https://www.example.com/", "a", "1", now));
        jar.insert(cookie("https://www.other.org/", "b", "2", now));

        let visible = jar.matching(&url("https://news.example.com/today"), now);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "a");
        assert!(jar.get(&url("https://www.other.org/"), "a", now).is_none());
    }

    #[test]
    fn expired_cookies_are_hidden_and_purged() {
        let then = datetime!(2020-01-01 00:00:00 UTC);
        let now = datetime!(2025-06-01 10:00:00 UTC);
        let mut jar = CookieJar::new();
        jar.insert(cookie("https://www.example.com/", "old", "x", then));
        jar.insert(cookie("https://www.example.com/", "new", "y", now));

        assert_eq!(jar.matching(&url("https://www.example.com/"), now).len(), 1);
        jar.purge_expired(now);
        assert_eq!(jar.len(), 1);

        jar.clear();
        assert!(jar.is_empty());
    }
}
