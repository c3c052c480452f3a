//! JSON-backed cookie store.
//!
//! `JsonCookieStore` persists all cookies in a single JSON file on disk. The
//! file is loaded once on [`open`](JsonCookieStore::open); after that the
//! in-memory jar is authoritative and **every mutation** rewrites the file.
//!
//! ### I/O characteristics & caveats
//! - Each write rewrites the entire file; fine for the handful of analytics
//!   cookies a page sets.
//! - File writes are not atomic.
//! - Expired cookies are dropped when the file is loaded.
//!
//! ### Example
//! ```rust,no_run
//! use gosub_analytics::cookies::{CookieStore, ExpirationPolicy, JsonCookieStore};
//!
//! let store = JsonCookieStore::open("cookies.json").unwrap();
//! let url = url::Url::parse("https://www.example.com/").unwrap();
//! store.set_cookie(&url, "_cid", "abc", &ExpirationPolicy::default()).unwrap();
//! ```
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use url::Url;

use crate::cookies::cookie_jar::CookieJar;
use crate::cookies::store::CookieStore;
use crate::cookies::{Cookie, ExpirationPolicy};

/// On-disk representation of the store.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CookieStoreFile {
    jar: CookieJar,
}

pub struct JsonCookieStore {
    /// Path to the JSON file where cookies are stored.
    path: PathBuf,
    jar: RwLock<CookieJar>,
}

impl JsonCookieStore {
    /// Opens the store at `path`, creating an empty file when it does not exist.
    ///
    /// A file that cannot be parsed is treated as empty and overwritten on the next write.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let mut jar = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("cannot read cookie store {}", path.display()))?;
            match serde_json::from_str::<CookieStoreFile>(&contents) {
                Ok(file) => file.jar,
                Err(e) => {
                    log::warn!("cookie store {} is corrupt, starting empty: {e}", path.display());
                    CookieJar::new()
                }
            }
        } else {
            CookieJar::new()
        };
        jar.purge_expired(OffsetDateTime::now_utc());

        let store = Self { path, jar: RwLock::new(jar) };
        store.save(&store.jar.read().unwrap())?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serializes and writes the full store file (pretty-printed).
    fn save(&self, jar: &CookieJar) -> Result<()> {
        let file = CookieStoreFile { jar: jar.clone() };
        let contents = serde_json::to_string_pretty(&file).context("cannot serialize cookies")?;
        fs::write(&self.path, contents)
            .with_context(|| format!("cannot write cookie store {}", self.path.display()))
    }
}

impl CookieStore for JsonCookieStore {
    fn set_cookie(&self, location: &Url, name: &str, value: &str, policy: &ExpirationPolicy) -> Result<()> {
        let cookie = Cookie::for_location(location, name, value, policy, OffsetDateTime::now_utc())?;

        let mut jar = self.jar.write().unwrap();
        jar.insert(cookie);
        self.save(&jar)
    }

    fn get_cookie(&self, location: &Url, name: &str) -> Option<String> {
        self.jar.read().unwrap().get(location, name, OffsetDateTime::now_utc())
    }

    fn cookies_for(&self, location: &Url) -> Vec<Cookie> {
        self.jar.read().unwrap().matching(location, OffsetDateTime::now_utc())
    }

    fn clear(&self) -> Result<()> {
        let mut jar = self.jar.write().unwrap();
        jar.clear();
        self.save(&jar)
    }
}
