//! Linker parameters.
//!
//! A linker carries values across navigations in a single query parameter:
//!
//! ```text
//! ?mylinker=1*1w5d6ba*clientId*YWJjMTIz*sessionId*c2Vzcw..
//!           | |       |        |
//!           | |       key      base64url value ('.' padding)
//!           | checksum (crc32, base 36)
//!           version
//! ```
//!
//! The checksum covers a browser fingerprint, the minute of creation and the
//! serialized pairs, and is accepted for the minute it was created in and the
//! following one.

use std::collections::HashMap;
use std::sync::Mutex;

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;
use time::OffsetDateTime;
use url::Url;

use crate::errors::LinkerError;

pub const LINKER_VERSION: &str = "1";

const DELIMITER: &str = "*";

/// How many minutes old a linker may be.
const MAX_LINKER_AGE_MINUTES: i64 = 1;

/// Synchronous lookup of linker values.
pub trait LinkerReader: Send + Sync {
    /// Returns the value of `param_id` carried by the linker `linker_name`,
    /// or an empty string when there is none.
    ///
    /// A linker that is present but cannot be trusted (bad checksum, unknown
    /// version, undecodable value) is an error, not an empty value.
    fn get(&self, linker_name: &str, param_id: &str) -> Result<String, LinkerError>;
}

/// Browser traits mixed into the linker checksum.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkerFingerprint {
    pub user_agent: String,
    /// Minutes, as reported by `Date.prototype.getTimezoneOffset`.
    pub timezone_offset: i32,
    pub language: String,
}

impl LinkerFingerprint {
    pub fn new<S: Into<String>, L: Into<String>>(user_agent: S, timezone_offset: i32, language: L) -> Self {
        Self {
            user_agent: user_agent.into(),
            timezone_offset,
            language: language.into(),
        }
    }

    fn serialize(&self) -> String {
        format!("{}{DELIMITER}{}{DELIMITER}{}", self.user_agent, self.timezone_offset, self.language)
    }
}

fn minutes_since_epoch(now: OffsetDateTime) -> i64 {
    now.unix_timestamp().div_euclid(60)
}

fn to_base36(mut n: u32) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::new();
    while n > 0 {
        buf.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    buf.reverse();
    String::from_utf8_lossy(&buf).into_owned()
}

fn checksum(fingerprint: &LinkerFingerprint, minutes: i64, serialized: &str) -> String {
    let input = format!("{}{DELIMITER}{minutes}{DELIMITER}{serialized}", fingerprint.serialize());
    to_base36(crc32fast::hash(input.as_bytes()))
}

fn encode_value(value: &str) -> String {
    URL_SAFE.encode(value.as_bytes()).replace('=', ".")
}

fn decode_value(key: &str, encoded: &str) -> Result<String, LinkerError> {
    let trimmed = encoded.trim_end_matches(['.', '=']);
    let bytes = URL_SAFE_NO_PAD
        .decode(trimmed)
        .map_err(|_| LinkerError::Decode { key: key.to_string() })?;
    String::from_utf8(bytes).map_err(|_| LinkerError::Decode { key: key.to_string() })
}

/// Builds a linker value for `pairs`, stamped with `now`.
pub fn create_linker(pairs: &[(&str, &str)], fingerprint: &LinkerFingerprint, now: OffsetDateTime) -> String {
    let serialized = pairs
        .iter()
        .map(|(k, v)| format!("{k}{DELIMITER}{}", encode_value(v)))
        .collect::<Vec<_>>()
        .join(DELIMITER);

    let sum = checksum(fingerprint, minutes_since_epoch(now), &serialized);
    format!("{LINKER_VERSION}{DELIMITER}{sum}{DELIMITER}{serialized}")
}

/// Parses and verifies a linker value.
pub fn parse_linker(
    value: &str,
    fingerprint: &LinkerFingerprint,
    now: OffsetDateTime,
) -> Result<HashMap<String, String>, LinkerError> {
    if value.is_empty() {
        return Err(LinkerError::Empty);
    }

    let mut parts = value.splitn(3, DELIMITER);
    let version = parts.next().unwrap_or_default();
    if version != LINKER_VERSION {
        return Err(LinkerError::UnsupportedVersion(version.to_string()));
    }
    let sum = parts
        .next()
        .ok_or_else(|| LinkerError::Malformed("missing checksum".into()))?;
    let serialized = parts
        .next()
        .ok_or_else(|| LinkerError::Malformed("missing params".into()))?;

    let fields: Vec<&str> = serialized.split(DELIMITER).collect();
    if fields.len() % 2 != 0 {
        return Err(LinkerError::Malformed("odd number of key/value fields".into()));
    }

    let minutes = minutes_since_epoch(now);
    let valid = (0..=MAX_LINKER_AGE_MINUTES).any(|age| checksum(fingerprint, minutes - age, serialized) == sum);
    if !valid {
        return Err(LinkerError::ChecksumMismatch);
    }

    let mut params = HashMap::new();
    for pair in fields.chunks(2) {
        let key = pair[0];
        if key.is_empty() {
            return Err(LinkerError::Malformed("empty key".into()));
        }
        params.insert(key.to_string(), decode_value(key, pair[1])?);
    }
    Ok(params)
}

/// Reads linkers from the query string of the page URL.
///
/// Each linker is parsed once and cached, parse errors included.
pub struct DefaultLinkerReader {
    page_url: Url,
    fingerprint: LinkerFingerprint,
    clock: fn() -> OffsetDateTime,
    cache: Mutex<HashMap<String, Result<HashMap<String, String>, LinkerError>>>,
}

impl DefaultLinkerReader {
    pub fn new(page_url: Url, fingerprint: LinkerFingerprint) -> Self {
        Self {
            page_url,
            fingerprint,
            clock: OffsetDateTime::now_utc,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Replaces the clock used to validate checksums.
    pub fn with_clock(mut self, clock: fn() -> OffsetDateTime) -> Self {
        self.clock = clock;
        self
    }

    fn read_linker(&self, linker_name: &str) -> Result<HashMap<String, String>, LinkerError> {
        let raw = self
            .page_url
            .query_pairs()
            .find(|(k, _)| k == linker_name)
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default();
        if raw.is_empty() {
            log::debug!("no linker {linker_name} on {}", self.page_url);
            return Ok(HashMap::new());
        }

        parse_linker(&raw, &self.fingerprint, (self.clock)()).inspect_err(|e| {
            log::debug!("rejecting linker {linker_name}: {e}");
        })
    }
}

impl LinkerReader for DefaultLinkerReader {
    fn get(&self, linker_name: &str, param_id: &str) -> Result<String, LinkerError> {
        let mut cache = self.cache.lock().unwrap();
        let params = cache
            .entry(linker_name.to_string())
            .or_insert_with(|| self.read_linker(linker_name))
            .as_ref()
            .map_err(Clone::clone)?;
        Ok(params.get(param_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn fp() -> LinkerFingerprint {
        LinkerFingerprint::new("Mozilla/5.0 (X11; Linux x86_64)", -60, "en-US")
    }

    fn fixed_now() -> OffsetDateTime {
        datetime!(2025-03-01 12:30:15 UTC)
    }

    #[test]
    fn base36_matches_known_values() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(u32::MAX), "1z141z3");
    }

    #[test]
    fn values_use_dot_padding() {
        assert_eq!(encode_value("a"), "YQ..");
        assert_eq!(decode_value("k", "YQ..").unwrap(), "a");
        assert_eq!(decode_value("k", "YQ==").unwrap(), "a");
        assert!(decode_value("k", "***").is_err());
    }

    #[test]
    fn created_linker_parses_back() {
        let linker = create_linker(&[("clientId", "abc123"), ("sid", "s?s&s")], &fp(), fixed_now());
        assert!(linker.starts_with("1*"));

        let params = parse_linker(&linker, &fp(), fixed_now()).unwrap();
        assert_eq!(params.get("clientId").map(String::as_str), Some("abc123"));
        assert_eq!(params.get("sid").map(String::as_str), Some("s?s&s"));
    }

    #[test]
    fn checksum_accepts_previous_minute_only() {
        let linker = create_linker(&[("id", "1")], &fp(), fixed_now());

        let one_minute_later = fixed_now() + time::Duration::minutes(1);
        assert!(parse_linker(&linker, &fp(), one_minute_later).is_ok());

        let two_minutes_later = fixed_now() + time::Duration::minutes(2);
        assert_eq!(parse_linker(&linker, &fp(), two_minutes_later), Err(LinkerError::ChecksumMismatch));
    }

    #[test]
    fn rejects_other_fingerprint_and_bad_input() {
        let linker = create_linker(&[("id", "1")], &fp(), fixed_now());
        let other = LinkerFingerprint::new("curl/8.0", 0, "nl-NL");
        assert_eq!(parse_linker(&linker, &other, fixed_now()), Err(LinkerError::ChecksumMismatch));

        assert_eq!(parse_linker("", &fp(), fixed_now()), Err(LinkerError::Empty));
        assert!(matches!(parse_linker("2*abc*id*MQ..", &fp(), fixed_now()), Err(LinkerError::UnsupportedVersion(_))));
        assert!(matches!(parse_linker("1*abc", &fp(), fixed_now()), Err(LinkerError::Malformed(_))));
        assert!(matches!(parse_linker("1*abc*id", &fp(), fixed_now()), Err(LinkerError::Malformed(_))));
    }

    #[test]
    fn reader_looks_up_linker_from_page_url() {
        let linker = create_linker(&[("testid", "hello")], &fp(), fixed_now());
        let mut url = Url::parse("https://example.com/landing").unwrap();
        url.query_pairs_mut().append_pair("testlinker", &linker);

        let reader = DefaultLinkerReader::new(url, fp()).with_clock(fixed_now);
        assert_eq!(reader.get("testlinker", "testid").unwrap(), "hello");
        assert_eq!(reader.get("testlinker", "missing").unwrap(), "");
        assert_eq!(reader.get("otherlinker", "testid").unwrap(), "");
    }

    #[test]
    fn reader_treats_blank_linker_as_absent() {
        let url = Url::parse("https://example.com/?testlinker=").unwrap();
        let reader = DefaultLinkerReader::new(url, fp()).with_clock(fixed_now);
        assert_eq!(reader.get("testlinker", "testid").unwrap(), "");
    }

    #[test]
    fn reader_rejects_tampered_linker() {
        let linker = create_linker(&[("testid", "hello")], &fp(), fixed_now());
        let tampered = linker.replace("aGVsbG8.", "d29ybGQ.");
        let mut url = Url::parse("https://example.com/").unwrap();
        url.query_pairs_mut().append_pair("testlinker", &tampered);

        let reader = DefaultLinkerReader::new(url, fp()).with_clock(fixed_now);
        assert_eq!(reader.get("testlinker", "testid"), Err(LinkerError::ChecksumMismatch));
        // cached, and every param of the linker is affected
        assert_eq!(reader.get("testlinker", "other"), Err(LinkerError::ChecksumMismatch));
        assert!(matches!(
            DefaultLinkerReader::new(Url::parse("https://example.com/?l=2*x*a*YQ..").unwrap(), fp()).get("l", "a"),
            Err(LinkerError::UnsupportedVersion(_))
        ));
    }
}
