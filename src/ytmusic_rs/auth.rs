use std::collections::BTreeMap;
use std::path::Path;

use color_eyre::eyre::{OptionExt, Result, WrapErr};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use sha1::{Digest, Sha1};

pub const YTM_ORIGIN: &str = "https://music.youtube.com";

/// Headers that are either recomputed per request or managed by reqwest.
const SKIPPED_HEADERS: [&str; 5] = [
    "authorization",
    "content-length",
    "accept-encoding",
    "host",
    "content-encoding",
];

/// Request headers copied from a logged-in browser session (`browser.json`).
///
/// The file is a flat JSON object of header names to values and must contain
/// the session `cookie`.
#[derive(Debug, Clone)]
pub struct BrowserHeaders {
    headers: BTreeMap<String, String>,
}

impl BrowserHeaders {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).wrap_err_with(|| {
            format!(
                "Failed to read YouTube Music headers file: {}",
                path.display()
            )
        })?;
        Self::from_json(&contents).wrap_err_with(|| {
            format!(
                "Failed to parse YouTube Music headers file: {}",
                path.display()
            )
        })
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let raw: BTreeMap<String, String> = serde_json::from_str(contents)?;
        let headers: BTreeMap<String, String> = raw
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();

        let browser_headers = Self { headers };
        browser_headers
            .sapisid()
            .ok_or_eyre("The cookie header has no SAPISID value; copy the headers from a logged-in session")?;
        Ok(browser_headers)
    }

    fn cookie(&self, name: &str) -> Option<&str> {
        self.headers.get("cookie")?.split(';').find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then_some(value)
        })
    }

    /// The `SAPISID` cookie, falling back to the secure variant.
    pub fn sapisid(&self) -> Option<&str> {
        self.cookie("SAPISID")
            .or_else(|| self.cookie("__Secure-3PAPISID"))
    }

    /// `Authorization` header value for the given unix timestamp.
    pub fn authorization(&self, timestamp: i64) -> Result<String> {
        let sapisid = self.sapisid().ok_or_eyre("Missing SAPISID cookie")?;
        Ok(sapisid_hash(sapisid, YTM_ORIGIN, timestamp))
    }

    /// Full header set for one request.
    pub fn to_header_map(&self, timestamp: i64) -> Result<HeaderMap> {
        let mut map = HeaderMap::new();
        for (name, value) in &self.headers {
            if SKIPPED_HEADERS.contains(&name.as_str()) {
                continue;
            }
            let name = HeaderName::from_bytes(name.as_bytes())
                .wrap_err_with(|| format!("Invalid header name: {name}"))?;
            let value = HeaderValue::from_str(value)
                .wrap_err_with(|| format!("Invalid value for header {name}"))?;
            map.insert(name, value);
        }

        map.insert("origin", HeaderValue::from_static(YTM_ORIGIN));
        map.insert("x-origin", HeaderValue::from_static(YTM_ORIGIN));
        map.insert(
            "authorization",
            HeaderValue::from_str(&self.authorization(timestamp)?)?,
        );
        Ok(map)
    }
}

/// `SAPISIDHASH <ts>_<sha1("<ts> <sapisid> <origin>")>`
pub fn sapisid_hash(sapisid: &str, origin: &str, timestamp: i64) -> String {
    let digest = Sha1::digest(format!("{timestamp} {sapisid} {origin}").as_bytes());
    format!("SAPISIDHASH {timestamp}_{digest:x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADERS: &str = r#"{
        "User-Agent": "Mozilla/5.0",
        "Accept": "*/*",
        "Cookie": "PREF=f6=40000000; SAPISID=abcDEF/ghi; __Secure-3PAPISID=other",
        "X-Goog-AuthUser": "0",
        "Authorization": "SAPISIDHASH stale",
        "Content-Length": "1234"
    }"#;

    #[test]
    fn test_sapisid_hash() {
        assert_eq!(
            sapisid_hash("abcDEF/ghi", YTM_ORIGIN, 1_700_000_000),
            "SAPISIDHASH 1700000000_f05a3b9d7e73d0897df18cf793218762a40e8803"
        );
    }

    #[test]
    fn test_reads_sapisid_from_cookie() {
        let headers = BrowserHeaders::from_json(HEADERS).unwrap();
        assert_eq!(headers.sapisid(), Some("abcDEF/ghi"));
    }

    #[test]
    fn test_falls_back_to_secure_cookie() {
        let headers =
            BrowserHeaders::from_json(r#"{"cookie": "__Secure-3PAPISID=secure"}"#).unwrap();
        assert_eq!(headers.sapisid(), Some("secure"));
    }

    #[test]
    fn test_rejects_headers_without_session_cookie() {
        assert!(BrowserHeaders::from_json(r#"{"cookie": "PREF=1"}"#).is_err());
        assert!(BrowserHeaders::from_json(r#"{"user-agent": "x"}"#).is_err());
    }

    #[test]
    fn test_header_map_recomputes_authorization() {
        let headers = BrowserHeaders::from_json(HEADERS).unwrap();

        let map = headers.to_header_map(1_700_000_000).unwrap();

        assert_eq!(
            map["authorization"],
            "SAPISIDHASH 1700000000_f05a3b9d7e73d0897df18cf793218762a40e8803"
        );
        assert_eq!(map["x-origin"], YTM_ORIGIN);
        assert_eq!(map["x-goog-authuser"], "0");
        assert!(map.get("content-length").is_none());
    }
}
