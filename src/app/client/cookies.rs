//! Cookie snapshots shared between the discovery session and workers
//!
//! Workers never share the master session's jar. Every session writes through
//! a [`SessionJar`], which keeps each accepted `Set-Cookie` line with the URL
//! that set it. A snapshot of those lines is taken once, after warm-up and
//! manifest discovery, and replayed into every worker's jar, so path, domain
//! and host scoping survive the copy.

use std::sync::{Mutex, PoisonError};

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use tracing::debug;
use url::Url;

/// One cookie as it was set, with the URL that set it
#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredCookie {
    name: String,
    value: String,
    set_cookie: String,
    /// `None` for cookies injected without a response (replayed against the archive)
    origin: Option<Url>,
}

impl StoredCookie {
    fn parse(set_cookie: &str, origin: Option<Url>) -> Option<Self> {
        let pair = set_cookie.split(';').next()?;
        let (name, value) = pair.trim().split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            value: value.trim().to_string(),
            set_cookie: set_cookie.to_string(),
            origin,
        })
    }

    fn host(&self) -> &str {
        self.origin
            .as_ref()
            .and_then(|url| url.host_str())
            .unwrap_or("")
    }

    /// Explicit `Path` attribute, else the directory of the setting URL
    fn path(&self) -> String {
        let explicit = self.set_cookie.split(';').skip(1).find_map(|attribute| {
            let (key, value) = attribute.trim().split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("path")
                .then(|| value.trim().to_string())
        });
        explicit.unwrap_or_else(|| match &self.origin {
            Some(url) => match url.path().rfind('/') {
                Some(0) | None => "/".to_string(),
                Some(end) => url.path()[..end].to_string(),
            },
            None => "/".to_string(),
        })
    }

    fn same_slot(&self, other: &Self) -> bool {
        self.name == other.name && self.host() == other.host() && self.path() == other.path()
    }
}

/// Immutable copy of every cookie a session has accepted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieSnapshot {
    cookies: Vec<StoredCookie>,
}

impl CookieSnapshot {
    /// Parse a `Cookie` request header (`a=1; b=2`) into site-wide cookies
    pub fn from_header(header: &str) -> Self {
        let mut snapshot = Self::default();
        for pair in header.split(';') {
            let Some((name, value)) = pair.trim().split_once('=') else {
                continue;
            };
            let set_cookie = format!("{}={}; Path=/", name.trim(), value.trim());
            if let Some(cookie) = StoredCookie::parse(&set_cookie, None) {
                snapshot.upsert(cookie);
            }
        }
        snapshot
    }

    fn upsert(&mut self, cookie: StoredCookie) {
        self.cookies.retain(|existing| !existing.same_slot(&cookie));
        self.cookies.push(cookie);
    }

    /// Replay every cookie into `jar`; `fallback` stands in for a missing origin
    pub fn seed(&self, jar: &Jar, fallback: &Url) {
        for cookie in &self.cookies {
            let origin = cookie.origin.as_ref().unwrap_or(fallback);
            jar.add_cookie_str(&cookie.set_cookie, origin);
        }
    }

    /// Value of the most recently set cookie called `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .rev()
            .find(|cookie| cookie.name == name)
            .map(|cookie| cookie.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

/// Cookie store of one session: a reqwest [`Jar`] plus a record of what it accepted
#[derive(Debug, Default)]
pub struct SessionJar {
    jar: Jar,
    accepted: Mutex<CookieSnapshot>,
}

impl SessionJar {
    /// A jar that starts as a copy of `snapshot`
    pub fn seeded(snapshot: &CookieSnapshot, fallback: &Url) -> Self {
        let jar = Jar::default();
        snapshot.seed(&jar, fallback);
        Self {
            jar,
            accepted: Mutex::new(snapshot.clone()),
        }
    }

    /// Store a `Set-Cookie` line as if `url` had sent it
    pub fn add_cookie_str(&self, set_cookie: &str, url: &Url) {
        self.record(set_cookie, url);
        self.jar.add_cookie_str(set_cookie, url);
    }

    /// Copy of everything accepted so far
    pub fn snapshot(&self) -> CookieSnapshot {
        self.accepted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, set_cookie: &str, url: &Url) {
        if let Some(cookie) = StoredCookie::parse(set_cookie, Some(url.clone())) {
            debug!("Accepted cookie {} from {}", cookie.name, url);
            self.accepted
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .upsert(cookie);
        }
    }
}

impl CookieStore for SessionJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let headers: Vec<HeaderValue> = cookie_headers.cloned().collect();
        for value in &headers {
            if let Ok(set_cookie) = value.to_str() {
                self.record(set_cookie, url);
            }
        }
        self.jar.set_cookies(&mut headers.iter(), url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.jar.cookies(url)
    }
}
