//! The delegate store seam: request-URL-scoped cookie matching.
//!
//! The jar itself never matches cookies against a request. It forwards
//! every batch to a [`CookieStore`] and keeps its own table purely for
//! serialization. [`MemoryStore`] is the default delegate used when no
//! other store is configured.

use dashmap::DashMap;
use time::OffsetDateTime;
use url::Url;

use crate::netscape::has_leading_dot;
use crate::record::CookieRecord;

/// A request-URL-aware cookie store the jar can wrap.
///
/// Implementations own all RFC 6265 matching semantics: domain and path
/// matching, the secure-scheme check, and expiry-based filtering.
pub trait CookieStore: Send + Sync {
    /// Store a batch of cookies received in the context of `url`.
    fn set_cookies(&self, url: &Url, cookies: Vec<CookieRecord>);

    /// Cookies to send on a request to `url`.
    fn cookies(&self, url: &Url) -> Vec<CookieRecord>;
}

/// In-memory matching store, bucketed by registrable domain.
///
/// Cookies are keyed by their dot-stripped domain; a set replaces any
/// existing cookie with the same name and path in that bucket. Reads walk
/// the request host and its parent domains and apply domain, path,
/// secure, and expiry checks. Subdomain inclusion is read from the stored
/// domain's leading dot.
pub struct MemoryStore {
    buckets: DashMap<String, Vec<CookieRecord>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            buckets: DashMap::new(),
        }
    }

    /// Total number of cookies currently held.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(|b| b.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop everything.
    pub fn clear(&self) {
        self.buckets.clear();
    }
}

impl CookieStore for MemoryStore {
    fn set_cookies(&self, url: &Url, cookies: Vec<CookieRecord>) {
        for mut cookie in cookies {
            if cookie.domain.is_empty() {
                let Some(host) = url.host_str() else { continue };
                cookie.domain = host.to_lowercase();
            }
            if cookie.path.is_empty() {
                cookie.path = "/".to_string();
            }

            let bucket_key = cookie.domain.trim_start_matches('.').to_string();
            let mut bucket = self.buckets.entry(bucket_key).or_default();
            bucket.retain(|c| c.name != cookie.name || c.path != cookie.path);
            bucket.push(cookie);
        }
    }

    fn cookies(&self, url: &Url) -> Vec<CookieRecord> {
        let host = url.host_str().unwrap_or("");
        let now = OffsetDateTime::now_utc();
        let mut result = Vec::new();

        for domain in matching_domains(host) {
            let Some(bucket) = self.buckets.get(&domain) else {
                continue;
            };
            for cookie in bucket.iter() {
                let host_only = !has_leading_dot(&cookie.domain);
                if !domain_matches(&cookie.domain, host, host_only) {
                    continue;
                }
                if !path_matches(&cookie.path, url.path()) {
                    continue;
                }
                if cookie.secure && url.scheme() != "https" {
                    continue;
                }
                if cookie.is_expired(now) {
                    continue;
                }
                result.push(cookie.clone());
            }
        }

        // RFC 6265 ordering: longest path first.
        result.sort_by(|a, b| b.path.len().cmp(&a.path.len()));
        result
    }
}

/// RFC 6265 domain matching. Host-only cookies require an exact host
/// match; domain cookies suffix-match on a label boundary.
fn domain_matches(cookie_domain: &str, request_host: &str, host_only: bool) -> bool {
    if host_only {
        return cookie_domain.eq_ignore_ascii_case(request_host);
    }

    let cookie_domain = cookie_domain.trim_start_matches('.');
    if request_host.eq_ignore_ascii_case(cookie_domain) {
        return true;
    }

    if request_host.len() > cookie_domain.len() {
        let suffix = &request_host[request_host.len() - cookie_domain.len()..];
        if suffix.eq_ignore_ascii_case(cookie_domain) {
            let boundary = request_host
                .chars()
                .nth(request_host.len() - cookie_domain.len() - 1);
            return boundary == Some('.');
        }
    }

    false
}

/// RFC 6265 path matching.
fn path_matches(cookie_path: &str, request_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }
    if request_path.starts_with(cookie_path) {
        if cookie_path.ends_with('/') {
            return true;
        }
        return request_path.chars().nth(cookie_path.len()) == Some('/');
    }
    false
}

/// The host itself plus every parent domain that could hold a matching
/// bucket (for "a.b.example.com": "b.example.com", "example.com").
fn matching_domains(host: &str) -> Vec<String> {
    let mut domains = vec![host.to_string()];
    let labels: Vec<&str> = host.split('.').collect();
    for i in 1..labels.len().saturating_sub(1) {
        domains.push(labels[i..].join("."));
    }
    domains
}
