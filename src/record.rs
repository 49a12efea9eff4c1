use time::OffsetDateTime;
use url::Url;

/// A single cookie as the jar stores and persists it.
///
/// This is the seven-field unit the Netscape file format carries. Expiry
/// is advisory data passed through for the delegate store and the file
/// format; the jar itself never evicts on it. A `domain` with a leading
/// dot means the cookie applies to subdomains as well; the dot is the
/// sole signal of that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    pub expires: OffsetDateTime,
}

/// Identity of one logical cookie slot: the (domain, path, name) triple
/// exactly as stored, dot included or excluded as given. A newer record
/// with the same key always replaces the older one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryKey {
    pub domain: String,
    pub path: String,
    pub name: String,
}

impl CookieRecord {
    /// A record with the given name and value, everything else zeroed:
    /// empty domain and path, flags off, expiry at the Unix epoch.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: String::new(),
            path: String::new(),
            secure: false,
            http_only: false,
            expires: OffsetDateTime::UNIX_EPOCH,
        }
    }

    /// The identity key this record occupies in the jar's table.
    pub fn key(&self) -> EntryKey {
        EntryKey {
            domain: self.domain.clone(),
            path: self.path.clone(),
            name: self.name.clone(),
        }
    }

    /// Whether the advisory expiry has passed. An epoch expiry marks a
    /// session cookie and never expires.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires != OffsetDateTime::UNIX_EPOCH && self.expires < now
    }

    /// Parse one `Set-Cookie` header value into a record, resolving the
    /// domain and path against the request URL.
    ///
    /// An explicit `Domain=` attribute yields a subdomain-inclusive
    /// domain (leading dot); no attribute means host-only (no dot).
    /// Expiry comes from `Expires` or `Max-Age`, falling back to the
    /// epoch (session cookie). Returns `None` for headers the `cookie`
    /// crate cannot parse or URLs without a host.
    pub fn parse_set_cookie(header: &str, url: &Url) -> Option<Self> {
        let parsed = cookie::Cookie::parse(header).ok()?;

        let domain = match parsed.domain() {
            Some(d) => {
                let d = d.trim_start_matches('.').to_lowercase();
                format!(".{d}")
            }
            None => url.host_str()?.to_lowercase(),
        };

        let expires = parsed
            .expires()
            .and_then(|e| e.datetime())
            .or_else(|| parsed.max_age().map(|age| OffsetDateTime::now_utc() + age))
            .unwrap_or(OffsetDateTime::UNIX_EPOCH);

        Some(Self {
            name: parsed.name().to_string(),
            value: parsed.value().to_string(),
            domain,
            path: parsed.path().unwrap_or("/").to_string(),
            secure: parsed.secure().unwrap_or(false),
            http_only: parsed.http_only().unwrap_or(false),
            expires,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_set_cookie_host_only() {
        let url = Url::parse("https://Example.com/login").unwrap();
        let record = CookieRecord::parse_set_cookie("sid=abc123; Path=/; Secure", &url).unwrap();

        assert_eq!(record.name, "sid");
        assert_eq!(record.value, "abc123");
        assert_eq!(record.domain, "example.com");
        assert_eq!(record.path, "/");
        assert!(record.secure);
        assert!(!record.http_only);
        assert_eq!(record.expires, OffsetDateTime::UNIX_EPOCH);
    }

    #[test]
    fn parse_set_cookie_domain_attribute_gets_dot() {
        let url = Url::parse("https://www.example.com/").unwrap();
        let record =
            CookieRecord::parse_set_cookie("t=1; Domain=Example.com; HttpOnly", &url).unwrap();

        assert_eq!(record.domain, ".example.com");
        assert!(record.http_only);
    }

    #[test]
    fn parse_set_cookie_rejects_garbage() {
        let url = Url::parse("https://example.com/").unwrap();
        assert!(CookieRecord::parse_set_cookie("", &url).is_none());
    }

    #[test]
    fn epoch_expiry_never_expires() {
        let record = CookieRecord::new("a", "b");
        assert!(!record.is_expired(OffsetDateTime::now_utc()));
    }

    #[test]
    fn past_expiry_expires() {
        let mut record = CookieRecord::new("a", "b");
        record.expires = OffsetDateTime::from_unix_timestamp(1).unwrap();
        assert!(record.is_expired(OffsetDateTime::now_utc()));
    }

    #[test]
    fn key_preserves_domain_exactly() {
        let mut record = CookieRecord::new("a", "b");
        record.domain = ".example.com".to_string();
        record.path = "/p".to_string();
        let key = record.key();
        assert_eq!(key.domain, ".example.com");
        assert_eq!(key.path, "/p");
        assert_eq!(key.name, "a");
    }
}
