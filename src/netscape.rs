//! Line codec for the Netscape cookie file format.
//!
//! One cookie per line, 7 tab-separated fields:
//! `domain`, `TRUE|FALSE` (subdomains), `path`, `TRUE|FALSE` (secure),
//! `expires` (Unix seconds), `name`, `value`. Lines starting with `#` are
//! comments, except that a domain prefixed with `#HttpOnly_` marks an
//! http-only cookie. See <https://curl.se/docs/http-cookies.html>.

use time::OffsetDateTime;

use crate::error::JarError;
use crate::record::CookieRecord;

/// Marker prepended to the domain field of http-only cookies.
pub const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";

/// The descriptive header emitted at the top of a cookie file when header
/// emission is enabled: two comment lines and a blank line.
pub const FILE_HEADER: &str =
    "# Netscape HTTP Cookie File\n# https://curl.se/docs/http-cookies.html\n\n";

/// Whether a domain string is subdomain-inclusive.
pub fn has_leading_dot(domain: &str) -> bool {
    domain.starts_with('.')
}

/// Force a domain string to agree with the subdomain-inclusion flag:
/// add the leading dot when the flag is set, strip it when it is not.
pub fn normalize_dot(domain: &str, include_subdomains: bool) -> String {
    match (include_subdomains, has_leading_dot(domain)) {
        (true, false) => format!(".{domain}"),
        (false, true) => domain[1..].to_string(),
        _ => domain.to_string(),
    }
}

/// Serialize one cookie to a Netscape cookie line, without a terminator.
///
/// The subdomain column is derived from the domain's leading dot. Name
/// and value are written raw; embedded tabs or newlines corrupt the line,
/// a limitation of the format itself.
pub fn marshal(cookie: &CookieRecord) -> String {
    let include_subdomains = if has_leading_dot(&cookie.domain) {
        "TRUE"
    } else {
        "FALSE"
    };
    let domain = if cookie.http_only {
        format!("{HTTP_ONLY_PREFIX}{}", cookie.domain)
    } else {
        cookie.domain.clone()
    };
    let path = if cookie.path.is_empty() {
        "/"
    } else {
        cookie.path.as_str()
    };
    let secure = if cookie.secure { "TRUE" } else { "FALSE" };

    format!(
        "{domain}\t{include_subdomains}\t{path}\t{secure}\t{}\t{}\t{}",
        cookie.expires.unix_timestamp(),
        cookie.name,
        cookie.value
    )
}

/// Parse one line of a Netscape cookie file.
///
/// Comments and empty lines yield `Ok(None)`. A line with fewer than 7
/// fields or an unparseable boolean/expiry column is an error for the
/// whole line. The subdomain column is authoritative: the returned
/// record's domain is re-normalized to match it regardless of what the
/// raw domain field carried.
pub fn unmarshal(line: &str) -> Result<Option<CookieRecord>, JarError> {
    if line.is_empty() || (line.starts_with('#') && !line.starts_with(HTTP_ONLY_PREFIX)) {
        return Ok(None);
    }

    let fields: Vec<&str> = line.splitn(7, '\t').collect();
    if fields.len() < 7 {
        return Err(JarError::NotEnoughFields {
            count: fields.len(),
        });
    }

    let include_subdomains = parse_bool("subdomains", fields[1])?;
    let secure = parse_bool("secure", fields[3])?;
    let secs: i64 = fields[4].parse().map_err(|_| JarError::InvalidExpiry {
        value: fields[4].to_string(),
    })?;
    let expires =
        OffsetDateTime::from_unix_timestamp(secs).map_err(|_| JarError::InvalidExpiry {
            value: fields[4].to_string(),
        })?;

    let (raw_domain, http_only) = match fields[0].strip_prefix(HTTP_ONLY_PREFIX) {
        Some(rest) => (rest, true),
        None => (fields[0], false),
    };

    Ok(Some(CookieRecord {
        name: fields[5].to_string(),
        value: fields[6].to_string(),
        domain: normalize_dot(raw_domain, include_subdomains),
        path: fields[2].to_string(),
        secure,
        http_only,
        expires,
    }))
}

fn parse_bool(field: &'static str, value: &str) -> Result<bool, JarError> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(JarError::InvalidBool {
            field,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_cookie() -> CookieRecord {
        CookieRecord {
            name: "session".to_string(),
            value: "abc123".to_string(),
            domain: ".example.com".to_string(),
            path: "/app".to_string(),
            secure: true,
            http_only: false,
            expires: OffsetDateTime::from_unix_timestamp(1735689600).unwrap(),
        }
    }

    #[test]
    fn marshal_basic() {
        let line = marshal(&sample_cookie());
        assert_eq!(
            line,
            ".example.com\tTRUE\t/app\tTRUE\t1735689600\tsession\tabc123"
        );
    }

    #[test]
    fn marshal_http_only_prefixes_domain() {
        let mut cookie = sample_cookie();
        cookie.http_only = true;
        cookie.domain = "example.com".to_string();
        let line = marshal(&cookie);
        assert!(line.starts_with("#HttpOnly_example.com\tFALSE\t"));
    }

    #[test]
    fn marshal_empty_path_becomes_root() {
        let mut cookie = sample_cookie();
        cookie.path = String::new();
        let line = marshal(&cookie);
        assert_eq!(line.split('\t').nth(2), Some("/"));
    }

    #[test]
    fn marshal_negative_expiry() {
        let mut cookie = sample_cookie();
        cookie.expires = OffsetDateTime::from_unix_timestamp(-3600).unwrap();
        let line = marshal(&cookie);
        assert_eq!(line.split('\t').nth(4), Some("-3600"));
    }

    #[test]
    fn round_trip() {
        let cookie = sample_cookie();
        let decoded = unmarshal(&marshal(&cookie)).unwrap().unwrap();
        assert_eq!(decoded, cookie);
    }

    #[test]
    fn round_trip_http_only() {
        let mut cookie = sample_cookie();
        cookie.http_only = true;
        let decoded = unmarshal(&marshal(&cookie)).unwrap().unwrap();
        assert_eq!(decoded, cookie);
    }

    #[test]
    fn empty_line_is_skipped() {
        assert!(unmarshal("").unwrap().is_none());
    }

    #[test]
    fn comment_line_is_skipped() {
        assert!(unmarshal("# anything").unwrap().is_none());
        assert!(unmarshal("# Netscape HTTP Cookie File").unwrap().is_none());
    }

    #[test]
    fn http_only_marker_is_not_a_comment() {
        let decoded = unmarshal("#HttpOnly_example.com\tFALSE\t/\tFALSE\t0\ta\tb")
            .unwrap()
            .unwrap();
        assert_eq!(decoded.domain, "example.com");
        assert!(decoded.http_only);
    }

    #[test]
    fn subdomain_flag_adds_missing_dot() {
        let decoded = unmarshal("example.com\tTRUE\t/\tFALSE\t0\ta\tb")
            .unwrap()
            .unwrap();
        assert_eq!(decoded.domain, ".example.com");
    }

    #[test]
    fn subdomain_flag_strips_stray_dot() {
        let decoded = unmarshal(".example.com\tFALSE\t/\tFALSE\t0\ta\tb")
            .unwrap()
            .unwrap();
        assert_eq!(decoded.domain, "example.com");
    }

    #[test]
    fn not_enough_fields_reports_count() {
        match unmarshal("a\tb\tc") {
            Err(JarError::NotEnoughFields { count }) => assert_eq!(count, 3),
            other => panic!("expected NotEnoughFields, got {other:?}"),
        }
    }

    #[test]
    fn bad_boolean_is_fatal() {
        let err = unmarshal("example.com\tYES\t/\tFALSE\t0\ta\tb").unwrap_err();
        assert!(matches!(err, JarError::InvalidBool { field: "subdomains", .. }));
    }

    #[test]
    fn bad_expiry_is_fatal() {
        let err = unmarshal("example.com\tTRUE\t/\tFALSE\tsoon\ta\tb").unwrap_err();
        assert!(matches!(err, JarError::InvalidExpiry { .. }));
    }

    #[test]
    fn value_keeps_embedded_tabs() {
        // splitn(7) leaves everything after the sixth tab in the value.
        let decoded = unmarshal("example.com\tFALSE\t/\tFALSE\t0\ta\tb\tc")
            .unwrap()
            .unwrap();
        assert_eq!(decoded.value, "b\tc");
    }

    #[test]
    fn dot_helpers_are_inverse() {
        assert_eq!(normalize_dot("example.com", true), ".example.com");
        assert_eq!(normalize_dot(".example.com", false), "example.com");
        assert_eq!(normalize_dot(".example.com", true), ".example.com");
        assert_eq!(normalize_dot("example.com", false), "example.com");
        assert!(has_leading_dot(&normalize_dot("example.com", true)));
        assert!(!has_leading_dot(&normalize_dot(".example.com", false)));
    }
}
