//! # netjar
//!
//! A persistent cookie jar speaking the Netscape cookie file format used
//! by curl, wget, and most HTTP tooling.
//!
//! `netjar` layers plain-text persistence on top of an in-memory cookie
//! store: it accumulates the cookies set during HTTP exchanges,
//! deduplicates them by their (domain, path, name) identity, detects
//! meaningful changes, and round-trips the whole table to and from
//! `cookies.txt` files. Request-time matching (domain and path rules,
//! secure scheme, expiry) is delegated to a wrapped [`CookieStore`];
//! the jar itself only mirrors write-side state for serialization.
//!
//! ## Features
//!
//! - **Netscape codec**: lossless per-line marshal/unmarshal, including
//!   the `#HttpOnly_` domain marker and subdomain-dot normalization
//! - **Change-triggered auto-persist**: the backing file is rewritten
//!   synchronously whenever a set actually modifies the table
//! - **Bulk IO**: stream a whole cookie file in or out with exact byte
//!   accounting, comments and blank lines skipped
//! - **Pluggable matching**: wrap any [`CookieStore`]; an in-memory
//!   RFC 6265 matcher ([`MemoryStore`]) is the default
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use netjar::{CookieRecord, Jar, JarOptions};
//! use url::Url;
//!
//! fn main() -> Result<(), netjar::JarError> {
//!     let jar = Jar::new(
//!         JarOptions::new()
//!             .auto_write_path("cookies.txt")
//!             .write_header(true),
//!     );
//!
//!     let url = Url::parse("https://example.com/login").unwrap();
//!     jar.set_cookies_from_response(&url, &["sid=abc123; Path=/; Secure"])?;
//!
//!     // cookies.txt has already been rewritten; matching goes through
//!     // the delegate store.
//!     let outgoing: Vec<CookieRecord> = jar.cookies(&url);
//!     println!("sending {} cookies", outgoing.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`jar`] - The persistent jar: merge, change detection, bulk IO
//! - [`netscape`] - The cookie-file line codec
//! - [`store`] - The delegate store trait and in-memory default
//! - [`record`] - The cookie record and its identity key
//! - [`error`] - Error definitions

pub mod error;
pub mod jar;
pub mod netscape;
pub mod record;
pub mod store;

pub use error::JarError;
pub use jar::{Jar, JarOptions};
pub use record::{CookieRecord, EntryKey};
pub use store::{CookieStore, MemoryStore};
