//! The persistent jar: deduplicated cookie table, change detection, and
//! Netscape-file bulk IO layered over a delegate [`CookieStore`].

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use url::Url;

use crate::error::JarError;
use crate::netscape::{self, FILE_HEADER};
use crate::record::{CookieRecord, EntryKey};
use crate::store::{CookieStore, MemoryStore};

type EntryTable = HashMap<EntryKey, CookieRecord>;

/// Construction options for [`Jar`].
#[derive(Default)]
pub struct JarOptions {
    store: Option<Arc<dyn CookieStore>>,
    auto_write_path: Option<PathBuf>,
    write_header: bool,
}

impl JarOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delegate store to wrap. Defaults to a fresh [`MemoryStore`].
    pub fn store(mut self, store: Arc<dyn CookieStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Enable auto-persist: rewrite this file synchronously on every
    /// call that actually modifies the table.
    pub fn auto_write_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.auto_write_path = Some(path.into());
        self
    }

    /// Emit the descriptive two-comment-line header when writing files.
    pub fn write_header(mut self, on: bool) -> Self {
        self.write_header = on;
        self
    }
}

/// A cookie jar that mirrors every set cookie into an authoritative
/// (domain, path, name)-keyed table for Netscape-file persistence, while
/// delegating all request-time matching to a wrapped [`CookieStore`].
///
/// The table holds the most recently set record per identity key. When an
/// auto-write path is configured, any call that changes the table rewrites
/// that file in full before returning; the write happens under the table
/// lock, so concurrent readers and writers never see a torn file. Memory
/// is authoritative: if a persist fails, disk lags until a later write
/// succeeds.
pub struct Jar {
    store: Arc<dyn CookieStore>,
    auto_write_path: Option<PathBuf>,
    write_header: bool,
    entries: Mutex<EntryTable>,
}

impl Default for Jar {
    fn default() -> Self {
        Self::new(JarOptions::default())
    }
}

impl Jar {
    pub fn new(options: JarOptions) -> Self {
        Self {
            store: options
                .store
                .unwrap_or_else(|| Arc::new(MemoryStore::new())),
            auto_write_path: options.auto_write_path,
            write_header: options.write_header,
            entries: Mutex::new(EntryTable::new()),
        }
    }

    /// Store a batch of cookies received in the context of `url`.
    ///
    /// The batch goes to the delegate first, then into the table under
    /// the lock. If anything changed per the modification policy (new
    /// key, or a differing secure flag, expiry, or value) and auto-write
    /// is configured, the file is rewritten before this returns; a
    /// storage failure is fatal to the call and leaves disk stale.
    ///
    /// The delegate update happens outside the table lock, so a
    /// concurrent [`cookies`](Self::cookies) call can observe delegate
    /// state slightly ahead of the persisted table.
    pub fn set_cookies(&self, url: &Url, cookies: Vec<CookieRecord>) -> Result<(), JarError> {
        self.store.set_cookies(url, cookies.clone());

        let mut entries = self.lock_entries();
        let mut modified = false;
        for cookie in cookies {
            modified |= put_cookie(&mut entries, cookie);
        }
        if modified {
            self.auto_write(&entries)?;
        }
        Ok(())
    }

    /// Parse `Set-Cookie` header values and store the resulting batch.
    /// Headers that do not parse are skipped, not errors.
    pub fn set_cookies_from_response(
        &self,
        url: &Url,
        set_cookie_headers: &[&str],
    ) -> Result<(), JarError> {
        let mut cookies = Vec::with_capacity(set_cookie_headers.len());
        for header in set_cookie_headers {
            match CookieRecord::parse_set_cookie(header, url) {
                Some(cookie) => cookies.push(cookie),
                None => {
                    tracing::debug!(header = %header, "ignoring unparseable Set-Cookie header");
                }
            }
        }
        if cookies.is_empty() {
            return Ok(());
        }
        self.set_cookies(url, cookies)
    }

    /// Cookies to send on a request to `url`. Pure delegation; the
    /// persistence table is never consulted on the read path.
    pub fn cookies(&self, url: &Url) -> Vec<CookieRecord> {
        self.store.cookies(url)
    }

    /// Read a Netscape cookie file from `reader`, merging every record
    /// into the table (last occurrence of a key wins, in file order) and
    /// re-injecting the records into the delegate grouped by origin.
    ///
    /// Returns the number of bytes consumed, line terminators included.
    /// On a parse failure the read aborts: records decoded from earlier
    /// lines have already taken effect, and the returned
    /// [`JarError::Parse`] carries the byte count consumed through the
    /// failing line.
    pub fn read_from<R: BufRead>(&self, mut reader: R) -> Result<u64, JarError> {
        let mut bytes_read: u64 = 0;
        let mut records = Vec::new();
        let mut line = String::new();

        loop {
            line.clear();
            let n = reader.read_line(&mut line)?;
            if n == 0 {
                break;
            }
            bytes_read += n as u64;

            match netscape::unmarshal(line.trim_end_matches(['\r', '\n'])) {
                Ok(Some(cookie)) => records.push(cookie),
                Ok(None) => {}
                Err(err) => {
                    self.merge_records(records);
                    return Err(JarError::Parse {
                        bytes_read,
                        source: Box::new(err),
                    });
                }
            }
        }

        let count = records.len();
        self.merge_records(records);
        tracing::debug!(bytes = bytes_read, records = count, "cookie file read");
        Ok(bytes_read)
    }

    /// Serialize the full table to `writer`, one line per entry in
    /// unspecified order, preceded by the header when enabled. Returns
    /// the cumulative byte count written; the first IO error aborts.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<u64, JarError> {
        let entries = self.lock_entries();
        write_entries(&entries, &mut writer, self.write_header)
    }

    /// Open `path` and [`read_from`](Self::read_from) it.
    pub fn load_from_path(&self, path: impl AsRef<Path>) -> Result<u64, JarError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let bytes = self.read_from(BufReader::new(file))?;
        tracing::debug!(path = %path.display(), bytes, "cookie file loaded");
        Ok(bytes)
    }

    /// Create or truncate `path` and serialize the full table to it.
    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<u64, JarError> {
        let entries = self.lock_entries();
        self.persist(&entries, path.as_ref())
    }

    fn merge_records(&self, records: Vec<CookieRecord>) {
        let mut entries = self.lock_entries();
        let mut modified = false;
        for cookie in &records {
            modified |= put_cookie(&mut entries, cookie.clone());
        }
        tracing::trace!(records = records.len(), modified, "merged records into table");

        for (origin, batch) in group_by_origin(records) {
            let Some(url) = origin.to_url() else {
                tracing::debug!(domain = %origin.domain, "skipping unaddressable origin group");
                continue;
            };
            self.store.set_cookies(&url, batch);
        }
    }

    fn auto_write(&self, entries: &EntryTable) -> Result<(), JarError> {
        let Some(path) = &self.auto_write_path else {
            return Ok(());
        };
        let bytes = self.persist(entries, path)?;
        tracing::debug!(path = %path.display(), bytes, "cookie file rewritten");
        Ok(())
    }

    fn persist(&self, entries: &EntryTable, path: &Path) -> Result<u64, JarError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        let bytes = write_entries(entries, &mut writer, self.write_header)?;
        writer.flush()?;
        Ok(bytes)
    }

    // Critical sections are panic-free, so a poisoned table is still
    // structurally valid.
    fn lock_entries(&self) -> MutexGuard<'_, EntryTable> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Overwrite the table slot for this cookie's identity key. Returns
/// whether the set counts as a modification: a new key, or a prior record
/// differing in secure flag, expiry, or value. An http-only flip on an
/// otherwise identical cookie is deliberately not a modification.
fn put_cookie(entries: &mut EntryTable, cookie: CookieRecord) -> bool {
    let key = cookie.key();
    let modified = match entries.get(&key) {
        Some(prior) => {
            prior.secure != cookie.secure
                || prior.expires != cookie.expires
                || prior.value != cookie.value
        }
        None => true,
    };
    entries.insert(key, cookie);
    modified
}

fn write_entries<W: Write>(
    entries: &EntryTable,
    writer: &mut W,
    header: bool,
) -> Result<u64, JarError> {
    let mut written: u64 = 0;
    if header {
        writer.write_all(FILE_HEADER.as_bytes())?;
        written += FILE_HEADER.len() as u64;
    }
    for cookie in entries.values() {
        let line = netscape::marshal(cookie);
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        written += line.len() as u64 + 1;
    }
    Ok(written)
}

/// Key of one synthetic origin reconstructed from raw file records: the
/// delegate only accepts URL-scoped batches, so bulk reads regroup by
/// scheme (from the secure flag), dot-stripped host, and path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct OriginKey {
    secure: bool,
    domain: String,
    path: String,
}

impl OriginKey {
    fn to_url(&self) -> Option<Url> {
        let scheme = if self.secure { "https" } else { "http" };
        let mut url = Url::parse(&format!("{scheme}://{}/", self.domain)).ok()?;
        url.set_path(&self.path);
        Some(url)
    }
}

/// Group records by origin, preserving file order within each group.
fn group_by_origin(records: Vec<CookieRecord>) -> HashMap<OriginKey, Vec<CookieRecord>> {
    let mut groups: HashMap<OriginKey, Vec<CookieRecord>> = HashMap::new();
    for cookie in records {
        let key = OriginKey {
            secure: cookie.secure,
            domain: cookie.domain.trim_start_matches('.').to_string(),
            path: cookie.path.clone(),
        };
        groups.entry(key).or_default().push(cookie);
    }
    groups
}
