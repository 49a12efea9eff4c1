use thiserror::Error;

/// Errors surfaced by the jar and the Netscape line codec.
///
/// No error is swallowed and nothing retries: a parse failure aborts the
/// bulk read that hit it, a storage failure aborts the write or the
/// auto-persist that hit it, and the caller decides what happens next.
#[derive(Debug, Error)]
pub enum JarError {
    /// A cookie line had fewer than the 7 tab-separated fields the
    /// Netscape format requires.
    #[error("not enough fields in cookie line: got {count}, need 7")]
    NotEnoughFields { count: usize },

    /// A TRUE/FALSE column held something that is not a boolean literal.
    #[error("invalid boolean in {field} field: {value:?}")]
    InvalidBool { field: &'static str, value: String },

    /// The expiry column was not a valid Unix-seconds timestamp.
    #[error("invalid expiry timestamp: {value:?}")]
    InvalidExpiry { value: String },

    /// A bulk read failed partway through a file. `bytes_read` counts
    /// everything consumed up to and including the failing line; records
    /// decoded from earlier lines have already been applied.
    #[error("cookie file parse failed after {bytes_read} bytes")]
    Parse {
        bytes_read: u64,
        #[source]
        source: Box<JarError>,
    },

    /// Opening, creating, or writing the persistence file failed. When
    /// auto-persist is enabled the in-memory table has already been
    /// updated at this point; memory stays authoritative and disk lags
    /// until a later write succeeds.
    #[error("cookie file i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_enough_fields_names_the_count() {
        let err = JarError::NotEnoughFields { count: 3 };
        assert_eq!(
            err.to_string(),
            "not enough fields in cookie line: got 3, need 7"
        );
    }

    #[test]
    fn parse_error_reports_bytes_and_source() {
        let err = JarError::Parse {
            bytes_read: 42,
            source: Box::new(JarError::InvalidExpiry {
                value: "soon".to_string(),
            }),
        };
        assert!(err.to_string().contains("42"));
        let source = std::error::Error::source(&err).expect("source");
        assert!(source.to_string().contains("soon"));
    }
}
