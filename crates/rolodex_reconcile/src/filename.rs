//! Legacy `{subject}_{millis}_{hash8}.{ext}` filenames.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

static LEGACY_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([^/]+)_(\d{13})_([0-9a-f]{8})\.([a-z0-9]+)$")
        .expect("Valid legacy filename regex")
});

/// Result of parsing a legacy filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedFilename {
    /// The name follows the legacy scheme
    Parsed {
        /// Subject handle (or numeric id for newer keys)
        subject: String,
        /// Capture time in epoch milliseconds
        timestamp_millis: i64,
        /// Eight hex digits, lowercased
        short_hash: String,
        /// Extension, lowercased
        extension: String,
    },
    /// Anything else
    Unparsed,
}

impl ParsedFilename {
    /// Capture time, when parsed and representable.
    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Parsed {
                timestamp_millis, ..
            } => DateTime::from_timestamp_millis(*timestamp_millis),
            Self::Unparsed => None,
        }
    }
}

/// Parse a bare filename (no directories).
pub fn parse_legacy_filename(name: &str) -> ParsedFilename {
    let Some(captures) = LEGACY_FILENAME.captures(name) else {
        return ParsedFilename::Unparsed;
    };
    let Ok(timestamp_millis) = captures[2].parse::<i64>() else {
        return ParsedFilename::Unparsed;
    };

    ParsedFilename::Parsed {
        subject: captures[1].to_string(),
        timestamp_millis,
        short_hash: captures[3].to_ascii_lowercase(),
        extension: captures[4].to_ascii_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_legacy_name() {
        let parsed = parse_legacy_filename("jane_doe_1700000000000_ABCDEF12.JPG");
        assert_eq!(
            parsed,
            ParsedFilename::Parsed {
                subject: "jane_doe".into(),
                timestamp_millis: 1_700_000_000_000,
                short_hash: "abcdef12".into(),
                extension: "jpg".into(),
            }
        );
        assert_eq!(
            parsed.captured_at().map(|t| t.timestamp_millis()),
            Some(1_700_000_000_000)
        );
    }

    #[test]
    fn test_rejects_other_shapes() {
        for name in [
            "photo.jpg",
            "jane_170000000000_abcdef12.jpg",
            "jane_1700000000000_abcdef1.jpg",
            "jane_1700000000000_abcdefgh.jpg",
            "_1700000000000_abcdef12.jpg",
            "jane_1700000000000_abcdef12",
            "jane_1700000000000_abcdef12.jp-g",
            "dir/jane_1700000000000_abcdef12.jpg",
        ] {
            assert_eq!(parse_legacy_filename(name), ParsedFilename::Unparsed, "{}", name);
        }
        assert_eq!(ParsedFilename::Unparsed.captured_at(), None);
    }
}
