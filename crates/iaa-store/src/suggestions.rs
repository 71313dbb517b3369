//! Line-oriented suggestions file, guarded by the server identity.
//!
//! Format (UTF-8, `\n` line endings, tab delimited):
//! ```text
//! serverUUID	239-239-239
//! 111	1	any reason
//! 112	2	any reason 2
//! ```
//!
//! The header is checked before any record line is decoded. A file written
//! under another identity reads as empty. Record lines split on the first
//! two tabs only, so a reason may itself contain tabs.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, warn};

use iaa_core::error::{AssignerError, Result};
use iaa_core::identity::{ServerIdentity, ServerSettings};
use iaa_core::record::ResponsibilityRecord;

use crate::fsutil::write_atomic;

/// Key of the identity header line.
pub const IDENTITY_HEADER: &str = "serverUUID";

/// Field delimiter for the header and record lines.
pub const FIELD_DELIMITER: char = '\t';

/// Reads and writes suggestions files for one server installation.
#[derive(Debug)]
pub struct SuggestionsStore<S> {
    settings: S,
}

impl<S: ServerSettings> SuggestionsStore<S> {
    pub fn new(settings: S) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    /// Replace the file at `path` with `records`, in order.
    ///
    /// The content is written to a temporary file next to `path` and renamed
    /// over it, so readers see either the old or the new content. The parent
    /// directory must exist.
    ///
    /// # Errors
    ///
    /// Returns [`AssignerError::InvalidRecord`] if a record contains a line
    /// terminator (or a tab in one of its ids), and [`AssignerError::Config`]
    /// if the server identity contains one; nothing is written then.
    /// Returns [`AssignerError::Io`] if the file cannot be written.
    pub fn write(&self, path: &Path, records: &[ResponsibilityRecord]) -> Result<()> {
        for record in records {
            check_record(record)?;
        }

        let identity = self.settings.server_identity();
        if identity.as_str().contains(['\n', '\r']) {
            return Err(AssignerError::Config(format!(
                "server identity {:?} contains a line break",
                identity.as_str()
            )));
        }
        let content = encode(&identity, records);
        write_atomic(path, content.as_bytes())?;

        debug!(path = %path.display(), count = records.len(), "wrote suggestions");
        Ok(())
    }

    /// Records stored at `path`, in file order.
    ///
    /// A missing or empty file, a file without an identity header, and a
    /// file written under a different server identity all read as empty.
    /// Record lines without three fields, or that are not valid UTF-8, are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`AssignerError::Io`] if the file exists but cannot be read.
    pub fn read(&self, path: &Path) -> Result<Vec<ResponsibilityRecord>> {
        let content = match fs::read(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if content.is_empty() {
            return Ok(Vec::new());
        }

        let identity = self.settings.server_identity();
        let mut lines = content.split(|&b| b == b'\n');

        // Only the header is decoded before the identity check; the body of
        // a foreign file is never looked at.
        let header = lines.next().and_then(decode_line);
        match header.and_then(parse_header) {
            Some(stored) if stored == identity.as_str() => {}
            Some(stored) => {
                warn!(
                    path = %path.display(),
                    stored,
                    current = %identity,
                    "server UUIDs don't match; ignoring stored suggestions"
                );
                return Ok(Vec::new());
            }
            None => {
                warn!(path = %path.display(), "suggestions file has no identity header; ignoring it");
                return Ok(Vec::new());
            }
        }

        let mut records = Vec::new();
        for (index, raw) in lines.enumerate() {
            if raw.is_empty() || raw == b"\r" {
                continue;
            }
            match decode_line(raw).and_then(parse_record) {
                Some(record) => records.push(record),
                // +2: one for the header, one for 1-based numbering.
                None => warn!(
                    path = %path.display(),
                    line = index + 2,
                    "skipping malformed suggestion line"
                ),
            }
        }

        debug!(path = %path.display(), count = records.len(), "read stored suggestions");
        Ok(records)
    }
}

fn encode(identity: &ServerIdentity, records: &[ResponsibilityRecord]) -> String {
    let mut out = String::new();
    out.push_str(IDENTITY_HEADER);
    out.push(FIELD_DELIMITER);
    out.push_str(identity.as_str());
    out.push('\n');
    for record in records {
        out.push_str(record.test_name_id());
        out.push(FIELD_DELIMITER);
        out.push_str(record.investigator_id());
        out.push(FIELD_DELIMITER);
        out.push_str(record.reason());
        out.push('\n');
    }
    out
}

fn decode_line(raw: &[u8]) -> Option<&str> {
    let line = std::str::from_utf8(raw).ok()?;
    Some(line.strip_suffix('\r').unwrap_or(line))
}

fn parse_header(line: &str) -> Option<&str> {
    let (key, value) = line.split_once(FIELD_DELIMITER)?;
    (key == IDENTITY_HEADER).then_some(value)
}

fn parse_record(line: &str) -> Option<ResponsibilityRecord> {
    let mut fields = line.splitn(3, FIELD_DELIMITER);
    let test_name_id = fields.next()?;
    let investigator_id = fields.next()?;
    let reason = fields.next()?;
    Some(ResponsibilityRecord::new(test_name_id, investigator_id, reason))
}

fn check_record(record: &ResponsibilityRecord) -> Result<()> {
    let is_line_break = |c: char| c == '\n' || c == '\r';
    let invalid = |reason: &str| AssignerError::InvalidRecord {
        test_name_id: record.test_name_id().to_string(),
        reason: reason.to_string(),
    };

    for (name, value) in [
        ("test name id", record.test_name_id()),
        ("investigator id", record.investigator_id()),
    ] {
        if value.contains(FIELD_DELIMITER) || value.contains(is_line_break) {
            return Err(invalid(&format!("{name} contains a tab or line break")));
        }
    }
    if record.reason().contains(is_line_break) {
        return Err(invalid("reason contains a line break"));
    }
    Ok(())
}
