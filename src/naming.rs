//! Deterministic file naming for every entity kind, plus directory discovery.
//!
//! Each kind owns a [`FilePattern`]: the write side renders
//! `{prefix}{reference id}{suffix}`, the read side accepts the same shape with
//! any integer id and, for some kinds, additional legacy suffixes. There is no
//! manifest — readers discover members purely by scanning the documents
//! directory against these patterns, so stray files that happen to match are
//! included and files that do not match are silently ignored.
//!
//! The id segment must be an actual integer (optional sign, digits). That is
//! what keeps the `WorkItem` pattern from swallowing `WorkItemOperation`
//! files, which share its prefix.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::ReferenceId;

/// Name of the documents directory under the datacard root.
pub const DOCUMENTS_FOLDER: &str = "documents";

/// LoggedData records.
pub const LOGGED_DATA_FILE: FilePattern = FilePattern::new("Document", ".adm", &[]);
/// GuidanceAllocation records.
pub const GUIDANCE_ALLOCATION_FILE: FilePattern = FilePattern::new("GuidanceAllocation", ".adm", &[]);
/// Plan records.
pub const PLAN_FILE: FilePattern = FilePattern::new("Plan", ".adm", &[]);
/// Recommendation records.
pub const RECOMMENDATION_FILE: FilePattern = FilePattern::new("Recommendation", ".adm", &[]);
/// Summary records.
pub const SUMMARY_FILE: FilePattern = FilePattern::new("Summary", ".adm", &[]);
/// WorkRecord records.
pub const WORK_RECORD_FILE: FilePattern = FilePattern::new("WorkRecord", ".adm", &[]);
/// WorkItemOperation records.
pub const WORK_ITEM_OPERATION_FILE: FilePattern = FilePattern::new("WorkItemOperation", ".adm", &[]);
/// WorkItem records.
pub const WORK_ITEM_FILE: FilePattern = FilePattern::new("WorkItem", ".adm", &[]);
/// WorkOrder records.
pub const WORK_ORDER_FILE: FilePattern = FilePattern::new("WorkOrder", ".adm", &[]);
/// Load records. Written with `.adm`; the reader also accepts the legacy
/// `.bin` suffix produced by earlier exporters.
pub const LOAD_FILE: FilePattern = FilePattern::new("Load", ".adm", &[".bin"]);

/// Depth→device-element-use map, keyed by operation id.
pub const SECTION_FILE: FilePattern = FilePattern::new("Section", ".adm", &[]);
/// Flattened meter sequence, keyed by operation id.
pub const WORKING_DATA_FILE: FilePattern = FilePattern::new("Meter", ".adm", &[]);
/// Compact length-prefixed spatial stream, keyed by operation id.
pub const SPATIAL_RECORDS_FILE: FilePattern = FilePattern::new("SpatialRecords", ".bin", &[]);
/// Legacy verbose spatial stream. Read-side fallback only; never written.
pub const OPERATION_DATA_FILE: FilePattern = FilePattern::new("OperationData", ".adm", &[]);

/// A filename template for one entity kind.
///
/// The write template is `{prefix}{id}{suffix}`; the read matcher accepts the
/// write suffix plus any listed legacy suffix. Every name the write template
/// can produce matches the read side of the same pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilePattern {
    prefix: &'static str,
    suffix: &'static str,
    legacy_suffixes: &'static [&'static str],
}

impl FilePattern {
    const fn new(
        prefix: &'static str,
        suffix: &'static str,
        legacy_suffixes: &'static [&'static str],
    ) -> Self {
        Self {
            prefix,
            suffix,
            legacy_suffixes,
        }
    }

    /// Renders the canonical file name for `id`.
    pub fn file_name(&self, id: ReferenceId) -> String {
        format!("{}{}{}", self.prefix, id, self.suffix)
    }

    /// Renders the full path for `id` under `dir`.
    pub fn file_path(&self, dir: &Path, id: ReferenceId) -> PathBuf {
        dir.join(self.file_name(id))
    }

    /// True if `name` is a well-formed instance of this pattern.
    pub fn matches(&self, name: &str) -> bool {
        let Some(rest) = name.strip_prefix(self.prefix) else {
            return false;
        };
        let digits = rest.strip_prefix('-').unwrap_or(rest);
        let id_len = digits.bytes().take_while(u8::is_ascii_digit).count();
        if id_len == 0 {
            return false;
        }
        let tail = &digits[id_len..];
        tail == self.suffix || self.legacy_suffixes.contains(&tail)
    }
}

/// A restartable scan of one directory for one pattern.
///
/// Every call to [`DirScan::iter`] re-lists the directory at that moment;
/// nothing is cached between calls. Matches are returned in name order so
/// assembled collections are deterministic across platforms.
#[derive(Debug, Clone)]
pub struct DirScan {
    dir: PathBuf,
    pattern: FilePattern,
}

impl DirScan {
    /// Scans `dir` for members of `pattern`.
    pub fn new(dir: &Path, pattern: FilePattern) -> Self {
        Self {
            dir: dir.to_path_buf(),
            pattern,
        }
    }

    /// Lists the directory now and yields matching paths in name order.
    pub fn iter(&self) -> Result<impl Iterator<Item = PathBuf>> {
        let mut matches: Vec<(String, PathBuf)> = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if self.pattern.matches(name) {
                matches.push((name.to_owned(), entry.path()));
            }
        }
        matches.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(matches.into_iter().map(|(_, path)| path))
    }
}
