//! Attachment export into a zip archive.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::query::AttachmentInfo;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to create {path}: {source}")]
    Create { path: PathBuf, source: io::Error },
}

/// What happened during one export run
#[derive(Debug, Clone, Default)]
pub struct ExportOutcome {
    pub path: PathBuf,
    pub exported_count: usize,
    pub total_bytes: u64,
    pub errors: Vec<String>,
    /// A write into the archive failed; the partial zip has been removed
    pub had_write_error: bool,
}

impl ExportOutcome {
    /// Text shown in the result dialog
    pub fn summary(&self) -> String {
        let mut text = if self.had_write_error {
            "Export failed due to write errors. Zip file removed.".to_string()
        } else if self.exported_count == 0 {
            "No attachments exported.".to_string()
        } else {
            format!(
                "Exported {} attachment(s) ({})\n\nSaved to:\n{}",
                self.exported_count,
                format_bytes_long(self.total_bytes as i64),
                self.path.display()
            )
        };
        if !self.errors.is_empty() {
            text.push_str("\n\nErrors:");
            for err in &self.errors {
                text.push_str("\n- ");
                text.push_str(err);
            }
        }
        text
    }
}

/// Zip file name for a message's attachments
pub fn archive_name(subject: &str, message_id: i64) -> String {
    let mut base: String = sanitize_filename(subject).chars().take(50).collect();
    if base.trim().is_empty() {
        base = "attachments".to_string();
    }
    format!("{base}_{message_id}.zip")
}

/// Location of a stored attachment: `<dir>/<hash[0..2]>/<hash>`
pub fn stored_path(attachments_dir: &Path, content_hash: &str) -> Option<PathBuf> {
    let prefix = content_hash.get(..2)?;
    Some(attachments_dir.join(prefix).join(content_hash))
}

/// Copy `attachments` from content-addressed storage into a new zip at `zip_path`.
///
/// Missing or unreadable sources are reported and skipped. A failed write
/// into the zip aborts the archive and removes the partial file.
pub fn export_attachments(
    zip_path: &Path,
    attachments_dir: &Path,
    attachments: &[AttachmentInfo],
) -> Result<ExportOutcome, ExportError> {
    let file = File::create(zip_path).map_err(|source| ExportError::Create {
        path: zip_path.to_path_buf(),
        source,
    })?;
    let mut zip = ZipWriter::new(file);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mut outcome = ExportOutcome {
        path: zip_path.to_path_buf(),
        ..ExportOutcome::default()
    };
    let mut used_names = HashSet::new();

    for att in attachments {
        let Some(source_path) = stored_path(attachments_dir, &att.content_hash) else {
            outcome
                .errors
                .push(format!("{}: missing content hash", att.filename));
            continue;
        };
        let mut source = match File::open(&source_path) {
            Ok(f) => f,
            Err(e) => {
                outcome.errors.push(format!("{}: {}", att.filename, e));
                continue;
            }
        };

        let name = unique_name(entry_name(att), &mut used_names);
        if let Err(e) = zip.start_file(name.as_str(), options) {
            outcome.errors.push(format!("{name}: {e}"));
            outcome.had_write_error = true;
            break;
        }
        match io::copy(&mut source, &mut zip) {
            Ok(n) => {
                outcome.total_bytes += n;
                outcome.exported_count += 1;
            }
            Err(e) => {
                outcome.errors.push(format!("{name}: {e}"));
                outcome.had_write_error = true;
                break;
            }
        }
    }

    if let Err(e) = zip.finish() {
        outcome.errors.push(format!("finalizing zip: {e}"));
        outcome.had_write_error = true;
    }

    if outcome.had_write_error || outcome.exported_count == 0 {
        if let Err(e) = fs::remove_file(zip_path) {
            tracing::warn!("Failed to remove {}: {}", zip_path.display(), e);
        }
    }

    tracing::info!(
        "Exported {} attachment(s) to {} ({} errors)",
        outcome.exported_count,
        zip_path.display(),
        outcome.errors.len()
    );
    Ok(outcome)
}

/// Base file name without any directory components
fn entry_name(att: &AttachmentInfo) -> String {
    let base = att
        .filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() || base == "." || base == ".." {
        format!("attachment_{}", att.id)
    } else {
        base.to_string()
    }
}

/// Append `_N` before the extension until the name is unused
fn unique_name(name: String, used: &mut HashSet<String>) -> String {
    if used.insert(name.clone()) {
        return name;
    }
    let (stem, ext) = match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], &name[idx..]),
        _ => (name.as_str(), ""),
    };
    let mut n = 1;
    loop {
        let candidate = format!("{stem}_{n}{ext}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

pub fn sanitize_filename(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\n' | '\r' | '\t' => '_',
            c => c,
        })
        .collect()
}

/// Size with two decimals in binary units ("1.50 MB")
pub fn format_bytes_long(bytes: i64) -> String {
    const UNIT: f64 = 1024.0;
    let b = bytes as f64;
    if b < UNIT {
        return format!("{bytes} B");
    }
    let units = ["KB", "MB", "GB", "TB", "PB"];
    let mut value = b / UNIT;
    let mut idx = 0;
    while value >= UNIT && idx < units.len() - 1 {
        value /= UNIT;
        idx += 1;
    }
    format!("{:.2} {}", value, units[idx])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn attachment(id: i64, filename: &str, hash: &str) -> AttachmentInfo {
        AttachmentInfo {
            id,
            filename: filename.to_string(),
            mime_type: "application/octet-stream".to_string(),
            size: 0,
            content_hash: hash.to_string(),
        }
    }

    fn store(dir: &Path, hash: &str, content: &[u8]) {
        let path = stored_path(dir, hash).unwrap();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_sanitize_and_archive_name() {
        assert_eq!(sanitize_filename("a/b:c*d?"), "a_b_c_d_");
        assert_eq!(archive_name("Re: Report", 7), "Re_ Report_7.zip");
        assert_eq!(archive_name("", 3), "attachments_3.zip");
        let long = "x".repeat(80);
        assert_eq!(archive_name(&long, 1), format!("{}_1.zip", "x".repeat(50)));
    }

    #[test]
    fn test_format_bytes_long() {
        assert_eq!(format_bytes_long(512), "512 B");
        assert_eq!(format_bytes_long(1536), "1.50 KB");
        assert_eq!(format_bytes_long(5 * 1024 * 1024), "5.00 MB");
    }

    #[test]
    fn test_unique_names() {
        let mut used = HashSet::new();
        assert_eq!(unique_name("a.pdf".into(), &mut used), "a.pdf");
        assert_eq!(unique_name("a.pdf".into(), &mut used), "a_1.pdf");
        assert_eq!(unique_name("a.pdf".into(), &mut used), "a_2.pdf");
        assert_eq!(unique_name("README".into(), &mut used), "README");
        assert_eq!(unique_name("README".into(), &mut used), "README_1");
    }

    #[test]
    fn test_entry_name_strips_directories() {
        assert_eq!(entry_name(&attachment(1, "../../etc/passwd", "x")), "passwd");
        assert_eq!(entry_name(&attachment(2, "dir\\file.txt", "x")), "file.txt");
        assert_eq!(entry_name(&attachment(3, "", "x")), "attachment_3");
    }

    #[test]
    fn test_export_writes_zip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = dir.path().join("attachments");
        store(&storage, "aa11", b"hello");
        store(&storage, "bb22", b"world!");

        let zip_path = dir.path().join("out.zip");
        let outcome = export_attachments(
            &zip_path,
            &storage,
            &[
                attachment(1, "note.txt", "aa11"),
                attachment(2, "note.txt", "bb22"),
                attachment(3, "gone.bin", "cc33"),
            ],
        )
        .unwrap();

        assert_eq!(outcome.exported_count, 2);
        assert_eq!(outcome.total_bytes, 11);
        assert_eq!(outcome.errors.len(), 1);
        assert!(!outcome.had_write_error);
        assert!(outcome.summary().starts_with("Exported 2 attachment(s) (11 B)"));

        let mut archive = zip::ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
        let mut names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["note.txt", "note_1.txt"]);

        let mut content = String::new();
        archive
            .by_name("note_1.txt")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "world!");
    }

    #[test]
    fn test_export_nothing_removes_zip() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("empty.zip");
        let outcome =
            export_attachments(&zip_path, dir.path(), &[attachment(1, "a", "")]).unwrap();

        assert_eq!(outcome.exported_count, 0);
        assert!(!zip_path.exists());
        assert!(outcome.summary().starts_with("No attachments exported."));
        assert!(outcome.summary().contains("a: missing content hash"));
    }
}
