/// Classifier — file name (and, for a few extensions, the first lines of the
/// file) → category plus sensitive verdict.
///
/// Evaluation order is fixed and short-circuits on the first match:
///
/// 1. forbidden extension,
/// 2. forbidden keyword anywhere in the file name (not the full path),
/// 3. bounded content scan for the content-scanned extensions.
///
/// Only when none of these match is the category looked up. A read failure
/// during the content scan yields "sensitive"; nothing in here can make a
/// file less protected because of an error.
pub mod rules;

pub use rules::{normalise_extension, RuleSet, DEFAULT_CONTENT_SCAN_LINES};

use crate::error::Error;
use crate::model::{Category, ClassificationResult, SensitiveMatch};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Upper bound on bytes read by the content scan, whatever the line count.
/// Leading lines longer than this together make the file sensitive, since
/// the part past the limit was never looked at.
pub const MAX_PEEK_BYTES: u64 = 64 * 1024;

/// Compiled, immutable form of a [`RuleSet`].
///
/// Keys and keywords are lower-cased once here so classification only
/// lower-cases the file name.
#[derive(Debug, Clone)]
pub struct Classifier {
    mapping: HashMap<String, Category>,
    forbidden_names: Vec<String>,
    forbidden_extensions: HashSet<String>,
    content_keywords: Vec<String>,
    content_scan_extensions: HashSet<String>,
    content_scan_lines: usize,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(&RuleSet::default())
    }
}

impl Classifier {
    pub fn new(rules: &RuleSet) -> Self {
        let mapping = rules
            .extension_mapping
            .iter()
            .filter_map(|(ext, label)| Some((normalise_extension(ext)?, Category::from_label(label))))
            .collect();

        Self {
            mapping,
            forbidden_names: lowercase_all(&rules.forbidden_names),
            forbidden_extensions: rules
                .forbidden_extensions
                .iter()
                .filter_map(|e| normalise_extension(e))
                .collect(),
            content_keywords: lowercase_all(&rules.content_keywords),
            content_scan_extensions: rules
                .content_scan_extensions
                .iter()
                .filter_map(|e| normalise_extension(e))
                .collect(),
            content_scan_lines: rules.content_scan_lines,
        }
    }

    /// Classify the file at `path`.
    ///
    /// Touches the filesystem only for content-scanned extensions.
    pub fn classify(&self, path: &Path) -> ClassificationResult {
        if let Some(reason) = self.sensitive_match(path) {
            return ClassificationResult::sensitive(reason);
        }
        ClassificationResult::clear(self.category_for(path))
    }

    /// Category of `path` by extension alone, ignoring the sensitive rules.
    pub fn category_for(&self, path: &Path) -> Category {
        extension_of(path)
            .and_then(|ext| self.mapping.get(&ext).cloned())
            .unwrap_or(Category::Other)
    }

    /// Distinct concrete category labels, sorted.
    pub fn category_labels(&self) -> Vec<String> {
        let labels: BTreeSet<&str> = self.mapping.values().filter_map(Category::label).collect();
        labels.into_iter().map(str::to_owned).collect()
    }

    fn sensitive_match(&self, path: &Path) -> Option<SensitiveMatch> {
        let ext = extension_of(path);

        // 1. Extension blocklist.
        if let Some(ext) = ext.as_deref() {
            if self.forbidden_extensions.contains(ext) {
                return Some(SensitiveMatch::ForbiddenExtension(ext.to_owned()));
            }
        }

        // 2. File name keywords.
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if let Some(kw) = self.forbidden_names.iter().find(|kw| name.contains(kw.as_str())) {
            return Some(SensitiveMatch::NameKeyword(kw.clone()));
        }

        // 3. Bounded content scan.
        match ext {
            Some(ext) if self.content_scan_extensions.contains(&ext) => {
                match self.scan_content(path) {
                    Ok(found) => found,
                    Err(err) => {
                        debug!("Content scan failed, treating as sensitive: {err}");
                        Some(SensitiveMatch::Unreadable(err.to_string()))
                    }
                }
            }
            _ => None,
        }
    }

    /// Look for a content keyword in the first `content_scan_lines` lines.
    fn scan_content(&self, path: &Path) -> Result<Option<SensitiveMatch>, Error> {
        let unreadable = |source| Error::ContentScanUnreadable {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(unreadable)?;
        let Some(excerpt) = read_leading_lines(file, self.content_scan_lines).map_err(unreadable)?
        else {
            debug!("Leading lines of {} exceed the peek limit", path.display());
            return Ok(Some(SensitiveMatch::ExcerptTooLong {
                limit: MAX_PEEK_BYTES,
            }));
        };
        let excerpt = excerpt.to_lowercase();
        Ok(self
            .content_keywords
            .iter()
            .find(|kw| excerpt.contains(kw.as_str()))
            .map(|kw| SensitiveMatch::ContentKeyword(kw.clone())))
    }
}

/// Lower-cased extension of the final dot-suffix, with its leading dot.
///
/// `archive.tar.gz` → `.gz`; `README`, `.bashrc` and `trailing.` have none.
pub fn extension_of(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_string_lossy();
    if ext.is_empty() {
        return None;
    }
    Some(format!(".{}", ext.to_lowercase()))
}

/// Read the first `max_lines` lines, decoding lossily so binary junk cannot
/// turn into a read error.
///
/// `None` when those lines do not fit in [`MAX_PEEK_BYTES`]: the excerpt
/// would be incomplete.
fn read_leading_lines(reader: impl Read, max_lines: usize) -> std::io::Result<Option<String>> {
    // One byte over the limit tells "exactly full" apart from "cut short".
    let mut reader = BufReader::new(reader.take(MAX_PEEK_BYTES + 1));
    let mut buf = Vec::new();
    for _ in 0..max_lines {
        let read = reader.read_until(b'\n', &mut buf)?;
        if read == 0 {
            break;
        }
    }
    if buf.len() as u64 > MAX_PEEK_BYTES {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

fn lowercase_all(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn classifier() -> Classifier {
        Classifier::default()
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    // ── extension_of ─────────────────────────────────────────────────────

    #[test]
    fn extension_is_final_suffix_lowercased() {
        assert_eq!(extension_of(Path::new("a/Photo.JPG")).as_deref(), Some(".jpg"));
        assert_eq!(extension_of(Path::new("archive.tar.gz")).as_deref(), Some(".gz"));
    }

    #[test]
    fn names_without_suffix_have_no_extension() {
        assert_eq!(extension_of(Path::new("README")), None);
        assert_eq!(extension_of(Path::new(".bashrc")), None);
        assert_eq!(extension_of(Path::new("trailing.")), None);
    }

    // ── categories ───────────────────────────────────────────────────────

    #[test]
    fn known_extensions_map_case_insensitively() {
        let c = classifier();
        assert_eq!(c.category_for(Path::new("x.PNG")), Category::from_label("Images"));
        assert_eq!(c.category_for(Path::new("x.Mp3")), Category::from_label("Audio"));
        assert_eq!(c.category_for(Path::new("x.pdf")), Category::from_label("Documents"));
    }

    #[test]
    fn unknown_extension_is_other() {
        let c = classifier();
        let result = c.classify(Path::new("/nowhere/note.xyz"));
        assert!(!result.is_sensitive());
        assert_eq!(result.category, Category::Other);
    }

    #[test]
    fn category_labels_are_distinct_and_sorted() {
        let labels = classifier().category_labels();
        assert_eq!(
            labels,
            vec!["Archives", "Audio", "Code", "Documents", "Executables", "Images", "Video"]
        );
    }

    // ── sensitive rules ──────────────────────────────────────────────────

    /// Forbidden extensions win regardless of an innocent name.
    #[test]
    fn forbidden_extension_is_sensitive() {
        let c = classifier();
        for name in ["holiday.pem", "photo.KEY", "notes.log", "x.p12"] {
            let result = c.classify(Path::new(name));
            assert!(
                matches!(result.sensitive, Some(SensitiveMatch::ForbiddenExtension(_))),
                "{name} must be sensitive by extension"
            );
            assert_eq!(result.category, Category::Other);
        }
    }

    #[test]
    fn forbidden_keyword_in_name_is_sensitive_any_case() {
        let c = classifier();
        for name in ["MY_PASSWORDS.pdf", "Secret-plans.jpg", "wallet.zip", "Contraseñas.mp3"] {
            let result = c.classify(Path::new(name));
            assert!(
                matches!(result.sensitive, Some(SensitiveMatch::NameKeyword(_))),
                "{name} must be sensitive by name"
            );
        }
    }

    /// Only the file name is matched; a keyword in a parent directory is not.
    #[test]
    fn keyword_in_parent_directory_is_ignored() {
        let c = classifier();
        let result = c.classify(Path::new("/home/secret/Downloads/report.pdf"));
        assert!(!result.is_sensitive());
        assert_eq!(result.category, Category::from_label("Documents"));
    }

    #[test]
    fn csv_with_keyword_in_header_is_sensitive() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "data.csv", "Password,User\nx,y\n");
        let result = classifier().classify(&path);
        assert_eq!(
            result.sensitive,
            Some(SensitiveMatch::ContentKeyword("password".into()))
        );
    }

    #[test]
    fn csv_keyword_after_fifth_line_is_not_flagged() {
        let tmp = TempDir::new().unwrap();
        let content = "a,b\n1,2\n3,4\n5,6\n7,8\nsecret,9\n";
        let path = write(&tmp, "numbers.csv", content);
        let result = classifier().classify(&path);
        assert!(!result.is_sensitive(), "line 6 is outside the peek window");
    }

    #[test]
    fn csv_keyword_on_fifth_line_is_flagged() {
        let tmp = TempDir::new().unwrap();
        let content = "a,b\n1,2\n3,4\n5,6\nlogin,8\n";
        let path = write(&tmp, "numbers.csv", content);
        assert!(classifier().classify(&path).is_sensitive());
    }

    /// A content-scanned file that cannot be read fails closed.
    #[test]
    fn unreadable_csv_is_sensitive() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("gone.csv");
        let result = classifier().classify(&missing);
        assert!(matches!(result.sensitive, Some(SensitiveMatch::Unreadable(_))));
    }

    /// Extensions outside the content-scan list are never opened.
    #[test]
    fn non_scanned_extension_is_not_opened() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "notes.txt", "password=hunter2\n");
        let result = classifier().classify(&path);
        assert!(!result.is_sensitive());
        assert_eq!(result.category, Category::from_label("Documents"));
    }

    #[test]
    fn custom_rule_set_extends_content_scan() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "letter.txt", "dear bob, the password is...\n");
        let rules = RuleSet {
            content_scan_extensions: vec!["csv".into(), "TXT".into()],
            ..RuleSet::default()
        };
        assert!(Classifier::new(&rules).classify(&path).is_sensitive());
    }

    #[test]
    fn leading_lines_stop_at_limit() {
        let text = read_leading_lines("one\ntwo\nthree\n".as_bytes(), 2).unwrap();
        assert_eq!(text.as_deref(), Some("one\ntwo\n"));
    }

    /// A header wider than the peek limit hides whatever follows the cut, so
    /// the file fails closed.
    #[test]
    fn csv_header_wider_than_peek_limit_is_sensitive() {
        let tmp = TempDir::new().unwrap();
        let columns: Vec<String> = (0..9000).map(|i| format!("col{i}")).collect();
        let header = format!("{},password\n", columns.join(","));
        assert!(header.len() as u64 > MAX_PEEK_BYTES);
        let path = write(&tmp, "export.csv", &header);

        let result = classifier().classify(&path);
        assert_eq!(
            result.sensitive,
            Some(SensitiveMatch::ExcerptTooLong {
                limit: MAX_PEEK_BYTES
            })
        );
    }

    /// Long lines are fine as long as the lines that are scanned fit.
    #[test]
    fn long_lines_after_the_scanned_ones_do_not_matter() {
        let tmp = TempDir::new().unwrap();
        let mut content = String::from("a,b\n1,2\n3,4\n5,6\n7,8\n");
        content.push_str(&"x".repeat(2 * MAX_PEEK_BYTES as usize));
        let path = write(&tmp, "numbers.csv", &content);
        assert!(!classifier().classify(&path).is_sensitive());
    }

    #[test]
    fn leading_lines_exactly_at_limit_are_complete() {
        let line = format!("{}\n", "y".repeat(MAX_PEEK_BYTES as usize - 1));
        let text = read_leading_lines(line.as_bytes(), 5).unwrap();
        assert_eq!(text.map(|t| t.len()), Some(MAX_PEEK_BYTES as usize));
    }
}
