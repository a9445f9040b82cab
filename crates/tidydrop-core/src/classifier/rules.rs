/// Rule set — the category mapping and the sensitive-data blocklists.
///
/// A `RuleSet` is plain configuration: it is deserialised once at start-up
/// (or taken from [`RuleSet::default`]) and then compiled into an immutable
/// [`Classifier`](super::Classifier). Every field is optional in JSON; missing
/// fields take the defaults below.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of leading lines inspected by the content scan.
pub const DEFAULT_CONTENT_SCAN_LINES: usize = 5;

const IMAGES: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".svg", ".webp", ".ico",
];
const AUDIO: &[&str] = &[".mp3", ".wav", ".flac", ".aac", ".ogg", ".m4a", ".wma"];
const VIDEO: &[&str] = &[
    ".mp4", ".avi", ".mkv", ".mov", ".wmv", ".flv", ".webm", ".m4v",
];
const DOCUMENTS: &[&str] = &[
    ".pdf", ".doc", ".docx", ".txt", ".rtf", ".odt", ".xls", ".xlsx", ".ppt", ".pptx", ".ods",
    ".odp",
];
const ARCHIVES: &[&str] = &[".zip", ".rar", ".7z", ".tar", ".gz", ".bz2"];
const EXECUTABLES: &[&str] = &[".exe", ".msi", ".deb", ".rpm", ".dmg", ".pkg"];
const CODE: &[&str] = &[
    ".py", ".js", ".html", ".css", ".cpp", ".c", ".java", ".php", ".rb", ".go", ".rs",
];

const FORBIDDEN_NAMES: &[&str] = &[
    "passwords",
    "password",
    "pass",
    "contraseña",
    "contrasena",
    "login",
    "credential",
    "credentials",
    "auth",
    "authentication",
    "token",
    "key",
    "private",
    "secret",
    "config",
    "configuration",
    "setup",
    "install",
    "boot",
    "startup",
    "system",
    "registry",
    "hosts",
    "ssh",
    "rsa",
    "pem",
    "crt",
    "keychain",
    "wallet",
];

const FORBIDDEN_EXTENSIONS: &[&str] = &[
    ".p12", ".pfx", ".key", ".pem", ".crt", ".der", ".csr", ".ppk", ".bak", ".backup", ".tmp",
    ".temp", ".log",
];

const CONTENT_KEYWORDS: &[&str] = &["password", "contraseña", "login", "credential", "secret"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    /// Extension (with leading dot) → category label.
    pub extension_mapping: BTreeMap<String, String>,
    /// Case-insensitive substrings that mark a file name as sensitive.
    pub forbidden_names: Vec<String>,
    /// Extensions that are always sensitive.
    pub forbidden_extensions: Vec<String>,
    /// Keywords searched for in the first lines of content-scanned files.
    pub content_keywords: Vec<String>,
    /// Extensions whose content is peeked at. Defaults to `.csv` only.
    pub content_scan_extensions: Vec<String>,
    pub content_scan_lines: usize,
}

impl Default for RuleSet {
    fn default() -> Self {
        let groups: [(&str, &[&str]); 7] = [
            ("Images", IMAGES),
            ("Audio", AUDIO),
            ("Video", VIDEO),
            ("Documents", DOCUMENTS),
            ("Archives", ARCHIVES),
            ("Executables", EXECUTABLES),
            ("Code", CODE),
        ];
        let extension_mapping = groups
            .iter()
            .flat_map(|(label, exts)| {
                exts.iter()
                    .map(move |ext| ((*ext).to_owned(), (*label).to_owned()))
            })
            .collect();

        Self {
            extension_mapping,
            forbidden_names: to_owned(FORBIDDEN_NAMES),
            forbidden_extensions: to_owned(FORBIDDEN_EXTENSIONS),
            content_keywords: to_owned(CONTENT_KEYWORDS),
            content_scan_extensions: vec![".csv".to_owned()],
            content_scan_lines: DEFAULT_CONTENT_SCAN_LINES,
        }
    }
}

fn to_owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

/// Normalise a configured extension: trimmed, lower-cased, leading dot.
///
/// Returns `None` for empty input so a stray `""` in a config file cannot
/// match extension-less files.
pub fn normalise_extension(ext: &str) -> Option<String> {
    let trimmed = ext.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return None;
    }
    Some(format!(".{}", trimmed.to_lowercase()))
}
