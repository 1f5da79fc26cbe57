// src/core/extractor.rs

use std::collections::HashSet;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};
use url::{Host, Url};
use walkdir::{DirEntry, WalkDir};

use crate::config::ExtractConfig;
use crate::core::error::ExtractError;

static RE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bhttps?://[^\s"'<>\\`{}|^]+"#).unwrap());

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '\'', '"', ')', ']', '}'];

/// Enumerates the outbound URLs of a content tree.
///
/// Implementations must return the same order for the same tree, otherwise
/// offset-based batching skips or repeats URLs.
pub trait UrlSource: Send + Sync {
    fn extract_urls(&self, root: &Path) -> Result<Vec<String>, ExtractError>;
}

/// Walks a directory and pulls `http(s)://` URLs out of source files.
#[derive(Debug, Clone)]
pub struct FileSystemExtractor {
    config: ExtractConfig,
}

impl FileSystemExtractor {
    pub fn new(config: ExtractConfig) -> Self {
        Self { config }
    }

    fn is_skipped_dir(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| self.config.skip_dirs.iter().any(|d| d == name))
    }

    fn is_candidate_file(&self, entry: &DirEntry) -> bool {
        if !entry.file_type().is_file() {
            return false;
        }
        let extension_matches = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.config
                    .extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            });
        if !extension_matches {
            return false;
        }
        match entry.metadata() {
            Ok(meta) if meta.len() <= self.config.max_file_bytes => true,
            Ok(meta) => {
                debug!(path = %entry.path().display(), bytes = meta.len(), "Skipping oversized file.");
                false
            }
            Err(e) => {
                debug!(path = %entry.path().display(), error = %e, "Could not stat file.");
                false
            }
        }
    }

    /// Extracts accepted URLs from a chunk of text, in order of appearance.
    pub fn urls_in_text(&self, text: &str) -> Vec<String> {
        RE_URL
            .find_iter(text)
            .map(|m| m.as_str().trim_end_matches(TRAILING_PUNCTUATION))
            .filter(|candidate| self.is_outbound(candidate))
            .map(str::to_string)
            .collect()
    }

    fn is_outbound(&self, candidate: &str) -> bool {
        let Ok(parsed) = Url::parse(candidate) else {
            return false;
        };
        match parsed.host() {
            Some(Host::Domain(domain)) => {
                let plain = domain
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
                plain && domain.contains('.') && !self.is_ignored_host(domain)
            }
            Some(Host::Ipv4(ip)) => !self.is_ignored_host(&ip.to_string()),
            Some(Host::Ipv6(ip)) => !self.is_ignored_host(&ip.to_string()),
            None => false,
        }
    }

    fn is_ignored_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.config.ignored_hosts.iter().any(|ignored| {
            let ignored = ignored.to_ascii_lowercase();
            host == ignored || host.ends_with(&format!(".{ignored}"))
        })
    }
}

impl UrlSource for FileSystemExtractor {
    fn extract_urls(&self, root: &Path) -> Result<Vec<String>, ExtractError> {
        let meta = std::fs::metadata(root).map_err(|source| ExtractError::Root {
            path: root.to_path_buf(),
            source,
        })?;
        if !meta.is_dir() {
            return Err(ExtractError::NotADirectory(root.to_path_buf()));
        }

        let walker = WalkDir::new(root)
            .follow_links(self.config.follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.is_skipped_dir(e));

        let mut seen = HashSet::new();
        let mut urls = Vec::new();
        let mut files_read = 0usize;

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable directory entry.");
                    continue;
                }
            };
            if !self.is_candidate_file(&entry) {
                continue;
            }
            let bytes = match std::fs::read(entry.path()) {
                Ok(bytes) => bytes,
                Err(e) => {
                    debug!(path = %entry.path().display(), error = %e, "Could not read file.");
                    continue;
                }
            };
            files_read += 1;
            for url in self.urls_in_text(&String::from_utf8_lossy(&bytes)) {
                if seen.insert(url.clone()) {
                    urls.push(url);
                }
            }
        }

        info!(root = %root.display(), files_read, urls = urls.len(), "URL extraction finished.");
        Ok(urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn extractor() -> FileSystemExtractor {
        FileSystemExtractor::new(ExtractConfig::default())
    }

    #[test]
    fn finds_urls_and_trims_punctuation() {
        let text = r#"
            $api = 'https://api.vendor.io/v1/';
            wp_remote_get("http://feeds.news.test/rss.xml");
            // see (https://docs.vendor.io/guide).
        "#;
        assert_eq!(
            extractor().urls_in_text(text),
            vec![
                "https://api.vendor.io/v1/",
                "http://feeds.news.test/rss.xml",
                "https://docs.vendor.io/guide",
            ]
        );
    }

    #[test]
    fn rejects_placeholders_and_ignored_hosts() {
        let text = r#"
            "http://$host/path"
            "https://localhost:8080/"
            "http://www.w3.org/2000/svg"
            "https://www.example.com/x"
            "https://intranet/"
            "https://203.0.113.7/status"
        "#;
        assert_eq!(extractor().urls_in_text(text), vec!["https://203.0.113.7/status"]);
    }

    #[test]
    fn walk_is_sorted_deduplicated_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("plugins/b")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("plugins/b/main.php"), "https://b.vendor.io/ https://a.vendor.io/").unwrap();
        fs::write(root.join("plugins/a.js"), "fetch('https://a.vendor.io/')").unwrap();
        fs::write(root.join("plugins/logo.png"), "https://image.vendor.io/").unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), "https://npm.vendor.io/").unwrap();

        let first = extractor().extract_urls(root).unwrap();
        assert_eq!(first, vec!["https://a.vendor.io/", "https://b.vendor.io/"]);

        let second = extractor().extract_urls(root).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = extractor().extract_urls(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, ExtractError::Root { .. }));
    }
}
