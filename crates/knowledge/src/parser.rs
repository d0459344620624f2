//! Source file parsing and text extraction.

use agentic_core::{AppError, AppResult};
use std::fs;
use std::path::Path;

/// Content type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Markdown,
    Html,
    PlainText,
    Unknown,
}

impl ContentType {
    /// Detect content type from file extension.
    pub fn from_path(path: &Path) -> Self {
        match extension(path).as_deref() {
            Some("md") | Some("markdown") => Self::Markdown,
            Some("html") | Some("htm") => Self::Html,
            Some("txt") | Some("text") => Self::PlainText,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::PlainText => "text",
            Self::Unknown => "unknown",
        }
    }
}

/// Lowercased extension of `path`, if any.
pub fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Whether `path` carries one of `extensions` (compared case-insensitively).
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    match extension(path) {
        Some(ext) => extensions
            .iter()
            .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(&ext)),
        None => false,
    }
}

/// Read a source file and extract clean text.
pub fn parse_file(path: &Path) -> AppResult<String> {
    let bytes = fs::read(path)
        .map_err(|e| AppError::Knowledge(format!("Failed to read {:?}: {}", path, e)))?;
    parse_bytes(path, &bytes)
}

/// Extract clean text from already-read file contents.
pub fn parse_bytes(path: &Path, bytes: &[u8]) -> AppResult<String> {
    if bytes.contains(&0) {
        tracing::warn!("Skipping likely binary file: {:?}", path);
        return Err(AppError::Knowledge(format!(
            "Binary file not supported: {:?}",
            path
        )));
    }

    let raw = String::from_utf8_lossy(bytes);

    let cleaned = match ContentType::from_path(path) {
        ContentType::Markdown => clean_markdown(&raw),
        ContentType::Html => clean_html(&raw),
        ContentType::PlainText | ContentType::Unknown => raw.into_owned(),
    };

    Ok(cleaned)
}

/// Strip markdown markup that carries no meaning for retrieval.
fn clean_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut previous_blank = false;

    for line in text.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            continue;
        }
        if !trimmed.is_empty() && trimmed.chars().all(|c| matches!(c, '-' | '*' | '_' | ' ')) {
            continue;
        }

        let content = trimmed.trim_start_matches('#').trim();

        // Keep paragraph breaks so the splitter can use them
        if content.is_empty() {
            if !previous_blank && !result.is_empty() {
                result.push('\n');
            }
            previous_blank = true;
            continue;
        }

        result.push_str(content);
        result.push('\n');
        previous_blank = false;
    }

    result.trim().to_string()
}

/// Strip HTML tags along with script and style bodies.
fn clean_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('<') {
        result.push_str(&rest[..start]);
        result.push(' ');
        let tag = &rest[start..];
        let lower = tag.get(..7).unwrap_or(tag).to_ascii_lowercase();

        let skip_to = if lower.starts_with("<script") {
            find_ignore_case(tag, "</script>").map(|i| i + "</script>".len())
        } else if lower.starts_with("<style") {
            find_ignore_case(tag, "</style>").map(|i| i + "</style>".len())
        } else {
            tag.find('>').map(|i| i + 1)
        };

        match skip_to {
            Some(end) => rest = &tag[end..],
            None => {
                rest = "";
                break;
            }
        }
    }
    result.push_str(rest);

    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack.to_ascii_lowercase().find(needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_content_type_detection() {
        assert_eq!(
            ContentType::from_path(Path::new("notes.md")),
            ContentType::Markdown
        );
        assert_eq!(
            ContentType::from_path(Path::new("NOTES.TXT")),
            ContentType::PlainText
        );
        assert_eq!(
            ContentType::from_path(Path::new("page.html")),
            ContentType::Html
        );
        assert_eq!(
            ContentType::from_path(Path::new("data.bin")),
            ContentType::Unknown
        );
    }

    #[test]
    fn test_has_extension() {
        let exts = vec!["txt".to_string(), ".md".to_string()];
        assert!(has_extension(Path::new("a.txt"), &exts));
        assert!(has_extension(Path::new("b.MD"), &exts));
        assert!(!has_extension(Path::new("c.markdown"), &exts));
        assert!(!has_extension(Path::new("README"), &exts));
    }

    #[test]
    fn test_clean_markdown_keeps_paragraphs() {
        let input = "# Header\n\nSome text\n\n```rust\ncode\n```\n\n---\n\nMore text";
        let output = clean_markdown(input);
        assert!(output.starts_with("Header\n"));
        assert!(output.contains("Some text"));
        assert!(output.contains("code"));
        assert!(output.contains("\n\nMore text"));
        assert!(!output.contains("```"));
        assert!(!output.contains("---"));
    }

    #[test]
    fn test_clean_html() {
        let input = "<html><head><style>p { color: red; }</style></head>\
                     <body><p>Hello <b>world</b></p><script>alert(1)</script></body></html>";
        assert_eq!(clean_html(input), "Hello world");
    }

    #[test]
    fn test_parse_file_rejects_binary() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("blob.txt");
        fs::write(&path, [0x41, 0x00, 0x42]).unwrap();
        assert!(parse_file(&path).is_err());
    }

    #[test]
    fn test_parse_plain_text_unchanged() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("doc.txt");
        fs::write(&path, "line one\n\nline two\n").unwrap();
        assert_eq!(parse_file(&path).unwrap(), "line one\n\nline two\n");
    }
}
