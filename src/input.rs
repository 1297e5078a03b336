use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

/// Extensions accepted by the resume file loader.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["txt"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit<'a> {
    Insert(char),
    Paste(&'a str),
    Newline,
    Backspace,
    Clear,
}

/// Applies one edit to an input buffer. Edits always land at the end of the
/// text; there is no cursor.
pub fn apply_edit(buffer: &mut String, edit: Edit<'_>) {
    match edit {
        Edit::Insert(c) => buffer.push(c),
        Edit::Paste(text) => buffer.push_str(&text.replace("\r\n", "\n").replace('\r', "\n")),
        Edit::Newline => buffer.push('\n'),
        Edit::Backspace => {
            buffer.pop();
        }
        Edit::Clear => buffer.clear(),
    }
}

pub fn has_accepted_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            ACCEPTED_EXTENSIONS
                .iter()
                .any(|accepted| ext.eq_ignore_ascii_case(accepted))
        })
        .unwrap_or(false)
}

/// Expands a leading `~/` to the home directory.
pub fn expand_home(raw: &str) -> PathBuf {
    let raw = raw.trim();
    if let Some(rest) = raw.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_default();
        PathBuf::from(home).join(rest)
    } else {
        PathBuf::from(raw)
    }
}

pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Reads a plain-text resume file in full.
pub async fn read_text_file(path: &Path) -> Result<String> {
    if !has_accepted_extension(path) {
        return Err(anyhow!(
            "Only .txt files can be loaded: {}",
            path.display()
        ));
    }

    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read resume file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_apply_edit() {
        let mut buffer = String::new();
        apply_edit(&mut buffer, Edit::Insert('G'));
        apply_edit(&mut buffer, Edit::Insert('o'));
        apply_edit(&mut buffer, Edit::Newline);
        apply_edit(&mut buffer, Edit::Paste("Rust\r\nPython"));
        assert_eq!(buffer, "Go\nRust\nPython");

        apply_edit(&mut buffer, Edit::Backspace);
        assert_eq!(buffer, "Go\nRust\nPytho");

        apply_edit(&mut buffer, Edit::Clear);
        assert!(buffer.is_empty());

        // Backspace on empty input is a no-op
        apply_edit(&mut buffer, Edit::Backspace);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_has_accepted_extension() {
        assert!(has_accepted_extension(Path::new("resume.txt")));
        assert!(has_accepted_extension(Path::new("/tmp/RESUME.TXT")));
        assert!(!has_accepted_extension(Path::new("resume.pdf")));
        assert!(!has_accepted_extension(Path::new("resume")));
    }

    #[test]
    fn test_expand_home_and_display_name() {
        let path = expand_home("  /tmp/cv.txt ");
        assert_eq!(path, PathBuf::from("/tmp/cv.txt"));
        assert_eq!(display_name(&path), "cv.txt");

        let home_path = expand_home("~/cv.txt");
        assert!(home_path.ends_with("cv.txt"));
        assert!(!home_path.starts_with("~"));
    }

    #[tokio::test]
    async fn test_read_text_file() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "Jane Doe\nSoftware Engineer").unwrap();

        let text = read_text_file(file.path()).await.unwrap();
        assert_eq!(text, "Jane Doe\nSoftware Engineer");
    }

    #[tokio::test]
    async fn test_read_text_file_rejects_other_extensions() {
        let file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        let err = read_text_file(file.path()).await.unwrap_err();
        assert!(err.to_string().contains(".txt"));
    }

    #[tokio::test]
    async fn test_read_text_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_text_file(&dir.path().join("missing.txt")).await.unwrap_err();
        assert!(err.to_string().contains("Failed to read resume file"));
    }
}
