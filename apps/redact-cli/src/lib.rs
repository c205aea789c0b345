//! Command-line redaction
//!
//! Opens a PDF, replays an edit script through a redaction session and
//! writes the document with every annotation burned in.

pub mod config;
pub mod script;

use std::path::{Path, PathBuf};

/// `<dir>/<stem>-redacted.pdf` next to the input
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    input.with_file_name(format!("{}-redacted.pdf", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/tmp/statement.pdf")),
            PathBuf::from("/tmp/statement-redacted.pdf")
        );
        assert_eq!(
            default_output_path(Path::new("scan")),
            PathBuf::from("scan-redacted.pdf")
        );
    }
}
