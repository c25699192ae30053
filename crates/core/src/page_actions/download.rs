//! Plain-text file downloads offered to the browser.

/// MIME type of every text download.
pub const TEXT_PLAIN: &str = "text/plain";

/// File name of the two-factor backup code download.
pub const BACKUP_CODES_FILENAME: &str = "2fa-backup-codes.txt";

/// A file the user can save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadFile {
    pub filename: String,
    pub mime_type: &'static str,
    pub content: String,
}

impl DownloadFile {
    /// One backup code per line, no trailing newline.
    pub fn backup_codes<S: AsRef<str>>(codes: &[S]) -> Self {
        let content = codes
            .iter()
            .map(|c| c.as_ref().trim())
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            filename: BACKUP_CODES_FILENAME.to_string(),
            mime_type: TEXT_PLAIN,
            content,
        }
    }

    /// Value for a `Content-Disposition` header.
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_codes_joined_with_newlines() {
        let file = DownloadFile::backup_codes(&["CODE1", "CODE2"]);
        assert_eq!(file.content, "CODE1\nCODE2");
        assert_eq!(file.mime_type, "text/plain");
        assert_eq!(file.filename, "2fa-backup-codes.txt");
    }

    #[test]
    fn disposition_names_the_file() {
        let file = DownloadFile::backup_codes::<&str>(&[]);
        assert_eq!(file.content, "");
        assert_eq!(
            file.content_disposition(),
            "attachment; filename=\"2fa-backup-codes.txt\""
        );
    }
}
