//! Attribute-driven page actions.
//!
//! Pages declare behaviour on elements through `data-*` attributes instead of
//! inline handlers. A single click dispatcher reads the attributes of the
//! clicked element, resolves one [`Intent`], and runs it against the
//! [`Host`] (dialogs, printing, downloads) and a [`Clipboard`].
//!
//! | Attribute                     | Intent                                   |
//! |-------------------------------|------------------------------------------|
//! | `data-confirm="msg"`          | confirm dialog, cancel default if declined |
//! | `data-print`                  | open the print dialog                    |
//! | `data-copy-target="id"`       | copy the element's text or value         |
//! | `data-copy-message="msg"`     | alert shown after a successful copy      |
//! | `data-download-backup-codes="id"` | download the container's child texts |

pub mod clipboard;
pub mod download;

use std::collections::BTreeMap;

pub use clipboard::{
    AsyncClipboardApi, Clipboard, ClipboardError, CopyPath, FallbackClipboard, SelectionCopy,
};
pub use download::{DownloadFile, BACKUP_CODES_FILENAME, TEXT_PLAIN};

pub const ATTR_CONFIRM: &str = "data-confirm";
pub const ATTR_PRINT: &str = "data-print";
pub const ATTR_COPY_TARGET: &str = "data-copy-target";
pub const ATTR_COPY_MESSAGE: &str = "data-copy-message";
pub const ATTR_DOWNLOAD_BACKUP_CODES: &str = "data-download-backup-codes";

/// Alert shown when a copy succeeds without a `data-copy-message`.
pub const DEFAULT_COPY_MESSAGE: &str = "Copied to clipboard";

/// Alert shown when both clipboard paths fail.
pub const COPY_FAILED_MESSAGE: &str = "Failed to copy to clipboard";

/// Behaviour declared on a clickable element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Confirm { message: String },
    Print,
    Copy { target_id: String, success_message: String },
    DownloadBackupCodes { container_id: String },
}

impl Intent {
    /// Resolve the intent of an element from its attributes.
    ///
    /// An element declares at most one intent; when several attributes are
    /// present, confirm wins over print, print over copy, copy over download.
    pub fn from_attributes(attributes: &BTreeMap<String, String>) -> Option<Self> {
        if let Some(message) = attributes.get(ATTR_CONFIRM) {
            return Some(Intent::Confirm {
                message: message.clone(),
            });
        }
        if attributes.contains_key(ATTR_PRINT) {
            return Some(Intent::Print);
        }
        if let Some(target_id) = attributes.get(ATTR_COPY_TARGET) {
            return Some(Intent::Copy {
                target_id: target_id.clone(),
                success_message: attributes
                    .get(ATTR_COPY_MESSAGE)
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_COPY_MESSAGE.to_string()),
            });
        }
        attributes
            .get(ATTR_DOWNLOAD_BACKUP_CODES)
            .map(|container_id| Intent::DownloadBackupCodes {
                container_id: container_id.clone(),
            })
    }
}

/// Read-only view of the current page.
pub trait Page: Send + Sync {
    /// Text content, or the value for form fields, of the element with `id`.
    fn element_text(&self, id: &str) -> Option<String>;

    /// Text content of every child element of the element with `id`.
    fn child_texts(&self, id: &str) -> Option<Vec<String>>;
}

/// Blocking browser UI the actions drive.
pub trait Host: Send + Sync {
    fn confirm(&self, message: &str) -> bool;
    fn alert(&self, message: &str);
    fn print(&self);
    fn offer_download(&self, file: &DownloadFile);
}

/// Result of dispatching one click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClickOutcome {
    /// The element's default action (navigation, form submit) must not run.
    pub default_prevented: bool,
}

/// What a copy attempt reported to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyReport {
    Copied(CopyPath),
    Failed,
}

/// The click dispatcher.
pub struct PageActions<H, C> {
    host: H,
    clipboard: C,
}

impl<H: Host, C: Clipboard> PageActions<H, C> {
    pub fn new(host: H, clipboard: C) -> Self {
        Self { host, clipboard }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Handle a click on an element with the given attributes.
    ///
    /// Elements without a recognised intent are left alone.
    pub async fn handle_click(
        &self,
        page: &dyn Page,
        attributes: &BTreeMap<String, String>,
    ) -> ClickOutcome {
        let Some(intent) = Intent::from_attributes(attributes) else {
            return ClickOutcome::default();
        };

        match intent {
            Intent::Confirm { message } => ClickOutcome {
                default_prevented: !self.host.confirm(&message),
            },
            Intent::Print => {
                self.host.print();
                ClickOutcome {
                    default_prevented: true,
                }
            }
            Intent::Copy {
                target_id,
                success_message,
            } => {
                self.copy_to_clipboard(page, &target_id, &success_message)
                    .await;
                ClickOutcome {
                    default_prevented: true,
                }
            }
            Intent::DownloadBackupCodes { container_id } => {
                self.download_backup_codes(page, &container_id);
                ClickOutcome {
                    default_prevented: true,
                }
            }
        }
    }

    /// Copy an element's text and tell the user how it went.
    ///
    /// Never fails: every error ends in the failure alert.
    pub async fn copy_to_clipboard(
        &self,
        page: &dyn Page,
        element_id: &str,
        success_message: &str,
    ) -> CopyReport {
        let Some(text) = page.element_text(element_id) else {
            self.host.alert(COPY_FAILED_MESSAGE);
            return CopyReport::Failed;
        };

        match self.clipboard.write_text(&text).await {
            Ok(path) => {
                self.host.alert(success_message);
                CopyReport::Copied(path)
            }
            Err(_) => {
                self.host.alert(COPY_FAILED_MESSAGE);
                CopyReport::Failed
            }
        }
    }

    /// Offer the container's child texts as the backup code download.
    pub fn download_backup_codes(&self, page: &dyn Page, container_id: &str) -> Option<DownloadFile> {
        let codes = page.child_texts(container_id)?;
        let file = DownloadFile::backup_codes(&codes);
        self.host.offer_download(&file);
        Some(file)
    }
}
