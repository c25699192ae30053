//! Clipboard capability with a legacy fallback.
//!
//! The asynchronous clipboard API is used when the page exposes it. When it
//! is missing or rejects the write, the text is copied through an
//! off-screen, selected text field and the copy command instead.

use async_trait::async_trait;

/// Why a clipboard write did not happen.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClipboardError {
    #[error("Clipboard write rejected: {0}")]
    Rejected(String),

    #[error("Copy command failed")]
    CommandFailed,
}

/// Which mechanism ended up writing the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyPath {
    Modern,
    Legacy,
}

/// Anything that can put text on the shared clipboard.
#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<CopyPath, ClipboardError>;
}

/// The asynchronous clipboard API.
#[async_trait]
pub trait AsyncClipboardApi: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// The legacy mechanism: select an off-screen text field and run the copy command.
pub trait SelectionCopy: Send + Sync {
    fn copy_via_selection(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Tries the modern API first and falls back to [`SelectionCopy`] once.
pub struct FallbackClipboard<A, L> {
    modern: Option<A>,
    legacy: L,
}

impl<A, L> FallbackClipboard<A, L> {
    /// `modern` is `None` when the feature probe found no clipboard API.
    pub fn probe(modern: Option<A>, legacy: L) -> Self {
        Self { modern, legacy }
    }

    pub fn has_modern_api(&self) -> bool {
        self.modern.is_some()
    }
}

#[async_trait]
impl<A, L> Clipboard for FallbackClipboard<A, L>
where
    A: AsyncClipboardApi,
    L: SelectionCopy,
{
    async fn write_text(&self, text: &str) -> Result<CopyPath, ClipboardError> {
        if let Some(api) = &self.modern {
            if api.write_text(text).await.is_ok() {
                return Ok(CopyPath::Modern);
            }
        }
        self.legacy.copy_via_selection(text).map(|()| CopyPath::Legacy)
    }
}
