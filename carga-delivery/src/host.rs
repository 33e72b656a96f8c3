//! The host seam: everything the delivery layer asks of its environment.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::{DeliveryError, DeliveryResult};
use crate::registry::ObjectUrl;

/// Handle to a window opened by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub String);

/// Capabilities provided by the environment (browser, file system, test double).
#[async_trait]
pub trait DeliveryHost: Send + Sync {
    /// Save the content behind `url` under `filename`.
    async fn trigger_download(
        &self,
        url: &ObjectUrl,
        filename: &str,
        bytes: &[u8],
    ) -> DeliveryResult<()>;

    /// Show the content behind `url` in an embedded viewer.
    async fn show_preview(&self, url: &ObjectUrl, filename: &str, bytes: &[u8])
        -> DeliveryResult<()>;

    /// Open a new window. Fails with [`DeliveryError::PopupBlocked`] when refused.
    async fn open_window(&self, name: &str) -> DeliveryResult<WindowHandle>;

    /// Replace the window's document.
    async fn write_window(&self, window: &WindowHandle, html: &str) -> DeliveryResult<()>;

    /// Close a window. Closing an already closed window is not an error.
    async fn close_window(&self, window: &WindowHandle) -> DeliveryResult<()>;

    /// Put text on the clipboard.
    async fn write_clipboard(&self, text: &str) -> DeliveryResult<()>;

    /// Invoke the native share sheet.
    async fn share(&self, title: &str, text: &str) -> DeliveryResult<()>;

    /// Whether the host is a mobile device.
    fn is_mobile(&self) -> bool;
}

/// Host that materializes downloads and windows as files in a directory.
#[derive(Debug)]
pub struct FsHost {
    out_dir: PathBuf,
    mobile: bool,
    windows: Mutex<HashMap<WindowHandle, PathBuf>>,
}

impl FsHost {
    /// Create a host writing into `out_dir`.
    #[must_use]
    pub fn new(out_dir: impl Into<PathBuf>, mobile: bool) -> Self {
        Self {
            out_dir: out_dir.into(),
            mobile,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Output directory.
    #[must_use]
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    async fn write_file(&self, filename: &str, bytes: &[u8]) -> DeliveryResult<PathBuf> {
        tokio::fs::create_dir_all(&self.out_dir).await?;
        let path = self.out_dir.join(filename);
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    fn window_path(&self, window: &WindowHandle) -> DeliveryResult<PathBuf> {
        self.windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(window)
            .cloned()
            .ok_or_else(|| DeliveryError::UnknownWindow(window.0.clone()))
    }
}

#[async_trait]
impl DeliveryHost for FsHost {
    async fn trigger_download(
        &self,
        url: &ObjectUrl,
        filename: &str,
        bytes: &[u8],
    ) -> DeliveryResult<()> {
        let path = self.write_file(filename, bytes).await?;
        tracing::info!(url = %url, path = %path.display(), "Download saved");
        Ok(())
    }

    async fn show_preview(
        &self,
        url: &ObjectUrl,
        filename: &str,
        bytes: &[u8],
    ) -> DeliveryResult<()> {
        let path = self.write_file(&format!("preview_{filename}"), bytes).await?;
        tracing::info!(url = %url, path = %path.display(), "Preview written");
        Ok(())
    }

    async fn open_window(&self, name: &str) -> DeliveryResult<WindowHandle> {
        let handle = WindowHandle(format!("window-{}", uuid::Uuid::new_v4()));
        let path = self.out_dir.join(format!("print_{name}"));
        self.windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle.clone(), path);
        Ok(handle)
    }

    async fn write_window(&self, window: &WindowHandle, html: &str) -> DeliveryResult<()> {
        let path = self.window_path(window)?;
        tokio::fs::create_dir_all(&self.out_dir).await?;
        tokio::fs::write(&path, html).await?;
        tracing::info!(window = %window.0, path = %path.display(), "Print document written");
        Ok(())
    }

    async fn close_window(&self, window: &WindowHandle) -> DeliveryResult<()> {
        let removed = self
            .windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(window);
        if removed.is_some() {
            tracing::debug!(window = %window.0, "Window closed");
        }
        Ok(())
    }

    async fn write_clipboard(&self, _text: &str) -> DeliveryResult<()> {
        Err(DeliveryError::ClipboardDenied)
    }

    async fn share(&self, _title: &str, _text: &str) -> DeliveryResult<()> {
        Err(DeliveryError::ShareUnsupported)
    }

    fn is_mobile(&self) -> bool {
        self.mobile
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_download_and_window_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let host = FsHost::new(dir.path(), false);
        let url = ObjectUrl::for_tests("blob:carga/test");

        host.trigger_download(&url, "a.csv", b"No.\n")
            .await
            .expect("download");
        assert_eq!(
            std::fs::read(dir.path().join("a.csv")).expect("read"),
            b"No.\n"
        );

        let window = host.open_window("r.html").await.expect("window");
        host.write_window(&window, "<html></html>")
            .await
            .expect("write");
        assert!(dir.path().join("print_r.html").exists());
        host.close_window(&window).await.expect("close");
        assert!(matches!(
            host.write_window(&window, "x").await,
            Err(DeliveryError::UnknownWindow(_))
        ));
    }

    #[tokio::test]
    async fn test_clipboard_and_share_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let host = FsHost::new(dir.path(), true);
        assert!(host.is_mobile());
        assert!(matches!(
            host.write_clipboard("x").await,
            Err(DeliveryError::ClipboardDenied)
        ));
        assert!(matches!(
            host.share("t", "x").await,
            Err(DeliveryError::ShareUnsupported)
        ));
    }
}
