//! Download, print, preview and share flows with their fallbacks.

use std::sync::Arc;
use std::time::Duration;

use carga_core::config::{PREVIEW_URL_TTL, PRINT_WINDOW_TIMEOUT};
use carga_core::{fixed, ExportExtension, Platform};
use carga_renderer::{with_auto_print, wrap_for_mobile, Artifact};

use crate::error::{DeliveryError, DeliveryResult};
use crate::host::{DeliveryHost, WindowHandle};
use crate::registry::{ObjectUrl, ObjectUrlRegistry};

/// Instructions shown when neither native share nor the clipboard work.
pub const MANUAL_COPY_INSTRUCTIONS: &str =
    "No se pudo compartir automáticamente. Copie el texto manualmente.";

/// Delivery timing.
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// Print windows are closed after this long.
    pub print_window_timeout: Duration,
    /// Preview URLs are revoked after this long.
    pub preview_url_ttl: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            print_window_timeout: PRINT_WINDOW_TIMEOUT,
            preview_url_ttl: PREVIEW_URL_TTL,
        }
    }
}

/// User-visible result of a delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The artifact was handed to the host as a download.
    Downloaded {
        /// Saved file name.
        filename: String,
    },
    /// A print window was opened.
    PrintWindowOpened {
        /// The window, closed automatically after the timeout.
        window: WindowHandle,
        /// Whether the mobile wrapper was used instead of auto-print.
        mobile: bool,
    },
    /// The window could not be opened; the HTML was downloaded instead.
    FellBackToDownload {
        /// Saved file name.
        filename: String,
        /// Why the window flow failed.
        reason: String,
    },
    /// An inline preview is available until the URL expires.
    PreviewReady {
        /// Preview URL.
        url: ObjectUrl,
        /// Time until revocation.
        expires_in: Duration,
    },
}

/// Result of a share attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareOutcome {
    /// Native share sheet accepted the content.
    Shared,
    /// Text was placed on the clipboard.
    CopiedToClipboard,
    /// Nothing worked; the user must copy the text by hand.
    ManualCopy {
        /// Text to copy.
        text: String,
        /// Instructions for the user.
        instructions: &'static str,
    },
}

/// Short plain-text summary of a platform for sharing.
#[must_use]
pub fn share_text(platform: &Platform) -> String {
    format!(
        "Plataforma {}\nFecha: {}\nPiezas: {}\nLongitud total: {} m\nMetros lineales: {}",
        platform.platform_number,
        platform.reception_date.format("%d/%m/%Y"),
        platform.pieces.len(),
        fixed(platform.total_length, 2),
        fixed(platform.total_linear_meters, 3),
    )
}

/// Presents artifacts through a [`DeliveryHost`].
#[derive(Debug)]
pub struct Delivery<H> {
    host: Arc<H>,
    registry: ObjectUrlRegistry,
    config: DeliveryConfig,
}

impl<H: DeliveryHost + 'static> Delivery<H> {
    /// Create a delivery layer over `host`.
    #[must_use]
    pub fn new(host: H, config: DeliveryConfig) -> Self {
        Self {
            host: Arc::new(host),
            registry: ObjectUrlRegistry::new(),
            config,
        }
    }

    /// The host.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The object URL registry.
    #[must_use]
    pub fn registry(&self) -> &ObjectUrlRegistry {
        &self.registry
    }

    /// Download an artifact. Its object URL is revoked as soon as the host returns.
    ///
    /// # Errors
    ///
    /// Returns the host error; the URL is revoked either way.
    #[tracing::instrument(skip(self, artifact), fields(filename = %artifact.filename))]
    pub async fn download(&self, artifact: Artifact) -> DeliveryResult<DeliveryOutcome> {
        self.sweep_stale();
        let filename = artifact.filename.clone();
        let url = self.registry.create(artifact);
        let result = match self.registry.resolve(&url) {
            Some(artifact) => {
                self.host
                    .trigger_download(&url, &artifact.filename, &artifact.bytes)
                    .await
            }
            None => Err(DeliveryError::UnknownUrl(url.to_string())),
        };
        self.registry.revoke(&url);
        result?;
        Ok(DeliveryOutcome::Downloaded { filename })
    }

    /// Open a print window with the HTML report.
    ///
    /// On desktop the document prints itself on load; on mobile it gets a
    /// navigation bar and the user starts printing. The window is closed
    /// after the configured timeout. If the window cannot be opened the HTML
    /// is downloaded instead.
    ///
    /// # Errors
    ///
    /// Returns an error only if the fallback download also fails.
    #[tracing::instrument(skip(self, html))]
    pub async fn print_html(&self, html: &str, filename: &str) -> DeliveryResult<DeliveryOutcome> {
        let mobile = self.host.is_mobile();
        let window = match self.host.open_window(filename).await {
            Ok(window) => window,
            Err(e) => return self.fall_back_to_download(html, filename, &e).await,
        };

        let document = if mobile {
            wrap_for_mobile(html)
        } else {
            with_auto_print(html)
        };
        if let Err(e) = self.host.write_window(&window, &document).await {
            if let Err(close) = self.host.close_window(&window).await {
                tracing::warn!(window = %window.0, error = %close, "Failed to close print window");
            }
            return self.fall_back_to_download(html, filename, &e).await;
        }

        self.schedule_close(window.clone());
        tracing::info!(window = %window.0, mobile, "Print window opened");
        Ok(DeliveryOutcome::PrintWindowOpened { window, mobile })
    }

    async fn fall_back_to_download(
        &self,
        html: &str,
        filename: &str,
        cause: &DeliveryError,
    ) -> DeliveryResult<DeliveryOutcome> {
        tracing::warn!(error = %cause, "Print window unavailable, downloading HTML instead");
        let filename = html_filename(filename);
        let artifact = Artifact::text(
            filename.clone(),
            ExportExtension::Html.mime_type(),
            html.to_string(),
        );
        self.download(artifact).await?;
        Ok(DeliveryOutcome::FellBackToDownload {
            filename,
            reason: cause.to_string(),
        })
    }

    /// Revoke URLs that outlived the preview TTL, e.g. when a timer task was
    /// dropped with its runtime.
    fn sweep_stale(&self) {
        self.registry.sweep_older_than(self.config.preview_url_ttl);
    }

    fn schedule_close(&self, window: WindowHandle) {
        let host = Arc::clone(&self.host);
        let timeout = self.config.print_window_timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Err(e) = host.close_window(&window).await {
                tracing::warn!(window = %window.0, error = %e, "Failed to auto-close print window");
            } else {
                tracing::debug!(window = %window.0, "Print window auto-closed");
            }
        });
    }

    /// Offer an artifact for inline preview; the URL is revoked after the TTL.
    ///
    /// # Errors
    ///
    /// Returns the host error; the URL is revoked immediately in that case.
    #[tracing::instrument(skip(self, artifact), fields(filename = %artifact.filename))]
    pub async fn preview(&self, artifact: Artifact) -> DeliveryResult<DeliveryOutcome> {
        self.sweep_stale();
        let url = self.registry.create(artifact);
        let shown = match self.registry.resolve(&url) {
            Some(artifact) => {
                self.host
                    .show_preview(&url, &artifact.filename, &artifact.bytes)
                    .await
            }
            None => Err(DeliveryError::UnknownUrl(url.to_string())),
        };
        if let Err(e) = shown {
            self.registry.revoke(&url);
            return Err(e);
        }

        let expires_in = self.config.preview_url_ttl;
        self.registry.revoke_after(url.clone(), expires_in);
        Ok(DeliveryOutcome::PreviewReady { url, expires_in })
    }

    /// Share text natively, else via the clipboard, else ask for a manual copy.
    ///
    /// # Errors
    ///
    /// Host failures other than the expected "unsupported"/"denied" ones
    /// propagate.
    #[tracing::instrument(skip(self, text))]
    pub async fn share(&self, title: &str, text: &str) -> DeliveryResult<ShareOutcome> {
        match self.host.share(title, text).await {
            Ok(()) => return Ok(ShareOutcome::Shared),
            Err(DeliveryError::ShareUnsupported) => {
                tracing::debug!("Native share unsupported, trying clipboard");
            }
            Err(e) => return Err(e),
        }

        match self.host.write_clipboard(text).await {
            Ok(()) => Ok(ShareOutcome::CopiedToClipboard),
            Err(DeliveryError::ClipboardDenied) => {
                tracing::warn!("Clipboard denied, asking for manual copy");
                Ok(ShareOutcome::ManualCopy {
                    text: text.to_string(),
                    instructions: MANUAL_COPY_INSTRUCTIONS,
                })
            }
            Err(e) => Err(e),
        }
    }
}

fn html_filename(name: &str) -> String {
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    format!("{stem}.html")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct RecordingHost {
        popups_blocked: bool,
        write_fails: bool,
        mobile: bool,
        share_supported: bool,
        clipboard_allowed: bool,
        events: Mutex<Vec<String>>,
        documents: Mutex<Vec<String>>,
    }

    impl RecordingHost {
        fn record(&self, event: String) {
            self.events.lock().expect("lock").push(event);
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl DeliveryHost for RecordingHost {
        async fn trigger_download(
            &self,
            _url: &ObjectUrl,
            filename: &str,
            _bytes: &[u8],
        ) -> DeliveryResult<()> {
            self.record(format!("download:{filename}"));
            Ok(())
        }

        async fn show_preview(
            &self,
            _url: &ObjectUrl,
            filename: &str,
            _bytes: &[u8],
        ) -> DeliveryResult<()> {
            self.record(format!("preview:{filename}"));
            Ok(())
        }

        async fn open_window(&self, name: &str) -> DeliveryResult<WindowHandle> {
            if self.popups_blocked {
                return Err(DeliveryError::PopupBlocked);
            }
            self.record(format!("open:{name}"));
            Ok(WindowHandle("w1".to_string()))
        }

        async fn write_window(&self, window: &WindowHandle, html: &str) -> DeliveryResult<()> {
            if self.write_fails {
                return Err(DeliveryError::UnknownWindow(window.0.clone()));
            }
            self.documents.lock().expect("lock").push(html.to_string());
            Ok(())
        }

        async fn close_window(&self, window: &WindowHandle) -> DeliveryResult<()> {
            self.record(format!("close:{}", window.0));
            Ok(())
        }

        async fn write_clipboard(&self, _text: &str) -> DeliveryResult<()> {
            if self.clipboard_allowed {
                Ok(())
            } else {
                Err(DeliveryError::ClipboardDenied)
            }
        }

        async fn share(&self, _title: &str, _text: &str) -> DeliveryResult<()> {
            if self.share_supported {
                Ok(())
            } else {
                Err(DeliveryError::ShareUnsupported)
            }
        }

        fn is_mobile(&self) -> bool {
            self.mobile
        }
    }

    const HTML: &str = "<!DOCTYPE html><html><head></head><body><p>x</p></body></html>";

    fn csv_artifact() -> Artifact {
        Artifact::text("Plataforma_P-1_2024-03-15.csv", "text/csv;charset=utf-8", "No.\n".to_string())
    }

    #[tokio::test]
    async fn test_download_revokes_immediately() {
        let delivery = Delivery::new(RecordingHost::default(), DeliveryConfig::default());
        let outcome = delivery.download(csv_artifact()).await.expect("download");
        assert_eq!(
            outcome,
            DeliveryOutcome::Downloaded {
                filename: "Plataforma_P-1_2024-03-15.csv".to_string()
            }
        );
        assert_eq!(delivery.registry().live_count(), 0);
        assert_eq!(delivery.registry().totals(), (1, 1));
        assert_eq!(delivery.host().events(), vec!["download:Plataforma_P-1_2024-03-15.csv"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_desktop_print_auto_prints_and_closes() {
        let delivery = Delivery::new(RecordingHost::default(), DeliveryConfig::default());
        let outcome = delivery.print_html(HTML, "r.html").await.expect("print");
        assert!(matches!(outcome, DeliveryOutcome::PrintWindowOpened { mobile: false, .. }));
        {
            let documents = delivery.host().documents.lock().expect("lock");
            assert!(documents[0].contains("window.print()"));
            assert!(!documents[0].contains("app-bar"));
        }

        tokio::time::sleep(PRINT_WINDOW_TIMEOUT - Duration::from_secs(1)).await;
        assert!(!delivery.host().events().contains(&"close:w1".to_string()));
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(delivery.host().events().contains(&"close:w1".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mobile_print_uses_wrapper() {
        let host = RecordingHost {
            mobile: true,
            ..RecordingHost::default()
        };
        let delivery = Delivery::new(host, DeliveryConfig::default());
        let outcome = delivery.print_html(HTML, "r.html").await.expect("print");
        assert!(matches!(outcome, DeliveryOutcome::PrintWindowOpened { mobile: true, .. }));
        let documents = delivery.host().documents.lock().expect("lock");
        assert!(documents[0].contains("app-bar"));
        assert!(!documents[0].contains("addEventListener('load'"));
    }

    #[tokio::test]
    async fn test_popup_blocked_falls_back_to_html_download() {
        let host = RecordingHost {
            popups_blocked: true,
            ..RecordingHost::default()
        };
        let delivery = Delivery::new(host, DeliveryConfig::default());
        let outcome = delivery
            .print_html(HTML, "Plataforma_P-1_2024-03-15.pdf")
            .await
            .expect("fallback");
        match outcome {
            DeliveryOutcome::FellBackToDownload { filename, reason } => {
                assert_eq!(filename, "Plataforma_P-1_2024-03-15.html");
                assert!(reason.contains("Popup blocked"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(delivery.registry().live_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_window_write_closes_and_downloads_html() {
        let host = RecordingHost {
            write_fails: true,
            ..RecordingHost::default()
        };
        let delivery = Delivery::new(host, DeliveryConfig::default());
        let outcome = delivery
            .print_html(HTML, "Reporte_Carga_P-1_2024-03-15.pdf")
            .await
            .expect("fallback");
        match outcome {
            DeliveryOutcome::FellBackToDownload { filename, reason } => {
                assert_eq!(filename, "Reporte_Carga_P-1_2024-03-15.html");
                assert!(reason.contains("Unknown window: w1"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(
            delivery.host().events(),
            vec![
                "open:Reporte_Carga_P-1_2024-03-15.pdf",
                "close:w1",
                "download:Reporte_Carga_P-1_2024-03-15.html",
            ]
        );
        assert!(delivery.host().documents.lock().expect("lock").is_empty());
        assert_eq!(delivery.registry().live_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_urls_are_swept_on_next_delivery() {
        let delivery = Delivery::new(RecordingHost::default(), DeliveryConfig::default());
        delivery.registry().create(csv_artifact());
        assert_eq!(delivery.registry().live_count(), 1);

        tokio::time::advance(PREVIEW_URL_TTL + Duration::from_secs(1)).await;
        delivery.download(csv_artifact()).await.expect("download");
        assert_eq!(delivery.registry().live_count(), 0);
        assert_eq!(delivery.registry().totals(), (2, 2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_url_is_revoked_within_bound() {
        let delivery = Delivery::new(RecordingHost::default(), DeliveryConfig::default());
        delivery.download(csv_artifact()).await.expect("download");
        let preview = delivery.preview(csv_artifact()).await.expect("preview");
        delivery.preview(csv_artifact()).await.expect("preview");
        assert!(matches!(preview, DeliveryOutcome::PreviewReady { .. }));
        assert_eq!(delivery.registry().live_count(), 2);

        tokio::time::sleep(PREVIEW_URL_TTL + Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
        assert_eq!(delivery.registry().live_count(), 0);
        assert_eq!(delivery.registry().totals(), (3, 3));
    }

    #[tokio::test]
    async fn test_share_fallback_chain() {
        let platform = carga_core::Platform::new(
            "P-8",
            NaiveDate::from_ymd_opt(2024, 3, 15).expect("date"),
        );
        let text = share_text(&platform);
        assert!(text.starts_with("Plataforma P-8\nFecha: 15/03/2024"));
        assert!(text.ends_with("Longitud total: 0.00 m\nMetros lineales: 0.000"));

        let native = Delivery::new(
            RecordingHost {
                share_supported: true,
                ..RecordingHost::default()
            },
            DeliveryConfig::default(),
        );
        assert_eq!(native.share("P-8", &text).await.expect("share"), ShareOutcome::Shared);

        let clipboard = Delivery::new(
            RecordingHost {
                clipboard_allowed: true,
                ..RecordingHost::default()
            },
            DeliveryConfig::default(),
        );
        assert_eq!(
            clipboard.share("P-8", &text).await.expect("share"),
            ShareOutcome::CopiedToClipboard
        );

        let manual = Delivery::new(RecordingHost::default(), DeliveryConfig::default());
        match manual.share("P-8", &text).await.expect("share") {
            ShareOutcome::ManualCopy { text: copied, .. } => assert_eq!(copied, text),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
