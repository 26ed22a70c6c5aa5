use crate::browser::{scripts, BrowserSession, Navigation, PageSnapshot, SessionError};
use crate::config::{BrowserConfig, MarkupConfig};
use crate::render::{PrintLayout, PrintPreparation};
use chromiumoxide::browser::{Browser, BrowserConfig as LaunchConfig};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::task::JoinHandle;

/// A single Chrome tab driven over the DevTools protocol
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromeSession {
    /// Launches Chrome and opens one blank page
    pub async fn launch(config: &BrowserConfig) -> Result<Self, SessionError> {
        let mut builder =
            LaunchConfig::builder().window_size(config.window_width, config.window_height);
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &config.executable {
            builder = builder.chrome_executable(executable);
        }
        let launch_config = builder.build().map_err(SessionError::Launch)?;

        let (browser, mut handler) = Browser::launch(launch_config)
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        // The handler must be polled for any command to complete
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("CDP handler event error: {}", e);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        tracing::info!(
            "Launched {} browser ({}x{})",
            if config.headless { "headless" } else { "headed" },
            config.window_width,
            config.window_height
        );

        Ok(Self {
            browser,
            page,
            handler,
        })
    }

    async fn evaluate(&self, script: String) -> Result<serde_json::Value, SessionError> {
        let params = EvaluateParams::builder()
            .expression(script)
            .return_by_value(true)
            .build()
            .map_err(SessionError::Script)?;

        let result = self
            .page
            .evaluate_expression(params)
            .await
            .map_err(|e| SessionError::Script(e.to_string()))?;

        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }
}

impl BrowserSession for ChromeSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<Navigation, SessionError> {
        tracing::debug!("Navigating to {}", url);

        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(Navigation::Loaded),
            Ok(Err(e)) => Err(SessionError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            }),
            Err(_) => {
                tracing::warn!("Navigation to {} timed out after {:?}", url, timeout);
                Ok(Navigation::TimedOut)
            }
        }
    }

    async fn snapshot(&mut self) -> Result<PageSnapshot, SessionError> {
        let url = self
            .page
            .url()
            .await
            .map_err(|e| SessionError::Script(e.to_string()))?
            .unwrap_or_default();
        let html = self
            .page
            .content()
            .await
            .map_err(|e| SessionError::Script(e.to_string()))?;

        Ok(PageSnapshot { url, html })
    }

    async fn reveal_section(
        &mut self,
        title: &str,
        markup: &MarkupConfig,
    ) -> Result<bool, SessionError> {
        let found = self.evaluate(scripts::reveal_section(title, markup)).await?;
        Ok(found.as_bool().unwrap_or(false))
    }

    async fn reveal_all_sections(&mut self, markup: &MarkupConfig) -> Result<(), SessionError> {
        let count = self.evaluate(scripts::reveal_all_sections(markup)).await?;
        tracing::debug!("Opened {} navigation sections", count);
        Ok(())
    }

    async fn annotate_geometry(&mut self, markup: &MarkupConfig) -> Result<(), SessionError> {
        let count = self.evaluate(scripts::annotate_geometry(markup)).await?;
        tracing::debug!("Annotated geometry of {} navigation anchors", count);
        Ok(())
    }

    async fn prepare_for_print(
        &mut self,
        preparation: &PrintPreparation<'_>,
    ) -> Result<(), SessionError> {
        self.evaluate(scripts::prepare_for_print(preparation))
            .await?;
        Ok(())
    }

    async fn print_pdf(
        &mut self,
        destination: &Path,
        layout: &PrintLayout,
    ) -> Result<u64, SessionError> {
        let params = PrintToPdfParams {
            paper_width: Some(layout.paper_width_in),
            paper_height: Some(layout.paper_height_in),
            margin_top: Some(layout.margin_in),
            margin_bottom: Some(layout.margin_in),
            margin_left: Some(layout.margin_in),
            margin_right: Some(layout.margin_in),
            print_background: Some(true),
            ..Default::default()
        };

        let bytes = self
            .page
            .pdf(params)
            .await
            .map_err(|e| SessionError::Print {
                path: destination.display().to_string(),
                message: e.to_string(),
            })?;

        tokio::fs::write(destination, &bytes).await?;
        Ok(bytes.len() as u64)
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        if let Err(e) = self.browser.close().await {
            tracing::warn!("Browser did not close cleanly: {}", e);
        }
        let _ = self.browser.wait().await;
        self.handler.abort();
        Ok(())
    }
}
