use std::path::PathBuf;
use std::time::Duration;

use crate::artifacts::{ArtifactKind, ArtifactWriter};
use crate::browser::PageDriver;
use crate::config::HarvestConfig;
use crate::error::{HarvestError, Result};
use crate::parsers::text;

/// How an incremental scroll ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollSummary {
    pub steps: u32,
    /// False when the step cap was hit before reaching the bottom
    pub reached_bottom: bool,
}

/// Scrolls down `step_px` at a time until the scrolled distance reaches the
/// document height, re-reading the height before every step. Performs at
/// most `max_steps` steps.
pub async fn scroll_to_bottom<D: PageDriver>(
    driver: &mut D,
    step_px: u32,
    delay: Duration,
    max_steps: u32,
) -> Result<ScrollSummary> {
    let mut scrolled: u64 = 0;
    let mut steps = 0;

    loop {
        let height = driver.scroll_height().await?;
        if scrolled >= height {
            return Ok(ScrollSummary {
                steps,
                reached_bottom: true,
            });
        }
        if steps >= max_steps {
            ::log::warn!(
                "Gave up scrolling after {} steps ({}px scrolled, height now {}px)",
                steps,
                scrolled,
                height
            );
            return Ok(ScrollSummary {
                steps,
                reached_bottom: false,
            });
        }

        driver.scroll_by(step_px).await?;
        scrolled += u64::from(step_px);
        steps += 1;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

fn capture_failed(artifact: &'static str) -> impl FnOnce(HarvestError) -> HarvestError {
    move |err| match err {
        err @ (HarvestError::CaptureFailed { .. } | HarvestError::CaptureTimeout { .. }) => err,
        other => HarvestError::CaptureFailed {
            artifact,
            reason: other.to_string(),
        },
    }
}

/// Renders lazy content and writes the page's artifacts
pub struct Materializer<'a> {
    config: &'a HarvestConfig,
}

impl<'a> Materializer<'a> {
    pub fn new(config: &'a HarvestConfig) -> Self {
        Self { config }
    }

    /// Captures screenshot, text and (if `with_pdf`) PDF under `base`,
    /// returning the written paths in that order
    pub async fn materialize<D: PageDriver>(
        &self,
        driver: &mut D,
        writer: &ArtifactWriter,
        base: &str,
        sequence: u32,
        with_pdf: bool,
    ) -> Result<Vec<PathBuf>> {
        let config = self.config;

        let summary = scroll_to_bottom(
            driver,
            config.step_px,
            config.step_delay(),
            config.max_scroll_steps,
        )
        .await
        .map_err(capture_failed("scroll"))?;
        ::log::debug!("[{}] Scrolled {} steps", sequence, summary.steps);

        driver
            .reset_scroll_clipping(config.scroll_container.as_deref())
            .await
            .map_err(capture_failed("style reset"))?;

        let mut paths = Vec::with_capacity(3);

        let image = driver
            .screenshot_full_page()
            .await
            .map_err(capture_failed(ArtifactKind::Screenshot.describe()))?;
        ::log::info!(
            "[{}] Saving screenshot: {}",
            sequence,
            writer.path_for(base, ArtifactKind::Screenshot).display()
        );
        paths.push(writer.write(base, ArtifactKind::Screenshot, &image).await?);

        let mut dump = driver
            .visible_text()
            .await
            .map_err(capture_failed(ArtifactKind::Text.describe()))?;
        if config.normalize_text {
            dump = text::normalize_dump(&dump);
        }
        paths.push(writer.write(base, ArtifactKind::Text, dump.as_bytes()).await?);

        if with_pdf {
            let pdf = driver
                .print_pdf()
                .await
                .map_err(capture_failed(ArtifactKind::Pdf.describe()))?;
            ::log::info!(
                "[{}] Saving PDF: {}",
                sequence,
                writer.path_for(base, ArtifactKind::Pdf).display()
            );
            paths.push(writer.write(base, ArtifactKind::Pdf, &pdf).await?);
        }

        Ok(paths)
    }
}
