//! The page-by-page capture procedure.
//!
//! A run opens the start page ([`bootstrap`]), then alternates between
//! capturing the current page ([`materializer`]) and moving to the next one
//! ([`stepper`]) until a stop condition or a fatal error. Records captured
//! before a fatal error are kept in the report.

pub mod bootstrap;
pub mod materializer;
pub mod stepper;

#[cfg(test)]
pub(crate) mod mock;
#[cfg(test)]
mod tests;

use url::Url;

use crate::artifacts::ArtifactWriter;
use crate::browser::PageDriver;
use crate::config::{HarvestConfig, NavigationMode};
use crate::error::Result;
use crate::results::{HarvestReport, Outcome, StopReason, VisitRecord};
use crate::utils::{artifact_base_name, label_base_name, strip_title_suffix};
use materializer::Materializer;
use stepper::{LinkedListStepper, StepDecision, TargetListStepper};

pub struct Harvester<'a> {
    config: &'a HarvestConfig,
}

impl<'a> Harvester<'a> {
    pub fn new(config: &'a HarvestConfig) -> Self {
        Self { config }
    }

    /// Runs the harvest on `driver` and closes it afterwards, whatever the outcome.
    ///
    /// Returns `Err` only when the run could not start (invalid configuration,
    /// unusable output directory); failures after that end up in the report.
    pub async fn run<D: PageDriver>(&self, driver: &mut D) -> Result<HarvestReport> {
        let prepared = self.prepare().await;

        let result = match prepared {
            Ok((start, mut writer)) => {
                let mut records = Vec::new();
                let outcome = match self.drive(driver, &start, &mut writer, &mut records).await {
                    Ok(reason) => {
                        ::log::info!("Harvest finished ({}) after {} pages", reason, records.len());
                        Outcome::Finished(reason)
                    }
                    Err(err) => {
                        ::log::error!("Harvest aborted after {} pages: {}", records.len(), err);
                        Outcome::Aborted(err)
                    }
                };
                Ok((writer, HarvestReport { records, outcome }))
            }
            Err(err) => Err(err),
        };

        if let Err(e) = driver.close().await {
            ::log::warn!("Failed to close browser session: {}", e);
        }

        let (writer, report) = result?;
        match writer.write_manifest(&report, self.config).await {
            Ok(path) => ::log::debug!("Wrote {}", path.display()),
            Err(e) => ::log::warn!("Failed to write manifest: {}", e),
        }
        ::log::info!("All screenshots and text files saved in: {}", writer.dir().display());

        Ok(report)
    }

    async fn prepare(&self) -> Result<(Url, ArtifactWriter)> {
        let start = self.config.validate()?;
        let writer = ArtifactWriter::create(
            &self.config.output_dir,
            self.config.file_poll_attempts,
            self.config.file_poll_interval(),
        )
        .await?;
        Ok((start, writer))
    }

    async fn drive<D: PageDriver>(
        &self,
        driver: &mut D,
        start: &Url,
        writer: &mut ArtifactWriter,
        records: &mut Vec<VisitRecord>,
    ) -> Result<StopReason> {
        bootstrap::open(driver, self.config, start).await?;

        match self.config.mode {
            NavigationMode::LinkedList => self.linked_list(driver, writer, records).await,
            NavigationMode::TargetList => self.target_list(driver, writer, records).await,
        }
    }

    fn next_sequence(&self, records: &[VisitRecord]) -> u32 {
        self.config.start_number + records.len() as u32
    }

    fn page_limit_reached(&self, records: &[VisitRecord]) -> bool {
        self.config
            .max_pages
            .is_some_and(|max| records.len() >= max as usize)
    }

    async fn linked_list<D: PageDriver>(
        &self,
        driver: &mut D,
        writer: &mut ArtifactWriter,
        records: &mut Vec<VisitRecord>,
    ) -> Result<StopReason> {
        let materializer = Materializer::new(self.config);
        let mut stepper = LinkedListStepper::new(self.config);
        let mut url = driver.current_url().await?;

        loop {
            if let StepDecision::Stop(reason) = stepper.enter(&url) {
                return Ok(reason);
            }

            let sequence = self.next_sequence(records);
            let raw_title = driver.title().await?;
            let title = strip_title_suffix(&raw_title, self.config.title_suffix.as_deref());
            let base = writer.allocate(&artifact_base_name(sequence, title));

            let artifacts = materializer
                .materialize(driver, writer, &base, sequence, true)
                .await?;
            records.push(VisitRecord {
                sequence,
                url: url.clone(),
                title: title.to_string(),
                artifacts,
            });

            if self.page_limit_reached(records) {
                return Ok(StopReason::PageLimit);
            }

            match stepper.advance(driver).await? {
                StepDecision::Continue(next) => url = next,
                StepDecision::Stop(reason) => return Ok(reason),
            }
        }
    }

    async fn target_list<D: PageDriver>(
        &self,
        driver: &mut D,
        writer: &mut ArtifactWriter,
        records: &mut Vec<VisitRecord>,
    ) -> Result<StopReason> {
        let materializer = Materializer::new(self.config);
        let mut stepper = TargetListStepper::new(self.config);

        for label in &self.config.target_labels {
            ::log::info!("=== Processing {} ===", label);
            let Some(url) = stepper.select(driver, label).await? else {
                continue;
            };

            let sequence = self.next_sequence(records);
            let base = writer.allocate(&label_base_name(label));
            let artifacts = materializer
                .materialize(driver, writer, &base, sequence, false)
                .await?;
            ::log::info!("Saved {} and text.", base);
            records.push(VisitRecord {
                sequence,
                url,
                title: label.clone(),
                artifacts,
            });

            if self.page_limit_reached(records) {
                return Ok(StopReason::PageLimit);
            }
        }

        Ok(StopReason::TargetsExhausted)
    }
}
