use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::HarvestConfig;
use crate::error::{HarvestError, Result};
use crate::results::{HarvestReport, Outcome, StopReason, VisitRecord};

pub const MANIFEST_FILE: &str = "manifest.json";

/// Kinds of files captured per page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Screenshot,
    Text,
    Pdf,
}

impl ArtifactKind {
    pub fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Screenshot => "png",
            ArtifactKind::Text => "txt",
            ArtifactKind::Pdf => "pdf",
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            ArtifactKind::Screenshot => "screenshot",
            ArtifactKind::Text => "text",
            ArtifactKind::Pdf => "PDF",
        }
    }
}

/// Writes artifacts into the output directory and hands out base names
#[derive(Debug)]
pub struct ArtifactWriter {
    dir: PathBuf,
    poll_attempts: u32,
    poll_interval: Duration,
    allocated: HashSet<String>,
}

impl ArtifactWriter {
    /// Creates the output directory if absent
    pub async fn create(
        dir: impl Into<PathBuf>,
        poll_attempts: u32,
        poll_interval: Duration,
    ) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| HarvestError::io(&dir, e))?;

        Ok(Self {
            dir,
            poll_attempts,
            poll_interval,
            allocated: HashSet::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reserves `base` for this run, suffixing `_2`, `_3`, ... if it was
    /// already handed out. Comparison ignores case.
    pub fn allocate(&mut self, base: &str) -> String {
        let mut candidate = base.to_string();
        let mut n = 1;
        while !self.allocated.insert(candidate.to_lowercase()) {
            n += 1;
            candidate = format!("{}_{}", base, n);
        }
        if n > 1 {
            ::log::warn!("Name '{}' already used in this run, writing '{}'", base, candidate);
        }
        candidate
    }

    pub fn path_for(&self, base: &str, kind: ArtifactKind) -> PathBuf {
        self.dir.join(format!("{}.{}", base, kind.extension()))
    }

    /// Writes one artifact and waits until it is visible on disk
    pub async fn write(&self, base: &str, kind: ArtifactKind, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(base, kind);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| HarvestError::io(&path, e))?;
        // An empty text dump is legitimate; images and PDFs never are
        let min_len = if kind == ArtifactKind::Text { 0 } else { 1 };
        wait_for_file(&path, min_len, self.poll_attempts, self.poll_interval).await?;
        ::log::debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    /// Writes `manifest.json` describing the run
    pub async fn write_manifest(
        &self,
        report: &HarvestReport,
        config: &HarvestConfig,
    ) -> Result<PathBuf> {
        let manifest = Manifest::new(report, config);
        let json = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| HarvestError::Config(format!("manifest serialization: {}", e)))?;
        let path = self.dir.join(MANIFEST_FILE);
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| HarvestError::io(&path, e))?;
        Ok(path)
    }
}

/// Polls until `path` exists and holds at least `min_len` bytes
pub async fn wait_for_file(
    path: &Path,
    min_len: u64,
    attempts: u32,
    interval: Duration,
) -> Result<()> {
    for attempt in 0..attempts {
        if let Ok(meta) = tokio::fs::metadata(path).await {
            if meta.len() >= min_len {
                return Ok(());
            }
        }
        if attempt + 1 < attempts {
            tokio::time::sleep(interval).await;
        }
    }

    Err(HarvestError::CaptureTimeout {
        path: path.to_path_buf(),
        attempts,
    })
}

#[derive(Serialize)]
struct ManifestError {
    kind: &'static str,
    message: String,
}

#[derive(Serialize)]
struct Manifest<'a> {
    records: &'a [VisitRecord],
    stop_reason: Option<StopReason>,
    error: Option<ManifestError>,
    config: &'a HarvestConfig,
}

impl<'a> Manifest<'a> {
    fn new(report: &'a HarvestReport, config: &'a HarvestConfig) -> Self {
        let (stop_reason, error) = match &report.outcome {
            Outcome::Finished(reason) => (Some(*reason), None),
            Outcome::Aborted(err) => (
                None,
                Some(ManifestError {
                    kind: err.kind(),
                    message: err.to_string(),
                }),
            ),
        };
        Self {
            records: &report.records,
            stop_reason,
            error,
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_write() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("out");
        let writer = ArtifactWriter::create(&dir, 5, Duration::from_millis(1))
            .await
            .unwrap();
        assert!(dir.is_dir());

        let path = writer
            .write("01_Overview", ArtifactKind::Text, b"hello")
            .await
            .unwrap();
        assert_eq!(path, dir.join("01_Overview.txt"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");

        let empty = writer.write("02_Blank", ArtifactKind::Text, b"").await.unwrap();
        assert_eq!(std::fs::metadata(empty).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_empty_artifact_times_out() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::create(tmp.path(), 3, Duration::from_millis(1))
            .await
            .unwrap();

        let err = writer
            .write("blank", ArtifactKind::Screenshot, b"")
            .await
            .unwrap_err();
        match err {
            HarvestError::CaptureTimeout { path, attempts } => {
                assert_eq!(path, tmp.path().join("blank.png"));
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_allocate_avoids_collisions() {
        let tmp = tempfile::tempdir().unwrap();
        let mut writer = ArtifactWriter::create(tmp.path(), 1, Duration::from_millis(1))
            .await
            .unwrap();

        assert_eq!(writer.allocate("Overview"), "Overview");
        assert_eq!(writer.allocate("Overview"), "Overview_2");
        assert_eq!(writer.allocate("overview"), "overview_3");
        assert_eq!(writer.allocate("Authentication"), "Authentication");
    }

    #[tokio::test]
    async fn test_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::create(tmp.path(), 1, Duration::from_millis(1))
            .await
            .unwrap();
        let report = HarvestReport {
            records: vec![VisitRecord {
                sequence: 1,
                url: "https://example.com/a".to_string(),
                title: "A".to_string(),
                artifacts: vec![tmp.path().join("01_A.png")],
            }],
            outcome: Outcome::Finished(StopReason::EndOfDocument),
        };
        let config = HarvestConfig::new("https://example.com/a");

        let path = writer.write_manifest(&report, &config).await.unwrap();
        let json: serde_json::Value =
            serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
        assert_eq!(json["stop_reason"], "end_of_document");
        assert!(json["error"].is_null());
        assert_eq!(json["records"][0]["sequence"], 1);
        assert_eq!(json["config"]["start_url"], "https://example.com/a");
    }
}
