//! Fixture utilities for the deterministic CLI harness.
//!
//! This module discovers recorded angle-frame fixtures, parses their
//! expectations, and replays them through a fresh [`Session`] using the
//! timestamps stored in the fixture. Replays never read the wall clock, so
//! the same fixture always yields the same records.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::frame::{IngestMode, RawAngles};
use crate::analysis::{FeedbackRecord, Session};
use crate::clock::ManualClock;
use crate::config::AppConfig;
use crate::error::ErrorCode;
use crate::profile::ThresholdPreset;

/// Default location for fixture JSON assets.
pub const DEFAULT_FIXTURE_ROOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures");

const FIXTURE_EXTENSION: &str = "json";
const EXPECT_SUFFIX: &str = ".expect.json";

/// Metadata describing an available fixture.
#[derive(Clone, Debug)]
pub struct FixtureMetadata {
    pub name: String,
    pub path: PathBuf,
    pub expect_path: Option<PathBuf>,
}

/// On-disk fixture schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureFile {
    pub exercise: String,
    #[serde(default)]
    pub preset: ThresholdPreset,
    #[serde(default)]
    pub ingest_mode: IngestMode,
    #[serde(default)]
    pub notes: Option<String>,
    pub frames: Vec<FixtureFrame>,
    #[serde(default)]
    pub expect: Option<FixtureExpectations>,
}

/// One recorded frame; `t` is seconds since the recording started.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureFrame {
    pub t: f64,
    pub angles: RawAngles,
}

/// Loaded fixture with resolved expectations.
pub struct FixtureData {
    pub metadata: FixtureMetadata,
    pub fixture: FixtureFile,
    pub expectations: Option<FixtureExpectations>,
}

/// JSON expectation schema for fixture verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureExpectations {
    pub correct: u32,
    pub incorrect: u32,
    /// Frames the session must reject; unchecked when absent
    #[serde(default)]
    pub rejected_frames: Option<usize>,
    /// Phase in effect after the last accepted frame; unchecked when absent
    #[serde(default)]
    pub final_phase: Option<String>,
}

impl FixtureExpectations {
    pub fn verify(&self, report: &FixtureReport) -> std::result::Result<(), ExpectationDiff> {
        let mut failures = Vec::new();
        let mut check = |field: &str, expected: String, actual: String| {
            if expected != actual {
                failures.push(ExpectationFailure {
                    field: field.to_string(),
                    expected,
                    actual,
                });
            }
        };

        check(
            "correct",
            self.correct.to_string(),
            report.correct_count.to_string(),
        );
        check(
            "incorrect",
            self.incorrect.to_string(),
            report.incorrect_count.to_string(),
        );
        if let Some(rejected) = self.rejected_frames {
            check(
                "rejected_frames",
                rejected.to_string(),
                report.rejected.len().to_string(),
            );
        }
        if let Some(phase) = &self.final_phase {
            check("final_phase", phase.clone(), report.final_phase.clone());
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ExpectationDiff { failures })
        }
    }
}

/// Outcome of comparing a replay with expectations.
#[derive(Debug)]
pub struct ExpectationDiff {
    pub failures: Vec<ExpectationFailure>,
}

impl ExpectationDiff {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "failures": self.failures.iter().map(|failure| {
                serde_json::json!({
                    "field": failure.field,
                    "expected": failure.expected,
                    "actual": failure.actual,
                })
            }).collect::<Vec<_>>()
        })
    }
}

/// Detailed diff entry for a single failure.
#[derive(Debug)]
pub struct ExpectationFailure {
    pub field: String,
    pub expected: String,
    pub actual: String,
}

/// A frame the session refused.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedFrame {
    pub index: usize,
    pub code: i32,
    pub message: String,
}

/// Summary of one replay.
#[derive(Debug, Clone, Serialize)]
pub struct FixtureReport {
    pub fixture: String,
    pub exercise: String,
    pub frames: usize,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub final_phase: String,
    pub rejected: Vec<RejectedFrame>,
}

/// Records and summary produced by a replay.
pub struct FixtureRun {
    pub records: Vec<FeedbackRecord>,
    pub report: FixtureReport,
}

/// Catalog responsible for discovering fixtures on disk.
pub struct FixtureCatalog {
    root: PathBuf,
}

impl FixtureCatalog {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List all fixtures by their metadata.
    pub fn discover(&self) -> Result<Vec<FixtureMetadata>> {
        let mut fixtures = Vec::new();
        if !self.root.exists() {
            return Ok(fixtures);
        }

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                let path = entry.path();
                if is_fixture_file(&path) {
                    fixtures.push(self.metadata_for_path(&path)?);
                }
            }
        }

        fixtures.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(fixtures)
    }

    /// Load a fixture by name or path.
    ///
    /// Expectations come from `override_expect`, then a sibling
    /// `<name>.expect.json`, then the fixture's inline `expect` block.
    pub fn load(&self, fixture: &str, override_expect: Option<PathBuf>) -> Result<FixtureData> {
        let path = self.resolve_fixture_path(fixture)?;
        let metadata = self.metadata_for_path(&path)?;
        let json = fs::read_to_string(&path)
            .with_context(|| format!("reading fixture {}", path.display()))?;
        let file: FixtureFile =
            serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))?;

        let expectation_path = override_expect.or(metadata.expect_path.clone());
        let expectations = match expectation_path {
            Some(path) => {
                let json = fs::read_to_string(&path)
                    .with_context(|| format!("reading expectation {}", path.display()))?;
                Some(
                    serde_json::from_str(&json)
                        .with_context(|| format!("parsing {}", path.display()))?,
                )
            }
            None => file.expect.clone(),
        };

        Ok(FixtureData {
            metadata,
            fixture: file,
            expectations,
        })
    }

    fn resolve_fixture_path(&self, fixture: &str) -> Result<PathBuf> {
        let as_path = Path::new(fixture);
        if as_path.is_file() {
            return Ok(as_path.to_path_buf());
        }

        let candidate = self.root.join(format!("{fixture}.{FIXTURE_EXTENSION}"));
        if candidate.exists() {
            Ok(candidate)
        } else {
            Err(anyhow!(
                "Fixture '{fixture}' not found in {}",
                self.root.display()
            ))
        }
    }

    fn metadata_for_path(&self, path: &Path) -> Result<FixtureMetadata> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow!("Invalid fixture name for {}", path.display()))?
            .to_string();
        let expect_path = path.with_file_name(format!("{name}{EXPECT_SUFFIX}"));
        Ok(FixtureMetadata {
            name,
            path: path.to_path_buf(),
            expect_path: expect_path.exists().then_some(expect_path),
        })
    }
}

impl Default for FixtureCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_FIXTURE_ROOT)
    }
}

fn is_fixture_file(path: &Path) -> bool {
    let is_json = path.extension().and_then(|ext| ext.to_str()) == Some(FIXTURE_EXTENSION);
    let is_expectation = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.ends_with(EXPECT_SUFFIX))
        .unwrap_or(false);
    is_json && !is_expectation
}

/// Replays fixtures through a fresh session.
pub struct FixtureProcessor {
    config: AppConfig,
}

impl FixtureProcessor {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Replay every frame at its recorded timestamp.
    ///
    /// Rejected frames are collected into the report instead of aborting, so
    /// noisy recordings can still be checked end to end.
    pub fn run(&self, data: &FixtureData) -> Result<FixtureRun> {
        let fixture = &data.fixture;
        let profile = self
            .config
            .resolve_profile(&fixture.exercise, fixture.preset)
            .with_context(|| format!("resolving profile for {}", data.metadata.name))?;

        let mut options = self.config.session_options();
        options.ingest_mode = fixture.ingest_mode;
        let mut session = Session::new(profile, ManualClock::new(), options)
            .with_context(|| format!("starting session for {}", data.metadata.name))?;

        let mut records = Vec::with_capacity(fixture.frames.len());
        let mut rejected = Vec::new();
        for (index, frame) in fixture.frames.iter().enumerate() {
            let at = Duration::try_from_secs_f64(frame.t).map_err(|err| {
                anyhow!(
                    "frame {} of {} has invalid timestamp {}: {}",
                    index,
                    data.metadata.name,
                    frame.t,
                    err
                )
            })?;

            match session.process_frame_at(&frame.angles, at) {
                Ok(record) => records.push(record),
                Err(err) => {
                    log::debug!("[Fixtures] Frame {} rejected: {}", index, err);
                    rejected.push(RejectedFrame {
                        index,
                        code: err.code(),
                        message: err.message(),
                    });
                }
            }
        }

        let snapshot = session.snapshot();
        let report = FixtureReport {
            fixture: data.metadata.name.clone(),
            exercise: snapshot.exercise,
            frames: fixture.frames.len(),
            correct_count: snapshot.correct_count,
            incorrect_count: snapshot.incorrect_count,
            final_phase: records
                .last()
                .map(|record| record.phase.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            rejected,
        };

        Ok(FixtureRun { records, report })
    }
}
