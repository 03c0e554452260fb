#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The run orchestrator.
//!
//! One [`Pipeline::run`] call is one complete pass: fetch the upstream
//! dataset, gate on its fingerprint, and — only when the data changed —
//! rebuild every no-swim zone from scratch and replace the published
//! artifact wholesale. The fingerprint is committed strictly after the
//! artifact, so an interrupted run re-derives the zones on its next pass
//! instead of silently serving stale output.

use async_trait::async_trait;
use coastwatch_feed::{DatasetFeed, FeedError};
use coastwatch_fingerprint::DatasetFingerprint;
use coastwatch_models::ZoneCollection;
use coastwatch_projection::GreekGridProjector;
use coastwatch_storage::{StorageError, ZoneStore};
use coastwatch_zones::{ReferenceGeometry, ZoneCalculator, ZoneError, ZoneOutcome};
use strum_macros::Display;

/// Stages a run advances through, in order. `Unchanged` is terminal for
/// the gated path; `FingerprintCommitted` for the recompute path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStage {
    /// Upstream dataset fetched.
    Fetched,
    /// Dataset fingerprint computed and compared.
    Fingerprinted,
    /// Fingerprint matched the persisted one; recomputation skipped.
    Unchanged,
    /// Reference boundary being loaded and unified.
    LoadingReference,
    /// Zones computed for every usable record.
    Computed,
    /// Artifact persisted (skipped for an empty zone set).
    Persisted,
    /// Fingerprint committed, strictly after any artifact write.
    FingerprintCommitted,
}

fn advance(stage: RunStage) -> RunStage {
    log::debug!("Run stage: {stage}");
    stage
}

/// Errors that abort a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The upstream dataset could not be fetched or parsed.
    #[error("Failed to fetch upstream dataset: {0}")]
    Fetch(#[from] FeedError),

    /// The reference boundary could not be loaded.
    #[error("Failed to load reference boundary: {0}")]
    ReferenceLoad(#[source] StorageError),

    /// The reference boundary loaded but could not be parsed.
    #[error(transparent)]
    ReferenceParse(#[from] ZoneError),

    /// The zone collection could not be serialized.
    #[error("Failed to serialize zone artifact: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The artifact could not be written. The previous artifact and
    /// fingerprint are still in place.
    #[error("Failed to persist zone artifact: {0}")]
    Persist(#[source] StorageError),

    /// The fingerprint could not be committed. The artifact may already
    /// carry this run's output; the next run will recompute and republish.
    #[error("Failed to commit fingerprint: {0}")]
    FingerprintCommit(#[source] StorageError),

    /// The downstream sync failed on the unchanged path, where it is the
    /// run's only observable effect.
    #[error("Downstream sync failed: {0}")]
    Sync(#[source] SyncError),
}

/// A downstream sync failure.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct SyncError(pub Box<dyn std::error::Error + Send + Sync>);

/// Downstream notification hook, invoked at the end of every run so the
/// renderer re-reads the artifact even when nothing changed.
#[async_trait]
pub trait RenderSync: Send + Sync {
    /// Triggers the downstream refresh.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] if the downstream endpoint could not be
    /// notified.
    async fn trigger(&self) -> Result<(), SyncError>;
}

/// No-op sync for runs without a downstream renderer.
pub struct NoopSync;

#[async_trait]
impl RenderSync for NoopSync {
    async fn trigger(&self) -> Result<(), SyncError> {
        Ok(())
    }
}

/// What a completed run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The dataset fingerprint matched the persisted one; nothing was
    /// recomputed.
    Unchanged,
    /// Zones were recomputed and the artifact was replaced.
    Published {
        /// Number of zones in the published artifact.
        zones: usize,
        /// Records whose buffer lay entirely inside the reference.
        empty: usize,
        /// Records skipped for missing or unusable coordinates.
        skipped: usize,
    },
    /// The dataset changed but produced no zones; the fingerprint was
    /// committed without touching the artifact.
    NoZones {
        /// Records whose buffer lay entirely inside the reference.
        empty: usize,
        /// Records skipped for missing or unusable coordinates.
        skipped: usize,
    },
}

/// Summary of one completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Terminal stage the run reached.
    pub stage: RunStage,
    /// Fingerprint of the dataset this run saw.
    pub fingerprint: String,
    /// What the run did.
    pub outcome: RunOutcome,
    /// Whether the post-publication sync failed (logged, not fatal).
    pub sync_failed: bool,
}

/// The pipeline orchestrator. Holds the run-independent projector; all
/// per-run state lives on the stack of [`Pipeline::run`].
#[derive(Debug, Default)]
pub struct Pipeline {
    projector: GreekGridProjector,
}

impl Pipeline {
    /// Creates a pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Executes one complete pass.
    ///
    /// On the unchanged path a sync failure is fatal: the notification is
    /// the run's only observable effect. After a successful publication it
    /// is logged but not propagated, so a flaky downstream endpoint cannot
    /// make an otherwise-successful run look failed.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] when the fetch, the reference load, or the
    /// persistence steps fail. An unreadable previous fingerprint is logged
    /// and treated as changed. Individual unusable plant records are
    /// counted and logged, never propagated.
    pub async fn run(
        &self,
        feed: &dyn DatasetFeed,
        store: &dyn ZoneStore,
        sync: &dyn RenderSync,
    ) -> Result<RunSummary, PipelineError> {
        let dataset = feed.fetch().await?;
        advance(RunStage::Fetched);
        let fingerprint = DatasetFingerprint::of(&dataset.value);

        // An unreadable previous fingerprint is treated as changed: a
        // needless recomputation is safe, skipping a real change is not.
        let previous = match store.read_fingerprint().await {
            Ok(previous) => previous,
            Err(e) => {
                log::warn!("Failed to read persisted fingerprint ({e}), proceeding as changed");
                None
            }
        };
        advance(RunStage::Fingerprinted);
        if !fingerprint.has_changed(previous.as_deref()) {
            log::info!("Dataset unchanged ({fingerprint}), skipping recomputation");
            sync.trigger().await.map_err(PipelineError::Sync)?;
            return Ok(RunSummary {
                stage: advance(RunStage::Unchanged),
                fingerprint: fingerprint.as_str().to_string(),
                outcome: RunOutcome::Unchanged,
                sync_failed: false,
            });
        }
        log::info!("Dataset changed ({fingerprint}), recomputing zones");

        advance(RunStage::LoadingReference);
        let boundary_text = store
            .load_reference()
            .await
            .map_err(PipelineError::ReferenceLoad)?;
        let reference = ReferenceGeometry::from_geojson(&boundary_text)?;

        let calculator = ZoneCalculator::new(&self.projector, &reference);
        let mut zones = Vec::new();
        let mut empty = 0;
        let mut skipped = 0;
        for record in &dataset.records {
            match calculator.zone_for(record) {
                ZoneOutcome::Zone(zone) => zones.push(zone),
                ZoneOutcome::Empty => empty += 1,
                ZoneOutcome::Skipped(_) => skipped += 1,
            }
        }
        log::info!(
            "Computed {} zones from {} records ({empty} empty, {skipped} skipped)",
            zones.len(),
            dataset.records.len()
        );
        advance(RunStage::Computed);

        let collection = ZoneCollection::new(zones);
        let outcome = if collection.is_empty() {
            log::info!("No zones derived, leaving previous artifact in place");
            RunOutcome::NoZones { empty, skipped }
        } else {
            let bytes = collection.to_artifact_bytes()?;
            store
                .write_artifact(&bytes)
                .await
                .map_err(PipelineError::Persist)?;
            advance(RunStage::Persisted);
            RunOutcome::Published {
                zones: collection.len(),
                empty,
                skipped,
            }
        };

        // Commit order matters: the fingerprint goes last so a failure
        // between the two writes re-triggers recomputation next run.
        store
            .write_fingerprint(fingerprint.as_str())
            .await
            .map_err(PipelineError::FingerprintCommit)?;
        let stage = advance(RunStage::FingerprintCommitted);

        let sync_failed = match sync.trigger().await {
            Ok(()) => false,
            Err(e) => {
                log::error!("Downstream sync failed after publication: {e}");
                true
            }
        };

        Ok(RunSummary {
            stage,
            fingerprint: fingerprint.as_str().to_string(),
            outcome,
            sync_failed,
        })
    }
}
