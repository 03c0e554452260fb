#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for the no-swim zone pipeline.
//!
//! `coastwatch run` executes one complete pipeline pass against object
//! storage (or a local data directory); `coastwatch compute` derives zones
//! offline from local files; `coastwatch digest` prints the fingerprint of
//! a dataset without touching any state.

mod sync;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use coastwatch_feed::{DEFAULT_FEED_URL, DatasetFeed, FileFeed, HttpFeed};
use coastwatch_fingerprint::DatasetFingerprint;
use coastwatch_models::ZoneCollection;
use coastwatch_pipeline::{NoopSync, Pipeline, RenderSync, RunOutcome};
use coastwatch_projection::GreekGridProjector;
use coastwatch_storage::{FsStore, S3Store, ZoneStore};
use coastwatch_zones::{ReferenceGeometry, ZoneCalculator, ZoneOutcome};

use crate::sync::WebhookSync;

#[derive(Parser)]
#[command(name = "coastwatch", about = "Coastal no-swim zone pipeline")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one complete pipeline pass.
    Run {
        /// Upstream plant registry endpoint.
        #[arg(long, default_value = DEFAULT_FEED_URL)]
        feed_url: String,

        /// Bucket holding the reference boundary, fingerprint, and artifact.
        #[arg(long, default_value = "mpelas-wastewater-bucket")]
        bucket: String,

        /// Endpoint override for S3-compatible providers.
        #[arg(long)]
        endpoint_url: Option<String>,

        /// Use a local data directory instead of object storage.
        #[arg(long, conflicts_with_all = ["bucket", "endpoint_url"])]
        data_dir: Option<PathBuf>,

        /// Downstream webhook to hit after every run.
        #[arg(long)]
        sync_url: Option<String>,
    },

    /// Compute zones offline from local files, bypassing the change gate.
    Compute {
        /// Plant dataset JSON file.
        #[arg(long)]
        plants: PathBuf,

        /// Region boundary GeoJSON file.
        #[arg(long)]
        regions: PathBuf,

        /// Where to write the zone FeatureCollection.
        #[arg(long)]
        output: PathBuf,
    },

    /// Print the fingerprint of a dataset.
    Digest {
        /// Dataset JSON file.
        #[arg(conflicts_with = "url")]
        file: Option<PathBuf>,

        /// Fetch the dataset from a URL instead.
        #[arg(long)]
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();

    match Args::parse().command {
        Command::Run {
            feed_url,
            bucket,
            endpoint_url,
            data_dir,
            sync_url,
        } => run(feed_url, bucket, endpoint_url, data_dir, sync_url).await,
        Command::Compute {
            plants,
            regions,
            output,
        } => compute(plants, regions, output).await,
        Command::Digest { file, url } => digest(file, url).await,
    }
}

async fn run(
    feed_url: String,
    bucket: String,
    endpoint_url: Option<String>,
    data_dir: Option<PathBuf>,
    sync_url: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let started = std::time::Instant::now();
    let feed = HttpFeed::new(feed_url)?;
    let store: Box<dyn ZoneStore> = match data_dir {
        Some(dir) => Box::new(FsStore::new(dir)),
        None => Box::new(S3Store::from_env(bucket, endpoint_url.as_deref()).await),
    };
    let sync: Box<dyn RenderSync> = match sync_url {
        Some(url) => Box::new(WebhookSync::new(url)?),
        None => Box::new(NoopSync),
    };

    let summary = Pipeline::new()
        .run(&feed, store.as_ref(), sync.as_ref())
        .await?;
    match summary.outcome {
        RunOutcome::Unchanged => log::info!("Run complete: dataset unchanged"),
        RunOutcome::Published {
            zones,
            empty,
            skipped,
        } => log::info!("Run complete: published {zones} zones ({empty} empty, {skipped} skipped)"),
        RunOutcome::NoZones { empty, skipped } => {
            log::info!("Run complete: no zones derived ({empty} empty, {skipped} skipped)");
        }
    }
    log::info!("Finished in {:?}", started.elapsed());
    Ok(())
}

async fn compute(
    plants: PathBuf,
    regions: PathBuf,
    output: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let boundary_text = tokio::fs::read_to_string(&regions).await?;
    let reference = ReferenceGeometry::from_geojson(&boundary_text)?;
    let dataset = FileFeed::new(plants).fetch().await?;

    let projector = GreekGridProjector::new();
    let calculator = ZoneCalculator::new(&projector, &reference);
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

    let collection = ZoneCollection::new(zones);
    tokio::fs::write(&output, collection.to_artifact_bytes()?).await?;
    log::info!(
        "Wrote {} zones to {} ({empty} empty, {skipped} skipped)",
        collection.len(),
        output.display()
    );
    Ok(())
}

async fn digest(
    file: Option<PathBuf>,
    url: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let value: serde_json::Value = match (file, url) {
        (Some(path), None) => serde_json::from_str(&tokio::fs::read_to_string(path).await?)?,
        (None, Some(url)) => reqwest::get(&url).await?.error_for_status()?.json().await?,
        _ => return Err("pass a dataset file or --url".into()),
    };
    println!("{}", DatasetFingerprint::of(&value));
    Ok(())
}
