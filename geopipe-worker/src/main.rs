//! geopipe-worker: the stream-worker binary. Owns process lifecycle,
//! environment configuration, the zenoh message bus, the blob fetcher, and
//! wiring of the concrete collaborators into a `geopipe_core::Pipeline`. The
//! pipeline itself is pure; this binary is all the I/O the spec calls out
//! as external collaborators (§6 of the spec).

mod blob;
mod bus;
mod config;
#[cfg(feature = "opencv-detector")]
mod detector_opencv;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use geopipe_core::collaborators::OutboundResult;
use geopipe_core::{Detector, Pipeline, StubDetector, Task};

use blob::AnyBlobFetcher;
use config::WorkerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = WorkerConfig::from_env();
    tracing::info!(
        worker_id = %config.worker_id,
        input_topic = %config.input_topic,
        output_topic = %config.output_topic,
        consumer_group = %config.consumer_group,
        "starting geopipe-worker"
    );

    let pipeline = Arc::new(build_pipeline(&config)?);
    let blob_fetcher = Arc::new(build_blob_fetcher(&config)?);

    let session = zenoh::open(zenoh::Config::default())
        .await
        .context("failed to open zenoh session")?;
    let subscriber = bus::subscribe(&session, &config.input_topic).await?;

    tracing::info!("subscribed, waiting for tasks");
    while let Some(task) = bus::next_task(&subscriber).await {
        let pipeline = Arc::clone(&pipeline);
        let blob_fetcher = Arc::clone(&blob_fetcher);
        let worker_id = config.worker_id.clone();
        let output_topic = config.output_topic.clone();

        match handle_task(task, pipeline, blob_fetcher, worker_id).await {
            Ok(outbound) => {
                for result in outbound {
                    if let Err(err) = bus::publish(&session, &output_topic, &result).await {
                        tracing::error!(error = %err, image_id = %result.image_id, "failed to publish result");
                    }
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "task processing failed, nothing emitted");
            }
        }
    }

    tracing::info!("subscriber closed, shutting down");
    Ok(())
}

/// Fetch the blob, run the pipeline off the async runtime (the detector,
/// OCR, and HTTP collaborators the pipeline may call are all blocking
/// calls), and assemble one outbound message per detection. A blob fetch
/// failure or a decode failure both degrade to "nothing emitted" per §7 —
/// the bus/blob failure path is the outer loop's to handle, not the core's.
async fn handle_task(
    task: Task,
    pipeline: Arc<Pipeline>,
    blob_fetcher: Arc<AnyBlobFetcher>,
    worker_id: String,
) -> Result<Vec<OutboundResult>> {
    let image_id = task.image_id.clone();
    let image_url = task.image_url.clone();
    let metadata_json = serde_json::to_value(&task.metadata).unwrap_or(serde_json::Value::Null);

    let bytes = tokio::task::spawn_blocking(move || blob_fetcher.fetch(&image_url))
        .await
        .context("blob fetch task panicked")?
        .with_context(|| format!("failed to fetch blob for task {image_id}"))?;

    let metadata = task.metadata;
    let output = tokio::task::spawn_blocking(move || pipeline.process(&bytes, &metadata))
        .await
        .context("pipeline task panicked")?;

    let output = match output {
        Ok(output) => output,
        Err(err) => {
            tracing::warn!(error = %err, image_id = %image_id, "decode failed, emitting nothing for this task");
            return Ok(Vec::new());
        }
    };

    let processed_at = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let results = output
        .detections
        .iter()
        .map(|result| {
            OutboundResult::from_detection_result(
                image_id.clone(),
                result,
                metadata_json.clone(),
                worker_id.clone(),
                processed_at.clone(),
            )
        })
        .collect();
    Ok(results)
}

fn build_pipeline(config: &WorkerConfig) -> Result<Pipeline> {
    let detector: Box<dyn Detector> = build_detector(config)?;
    let mut pipeline = Pipeline::new(detector);

    #[cfg(feature = "ocr")]
    {
        pipeline = pipeline.with_ocr(Box::new(geopipe_core::enrich::TesseractOcr::new(&config.ocr_lang)));
    }
    #[cfg(feature = "geocode")]
    {
        pipeline = pipeline.with_geocoder(Box::new(geopipe_core::enrich::NominatimGeocoder::new(
            &config.geocode_user_agent,
        )));
    }

    Ok(pipeline)
}

#[cfg(feature = "opencv-detector")]
fn build_detector(config: &WorkerConfig) -> Result<Box<dyn Detector>> {
    match detector_opencv::HaarCascadeDetector::load(&config.cascade_path, "object") {
        Ok(detector) => Ok(Box::new(detector)),
        Err(err) => {
            tracing::warn!(error = %err, path = %config.cascade_path, "failed to load cascade, falling back to stub detector");
            Ok(Box::new(StubDetector))
        }
    }
}

#[cfg(not(feature = "opencv-detector"))]
fn build_detector(_config: &WorkerConfig) -> Result<Box<dyn Detector>> {
    Ok(Box::new(StubDetector))
}

fn build_blob_fetcher(config: &WorkerConfig) -> Result<AnyBlobFetcher> {
    #[cfg(feature = "s3")]
    {
        if config.s3_access_key.is_some() || config.s3_endpoint.is_some() {
            let fetcher = blob::S3BlobFetcher::new(
                config.s3_bucket.as_deref(),
                config.s3_endpoint.as_deref(),
                config.s3_access_key.as_deref(),
                config.s3_secret_key.as_deref(),
            )?;
            return Ok(AnyBlobFetcher::S3(fetcher));
        }
    }
    let _ = config;
    Ok(AnyBlobFetcher::Local(blob::LocalBlobFetcher))
}
