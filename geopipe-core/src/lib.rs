//! Core geolocation library for the image-detection stream worker: EXIF
//! parsing, camera projection, the ground-plane ray-cast projector, the
//! estimator cascade, detector/OCR/geocoder collaborator interfaces, and the
//! `Pipeline` driver that ties them together.

pub mod camera;
pub mod cascade;
pub mod collaborators;
pub mod detector;
pub mod enrich;
pub mod error;
pub mod exif;
pub mod pipeline;
pub mod projector;
pub mod types;

pub use collaborators::{BlobFetcher, OutboundResult, ResultProducer, TaskConsumer};
pub use detector::{Detector, StubDetector};
pub use enrich::{Geocoder, OcrEngine};
pub use error::{DecodeError, Result};
pub use pipeline::Pipeline;
pub use types::{
    BBox, Detection, DetectionResult, EstimationMethod, ExifSummary, ExifValue, Geolocation,
    InsMetadata, PipelineOutput, Task, TaskMetadata,
};

#[cfg(feature = "ocr")]
pub use enrich::TesseractOcr;

#[cfg(feature = "geocode")]
pub use enrich::NominatimGeocoder;
