//! Environment-variable configuration, assembled once at startup. Follows
//! the teacher's style of reading `std::env::var` with defaults directly
//! rather than introducing a config-file crate the teacher never used.

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub input_topic: String,
    pub output_topic: String,
    /// Zenoh has no consumer-group primitive; this is accepted for parity
    /// with the Kafka-flavored env surface the original worker exposed, and
    /// is only ever logged, never silently dropped.
    pub consumer_group: String,
    pub worker_id: String,

    pub s3_bucket: Option<String>,
    pub s3_endpoint: Option<String>,
    pub s3_access_key: Option<String>,
    pub s3_secret_key: Option<String>,

    pub cascade_path: String,
    pub geocode_user_agent: String,
    pub ocr_lang: String,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

impl WorkerConfig {
    pub fn from_env() -> Self {
        WorkerConfig {
            input_topic: env_or("GEOPIPE_INPUT_TOPIC", "images.tasks"),
            output_topic: env_or("GEOPIPE_OUTPUT_TOPIC", "images.results"),
            consumer_group: env_or("GEOPIPE_CONSUMER_GROUP", "ml-worker-group"),
            worker_id: env_or("GEOPIPE_WORKER_ID", "worker-1"),

            s3_bucket: env_opt("GEOPIPE_S3_BUCKET"),
            s3_endpoint: env_opt("GEOPIPE_S3_ENDPOINT"),
            s3_access_key: env_opt("GEOPIPE_S3_ACCESS_KEY"),
            s3_secret_key: env_opt("GEOPIPE_S3_SECRET_KEY"),

            cascade_path: env_or("GEOPIPE_CASCADE_PATH", "haarcascade_frontalface_alt.xml"),
            geocode_user_agent: env_or("GEOPIPE_GEOCODE_USER_AGENT", "geopipe-worker/1.0"),
            ocr_lang: env_or("GEOPIPE_OCR_LANG", "rus+eng"),
        }
    }
}
