use serde::Deserialize;

/// Largest frame index that still fits the three-digit `frame-NNN.jpg` names
pub const MAX_FRAME_INDEX: usize = 999;

/// S3 rejects multipart parts smaller than 5MB (except the last one)
const MIN_PART_SIZE_BYTES: usize = 5 * 1024 * 1024;

/// Main configuration for the sequence service
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Service configuration
    #[serde(default)]
    pub service: ServiceConfig,
    /// Object storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Upload pipeline configuration
    #[serde(default)]
    pub upload: UploadConfig,
    /// API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Service name for logging/metrics
    #[serde(default = "default_service_name")]
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Metrics port
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

/// Object storage configuration
///
/// Any S3-compatible backend works. For Supabase Storage point `endpoint_url`
/// at `https://<project>.supabase.co/storage/v1/s3`, enable `force_path_style`
/// and set `public_base_url` to
/// `https://<project>.supabase.co/storage/v1/object/public/<bucket>`.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Bucket holding sequences and assets
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// AWS region
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint URL (Supabase, MinIO, LocalStack, etc.)
    pub endpoint_url: Option<String>,
    /// Force path-style access
    #[serde(default)]
    pub force_path_style: bool,
    /// Base address that public object URLs are built from
    pub public_base_url: Option<String>,
    /// Static access key; the default AWS credential chain is used when unset
    pub access_key_id: Option<String>,
    /// Static secret key paired with `access_key_id`
    pub secret_access_key: Option<String>,
    /// Multipart upload threshold in bytes (5MB default)
    #[serde(default = "default_multipart_threshold")]
    pub multipart_threshold_bytes: usize,
    /// Part size for multipart uploads in bytes (5MB default)
    #[serde(default = "default_part_size")]
    pub part_size_bytes: usize,
}

/// Upload pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Maximum accepted request body in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Maximum in-flight frame uploads per request (unset = unbounded)
    pub concurrency: Option<usize>,
    /// Maximum accepted frames per archive
    #[serde(default = "default_max_frames")]
    pub max_frames: usize,
    /// Maximum decompressed size of a single frame in bytes
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
    /// Maximum decompressed size of all frames of an archive in bytes
    #[serde(default = "default_max_archive_bytes")]
    pub max_archive_bytes: usize,
}

/// API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// API listen address
    #[serde(default = "default_api_host")]
    pub host: String,
    /// API listen port
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
    /// Allowed CORS origins
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

// Default value functions
fn default_service_name() -> String {
    "sequence-service".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_bucket() -> String {
    "documents".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_multipart_threshold() -> usize {
    5 * 1024 * 1024 // 5MB
}

fn default_part_size() -> usize {
    5 * 1024 * 1024 // 5MB
}

fn default_max_body_bytes() -> usize {
    256 * 1024 * 1024 // 256MB
}

fn default_max_frames() -> usize {
    MAX_FRAME_INDEX
}

fn default_max_frame_bytes() -> usize {
    32 * 1024 * 1024 // 32MB
}

fn default_max_archive_bytes() -> usize {
    1024 * 1024 * 1024 // 1GB
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from environment and config files
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            // Start with default values
            .set_default("service.name", "sequence-service")?
            .set_default("service.log_level", "info")?
            .set_default("service.metrics_port", 9090)?
            // Add config file if present
            .add_source(config::File::with_name("config/sequence").required(false))
            .add_source(config::File::with_name("/etc/portfolio/sequence").required(false))
            // Override with environment variables
            // SEQUENCE__STORAGE__BUCKET -> storage.bucket
            .add_source(
                config::Environment::with_prefix("SEQUENCE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.storage.bucket.is_empty() {
            return Err(ConfigValidationError::MissingField(
                "storage.bucket".to_string(),
            ));
        }

        if self.storage.access_key_id.is_some() != self.storage.secret_access_key.is_some() {
            return Err(ConfigValidationError::InvalidValue {
                field: "storage.access_key_id/secret_access_key".to_string(),
                message: "Both keys must be set together".to_string(),
            });
        }

        if self.storage.part_size_bytes < MIN_PART_SIZE_BYTES {
            return Err(ConfigValidationError::InvalidValue {
                field: "storage.part_size_bytes".to_string(),
                message: format!("Part size must be at least {} bytes", MIN_PART_SIZE_BYTES),
            });
        }

        if self.upload.concurrency == Some(0) {
            return Err(ConfigValidationError::InvalidValue {
                field: "upload.concurrency".to_string(),
                message: "Concurrency must be greater than 0".to_string(),
            });
        }

        if self.upload.max_frames == 0 || self.upload.max_frames > MAX_FRAME_INDEX {
            return Err(ConfigValidationError::InvalidValue {
                field: "upload.max_frames".to_string(),
                message: format!("Frame limit must be between 1 and {}", MAX_FRAME_INDEX),
            });
        }

        if self.upload.max_body_bytes == 0 {
            return Err(ConfigValidationError::InvalidValue {
                field: "upload.max_body_bytes".to_string(),
                message: "Body limit must be greater than 0".to_string(),
            });
        }

        if self.upload.max_frame_bytes == 0 || self.upload.max_archive_bytes == 0 {
            return Err(ConfigValidationError::InvalidValue {
                field: "upload.max_frame_bytes/max_archive_bytes".to_string(),
                message: "Decompression limits must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
            metrics_port: default_metrics_port(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            region: default_region(),
            endpoint_url: None,
            force_path_style: false,
            public_base_url: None,
            access_key_id: None,
            secret_access_key: None,
            multipart_threshold_bytes: default_multipart_threshold(),
            part_size_bytes: default_part_size(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: default_max_body_bytes(),
            concurrency: None,
            max_frames: default_max_frames(),
            max_frame_bytes: default_max_frame_bytes(),
            max_archive_bytes: default_max_archive_bytes(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
            cors_enabled: default_true(),
            cors_origins: Vec::new(),
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}
