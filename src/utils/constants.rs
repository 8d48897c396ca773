use std::ops::Range;

/// ISD fixed-width field offsets (byte ranges, half-open)
pub const DATE_FIELD: Range<usize> = 15..23;
pub const YEAR_FIELD: Range<usize> = 15..19;
pub const LATITUDE_FIELD: Range<usize> = 28..34;
pub const LONGITUDE_FIELD: Range<usize> = 34..41;
pub const ALTITUDE_FIELD: Range<usize> = 46..51;
pub const TEMPERATURE_FIELD: Range<usize> = 87..92;
pub const TEMPERATURE_QUALITY_FIELD: Range<usize> = 92..93;
pub const HUMIDITY_FIELD: Range<usize> = 93..98;
pub const HUMIDITY_QUALITY_FIELD: Range<usize> = 98..99;

/// Shortest line that still carries every field we read
pub const MIN_RECORD_LENGTH: usize = 99;

/// Literal marking a missing temperature or humidity measurement
pub const MISSING_MEASUREMENT: &[u8] = b"+9999";

/// Quality codes accepted for temperature and humidity
pub const ACCEPTED_QUALITY_CODES: [u8; 5] = [b'0', b'1', b'4', b'5', b'9'];

/// Width of the anomaly band in standard deviations
pub const ANOMALY_THRESHOLD: f64 = 2.0;

/// Streaming wire format separator
pub const FIELD_SEPARATOR: char = '\t';

/// Processing defaults
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB

/// Configuration
pub const DEFAULT_CONFIG_FILE: &str = "isd-stats.toml";
pub const ENV_PREFIX: &str = "ISD_STATS";

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
