//! The cache configuration record and its built-in defaults.

use serde::{de, Deserialize, Deserializer, Serialize};

/// Default buffer cache budget: 128 MiB.
pub const DEFAULT_CACHE_SIZE: u64 = 0x800_0000;

/// Default ceiling on cached open file handles.
pub const DEFAULT_FILE_HANDLE_COUNT: usize = 16;

/// Memory and file handle budgets for the shared caches.
///
/// Copied in and out of the configuration store as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Total byte budget of the buffer cache; `0` disables it
    #[serde(deserialize_with = "deserialize_size")]
    pub cache_size: u64,

    /// Maximum number of idle file handles kept open; `0` is a valid limit
    pub file_handle_count: usize,

    /// Whether higher layers should cache fulltexts
    pub cache_fulltexts: bool,

    /// Whether higher layers should cache text deltas
    pub cache_deltas: bool,

    /// Build caches without internal synchronization
    pub single_threaded: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_size: DEFAULT_CACHE_SIZE,
            file_handle_count: DEFAULT_FILE_HANDLE_COUNT,
            cache_fulltexts: false,
            cache_deltas: false,
            single_threaded: false,
        }
    }
}

impl CacheConfig {
    /// Convert to a JSON value under a `cache` key, for layer merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "cache": {
                "cache_size": self.cache_size,
                "file_handle_count": self.file_handle_count,
                "cache_fulltexts": self.cache_fulltexts,
                "cache_deltas": self.cache_deltas,
                "single_threaded": self.single_threaded
            }
        })
    }
}

/// Parse a byte size such as `4096`, `64K`, `128M`, `1G` or `2GiB`.
///
/// Suffixes are binary multiples and case-insensitive.
pub fn parse_size(text: &str) -> Result<u64, String> {
    let trimmed = text.trim();
    let upper = trimmed.to_ascii_uppercase();
    let unit = upper
        .strip_suffix("IB")
        .or_else(|| upper.strip_suffix('B'))
        .unwrap_or(&upper);

    let (digits, shift) = match unit.chars().last() {
        Some('K') => (&unit[..unit.len() - 1], 10),
        Some('M') => (&unit[..unit.len() - 1], 20),
        Some('G') => (&unit[..unit.len() - 1], 30),
        Some('T') => (&unit[..unit.len() - 1], 40),
        _ => (unit, 0),
    };

    let value: u64 = digits
        .trim()
        .parse()
        .map_err(|_| format!("invalid size: {:?}", text))?;

    value
        .checked_mul(1u64 << shift)
        .ok_or_else(|| format!("size out of range: {:?}", text))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SizeRepr {
    Bytes(u64),
    Text(String),
}

fn deserialize_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match SizeRepr::deserialize(deserializer)? {
        SizeRepr::Bytes(bytes) => Ok(bytes),
        SizeRepr::Text(text) => parse_size(&text).map_err(de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.cache_size, 128 * 1024 * 1024);
        assert_eq!(config.file_handle_count, 16);
        assert!(!config.cache_fulltexts);
        assert!(!config.cache_deltas);
        assert!(!config.single_threaded);
    }

    #[test]
    fn test_to_value() {
        let value = CacheConfig::default().to_value();

        assert_eq!(value["cache"]["cache_size"], 134_217_728u64);
        assert_eq!(value["cache"]["file_handle_count"], 16);
        assert_eq!(value["cache"]["single_threaded"], false);
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("4096"), Ok(4096));
        assert_eq!(parse_size("64K"), Ok(64 * 1024));
        assert_eq!(parse_size("128m"), Ok(128 * 1024 * 1024));
        assert_eq!(parse_size("1G"), Ok(1 << 30));
        assert_eq!(parse_size("2GiB"), Ok(2 << 30));
        assert_eq!(parse_size("512KB"), Ok(512 * 1024));
        assert_eq!(parse_size(" 0 "), Ok(0));
    }

    #[test]
    fn test_parse_size_rejects_garbage() {
        assert!(parse_size("").is_err());
        assert!(parse_size("M").is_err());
        assert!(parse_size("12X").is_err());
        assert!(parse_size("-1K").is_err());
        assert!(parse_size("99999999999T").is_err());
    }

    #[test]
    fn test_deserialize_partial_uses_defaults() {
        let config: CacheConfig =
            serde_json::from_value(serde_json::json!({ "cache_size": "64M" })).unwrap();

        assert_eq!(config.cache_size, 64 * 1024 * 1024);
        assert_eq!(config.file_handle_count, DEFAULT_FILE_HANDLE_COUNT);
    }

    #[test]
    fn test_deserialize_rejects_unknown_fields() {
        let result: Result<CacheConfig, _> =
            serde_json::from_value(serde_json::json!({ "cache_sise": 1 }));
        assert!(result.is_err());
    }
}
