//! Per-instance configuration for writers and readers.

use crate::buffer::GrowthPolicy;

/// Initial buffer size a writer allocates before the first write.
pub const DEFAULT_MIN_INITIAL_LEN: usize = 128;

/// Default ceiling on the size of a single message.
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 1024 * 1024;

/// Default ceiling on a declared collection or row count.
pub const DEFAULT_MAX_COLLECTION_COUNT: usize = 65536;

/// Default nesting depth a reader accepts.
pub const DEFAULT_RECURSION_LIMIT: u32 = 128;

/// Largest recursion limit a reader may be configured with.
pub const MAX_RECURSION_LIMIT: u32 = 1024;

/// Wire layout used for 128-bit identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum UuidFormat {
    /// 16 raw bytes, no prefix.
    #[default]
    Raw,
    /// Counter(16) followed by 16 raw bytes, as written by older exporters.
    LengthPrefixed,
}

/// Limits and tuning knobs applied to one writer or reader.
///
/// Every writer and reader receives its own copy at construction; there is no
/// shared mutable default. The limits are enforced during decoding to reject
/// hostile input before it can cause large allocations or deep nesting.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CodecConfig {
    /// Bytes a writer allocates up front.
    pub min_initial_len: usize,

    /// Maximum size of a whole message, and of any single declared length.
    pub max_message_len: usize,

    /// Maximum declared element or row count.
    pub max_collection_count: usize,

    /// Maximum nesting depth for sub-messages.
    pub recursion_limit: u32,

    /// Capacity growth rule for owned buffers.
    pub growth_policy: GrowthPolicy,

    /// Layout of 128-bit identifiers.
    pub uuid_format: UuidFormat,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            min_initial_len: DEFAULT_MIN_INITIAL_LEN,
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
            max_collection_count: DEFAULT_MAX_COLLECTION_COUNT,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            growth_policy: GrowthPolicy::Normal,
            uuid_format: UuidFormat::Raw,
        }
    }
}

impl CodecConfig {
    /// Creates a configuration suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            min_initial_len: 16,
            max_message_len: 4096,
            max_collection_count: 64,
            recursion_limit: 8,
            growth_policy: GrowthPolicy::Normal,
            uuid_format: UuidFormat::Raw,
        }
    }

    /// Creates a configuration with no size restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            min_initial_len: DEFAULT_MIN_INITIAL_LEN,
            max_message_len: usize::MAX,
            max_collection_count: usize::MAX,
            recursion_limit: MAX_RECURSION_LIMIT,
            growth_policy: GrowthPolicy::Normal,
            uuid_format: UuidFormat::Raw,
        }
    }

    /// Returns a copy with a different message ceiling.
    #[must_use]
    pub const fn with_max_message_len(mut self, max_message_len: usize) -> Self {
        self.max_message_len = max_message_len;
        self
    }

    /// Returns a copy with a different collection ceiling.
    #[must_use]
    pub const fn with_max_collection_count(mut self, max_collection_count: usize) -> Self {
        self.max_collection_count = max_collection_count;
        self
    }

    /// Returns a copy with a different recursion limit.
    ///
    /// The value is validated when a reader is built from the configuration.
    #[must_use]
    pub const fn with_recursion_limit(mut self, recursion_limit: u32) -> Self {
        self.recursion_limit = recursion_limit;
        self
    }

    /// Returns a copy with a different growth policy.
    #[must_use]
    pub const fn with_growth_policy(mut self, growth_policy: GrowthPolicy) -> Self {
        self.growth_policy = growth_policy;
        self
    }

    /// Returns a copy with a different identifier layout.
    #[must_use]
    pub const fn with_uuid_format(mut self, uuid_format: UuidFormat) -> Self {
        self.uuid_format = uuid_format;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CodecConfig::default();
        assert_eq!(config.min_initial_len, 128);
        assert_eq!(config.max_message_len, 1024 * 1024);
        assert_eq!(config.max_collection_count, 65536);
        assert_eq!(config.recursion_limit, 128);
        assert_eq!(config.growth_policy, GrowthPolicy::Normal);
        assert_eq!(config.uuid_format, UuidFormat::Raw);
    }

    #[test]
    fn testing_config_smaller() {
        let test_config = CodecConfig::for_testing();
        let default_config = CodecConfig::default();

        assert!(test_config.max_message_len < default_config.max_message_len);
        assert!(test_config.max_collection_count < default_config.max_collection_count);
        assert!(test_config.recursion_limit < default_config.recursion_limit);
    }

    #[test]
    fn unlimited_config() {
        let config = CodecConfig::unlimited();
        assert_eq!(config.max_message_len, usize::MAX);
        assert_eq!(config.max_collection_count, usize::MAX);
        assert_eq!(config.recursion_limit, MAX_RECURSION_LIMIT);
    }

    #[test]
    fn builders_override_single_fields() {
        let config = CodecConfig::default()
            .with_max_message_len(512)
            .with_max_collection_count(3)
            .with_recursion_limit(4)
            .with_growth_policy(GrowthPolicy::ForMemoryUsage)
            .with_uuid_format(UuidFormat::LengthPrefixed);
        assert_eq!(config.max_message_len, 512);
        assert_eq!(config.max_collection_count, 3);
        assert_eq!(config.recursion_limit, 4);
        assert_eq!(config.growth_policy, GrowthPolicy::ForMemoryUsage);
        assert_eq!(config.uuid_format, UuidFormat::LengthPrefixed);
        assert_eq!(config.min_initial_len, DEFAULT_MIN_INITIAL_LEN);
    }

    #[test]
    fn config_const_constructible() {
        const CONFIG: CodecConfig = CodecConfig::for_testing().with_max_message_len(100);
        assert_eq!(CONFIG.max_message_len, 100);
    }

    #[test]
    fn config_debug() {
        let debug = format!("{:?}", CodecConfig::default());
        assert!(debug.contains("CodecConfig"));
        assert!(debug.contains("max_message_len"));
    }
}
