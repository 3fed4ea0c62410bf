//! Parser limits and line-ending policy.

/// Default maximum length of the request-line or status-line, terminator excluded.
pub const DEFAULT_MAX_START_LINE_LENGTH: usize = 8 * 1024;

/// Default maximum length of a single header, trailer or chunk-size line, terminator excluded.
pub const DEFAULT_MAX_HEADER_LINE_LENGTH: usize = 8 * 1024;

/// Default maximum number of header fields (and, separately, trailer fields).
pub const DEFAULT_MAX_HEADER_COUNT: usize = 64;

/// Default maximum size in bytes of the whole head, terminators included.
pub const DEFAULT_MAX_HEAD_SIZE: usize = 16 * 1024;

/// Default maximum decoded chunk-size.
pub const DEFAULT_MAX_CHUNK_SIZE: u64 = 16 * 1024 * 1024;

/// Configuration of a [`ProtocolParser`](crate::codec::ProtocolParser).
///
/// ```
/// use micro_h1::codec::ParserConfig;
///
/// let config = ParserConfig::default().with_max_header_count(32).with_strict_crlf(false);
/// assert_eq!(config.max_header_count(), 32);
/// assert!(!config.strict_crlf());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct ParserConfig {
    max_start_line_length: usize,
    max_header_line_length: usize,
    max_header_count: usize,
    max_head_size: usize,
    max_chunk_size: u64,
    strict_crlf: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_start_line_length: DEFAULT_MAX_START_LINE_LENGTH,
            max_header_line_length: DEFAULT_MAX_HEADER_LINE_LENGTH,
            max_header_count: DEFAULT_MAX_HEADER_COUNT,
            max_head_size: DEFAULT_MAX_HEAD_SIZE,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            strict_crlf: true,
        }
    }
}

impl ParserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_start_line_length(mut self, max: usize) -> Self {
        self.max_start_line_length = max;
        self
    }

    pub fn with_max_header_line_length(mut self, max: usize) -> Self {
        self.max_header_line_length = max;
        self
    }

    pub fn with_max_header_count(mut self, max: usize) -> Self {
        self.max_header_count = max;
        self
    }

    pub fn with_max_head_size(mut self, max: usize) -> Self {
        self.max_head_size = max;
        self
    }

    pub fn with_max_chunk_size(mut self, max: u64) -> Self {
        self.max_chunk_size = max;
        self
    }

    /// `true` rejects a bare LF line terminator, `false` accepts it in place of CRLF.
    pub fn with_strict_crlf(mut self, strict: bool) -> Self {
        self.strict_crlf = strict;
        self
    }

    pub fn max_start_line_length(&self) -> usize {
        self.max_start_line_length
    }

    pub fn max_header_line_length(&self) -> usize {
        self.max_header_line_length
    }

    pub fn max_header_count(&self) -> usize {
        self.max_header_count
    }

    pub fn max_head_size(&self) -> usize {
        self.max_head_size
    }

    pub fn max_chunk_size(&self) -> u64 {
        self.max_chunk_size
    }

    pub fn strict_crlf(&self) -> bool {
        self.strict_crlf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_strict() {
        let config = ParserConfig::default();
        assert!(config.strict_crlf());
        assert_eq!(config.max_header_count(), DEFAULT_MAX_HEADER_COUNT);
        assert_eq!(config.max_head_size(), DEFAULT_MAX_HEAD_SIZE);
        assert_eq!(config.max_chunk_size(), DEFAULT_MAX_CHUNK_SIZE);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserializes_partial_config() {
        let config: ParserConfig = serde_json::from_str(r#"{"max_head_size": 4096, "strict_crlf": false}"#).unwrap();
        assert_eq!(config.max_head_size(), 4096);
        assert!(!config.strict_crlf());
        assert_eq!(config.max_start_line_length(), DEFAULT_MAX_START_LINE_LENGTH);

        let unknown = serde_json::from_str::<ParserConfig>(r#"{"max_body": 1}"#);
        assert!(unknown.is_err());
    }
}
