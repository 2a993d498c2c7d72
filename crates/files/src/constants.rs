/// `chrono` format used as the prefix of stored upload names.
///
/// Sorts lexically in upload order and contains no characters that need escaping in a URL.
pub const STORED_NAME_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%3f";

/// Name used when an uploaded filename sanitises to nothing.
pub const FALLBACK_FILENAME: &str = "upload";

/// Number of hex characters of randomness appended after the timestamp.
pub(crate) const RANDOM_SUFFIX_LEN: usize = 8;
