//! Numeric attribute parsing.

/// Parse a strictly positive integer identifier.
///
/// Empty, signed, fractional and zero values (including `"00"`) are
/// rejected. Surrounding whitespace is tolerated.
pub(crate) fn positive_id(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|id| *id > 0)
}

/// Parse a version number; zero is accepted.
pub(crate) fn version_number(raw: &str) -> Option<u64> {
    raw.trim().parse().ok()
}
