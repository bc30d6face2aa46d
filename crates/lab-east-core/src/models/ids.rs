//! Sequential record identifiers (`PAT-001`, `TR-014`).

/// Prefix for patient identifiers.
pub const PATIENT_ID_PREFIX: &str = "PAT-";

/// Prefix for test result identifiers.
pub const TEST_RESULT_ID_PREFIX: &str = "TR-";

/// Prefix for generated report identifiers.
pub const REPORT_ID_PREFIX: &str = "RPT-";

/// Format a sequence number as `<prefix><NNN>`, zero-padded to three digits.
pub fn format_sequence_id(prefix: &str, sequence: u32) -> String {
    format!("{}{:03}", prefix, sequence)
}

/// Parse the numeric suffix of a sequential identifier.
///
/// Returns `None` if the prefix does not match or the suffix is not a
/// plain decimal number.
pub fn parse_sequence_id(prefix: &str, id: &str) -> Option<u32> {
    let digits = id.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Format a patient identifier.
pub fn patient_id(sequence: u32) -> String {
    format_sequence_id(PATIENT_ID_PREFIX, sequence)
}

/// Format a test result identifier.
pub fn test_result_id(sequence: u32) -> String {
    format_sequence_id(TEST_RESULT_ID_PREFIX, sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pads_to_three_digits() {
        assert_eq!(patient_id(1), "PAT-001");
        assert_eq!(patient_id(42), "PAT-042");
        assert_eq!(test_result_id(7), "TR-007");
    }

    #[test]
    fn test_format_grows_past_three_digits() {
        assert_eq!(patient_id(1000), "PAT-1000");
    }

    #[test]
    fn test_parse_sequence_id() {
        assert_eq!(parse_sequence_id(PATIENT_ID_PREFIX, "PAT-007"), Some(7));
        assert_eq!(parse_sequence_id(PATIENT_ID_PREFIX, "PAT-1000"), Some(1000));
        assert_eq!(parse_sequence_id(PATIENT_ID_PREFIX, "TR-007"), None);
        assert_eq!(parse_sequence_id(PATIENT_ID_PREFIX, "PAT-"), None);
        assert_eq!(parse_sequence_id(PATIENT_ID_PREFIX, "PAT-+12"), None);
        assert_eq!(parse_sequence_id(TEST_RESULT_ID_PREFIX, "TR-1700000000000"), None);
    }
}
