use crate::error::BroadlinkError;

/// Lowercase a MAC address and strip its `:` or `-` separators.
///
/// # Errors
///
/// Returns [`BroadlinkError::InvalidMac`] unless exactly 12 hex digits remain.
pub fn normalize_mac(raw: &str) -> Result<String, BroadlinkError> {
    let mac: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ':' | '-'))
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if mac.len() == 12 && mac.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(mac)
    } else {
        Err(BroadlinkError::InvalidMac(raw.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_strip_separators_and_lowercase() {
        assert_eq!(normalize_mac("34:EA:34:12:AB:CD").unwrap(), "34ea3412abcd");
        assert_eq!(normalize_mac("34-ea-34-12-ab-cd").unwrap(), "34ea3412abcd");
        assert_eq!(normalize_mac("34ea3412abcd").unwrap(), "34ea3412abcd");
    }

    #[test]
    fn should_reject_wrong_length_or_non_hex() {
        assert!(normalize_mac("34:EA:34:12:AB").is_err());
        assert_eq!(
            normalize_mac("zz:ea:34:12:ab:cd"),
            Err(BroadlinkError::InvalidMac("zz:ea:34:12:ab:cd".to_string()))
        );
    }
}
