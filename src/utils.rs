use ethers::types::{Address, Bytes};
use ethers::utils::to_checksum;
use thiserror::Error;

/// Rejected user input from one of the form fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("'{0}' is not a 0x-prefixed 40-hex-digit address")]
    MalformedAddress(String),
    #[error("'{0}' fails its EIP-55 checksum")]
    BadChecksum(String),
    #[error("interval must be a whole number of milliseconds greater than zero, got '{0}'")]
    InvalidInterval(String),
}

/// Checksummed (EIP-55) form of an address
pub fn checksum(address: &Address) -> String {
    to_checksum(address, None)
}

/// Shorten an address for log lines: first 6 and last 4 characters, e.g. `0xf39F...2266`
pub fn shorten_address(address: &Address) -> String {
    shorten_hex(&checksum(address))
}

/// Shorten any hex string the same way as addresses. Short input is returned unchanged.
pub fn shorten_hex(s: &str) -> String {
    if s.len() <= 10 || !s.is_ascii() {
        return s.to_string();
    }
    format!("{}...{}", &s[..6], &s[s.len() - 4..])
}

/// Parse a recipient address the way wallets validate it: `0x` + 40 hex digits,
/// and if the input mixes upper and lower case it must be a valid EIP-55 checksum.
pub fn parse_address(input: &str) -> Result<Address, InputError> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .filter(|d| d.len() == 40 && d.chars().all(|c| c.is_ascii_hexdigit()))
        .ok_or_else(|| InputError::MalformedAddress(trimmed.to_string()))?;

    let address: Address = trimmed
        .parse()
        .map_err(|_| InputError::MalformedAddress(trimmed.to_string()))?;

    let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && checksum(&address) != trimmed {
        return Err(InputError::BadChecksum(trimmed.to_string()));
    }
    Ok(address)
}

/// Parse the interval field. Must be a positive integer number of milliseconds.
pub fn parse_interval_ms(input: &str) -> Result<u64, InputError> {
    let trimmed = input.trim();
    match trimmed.parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(ms),
        _ => Err(InputError::InvalidInterval(trimmed.to_string())),
    }
}

/// Calldata for an inscription: the UTF-8 bytes of the payload text
pub fn inscription_bytes(payload: &str) -> Bytes {
    Bytes::from(payload.as_bytes().to_vec())
}

/// 0x-prefixed hex of the inscription, as it will appear in the transaction input
pub fn inscription_hex(payload: &str) -> String {
    format!("0x{}", hex::encode(payload.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HARDHAT_0: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    // ==================== shorten tests ====================

    #[test]
    fn test_shorten_address() {
        let address: Address = HARDHAT_0.parse().unwrap();
        assert_eq!(shorten_address(&address), "0xf39F...2266");
    }

    #[test]
    fn test_shorten_hex_short_input_unchanged() {
        assert_eq!(shorten_hex("0x1234"), "0x1234");
    }

    #[test]
    fn test_shorten_hex_hash() {
        let hash = format!("0x{}", "ab".repeat(32));
        assert_eq!(shorten_hex(&hash), "0xabab...abab");
    }

    // ==================== parse_address tests ====================

    #[test]
    fn test_parse_address_checksummed() {
        let address = parse_address(HARDHAT_0).unwrap();
        assert_eq!(checksum(&address), HARDHAT_0);
    }

    #[test]
    fn test_parse_address_all_lowercase() {
        assert!(parse_address(&HARDHAT_0.to_lowercase()).is_ok());
    }

    #[test]
    fn test_parse_address_trims_whitespace() {
        assert!(parse_address(&format!("  {}\n", HARDHAT_0)).is_ok());
    }

    #[test]
    fn test_parse_address_bad_checksum() {
        // flip the case of one letter
        let bad = HARDHAT_0.replacen("f39F", "f39f", 1);
        assert!(matches!(parse_address(&bad), Err(InputError::BadChecksum(_))));
    }

    #[test]
    fn test_parse_address_requires_prefix() {
        let no_prefix = &HARDHAT_0[2..];
        assert!(matches!(parse_address(no_prefix), Err(InputError::MalformedAddress(_))));
    }

    #[test]
    fn test_parse_address_wrong_length() {
        assert!(parse_address("0x1234").is_err());
        assert!(parse_address("").is_err());
    }

    #[test]
    fn test_parse_address_non_hex() {
        let bad = format!("0x{}", "g".repeat(40));
        assert!(parse_address(&bad).is_err());
    }

    // ==================== interval tests ====================

    #[test]
    fn test_parse_interval_ms() {
        assert_eq!(parse_interval_ms("1500").unwrap(), 1500);
        assert_eq!(parse_interval_ms(" 20 ").unwrap(), 20);
    }

    #[test]
    fn test_parse_interval_rejects_zero_and_garbage() {
        assert!(parse_interval_ms("0").is_err());
        assert!(parse_interval_ms("-5").is_err());
        assert!(parse_interval_ms("fast").is_err());
        assert!(parse_interval_ms("").is_err());
    }

    // ==================== inscription encoding tests ====================

    #[test]
    fn test_inscription_hex() {
        assert_eq!(inscription_hex("data:,hi"), "0x646174613a2c6869");
    }

    #[test]
    fn test_inscription_hex_utf8() {
        // multi-byte characters are encoded as their UTF-8 bytes
        assert_eq!(inscription_hex("é"), "0xc3a9");
    }

    #[test]
    fn test_inscription_bytes_matches_hex() {
        let payload = r#"data:,{"p":"asc-20","op":"mint","tick":"aval","amt":"100000000"}"#;
        let bytes = inscription_bytes(payload);
        assert_eq!(format!("0x{}", hex::encode(bytes.as_ref())), inscription_hex(payload));
    }
}
