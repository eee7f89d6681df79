use base64::{
	alphabet,
	engine::{general_purpose::GeneralPurpose, DecodePaddingMode, GeneralPurposeConfig},
	Engine as _,
};

// Sites are inconsistent about trailing `=`, so accept both forms.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
	&alphabet::STANDARD,
	GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decodes a hex string. Odd-length or otherwise malformed input yields an
/// empty buffer instead of an error.
pub fn decode_hex(input: &str) -> Vec<u8> {
	hex::decode(input.trim()).unwrap_or_default()
}

/// Decodes standard base64, ignoring embedded whitespace and missing padding.
pub fn decode_base64(input: &str) -> Option<Vec<u8>> {
	let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
	LENIENT.decode(compact).ok()
}

pub fn decode_base64_utf8(input: &str) -> Option<String> {
	decode_base64(input).and_then(|bytes| String::from_utf8(bytes).ok())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_decode_hex() {
		assert_eq!(decode_hex("00ff10"), vec![0x00, 0xff, 0x10]);
		assert_eq!(decode_hex("  0A0b "), vec![0x0a, 0x0b]);
	}

	#[test]
	fn test_decode_hex_odd_length_is_empty() {
		assert!(decode_hex("abc").is_empty());
		assert!(decode_hex("zz").is_empty());
		assert!(decode_hex("").is_empty());
	}

	#[test]
	fn test_decode_base64() {
		assert_eq!(decode_base64("SGVsbG8=").unwrap(), b"Hello");
		assert_eq!(decode_base64("SGVsbG8").unwrap(), b"Hello");
		assert_eq!(decode_base64("SGVs\nbG8=").unwrap(), b"Hello");
		assert!(decode_base64("not base64!").is_none());
	}

	#[test]
	fn test_decode_base64_utf8() {
		assert_eq!(decode_base64_utf8("c2VjcmV0").as_deref(), Some("secret"));
		assert_eq!(decode_base64_utf8("/w=="), None);
	}
}
