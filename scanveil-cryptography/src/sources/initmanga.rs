use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use crate::ciphers::{
	aes_cbc,
	encoding::{decode_base64, decode_base64_utf8, decode_hex},
};

/// Fixed AES-256 key used by the first tier. Opaque, do not derive.
pub const STATIC_KEY_HEX: &str = "4f1c9a2e7b3d6085e1a4c7f02b9d3e6a8c5f0e1d2a7b4c9e3f6a0d8b1e5c7a92";

/// PBKDF2 iteration count. The site uses exactly this value.
pub const PBKDF2_ITERATIONS: u32 = 999;

const DATA_MARKER: &str = "InitMangaData";
const CHAPTER_ASSIGNMENT: &str = "InitMangaEncryptedChapter=";

static SCRIPT_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<script\b[^>]*>").unwrap());

static EXTRA_SCRIPT_ID: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r#"(?i)\bid\s*=\s*["']init-main-js-extra["']"#).unwrap());

static DATA_URI_SRC: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"(?i)\bsrc\s*=\s*["']data:[^"',]*;base64,([^"']+)["']"#).unwrap()
});

static DECRYPTION_KEY: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"["']?decryption_key["']?\s*[:=]\s*["']([^"']+)["']"#).unwrap()
});

static ENCRYPTED_CHAPTER: LazyLock<Regex> = LazyLock::new(|| {
	RegexBuilder::new(r"InitMangaEncryptedChapter\s*=\s*(\{.*?\})")
		.dot_matches_new_line(true)
		.build()
		.unwrap()
});

/// The `{ciphertext, iv, salt}` object embedded in encrypted chapter pages.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CipherPayload {
	/// Base64.
	pub ciphertext: String,
	/// Hex.
	pub iv: String,
	/// Hex. Only used when the key is derived from a passphrase.
	#[serde(default)]
	pub salt: String,
}

impl CipherPayload {
	pub fn new(ciphertext: &str, iv_hex: &str, salt_hex: &str) -> Self {
		Self {
			ciphertext: ciphertext.to_string(),
			iv: iv_hex.to_string(),
			salt: salt_hex.to_string(),
		}
	}
}

/// Result of one decryption attempt.
#[derive(Debug)]
pub enum TierOutcome {
	/// Decrypted to something that looks like HTML or JSON.
	Decrypted(String),
	/// Decrypted cleanly but the text is not HTML or JSON.
	Rejected,
	/// Decoding or decryption failed outright.
	Failed(anyhow::Error),
}

impl TierOutcome {
	pub fn into_plaintext(self) -> Option<String> {
		match self {
			TierOutcome::Decrypted(text) => Some(text),
			TierOutcome::Rejected | TierOutcome::Failed(_) => None,
		}
	}

	pub fn is_decrypted(&self) -> bool {
		matches!(self, TierOutcome::Decrypted(_))
	}
}

fn looks_decrypted(text: &str) -> bool {
	let trimmed = text.trim();
	trimmed.starts_with('<') || trimmed.starts_with('[')
}

/// Decrypts `payload` with a raw 256-bit key and applies the HTML/JSON check.
pub fn decrypt_with_key(payload: &CipherPayload, key: &[u8]) -> TierOutcome {
	let result = decode_ciphertext(&payload.ciphertext)
		.and_then(|ciphertext| aes_cbc::decrypt(&ciphertext, key, &decode_hex(&payload.iv)))
		.map(|plaintext| String::from_utf8_lossy(&plaintext).into_owned());

	match result {
		Ok(text) if looks_decrypted(&text) => TierOutcome::Decrypted(text),
		Ok(_) => TierOutcome::Rejected,
		Err(err) => TierOutcome::Failed(err),
	}
}

fn decode_ciphertext(ciphertext: &str) -> Result<Vec<u8>, anyhow::Error> {
	decode_base64(ciphertext)
		.ok_or_else(|| anyhow::anyhow!("Ciphertext is not valid base64"))
}

/// First tier: the fixed key.
pub fn decrypt_static(payload: &CipherPayload) -> TierOutcome {
	decrypt_with_key(payload, &decode_hex(STATIC_KEY_HEX))
}

/// Second tier without discovery: derive the key from a known passphrase.
pub fn decrypt_with_passphrase(payload: &CipherPayload, passphrase: &str) -> TierOutcome {
	let key = aes_cbc::derive_key(
		passphrase.as_bytes(),
		&decode_hex(&payload.salt),
		PBKDF2_ITERATIONS,
	);
	decrypt_with_key(payload, &key)
}

/// Decodes the base64 `decryption_key` hidden in the page.
pub fn find_passphrase(html: &str) -> Option<String> {
	let raw_key = extra_script_source(html)
		.and_then(|script| capture_key(&script))
		.or_else(|| {
			// Keys before the marker are decoys.
			let start = html.find(DATA_MARKER)?;
			log::debug!("Falling back to {DATA_MARKER} scoped key search");
			capture_key(&html[start..])
		})?;

	let passphrase = decode_base64_utf8(&raw_key);
	if passphrase.is_none() {
		log::debug!("decryption_key is not base64 encoded UTF-8");
	}
	passphrase
}

fn capture_key(haystack: &str) -> Option<String> {
	DECRYPTION_KEY
		.captures(haystack)
		.map(|caps| caps[1].to_string())
}

fn extra_script_source(html: &str) -> Option<String> {
	SCRIPT_TAG
		.find_iter(html)
		.map(|tag| tag.as_str())
		.find(|tag| EXTRA_SCRIPT_ID.is_match(tag))
		.and_then(|tag| DATA_URI_SRC.captures(tag))
		.and_then(|caps| decode_base64_utf8(&caps[1]))
}

fn data_uri_scripts(html: &str) -> impl Iterator<Item = String> + '_ {
	SCRIPT_TAG
		.find_iter(html)
		.filter_map(|tag| DATA_URI_SRC.captures(tag.as_str()))
		.filter_map(|caps| decode_base64_utf8(&caps[1]))
}

/// Runs both tiers, using `discover` to obtain the passphrase for the second.
///
/// `discover` is only invoked when the fixed key fails.
pub fn decrypt_layered_with<F>(payload: &CipherPayload, discover: F) -> Option<String>
where
	F: FnOnce() -> Option<String>,
{
	match decrypt_static(payload) {
		TierOutcome::Decrypted(text) => return Some(text),
		TierOutcome::Rejected => log::debug!("Static key produced neither HTML nor JSON"),
		TierOutcome::Failed(err) => log::debug!("Static key failed: {err}"),
	}

	let Some(passphrase) = discover() else {
		log::warn!("Static key failed and no passphrase was found");
		return None;
	};

	match decrypt_with_passphrase(payload, &passphrase) {
		TierOutcome::Decrypted(text) => Some(text),
		TierOutcome::Rejected => {
			log::warn!("Derived key produced neither HTML nor JSON");
			None
		}
		TierOutcome::Failed(err) => {
			log::warn!("Derived key failed: {err}");
			None
		}
	}
}

/// Decrypts an encrypted chapter, discovering the passphrase in `html` if the
/// fixed key does not work. Returns `None` when every tier fails.
pub fn decrypt_layered(
	html: &str, ciphertext: &str, iv_hex: &str, salt_hex: &str,
) -> Option<String> {
	let payload = CipherPayload::new(ciphertext, iv_hex, salt_hex);
	decrypt_layered_with(&payload, || find_passphrase(html))
}

/// Finds the `InitMangaEncryptedChapter` object, either inside a base64
/// data-URI script or inline in the page.
pub fn find_cipher_payload(html: &str) -> Option<CipherPayload> {
	data_uri_scripts(html)
		.find_map(|script| parse_encrypted_chapter(&script))
		.or_else(|| parse_encrypted_chapter(html))
}

fn parse_encrypted_chapter(haystack: &str) -> Option<CipherPayload> {
	ENCRYPTED_CHAPTER
		.captures(haystack)
		.and_then(|caps| parse_cipher_object(&caps[1]))
		.or_else(|| {
			// The lazy object match stops at the first `}`, so nested objects need
			// the whole assignment up to the last `;`.
			let (_, rest) = haystack.split_once(CHAPTER_ASSIGNMENT)?;
			let object = rest.rsplit_once(';').map_or(rest, |(object, _)| object);
			parse_cipher_object(object)
		})
}

fn parse_cipher_object(object: &str) -> Option<CipherPayload> {
	match serde_json::from_str(object.trim()) {
		Ok(payload) => Some(payload),
		Err(err) => {
			log::debug!("Malformed InitMangaEncryptedChapter: {err}");
			None
		}
	}
}

/// Locates and decrypts the chapter payload of a page.
pub fn decrypt_page(html: &str) -> Option<String> {
	let payload = find_cipher_payload(html)?;
	decrypt_layered_with(&payload, || find_passphrase(html))
}

#[cfg(test)]
pub(crate) mod fixtures {
	use base64::{engine::general_purpose::STANDARD, Engine as _};

	use super::*;

	pub const IV_HEX: &str = "000102030405060708090a0b0c0d0e0f";
	pub const SALT_HEX: &str = "a1b2c3d4e5f60718";

	pub fn seal(plaintext: &str, key: &[u8]) -> String {
		seal_bytes(plaintext.as_bytes(), key)
	}

	pub fn seal_bytes(plaintext: &[u8], key: &[u8]) -> String {
		STANDARD.encode(aes_cbc::encrypt(plaintext, key, &decode_hex(IV_HEX)))
	}

	pub fn seal_static(plaintext: &str) -> CipherPayload {
		CipherPayload::new(&seal(plaintext, &decode_hex(STATIC_KEY_HEX)), IV_HEX, SALT_HEX)
	}

	pub fn seal_with_passphrase(plaintext: &str, passphrase: &str, iterations: u32) -> CipherPayload {
		let key = aes_cbc::derive_key(passphrase.as_bytes(), &decode_hex(SALT_HEX), iterations);
		CipherPayload::new(&seal(plaintext, &key), IV_HEX, SALT_HEX)
	}

	pub fn b64(text: &str) -> String {
		STANDARD.encode(text)
	}
}
