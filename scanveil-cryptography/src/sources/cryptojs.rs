use std::sync::LazyLock;

use regex::Regex;

use crate::sources::initmanga::{decrypt_with_passphrase, CipherPayload};

static PASSPHRASE_CALL: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"CryptoJSAesDecrypt\(\s*'(.*?)'\s*,\s*htmlContent").unwrap());

static HTML_CONTENT: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r#"var\s+htmlContent\s*=\s*"((?:[^"\\]|\\.)*)""#).unwrap());

pub fn find_passphrase(script: &str) -> Option<String> {
	let caps = PASSPHRASE_CALL.captures(script)?;
	Some(caps[1].replace("'+'", ""))
}

/// Reads the JSON-in-a-string `htmlContent` variable.
pub fn find_cipher_payload(script: &str) -> Option<CipherPayload> {
	let literal = &HTML_CONTENT.captures(script)?[1];
	let json = literal
		.replace("\\\"", "\"")
		.replace("\\\\", "\\")
		.replace("\\/", "/");

	serde_json::from_str(&json)
		.map_err(|err| log::debug!("Malformed htmlContent: {err}"))
		.ok()
}

/// Decrypts a page whose script carries both the payload and the passphrase.
pub fn decrypt_page(script: &str) -> Option<String> {
	let payload = find_cipher_payload(script)?;
	let passphrase = find_passphrase(script)?;
	decrypt_with_passphrase(&payload, &passphrase).into_plaintext()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sources::initmanga::{fixtures::seal_with_passphrase, PBKDF2_ITERATIONS};

	#[test]
	fn test_find_passphrase() {
		let script = "var chapterHTML=CryptoJSAesDecrypt('pa'+'ss'+'word',htmlContent);";
		assert_eq!(find_passphrase(script).as_deref(), Some("password"));
		assert_eq!(find_passphrase("var chapterHTML = '';"), None);
	}

	#[test]
	fn test_find_cipher_payload() {
		let script = r#"var htmlContent="{\"ciphertext\":\"ab\\/cd\",\"iv\":\"00\",\"salt\":\"11\"}";"#;
		assert_eq!(
			find_cipher_payload(script),
			Some(CipherPayload::new("ab/cd", "00", "11"))
		);
	}

	#[test]
	fn test_decrypt_page() {
		let html = r#"<div class="page-chapter"><img src="/1.jpg"></div>"#;
		let payload = seal_with_passphrase(html, "a3-key", PBKDF2_ITERATIONS);
		let json = format!(
			r#"{{"ciphertext":"{}","iv":"{}","salt":"{}"}}"#,
			payload.ciphertext.replace('/', "\\/"),
			payload.iv,
			payload.salt
		)
		.replace('"', "\\\"");
		let script = format!(
			"var htmlContent=\"{json}\";\nvar chapterHTML=CryptoJSAesDecrypt('a3'+'-key',htmlContent);"
		);

		assert_eq!(decrypt_page(&script).as_deref(), Some(html));
	}
}
