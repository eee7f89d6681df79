use aes::cipher::KeyIvInit;
use cbc::{
	cipher::{block_padding::Pkcs7, BlockDecryptMut},
	Decryptor,
};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha512;

pub const KEY_LEN: usize = 32;
pub const IV_LEN: usize = 16;

type Aes256CbcDec = Decryptor<aes::Aes256Dec>;

/// AES-256-CBC with PKCS#7 (PKCS5Padding in JCE terms).
pub fn decrypt(ciphertext: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>, anyhow::Error> {
	anyhow::ensure!(key.len() == KEY_LEN, "AES-256 key must be {KEY_LEN} bytes, got {}", key.len());
	anyhow::ensure!(iv.len() == IV_LEN, "CBC IV must be {IV_LEN} bytes, got {}", iv.len());

	let mut buf = ciphertext.to_vec();
	let plaintext = Aes256CbcDec::new_from_slices(key, iv)
		.map_err(|_| anyhow::anyhow!("Invalid key or IV length"))?
		.decrypt_padded_mut::<Pkcs7>(&mut buf)
		.map_err(|_| anyhow::anyhow!("Bad padding"))?;

	Ok(plaintext.to_vec())
}

/// PBKDF2-HMAC-SHA512 producing a 256-bit AES key.
pub fn derive_key(passphrase: &[u8], salt: &[u8], iterations: u32) -> [u8; KEY_LEN] {
	let mut key = [0u8; KEY_LEN];
	pbkdf2_hmac::<Sha512>(passphrase, salt, iterations, &mut key);
	key
}

#[cfg(test)]
pub(crate) fn encrypt(plaintext: &[u8], key: &[u8], iv: &[u8]) -> Vec<u8> {
	use cbc::cipher::BlockEncryptMut;

	let len = plaintext.len();
	let mut buf = vec![0u8; len + IV_LEN];
	buf[..len].copy_from_slice(plaintext);
	cbc::Encryptor::<aes::Aes256Enc>::new_from_slices(key, iv)
		.unwrap()
		.encrypt_padded_mut::<Pkcs7>(&mut buf, len)
		.unwrap()
		.to_vec()
}
