use scanveil_cryptography::sources::initmanga::{self, CipherPayload};

use crate::descramble::{DescrambleOptions, Descrambler};

pub async fn unscramble<D>(
	descrambler: D, bytes: Vec<u8>, options: DescrambleOptions,
) -> Result<Vec<u8>, anyhow::Error>
where
	D: Descrambler + Send + 'static,
{
	tokio::task::spawn_blocking(move || descrambler.unscramble_with(&bytes, &options)).await?
}

pub async fn decrypt_layered(html: String, payload: CipherPayload) -> Option<String> {
	let result = tokio::task::spawn_blocking(move || {
		initmanga::decrypt_layered_with(&payload, || initmanga::find_passphrase(&html))
	})
	.await;

	match result {
		Ok(plaintext) => plaintext,
		Err(err) => {
			log::warn!("Decryption task failed: {err}");
			None
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::descramble::GridPermutation;

	#[tokio::test]
	async fn test_unscramble() {
		let image = image::RgbaImage::from_pixel(32, 32, image::Rgba([200, 40, 40, 255]));
		let mut png = Vec::new();
		image
			.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
			.unwrap();

		let identity = GridPermutation::fixed((0..256).collect()).unwrap();
		let jpeg = unscramble(
			identity,
			png,
			DescrambleOptions {
				quality: 75,
				..Default::default()
			},
		)
		.await
		.unwrap();
		assert_eq!(image::guess_format(&jpeg).unwrap(), image::ImageFormat::Jpeg);
	}

	#[tokio::test]
	async fn test_unscramble_error() {
		let identity = GridPermutation::fixed((0..256).collect()).unwrap();
		let result = unscramble(identity, b"nope".to_vec(), DescrambleOptions::default()).await;
		assert!(result.is_err());
	}

	#[tokio::test]
	async fn test_decrypt_layered_without_key() {
		let payload = CipherPayload::new("AAAA", "00", "00");
		assert_eq!(decrypt_layered("<html></html>".to_string(), payload).await, None);
	}
}
