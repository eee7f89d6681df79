mod grid;
mod sections;
mod tiles;

use anyhow::Context as _;
use image::{codecs::jpeg::JpegEncoder, DynamicImage, Rgba, RgbaImage};

pub use grid::{GridPermutation, SwapSeed, GRID_SIZE};
pub use sections::SectionGrid;
pub use tiles::{BlockMove, TileMap};

const BYTES_PER_PIXEL: usize = 4;

/// What the output canvas holds before any block is drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Background {
	#[default]
	Transparent,
	Black,
	White,
}

impl Background {
	fn canvas(self, width: u32, height: u32) -> RgbaImage {
		match self {
			Background::Transparent => RgbaImage::new(width, height),
			Background::Black => RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])),
			Background::White => RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])),
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct DescrambleOptions {
	/// JPEG quality of the re-encoded output, 1 to 100.
	pub quality: u8,
	pub background: Background,
	/// Inverts the colours of every drawn pixel after descrambling.
	pub invert: bool,
}

impl Default for DescrambleOptions {
	fn default() -> Self {
		Self {
			quality: 90,
			background: Background::Transparent,
			invert: false,
		}
	}
}

pub trait Descrambler {
	/// Draws the original layout of `scrambled` onto `restored`, a canvas of
	/// the same size.
	fn descramble_into(
		&self, scrambled: &RgbaImage, restored: &mut RgbaImage,
	) -> Result<(), anyhow::Error>;

	/// Rebuilds the original layout into a new transparent image of the same size.
	fn descramble(&self, scrambled: &RgbaImage) -> Result<RgbaImage, anyhow::Error> {
		self.descramble_with(scrambled, &DescrambleOptions::default())
	}

	fn descramble_with(
		&self, scrambled: &RgbaImage, options: &DescrambleOptions,
	) -> Result<RgbaImage, anyhow::Error> {
		let (width, height) = scrambled.dimensions();
		let mut restored = options.background.canvas(width, height);
		self.descramble_into(scrambled, &mut restored)?;
		if options.invert {
			invert_opaque(&mut restored);
		}
		Ok(restored)
	}

	/// Decodes `bytes` (any format `image` can sniff), descrambles, and
	/// re-encodes as JPEG.
	fn unscramble(&self, bytes: &[u8]) -> Result<Vec<u8>, anyhow::Error> {
		self.unscramble_with(bytes, &DescrambleOptions::default())
	}

	fn unscramble_with(
		&self, bytes: &[u8], options: &DescrambleOptions,
	) -> Result<Vec<u8>, anyhow::Error> {
		let scrambled = image::load_from_memory(bytes)
			.context("Failed to decode scrambled image")?
			.to_rgba8();
		let restored = self.descramble_with(&scrambled, options)?;
		encode_jpeg(restored, options.quality)
	}
}

fn invert_opaque(image: &mut RgbaImage) {
	for pixel in image.pixels_mut().filter(|pixel| pixel[3] > 0) {
		for channel in &mut pixel.0[..3] {
			*channel = 255 - *channel;
		}
	}
}

pub fn encode_jpeg(image: RgbaImage, quality: u8) -> Result<Vec<u8>, anyhow::Error> {
	let rgb = DynamicImage::ImageRgba8(image).to_rgb8();
	let mut out = Vec::new();
	JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
		.encode_image(&rgb)
		.context("Failed to encode JPEG")?;
	Ok(out)
}

fn fits(image: &RgbaImage, x: u32, y: u32, width: u32, height: u32) -> bool {
	let (image_width, image_height) = image.dimensions();
	x.checked_add(width).is_some_and(|right| right <= image_width)
		&& y.checked_add(height).is_some_and(|bottom| bottom <= image_height)
}

/// Copies the `width`×`height` block at `from` in `source` to `to` in
/// `target`, row by row.
fn copy_block(
	source: &RgbaImage, target: &mut RgbaImage, from: (u32, u32), to: (u32, u32), size: (u32, u32),
) -> Result<(), anyhow::Error> {
	let (width, height) = size;
	anyhow::ensure!(
		fits(source, from.0, from.1, width, height),
		"Source block at {from:?} ({width}x{height}) is outside the {}x{} image",
		source.width(),
		source.height()
	);
	anyhow::ensure!(
		fits(target, to.0, to.1, width, height),
		"Destination block at {to:?} ({width}x{height}) is outside the {}x{} image",
		target.width(),
		target.height()
	);

	let source_stride = source.width() as usize * BYTES_PER_PIXEL;
	let target_stride = target.width() as usize * BYTES_PER_PIXEL;
	let row_bytes = width as usize * BYTES_PER_PIXEL;
	let src = source.as_raw();
	let dst: &mut [u8] = target;

	for row in 0..height as usize {
		let src_off = (from.1 as usize + row) * source_stride + from.0 as usize * BYTES_PER_PIXEL;
		let dst_off = (to.1 as usize + row) * target_stride + to.0 as usize * BYTES_PER_PIXEL;
		dst[dst_off..dst_off + row_bytes].copy_from_slice(&src[src_off..src_off + row_bytes]);
	}

	Ok(())
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_copy_block() {
		let source = fixtures::checkerboard(8, 8, 4);
		let mut target = RgbaImage::new(8, 8);
		copy_block(&source, &mut target, (4, 0), (0, 4), (4, 4)).unwrap();

		assert_eq!(target.get_pixel(0, 4), source.get_pixel(4, 0));
		assert_eq!(target.get_pixel(3, 7), source.get_pixel(7, 3));
		assert_eq!(*target.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
	}

	#[test]
	fn test_copy_block_out_of_bounds() {
		let source = fixtures::checkerboard(8, 8, 4);
		let mut target = RgbaImage::new(8, 8);
		assert!(copy_block(&source, &mut target, (5, 0), (0, 0), (4, 4)).is_err());
		assert!(copy_block(&source, &mut target, (0, 0), (0, 6), (4, 4)).is_err());
		assert!(copy_block(&source, &mut target, (u32::MAX, 0), (0, 0), (4, 4)).is_err());
	}

	#[test]
	fn test_encode_jpeg() {
		let jpeg = encode_jpeg(fixtures::checkerboard(32, 32, 8), 90).unwrap();
		assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
		assert_eq!(image::guess_format(&jpeg).unwrap(), image::ImageFormat::Jpeg);
	}

	#[test]
	fn test_default_options() {
		let options = DescrambleOptions::default();
		assert_eq!(options.quality, 90);
		assert_eq!(options.background, Background::Transparent);
		assert!(!options.invert);
	}

	#[test]
	fn test_background_and_invert() {
		// 16px sections on a 40px wide image leave x 32..40 uncovered.
		let scrambled = RgbaImage::from_pixel(40, 32, Rgba([200, 40, 40, 255]));
		let identity = SectionGrid::new(16, 16, SwapSeed::new(0, 1, 0, 0));

		let plain = identity.descramble(&scrambled).unwrap();
		assert_eq!(*plain.get_pixel(16, 16), Rgba([200, 40, 40, 255]));
		assert_eq!(*plain.get_pixel(38, 16), Rgba([0, 0, 0, 0]));

		let white = DescrambleOptions {
			background: Background::White,
			..Default::default()
		};
		let restored = identity.descramble_with(&scrambled, &white).unwrap();
		assert_eq!(*restored.get_pixel(38, 16), Rgba([255, 255, 255, 255]));

		let inverted_black = DescrambleOptions {
			background: Background::Black,
			invert: true,
			..Default::default()
		};
		let restored = identity.descramble_with(&scrambled, &inverted_black).unwrap();
		assert_eq!(*restored.get_pixel(16, 16), Rgba([55, 215, 215, 255]));
		assert_eq!(*restored.get_pixel(38, 16), Rgba([255, 255, 255, 255]));

		let inverted = DescrambleOptions {
			invert: true,
			..Default::default()
		};
		let restored = identity.descramble_with(&scrambled, &inverted).unwrap();
		assert_eq!(*restored.get_pixel(38, 16), Rgba([0, 0, 0, 0]));
	}
}
