use image::RgbaImage;

use super::{Descrambler, GridPermutation, SwapSeed};

/// A grid of fixed-size sections whose order comes from a [`SwapSeed`].
///
/// The grid holds as many whole sections as fit in the image, so the cell
/// count depends on the image and the permutation is generated per image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SectionGrid {
	pub section_width: u32,
	pub section_height: u32,
	pub seed: SwapSeed,
}

impl SectionGrid {
	pub fn new(section_width: u32, section_height: u32, seed: SwapSeed) -> Self {
		Self {
			section_width,
			section_height,
			seed,
		}
	}

	/// The grid used for a `width`×`height` image, or `None` if not a single
	/// section fits.
	pub fn grid_for(&self, width: u32, height: u32) -> Result<Option<GridPermutation>, anyhow::Error> {
		anyhow::ensure!(
			self.section_width > 0 && self.section_height > 0,
			"Section size must be positive, got {}x{}",
			self.section_width,
			self.section_height
		);

		let cols = width / self.section_width;
		let rows = height / self.section_height;
		if cols == 0 || rows == 0 {
			return Ok(None);
		}

		let grid = GridPermutation::seeded(cols, rows, &self.seed)?;
		Ok(Some(grid.with_cell_size(self.section_width, self.section_height)))
	}
}

impl Descrambler for SectionGrid {
	fn descramble_into(
		&self, scrambled: &RgbaImage, restored: &mut RgbaImage,
	) -> Result<(), anyhow::Error> {
		let (width, height) = scrambled.dimensions();
		match self.grid_for(width, height)? {
			Some(grid) => grid.descramble_into(scrambled, restored),
			None => {
				log::debug!(
					"{width}x{height} image is smaller than one {}x{} section",
					self.section_width,
					self.section_height
				);
				Ok(())
			}
		}
	}
}
