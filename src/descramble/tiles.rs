use image::RgbaImage;

use super::{copy_block, Descrambler};

/// One block copy, in pixels. The block whose top-left corner is
/// (`src_x`, `src_y`) in the scrambled image lands at (`dst_x`, `dst_y`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockMove {
	pub src_x: u32,
	pub src_y: u32,
	pub dst_x: u32,
	pub dst_y: u32,
}

/// An explicit list of block moves sharing one block size.
#[derive(Clone, Debug, PartialEq)]
pub struct TileMap {
	pub block_width: u32,
	pub block_height: u32,
	pub moves: Vec<BlockMove>,
}

impl TileMap {
	pub fn new(block_width: u32, block_height: u32, moves: Vec<BlockMove>) -> Self {
		Self {
			block_width,
			block_height,
			moves,
		}
	}

	/// Tuples stored as `(src_x, src_y, dst_x, dst_y)`.
	pub fn from_source_first<I>(block_width: u32, block_height: u32, tuples: I) -> Self
	where
		I: IntoIterator<Item = (u32, u32, u32, u32)>,
	{
		let moves = tuples
			.into_iter()
			.map(|(src_x, src_y, dst_x, dst_y)| BlockMove {
				src_x,
				src_y,
				dst_x,
				dst_y,
			})
			.collect();
		Self::new(block_width, block_height, moves)
	}

	/// Tuples stored as `(dst_x, dst_y, src_x, src_y)`.
	pub fn from_destination_first<I>(block_width: u32, block_height: u32, tuples: I) -> Self
	where
		I: IntoIterator<Item = (u32, u32, u32, u32)>,
	{
		Self::from_source_first(
			block_width,
			block_height,
			tuples
				.into_iter()
				.map(|(dst_x, dst_y, src_x, src_y)| (src_x, src_y, dst_x, dst_y)),
		)
	}
}

impl Descrambler for TileMap {
	fn descramble_into(
		&self, scrambled: &RgbaImage, restored: &mut RgbaImage,
	) -> Result<(), anyhow::Error> {
		for block in &self.moves {
			log::trace!("{block:?}");
			copy_block(
				scrambled,
				restored,
				(block.src_x, block.src_y),
				(block.dst_x, block.dst_y),
				(self.block_width, self.block_height),
			)?;
		}

		Ok(())
	}
}
