use image::RgbaImage;

use super::{copy_block, Descrambler};

pub const GRID_SIZE: u32 = 16;

/// Parameters of the swap shuffle some readers generate their cell order
/// with: a linear congruential index that is swapped with each cell in turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapSeed {
	pub indexer: u32,
	pub key: u32,
	pub key_addition: u32,
	pub iterations: u32,
}

impl SwapSeed {
	pub fn new(indexer: u32, key: u32, key_addition: u32, iterations: u32) -> Self {
		Self {
			indexer,
			key,
			key_addition,
			iterations,
		}
	}

	pub fn permutation(&self, size: u32) -> Vec<u32> {
		let mut cells: Vec<u32> = (0..size).collect();
		if size == 0 {
			return cells;
		}

		let mut index = u64::from(self.indexer);
		for cell in 0..cells.len() {
			for _ in 0..self.iterations {
				index = (index * u64::from(self.key) + u64::from(self.key_addition)) % u64::from(size);
				cells.swap(index as usize, cell);
			}
		}
		cells
	}
}

/// A permutation of the cells of a `cols`×`rows` grid.
///
/// Cells are numbered row-major. Cell `i` of the scrambled image is drawn at
/// cell `permutation[i]` of the output. Unless set with
/// [`with_cell_size`](Self::with_cell_size), cell size is the image size
/// divided by the grid size, rounded down. Either way the rightmost and
/// bottom remainder pixels are never copied.
#[derive(Clone, Debug, PartialEq)]
pub struct GridPermutation {
	cols: u32,
	rows: u32,
	permutation: Vec<u32>,
	cell_size: Option<(u32, u32)>,
}

impl GridPermutation {
	pub fn new(cols: u32, rows: u32, permutation: Vec<u32>) -> Result<Self, anyhow::Error> {
		anyhow::ensure!(cols > 0 && rows > 0, "Grid must have at least one cell");
		let cells = cols as usize * rows as usize;
		anyhow::ensure!(
			permutation.len() == cells,
			"Expected {cells} cells for a {cols}x{rows} grid, got {}",
			permutation.len()
		);
		if let Some(bad) = permutation.iter().find(|&&cell| cell as usize >= cells) {
			anyhow::bail!("Cell {bad} is outside a {cols}x{rows} grid");
		}

		Ok(Self {
			cols,
			rows,
			permutation,
			cell_size: None,
		})
	}

	pub fn seeded(cols: u32, rows: u32, seed: &SwapSeed) -> Result<Self, anyhow::Error> {
		Self::new(cols, rows, seed.permutation(cols.saturating_mul(rows)))
	}

	/// Fixes the cell size in pixels instead of deriving it from the image.
	pub fn with_cell_size(mut self, width: u32, height: u32) -> Self {
		self.cell_size = Some((width, height));
		self
	}

	/// The common 16×16 layout; `permutation` must have 256 entries.
	pub fn fixed(permutation: Vec<u32>) -> Result<Self, anyhow::Error> {
		Self::new(GRID_SIZE, GRID_SIZE, permutation)
	}

	/// Builds the permutation from a key such as `"3a0a1a2"`. Empty entries
	/// count as cell 0.
	pub fn parse(cols: u32, rows: u32, key: &str, separator: &str) -> Result<Self, anyhow::Error> {
		let permutation = key
			.split(separator)
			.map(|entry| match entry.trim() {
				"" => Ok(0),
				entry => entry
					.parse()
					.map_err(|_| anyhow::anyhow!("Invalid cell index {entry:?}")),
			})
			.collect::<Result<Vec<u32>, _>>()?;

		Self::new(cols, rows, permutation)
	}

	/// The permutation that undoes this one.
	pub fn inverse(&self) -> Result<Self, anyhow::Error> {
		let mut inverse = vec![None; self.permutation.len()];
		for (index, &cell) in self.permutation.iter().enumerate() {
			let slot = &mut inverse[cell as usize];
			anyhow::ensure!(slot.is_none(), "Cell {cell} is targeted twice");
			*slot = Some(index as u32);
		}

		Ok(Self {
			cols: self.cols,
			rows: self.rows,
			permutation: inverse.into_iter().flatten().collect(),
			cell_size: self.cell_size,
		})
	}

	pub fn cols(&self) -> u32 {
		self.cols
	}

	pub fn rows(&self) -> u32 {
		self.rows
	}

	pub fn permutation(&self) -> &[u32] {
		&self.permutation
	}
}

impl Descrambler for GridPermutation {
	fn descramble_into(
		&self, scrambled: &RgbaImage, restored: &mut RgbaImage,
	) -> Result<(), anyhow::Error> {
		let (width, height) = scrambled.dimensions();
		let (cell_width, cell_height) = self
			.cell_size
			.unwrap_or((width / self.cols, height / self.rows));
		if cell_width == 0 || cell_height == 0 {
			log::debug!("{width}x{height} image is smaller than a {}x{} grid", self.cols, self.rows);
			return Ok(());
		}

		let cell_origin = |cell: u32| ((cell % self.cols) * cell_width, (cell / self.cols) * cell_height);
		for (from, &to) in self.permutation.iter().enumerate() {
			log::trace!("cell {from} -> {to}");
			copy_block(
				scrambled,
				restored,
				cell_origin(from as u32),
				cell_origin(to),
				(cell_width, cell_height),
			)?;
		}

		Ok(())
	}
}
