/// Forward-only scanner over a borrowed string.
///
/// Every read starts at the current position and, on success, moves the
/// position past whatever it consumed. A read whose delimiter is missing
/// returns `""` and leaves the position where it was.
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
	source: &'a str,
	position: usize,
}

impl<'a> Cursor<'a> {
	pub fn new(source: &'a str) -> Self {
		Self {
			source,
			position: 0,
		}
	}

	pub fn position(&self) -> usize {
		self.position
	}

	pub fn remaining(&self) -> &'a str {
		&self.source[self.position..]
	}

	fn find(&self, from: usize, needle: &str) -> Option<usize> {
		self.source[from..].find(needle).map(|offset| from + offset)
	}

	/// Moves past the next `delimiter`. Returns `false` if there is none.
	pub fn skip_over(&mut self, delimiter: &str) -> bool {
		match self.find(self.position, delimiter) {
			Some(index) => {
				self.position = index + delimiter.len();
				true
			}
			None => false,
		}
	}

	/// Text up to the next `delimiter`, then moves past the delimiter.
	pub fn substring_before(&mut self, delimiter: &str) -> &'a str {
		let start = self.position;
		match self.find(start, delimiter) {
			Some(end) => {
				self.position = end + delimiter.len();
				&self.source[start..end]
			}
			None => "",
		}
	}

	/// Text strictly between the next `left` and the first `right` after it,
	/// then moves past `right`.
	pub fn substring_between(&mut self, left: &str, right: &str) -> &'a str {
		let Some(left_index) = self.find(self.position, left) else {
			return "";
		};
		let start = left_index + left.len();
		match self.find(start, right) {
			Some(end) => {
				self.position = end + right.len();
				&self.source[start..end]
			}
			None => "",
		}
	}
}
