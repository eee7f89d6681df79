pub const BASE62: usize = 62;

/// `0-9`, then `a-z`, then `A-Z`: the digits packer emits for radix up to 62.
fn digit_value(ch: char) -> Option<usize> {
	match ch {
		'0'..='9' => Some(ch as usize - '0' as usize),
		'a'..='z' => Some(ch as usize - 'a' as usize + 10),
		'A'..='Z' => Some(ch as usize - 'A' as usize + 36),
		_ => None,
	}
}

/// Decodes a packer token in the given radix, most significant digit first.
///
/// Returns `None` for an unsupported radix, an empty token, a digit outside
/// the radix, or a value that does not fit in `usize`.
pub fn unbase(token: &str, radix: usize) -> Option<usize> {
	if !(2..=BASE62).contains(&radix) || token.is_empty() {
		return None;
	}

	token.chars().try_fold(0usize, |acc, ch| {
		let digit = digit_value(ch).filter(|&digit| digit < radix)?;
		acc.checked_mul(radix)?.checked_add(digit)
	})
}

pub fn unbase62(token: &str) -> Option<usize> {
	unbase(token, BASE62)
}
