mod unbaser;

use std::sync::LazyLock;

use regex::{Captures, Regex, RegexBuilder};

use crate::cursor::Cursor;

pub use unbaser::{unbase, unbase62, BASE62};

const PAYLOAD_START: &str = "}('";
const PAYLOAD_END: &str = ".split('|'),0,{}))";
const DATA_END: &str = "',";

static PACKED_HEADER: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"eval\s*\(\s*function\s*\(\s*p\s*,\s*a\s*,\s*c\s*,\s*k\s*,\s*e\s*,").unwrap()
});

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9A-Za-z_]+").unwrap());

static HARNESS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
	[
		RegexBuilder::new(r"}\('(.*)', *(\d+|\[\]), *(\d+), *'(.*)'\.split\('\|'\), *(\d+), *(.*)\)\)")
			.dot_matches_new_line(true)
			.build()
			.unwrap(),
		RegexBuilder::new(r"}\('(.*)', *(\d+|\[\]), *(\d+), *'(.*)'\.split\('\|'\)")
			.dot_matches_new_line(true)
			.build()
			.unwrap(),
	]
});

/// Whether `source` contains a packer `eval(function(p,a,c,k,e,` header.
pub fn detect(source: &str) -> bool {
	PACKED_HEADER.is_match(source)
}

fn substitute(data: &str, dictionary: &[&str], radix: usize) -> String {
	WORD.replace_all(data, |caps: &Captures| {
		let token = &caps[0];
		match unbase(token, radix) {
			Some(index) if index < dictionary.len() && !dictionary[index].is_empty() => {
				log::trace!("{token} -> {}", dictionary[index]);
				dictionary[index].to_string()
			}
			_ => token.to_string(),
		}
	})
	.into_owned()
}

/// Unpacks with base-62 tokens. With `bounds`, only the text between the two
/// delimiters inside the payload is unpacked. Returns `""` if there is nothing
/// to unpack.
pub fn unpack(script: &str, bounds: Option<(&str, &str)>) -> String {
	let blob = Cursor::new(script)
		.substring_between(PAYLOAD_START, PAYLOAD_END)
		.replace(r"\'", "\"");

	let mut cursor = Cursor::new(&blob);
	let data = match bounds {
		Some((left, right)) => {
			let data = cursor.substring_between(left, right);
			cursor.skip_over(DATA_END);
			data
		}
		None => cursor.substring_before(DATA_END),
	};
	if data.is_empty() {
		log::debug!("No packed data found");
		return String::new();
	}

	let dictionary: Vec<&str> = cursor.substring_between("'", "'").split('|').collect();
	substitute(data, &dictionary, BASE62)
}

/// The arguments of a packer call.
#[derive(Clone, Debug, PartialEq)]
pub struct PackedScript {
	/// `p`, still JS-escaped.
	pub payload: String,
	/// `a`. `[]` in the source means 62.
	pub radix: usize,
	/// `c`, as declared. Not necessarily the dictionary length.
	pub count: usize,
	/// `k`.
	pub dictionary: Vec<String>,
}

impl PackedScript {
	pub fn parse(source: &str) -> Option<Self> {
		for harness in HARNESS.iter() {
			let Some(args) = harness.captures(source) else {
				continue;
			};

			let radix = match &args[2] {
				"[]" => BASE62,
				radix => radix.parse().ok()?,
			};
			let count = args[3].parse().ok()?;
			if count != args[4].split('|').count() {
				log::debug!("Packer declares {count} words but ships {}", args[4].split('|').count());
			}

			return Some(Self {
				payload: args[1].to_string(),
				radix,
				count,
				dictionary: args[4].split('|').map(String::from).collect(),
			});
		}
		None
	}

	/// Substitutes tokens in the script's own radix, after undoing the JS
	/// string escapes of the payload.
	pub fn unpack(&self) -> String {
		let payload = self.payload.replace(r"\\", r"\").replace(r"\'", "'");
		let dictionary: Vec<&str> = self.dictionary.iter().map(String::as_str).collect();
		substitute(&payload, &dictionary, self.radix)
	}
}
