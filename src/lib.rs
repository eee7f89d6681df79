pub mod cursor;
pub mod descramble;
pub mod offload;
pub mod packer;

pub use cursor::Cursor;
pub use descramble::{
	Background, BlockMove, DescrambleOptions, Descrambler, GridPermutation, SectionGrid, SwapSeed,
	TileMap,
};
pub use packer::{detect, unpack, PackedScript};
pub use scanveil_cryptography::sources::initmanga::{
	decrypt_layered, decrypt_page, find_cipher_payload, CipherPayload, TierOutcome,
};
