pub mod aes_cbc;
pub mod encoding;
