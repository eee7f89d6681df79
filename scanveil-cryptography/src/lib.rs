pub mod ciphers;
pub mod sources;
