pub mod cryptojs;
pub mod initmanga;
