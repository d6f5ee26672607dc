pub mod format;
pub mod serde;
