//! Byte-level reading shared by every format decoder

pub mod cursor;
mod geometry;
pub mod text;

pub use cursor::ByteCursor;
pub use text::decode_euc_kr;
