//! Grayscale image buffers and the pixel-level primitives the matcher needs.

pub mod binary;
pub mod io;
pub mod label;
pub mod traits;
pub mod u8;

pub use self::binary::{BinaryPatch, BLACK, DEFAULT_THRESHOLD, WHITE};
pub use self::io::GrayImageU8;
pub use self::traits::{GrayStats, ImageView, Rows};
pub use self::u8::ImageU8;
