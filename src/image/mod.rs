pub mod decoder;
pub mod letterbox;

pub use decoder::{DecodedImage, ImageDecoder};
pub use letterbox::Letterbox;
