//! Image preparation pipeline.
//!
//! - **source**: read a local file or fetch a URL
//! - **decode**: detect the format and decode
//! - **normalize**: convert to RGB, downscale, re-encode as JPEG
//! - **processor**: runs the stages in order

pub mod decode;
pub mod normalize;
pub mod processor;
pub mod source;

pub use decode::{DecodedImage, ImageDecoder};
pub use normalize::Normalizer;
pub use processor::{ImagePreparer, PreparedImage};
pub use source::ImageLoader;
