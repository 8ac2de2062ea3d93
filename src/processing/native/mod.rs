//! Native image processing via the `image` crate.
//!
//! # Architecture
//!
//! - [`NativeConverter`]: decode, resize, encode for one request.
//! - [`avif`]: AVIF decoding, which the `image` crate lacks.
//! - [`resize`]: maps `ResizeOptions` modes to output dimensions.
//! - [`formats`]: maps `ImageProcessingOptions` to format-specific encoders.

mod avif;
mod executor;
mod formats;
mod resize;

pub use executor::NativeConverter;
pub use resize::target_dimensions;
