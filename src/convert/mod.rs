//! Value conversion between storage primitives and domain values

mod codec;
mod converter;
mod primitive;
pub mod validation;

pub use codec::{Codec, JsonCodec};
pub use converter::{ConvertError, Converter, Overflow};
pub use primitive::{FixedWidth, Ordered, StoragePrimitive};
pub use validation::Rule;
