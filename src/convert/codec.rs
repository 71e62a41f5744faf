//! Binary codecs for composite field values

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::converter::ConvertError;

/// Encodes a composite value to bytes and back
pub trait Codec<T>: Send + Sync + 'static {
    fn encode(&self, value: &T) -> Result<Vec<u8>, ConvertError>;
    fn decode(&self, bytes: &[u8]) -> Result<T, ConvertError>;
}

/// JSON codec for any serde type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonCodec;

impl<T> Codec<T> for JsonCodec
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> Result<Vec<u8>, ConvertError> {
        serde_json::to_vec(value).map_err(|e| ConvertError::new(format!("encode failed: {}", e)))
    }

    fn decode(&self, bytes: &[u8]) -> Result<T, ConvertError> {
        serde_json::from_slice(bytes).map_err(|e| ConvertError::new(format!("decode failed: {}", e)))
    }
}
