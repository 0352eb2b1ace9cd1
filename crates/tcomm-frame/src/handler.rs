use crate::error::Result;

/// A protocol layer that can turn one inbound frame into a typed value.
///
/// Implemented by every handler so listeners can be registered against any
/// layer of the stack.
pub trait Decoder {
    type Output;

    fn decode(&self, data: &[u8]) -> Result<Self::Output>;
}
