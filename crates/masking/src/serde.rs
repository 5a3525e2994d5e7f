//! Serde-related.

pub use serde::{de, Deserialize, Serialize, Serializer};

use crate::{Secret, Strategy};

/// Marker trait for secret types which can be [`Serialize`]d by serde.
///
/// A `Secret<S, I>` is serializable iff the wrapped type opts in through this
/// marker, which keeps "accidentally serialized the raw secret" a compile
/// error for types that never asked for it.
pub trait SerializableSecret: Serialize {}

impl SerializableSecret for serde_json::Value {}
impl SerializableSecret for String {}
impl SerializableSecret for u16 {}
impl SerializableSecret for Vec<u8> {}

impl<'a> SerializableSecret for &'a str {}

impl<'de, S, I> Deserialize<'de> for Secret<S, I>
where
    S: Deserialize<'de>,
    I: Strategy<S>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        S::deserialize(deserializer).map(Self::new)
    }
}

impl<S, I> Serialize for Secret<S, I>
where
    S: SerializableSecret + Serialize,
    I: Strategy<S>,
{
    fn serialize<T>(&self, serializer: T) -> Result<T::Ok, T::Error>
    where
        T: Serializer,
    {
        crate::PeekInterface::peek(self).serialize(serializer)
    }
}
