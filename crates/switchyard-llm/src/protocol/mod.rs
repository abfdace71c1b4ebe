//! Wire format types for upstream API dialects
//!
//! Each module contains pure serde structs matching one API's JSON format.
//! These types are only used at the boundary and never leak into the
//! canonical types.

pub mod anthropic;
pub mod chat;
pub mod responses;

use serde::{Deserialize, Deserializer};

/// Deserialize an explicit `null` the same way as a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
