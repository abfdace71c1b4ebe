//! Conversions between canonical types and provider wire formats

pub mod anthropic;
pub mod chat;
pub mod responses;
