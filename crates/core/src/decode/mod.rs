//! Decoders for the densely packed command payloads that ride inside
//! single script fields.

pub mod logon;
pub mod param;
