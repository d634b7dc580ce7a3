//! Types shared between the memory match client and any service speaking its protocol.

pub mod models;
pub mod protocol;
