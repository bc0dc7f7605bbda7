//! # siteconf-protocol
//!
//! Action message types and codec.
//!
//! This crate defines the request parameters and the response envelope
//! exchanged with the config option actions, independent of transport.

pub mod codec;
pub mod messages;

pub use codec::*;
pub use messages::*;
