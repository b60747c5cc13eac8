//! Device link implementations.
//!
//! The real RPC transport lives outside this workspace; only the scripted
//! double is provided here.

pub mod mock;
