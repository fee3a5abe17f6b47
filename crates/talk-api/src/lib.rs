//! talk-api: Talk backend contract and streaming reply decoder
//!
//! This crate provides the wire types shared with the talk backend, a trait
//! describing the backend operations, an HTTP implementation, an in-memory
//! implementation, and the decoder for newline-delimited reply snapshots.

pub mod backend;
pub mod error;
pub mod http;
pub mod memory;
pub mod stream;
pub mod types;

pub use backend::{Backend, ByteStream};
pub use error::{Error, Result};
pub use http::HttpBackend;
pub use memory::MemoryBackend;
pub use stream::{ReplyDecoder, ReplyStream, decode_stream};
pub use types::*;
