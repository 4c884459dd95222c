//! REST Backend
//!
//! Repository over the back-office HTTP API.

mod client;
pub mod wire;

pub use client::{query_params, HttpRepository, LIST_PAGE_LIMIT};
pub use wire::WireRecord;
