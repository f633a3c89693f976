//! formcheck.frame.v1 input schema
//!
//! This module defines the per-frame record format read by the CLI and its
//! validation. It supports both whole-file batches and streamed records.

mod adapter;
mod frame_record;

pub use adapter::*;
pub use frame_record::*;
