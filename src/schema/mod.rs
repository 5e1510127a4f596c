//! Backend record schema
//!
//! Wire records supplied by the capture backend, their validation, and the
//! adapter that turns them into domain types.

mod adapter;
mod records;

pub use adapter::*;
pub use records::*;
