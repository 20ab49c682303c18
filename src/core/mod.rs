//! Record model, fixed-width codec, and tabular flattening.
//!
//! Everything here is format-agnostic: the interchange layouts live in
//! [`crate::txt`], the spreadsheet and JSON surfaces in their own modules.

mod codec;
mod columns;
mod error;
mod flatten;
mod schema;
mod types;

pub use codec::*;
pub use columns::*;
pub use error::*;
pub use flatten::*;
pub use schema::*;
pub use types::*;
