//! Row-streaming query interface.
//!
//! A `RowSource` turns a declarative `Query` into a finite, single-pass stream
//! of `Row`s. Consumers drain the stream to collect results; stopping early is
//! legal but yields partial results.

pub mod error;
pub mod memory;
pub mod query;
pub mod row;
pub mod source;

pub use error::*;
pub use memory::*;
pub use query::*;
pub use row::*;
pub use source::*;
