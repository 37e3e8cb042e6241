//! Boundary between the annotation subsystem and the viewer host: projection,
//! category display, per-frame draw output and pointer input.

pub mod category;
pub mod decorate;
pub mod pointer;
pub mod viewport;

pub use category::*;
pub use decorate::*;
pub use pointer::*;
pub use viewport::*;
