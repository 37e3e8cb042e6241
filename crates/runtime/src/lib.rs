pub mod cancel;
pub mod event_bus;
pub mod frame;

pub use cancel::*;
pub use event_bus::*;
pub use frame::*;
