//! Process lifecycle: signal handling and graceful shutdown.

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
