// Core types shared by every engine
pub mod error;
pub mod observer;

// Re-exports for convenience
pub use error::{Error, Result};
pub use observer::{default_observer, LogObserver, MemoryObserver, NullObserver, Observer};
