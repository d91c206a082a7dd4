//! The in-memory mirror of the served directory trees.
//!
//! - [`object`]: filesystem object nodes with scan and clean
//! - [`content`]: checksums and content-type detection
//! - [`cache`]: the content cache shared by monitors, listings and downloads
//! - [`monitor`]: periodic per-root resynchronisation
//! - [`registry`]: URL prefix to disk root mapping and web listings

pub mod cache;
pub mod content;
pub mod monitor;
pub mod object;
pub mod registry;

pub use cache::{CacheStats, ContentCache};
pub use monitor::{Monitor, MonitorError, MonitorState};
pub use object::FilesystemObject;
pub use registry::{normalize_prefix, Registry, WebObject};
