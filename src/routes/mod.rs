//! HTTP route handlers.
//!
//! - `download`: GET/HEAD/DELETE of files below one served root
//! - `fileinfo`: the `/fileinfo` listing
//! - `health`: liveness, metrics and version endpoints

pub mod download;
pub mod fileinfo;
pub mod health;
