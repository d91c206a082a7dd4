//! Crate-level tests, grouped by component.
//!
//! - **scanner_tests**: scan, clean and content cache behaviour on real temp trees
//! - **monitor_tests**: monitor lifecycle and periodic passes
//! - **registry_tests**: registry, web paths and both listing sources
//! - **api_tests**: HTTP routes through the full router
//! - **config_tests**: configuration defaults and validation
//! - **error_tests**: error taxonomy and HTTP mapping

pub mod error_tests;
pub mod registry_tests;
