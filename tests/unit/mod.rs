//! Unit tests for individual components

mod config_test;
mod error_test;
mod request_test;
mod sinks_test;
mod util_test;
