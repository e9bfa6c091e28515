pub mod capture_source;
pub mod engine_delegate;
