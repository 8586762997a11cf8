//! Evaluation backend client.

pub mod backend;

pub use backend::BackendClient;
