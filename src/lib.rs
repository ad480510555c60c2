pub mod bulk;
pub mod cache;
pub mod config;
pub mod error;
pub mod output;
pub mod rpc;
pub mod service;
pub mod sources;
pub mod types;
