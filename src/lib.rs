pub mod cli;
pub mod client;
pub mod commands;
pub mod error;
pub mod http;
pub mod mime;
pub mod model;
pub mod oauth;
pub mod store;

mod macros;
