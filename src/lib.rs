pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod pagination;
pub mod pipeline;
pub mod server;
pub mod services;
