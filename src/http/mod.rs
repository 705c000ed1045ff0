//! HTTP server module
//!
//! This module handles HTTP request routing and handling:
//! - Axum router with the subtitle endpoint
//! - Mapping of extraction errors to status codes and safe messages
//! - Concurrency cap on running extractions
//! - CORS middleware

pub mod handlers;
pub mod routes;

pub use routes::create_router;
