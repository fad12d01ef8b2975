//! API Module
//!
//! HTTP handlers and routing for the dashboard page.
//!
//! # Endpoints
//! - `POST /dashboard/load` - Start a session (page mount)
//! - `POST /dashboard/refresh` - Invalidate keys and start a session
//! - `GET /dashboard` - Current view state
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
