//! # Fan push server
//! This crate hosts the HTTP server for the fan push engine. It is responsible for:
//! Loading the pending orders into the push schedule before accepting any requests.
//! Translating the `/getfollowers` query-string API into calls on the engine.
//! Mapping engine errors onto HTTP status codes and JSON error bodies.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/getfollowers/coins`: Credit coins to a user.
//! * `/getfollowers/buyfollower`: Spend coins on an order for fans.
//! * `/getfollowers/getuser`: Push. Advance the next due orders by one fan each.
//! * `/getfollowers/info` and `/getfollowers/progress`: Read-only views of a user and their orders.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod routes;
pub mod server;
