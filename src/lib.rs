//! Items API
//!
//! A small CRUD REST service over a single entity type. The router in
//! [`api`] is transport-neutral; [`server`] hosts it on hyper and, with the
//! `lambda` feature, [`lambda`] hosts it behind API Gateway.

pub mod api;
pub mod clock;
pub mod config;
pub mod http;
pub mod logger;
pub mod model;
pub mod server;
pub mod store;

#[cfg(feature = "lambda")]
pub mod lambda;
