//! # foilsim API
//!
//! HTTP surface of the airfoil similarity service:
//!
//! - `POST /api/similarity-search` - rank reference airfoils against weighted targets
//! - `GET /api/health` - liveness probe

pub mod rest;

pub use rest::{routes, EngineState, RestApi};
