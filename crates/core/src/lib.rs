//! Shared domain building blocks for the Janus authentication service.
//!
//! Contains the id/timestamp type aliases, the domain error taxonomy that
//! every flow maps onto, and the username/password policy validation.

pub mod error;
pub mod types;
pub mod validation;
