//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - A create DTO for inserts
//! - A `Serialize` response struct safe for external-facing output

pub mod session;
pub mod user;
