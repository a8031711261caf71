//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for the mutations the catalog allows

pub mod deployment;
pub mod package;
