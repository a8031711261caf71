//! Shared response envelope types for API handlers.
//!
//! Admin-facing responses use a `{ "data": ... }` envelope; the client
//! update-check endpoint keeps its own `{ "update_info": ... }` shape for
//! wire compatibility with existing clients.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
