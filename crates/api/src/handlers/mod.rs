//! HTTP handlers. Thin by design: validate at the boundary, call into the
//! engine or a repository, shape the response.

pub mod releases;
pub mod report_status;
pub mod storage_audit;
pub mod update_check;
