//! Repository structs: all SQL lives here.

pub mod deployment_repo;
pub mod package_repo;

pub use deployment_repo::DeploymentRepo;
pub use package_repo::{PackageMetricsRepo, PackageRepo};
