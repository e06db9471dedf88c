//! Library for browsing a project's GitHub releases from the terminal.
//!
//! This crate holds everything the `relnotes` TUI needs that is not the
//! interface itself: turning a user-supplied identifier into a repository
//! coordinate and talking to the external services.
//!
//! ## Core Types
//!
//! - [`RepoCoordinate`] - A canonical `owner/name` repository pair
//! - [`ReleaseSummary`] - One entry of a repository's release list
//! - [`ReleaseDetail`] - A single release with its markdown body
//!
//! ## Resolution
//!
//! - [`resolve`] - Identifier -> coordinate pipeline (coordinate shape first,
//!   npm registry lookup second)
//! - [`extract_coordinate`] - Pull a coordinate out of a repository or
//!   homepage URL
//!
//! ## Service Clients
//!
//! - [`RegistryClient`] - npm registry package metadata lookup
//! - [`GithubClient`] - GitHub releases list and detail queries

mod error;
mod github;
mod registry;
mod resolve;
mod types;

pub use error::{QueryError, RegistryError, ResolveError};
pub use github::{GithubClient, RELEASE_PAGE_SIZE};
pub use registry::{PackageMetadata, RegistryClient};
pub use resolve::{extract_coordinate, is_registry_name, resolve};
pub use types::{ReleaseDetail, ReleaseSummary, RepoCoordinate};
