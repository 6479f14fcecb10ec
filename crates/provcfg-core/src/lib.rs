//! # provcfg-core: Foundational Types for Provider Configuration
//!
//! Shared vocabulary for the provider configuration workspace. Every other
//! crate depends on `provcfg-core`; it depends on nothing internal.
//!
//! ## Contents
//!
//! - [`DocumentPath`]: JSON-pointer style location of a node inside a
//!   configuration document. Every validation failure carries one.
//! - [`FailureKind`] / [`ValidationFailure`]: the failure taxonomy the
//!   validation engine reports to callers.
//! - [`SchemaVersion`]: `<major>.<minor>` version identifiers.
//! - [`Identification`] and [`is_uuid_like`]: the provider identity choice
//!   and the permissive UUID shape check the host platform uses.
//! - [`ConfigDocument`]: the typed provider document model handed to
//!   downstream consumers once a document has been validated.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `provcfg-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod model;
pub mod path;
pub mod version;

pub use error::{CoreError, FailureKind, ValidationFailure};
pub use identity::{is_uuid_like, normalize_uuid_like, Identification};
pub use model::{ConfigDocument, InventoryRecord, Meta, ProviderEntry};
pub use path::{DocumentPath, PathSegment};
pub use version::SchemaVersion;
