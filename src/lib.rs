//! Suite API Gateway Generator
//!
//! Merges the OpenAPI documents of a suite's sub-services into one gateway
//! document that fronts the whole suite.
//!
//! ## Features
//!
//! - **Discovery**: Sub-services are found on disk, no registration needed
//! - **Namespacing**: Component schemas are prefixed with their service name
//! - **Exact Rewriting**: `$ref` strings are only ever replaced whole
//! - **Shared Errors**: Every gateway exposes a single `Error` schema
//! - **Deterministic Output**: Identical inputs give byte-identical documents
//!
//! ## Layout
//!
//! ```text
//! openapi/
//! ├── accounting/
//! │   ├── README.md          # "## Overview" feeds the description
//! │   ├── openapi.yaml       # generated, never edited by hand
//! │   ├── invoice/
//! │   │   └── openapi.yaml
//! │   └── payment/
//! │       └── openapi.yaml
//! └── sales/
//!     └── ...
//! ```

pub mod checksum;
pub mod config;
pub mod convention;
pub mod discovery;
pub mod document;
pub mod error;
pub mod gateway;
pub mod loader;
pub mod merge;
pub mod namespace;
pub mod naming;
pub mod reconcile;
pub mod rewrite;
pub mod tree;
pub mod validate;

pub use checksum::Checksum;
pub use config::{DiscoveryConfig, GatewayConfig, OutputConfig, SecurityConfig};
pub use discovery::{discover, Catalogue, ServiceDescriptor};
pub use document::OutputFormat;
pub use error::{GatewayError, Result};
pub use gateway::{BuiltSuite, DriftReport, Gateway, GenerationReport};
pub use loader::ServiceDocument;
pub use merge::{Aggregate, MergePolicy, Precedence, ReferenceScope};
pub use namespace::Renames;
pub use tree::{Mapping, Node, Scalar};
