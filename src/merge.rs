//! Path Merging
//!
//! The merge is a fold over the sorted service catalogue into an
//! [`Aggregate`]. Each collection kind has an explicit [`Precedence`] for
//! key collisions between services.

use std::collections::BTreeSet;

use indexmap::map::Entry;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::discovery::ServiceDescriptor;
use crate::loader::ServiceDocument;
use crate::mapping;
use crate::namespace::{namespace, Renames};
use crate::tree::{Mapping, Node};

/// Operation keys of a path item
pub const HTTP_METHODS: &[&str] = &[
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Provenance extension naming the implementing service
pub const X_SERVICE: &str = "x-service";

/// Provenance extension carrying the service mount path
pub const X_SERVICE_BASE_PATH: &str = "x-service-base-path";

/// Which entry survives when two services contribute the same key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Precedence {
    FirstWins,
    LastWins,
}

/// Result of a [`Precedence::insert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    Inserted,
    Replaced,
    Kept,
}

impl Precedence {
    pub fn insert(self, map: &mut Mapping, key: String, value: Node) -> Insertion {
        match map.entry(key) {
            Entry::Vacant(entry) => {
                entry.insert(value);
                Insertion::Inserted
            }
            Entry::Occupied(mut entry) => match self {
                Precedence::FirstWins => Insertion::Kept,
                Precedence::LastWins => {
                    entry.insert(value);
                    Insertion::Replaced
                }
            },
        }
    }
}

/// Which paths a service's schema renames are applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceScope {
    /// Only the paths the service itself contributes
    #[default]
    Service,
    /// Every path merged so far, from any service
    Aggregate,
}

/// Collision and rewrite policy for a merge run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergePolicy {
    #[serde(default = "default_last_wins")]
    pub paths: Precedence,

    #[serde(default = "default_last_wins")]
    pub schemas: Precedence,

    #[serde(default = "default_first_wins")]
    pub parameters: Precedence,

    #[serde(default)]
    pub reference_scope: ReferenceScope,

    /// Seed the `Page`, `Limit` and `Search` query parameters
    #[serde(default = "default_true")]
    pub default_parameters: bool,
}

fn default_last_wins() -> Precedence {
    Precedence::LastWins
}

fn default_first_wins() -> Precedence {
    Precedence::FirstWins
}

fn default_true() -> bool {
    true
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self {
            paths: Precedence::LastWins,
            schemas: Precedence::LastWins,
            parameters: Precedence::FirstWins,
            reference_scope: ReferenceScope::Service,
            default_parameters: true,
        }
    }
}

/// Accumulated state of a merge run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregate {
    /// path -> path item
    pub paths: Mapping,
    pub schemas: Mapping,
    /// Insertion order is kept through serialization
    pub parameters: Mapping,
    pub tags: BTreeSet<String>,
    /// Services merged so far, in processing order
    pub services: Vec<String>,
}

impl Aggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// An aggregate seeded according to `policy`
    pub fn for_policy(policy: &MergePolicy) -> Self {
        let mut aggregate = Self::new();
        if policy.default_parameters {
            aggregate.parameters = default_parameters();
        }
        aggregate
    }
}

/// Pagination and search query parameters every gateway document offers
pub fn default_parameters() -> Mapping {
    mapping! {
        "Page" => mapping! {
            "name" => "page",
            "in" => "query",
            "schema" => mapping! { "type" => "integer", "minimum" => 1i64, "default" => 1i64 },
        },
        "Limit" => mapping! {
            "name" => "limit",
            "in" => "query",
            "schema" => mapping! {
                "type" => "integer",
                "minimum" => 1i64,
                "maximum" => 100i64,
                "default" => 20i64,
            },
        },
        "Search" => mapping! {
            "name" => "search",
            "in" => "query",
            "schema" => mapping! { "type" => "string" },
        },
    }
}

/// Stamp `x-service` / `x-service-base-path` on every operation of a path
/// item that does not carry a provenance marker yet.
pub fn stamp_provenance(path_item: &mut Node, service: &ServiceDescriptor) {
    let Some(item) = path_item.as_mapping_mut() else {
        return;
    };
    for (method, operation) in item.iter_mut() {
        if !HTTP_METHODS.contains(&method.as_str()) {
            continue;
        }
        let Some(operation) = operation.as_mapping_mut() else {
            continue;
        };
        if operation.contains_key(X_SERVICE) {
            continue;
        }
        operation.insert(X_SERVICE.to_string(), Node::string(&service.name));
        operation.insert(X_SERVICE_BASE_PATH.to_string(), Node::string(&service.mount_path));
    }
}

/// Fold one service document into the aggregate.
///
/// Returns the schema renames the service produced.
pub fn merge_service(
    service: &ServiceDescriptor,
    document: ServiceDocument,
    aggregate: &mut Aggregate,
    policy: &MergePolicy,
) -> Renames {
    let ServiceDocument {
        tags,
        mut paths,
        schemas,
        parameters,
    } = document;

    aggregate.tags.extend(tags);

    for item in paths.values_mut() {
        stamp_provenance(item, service);
    }

    let renames = namespace(&service.name, schemas, &mut aggregate.schemas, policy.schemas);

    if policy.reference_scope == ReferenceScope::Service {
        for item in paths.values_mut() {
            renames.apply(item);
        }
    }

    let path_count = paths.len();
    for (path, item) in paths {
        match policy.paths.insert(&mut aggregate.paths, path.clone(), item) {
            Insertion::Inserted => {}
            Insertion::Replaced => {
                warn!(
                    service = %service.name,
                    path = %path,
                    "path already merged, replaced by later service"
                )
            }
            Insertion::Kept => {
                warn!(
                    service = %service.name,
                    path = %path,
                    "path already merged, later definition ignored"
                )
            }
        }
    }

    if policy.reference_scope == ReferenceScope::Aggregate {
        for item in aggregate.paths.values_mut() {
            renames.apply(item);
        }
    }

    for (name, mut parameter) in parameters {
        renames.apply(&mut parameter);
        match policy.parameters.insert(&mut aggregate.parameters, name.clone(), parameter) {
            Insertion::Inserted => {}
            Insertion::Replaced => {
                debug!(
                    service = %service.name,
                    parameter = %name,
                    "parameter replaced by later service"
                )
            }
            Insertion::Kept => {
                debug!(
                    service = %service.name,
                    parameter = %name,
                    "parameter already defined, keeping first"
                )
            }
        }
    }

    aggregate.services.push(service.name.clone());
    debug!(
        service = %service.name,
        paths = path_count,
        schemas = renames.len(),
        "merged service"
    );

    renames
}
