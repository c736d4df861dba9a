//! Schema Namespacing
//!
//! Every schema a service defines is renamed to `{PascalService}{Name}` on
//! its way into the aggregate, and the references that service's own schemas
//! make to each other are repointed before they leave the service's scope.

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::merge::{Insertion, Precedence};
use crate::naming::prefixed_name;
use crate::rewrite::rewrite_targets;
use crate::tree::{Mapping, Node};

/// Original schema name -> namespaced name, for one service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Renames {
    names: IndexMap<String, String>,
}

impl Renames {
    /// Rename table for `schemas` defined by `service`
    pub fn for_service<'a>(service: &str, schemas: impl IntoIterator<Item = &'a String>) -> Self {
        let names = schemas
            .into_iter()
            .map(|name| (name.clone(), prefixed_name(service, name)))
            .collect();
        Self { names }
    }

    pub fn get(&self, original: &str) -> Option<&str> {
        self.names.get(original).map(String::as_str)
    }

    /// `(original, prefixed)` pairs in document order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Repoint every reference to an original name at its namespaced name
    pub fn apply(&self, node: &mut Node) -> usize {
        if self.is_empty() {
            return 0;
        }
        rewrite_targets(node, |name| self.get(name).map(str::to_string))
    }
}

/// Move a service's schemas into `target` under namespaced names.
///
/// Each schema body is rewritten against the service's full rename table
/// before insertion. Name clashes in `target` are settled by `precedence`.
pub fn namespace(
    service: &str,
    schemas: Mapping,
    target: &mut Mapping,
    precedence: Precedence,
) -> Renames {
    let renames = Renames::for_service(service, schemas.keys());

    for (original, mut body) in schemas {
        let rewritten = renames.apply(&mut body);
        let prefixed = prefixed_name(service, &original);
        debug!(service, schema = %original, prefixed = %prefixed, rewritten, "namespaced schema");

        match precedence.insert(target, prefixed.clone(), body) {
            Insertion::Inserted => {}
            Insertion::Replaced => {
                warn!(service, schema = %prefixed, "schema name collision, later definition kept")
            }
            Insertion::Kept => {
                warn!(service, schema = %prefixed, "schema name collision, earlier definition kept")
            }
        }
    }

    renames
}
