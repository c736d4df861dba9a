//! Cross-Reference Reconciliation
//!
//! Second pass over the namespaced schemas. Any reference that still points
//! at a name missing from the aggregate is looked up by its unprefixed tail
//! and repointed at the first namespaced candidate that exists.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::merge::Aggregate;
use crate::naming::to_pascal_case;
use crate::rewrite::rewrite_targets;

/// Unprefixed schema name -> namespaced candidates, in sorted order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameMapping {
    candidates: BTreeMap<String, Vec<String>>,
}

impl NameMapping {
    /// Index `schema_names` against every service prefix.
    ///
    /// A namespaced name is recorded under each prefix it starts with, so a
    /// tail can map to several candidates.
    pub fn build<'a>(
        schema_names: impl IntoIterator<Item = &'a str>,
        services: &[String],
    ) -> Self {
        let mut names: Vec<&str> = schema_names.into_iter().collect();
        names.sort_unstable();

        let mut prefixes: Vec<String> = services.iter().map(|s| to_pascal_case(s)).collect();
        prefixes.sort();
        prefixes.dedup();

        let mut candidates: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for name in names {
            for prefix in &prefixes {
                let Some(tail) = name.strip_prefix(prefix.as_str()) else {
                    continue;
                };
                if tail.is_empty() {
                    continue;
                }
                candidates
                    .entry(tail.to_string())
                    .or_default()
                    .push(name.to_string());
            }
        }

        Self { candidates }
    }

    pub fn candidates(&self, unprefixed: &str) -> &[String] {
        self.candidates
            .get(unprefixed)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Repair dangling references inside aggregate schema bodies.
///
/// Returns the number of references rewritten. Running it again changes
/// nothing.
pub fn reconcile(aggregate: &mut Aggregate) -> usize {
    let mapping = NameMapping::build(
        aggregate.schemas.keys().map(String::as_str),
        &aggregate.services,
    );
    let existing: HashSet<String> = aggregate.schemas.keys().cloned().collect();

    let mut names: Vec<String> = aggregate.schemas.keys().cloned().collect();
    names.sort();

    let mut repaired = 0;
    for name in names {
        let Some(body) = aggregate.schemas.get_mut(&name) else {
            continue;
        };
        repaired += rewrite_targets(body, |target| {
            if existing.contains(target) {
                return None;
            }
            mapping
                .candidates(target)
                .iter()
                .find(|candidate| existing.contains(*candidate))
                .cloned()
        });
    }

    debug!(tails = mapping.len(), repaired, "reconciled schema references");
    repaired
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping;
    use crate::naming::schema_ref;
    use crate::rewrite::collect_refs;
    use crate::tree::Node;

    fn aggregate() -> Aggregate {
        let mut aggregate = Aggregate::new();
        aggregate.services = vec!["a".to_string(), "general-ledger".to_string()];
        aggregate.schemas = mapping! {
            "GeneralLedgerEntry" => mapping! {
                "properties" => mapping! {
                    "account" => mapping! { "$ref" => schema_ref("Account") },
                    "self" => mapping! { "$ref" => schema_ref("GeneralLedgerEntry") },
                    "external" => mapping! { "$ref" => "shared.yaml#/Money" },
                    "unknown" => mapping! { "$ref" => schema_ref("Nowhere") },
                },
            },
            "GeneralLedgerAccount" => mapping! { "type" => "object" },
            "AThing" => mapping! { "$ref" => schema_ref("Thing") },
        };
        aggregate
    }

    #[test]
    fn test_name_mapping() {
        let names = ["GeneralLedgerAccount", "AThing", "AAccount"];
        let services = vec!["general-ledger".to_string(), "a".to_string()];
        let mapping = NameMapping::build(names, &services);

        assert_eq!(mapping.candidates("Account"), ["AAccount", "GeneralLedgerAccount"]);
        assert_eq!(mapping.candidates("Thing"), ["AThing"]);
        assert!(mapping.candidates("Missing").is_empty());
    }

    #[test]
    fn test_repairs_dangling_refs() {
        let mut aggregate = aggregate();
        let repaired = reconcile(&mut aggregate);
        assert_eq!(repaired, 2);

        assert_eq!(
            collect_refs(&aggregate.schemas["GeneralLedgerEntry"]),
            vec![
                "#/components/schemas/GeneralLedgerAccount",
                "#/components/schemas/GeneralLedgerEntry",
                "shared.yaml#/Money",
                "#/components/schemas/Nowhere",
            ]
        );
        assert_eq!(
            aggregate.schemas["AThing"],
            Node::from(mapping! { "$ref" => schema_ref("AThing") })
        );
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut aggregate = aggregate();
        reconcile(&mut aggregate);
        let once = aggregate.clone();
        assert_eq!(reconcile(&mut aggregate), 0);
        assert_eq!(aggregate, once);
    }
}
