//! Reference resolution check
//!
//! After reconciliation every local schema reference in the aggregate must
//! name a key of `components.schemas`. References to other component kinds
//! and to external documents are out of scope and not checked.

use std::collections::HashSet;
use std::fmt;

use tracing::warn;

use crate::error::{GatewayError, Result};
use crate::merge::Aggregate;
use crate::naming::ref_target;
use crate::rewrite::collect_refs;
use crate::tree::Mapping;

/// A `$ref` with no matching schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    /// `paths./invoices`, `components.schemas.Foo`, ...
    pub location: String,
    pub reference: String,
}

impl fmt::Display for UnresolvedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.location, self.reference)
    }
}

/// Every unresolved local schema reference, in section then key order
pub fn unresolved_references(aggregate: &Aggregate) -> Vec<UnresolvedReference> {
    let known: HashSet<&str> = aggregate.schemas.keys().map(String::as_str).collect();
    let mut unresolved = Vec::new();

    let sections: [(&str, &Mapping); 3] = [
        ("paths", &aggregate.paths),
        ("components.parameters", &aggregate.parameters),
        ("components.schemas", &aggregate.schemas),
    ];
    for (section, entries) in sections {
        for (key, node) in entries {
            for reference in collect_refs(node) {
                let Some(target) = ref_target(reference) else {
                    continue;
                };
                if !known.contains(target) {
                    unresolved.push(UnresolvedReference {
                        location: format!("{}.{}", section, key),
                        reference: reference.to_string(),
                    });
                }
            }
        }
    }

    unresolved
}

/// Fail in strict mode, warn otherwise
pub fn check_references(aggregate: &Aggregate, strict: bool) -> Result<()> {
    let unresolved = unresolved_references(aggregate);
    if unresolved.is_empty() {
        return Ok(());
    }

    if strict {
        return Err(GatewayError::UnresolvedReferences {
            count: unresolved.len(),
            references: unresolved.iter().map(ToString::to_string).collect(),
        });
    }

    for entry in &unresolved {
        warn!(
            location = %entry.location,
            reference = %entry.reference,
            "unresolved schema reference"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping;
    use crate::naming::schema_ref;

    fn aggregate() -> Aggregate {
        let mut aggregate = Aggregate::new();
        aggregate.schemas = mapping! {
            "InvoiceInvoice" => mapping! { "type" => "object" },
            "InvoiceLine" => mapping! { "$ref" => schema_ref("Missing") },
        };
        aggregate.paths = mapping! {
            "/invoices" => mapping! {
                "get" => mapping! {
                    "ok" => mapping! { "$ref" => schema_ref("InvoiceInvoice") },
                    "param" => mapping! { "$ref" => "#/components/parameters/Page" },
                    "external" => mapping! { "$ref" => "common.yaml#/components/schemas/Money" },
                    "broken" => mapping! { "$ref" => schema_ref("Gone") },
                },
            },
        };
        aggregate
    }

    #[test]
    fn test_finds_unresolved_local_refs() {
        let unresolved = unresolved_references(&aggregate());
        let rendered: Vec<_> = unresolved.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "paths./invoices -> #/components/schemas/Gone",
                "components.schemas.InvoiceLine -> #/components/schemas/Missing",
            ]
        );
    }

    #[test]
    fn test_strict_mode_fails() {
        let err = check_references(&aggregate(), true).unwrap_err();
        match err {
            GatewayError::UnresolvedReferences { count, .. } => assert_eq!(count, 2),
            other => panic!("unexpected error: {other}"),
        }
        assert!(check_references(&aggregate(), false).is_ok());
    }

    #[test]
    fn test_clean_aggregate_passes() {
        let mut aggregate = aggregate();
        aggregate.paths.clear();
        aggregate.schemas.shift_remove("InvoiceLine");
        assert!(unresolved_references(&aggregate).is_empty());
        assert!(check_references(&aggregate, true).is_ok());
    }
}
