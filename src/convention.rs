//! Shared `Error` schema convention
//!
//! Every gateway document exposes a schema literally named `Error`. When a
//! service brings its own error schema, the first one in service order is
//! elected and the generic name becomes an alias for it. Otherwise a generic
//! error object is synthesized.

use tracing::debug;

use crate::mapping;
use crate::merge::Aggregate;
use crate::naming::{prefixed_name, schema_ref};
use crate::rewrite::rewrite;
use crate::tree::Node;

/// Name of the shared error schema
pub const ERROR_SCHEMA: &str = "Error";

/// `{error, message}` required, free-form `details` optional
pub fn generic_error_schema() -> Node {
    Node::from(mapping! {
        "type" => "object",
        "required" => vec![Node::from("error"), Node::from("message")],
        "properties" => mapping! {
            "error" => mapping! {
                "type" => "string",
                "description" => "Error code",
            },
            "message" => mapping! {
                "type" => "string",
                "description" => "Human-readable error message",
            },
            "details" => mapping! {
                "type" => "object",
                "nullable" => true,
                "description" => "Additional error details",
                "additionalProperties" => true,
            },
        },
    })
}

/// Apply the convention; returns the elected namespaced schema, if any.
pub fn apply_error_convention(aggregate: &mut Aggregate) -> Option<String> {
    let mut services: Vec<&String> = aggregate.services.iter().collect();
    services.sort();

    let elected = services
        .into_iter()
        .map(|service| prefixed_name(service, ERROR_SCHEMA))
        .find(|candidate| aggregate.schemas.contains_key(candidate));

    match &elected {
        Some(elected) => {
            let mut rewritten = 0;
            for item in aggregate.paths.values_mut() {
                rewritten += rewrite(item, ERROR_SCHEMA, elected);
            }
            for parameter in aggregate.parameters.values_mut() {
                rewritten += rewrite(parameter, ERROR_SCHEMA, elected);
            }
            aggregate.schemas.insert(
                ERROR_SCHEMA.to_string(),
                Node::from(mapping! { "$ref" => schema_ref(elected) }),
            );
            debug!(elected = %elected, rewritten, "elected shared error schema");
        }
        None => {
            if !aggregate.schemas.contains_key(ERROR_SCHEMA) {
                aggregate
                    .schemas
                    .insert(ERROR_SCHEMA.to_string(), generic_error_schema());
                debug!("synthesized generic error schema");
            }
        }
    }

    elected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::collect_refs;

    fn path_referencing(name: &str) -> Node {
        Node::from(mapping! {
            "get" => mapping! {
                "responses" => mapping! {
                    "default" => mapping! { "$ref" => schema_ref(name) },
                },
            },
        })
    }

    #[test]
    fn test_synthesizes_when_no_service_error() {
        let mut aggregate = Aggregate::new();
        aggregate.services = vec!["invoice".to_string()];
        aggregate.schemas = mapping! { "InvoiceInvoice" => mapping! { "type" => "object" } };

        assert_eq!(apply_error_convention(&mut aggregate), None);
        assert_eq!(aggregate.schemas[ERROR_SCHEMA], generic_error_schema());
    }

    #[test]
    fn test_elects_first_service_error() {
        let mut aggregate = Aggregate::new();
        aggregate.services = vec!["b".to_string(), "a".to_string()];
        aggregate.schemas = mapping! {
            "BError" => mapping! { "type" => "object" },
            "AError" => mapping! { "type" => "object" },
        };
        aggregate.paths = mapping! {
            "/x" => path_referencing("Error"),
            "/y" => path_referencing("ErrorResponse"),
        };

        assert_eq!(apply_error_convention(&mut aggregate).as_deref(), Some("AError"));
        assert_eq!(
            aggregate.schemas[ERROR_SCHEMA],
            Node::from(mapping! { "$ref" => schema_ref("AError") })
        );
        assert!(aggregate.schemas.contains_key("BError"));
        assert_eq!(collect_refs(&aggregate.paths["/x"]), vec!["#/components/schemas/AError"]);
        assert_eq!(
            collect_refs(&aggregate.paths["/y"]),
            vec!["#/components/schemas/ErrorResponse"]
        );
    }

    #[test]
    fn test_generic_error_shape() {
        let error = generic_error_schema();
        let required: Vec<_> = error
            .get("required")
            .and_then(Node::as_sequence)
            .unwrap()
            .iter()
            .filter_map(Node::as_str)
            .collect();
        assert_eq!(required, vec!["error", "message"]);
        assert!(error.get("properties").unwrap().get("details").is_some());
    }
}
