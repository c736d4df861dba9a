//! Schema naming and reference forms

/// Prefix of every local schema reference
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Convert a service name to PascalCase (`general-ledger` -> `GeneralLedger`).
///
/// Splits on `-` only. Each segment gets an upper-case first character and
/// a lower-case remainder, so `bank-SYNC` becomes `BankSync`.
pub fn to_pascal_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    for segment in name.split('-') {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            result.extend(first.to_uppercase());
            result.extend(chars.flat_map(char::to_lowercase));
        }
    }
    result
}

/// Namespaced schema name for a service (`invoice` + `Invoice` -> `InvoiceInvoice`)
pub fn prefixed_name(service: &str, schema: &str) -> String {
    format!("{}{}", to_pascal_case(service), schema)
}

/// Local reference to a schema (`#/components/schemas/{name}`)
pub fn schema_ref(name: &str) -> String {
    format!("{}{}", SCHEMA_REF_PREFIX, name)
}

/// Schema name targeted by a local schema reference.
///
/// Returns `None` for anything that is not exactly
/// `#/components/schemas/{name}`: external files, other component kinds and
/// deeper JSON pointers are left alone.
pub fn ref_target(reference: &str) -> Option<&str> {
    let name = reference.strip_prefix(SCHEMA_REF_PREFIX)?;
    (!name.is_empty() && !name.contains('/')).then_some(name)
}

/// `accounting` -> `Accounting`, `human-resources` -> `Human Resources`
pub fn suite_title(system: &str) -> String {
    system
        .split(|c| c == '-' || c == '_' || c == ' ')
        .filter(|word| !word.is_empty())
        .map(to_pascal_case)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pascal_case() {
        assert_eq!(to_pascal_case("general-ledger"), "GeneralLedger");
        assert_eq!(to_pascal_case("invoice"), "Invoice");
        assert_eq!(to_pascal_case("my-svc"), "MySvc");
        assert_eq!(to_pascal_case("bank-SYNC"), "BankSync");
        assert_eq!(to_pascal_case("edi"), "Edi");
        assert_eq!(to_pascal_case("a--b"), "AB");
    }

    #[test]
    fn test_prefixed_name() {
        assert_eq!(prefixed_name("general-ledger", "Account"), "GeneralLedgerAccount");
        assert_eq!(prefixed_name("invoice", "Invoice"), "InvoiceInvoice");
    }

    #[test]
    fn test_ref_target() {
        assert_eq!(ref_target("#/components/schemas/Error"), Some("Error"));
        assert_eq!(ref_target("#/components/schemas/ErrorResponse"), Some("ErrorResponse"));
        assert_eq!(ref_target("#/components/parameters/Page"), None);
        assert_eq!(ref_target("other.yaml#/components/schemas/Error"), None);
        assert_eq!(ref_target("#/components/schemas/Error/properties/code"), None);
        assert_eq!(ref_target("#/components/schemas/"), None);
    }

    #[test]
    fn test_suite_title() {
        assert_eq!(suite_title("accounting"), "Accounting");
        assert_eq!(suite_title("human-resources"), "Human Resources");
    }
}
