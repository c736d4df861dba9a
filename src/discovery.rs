//! Service Discovery
//!
//! A suite lives at `{root}/{system}/`; each immediate subdirectory holding a
//! description document is one sub-service.
//!
//! ```text
//! openapi/
//! ├── accounting/
//! │   ├── README.md          (optional overview)
//! │   ├── openapi.yaml       (generated gateway document)
//! │   ├── invoice/
//! │   │   └── openapi.yaml
//! │   └── payment/
//! │       └── openapi.yaml
//! └── sales/
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::DiscoveryConfig;
use crate::error::{GatewayError, Result};

/// One discovered sub-service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// Directory name, e.g. `general-ledger`
    pub name: String,
    /// Path to the service's description document
    pub source_path: PathBuf,
    /// `{api_prefix}/{system}/{name}`
    pub mount_path: String,
}

/// Discovered services keyed and ordered by name
pub type Catalogue = BTreeMap<String, ServiceDescriptor>;

/// Discover the sub-services of `system` under `root`.
///
/// A missing suite directory yields an empty catalogue. Hidden directories,
/// a directory named after the suite itself, and directories without a
/// description document are skipped.
pub fn discover(root: &Path, system: &str, config: &DiscoveryConfig) -> Result<Catalogue> {
    validate_suite_name(system)?;

    let mut catalogue = Catalogue::new();
    let system_dir = root.join(system);
    if !system_dir.is_dir() {
        debug!(dir = %system_dir.display(), "suite directory not found");
        return Ok(catalogue);
    }

    for name in subdirectories(&system_dir)? {
        if name == system {
            continue;
        }

        let source_path = system_dir.join(&name).join(&config.document_name);
        if !source_path.is_file() {
            warn!(
                service = %name,
                expected = %source_path.display(),
                "description document not found, skipping"
            );
            continue;
        }

        let mount_path = mount_path(&config.api_prefix, system, &name);
        catalogue.insert(
            name.clone(),
            ServiceDescriptor {
                name,
                source_path,
                mount_path,
            },
        );
    }

    debug!(system, services = catalogue.len(), "discovered services");
    Ok(catalogue)
}

/// Suites under `root` that have at least one sub-service, sorted
pub fn discover_suites(root: &Path, config: &DiscoveryConfig) -> Result<Vec<String>> {
    if !root.is_dir() {
        warn!(root = %root.display(), "root directory not found");
        return Ok(Vec::new());
    }

    let mut suites = Vec::new();
    for name in subdirectories(root)? {
        if !discover(root, &name, config)?.is_empty() {
            suites.push(name);
        }
    }
    Ok(suites)
}

/// `/api/v1` + `accounting` + `invoice` -> `/api/v1/accounting/invoice`
pub fn mount_path(api_prefix: &str, system: &str, service: &str) -> String {
    format!("{}/{}/{}", api_prefix.trim_end_matches('/'), system, service)
}

/// Mount point of the suite itself
pub fn suite_mount_path(api_prefix: &str, system: &str) -> String {
    format!("{}/{}", api_prefix.trim_end_matches('/'), system)
}

/// Names of non-hidden immediate subdirectories, sorted
fn subdirectories(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.path().is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            warn!(path = %entry.path().display(), "skipping non UTF-8 directory name");
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        names.push(name.to_string());
    }
    Ok(names)
}

fn validate_suite_name(system: &str) -> Result<()> {
    let single_segment = !system.is_empty()
        && system != "."
        && system != ".."
        && !system.contains(['/', '\\']);
    if single_segment {
        Ok(())
    } else {
        Err(GatewayError::InvalidSuite(system.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn service(root: &Path, system: &str, name: &str, with_document: bool) {
        let dir = root.join(system).join(name);
        fs::create_dir_all(&dir).unwrap();
        if with_document {
            fs::write(dir.join("openapi.yaml"), "openapi: 3.1.0\n").unwrap();
        }
    }

    #[test]
    fn test_discovers_sorted_services() {
        let temp = TempDir::new().unwrap();
        for name in ["payment", "invoice", "general-ledger"] {
            service(temp.path(), "accounting", name, true);
        }

        let catalogue = discover(temp.path(), "accounting", &DiscoveryConfig::default()).unwrap();
        let names: Vec<_> = catalogue.keys().cloned().collect();
        assert_eq!(names, vec!["general-ledger", "invoice", "payment"]);

        let invoice = &catalogue["invoice"];
        assert_eq!(invoice.mount_path, "/api/v1/accounting/invoice");
        assert_eq!(invoice.source_path, temp.path().join("accounting/invoice/openapi.yaml"));
    }

    #[test]
    fn test_skips_hidden_self_named_and_undocumented() {
        let temp = TempDir::new().unwrap();
        service(temp.path(), "accounting", "invoice", true);
        service(temp.path(), "accounting", ".cache", true);
        service(temp.path(), "accounting", "accounting", true);
        service(temp.path(), "accounting", "drafts", false);
        fs::write(temp.path().join("accounting/openapi.yaml"), "openapi: 3.1.0\n").unwrap();

        let catalogue = discover(temp.path(), "accounting", &DiscoveryConfig::default()).unwrap();
        assert_eq!(catalogue.keys().collect::<Vec<_>>(), vec!["invoice"]);
    }

    #[test]
    fn test_missing_suite_is_empty() {
        let temp = TempDir::new().unwrap();
        let catalogue = discover(temp.path(), "nothing", &DiscoveryConfig::default()).unwrap();
        assert!(catalogue.is_empty());

        fs::write(temp.path().join("file"), "").unwrap();
        assert!(discover(temp.path(), "file", &DiscoveryConfig::default()).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_path_like_suite_names() {
        let temp = TempDir::new().unwrap();
        for bad in ["", "..", "a/b"] {
            let err = discover(temp.path(), bad, &DiscoveryConfig::default()).unwrap_err();
            assert!(matches!(err, GatewayError::InvalidSuite(_)));
        }
    }

    #[test]
    fn test_custom_document_name_and_prefix() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("sales/order");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("api.json"), "{}").unwrap();

        let config = DiscoveryConfig {
            document_name: "api.json".to_string(),
            api_prefix: "/v2/".to_string(),
        };
        let catalogue = discover(temp.path(), "sales", &config).unwrap();
        assert_eq!(catalogue["order"].mount_path, "/v2/sales/order");
    }

    #[test]
    fn test_discover_suites() {
        let temp = TempDir::new().unwrap();
        service(temp.path(), "sales", "order", true);
        service(temp.path(), "accounting", "invoice", true);
        service(temp.path(), "empty", "nothing", false);
        service(temp.path(), ".git", "objects", true);

        let suites = discover_suites(temp.path(), &DiscoveryConfig::default()).unwrap();
        assert_eq!(suites, vec!["accounting", "sales"]);
    }
}
