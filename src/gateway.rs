//! Gateway generation
//!
//! Ties the passes together for one suite:
//! discovery -> load -> namespace/merge -> reconcile -> error convention ->
//! reference check -> assemble -> clobber.

use std::fs;
use std::path::{Path, PathBuf};

use similar::TextDiff;
use tracing::{debug, info, warn};

use crate::checksum::Checksum;
use crate::config::GatewayConfig;
use crate::convention::apply_error_convention;
use crate::discovery::{discover, discover_suites, Catalogue, ServiceDescriptor};
use crate::document::{assemble, render, serialize, suite_overview, OutputFormat};
use crate::error::Result;
use crate::loader::ServiceDocument;
use crate::merge::{merge_service, Aggregate};
use crate::reconcile::reconcile;
use crate::tree::Node;
use crate::validate::check_references;

/// A merged, not yet written, gateway document
#[derive(Debug, Clone)]
pub struct BuiltSuite {
    pub system: String,
    pub document: Node,
    /// Services that were merged, in processing order
    pub services: Vec<ServiceDescriptor>,
    pub path_count: usize,
    pub schema_count: usize,
}

/// Outcome of writing one gateway document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub system: String,
    pub output: PathBuf,
    pub services: Vec<String>,
    pub path_count: usize,
    pub schema_count: usize,
    pub checksum: Checksum,
}

/// Comparison of a committed gateway document against a fresh build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftReport {
    pub system: String,
    pub output: PathBuf,
    pub expected: Checksum,
    /// `None` when the output file does not exist
    pub actual: Option<Checksum>,
    /// Unified diff from the committed to the expected document
    pub diff: String,
}

impl DriftReport {
    pub fn is_current(&self) -> bool {
        self.actual.as_ref() == Some(&self.expected)
    }
}

/// Fold a catalogue into a finished aggregate.
///
/// Returns the aggregate together with the services actually merged; a
/// service whose document vanished since discovery is skipped.
pub fn merge_catalogue(
    catalogue: &Catalogue,
    config: &GatewayConfig,
) -> Result<(Aggregate, Vec<ServiceDescriptor>)> {
    let mut aggregate = Aggregate::for_policy(&config.merge);
    let mut merged = Vec::with_capacity(catalogue.len());

    for service in catalogue.values() {
        if !service.source_path.is_file() {
            warn!(
                service = %service.name,
                path = %service.source_path.display(),
                "description document not found, skipping"
            );
            continue;
        }

        debug!(service = %service.name, "processing service");
        let document = ServiceDocument::load(&service.source_path)?;
        merge_service(service, document, &mut aggregate, &config.merge);
        merged.push(service.clone());
    }

    reconcile(&mut aggregate);
    apply_error_convention(&mut aggregate);
    check_references(&aggregate, config.output.strict_references)?;

    Ok((aggregate, merged))
}

/// Gateway generator rooted at a directory of suites
pub struct Gateway {
    root: PathBuf,
    config: GatewayConfig,
}

impl Gateway {
    pub fn new(root: impl Into<PathBuf>, config: GatewayConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    /// Sub-services of `system`
    pub fn discover(&self, system: &str) -> Result<Catalogue> {
        discover(&self.root, system, &self.config.discovery)
    }

    /// `{root}/{system}/{output.file_name}`
    pub fn default_output(&self, system: &str) -> PathBuf {
        self.root.join(system).join(&self.config.output.file_name)
    }

    /// Merge `system` in memory. `None` when the suite has no services.
    pub fn build(&self, system: &str) -> Result<Option<BuiltSuite>> {
        let catalogue = self.discover(system)?;
        if catalogue.is_empty() {
            info!(system, "no sub-services found, nothing to generate");
            return Ok(None);
        }
        debug!(system, services = catalogue.len(), "discovered sub-services");

        let (aggregate, services) = merge_catalogue(&catalogue, &self.config)?;
        if services.is_empty() {
            info!(system, "no sub-service documents could be read, nothing to generate");
            return Ok(None);
        }

        let overview = self.overview(system)?;
        let path_count = aggregate.paths.len();
        let schema_count = aggregate.schemas.len();
        let document = assemble(system, &services, aggregate, overview.as_deref(), &self.config);

        Ok(Some(BuiltSuite {
            system: system.to_string(),
            document,
            services,
            path_count,
            schema_count,
        }))
    }

    /// Build `system` and clobber its gateway document.
    ///
    /// Nothing is written, or deleted, when the suite has no services or any
    /// step fails.
    pub fn generate(
        &self,
        system: &str,
        output: Option<&Path>,
    ) -> Result<Option<GenerationReport>> {
        let Some(built) = self.build(system)? else {
            return Ok(None);
        };
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.default_output(system));

        let checksum = serialize(&built.document, &output)?;

        info!(
            system,
            output = %output.display(),
            paths = built.path_count,
            schemas = built.schema_count,
            services = built.services.len(),
            checksum = checksum.short(),
            "generated gateway document"
        );

        Ok(Some(GenerationReport {
            system: built.system,
            output,
            services: built.services.into_iter().map(|s| s.name).collect(),
            path_count: built.path_count,
            schema_count: built.schema_count,
            checksum,
        }))
    }

    /// Compare the existing gateway document with a fresh build, writing
    /// nothing.
    pub fn check(&self, system: &str, output: Option<&Path>) -> Result<Option<DriftReport>> {
        let Some(built) = self.build(system)? else {
            return Ok(None);
        };
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.default_output(system));

        let expected_text = render(&built.document, OutputFormat::for_path(&output))?;
        let actual_text = if output.is_file() {
            Some(fs::read_to_string(&output)?)
        } else {
            None
        };

        let old = actual_text.as_deref().unwrap_or("");
        let label = output.display().to_string();
        let diff = TextDiff::from_lines(old, expected_text.as_str())
            .unified_diff()
            .context_radius(3)
            .header(&label, &format!("{} (regenerated)", label))
            .to_string();

        Ok(Some(DriftReport {
            system: built.system,
            output,
            expected: Checksum::of(&expected_text),
            actual: actual_text.as_deref().map(Checksum::of),
            diff,
        }))
    }

    /// Generate every suite under the root that has sub-services
    pub fn generate_all(&self) -> Result<Vec<GenerationReport>> {
        let suites = discover_suites(&self.root, &self.config.discovery)?;
        info!(suites = suites.len(), "found suites with sub-services");

        let mut reports = Vec::with_capacity(suites.len());
        for system in suites {
            if let Some(report) = self.generate(&system, None)? {
                reports.push(report);
            }
        }
        Ok(reports)
    }

    fn overview(&self, system: &str) -> Result<Option<String>> {
        let readme = self.root.join(system).join("README.md");
        if !readme.is_file() {
            return Ok(None);
        }
        Ok(suite_overview(&fs::read_to_string(readme)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const INVOICE: &str = r##"openapi: 3.1.0
tags:
  - name: Invoices
paths:
  /invoices:
    get:
      responses:
        "200":
          content:
            application/json:
              schema:
                $ref: "#/components/schemas/Invoice"
components:
  schemas:
    Invoice:
      type: object
"##;

    fn write_service(root: &Path, system: &str, service: &str, body: &str) {
        let dir = root.join(system).join(service);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("openapi.yaml"), body).unwrap();
    }

    #[test]
    fn test_default_output() {
        let gateway = Gateway::new("openapi", GatewayConfig::default());
        assert_eq!(
            gateway.default_output("accounting"),
            PathBuf::from("openapi/accounting/openapi.yaml")
        );
    }

    #[test]
    fn test_build_counts() {
        let temp = TempDir::new().unwrap();
        write_service(temp.path(), "accounting", "invoice", INVOICE);

        let gateway = Gateway::new(temp.path(), GatewayConfig::default());
        let built = gateway.build("accounting").unwrap().unwrap();

        assert_eq!(built.path_count, 1);
        // InvoiceInvoice plus the synthesized Error
        assert_eq!(built.schema_count, 2);
        assert_eq!(built.services.len(), 1);
    }

    #[test]
    fn test_vanished_document_is_skipped() {
        let temp = TempDir::new().unwrap();
        write_service(temp.path(), "accounting", "invoice", INVOICE);
        let config = GatewayConfig::default();

        let mut catalogue = discover(temp.path(), "accounting", &config.discovery).unwrap();
        catalogue.insert(
            "archive".to_string(),
            ServiceDescriptor {
                name: "archive".to_string(),
                source_path: temp.path().join("accounting/archive/openapi.yaml"),
                mount_path: "/api/v1/accounting/archive".to_string(),
            },
        );

        let (aggregate, merged) = merge_catalogue(&catalogue, &config).unwrap();
        let names: Vec<_> = merged.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["invoice"]);
        assert_eq!(aggregate.services, vec!["invoice"]);
        assert!(aggregate.schemas.contains_key("InvoiceInvoice"));
    }

    #[test]
    fn test_empty_suite_builds_nothing() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("accounting")).unwrap();

        let gateway = Gateway::new(temp.path(), GatewayConfig::default());
        assert!(gateway.build("accounting").unwrap().is_none());
        assert!(gateway.generate("accounting", None).unwrap().is_none());
        assert!(!gateway.default_output("accounting").exists());
    }

    #[test]
    fn test_check_detects_drift() {
        let temp = TempDir::new().unwrap();
        write_service(temp.path(), "accounting", "invoice", INVOICE);
        let gateway = Gateway::new(temp.path(), GatewayConfig::default());

        let missing = gateway.check("accounting", None).unwrap().unwrap();
        assert!(!missing.is_current());
        assert_eq!(missing.actual, None);

        let report = gateway.generate("accounting", None).unwrap().unwrap();
        let current = gateway.check("accounting", None).unwrap().unwrap();
        assert!(current.is_current());
        assert_eq!(current.expected, report.checksum);

        fs::write(&report.output, "openapi: 3.0.0\n").unwrap();
        let stale = gateway.check("accounting", None).unwrap().unwrap();
        assert!(!stale.is_current());
        assert!(stale.diff.contains("-openapi: 3.0.0"));
        assert_eq!(fs::read_to_string(&report.output).unwrap(), "openapi: 3.0.0\n");
    }
}
