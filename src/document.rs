//! Gateway document assembly and serialization
//!
//! The output is a derived artifact: it is rebuilt from scratch on every
//! run, its top-level collections are put in canonical order, and the
//! previous file is removed before the new one is written.

use std::fs;
use std::path::Path;

use regex::Regex;

use crate::checksum::Checksum;
use crate::config::GatewayConfig;
use crate::discovery::{suite_mount_path, ServiceDescriptor};
use crate::error::{GatewayError, Result};
use crate::mapping;
use crate::merge::Aggregate;
use crate::naming::{suite_title, to_pascal_case};
use crate::tree::{Mapping, Node};

/// Rendering format, chosen from the output file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Yaml,
    Json,
}

impl OutputFormat {
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => OutputFormat::Json,
            _ => OutputFormat::Yaml,
        }
    }
}

/// Build the gateway document for `system` from a finished aggregate.
///
/// `services` are the merged services, used for the routing table in the
/// description. Tags, paths and schemas are sorted; parameters keep their
/// insertion order.
pub fn assemble(
    system: &str,
    services: &[ServiceDescriptor],
    mut aggregate: Aggregate,
    overview: Option<&str>,
    config: &GatewayConfig,
) -> Node {
    let title = suite_title(system);
    let suite_mount = suite_mount_path(&config.discovery.api_prefix, system);

    aggregate.paths.sort_keys();
    aggregate.schemas.sort_keys();

    let tags: Vec<Node> = aggregate
        .tags
        .iter()
        .map(|tag| Node::from(mapping! { "name" => tag.as_str() }))
        .collect();

    let mut components = Mapping::new();
    if let Some(security) = &config.security {
        let description = security.description.clone().unwrap_or_else(|| {
            format!(
                "API key for authenticating requests to the {} gateway. \
                 It is forwarded to the implementing service.",
                title
            )
        });
        components.insert(
            "securitySchemes".to_string(),
            Node::from(mapping! {
                security.scheme_name.as_str() => mapping! {
                    "type" => "apiKey",
                    "in" => "header",
                    "name" => security.header.as_str(),
                    "description" => description,
                },
            }),
        );
    }
    components.insert("parameters".to_string(), Node::from(aggregate.parameters));
    components.insert("schemas".to_string(), Node::from(aggregate.schemas));

    let mut document = mapping! {
        "openapi" => config.output.openapi_version.as_str(),
        "info" => mapping! {
            "title" => format!("{} API Gateway", title),
            "description" => describe(system, &title, services, overview),
            "version" => config.output.info_version.as_str(),
        },
        "servers" => vec![Node::from(mapping! {
            "url" => suite_mount,
            "description" => format!("{} API Gateway", title),
        })],
        "tags" => tags,
        "paths" => aggregate.paths,
        "components" => components,
    };

    if let Some(security) = &config.security {
        document.insert(
            "security".to_string(),
            Node::from(vec![Node::from(mapping! {
                security.scheme_name.as_str() => Vec::<Node>::new(),
            })]),
        );
    }

    Node::from(document)
}

fn describe(
    system: &str,
    title: &str,
    services: &[ServiceDescriptor],
    overview: Option<&str>,
) -> String {
    let lead = overview
        .map(|line| line.trim_end_matches('.').to_string())
        .unwrap_or_else(|| format!("System-level API gateway for all {} services", title));

    let mut routes: Vec<String> = services
        .iter()
        .map(|service| {
            format!(
                "- `{}/*` → {} Service",
                service.mount_path,
                to_pascal_case(&service.name)
            )
        })
        .collect();
    routes.sort();

    format!(
        "{lead}. This aggregates and proxies requests to {title} microservices. \
         This is the single entry point for the {title} system.\n\n\
         All requests are proxied to the appropriate sub-service:\n{routes}\n\n\
         **Note**: This document is generated from the sub-service documents. \
         Do not edit manually - changes will be overwritten on next generation.\n\n\
         **Generation**: This file is completely regenerated (clobbered) each time \
         the generator runs, ensuring idempotent output.\n\n\
         **Service Discovery**: Sub-services are discovered from the {system}/ directory.",
        routes = routes.join("\n"),
    )
}

/// First content line of the `## Overview` section of a suite README
pub fn suite_overview(readme: &str) -> Option<String> {
    let heading = Regex::new(r"(?m)^##[ \t]+Overview[ \t]*$").ok()?;
    let next_heading = Regex::new(r"(?m)^##").ok()?;

    let start = heading.find(readme)?.end();
    let rest = &readme[start..];
    let section = match next_heading.find(rest) {
        Some(found) => &rest[..found.start()],
        None => rest,
    };

    section
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
}

/// Render a document in the given format
pub fn render(document: &Node, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => {
            serde_yaml_ng::to_string(document).map_err(|e| GatewayError::Render(e.to_string()))
        }
        OutputFormat::Json => serde_json::to_string_pretty(document)
            .map(|mut text| {
                text.push('\n');
                text
            })
            .map_err(|e| GatewayError::Render(e.to_string())),
    }
}

/// Remove `path` if it exists, then write `contents` to it
pub fn clobber(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    if path.exists() {
        fs::remove_file(path)?;
    }
    fs::write(path, contents)?;
    Ok(())
}

/// Render `document` for `output_path` and clobber it there
pub fn serialize(document: &Node, output_path: &Path) -> Result<Checksum> {
    let text = render(document, OutputFormat::for_path(output_path))?;
    clobber(output_path, &text)?;
    Ok(Checksum::of(&text))
}
