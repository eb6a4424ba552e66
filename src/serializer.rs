//! Rendering of the documented endpoint list.
//!
//! The Markdown renderer writes a single human-readable page: a summary with
//! anchor links followed by one section per endpoint. JSON and YAML simply
//! serialize the descriptor list for downstream tooling.

use crate::endpoint_builder::EndpointDescriptor;
use crate::structure::{NodeKind, StructuralNode};
use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Default prefix of the source links in the Markdown footer
pub const DEFAULT_BASE_URL: &str = "/blob/master";

const INDENT: &str = "    ";

/// `Demo Names GET /a` → `demo-names-get-/a`
pub fn linkify_title(title: &str) -> String {
    title
        .trim()
        .replace(' ', "-")
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '?' | '!' | ',' | ';' | ':' | '.'))
        .collect()
}

/// One rendered line (possibly multi-line) per structural node.
///
/// Lists render as `[{..}, ...]` or `[Type, ...]`, objects as `{..}`, scalars
/// as their type. Every node but the last of its siblings gets a trailing comma.
pub fn format_node(node: &StructuralNode) -> String {
    let prefix = INDENT.repeat(node.depth + 1);
    let mut out = format!("{}{}: ", prefix, node.name);

    match (node.kind, &node.children) {
        (NodeKind::List, Some(children)) => {
            out.push_str("[{\n");
            out.push_str(&format_children(children));
            out.push('\n');
            out.push_str(&prefix);
            out.push_str("}, ...]");
        }
        (NodeKind::List, None) => {
            out.push('[');
            out.push_str(&node.resolved_type);
            out.push_str(", ...]");
        }
        (NodeKind::Object, Some(children)) => {
            out.push_str("{\n");
            out.push_str(&format_children(children));
            out.push('\n');
            out.push_str(&prefix);
            out.push('}');
        }
        // depth-capped objects and scalars
        _ => out.push_str(&node.resolved_type),
    }

    if !node.is_last {
        out.push(',');
    }
    out
}

fn format_children(children: &[StructuralNode]) -> String {
    children
        .iter()
        .map(format_node)
        .collect::<Vec<_>>()
        .join("\n")
}

fn summary_title(endpoint: &EndpointDescriptor) -> String {
    format!(
        "{} {} {}",
        endpoint.names,
        endpoint.verbs_string(),
        endpoint.paths_string()
    )
}

fn body_block(out: &mut String, label: &str, media: &str, nodes: &[StructuralNode]) {
    out.push_str("```javascript\n");
    out.push_str(label);
    if !media.trim().is_empty() {
        out.push('"');
        out.push_str(media);
        out.push_str("\" ");
    }
    out.push_str("{\n");
    for node in nodes {
        out.push_str(&format_node(node));
        out.push('\n');
    }
    out.push_str("}\n```\n\n");
}

fn write_endpoint(out: &mut String, endpoint: &EndpointDescriptor, base_url: &str) {
    out.push_str("\n\n## ");
    if !endpoint.names.is_empty() {
        out.push_str(&endpoint.names);
        out.push('\n');
    }
    out.push_str(&format!(
        "**{}** {}\n\n",
        endpoint.verbs_string(),
        endpoint.paths_string()
    ));

    if endpoint.comments.is_empty() {
        out.push_str(&endpoint.method_name);
        out.push_str("\n\n");
    }
    for comment in &endpoint.comments {
        out.push_str(comment);
        out.push_str("\n\n");
    }

    if !endpoint.path_variables.is_empty() {
        out.push_str("Parameters:\n");
        for variable in &endpoint.path_variables {
            out.push_str(&format!(" - **{}** {}", variable.name, variable.type_name()));
            if let Some(default) = &variable.default_value {
                out.push_str(&format!(" ({}) ", default));
            }
            if !variable.required {
                out.push_str(" not required");
            }
            out.push('\n');
        }
        out.push('\n');
    }

    if !endpoint.names.is_empty() {
        out.push_str(&format!("Headers: {}\n\n", endpoint.headers));
    }

    if let Some(request) = &endpoint.request {
        body_block(out, "Request body data: ", &endpoint.consumes, request);
    }
    if let Some(response) = &endpoint.response {
        body_block(out, "Response: ", &endpoint.produces, response);
    }

    if !endpoint.access_expression.is_empty() {
        out.push_str(&format!(
            "_Mandatory rights: {}_\n\n",
            endpoint.access_expression
        ));
    }

    out.push_str(&format!(
        "[Go to the top](#rest-api) &bull; [{} :: {}]({}/{}#{})",
        endpoint.class_name,
        endpoint.method_name,
        base_url.trim_end_matches('/'),
        endpoint.source_file.trim_start_matches('/'),
        endpoint.line
    ));
}

/// Renders the endpoint list as a Markdown page.
///
/// Endpoints are written in the given order; `base_url` prefixes the source
/// links (`/blob/master` → `/blob/master/src/api.rs#12`).
pub fn serialize_markdown(endpoints: &[EndpointDescriptor], base_url: &str) -> String {
    debug!("Rendering {} endpoint(s) as Markdown", endpoints.len());

    let mut out = String::from("# REST API\n## Summary\n");
    for endpoint in endpoints {
        out.push_str(&format!(
            "\n - [{} **{}** {}](#{})",
            endpoint.names,
            endpoint.verbs_string(),
            endpoint.paths_string(),
            linkify_title(&summary_title(endpoint))
        ));
    }
    out.push('\n');

    for endpoint in endpoints {
        write_endpoint(&mut out, endpoint, base_url);
    }
    out.push('\n');
    out
}

/// Serializes the endpoint list to YAML.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_yaml(endpoints: &[EndpointDescriptor]) -> Result<String> {
    debug!("Serializing {} endpoint(s) to YAML", endpoints.len());
    serde_yaml::to_string(endpoints).context("Failed to serialize endpoints to YAML")
}

/// Serializes the endpoint list to pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_json(endpoints: &[EndpointDescriptor]) -> Result<String> {
    debug!("Serializing {} endpoint(s) to JSON", endpoints.len());
    serde_json::to_string_pretty(endpoints).context("Failed to serialize endpoints to JSON")
}

/// Writes string content to a file.
///
/// Creates the file (and its parent directories) if needed, or overwrites it.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
