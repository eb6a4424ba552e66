//! Metadata tag extraction.
//!
//! Reads the route-declaring and access-control tags attached to a handler
//! class or handler method and normalizes them into [`RouteFragment`]s and
//! [`AccessRuleGroup`]s. Extraction never fails: absent tags simply yield
//! empty sequences.
//!
//! # Recognized tags
//!
//! - `RequestMapping` / `request_mapping`: generic route, verbs from `method`
//! - `GetMapping`, `PostMapping`, `PutMapping`, `PatchMapping`, `DeleteMapping`
//!   (or the short `get`, `post`, ...): one implied verb each
//! - `CheckBefore(rights...)`: one group of rights required together
//! - `CheckOneBefore(CheckBefore(..), ...)`: alternative groups
//!
//! # Example
//!
//! ```
//! use rest_doc_from_source::extractor::TagExtraction;
//! use rest_doc_from_source::model::Tag;
//!
//! let tags = vec![
//!     Tag::new("get").with("value", "/items"),
//!     Tag::new("check_before").with("value", vec!["read"]),
//! ];
//! let extraction = TagExtraction::from_tags(&tags);
//! assert_eq!(extraction.routes.len(), 1);
//! assert_eq!(extraction.access.len(), 1);
//! ```

pub mod params;

use crate::model::Tag;
use crate::structure::Role;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// HTTP verbs a route tag can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpVerb {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Trace,
}

impl HttpVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVerb::Get => "GET",
            HttpVerb::Head => "HEAD",
            HttpVerb::Post => "POST",
            HttpVerb::Put => "PUT",
            HttpVerb::Patch => "PATCH",
            HttpVerb::Delete => "DELETE",
            HttpVerb::Options => "OPTIONS",
            HttpVerb::Trace => "TRACE",
        }
    }

    /// Parses `GET`, `get` or a qualified form such as `RequestMethod.GET`
    pub fn parse(value: &str) -> Option<Self> {
        let last = value
            .rsplit(|c: char| c == ':' || c == '.')
            .next()
            .unwrap_or(value)
            .trim();
        match last.to_ascii_uppercase().as_str() {
            "GET" => Some(HttpVerb::Get),
            "HEAD" => Some(HttpVerb::Head),
            "POST" => Some(HttpVerb::Post),
            "PUT" => Some(HttpVerb::Put),
            "PATCH" => Some(HttpVerb::Patch),
            "DELETE" => Some(HttpVerb::Delete),
            "OPTIONS" => Some(HttpVerb::Options),
            "TRACE" => Some(HttpVerb::Trace),
            _ => None,
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared route rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteFragment {
    /// Display name of the route
    pub name: Option<String>,
    /// Path template, first declared value only
    pub path: Option<String>,
    /// Declared verbs; empty for a generic route without `method`
    pub verbs: Vec<HttpVerb>,
    pub headers: Vec<String>,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
}

impl RouteFragment {
    fn from_tag(tag: &Tag, verbs: Vec<HttpVerb>) -> Self {
        let path = tag
            .text("value")
            .or_else(|| tag.text("path"))
            .map(str::to_string);
        Self {
            name: tag
                .text("name")
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            path,
            verbs,
            headers: tag.texts("headers"),
            consumes: tag.texts("consumes"),
            produces: tag.texts("produces"),
        }
    }
}

/// Rights required together (AND). A group is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessRuleGroup(Vec<String>);

impl AccessRuleGroup {
    /// Builds a group from `rights`, dropping duplicates; `None` when nothing is left
    pub fn new<I, S>(rights: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = BTreeSet::new();
        let rights: Vec<String> = rights
            .into_iter()
            .map(Into::into)
            .filter(|r| !r.trim().is_empty() && seen.insert(r.clone()))
            .collect();
        if rights.is_empty() {
            None
        } else {
            Some(Self(rights))
        }
    }

    pub fn rights(&self) -> &[String] {
        &self.0
    }

    /// `A & B`
    pub fn and_join(&self) -> String {
        self.0.join(" & ")
    }

    fn member_set(&self) -> BTreeSet<&str> {
        self.0.iter().map(String::as_str).collect()
    }
}

/// Result of reading the tags of one class or method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagExtraction {
    pub routes: Vec<RouteFragment>,
    /// Alternative groups (OR), in first-occurrence order
    pub access: Vec<AccessRuleGroup>,
}

const GENERIC_ROUTE: &str = "RequestMapping";
const SHORTHAND_ROUTES: [(&str, &str, HttpVerb); 5] = [
    ("GetMapping", "get", HttpVerb::Get),
    ("PostMapping", "post", HttpVerb::Post),
    ("PutMapping", "put", HttpVerb::Put),
    ("PatchMapping", "patch", HttpVerb::Patch),
    ("DeleteMapping", "delete", HttpVerb::Delete),
];
const SINGLE_ACCESS: &str = "CheckBefore";
const GROUPED_ACCESS: &str = "CheckOneBefore";

fn shorthand_verb(tag: &Tag) -> Option<HttpVerb> {
    SHORTHAND_ROUTES
        .iter()
        .find(|(long, short, _)| tag.is(long) || tag.is(short))
        .map(|(_, _, verb)| *verb)
}

/// True for any generic or shorthand route tag
pub fn is_route_tag(tag: &Tag) -> bool {
    tag.is(GENERIC_ROUTE) || shorthand_verb(tag).is_some()
}

impl TagExtraction {
    pub fn from_tags<'a, I>(tags: I) -> Self
    where
        I: IntoIterator<Item = &'a Tag>,
    {
        let mut routes = Vec::new();
        let mut single_groups = Vec::new();
        let mut alternative_groups = Vec::new();

        for tag in tags {
            if tag.is(GENERIC_ROUTE) {
                let verbs = unique_verbs(tag.texts("method").iter().filter_map(|m| {
                    let verb = HttpVerb::parse(m);
                    if verb.is_none() {
                        debug!("Ignoring unknown verb {:?} on {}", m, tag.name);
                    }
                    verb
                }));
                routes.push(RouteFragment::from_tag(tag, verbs));
            } else if let Some(verb) = shorthand_verb(tag) {
                routes.push(RouteFragment::from_tag(tag, vec![verb]));
            } else if tag.is(SINGLE_ACCESS) {
                single_groups.extend(AccessRuleGroup::new(tag.texts("value")));
            } else if tag.is(GROUPED_ACCESS) {
                alternative_groups.extend(
                    tag.nested("value")
                        .iter()
                        .filter(|inner| inner.is(SINGLE_ACCESS))
                        .filter_map(|inner| AccessRuleGroup::new(inner.texts("value"))),
                );
            }
        }

        let mut access: Vec<AccessRuleGroup> = Vec::new();
        for group in single_groups.into_iter().chain(alternative_groups) {
            if !access.iter().any(|g| g.member_set() == group.member_set()) {
                access.push(group);
            }
        }

        debug!(
            "Extracted {} route fragment(s) and {} access group(s)",
            routes.len(),
            access.len()
        );
        Self { routes, access }
    }

    pub fn has_routes(&self) -> bool {
        !self.routes.is_empty()
    }

    /// `A & B | C`, or an empty string without groups
    pub fn access_expression(&self) -> String {
        self.access
            .iter()
            .map(AccessRuleGroup::and_join)
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

fn unique_verbs(verbs: impl Iterator<Item = HttpVerb>) -> Vec<HttpVerb> {
    let mut out = Vec::new();
    for verb in verbs {
        if !out.contains(&verb) {
            out.push(verb);
        }
    }
    out
}

/// True when the tags exclude a member from the payload documented for `role`.
///
/// `skip_serializing` only hides response members and `skip_deserializing`
/// only request members.
pub fn is_ignored(tags: &[Tag], role: Role) -> bool {
    let directional = match role {
        Role::Response => "skip_serializing",
        Role::Request => "skip_deserializing",
    };
    tags.iter().any(|tag| {
        tag.is("JsonIgnore")
            || (tag.is("serde")
                && ["skip", directional]
                    .iter()
                    .any(|key| tag.flag(key).unwrap_or(false)))
    })
}

/// Explicit serialized name, if any
pub fn renamed(tags: &[Tag]) -> Option<String> {
    tags.iter().find_map(|tag| {
        if tag.is("JsonProperty") {
            tag.text("value").filter(|v| !v.is_empty()).map(str::to_string)
        } else if tag.is("serde") {
            tag.text("rename").map(str::to_string)
        } else {
            None
        }
    })
}
