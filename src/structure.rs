//! Structural type walker.
//!
//! Converts a payload type (request body or response body) into a
//! bounded-depth tree of [`StructuralNode`]s. Every member is classified as a
//! scalar, a list or a nested object; standard-library and framework types
//! stop the recursion, generic placeholders are resolved against the
//! enclosing type's arguments, and a depth cap guarantees termination on
//! self-referential shapes.
//!
//! Members are discovered differently per [`Role`]:
//!
//! - **Response**: public, non-static, parameterless accessors (`getX`, `isX`).
//! - **Request**: the parameters of the single public constructor, or public
//!   single-argument mutators (`setX`) when there is no public constructor or
//!   one of them takes no arguments. Several parameterized constructors make
//!   the type ambiguous: the walker records a [`Diagnostic`] and documents no
//!   members for it.
//!
//! Trees are built bottom-up: children are walked, sorted by name and flagged
//! before their parent node is constructed.

use crate::config::DocConfig;
use crate::extractor::{is_ignored, renamed};
use crate::model::{SourceModelProvider, TypeRef, TypeShape};
use log::debug;
use serde::Serialize;
use std::collections::HashSet;

/// Structural category of a documented member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NodeKind {
    Scalar,
    List,
    Object,
}

/// Which side of the exchange a payload type documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Request,
    Response,
}

/// One documented member of a payload shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructuralNode {
    pub name: String,
    pub kind: NodeKind,
    /// Display name of the leaf or element type
    pub resolved_type: String,
    /// Nesting level, 0 for members of the payload type itself
    pub depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<StructuralNode>>,
    /// Last sibling in its parent's child sequence
    pub is_last: bool,
}

/// Non-fatal problem found while walking a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Qualified name of the offending type
    pub type_name: String,
    pub message: String,
}

/// Result of walking one payload type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Walk {
    /// Members of the payload type, sorted by name
    pub nodes: Vec<StructuralNode>,
    /// One entry per ambiguous type met during the walk
    pub diagnostics: Vec<Diagnostic>,
    /// True when the payload type itself could not be documented
    pub root_ambiguous: bool,
}

/// A discovered member before classification.
struct Member {
    name: String,
    ty: TypeRef,
}

/// A classified node whose sibling position is not known yet.
struct PendingNode {
    name: String,
    kind: NodeKind,
    resolved_type: String,
    depth: usize,
    children: Option<Vec<StructuralNode>>,
}

impl PendingNode {
    fn finish(self, is_last: bool) -> StructuralNode {
        StructuralNode {
            name: self.name,
            kind: self.kind,
            resolved_type: self.resolved_type,
            depth: self.depth,
            children: self.children,
            is_last,
        }
    }
}

/// Walks payload types against a source model.
pub struct StructureWalker<'a, P: SourceModelProvider + ?Sized> {
    model: &'a P,
    config: &'a DocConfig,
}

impl<'a, P: SourceModelProvider + ?Sized> StructureWalker<'a, P> {
    pub fn new(model: &'a P, config: &'a DocConfig) -> Self {
        Self { model, config }
    }

    /// Walks the members of `ty` starting at depth 0
    pub fn walk(&self, ty: &TypeRef, role: Role) -> Walk {
        debug!("Walking {:?} payload {}", role, ty.qualified_name());
        let mut diagnostics = Vec::new();
        let nodes = self.children_of(ty, role, 0, &mut diagnostics);
        let root_ambiguous = diagnostics
            .iter()
            .any(|d| d.type_name == ty.qualified_name());
        Walk {
            nodes,
            diagnostics,
            root_ambiguous,
        }
    }

    /// Primitive, textual, package-less or framework types are not expanded
    pub fn is_opaque(&self, ty: &TypeRef) -> bool {
        match ty.shape {
            TypeShape::Primitive | TypeShape::Text | TypeShape::Placeholder => true,
            _ => match ty.package.as_deref() {
                None => true,
                Some(package) => package.is_empty() || self.config.is_opaque_package(package),
            },
        }
    }

    fn children_of(
        &self,
        declaring: &TypeRef,
        role: Role,
        depth: usize,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<StructuralNode> {
        let mut pending: Vec<PendingNode> = self
            .members(declaring, role, diagnostics)
            .into_iter()
            .map(|member| self.classify(declaring, member, role, depth, diagnostics))
            .collect();
        pending.sort_by(|l, r| l.name.cmp(&r.name));

        let count = pending.len();
        pending
            .into_iter()
            .enumerate()
            .map(|(idx, node)| node.finish(idx + 1 == count))
            .collect()
    }

    fn classify(
        &self,
        declaring: &TypeRef,
        member: Member,
        role: Role,
        depth: usize,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> PendingNode {
        let internal = member.ty;
        let (kind, candidate) = match internal.shape {
            TypeShape::Sequence => (NodeKind::List, single_argument(&internal)),
            TypeShape::Mapping => (NodeKind::Object, mapped_value(&internal)),
            _ if self.is_opaque(&internal) => (NodeKind::Scalar, internal),
            _ => (NodeKind::Object, internal),
        };
        let effective = self.substitute(declaring, candidate);

        let children = if depth >= self.config.max_depth {
            None
        } else {
            match kind {
                NodeKind::Object => {
                    Some(self.children_of(&effective, role, depth + 1, diagnostics))
                }
                NodeKind::List if !self.is_opaque(&effective) => {
                    Some(self.children_of(&effective, role, depth + 1, diagnostics))
                }
                _ => None,
            }
        };

        PendingNode {
            name: member.name,
            kind,
            resolved_type: effective.name,
            depth,
            children,
        }
    }

    /// Replaces a generic placeholder by the matching argument of the enclosing type
    fn substitute(&self, declaring: &TypeRef, candidate: TypeRef) -> TypeRef {
        if candidate.shape != TypeShape::Placeholder {
            return candidate;
        }
        let args = self.model.type_arguments(declaring);
        let position = self
            .model
            .find_ref(declaring)
            .and_then(|decl| decl.type_params.iter().position(|p| *p == candidate.name))
            .unwrap_or(0);
        match args.get(position).or_else(|| args.first()) {
            Some(arg) => {
                debug!(
                    "Substituting {} with {} inside {}",
                    candidate.name,
                    arg.name,
                    declaring.qualified_name()
                );
                arg.clone()
            }
            None => candidate,
        }
    }

    fn members(
        &self,
        declaring: &TypeRef,
        role: Role,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<Member> {
        if self.is_opaque(declaring) {
            return Vec::new();
        }
        match role {
            Role::Response => self.response_members(declaring),
            Role::Request => self.request_members(declaring, diagnostics),
        }
    }

    fn response_members(&self, declaring: &TypeRef) -> Vec<Member> {
        if let Some(supertype) = self.model.supertype(declaring) {
            if self
                .config
                .hypermedia_bases
                .iter()
                .any(|base| supertype.is_named(base))
            {
                debug!(
                    "{} extends a hypermedia wrapper, no members documented",
                    declaring.qualified_name()
                );
                return Vec::new();
            }
        }

        let mut seen = HashSet::new();
        self.model
            .methods(declaring)
            .into_iter()
            .filter(|m| {
                m.params.is_empty()
                    && m.return_type.is_some()
                    && m.modifiers.public
                    && !m.modifiers.is_static
                    && !m.modifiers.default
                    && !m.modifiers.native
                    && !self.declared_on_universal_base(m.declaring_type.as_deref())
                    && !is_ignored(&m.tags, Role::Response)
            })
            .filter_map(|m| {
                let accessor = self
                    .config
                    .getter_prefixes
                    .iter()
                    .find_map(|prefix| accessor_name(&m.name, prefix))?;
                if !seen.insert(m.name.clone()) {
                    return None;
                }
                Some(Member {
                    name: renamed(&m.tags).unwrap_or(accessor),
                    ty: m.return_type.clone()?,
                })
            })
            .collect()
    }

    fn request_members(
        &self,
        declaring: &TypeRef,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<Member> {
        let constructors: Vec<_> = self
            .model
            .constructors(declaring)
            .into_iter()
            .filter(|c| c.modifiers.public && !is_ignored(&c.tags, Role::Request))
            .collect();
        if constructors.is_empty() || constructors.iter().any(|c| c.params.is_empty()) {
            return self.setter_members(declaring);
        }

        match constructors.as_slice() {
            [constructor] => constructor
                .params
                .iter()
                .enumerate()
                .filter(|(_, p)| !p.varargs && !is_ignored(&p.tags, Role::Request))
                .map(|(idx, p)| Member {
                    name: renamed(&p.tags)
                        .or_else(|| p.name.clone())
                        .unwrap_or_else(|| {
                            format!("{}(param{})", declaring.qualified_name(), idx)
                        }),
                    ty: p.ty.clone(),
                })
                .collect(),
            many => {
                let type_name = declaring.qualified_name().to_string();
                if !diagnostics.iter().any(|d| d.type_name == type_name) {
                    debug!("{} has {} public constructors", type_name, many.len());
                    diagnostics.push(Diagnostic {
                        message: format!(
                            "Can't use {} as DTO body request because there are too many ({}) accessible constructors",
                            type_name,
                            many.len()
                        ),
                        type_name,
                    });
                }
                Vec::new()
            }
        }
    }

    fn setter_members(&self, declaring: &TypeRef) -> Vec<Member> {
        let mut seen = HashSet::new();
        self.model
            .methods(declaring)
            .into_iter()
            .filter(|m| {
                m.params.len() == 1
                    && m.modifiers.public
                    && !m.modifiers.is_static
                    && !m.modifiers.default
                    && !m.modifiers.native
                    && !is_ignored(&m.tags, Role::Request)
            })
            .filter_map(|m| {
                let accessor = accessor_name(&m.name, &self.config.setter_prefix)?;
                if !seen.insert(m.name.clone()) {
                    return None;
                }
                Some(Member {
                    name: renamed(&m.tags).unwrap_or(accessor),
                    ty: m.params[0].ty.clone(),
                })
            })
            .collect()
    }

    fn declared_on_universal_base(&self, declaring_type: Option<&str>) -> bool {
        declaring_type
            .map(|t| self.config.universal_base.iter().any(|base| base == t))
            .unwrap_or(false)
    }
}

/// Element type of a sequence; the opaque object type unless exactly one argument
fn single_argument(ty: &TypeRef) -> TypeRef {
    match ty.args.as_slice() {
        [element] => element.clone(),
        _ => TypeRef::unknown_object(),
    }
}

/// Value type of an associative container
fn mapped_value(ty: &TypeRef) -> TypeRef {
    match ty.args.as_slice() {
        [_, value] => value.clone(),
        [value] => value.clone(),
        _ => TypeRef::unknown_object(),
    }
}

/// `getTextValue` → `textValue`, `get_text_value` → `text_value`
fn accessor_name(method: &str, prefix: &str) -> Option<String> {
    let rest = method.strip_prefix(prefix)?.trim_start_matches('_');
    let mut chars = rest.chars();
    let first = chars.next()?;
    Some(first.to_lowercase().chain(chars).collect())
}
