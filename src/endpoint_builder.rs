//! Endpoint descriptor assembly.
//!
//! Merges the class-level metadata of a handler class with the tags,
//! parameters and return type of one of its handler methods into an
//! [`EndpointDescriptor`].

use crate::config::DocConfig;
use crate::extractor::params::{path_variables, query_variables, request_body, UrlVariable};
use crate::extractor::{is_route_tag, HttpVerb, RouteFragment, TagExtraction};
use crate::model::{MethodDecl, SourceModelProvider};
use crate::registry::ClassMetadata;
use crate::structure::{Diagnostic, Role, StructuralNode, StructureWalker, Walk};
use log::debug;
use serde::Serialize;

/// Line reported when a method's position is unknown
pub const DEFAULT_LINE: usize = 1;

/// Fully merged, render-ready description of one endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointDescriptor {
    /// Display names of the route tags, comma-joined
    pub names: String,
    pub verbs: Vec<HttpVerb>,
    /// One entry per (class path, method path) pair, query suffix included
    pub paths: Vec<String>,
    pub headers: String,
    pub consumes: String,
    pub produces: String,
    /// `(C) & (M)`, or the non-empty side alone
    pub access_expression: String,
    pub path_variables: Vec<UrlVariable>,
    pub query_variables: Vec<UrlVariable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<Vec<StructuralNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Vec<StructuralNode>>,
    /// Simple name of the handler class
    pub class_name: String,
    /// Relative source file, or the qualified class name as a path
    pub source_file: String,
    pub method_name: String,
    pub line: usize,
    pub comments: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl EndpointDescriptor {
    /// `GET, POST`
    pub fn verbs_string(&self) -> String {
        self.verbs
            .iter()
            .map(HttpVerb::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `/a/b, /a/c`
    pub fn paths_string(&self) -> String {
        self.paths.join(", ")
    }

    /// Key used to order the final endpoint list
    pub fn sort_key(&self) -> String {
        format!("{}{}", self.paths_string(), self.verbs_string())
    }
}

/// Joins path segments with single separators: `["aa/", "/bb", "cc/"]` → `/aa/bb/cc`
pub fn ensure_path(segments: &[&str]) -> String {
    let parts: Vec<&str> = segments
        .iter()
        .map(|s| s.trim())
        .map(|s| s.strip_prefix('/').unwrap_or(s))
        .map(|s| s.strip_suffix('/').unwrap_or(s))
        .filter(|s| !s.is_empty())
        .collect();
    format!("/{}", parts.join("/"))
}

/// Combines class-level and method-level access expressions
pub fn combine_access(class_level: &str, method_level: &str) -> String {
    match (class_level.trim(), method_level.trim()) {
        ("", "") => String::new(),
        (class_level, "") => class_level.to_string(),
        ("", method_level) => method_level.to_string(),
        (class_level, method_level) => format!("({}) & ({})", class_level, method_level),
    }
}

fn join_non_blank<'a>(values: impl Iterator<Item = &'a String>) -> String {
    values
        .filter(|v| !v.trim().is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn query_suffix(variables: &[UrlVariable]) -> String {
    if variables.is_empty() {
        return String::new();
    }
    let fragments: Vec<String> = variables.iter().map(UrlVariable::query_fragment).collect();
    format!("?{}", fragments.join("&"))
}

/// Builds endpoint descriptors against a read-only source model.
pub struct EndpointAssembler<'a, P: SourceModelProvider + ?Sized> {
    model: &'a P,
    config: &'a DocConfig,
    walker: StructureWalker<'a, P>,
}

impl<'a, P: SourceModelProvider + ?Sized> EndpointAssembler<'a, P> {
    pub fn new(model: &'a P, config: &'a DocConfig) -> Self {
        Self {
            model,
            config,
            walker: StructureWalker::new(model, config),
        }
    }

    /// Public methods of the class declaring at least one route tag, in declaration order
    pub fn handler_methods(&self, class: &ClassMetadata) -> Vec<&'a MethodDecl> {
        self.model
            .find_type(&class.qualified_name)
            .map(|decl| {
                decl.methods
                    .iter()
                    .filter(|m| m.modifiers.public && m.tags.iter().any(is_route_tag))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// One descriptor per handler method of the class
    pub fn assemble_class(&self, class: &ClassMetadata) -> Vec<EndpointDescriptor> {
        let methods = self.handler_methods(class);
        debug!(
            "Assembling {} endpoint(s) for {}",
            methods.len(),
            class.qualified_name
        );
        methods
            .into_iter()
            .map(|method| self.assemble(class, method))
            .collect()
    }

    pub fn assemble(&self, class: &ClassMetadata, method: &MethodDecl) -> EndpointDescriptor {
        let class_tags = &class.extraction;
        let method_tags = TagExtraction::from_tags(&method.tags);
        let fragments = || class_tags.routes.iter().chain(method_tags.routes.iter());

        let mut verbs = Vec::new();
        for verb in fragments().flat_map(|f| f.verbs.iter().copied()) {
            if !verbs.contains(&verb) {
                verbs.push(verb);
            }
        }

        let path_variables = path_variables(method);
        let query_variables = query_variables(method);
        let paths = self.paths(&class_tags.routes, &method_tags.routes, &query_variables);

        let mut diagnostics = Vec::new();
        let request = self
            .request_walk(method)
            .and_then(|walk| collect(walk, &mut diagnostics));
        let response = self
            .response_walk(method)
            .and_then(|walk| collect(walk, &mut diagnostics));

        let position = self
            .model
            .source_position(&class.qualified_name, &method.name)
            .or_else(|| method.position.clone());
        let mut comments = self
            .model
            .source_comments(&class.qualified_name, &method.name);
        if comments.is_empty() {
            comments = method.comments.clone();
        }
        let source_file = position
            .as_ref()
            .map(|p| p.file.clone())
            .filter(|f| !f.is_empty())
            .or_else(|| class.source_file.clone())
            .unwrap_or_else(|| class.fallback_path());

        EndpointDescriptor {
            names: join_non_blank(fragments().filter_map(|f| f.name.as_ref())),
            verbs,
            paths,
            headers: join_non_blank(fragments().flat_map(|f| f.headers.iter())),
            consumes: join_non_blank(fragments().flat_map(|f| f.consumes.iter())),
            produces: join_non_blank(fragments().flat_map(|f| f.produces.iter())),
            access_expression: combine_access(
                &class_tags.access_expression(),
                &method_tags.access_expression(),
            ),
            path_variables,
            query_variables,
            request,
            response,
            class_name: class.simple_name.clone(),
            source_file,
            method_name: method.name.clone(),
            line: position.map(|p| p.line).unwrap_or(DEFAULT_LINE),
            comments,
            diagnostics,
        }
    }

    fn paths(
        &self,
        class_routes: &[RouteFragment],
        method_routes: &[RouteFragment],
        query: &[UrlVariable],
    ) -> Vec<String> {
        let class_paths: Vec<&str> = if class_routes.is_empty() {
            vec!["/"]
        } else {
            class_routes
                .iter()
                .map(|f| f.path.as_deref().unwrap_or("/"))
                .collect()
        };
        let method_paths: Vec<&str> = if method_routes.is_empty() {
            vec![""]
        } else {
            method_routes
                .iter()
                .map(|f| f.path.as_deref().unwrap_or(""))
                .collect()
        };

        let suffix = query_suffix(query);
        class_paths
            .iter()
            .flat_map(|class_path| {
                let suffix = &suffix;
                method_paths
                    .iter()
                    .map(move |method_path| {
                        format!("{}{}", ensure_path(&[*class_path, *method_path]), suffix)
                    })
            })
            .collect()
    }

    /// Request body walk, when the body type is declared in the model
    fn request_walk(&self, method: &MethodDecl) -> Option<Walk> {
        let body = request_body(method)?;
        if self.model.find_ref(&body.ty).is_none() {
            debug!(
                "Request body {} of {} is not declared in the model",
                body.ty.qualified_name(),
                method.name
            );
            return None;
        }
        Some(self.walker.walk(&body.ty, Role::Request))
    }

    /// Response walk over the single argument of a success envelope
    fn response_walk(&self, method: &MethodDecl) -> Option<Walk> {
        let returned = method.return_type.as_ref()?;
        let is_envelope = self
            .config
            .success_envelopes
            .iter()
            .any(|envelope| returned.is_named(envelope));
        if !is_envelope {
            return None;
        }
        let payload = returned.args.first()?;
        Some(self.walker.walk(payload, Role::Response))
    }
}

/// Moves a walk's diagnostics out; an ambiguous payload type documents no body
fn collect(walk: Walk, diagnostics: &mut Vec<Diagnostic>) -> Option<Vec<StructuralNode>> {
    for diagnostic in walk.diagnostics {
        if !diagnostics.iter().any(|d| d.type_name == diagnostic.type_name) {
            diagnostics.push(diagnostic);
        }
    }
    if walk.root_ambiguous {
        None
    } else {
        Some(walk.nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ConstructorDecl, MethodDecl, ParamDecl, SourceModel, SourcePosition, Tag, TypeDecl,
        TypeRef,
    };
    use pretty_assertions::assert_eq;

    fn class_with(tags: Vec<Tag>) -> ClassMetadata {
        ClassMetadata {
            qualified_name: "demo.Api".to_string(),
            simple_name: "Api".to_string(),
            source_file: None,
            extraction: TagExtraction::from_tags(&tags),
        }
    }

    fn check_before(rights: &[&str]) -> Tag {
        Tag::new("CheckBefore").with("value", rights.to_vec())
    }

    fn assemble(class: &ClassMetadata, method: &MethodDecl) -> EndpointDescriptor {
        let model = SourceModel::default();
        let config = DocConfig::default();
        EndpointAssembler::new(&model, &config).assemble(class, method)
    }

    #[test]
    fn test_ensure_path() {
        assert_eq!(ensure_path(&["aa/", "/bb", "cc/"]), "/aa/bb/cc");
        assert_eq!(ensure_path(&["/", ""]), "/");
        assert_eq!(ensure_path(&["/", "items"]), "/items");
        assert_eq!(ensure_path(&[" /api/ ", "{id}"]), "/api/{id}");
    }

    #[test]
    fn test_combine_access() {
        assert_eq!(combine_access("", ""), "");
        assert_eq!(combine_access("", "X"), "X");
        assert_eq!(combine_access("A ", ""), "A");
        assert_eq!(combine_access("A | B", "C"), "(A | B) & (C)");
    }

    #[test]
    fn test_paths_are_the_cross_product_of_class_and_method_paths() {
        let class = class_with(vec![
            Tag::new("RequestMapping").with("value", "/v1"),
            Tag::new("RequestMapping").with("value", "/v2/"),
        ]);
        let method = MethodDecl::new("list")
            .with_tag(Tag::new("GetMapping").with("value", "items"))
            .with_tag(Tag::new("GetMapping").with("value", "/things"))
            .with_tag(Tag::new("GetMapping"));

        let endpoint = assemble(&class, &method);

        assert_eq!(endpoint.paths.len(), 2 * 3);
        assert_eq!(
            endpoint.paths,
            vec!["/v1/items", "/v1/things", "/v1", "/v2/items", "/v2/things", "/v2"]
        );
        assert_eq!(endpoint.verbs, vec![HttpVerb::Get]);
    }

    #[test]
    fn test_class_without_routes_defaults_to_root() {
        let method = MethodDecl::new("ping").with_tag(Tag::new("get").with("value", "ping"));
        let endpoint = assemble(&class_with(vec![]), &method);
        assert_eq!(endpoint.paths, vec!["/ping"]);
    }

    #[test]
    fn test_query_suffix_on_every_path() {
        let class = class_with(vec![Tag::new("RequestMapping").with("value", vec!["/a"])]);
        let method = MethodDecl::new("search")
            .with_tag(Tag::new("GetMapping").with("value", "x"))
            .with_tag(Tag::new("GetMapping").with("value", "y"))
            .with_param(
                ParamDecl::new("page", TypeRef::primitive("int"))
                    .with_tag(Tag::new("RequestParam").with("defaultValue", "0")),
            )
            .with_param(
                ParamDecl::new("q", TypeRef::text("String")).with_tag(Tag::new("RequestParam")),
            );

        let endpoint = assemble(&class, &method);
        assert_eq!(
            endpoint.paths,
            vec!["/a/x?page=0&q=<String>", "/a/y?page=0&q=<String>"]
        );
        assert_eq!(endpoint.query_variables.len(), 2);
    }

    #[test]
    fn test_access_expression_merges_both_levels() {
        let class = class_with(vec![Tag::new("CheckOneBefore").with(
            "value",
            vec![check_before(&["A", "B"]), check_before(&["C", "D"])],
        )]);
        let method = MethodDecl::new("remove")
            .with_tag(Tag::new("DeleteMapping"))
            .with_tag(check_before(&["E"]));

        assert_eq!(
            assemble(&class, &method).access_expression,
            "(A & B | C & D) & (E)"
        );
    }

    #[test]
    fn test_method_only_access_has_no_parentheses() {
        let method = MethodDecl::new("remove")
            .with_tag(Tag::new("DeleteMapping"))
            .with_tag(check_before(&["X"]));
        assert_eq!(assemble(&class_with(vec![]), &method).access_expression, "X");
    }

    #[test]
    fn test_verbs_and_attributes_merge_class_then_method() {
        let class = class_with(vec![Tag::new("RequestMapping")
            .with("value", "/serverPath")
            .with("method", vec!["GET"])
            .with("produces", "application/json")
            .with("headers", " ")]);
        let method = MethodDecl::new("post")
            .with_tag(
                Tag::new("PostMapping")
                    .with("name", "Post Demo")
                    .with("consumes", "text/xml")
                    .with("produces", "text/plain"),
            )
            .with_tag(Tag::new("RequestMapping").with("method", vec!["GET", "PUT"]));

        let endpoint = assemble(&class, &method);

        assert_eq!(endpoint.verbs_string(), "GET, POST, PUT");
        assert_eq!(endpoint.names, "Post Demo");
        assert_eq!(endpoint.headers, "");
        assert_eq!(endpoint.consumes, "text/xml");
        assert_eq!(endpoint.produces, "application/json, text/plain");
    }

    #[test]
    fn test_missing_position_defaults() {
        let method = MethodDecl::new("ping").with_tag(Tag::new("get"));
        let endpoint = assemble(&class_with(vec![]), &method);

        assert_eq!(endpoint.line, DEFAULT_LINE);
        assert!(endpoint.comments.is_empty());
        assert_eq!(endpoint.source_file, "demo/Api");
        assert!(endpoint.request.is_none());
        assert!(endpoint.response.is_none());
    }

    fn dto_model() -> SourceModel {
        let controller = TypeDecl::new("Api").in_package("demo", ".").with_method(MethodDecl {
            position: Some(SourcePosition {
                file: "src/demo/api.rs".to_string(),
                line: 42,
            }),
            comments: vec!["Creates an item".to_string()],
            ..MethodDecl::new("create")
        });
        let input = TypeDecl::new("Input")
            .in_package("demo", ".")
            .with_constructor(ConstructorDecl::public(vec![ParamDecl::new(
                "label",
                TypeRef::text("String"),
            )]));
        let ambiguous = TypeDecl::new("Twice")
            .in_package("demo", ".")
            .with_constructor(ConstructorDecl::public(vec![ParamDecl::new(
                "a",
                TypeRef::text("String"),
            )]))
            .with_constructor(ConstructorDecl::public(vec![ParamDecl::new(
                "b",
                TypeRef::text("String"),
            )]));
        let output = TypeDecl::new("Output")
            .in_package("demo", ".")
            .with_method(MethodDecl::new("getId").returning(TypeRef::primitive("long")));
        SourceModel::new(vec![controller, input, ambiguous, output])
    }

    fn body_method(body: TypeRef, returned: TypeRef) -> MethodDecl {
        MethodDecl::new("create")
            .with_tag(Tag::new("PostMapping"))
            .with_param(ParamDecl::new("body", body).with_tag(Tag::new("RequestBody")))
            .returning(returned)
    }

    fn envelope(inner: TypeRef) -> TypeRef {
        TypeRef::named("ResponseEntity", "org.springframework.http", ".").with_args(vec![inner])
    }

    #[test]
    fn test_request_and_response_trees() {
        let model = dto_model();
        let config = DocConfig::default();
        let assembler = EndpointAssembler::new(&model, &config);
        let method = body_method(
            TypeRef::named("Input", "demo", "."),
            envelope(TypeRef::named("Output", "demo", ".")),
        );

        let endpoint = assembler.assemble(&class_with(vec![]), &method);

        let request = endpoint.request.unwrap();
        assert_eq!(request[0].name, "label");
        let response = endpoint.response.unwrap();
        assert_eq!(response[0].name, "id");
        assert_eq!(endpoint.line, 42);
        assert_eq!(endpoint.source_file, "src/demo/api.rs");
        assert_eq!(endpoint.comments, vec!["Creates an item".to_string()]);
        assert!(endpoint.diagnostics.is_empty());
    }

    #[test]
    fn test_ambiguous_request_body_is_omitted() {
        let model = dto_model();
        let config = DocConfig::default();
        let assembler = EndpointAssembler::new(&model, &config);
        let method = body_method(
            TypeRef::named("Twice", "demo", "."),
            TypeRef::named("Output", "demo", "."),
        );

        let endpoint = assembler.assemble(&class_with(vec![]), &method);

        assert!(endpoint.request.is_none());
        assert!(endpoint.response.is_none());
        assert_eq!(endpoint.diagnostics.len(), 1);
        assert_eq!(endpoint.diagnostics[0].type_name, "demo.Twice");
    }

    #[test]
    fn test_unknown_body_and_bare_envelope_document_nothing() {
        let model = dto_model();
        let config = DocConfig::default();
        let assembler = EndpointAssembler::new(&model, &config);
        let method = body_method(
            TypeRef::named("Missing", "demo", "."),
            TypeRef::new("ResponseEntity"),
        );

        let endpoint = assembler.assemble(&class_with(vec![]), &method);
        assert!(endpoint.request.is_none());
        assert!(endpoint.response.is_none());
    }

    #[test]
    fn test_handler_methods_need_public_route_tags() {
        let controller = TypeDecl::new("Api")
            .in_package("demo", ".")
            .with_method(MethodDecl::new("list").with_tag(Tag::new("get")))
            .with_method(MethodDecl::new("helper"))
            .with_method(
                MethodDecl::new("hidden")
                    .with_tag(Tag::new("get"))
                    .with_modifiers(crate::model::Modifiers::default()),
            );
        let model = SourceModel::new(vec![controller]);
        let config = DocConfig::default();
        let assembler = EndpointAssembler::new(&model, &config);

        let names: Vec<_> = assembler
            .handler_methods(&class_with(vec![]))
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(names, vec!["list"]);
    }
}
