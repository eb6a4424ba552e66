//! Language-neutral source model consumed by the documentation core.
//!
//! The core never looks at source text directly. It queries a
//! [`SourceModelProvider`] for declared types, their executable members,
//! their tags and their supertypes. [`SourceModel`] is the in-memory
//! implementation: it can be built by the Rust backend in
//! [`crate::type_resolver`], or loaded from a pre-built JSON/YAML index.

use crate::error::{Error, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

/// Structural category of a type reference, decided by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeShape {
    /// Numbers, booleans, characters
    Primitive,
    /// Character sequences
    Text,
    /// Collections with a single element type
    Sequence,
    /// Associative containers
    Mapping,
    /// A generic type parameter such as `T`
    Placeholder,
    /// Any other nominal type
    #[default]
    Named,
}

/// A reference to a type, with its actual generic arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRef {
    /// Simple display name (e.g. `InputDto`)
    pub name: String,
    /// Fully qualified name, when different from the simple name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualified: Option<String>,
    /// Owning package/module; `None` when it cannot be resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(default)]
    pub shape: TypeShape,
    /// Actual type arguments (e.g. `String` for `List<String>`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<TypeRef>,
}

impl TypeRef {
    /// A named type without a resolvable package
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qualified: None,
            package: None,
            shape: TypeShape::Named,
            args: Vec::new(),
        }
    }

    /// A named type declared in `package`, qualified with `separator`
    pub fn named(name: impl Into<String>, package: impl Into<String>, separator: &str) -> Self {
        let name = name.into();
        let package = package.into();
        Self {
            qualified: Some(format!("{}{}{}", package, separator, name)),
            name,
            package: Some(package),
            shape: TypeShape::Named,
            args: Vec::new(),
        }
    }

    pub fn primitive(name: impl Into<String>) -> Self {
        Self::new(name).with_shape(TypeShape::Primitive)
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name).with_shape(TypeShape::Text)
    }

    pub fn placeholder(name: impl Into<String>) -> Self {
        Self::new(name).with_shape(TypeShape::Placeholder)
    }

    /// A sequence type; `element` is its single type argument when known
    pub fn sequence(name: impl Into<String>, element: Option<TypeRef>) -> Self {
        Self::new(name)
            .with_shape(TypeShape::Sequence)
            .with_args(element.into_iter().collect())
    }

    pub fn mapping(name: impl Into<String>, key: TypeRef, value: TypeRef) -> Self {
        Self::new(name)
            .with_shape(TypeShape::Mapping)
            .with_args(vec![key, value])
    }

    /// The opaque stand-in used when an element type cannot be determined
    pub fn unknown_object() -> Self {
        Self::new("Object")
    }

    pub fn with_shape(mut self, shape: TypeShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_args(mut self, args: Vec<TypeRef>) -> Self {
        self.args = args;
        self
    }

    pub fn qualified_name(&self) -> &str {
        self.qualified.as_deref().unwrap_or(&self.name)
    }

    /// True when either the simple or the qualified name equals `name`
    pub fn is_named(&self, name: &str) -> bool {
        self.name == name || self.qualified_name() == name
    }
}

/// Value of one tag argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Flag(bool),
    Text(String),
    List(Vec<String>),
    Tags(Vec<Tag>),
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        TagValue::Text(value.to_string())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        TagValue::Text(value)
    }
}

impl From<bool> for TagValue {
    fn from(value: bool) -> Self {
        TagValue::Flag(value)
    }
}

impl From<Vec<&str>> for TagValue {
    fn from(values: Vec<&str>) -> Self {
        TagValue::List(values.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for TagValue {
    fn from(values: Vec<String>) -> Self {
        TagValue::List(values)
    }
}

impl From<Vec<Tag>> for TagValue {
    fn from(tags: Vec<Tag>) -> Self {
        TagValue::Tags(tags)
    }
}

/// A declarative metadata tag attached to a type, member or parameter.
///
/// Positional arguments live under the `value` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub args: BTreeMap<String, TagValue>,
}

/// Normalizes a tag name for matching: last path segment, lowercase, no `_`.
pub fn normalize_tag_name(name: &str) -> String {
    let last = name
        .rsplit(|c: char| c == ':' || c == '.')
        .next()
        .unwrap_or(name);
    last.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<TagValue>) -> Self {
        self.args.insert(key.to_string(), value.into());
        self
    }

    /// Matches the tag name against `name`, ignoring case, `_` and any path prefix
    pub fn is(&self, name: &str) -> bool {
        normalize_tag_name(&self.name) == normalize_tag_name(name)
    }

    /// First string of the argument, whether stored as text or list
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.args.get(key)? {
            TagValue::Text(s) => Some(s.as_str()),
            TagValue::List(values) => values.first().map(String::as_str),
            _ => None,
        }
    }

    /// All strings of the argument; empty when absent
    pub fn texts(&self, key: &str) -> Vec<String> {
        match self.args.get(key) {
            Some(TagValue::Text(s)) => vec![s.clone()],
            Some(TagValue::List(values)) => values.clone(),
            _ => Vec::new(),
        }
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.args.get(key)? {
            TagValue::Flag(b) => Some(*b),
            TagValue::Text(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn nested(&self, key: &str) -> &[Tag] {
        match self.args.get(key) {
            Some(TagValue::Tags(tags)) => tags,
            _ => &[],
        }
    }
}

/// Visibility and kind flags of an executable member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub public: bool,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub native: bool,
}

impl Modifiers {
    pub fn public() -> Self {
        Self {
            public: true,
            ..Self::default()
        }
    }

    pub fn public_static() -> Self {
        Self {
            public: true,
            is_static: true,
            ..Self::default()
        }
    }
}

/// Source file (relative, `/`-separated) and 1-based line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePosition {
    pub file: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDecl {
    /// Declared name; `None` when names are not available
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub varargs: bool,
}

impl ParamDecl {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: Some(name.into()),
            ty,
            tags: Vec::new(),
            varargs: false,
        }
    }

    pub fn unnamed(ty: TypeRef) -> Self {
        Self {
            name: None,
            ty,
            tags: Vec::new(),
            varargs: false,
        }
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamDecl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<TypeRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    /// Qualified name of the type declaring this method
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declaring_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<SourcePosition>,
    /// Documentation comments attached to the method
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,
}

impl MethodDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modifiers: Modifiers::public(),
            params: Vec::new(),
            return_type: None,
            tags: Vec::new(),
            declaring_type: None,
            position: None,
            comments: Vec::new(),
        }
    }

    pub fn returning(mut self, ty: TypeRef) -> Self {
        self.return_type = Some(ty);
        self
    }

    pub fn with_param(mut self, param: ParamDecl) -> Self {
        self.params.push(param);
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorDecl {
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl ConstructorDecl {
    pub fn public(params: Vec<ParamDecl>) -> Self {
        Self {
            modifiers: Modifiers::public(),
            params,
            tags: Vec::new(),
        }
    }
}

/// A declared type with everything the core may ask about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualified: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_params: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supertype: Option<TypeRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodDecl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constructors: Vec<ConstructorDecl>,
    /// Relative path of the declaring source file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl TypeDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qualified: None,
            package: None,
            type_params: Vec::new(),
            supertype: None,
            tags: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            file: None,
        }
    }

    /// Sets the package and derives the qualified name with `separator`
    pub fn in_package(mut self, package: impl Into<String>, separator: &str) -> Self {
        let package = package.into();
        self.qualified = Some(format!("{}{}{}", package, separator, self.name));
        self.package = Some(package);
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn with_method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_constructor(mut self, constructor: ConstructorDecl) -> Self {
        self.constructors.push(constructor);
        self
    }

    pub fn with_supertype(mut self, supertype: TypeRef) -> Self {
        self.supertype = Some(supertype);
        self
    }

    pub fn with_type_params(mut self, params: &[&str]) -> Self {
        self.type_params = params.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn qualified_name(&self) -> &str {
        self.qualified.as_deref().unwrap_or(&self.name)
    }

    /// A reference to this type, its parameters left as placeholders
    pub fn reference(&self) -> TypeRef {
        TypeRef {
            name: self.name.clone(),
            qualified: self.qualified.clone(),
            package: self.package.clone(),
            shape: TypeShape::Named,
            args: self
                .type_params
                .iter()
                .map(|p| TypeRef::placeholder(p.clone()))
                .collect(),
        }
    }
}

/// Capability set the documentation core needs from a parsed source model.
pub trait SourceModelProvider {
    /// Looks a declared type up by qualified name, then by simple name
    fn find_type(&self, name: &str) -> Option<&TypeDecl>;

    /// Every executable member of the type, own members first, then inherited ones
    fn methods(&self, ty: &TypeRef) -> Vec<&MethodDecl>;

    fn constructors(&self, ty: &TypeRef) -> Vec<&ConstructorDecl>;

    fn tags(&self, ty: &TypeRef) -> Vec<&Tag>;

    fn supertype(&self, ty: &TypeRef) -> Option<TypeRef>;

    /// Actual generic arguments of a reference
    fn type_arguments(&self, ty: &TypeRef) -> Vec<TypeRef> {
        ty.args.clone()
    }

    fn source_position(&self, type_name: &str, method: &str) -> Option<SourcePosition>;

    /// Documentation comments of a method, empty when unknown
    fn source_comments(&self, type_name: &str, method: &str) -> Vec<String>;

    /// All declared types, in declaration order
    fn all_types(&self) -> Vec<&TypeDecl>;

    fn find_ref(&self, ty: &TypeRef) -> Option<&TypeDecl> {
        self.find_type(ty.qualified_name())
            .or_else(|| self.find_type(&ty.name))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ModelFile {
    #[serde(default)]
    types: Vec<TypeDecl>,
}

/// In-memory source model indexed by qualified and simple type names.
#[derive(Debug, Default)]
pub struct SourceModel {
    types: Vec<TypeDecl>,
    by_qualified: HashMap<String, usize>,
    by_simple: HashMap<String, usize>,
}

impl SourceModel {
    pub fn new(types: Vec<TypeDecl>) -> Self {
        let mut by_qualified = HashMap::new();
        let mut by_simple = HashMap::new();
        for (idx, decl) in types.iter().enumerate() {
            by_qualified
                .entry(decl.qualified_name().to_string())
                .or_insert(idx);
            by_simple.entry(decl.name.clone()).or_insert(idx);
        }
        debug!("Indexed source model with {} types", types.len());
        Self {
            types,
            by_qualified,
            by_simple,
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let file: ModelFile = serde_json::from_str(content)?;
        Ok(Self::new(file.types))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let file: ModelFile = serde_yaml::from_str(content)?;
        Ok(Self::new(file.types))
    }

    /// Loads a pre-built model; `.json` files are read as JSON, anything else as YAML
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let model = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        };
        model.map_err(|e| Error::ModelError(format!("{}: {}", path.display(), e)))
    }

    pub fn to_json(&self) -> Result<String> {
        let file = ModelFile {
            types: self.types.clone(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// Declared type chain starting at `ty`, following supertypes, cycle-safe
    fn hierarchy(&self, ty: &TypeRef) -> Vec<&TypeDecl> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.find_ref(ty);
        while let Some(decl) = current {
            if !seen.insert(decl.qualified_name().to_string()) {
                break;
            }
            chain.push(decl);
            current = decl.supertype.as_ref().and_then(|s| self.find_ref(s));
        }
        chain
    }
}

impl SourceModelProvider for SourceModel {
    fn find_type(&self, name: &str) -> Option<&TypeDecl> {
        self.by_qualified
            .get(name)
            .or_else(|| self.by_simple.get(name))
            .map(|idx| &self.types[*idx])
    }

    fn methods(&self, ty: &TypeRef) -> Vec<&MethodDecl> {
        self.hierarchy(ty)
            .into_iter()
            .flat_map(|decl| decl.methods.iter())
            .collect()
    }

    fn constructors(&self, ty: &TypeRef) -> Vec<&ConstructorDecl> {
        self.find_ref(ty)
            .map(|decl| decl.constructors.iter().collect())
            .unwrap_or_default()
    }

    fn tags(&self, ty: &TypeRef) -> Vec<&Tag> {
        self.find_ref(ty)
            .map(|decl| decl.tags.iter().collect())
            .unwrap_or_default()
    }

    fn supertype(&self, ty: &TypeRef) -> Option<TypeRef> {
        self.find_ref(ty).and_then(|decl| decl.supertype.clone())
    }

    fn source_position(&self, type_name: &str, method: &str) -> Option<SourcePosition> {
        let decl = self.find_type(type_name)?;
        decl.methods
            .iter()
            .find(|m| m.name == method)
            .and_then(|m| m.position.clone())
    }

    fn source_comments(&self, type_name: &str, method: &str) -> Vec<String> {
        self.find_type(type_name)
            .and_then(|decl| decl.methods.iter().find(|m| m.name == method))
            .map(|m| m.comments.clone())
            .unwrap_or_default()
    }

    fn all_types(&self) -> Vec<&TypeDecl> {
        self.types.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_tag_name() {
        assert_eq!(normalize_tag_name("RequestMapping"), "requestmapping");
        assert_eq!(normalize_tag_name("request_mapping"), "requestmapping");
        assert_eq!(normalize_tag_name("actix_web::get"), "get");
        assert_eq!(
            normalize_tag_name("org.springframework.web.bind.annotation.GetMapping"),
            "getmapping"
        );
    }

    #[test]
    fn test_tag_accessors() {
        let tag = Tag::new("request_param")
            .with("value", "page")
            .with("required", false)
            .with("produces", vec!["a", "b"]);

        assert!(tag.is("RequestParam"));
        assert_eq!(tag.text("value"), Some("page"));
        assert_eq!(tag.flag("required"), Some(false));
        assert_eq!(tag.texts("produces"), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(tag.text("produces"), Some("a"));
        assert!(tag.texts("missing").is_empty());
        assert!(tag.nested("value").is_empty());
    }

    #[test]
    fn test_inherited_methods_follow_supertype() {
        let base = TypeDecl::new("Base").with_method(MethodDecl::new("getId"));
        let child = TypeDecl::new("Child")
            .with_supertype(TypeRef::new("Base"))
            .with_method(MethodDecl::new("getName"));
        let model = SourceModel::new(vec![base, child]);

        let names: Vec<_> = model
            .methods(&TypeRef::new("Child"))
            .iter()
            .map(|m| m.name.clone())
            .collect();
        assert_eq!(names, vec!["getName", "getId"]);
    }

    #[test]
    fn test_cyclic_supertypes_terminate() {
        let a = TypeDecl::new("A").with_supertype(TypeRef::new("B"));
        let b = TypeDecl::new("B").with_supertype(TypeRef::new("A"));
        let model = SourceModel::new(vec![a, b]);

        assert!(model.methods(&TypeRef::new("A")).is_empty());
    }

    #[test]
    fn test_find_type_by_qualified_or_simple_name() {
        let decl = TypeDecl::new("InputDto").in_package("demo", ".");
        let model = SourceModel::new(vec![decl]);

        assert!(model.find_type("demo.InputDto").is_some());
        assert!(model.find_type("InputDto").is_some());
        assert!(model.find_type("Other").is_none());
    }

    #[test]
    fn test_source_comments_of_method() {
        let documented = MethodDecl {
            comments: vec!["Lists items".to_string()],
            ..MethodDecl::new("list")
        };
        let model = SourceModel::new(vec![TypeDecl::new("Api")
            .in_package("demo", ".")
            .with_method(documented)
            .with_method(MethodDecl::new("count"))]);

        assert_eq!(
            model.source_comments("demo.Api", "list"),
            vec!["Lists items".to_string()]
        );
        assert!(model.source_comments("demo.Api", "count").is_empty());
        assert!(model.source_comments("demo.Other", "list").is_empty());
    }

    #[test]
    fn test_yaml_model_loading() {
        let yaml = r#"
types:
  - name: DemoController
    qualified: demo.DemoController
    package: demo
    tags:
      - name: RestController
      - name: RequestMapping
        args:
          value: /serverPath
    methods:
      - name: getAll
        modifiers: { public: true }
        tags:
          - name: GetMapping
            args:
              value: [all]
          - name: CheckOneBefore
            args:
              value:
                - name: CheckBefore
                  args: { value: [a, b] }
        return_type:
          name: ResponseEntity
          args:
            - name: OutputDto
              package: demo
"#;
        let model = SourceModel::from_yaml(yaml).unwrap();
        let decl = model.find_type("demo.DemoController").unwrap();

        assert_eq!(decl.tags.len(), 2);
        assert_eq!(decl.tags[1].text("value"), Some("/serverPath"));
        let method = &decl.methods[0];
        assert!(method.modifiers.public);
        assert_eq!(method.tags[0].texts("value"), vec!["all".to_string()]);
        assert_eq!(method.tags[1].nested("value").len(), 1);
        assert_eq!(
            method.return_type.as_ref().unwrap().args[0].package.as_deref(),
            Some("demo")
        );
    }

    #[test]
    fn test_json_round_trip_keeps_index() {
        let model = SourceModel::new(vec![TypeDecl::new("Dto").in_package("crate::dto", "::")]);
        let json = model.to_json().unwrap();
        let reloaded = SourceModel::from_json(&json).unwrap();

        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.find_type("crate::dto::Dto").is_some());
    }
}
