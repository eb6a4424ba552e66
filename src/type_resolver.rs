//! Rust backend for the source model.
//!
//! Lowers the parsed files of a Rust project into a [`SourceModel`]:
//!
//! - every named `struct` becomes a [`TypeDecl`] whose package is the module
//!   path of its file (plus inline `mod` blocks);
//! - `pub` named fields are exposed as `get_<field>`/`set_<field>` accessors
//!   carrying the field attributes;
//! - functions of inherent `impl` blocks become methods, and receiver-less
//!   functions returning `Self` become constructors;
//! - attributes become tags, `#[extends(Base)]` declares a supertype and `///`
//!   comments become method documentation.

use crate::model::{
    ConstructorDecl, MethodDecl, Modifiers, ParamDecl, SourceModel, SourcePosition, Tag,
    TagValue, TypeDecl, TypeRef, TypeShape,
};
use crate::parser::ParsedFile;
use log::{debug, warn};
use std::collections::HashMap;
use syn::punctuated::Punctuated;
use syn::{
    Attribute, Expr, Fields, FnArg, GenericArgument, ImplItem, ImplItemFn, Item, Lit, Meta, Pat,
    PatType, PathArguments, ReturnType, Token, Type, Visibility,
};

const SEPARATOR: &str = "::";

/// Types documented through their first type argument
const WRAPPERS: [&str; 6] = ["Option", "Box", "Arc", "Rc", "Cow", "Result"];
const SEQUENCES: [&str; 6] = ["Vec", "VecDeque", "HashSet", "BTreeSet", "LinkedList", "IndexSet"];
const MAPPINGS: [&str; 3] = ["HashMap", "BTreeMap", "IndexMap"];
const TEXTS: [&str; 2] = ["String", "str"];
const PRIMITIVES: [&str; 16] = [
    "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128", "usize", "f32",
    "f64", "bool", "char",
];

/// `src/demo/api.rs` → `crate::demo::api`, `src/lib.rs` → `crate`
pub fn module_path(relative_path: &str) -> String {
    let trimmed = relative_path.strip_suffix(".rs").unwrap_or(relative_path);
    let mut segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();
    if segments.first() == Some(&"src") {
        segments.remove(0);
    }
    if matches!(segments.last(), Some(&"mod") | Some(&"lib") | Some(&"main")) {
        segments.pop();
    }
    std::iter::once("crate")
        .chain(segments)
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

struct StructSite<'a> {
    item: &'a syn::ItemStruct,
    package: String,
    file: &'a str,
}

struct ImplSite<'a> {
    item: &'a syn::ItemImpl,
    target: String,
    package: String,
    file: &'a str,
}

fn collect_items<'a>(
    items: &'a [Item],
    package: &str,
    file: &'a str,
    structs: &mut Vec<StructSite<'a>>,
    impls: &mut Vec<ImplSite<'a>>,
) {
    for item in items {
        match item {
            Item::Struct(item) => structs.push(StructSite {
                item,
                package: package.to_string(),
                file,
            }),
            Item::Impl(item) if item.trait_.is_none() => {
                if let Type::Path(self_ty) = &*item.self_ty {
                    if let Some(last) = self_ty.path.segments.last() {
                        impls.push(ImplSite {
                            item,
                            target: last.ident.to_string(),
                            package: package.to_string(),
                            file,
                        });
                    }
                }
            }
            Item::Mod(module) => {
                if let Some((_, inner)) = &module.content {
                    let nested = format!("{}{}{}", package, SEPARATOR, module.ident);
                    collect_items(inner, &nested, file, structs, impls);
                }
            }
            _ => {}
        }
    }
}

/// Builds a source model from parsed Rust files
pub struct TypeResolver {
    parsed_files: Vec<ParsedFile>,
}

impl TypeResolver {
    pub fn new(parsed_files: Vec<ParsedFile>) -> Self {
        debug!("Initializing TypeResolver with {} files", parsed_files.len());
        Self { parsed_files }
    }

    pub fn build(&self) -> SourceModel {
        let mut structs = Vec::new();
        let mut impls = Vec::new();
        for file in &self.parsed_files {
            let package = module_path(&file.relative_path);
            collect_items(
                &file.syntax_tree.items,
                &package,
                &file.relative_path,
                &mut structs,
                &mut impls,
            );
        }

        let mut declared: HashMap<String, String> = HashMap::new();
        let mut occurrences: HashMap<String, usize> = HashMap::new();
        for site in &structs {
            let name = site.item.ident.to_string();
            *occurrences.entry(name.clone()).or_default() += 1;
            if let Some(first) = declared.get(&name) {
                warn!(
                    "Struct {} declared in both {} and {}, references resolve to the first",
                    name, first, site.package
                );
            } else {
                declared.insert(name, site.package.clone());
            }
        }

        let types: Vec<TypeDecl> = structs
            .iter()
            .map(|site| {
                let name = site.item.ident.to_string();
                let unique = occurrences.get(&name).copied().unwrap_or(0) <= 1;
                let owned: Vec<&ImplSite> = impls
                    .iter()
                    .filter(|imp| imp.target == name && (unique || imp.package == site.package))
                    .collect();
                lower_struct(site, &owned, &declared)
            })
            .collect();

        debug!("Resolved {} struct(s) into the source model", types.len());
        SourceModel::new(types)
    }
}

/// Name resolution scope of one struct and its impl blocks
struct Scope<'a> {
    declared: &'a HashMap<String, String>,
    generics: Vec<String>,
    self_ref: TypeRef,
}

fn lower_struct(
    site: &StructSite,
    impls: &[&ImplSite],
    declared: &HashMap<String, String>,
) -> TypeDecl {
    let name = site.item.ident.to_string();
    let mut decl = TypeDecl::new(name.as_str()).in_package(site.package.as_str(), SEPARATOR);
    decl.type_params = site
        .item
        .generics
        .type_params()
        .map(|p| p.ident.to_string())
        .collect();
    decl.file = Some(site.file.to_string());
    decl.tags = attribute_tags(&site.item.attrs);

    let scope = Scope {
        declared,
        generics: decl.type_params.clone(),
        self_ref: decl.reference(),
    };
    decl.supertype = site
        .item
        .attrs
        .iter()
        .find(|attr| attr.path().is_ident("extends"))
        .and_then(|attr| attr.parse_args::<Type>().ok())
        .map(|ty| scope.type_ref(&ty));

    let qualified = decl.qualified_name().to_string();
    if let Fields::Named(fields) = &site.item.fields {
        for field in fields.named.iter().filter(|f| is_public(&f.vis)) {
            let Some(ident) = &field.ident else { continue };
            let field_name = unraw(ident);
            let ty = scope.type_ref(&field.ty);
            let template = MethodDecl {
                tags: attribute_tags(&field.attrs),
                declaring_type: Some(qualified.clone()),
                position: Some(position(site.file, ident)),
                comments: doc_comments(&field.attrs),
                ..MethodDecl::new(format!("get_{}", field_name))
            };
            decl.methods.push(template.clone().returning(ty.clone()));
            decl.methods.push(
                MethodDecl {
                    name: format!("set_{}", field_name),
                    ..template
                }
                .with_param(ParamDecl::new(field_name, ty)),
            );
        }
    }

    for imp in impls {
        for item in &imp.item.items {
            if let ImplItem::Fn(function) = item {
                scope.lower_fn(function, &qualified, imp.file, &mut decl);
            }
        }
    }

    debug!(
        "Lowered {} with {} method(s) and {} constructor(s)",
        qualified,
        decl.methods.len(),
        decl.constructors.len()
    );
    decl
}

impl Scope<'_> {
    fn lower_fn(&self, function: &ImplItemFn, qualified: &str, file: &str, decl: &mut TypeDecl) {
        let public = is_public(&function.vis);
        let has_receiver = function.sig.receiver().is_some();
        let params: Vec<ParamDecl> = function
            .sig
            .inputs
            .iter()
            .filter_map(|arg| match arg {
                FnArg::Typed(typed) => Some(self.param(typed)),
                FnArg::Receiver(_) => None,
            })
            .collect();

        if !has_receiver && self.returns_self(&function.sig.output) {
            decl.constructors.push(ConstructorDecl {
                modifiers: Modifiers {
                    public,
                    ..Modifiers::default()
                },
                params,
                tags: attribute_tags(&function.attrs),
            });
            return;
        }

        decl.methods.push(MethodDecl {
            name: function.sig.ident.to_string(),
            modifiers: Modifiers {
                public,
                is_static: !has_receiver,
                ..Modifiers::default()
            },
            params,
            return_type: match &function.sig.output {
                ReturnType::Default => None,
                ReturnType::Type(_, ty) => Some(self.type_ref(ty)),
            },
            tags: attribute_tags(&function.attrs),
            declaring_type: Some(qualified.to_string()),
            position: Some(position(file, &function.sig.ident)),
            comments: doc_comments(&function.attrs),
        });
    }

    fn returns_self(&self, output: &ReturnType) -> bool {
        let ReturnType::Type(_, ty) = output else {
            return false;
        };
        match &**ty {
            Type::Path(path) if path.qself.is_none() => path
                .path
                .segments
                .last()
                .map(|s| s.ident == "Self" || s.ident == self.self_ref.name.as_str())
                .unwrap_or(false),
            _ => false,
        }
    }

    fn param(&self, typed: &PatType) -> ParamDecl {
        let name = match &*typed.pat {
            Pat::Ident(pat) => Some(unraw(&pat.ident)),
            _ => None,
        };
        ParamDecl {
            name,
            ty: self.type_ref(&typed.ty),
            tags: attribute_tags(&typed.attrs),
            varargs: false,
        }
    }

    fn type_ref(&self, ty: &Type) -> TypeRef {
        match ty {
            Type::Reference(r) => self.type_ref(&r.elem),
            Type::Paren(p) => self.type_ref(&p.elem),
            Type::Group(g) => self.type_ref(&g.elem),
            Type::Slice(s) => TypeRef::sequence("slice", Some(self.type_ref(&s.elem))),
            Type::Array(a) => TypeRef::sequence("array", Some(self.type_ref(&a.elem))),
            Type::Tuple(t) if t.elems.is_empty() => TypeRef::primitive("()"),
            Type::Path(p) if p.qself.is_none() => self.path_ref(&p.path),
            _ => TypeRef::unknown_object(),
        }
    }

    fn path_ref(&self, path: &syn::Path) -> TypeRef {
        let Some(last) = path.segments.last() else {
            return TypeRef::unknown_object();
        };
        let name = last.ident.to_string();
        let single = path.segments.len() == 1;
        let mut args: Vec<TypeRef> = match &last.arguments {
            PathArguments::AngleBracketed(bracketed) => bracketed
                .args
                .iter()
                .filter_map(|arg| match arg {
                    GenericArgument::Type(ty) => Some(self.type_ref(ty)),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };

        let known = name.as_str();
        if single && known == "Self" {
            return self.self_ref.clone();
        }
        if WRAPPERS.contains(&known) {
            return args.into_iter().next().unwrap_or_else(TypeRef::unknown_object);
        }
        if SEQUENCES.contains(&known) {
            return TypeRef::sequence(name, args.into_iter().next());
        }
        if MAPPINGS.contains(&known) {
            return if args.len() == 2 {
                let value = args.remove(1);
                let key = args.remove(0);
                TypeRef::mapping(name, key, value)
            } else {
                TypeRef::new(name).with_shape(TypeShape::Mapping).with_args(args)
            };
        }
        if TEXTS.contains(&known) {
            return TypeRef::text(name);
        }
        if PRIMITIVES.contains(&known) {
            return TypeRef::primitive(name);
        }
        if single && self.generics.contains(&name) {
            return TypeRef::placeholder(name);
        }

        let leading: Vec<String> = path
            .segments
            .iter()
            .take(path.segments.len() - 1)
            .map(|s| s.ident.to_string())
            .collect();
        let local = single
            || matches!(
                leading.first().map(String::as_str),
                Some("crate") | Some("self") | Some("super")
            );
        if local {
            if let Some(package) = self.declared.get(&name) {
                return TypeRef::named(name, package.as_str(), SEPARATOR).with_args(args);
            }
        }
        if single {
            debug!("No declaration found for {}", name);
            return TypeRef::new(name).with_args(args);
        }
        TypeRef::named(name, leading.join(SEPARATOR), SEPARATOR).with_args(args)
    }
}

fn is_public(vis: &Visibility) -> bool {
    matches!(vis, Visibility::Public(_))
}

fn unraw(ident: &syn::Ident) -> String {
    let text = ident.to_string();
    text.strip_prefix("r#").map(str::to_string).unwrap_or(text)
}

fn position(file: &str, ident: &syn::Ident) -> SourcePosition {
    SourcePosition {
        file: file.to_string(),
        line: ident.span().start().line,
    }
}

fn path_string(path: &syn::Path) -> String {
    path.segments
        .iter()
        .map(|s| s.ident.to_string())
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

/// `///` lines joined into one comment
fn doc_comments(attrs: &[Attribute]) -> Vec<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(expr) => match &expr.lit {
                    Lit::Str(s) => Some(s.value().trim().to_string()),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        })
        .collect();
    let text = lines.join("\n").trim().to_string();
    if text.is_empty() {
        Vec::new()
    } else {
        vec![text]
    }
}

/// Every attribute except documentation, as tags
pub fn attribute_tags(attrs: &[Attribute]) -> Vec<Tag> {
    attrs
        .iter()
        .filter(|attr| !attr.path().is_ident("doc"))
        .map(attribute_tag)
        .collect()
}

fn attribute_tag(attr: &Attribute) -> Tag {
    let name = path_string(attr.path());
    match &attr.meta {
        Meta::Path(_) => Tag::new(name),
        Meta::List(_) => {
            match attr.parse_args_with(Punctuated::<Expr, Token![,]>::parse_terminated) {
                Ok(args) => tag_from_args(name, args.iter()),
                Err(e) => {
                    debug!("Arguments of #[{}] are not expressions: {}", name, e);
                    Tag::new(name)
                }
            }
        }
        Meta::NameValue(nv) => match expr_text(&nv.value) {
            Some(value) => Tag::new(name).with("value", value),
            None => Tag::new(name),
        },
    }
}

fn tag_from_args<'a>(name: String, args: impl Iterator<Item = &'a Expr>) -> Tag {
    let mut tag = Tag::new(name);
    let mut positional = Vec::new();
    let mut nested = Vec::new();

    for arg in args {
        match arg {
            Expr::Assign(assign) => {
                let key = expr_text(&assign.left);
                if let (Some(key), Some(value)) = (key, assign_value(&assign.right)) {
                    tag.args.insert(key, value);
                }
            }
            Expr::Call(call) => {
                if let Some(inner) = expr_text(&call.func) {
                    nested.push(tag_from_args(inner, call.args.iter()));
                }
            }
            Expr::Array(array) => positional.extend(array.elems.iter().filter_map(expr_text)),
            Expr::Path(path) => {
                tag.args.insert(path_string(&path.path), TagValue::Flag(true));
            }
            other => positional.extend(expr_text(other)),
        }
    }

    if !nested.is_empty() {
        tag.args.insert("value".to_string(), TagValue::Tags(nested));
    } else if positional.len() == 1 {
        tag.args
            .insert("value".to_string(), TagValue::Text(positional.remove(0)));
    } else if !positional.is_empty() {
        tag.args
            .insert("value".to_string(), TagValue::List(positional));
    }
    tag
}

fn assign_value(expr: &Expr) -> Option<TagValue> {
    match expr {
        Expr::Lit(lit) => match &lit.lit {
            Lit::Bool(b) => Some(TagValue::Flag(b.value)),
            _ => expr_text(expr).map(TagValue::Text),
        },
        Expr::Array(array) => Some(TagValue::List(
            array.elems.iter().filter_map(expr_text).collect(),
        )),
        _ => expr_text(expr).map(TagValue::Text),
    }
}

fn expr_text(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Lit(lit) => match &lit.lit {
            Lit::Str(s) => Some(s.value()),
            Lit::Int(i) => Some(i.base10_digits().to_string()),
            Lit::Float(f) => Some(f.base10_digits().to_string()),
            Lit::Bool(b) => Some(b.value.to_string()),
            Lit::Char(c) => Some(c.value().to_string()),
            _ => None,
        },
        Expr::Path(path) => Some(path_string(&path.path)),
        Expr::Paren(paren) => expr_text(&paren.expr),
        Expr::Group(group) => expr_text(&group.expr),
        _ => None,
    }
}
