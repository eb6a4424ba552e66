//! Handler-class registry.
//!
//! [`EndpointRegistry`] is an explicitly constructed store mapping handler
//! class identity to its class-level metadata. Registration is an idempotent
//! insert-if-absent and may run concurrently: the class-level tags of a given
//! class are extracted at most once, whatever the number of callers.

use crate::config::DocConfig;
use crate::endpoint_builder::{EndpointAssembler, EndpointDescriptor};
use crate::extractor::TagExtraction;
use crate::model::{SourceModelProvider, TypeDecl};
use dashmap::DashMap;
use log::{debug, error, info};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Class-level metadata of one handler class, extracted once at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMetadata {
    pub qualified_name: String,
    pub simple_name: String,
    /// Relative path of the declaring file, when known
    pub source_file: Option<String>,
    pub extraction: TagExtraction,
}

impl ClassMetadata {
    pub fn extract(decl: &TypeDecl) -> Self {
        Self {
            qualified_name: decl.qualified_name().to_string(),
            simple_name: decl.name.clone(),
            source_file: decl.file.clone(),
            extraction: TagExtraction::from_tags(&decl.tags),
        }
    }

    /// `demo.Api` → `demo/Api`, used when no source file is known
    pub fn fallback_path(&self) -> String {
        self.qualified_name.replace("::", "/").replace('.', "/")
    }
}

/// Concurrency-safe store of registered handler classes.
#[derive(Debug, Default)]
pub struct EndpointRegistry {
    classes: DashMap<String, ClassMetadata>,
    extractions: AtomicUsize,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `class_name` if the model declares it with the controller tag.
    ///
    /// Returns `true` when the class is (or already was) registered.
    pub fn register<P>(&self, model: &P, config: &DocConfig, class_name: &str) -> bool
    where
        P: SourceModelProvider + ?Sized,
    {
        let Some(decl) = model.find_type(class_name) else {
            debug!("{} is not declared in the source model", class_name);
            return false;
        };
        if !decl.tags.iter().any(|t| t.is(&config.controller_tag)) {
            debug!("{} is not a handler class", class_name);
            return false;
        }

        self.classes
            .entry(decl.qualified_name().to_string())
            .or_insert_with(|| {
                self.extractions.fetch_add(1, Ordering::SeqCst);
                debug!("Extracting class-level metadata of {}", decl.qualified_name());
                ClassMetadata::extract(decl)
            });
        true
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn contains(&self, qualified_name: &str) -> bool {
        self.classes.contains_key(qualified_name)
    }

    /// Number of class-level extractions performed so far
    pub fn extraction_count(&self) -> usize {
        self.extractions.load(Ordering::SeqCst)
    }

    /// Registered classes ordered by qualified name
    pub fn classes(&self) -> Vec<ClassMetadata> {
        let mut classes: Vec<ClassMetadata> =
            self.classes.iter().map(|entry| entry.value().clone()).collect();
        classes.sort_by(|l, r| l.qualified_name.cmp(&r.qualified_name));
        classes
    }

    /// Assembles every endpoint of every registered class, ordered by paths then verbs
    pub fn document<P>(&self, model: &P, config: &DocConfig) -> Vec<EndpointDescriptor>
    where
        P: SourceModelProvider + ?Sized,
    {
        let assembler = EndpointAssembler::new(model, config);
        let mut endpoints: Vec<EndpointDescriptor> = self
            .classes()
            .iter()
            .flat_map(|class| assembler.assemble_class(class))
            .collect();
        endpoints.sort_by_cached_key(EndpointDescriptor::sort_key);

        let mut reported = HashSet::new();
        for diagnostic in endpoints.iter().flat_map(|e| e.diagnostics.iter()) {
            if reported.insert(diagnostic.type_name.as_str()) {
                error!("{}", diagnostic.message);
            }
        }

        info!(
            "Documented {} endpoint(s) from {} handler class(es)",
            endpoints.len(),
            self.len()
        );
        endpoints
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MethodDecl, SourceModel, Tag, TypeDecl};
    use pretty_assertions::assert_eq;

    fn controller(name: &str, methods: Vec<MethodDecl>) -> TypeDecl {
        methods.into_iter().fold(
            TypeDecl::new(name)
                .in_package("demo", ".")
                .with_tag(Tag::new("RestController")),
            TypeDecl::with_method,
        )
    }

    fn get(name: &str, path: &str) -> MethodDecl {
        MethodDecl::new(name).with_tag(Tag::new("GetMapping").with("value", path))
    }

    #[test]
    fn test_sequential_registration_is_idempotent() {
        let model = SourceModel::new(vec![controller("Api", vec![get("list", "/items")])]);
        let config = DocConfig::default();
        let registry = EndpointRegistry::new();

        assert!(registry.register(&model, &config, "demo.Api"));
        assert!(registry.register(&model, &config, "Api"));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.extraction_count(), 1);
        assert!(registry.contains("demo.Api"));
    }

    #[test]
    fn test_concurrent_registration_extracts_once() {
        let model = SourceModel::new(vec![controller("Api", vec![get("list", "/items")])]);
        let config = DocConfig::default();
        let registry = EndpointRegistry::new();

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        registry.register(&model, &config, "demo.Api");
                    }
                });
            }
        });

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.extraction_count(), 1);
    }

    #[test]
    fn test_only_tagged_classes_are_registered() {
        let plain = TypeDecl::new("Helper")
            .in_package("demo", ".")
            .with_method(get("list", "/items"));
        let model = SourceModel::new(vec![plain]);
        let config = DocConfig::default();
        let registry = EndpointRegistry::new();

        assert!(!registry.register(&model, &config, "demo.Helper"));
        assert!(!registry.register(&model, &config, "demo.Unknown"));
        assert!(registry.is_empty());
        assert_eq!(registry.extraction_count(), 0);
    }

    #[test]
    fn test_endpoints_sorted_by_path_then_verb() {
        let model = SourceModel::new(vec![
            controller(
                "Zeta",
                vec![
                    get("b", "/b"),
                    MethodDecl::new("a_post").with_tag(Tag::new("PostMapping").with("value", "/a")),
                ],
            ),
            controller("Alpha", vec![get("a_get", "/a")]),
        ]);
        let config = DocConfig::default();
        let registry = EndpointRegistry::new();
        registry.register(&model, &config, "demo.Zeta");
        registry.register(&model, &config, "demo.Alpha");

        let order: Vec<_> = registry
            .document(&model, &config)
            .iter()
            .map(|e| e.method_name.clone())
            .collect();
        assert_eq!(order, vec!["a_get", "a_post", "b"]);
    }

    #[test]
    fn test_equal_keys_keep_a_stable_order() {
        let model = SourceModel::new(vec![controller(
            "Api",
            vec![
                MethodDecl::new("first")
                    .with_tag(Tag::new("GetMapping").with("name", "One").with("value", "/same")),
                MethodDecl::new("second")
                    .with_tag(Tag::new("GetMapping").with("name", "Two").with("value", "/same")),
            ],
        )]);
        let config = DocConfig::default();
        let registry = EndpointRegistry::new();
        registry.register(&model, &config, "demo.Api");

        for _ in 0..5 {
            let names: Vec<_> = registry
                .document(&model, &config)
                .into_iter()
                .map(|e| e.names)
                .collect();
            assert_eq!(names, vec!["One", "Two"]);
        }
    }
}
