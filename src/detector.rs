use crate::config::DocConfig;
use crate::model::SourceModelProvider;
use log::debug;

/// Handler-class detector.
///
/// The `ControllerDetector` lists the declared types of a source model that carry
/// the controller tag (`RestController` / `#[rest_controller]` by default). These are
/// the classes handed to the registry.
pub struct ControllerDetector;

/// Result of handler-class detection.
#[derive(Debug, Default)]
pub struct DetectionResult {
    /// Qualified names of the detected handler classes, in declaration order
    pub controllers: Vec<String>,
}

impl ControllerDetector {
    /// Detects handler classes in the model.
    ///
    /// # Example
    ///
    /// ```
    /// use rest_doc_from_source::config::DocConfig;
    /// use rest_doc_from_source::detector::ControllerDetector;
    /// use rest_doc_from_source::model::{SourceModel, Tag, TypeDecl};
    ///
    /// let model = SourceModel::new(vec![
    ///     TypeDecl::new("Api").with_tag(Tag::new("RestController")),
    ///     TypeDecl::new("Dto"),
    /// ]);
    /// let result = ControllerDetector::detect(&model, &DocConfig::default());
    /// assert_eq!(result.controllers, vec!["Api".to_string()]);
    /// ```
    pub fn detect<P>(model: &P, config: &DocConfig) -> DetectionResult
    where
        P: SourceModelProvider + ?Sized,
    {
        let controllers: Vec<String> = model
            .all_types()
            .into_iter()
            .filter(|decl| decl.tags.iter().any(|t| t.is(&config.controller_tag)))
            .map(|decl| decl.qualified_name().to_string())
            .collect();

        debug!("Detected handler classes: {:?}", controllers);
        DetectionResult { controllers }
    }
}
