//! Knobs shared by the tag extractor, the structural walker and the assembler.

/// Recursion cap of the structural walker
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Documentation settings.
///
/// Every list holds names compared against simple or qualified type names,
/// except `opaque_prefixes` which are matched against the start of a package.
#[derive(Debug, Clone)]
pub struct DocConfig {
    /// Depth at which nodes are forced to be leaves
    pub max_depth: usize,
    /// Packages whose types are never expanded (framework and standard library)
    pub opaque_prefixes: Vec<String>,
    /// Prefixes of response accessors (`getName`, `isActive`)
    pub getter_prefixes: Vec<String>,
    /// Prefix of request mutators (`setName`)
    pub setter_prefix: String,
    /// The universal base type; accessors declared on it are never documented
    pub universal_base: Vec<String>,
    /// Hypermedia wrapper bases; direct subtypes document no members
    pub hypermedia_bases: Vec<String>,
    /// Return-type envelopes whose single type argument is the documented response
    pub success_envelopes: Vec<String>,
    /// Tag marking a type as a handler class
    pub controller_tag: String,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl Default for DocConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            opaque_prefixes: strings(&[
                "org.springframework",
                "java",
                "com.sun",
                "sun",
                "std",
                "core",
                "alloc",
            ]),
            getter_prefixes: strings(&["get", "is"]),
            setter_prefix: "set".to_string(),
            universal_base: strings(&["java.lang.Object", "Object"]),
            hypermedia_bases: strings(&[
                "org.springframework.hateoas.RepresentationModel",
                "RepresentationModel",
            ]),
            success_envelopes: strings(&[
                "org.springframework.http.ResponseEntity",
                "ResponseEntity",
                "Json",
            ]),
            controller_tag: "RestController".to_string(),
        }
    }
}

impl DocConfig {
    /// Appends extra opaque package prefixes, skipping duplicates
    pub fn with_opaque_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for prefix in prefixes {
            let prefix = prefix.into();
            if !self.opaque_prefixes.contains(&prefix) {
                self.opaque_prefixes.push(prefix);
            }
        }
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn is_opaque_package(&self, package: &str) -> bool {
        self.opaque_prefixes
            .iter()
            .any(|prefix| package.starts_with(prefix.as_str()))
    }
}
