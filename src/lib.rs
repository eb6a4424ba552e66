//! REST doc generator - Endpoint documentation from annotated handler source code.
//!
//! This library documents the REST endpoints of a code base by static analysis.
//! Handler classes carry a controller tag; their route tags, access tags and
//! parameter tags are merged into one [`endpoint_builder::EndpointDescriptor`]
//! per handler method, and the request/response payload types are walked into
//! bounded structural trees.
//!
//! # Architecture
//!
//! 1. [`model`] - The declaration model every other module reads
//! 2. [`scanner`], [`parser`], [`type_resolver`] - Build a model from a Rust project
//! 3. [`detector`] - Finds the handler classes
//! 4. [`extractor`] - Route, access and parameter tags
//! 5. [`structure`] - Structural walk of payload types
//! 6. [`endpoint_builder`] - Merges class and method metadata into descriptors
//! 7. [`registry`] - Idempotent, thread-safe store of handler classes
//! 8. [`serializer`] - Markdown, JSON and YAML output
//!
//! # Example Usage
//!
//! ```no_run
//! use rest_doc_from_source::{
//!     config::DocConfig,
//!     detector::ControllerDetector,
//!     parser::AstParser,
//!     registry::EndpointRegistry,
//!     scanner::FileScanner,
//!     serializer::{serialize_markdown, DEFAULT_BASE_URL},
//!     type_resolver::TypeResolver,
//! };
//! use std::path::PathBuf;
//!
//! let scan_result = FileScanner::new(PathBuf::from("./my-project")).scan().unwrap();
//! let parsed_files = AstParser::parse_files(&scan_result.rust_files);
//! let model = TypeResolver::new(parsed_files).build();
//!
//! let config = DocConfig::default();
//! let registry = EndpointRegistry::new();
//! for class in ControllerDetector::detect(&model, &config).controllers {
//!     registry.register(&model, &config, &class);
//! }
//!
//! let endpoints = registry.document(&model, &config);
//! println!("{}", serialize_markdown(&endpoints, DEFAULT_BASE_URL));
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module which provides a complete CLI application.

pub mod cli;
pub mod config;
pub mod detector;
pub mod endpoint_builder;
pub mod error;
pub mod extractor;
pub mod model;
pub mod parser;
pub mod registry;
pub mod scanner;
pub mod serializer;
pub mod structure;
pub mod type_resolver;
