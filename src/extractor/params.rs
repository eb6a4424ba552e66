//! Handler-method parameters bound to the request: path variables, query
//! variables and the request body.

use crate::model::{MethodDecl, ParamDecl, Tag, TypeRef};
use serde::Serialize;

const PATH_VARIABLE: &str = "PathVariable";
const QUERY_VARIABLE: &str = "RequestParam";
const REQUEST_BODY: &str = "RequestBody";

/// A variable bound to a path segment or a query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlVariable {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    pub required: bool,
    /// Literal default value (query variables only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl UrlVariable {
    /// Display name of the declared type
    pub fn type_name(&self) -> &str {
        &self.ty.name
    }

    /// `name=<default>` or `name=<Type>` for query strings
    pub fn query_fragment(&self) -> String {
        match &self.default_value {
            Some(default) => format!("{}={}", self.name, default),
            None => format!("{}=<{}>", self.name, self.type_name()),
        }
    }
}

fn find_tag<'a>(param: &'a ParamDecl, name: &str) -> Option<&'a Tag> {
    param.tags.iter().find(|t| t.is(name))
}

fn variable_name(tag: &Tag, param: &ParamDecl, index: usize) -> String {
    tag.text("value")
        .or_else(|| tag.text("name"))
        .filter(|n| !n.trim().is_empty())
        .map(str::to_string)
        .or_else(|| param.name.clone())
        .unwrap_or_else(|| format!("param{}", index))
}

/// Parameters tagged as bound to a path segment, in declaration order
pub fn path_variables(method: &MethodDecl) -> Vec<UrlVariable> {
    method
        .params
        .iter()
        .enumerate()
        .filter_map(|(index, param)| {
            let tag = find_tag(param, PATH_VARIABLE)?;
            Some(UrlVariable {
                name: variable_name(tag, param, index),
                ty: param.ty.clone(),
                required: tag.flag("required").unwrap_or(true),
                default_value: None,
            })
        })
        .collect()
}

/// Parameters tagged as bound to a query parameter, in declaration order
pub fn query_variables(method: &MethodDecl) -> Vec<UrlVariable> {
    method
        .params
        .iter()
        .enumerate()
        .filter_map(|(index, param)| {
            let tag = find_tag(param, QUERY_VARIABLE)?;
            let default_value = tag
                .text("default_value")
                .or_else(|| tag.text("defaultValue"))
                .map(str::to_string);
            Some(UrlVariable {
                name: variable_name(tag, param, index),
                ty: param.ty.clone(),
                required: tag.flag("required").unwrap_or(true),
                default_value,
            })
        })
        .collect()
}

/// First parameter carrying the request body
pub fn request_body(method: &MethodDecl) -> Option<&ParamDecl> {
    method
        .params
        .iter()
        .find(|param| find_tag(param, REQUEST_BODY).is_some())
}
