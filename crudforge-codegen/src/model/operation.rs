//! API operations read from schema documents

use serde::Serialize;

use super::type_meta::{TypeMeta, TypeTable};

/// Where an operation parameter is carried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterInfo {
    /// Name on the wire
    pub name: String,
    pub location: ParameterLocation,
    pub type_meta: TypeMeta,
    pub is_required: bool,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestBody {
    pub type_meta: TypeMeta,
    /// `application/json` or `multipart/form-data`
    pub content_type: String,
    pub is_required: bool,
}

impl RequestBody {
    pub fn is_multipart(&self) -> bool {
        self.content_type.starts_with("multipart/")
    }
}

/// One path + method pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationInfo {
    pub operation_id: Option<String>,
    /// Upper-case HTTP method
    pub method: String,
    pub path: String,
    /// First tag, or `Default`
    pub tag: String,
    pub summary: Option<String>,
    pub parameters: Vec<ParameterInfo>,
    pub request_body: Option<RequestBody>,
    /// Body type of the first 2xx JSON response
    pub response: Option<TypeMeta>,
}

impl OperationInfo {
    pub fn parameters_in(&self, location: ParameterLocation) -> impl Iterator<Item = &ParameterInfo> {
        self.parameters.iter().filter(move |p| p.location == location)
    }

    /// Every type the operation's signature mentions
    pub fn signature_types(&self) -> impl Iterator<Item = &TypeMeta> {
        self.parameters
            .iter()
            .map(|p| &p.type_meta)
            .chain(self.request_body.iter().map(|b| &b.type_meta))
            .chain(self.response.iter())
    }
}

/// A parsed schema document: its named types and its operations
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApiDocument {
    pub title: String,
    pub version: String,
    pub types: TypeTable,
    pub operations: Vec<OperationInfo>,
}

impl ApiDocument {
    /// Distinct tags in first-seen order
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for op in &self.operations {
            if !tags.contains(&op.tag) {
                tags.push(op.tag.clone());
            }
        }
        tags
    }

    pub fn operations_for<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a OperationInfo> {
        self.operations.iter().filter(move |op| op.tag == tag)
    }
}
