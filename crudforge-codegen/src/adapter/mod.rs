//! Source adapters: normalize heterogeneous inputs into [`EntityInfo`]

pub mod ddl;
pub mod declaration;
pub mod openapi;
pub mod relational;
pub mod rust_source;

pub use ddl::{declarations_from_model, parse_ddl, parse_schema, TableMetadata};
pub use declaration::{
    summary_text, AttributeDecl, ClassDeclaration, DeclarationAdapter, DeclarationKind, PropertyDecl,
};
pub use openapi::{
    extract_entity, is_schema_document, load_document, object_schema_names, parse_document,
    SchemaDocumentAdapter, SchemaResolver,
};
pub use relational::{
    ColumnMapping, EntityMapping, ForeignKeyMapping, IndexMapping, MappingModel, RelationalAdapter,
};
pub use rust_source::parse_rust_source;

use serde_json::Value;
use std::path::Path;

use crate::error::ParseFailure;
use crate::model::EntityInfo;

/// Turns one kind of input into a canonical entity
pub trait SourceAdapter {
    type Input: ?Sized;

    fn extract(&self, input: &Self::Input) -> Result<EntityInfo, ParseFailure>;
}

/// One entity-producing input, tagged by the adapter that handles it
#[derive(Debug, Clone, Copy)]
pub enum SourceInput<'a> {
    /// A class declaration, resolved against the declarations of the run
    Declaration {
        declaration: &'a ClassDeclaration,
        context: &'a DeclarationAdapter,
    },
    /// A class declaration enriched with relationship metadata
    Relational {
        declaration: &'a ClassDeclaration,
        context: &'a DeclarationAdapter,
        model: &'a MappingModel,
    },
    /// A named object schema of a schema document
    SchemaDocument {
        document: &'a Value,
        schema: &'a str,
        path: &'a Path,
    },
}

/// Dispatch an input to its adapter
pub fn extract(input: SourceInput<'_>) -> Result<EntityInfo, ParseFailure> {
    match input {
        SourceInput::Declaration { declaration, context } => context.extract(declaration),
        SourceInput::Relational {
            declaration,
            context,
            model,
        } => {
            let declared = context.extract(declaration)?;
            RelationalAdapter::new(model).extract(&declared)
        }
        SourceInput::SchemaDocument { document, schema, path } => {
            SchemaDocumentAdapter::new(document, path).extract(schema)
        }
    }
}
