//! DDL front end: `CREATE TABLE` statements to a mapping model
//!
//! Parses MySQL DDL with `sqlparser-rs`, maps column types to canonical type
//! names and synthesizes declarations so that a schema file alone can feed
//! the declaration and relational adapters.

use sqlparser::ast::{
    ColumnOption, DataType, EnumMember as SqlEnumMember, Expr, ForeignKeyConstraint, Ident,
    IndexColumn, IndexConstraint, ObjectName, PrimaryKeyConstraint, Statement, TableConstraint,
    UniqueConstraint,
};
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::{Parser, ParserError};
use std::path::Path;

use super::declaration::{AttributeDecl, ClassDeclaration, DeclarationKind, PropertyDecl};
use super::relational::{ColumnMapping, EntityMapping, ForeignKeyMapping, IndexMapping, MappingModel};
use crate::codegen::{pluralize, singularize, to_enum_name, to_property_name, to_type_name};
use crate::error::ParseFailure;

/// A parsed table
#[derive(Debug, Clone)]
pub struct TableMetadata {
    pub name: String,
    pub columns: Vec<ColumnMetadata>,
    /// Indexes, excluding the primary key
    pub indexes: Vec<IndexMetadata>,
    pub foreign_keys: Vec<ForeignKeyMetadata>,
    pub primary_key: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ColumnMetadata {
    pub name: String,
    /// Data type as written, e.g. `BIGINT`, `VARCHAR(255)`
    pub data_type: String,
    pub nullable: bool,
    pub default_value: Option<String>,
    pub is_auto_increment: bool,
    pub is_unsigned: bool,
    pub enum_values: Option<Vec<String>>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IndexMetadata {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

#[derive(Debug, Clone)]
pub struct ForeignKeyMetadata {
    pub column_name: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

impl TableMetadata {
    pub fn get_column(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Parse `CREATE TABLE` statements; other statements are ignored
pub fn parse_schema(sql: &str) -> Result<Vec<TableMetadata>, ParserError> {
    let dialect = MySqlDialect {};
    let statements = Parser::parse_sql(&dialect, sql)?;

    let mut tables = Vec::new();
    for stmt in statements {
        if let Statement::CreateTable(create_table) = stmt {
            tables.push(extract_table_metadata(&create_table));
        }
    }
    Ok(tables)
}

/// Parse DDL into a mapping model
pub fn parse_ddl(sql: &str, path: &Path) -> Result<MappingModel, ParseFailure> {
    let tables = parse_schema(sql)
        .map_err(|e| ParseFailure::new(path.display().to_string(), e.to_string()))?;
    Ok(mapping_model(&tables))
}

/// Convert parsed tables into entity mappings
pub fn mapping_model(tables: &[TableMetadata]) -> MappingModel {
    let entities = tables
        .iter()
        .map(|table| {
            let name = entity_name(&table.name);
            let columns = table
                .columns
                .iter()
                .map(|col| column_mapping(&name, col))
                .collect();

            let keys = table.primary_key.iter().map(|c| to_property_name(c)).collect();
            let indexes = table
                .indexes
                .iter()
                .map(|idx| IndexMapping {
                    name: idx.name.clone(),
                    properties: idx.columns.iter().map(|c| to_property_name(c)).collect(),
                    is_unique: idx.unique,
                })
                .collect();
            let foreign_keys = table
                .foreign_keys
                .iter()
                .map(|fk| ForeignKeyMapping {
                    properties: vec![to_property_name(&fk.column_name)],
                    principal: entity_name(&fk.referenced_table),
                    principal_keys: vec![to_property_name(&fk.referenced_column)],
                    navigation: None,
                    inverse_navigation: None,
                    is_required: table.get_column(&fk.column_name).is_some_and(|c| !c.nullable),
                })
                .collect();

            EntityMapping {
                name,
                table: table.name.clone(),
                comment: None,
                columns,
                keys,
                indexes,
                foreign_keys,
            }
        })
        .collect::<Vec<_>>();

    let mut model = MappingModel { entities };
    name_navigations(&mut model);
    model
}

/// Singular PascalCase entity name of a table
pub fn entity_name(table: &str) -> String {
    to_type_name(&singularize(table))
}

fn column_mapping(entity: &str, col: &ColumnMetadata) -> ColumnMapping {
    let enum_type = col.enum_values.as_ref().map(|_| to_enum_name(entity, &col.name));
    ColumnMapping {
        property: to_property_name(&col.name),
        column: col.name.clone(),
        type_name: enum_type
            .clone()
            .unwrap_or_else(|| canonical_type(col).to_string()),
        is_nullable: col.nullable,
        max_length: char_length(&col.data_type),
        default_value: col.default_value.clone(),
        comment: col.comment.clone(),
        is_generated: col.is_auto_increment,
        enum_type,
        enum_values: col.enum_values.clone().unwrap_or_default(),
    }
}

/// Pick navigation names: `customer_id` -> `Customer` on the dependent,
/// `Orders` on the principal
fn name_navigations(model: &mut MappingModel) {
    for entity in &mut model.entities {
        let column_names: Vec<String> = entity.columns.iter().map(|c| c.property.clone()).collect();
        let principals: Vec<String> = entity.foreign_keys.iter().map(|fk| fk.principal.clone()).collect();
        for fk in &mut entity.foreign_keys {
            let Some(property) = fk.properties.first() else {
                continue;
            };
            let navigation = match property.strip_suffix("Id").filter(|n| !n.is_empty()) {
                Some(stem) => stem.to_string(),
                None => fk.principal.clone(),
            };
            if column_names.contains(&navigation) {
                continue;
            }
            let same_principal = principals.iter().filter(|p| **p == fk.principal).count();
            fk.inverse_navigation = Some(if same_principal > 1 {
                format!("{}{}", navigation, pluralize(&entity.name))
            } else {
                pluralize(&entity.name)
            });
            fk.navigation = Some(navigation);
        }
    }
}

/// Declarations for every mapped entity and every enum column.
///
/// Each foreign key yields a reference navigation on the dependent and a
/// collection on the principal; a pure join table instead gives both of
/// its principals a collection of the other.
pub fn declarations_from_model(model: &MappingModel, namespace: &str) -> Vec<ClassDeclaration> {
    let mut classes: Vec<ClassDeclaration> = Vec::new();
    let mut enums: Vec<ClassDeclaration> = Vec::new();

    for entity in &model.entities {
        let mut decl = ClassDeclaration::new(entity.name.clone(), namespace);
        decl.comment = entity.comment.clone();
        for col in &entity.columns {
            let nullable = if col.is_nullable { "?" } else { "" };
            let mut prop = PropertyDecl::new(col.property.clone(), format!("{}{}", col.type_name, nullable));
            prop.comment = col.comment.clone();
            prop.default_value = col.default_value.clone();
            if entity.keys.contains(&col.property) {
                prop.attributes.push(AttributeDecl::new("Key"));
            }
            if !col.is_nullable && !col.is_generated && col.default_value.is_none() {
                prop.attributes.push(AttributeDecl::new("Required"));
            }
            if let Some(max) = col.max_length {
                prop.attributes
                    .push(AttributeDecl::new("MaxLength").with_args(&[max.to_string().as_str()]));
            }
            decl.properties.push(prop);

            if let Some(enum_type) = &col.enum_type {
                if !enums.iter().any(|e| e.name == *enum_type) {
                    let mut enum_decl = ClassDeclaration::new(enum_type.clone(), namespace);
                    enum_decl.kind = DeclarationKind::Enum;
                    enum_decl.members = col.enum_values.clone();
                    enums.push(enum_decl);
                }
            }
        }
        for fk in &entity.foreign_keys {
            if let Some(navigation) = &fk.navigation {
                let nullable = if fk.is_required { "" } else { "?" };
                let mut prop = PropertyDecl::new(navigation.clone(), format!("{}{}", fk.principal, nullable));
                if let Some(column) = fk.properties.first() {
                    prop.attributes
                        .push(AttributeDecl::new("ForeignKey").with_args(&[column.as_str()]));
                }
                decl.properties.push(prop);
            }
        }
        classes.push(decl);
    }

    for entity in &model.entities {
        if entity.is_join_table() {
            let left = &entity.foreign_keys[0].principal;
            let right = &entity.foreign_keys[1].principal;
            add_collection(&mut classes, left, &pluralize(right), right);
            add_collection(&mut classes, right, &pluralize(left), left);
            continue;
        }
        for fk in &entity.foreign_keys {
            if let Some(inverse) = &fk.inverse_navigation {
                add_collection(&mut classes, &fk.principal, inverse, &entity.name);
            }
        }
    }

    classes.extend(enums);
    classes
}

fn add_collection(classes: &mut [ClassDeclaration], owner: &str, name: &str, element: &str) {
    if let Some(owner) = classes.iter_mut().find(|c| c.name == owner) {
        if owner.properties.iter().all(|p| p.name != name) {
            owner
                .properties
                .push(PropertyDecl::new(name, format!("List<{}>", element)));
        }
    }
}

/// Map a MySQL column type to a canonical type name
pub fn canonical_type(column: &ColumnMetadata) -> &'static str {
    let data_type = column.data_type.to_lowercase();
    let unsigned = column.is_unsigned;

    if is_boolean_type(&data_type) {
        return "bool";
    }
    if data_type.starts_with("tinyint") {
        return if unsigned { "byte" } else { "sbyte" };
    }
    if data_type.starts_with("smallint") {
        return if unsigned { "ushort" } else { "short" };
    }
    if data_type.starts_with("mediumint") || data_type.starts_with("int") {
        return if unsigned { "uint" } else { "int" };
    }
    if data_type.starts_with("bigint") {
        return if unsigned { "ulong" } else { "long" };
    }
    if data_type.starts_with("float") {
        return "float";
    }
    if data_type.starts_with("double") || data_type.starts_with("real") {
        return "double";
    }
    if data_type.starts_with("decimal") || data_type.starts_with("numeric") {
        return "decimal";
    }
    if data_type.starts_with("binary")
        || data_type.starts_with("varbinary")
        || data_type.contains("blob")
        || data_type.starts_with("bit")
    {
        return "List<byte>";
    }
    if data_type == "date" {
        return "DateOnly";
    }
    if data_type.starts_with("datetime") || data_type.starts_with("timestamp") {
        return "DateTime";
    }
    if data_type == "time" {
        return "TimeOnly";
    }
    if data_type == "json" {
        return "object";
    }
    "string"
}

/// BOOL, BOOLEAN, TINYINT(1) and BIT(1)
fn is_boolean_type(data_type: &str) -> bool {
    data_type == "bool"
        || data_type == "boolean"
        || (data_type.starts_with("tinyint") && data_type.contains("(1)"))
        || (data_type.starts_with("bit") && data_type.contains("(1)"))
}

/// Length of `CHAR(n)` / `VARCHAR(n)` columns
fn char_length(data_type: &str) -> Option<u32> {
    let lower = data_type.to_lowercase();
    if !(lower.starts_with("char") || lower.starts_with("varchar")) {
        return None;
    }
    let start = lower.find('(')? + 1;
    let end = start + lower[start..].find(')')?;
    lower[start..end].trim().parse().ok()
}

fn extract_table_metadata(create: &sqlparser::ast::CreateTable) -> TableMetadata {
    let name = extract_table_name(&create.name);

    let mut columns = Vec::new();
    let mut indexes = Vec::new();
    let mut foreign_keys = Vec::new();
    let mut primary_key = Vec::new();

    for col_def in &create.columns {
        let (column, col_pk, col_unique) = extract_column_metadata(col_def);
        if col_pk {
            primary_key = vec![column.name.clone()];
        }
        if col_unique {
            indexes.push(IndexMetadata {
                name: format!("{}_unique", column.name),
                columns: vec![column.name.clone()],
                unique: true,
            });
        }
        columns.push(column);
    }

    for constraint in &create.constraints {
        match constraint {
            TableConstraint::PrimaryKey(PrimaryKeyConstraint {
                columns: pk_cols, ..
            }) => {
                primary_key = pk_cols.iter().map(extract_ident_from_index_column).collect();
                for col_name in &primary_key {
                    if let Some(col) = columns.iter_mut().find(|c| c.name == *col_name) {
                        col.nullable = false;
                    }
                }
            }
            TableConstraint::Unique(UniqueConstraint {
                columns: uniq_cols,
                name,
                ..
            }) => {
                let cols: Vec<String> = uniq_cols.iter().map(extract_ident_from_index_column).collect();
                let idx_name = name
                    .as_ref()
                    .map(extract_ident)
                    .unwrap_or_else(|| format!("{}_unique", cols.first().cloned().unwrap_or_default()));
                indexes.push(IndexMetadata {
                    name: idx_name,
                    columns: cols,
                    unique: true,
                });
            }
            TableConstraint::Index(IndexConstraint {
                columns: idx_cols,
                name,
                ..
            }) => {
                let cols: Vec<String> = idx_cols.iter().map(extract_ident_from_index_column).collect();
                let idx_name = name
                    .as_ref()
                    .map(extract_ident)
                    .unwrap_or_else(|| format!("idx_{}", cols.first().cloned().unwrap_or_default()));
                indexes.push(IndexMetadata {
                    name: idx_name,
                    columns: cols,
                    unique: false,
                });
            }
            TableConstraint::ForeignKey(ForeignKeyConstraint {
                columns,
                foreign_table,
                referred_columns,
                ..
            }) => {
                for (col, ref_col) in columns.iter().zip(referred_columns.iter()) {
                    foreign_keys.push(ForeignKeyMetadata {
                        column_name: extract_ident(col),
                        referenced_table: extract_table_name(foreign_table),
                        referenced_column: extract_ident(ref_col),
                    });
                }
            }
            _ => {}
        }
    }

    TableMetadata {
        name,
        columns,
        indexes,
        foreign_keys,
        primary_key,
    }
}

/// Column metadata plus column-level PRIMARY KEY and UNIQUE markers
fn extract_column_metadata(col_def: &sqlparser::ast::ColumnDef) -> (ColumnMetadata, bool, bool) {
    let name = extract_ident(&col_def.name);
    let data_type = format!("{}", col_def.data_type);
    let enum_values = extract_enum_values(&col_def.data_type);
    let is_unsigned = data_type.to_uppercase().contains("UNSIGNED");

    let mut nullable = true;
    let mut default_value = None;
    let mut is_auto_increment = false;
    let mut col_is_primary = false;
    let mut col_is_unique = false;
    let mut comment = None;

    for option in &col_def.options {
        match &option.option {
            ColumnOption::NotNull => nullable = false,
            ColumnOption::Null => nullable = true,
            ColumnOption::Default(expr) => default_value = Some(format!("{}", expr)),
            ColumnOption::PrimaryKey(_) => {
                col_is_primary = true;
                nullable = false;
            }
            ColumnOption::Unique(_) => col_is_unique = true,
            ColumnOption::Comment(c) => comment = Some(c.clone()),
            ColumnOption::DialectSpecific(tokens) => {
                let token_str = tokens
                    .iter()
                    .map(|t| t.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
                    .to_uppercase();
                if token_str.contains("AUTO_INCREMENT") {
                    is_auto_increment = true;
                }
            }
            _ => {}
        }
    }

    let column = ColumnMetadata {
        name,
        data_type,
        nullable,
        default_value,
        is_auto_increment,
        is_unsigned,
        enum_values,
        comment,
    };
    (column, col_is_primary, col_is_unique)
}

fn extract_enum_values(data_type: &DataType) -> Option<Vec<String>> {
    match data_type {
        DataType::Enum(members, _) => Some(
            members
                .iter()
                .map(|m| match m {
                    SqlEnumMember::Name(s) => s.clone(),
                    SqlEnumMember::NamedValue(s, _) => s.clone(),
                })
                .collect(),
        ),
        _ => None,
    }
}

fn extract_table_name(name: &ObjectName) -> String {
    name.0
        .last()
        .and_then(|part| part.as_ident())
        .map(|ident| ident.value.clone())
        .unwrap_or_default()
}

fn extract_ident(ident: &Ident) -> String {
    ident.value.clone()
}

fn extract_ident_from_index_column(ic: &IndexColumn) -> String {
    match &ic.column.expr {
        Expr::Identifier(ident) => ident.value.clone(),
        other => format!("{}", other),
    }
}
