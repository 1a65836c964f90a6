//! Schema synthesis: migrations replayed into tables, merged into models.
//!
//! The migration pass runs first. Every migration's operations are replayed
//! in filename order into a [`TableSet`], so later migrations win. Each
//! model class is then merged with its table's columns by
//! [`synthesize_model`] under a fixed precedence:
//!
//! ```text
//! fillable/hidden (Inferred) < casts (Cast) < migration columns (Migration)
//! ```
//!
//! followed by the implicit `id`, `created_at` and `updated_at` fields.

use camino::{Utf8Path, Utf8PathBuf};
use cv_core::{
    DatabaseTable, Field, FieldSource, FieldType, FxHashMap, MigrationColumn, Model,
};
use cv_extract::model::cast_type;
use cv_extract::text::table_name_for;
use cv_extract::{MigrationOp, ModelClass};

/// Columns per table, built by replaying migration operations.
#[derive(Debug, Clone, Default)]
pub struct TableSet {
    order: Vec<String>,
    columns: FxHashMap<String, Vec<MigrationColumn>>,
}

impl TableSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one operation.
    ///
    /// - `CreateTable` starts the table from scratch
    /// - a `Column` replaces an earlier definition in place, or is appended
    /// - operations on unknown tables create them, since the creating
    ///   migration may live outside the project
    pub fn apply(&mut self, op: MigrationOp) {
        match op {
            MigrationOp::CreateTable { table } => {
                self.ensure(&table).clear();
            }
            MigrationOp::AlterTable { table } => {
                self.ensure(&table);
            }
            MigrationOp::DropTable { table } => {
                self.columns.remove(&table);
                self.order.retain(|t| *t != table);
            }
            MigrationOp::RenameTable { from, to } => {
                let mut columns = self.columns.remove(&from).unwrap_or_default();
                for column in &mut columns {
                    column.table.clone_from(&to);
                }
                self.order.retain(|t| *t != from && *t != to);
                self.order.push(to.clone());
                self.columns.insert(to, columns);
            }
            MigrationOp::Column(column) => {
                let columns = self.ensure(&column.table);
                match columns.iter_mut().find(|c| c.column == column.column) {
                    Some(existing) => *existing = column,
                    None => columns.push(column),
                }
            }
            MigrationOp::DropColumn { table, column } => {
                if let Some(columns) = self.columns.get_mut(&table) {
                    columns.retain(|c| c.column != column);
                }
            }
            MigrationOp::RenameColumn { table, from, to } => {
                if let Some(columns) = self.columns.get_mut(&table) {
                    columns.retain(|c| c.column != to);
                    if let Some(column) = columns.iter_mut().find(|c| c.column == from) {
                        column.column = to;
                    }
                }
            }
        }
    }

    fn ensure(&mut self, table: &str) -> &mut Vec<MigrationColumn> {
        if !self.columns.contains_key(table) {
            self.order.push(table.to_owned());
        }
        self.columns.entry(table.to_owned()).or_default()
    }

    /// Columns of `table`, in declaration order.
    #[must_use]
    pub fn columns(&self, table: &str) -> &[MigrationColumn] {
        self.columns.get(table).map_or(&[], Vec::as_slice)
    }

    /// Table names in first-seen order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.order
    }
}

/// Merges a model class with its table's migration columns.
///
/// # Examples
///
/// ```
/// use cv_index::schema::synthesize_model;
/// use cv_extract::ModelClass;
/// use cv_core::{FieldSource, FieldType};
/// use camino::Utf8Path;
///
/// let class = ModelClass {
///     name: "Post".to_owned(),
///     fillable: vec!["title".to_owned()],
///     casts: vec![("published_at".to_owned(), "datetime".to_owned())],
///     ..ModelClass::default()
/// };
/// let model = synthesize_model(&class, Utf8Path::new("app/Models/Post.php"), &[]);
///
/// assert_eq!(model.table, "posts");
/// let names: Vec<_> = model.fields.iter().map(|f| f.name.as_str()).collect();
/// assert_eq!(names, vec!["title", "published_at", "id", "created_at", "updated_at"]);
/// assert_eq!(model.field("published_at").map(|f| f.source), Some(FieldSource::Cast));
/// assert_eq!(model.field("id").map(|f| f.field_type), Some(FieldType::Integer));
/// ```
#[must_use]
pub fn synthesize_model(class: &ModelClass, file: &Utf8Path, columns: &[MigrationColumn]) -> Model {
    let mut fields: Vec<Field> = Vec::new();

    for name in &class.fillable {
        if field_mut(&mut fields, name).is_none() {
            fields.push(Field::new(name.as_str(), FieldType::String, FieldSource::Inferred));
        }
    }
    for name in &class.hidden {
        if field_mut(&mut fields, name).is_none() {
            fields.push(Field::new(name.as_str(), FieldType::String, FieldSource::Inferred));
        }
    }

    for (name, cast) in &class.casts {
        let refined = cast_type(cast);
        match (field_mut(&mut fields, name), refined) {
            (Some(field), Some(field_type)) => {
                field.field_type = field_type;
                field.source = FieldSource::Cast;
            }
            (Some(_), None) => {}
            (None, Some(field_type)) => {
                fields.push(Field::new(name.as_str(), field_type, FieldSource::Cast));
            }
            (None, None) => {
                fields.push(Field::new(name.as_str(), FieldType::String, FieldSource::Inferred));
            }
        }
    }

    for column in columns {
        match field_mut(&mut fields, &column.column) {
            Some(field) => {
                field.field_type = column.field_type;
                field.nullable = column.nullable;
                field.default.clone_from(&column.default);
                field.comment.clone_from(&column.comment);
                field.source = FieldSource::Migration;
            }
            None => fields.push(Field {
                name: column.column.clone(),
                field_type: column.field_type,
                nullable: column.nullable,
                default: column.default.clone(),
                comment: column.comment.clone(),
                source: FieldSource::Migration,
            }),
        }
    }

    for (name, field_type) in [
        ("id", FieldType::Integer),
        ("created_at", FieldType::DateTime),
        ("updated_at", FieldType::DateTime),
    ] {
        if field_mut(&mut fields, name).is_none() {
            fields.push(Field::new(name, field_type, FieldSource::Implicit));
        }
    }

    Model {
        name: class.name.clone(),
        table: model_table(class),
        table_explicit: class.table.is_some(),
        fields,
        relationships: class.relationships.clone(),
        file: file.to_owned(),
    }
}

/// The table a model class is backed by: explicit or derived from its name.
#[must_use]
pub fn model_table(class: &ModelClass) -> String {
    class
        .table
        .clone()
        .unwrap_or_else(|| table_name_for(&class.name))
}

fn field_mut<'a>(fields: &'a mut [Field], name: &str) -> Option<&'a mut Field> {
    fields.iter_mut().find(|f| f.name == name)
}

/// The synthesized schema: models plus the migration-derived tables.
#[derive(Debug, Clone, Default)]
pub struct SchemaTable {
    models: Vec<Model>,
    by_name: FxHashMap<String, usize>,
    by_table: FxHashMap<String, usize>,
    tables: Vec<DatabaseTable>,
    columns: FxHashMap<String, Vec<MigrationColumn>>,
}

impl SchemaTable {
    /// Merges every model class with the replayed migrations.
    ///
    /// Models keep the order of `classes`; tables are sorted by name. When
    /// two classes share a name, the first one is indexed by name.
    #[must_use]
    pub fn build(tables: TableSet, classes: &[(Utf8PathBuf, ModelClass)]) -> Self {
        let models: Vec<Model> = classes
            .iter()
            .map(|(file, class)| {
                let table = model_table(class);
                synthesize_model(class, file, tables.columns(&table))
            })
            .collect();

        let mut by_name = FxHashMap::default();
        let mut by_table = FxHashMap::default();
        for (index, model) in models.iter().enumerate() {
            by_name.entry(model.name.clone()).or_insert(index);
            by_table.entry(model.table.clone()).or_insert(index);
        }

        let mut database_tables: Vec<DatabaseTable> = tables
            .names()
            .iter()
            .map(|name| DatabaseTable {
                name: name.clone(),
                columns: tables.columns(name).iter().map(|c| c.column.clone()).collect(),
            })
            .collect();
        database_tables.sort_by(|a, b| a.name.cmp(&b.name));

        Self {
            models,
            by_name,
            by_table,
            tables: database_tables,
            columns: tables.columns,
        }
    }

    /// Looks up a model by class name.
    #[must_use]
    pub fn model(&self, name: &str) -> Option<&Model> {
        self.by_name.get(name).and_then(|&i| self.models.get(i))
    }

    /// Looks up the model backed by `table`.
    #[must_use]
    pub fn model_for_table(&self, table: &str) -> Option<&Model> {
        self.by_table.get(table).and_then(|&i| self.models.get(i))
    }

    /// Models whose name starts with `prefix`, sorted by name.
    #[must_use]
    pub fn models_with_prefix(&self, prefix: &str) -> Vec<&Model> {
        let mut models: Vec<&Model> = self
            .models
            .iter()
            .filter(|m| m.name.starts_with(prefix))
            .collect();
        models.sort_by(|a, b| a.name.cmp(&b.name));
        models
    }

    /// Every model.
    #[inline]
    #[must_use]
    pub fn all_models(&self) -> &[Model] {
        &self.models
    }

    /// Models reached through `name`'s relationships that exist in the index.
    #[must_use]
    pub fn related_models(&self, name: &str) -> Vec<&Model> {
        let Some(model) = self.model(name) else {
            return Vec::new();
        };
        let mut related: Vec<&Model> = Vec::new();
        for relationship in &model.relationships {
            let Some(target) = relationship.related.as_deref().and_then(|r| self.model(r)) else {
                continue;
            };
            if !related.iter().any(|m| m.name == target.name) {
                related.push(target);
            }
        }
        related
    }

    /// Looks up a migration-derived table.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&DatabaseTable> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Every migration-derived table, sorted by name.
    #[inline]
    #[must_use]
    pub fn tables(&self) -> &[DatabaseTable] {
        &self.tables
    }

    /// Table names, sorted.
    #[must_use]
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    /// Raw migration columns of `table`.
    #[must_use]
    pub fn columns(&self, table: &str) -> &[MigrationColumn] {
        self.columns.get(table).map_or(&[], Vec::as_slice)
    }
}
