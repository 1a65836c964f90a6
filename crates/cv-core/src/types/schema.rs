//! Schema types: models, fields, relationships, and migration columns.
//!
//! A [`Model`]'s field list reflects the effective runtime shape of the entity.
//! When several sources describe the same field, precedence follows
//! [`FieldSource`]: migration-derived values override cast-derived values,
//! which override inferred defaults.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// The semantic type vocabulary for fields and columns.
///
/// # Examples
///
/// ```
/// use cv_core::FieldType;
///
/// assert_eq!(FieldType::DateTime.as_str(), "datetime");
/// assert!(FieldType::Decimal.is_numeric());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Whole numbers, including keys.
    Integer,
    /// Text of any length.
    String,
    /// True or false.
    Boolean,
    /// Floating point numbers.
    Float,
    /// Fixed precision numbers.
    Decimal,
    /// Calendar date.
    Date,
    /// Date and time.
    #[serde(rename = "datetime")]
    DateTime,
    /// Timestamp column.
    Timestamp,
    /// JSON document.
    Json,
    /// Decoded array.
    Array,
    /// Decoded collection.
    Collection,
    /// Decoded object.
    Object,
    /// Raw bytes.
    Binary,
}

impl FieldType {
    /// Returns the lower-case vocabulary name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Float => "float",
            Self::Decimal => "decimal",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Timestamp => "timestamp",
            Self::Json => "json",
            Self::Array => "array",
            Self::Collection => "collection",
            Self::Object => "object",
            Self::Binary => "binary",
        }
    }

    /// Returns `true` for integer, float, and decimal.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float | Self::Decimal)
    }

    /// Returns `true` for date, datetime, and timestamp.
    #[must_use]
    pub const fn is_temporal(self) -> bool {
        matches!(self, Self::Date | Self::DateTime | Self::Timestamp)
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a field's current type and nullability came from.
///
/// Ordered by precedence: a source may only be overwritten by a source that
/// compares greater or equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    /// Guaranteed framework column (`id`, `created_at`, `updated_at`).
    Implicit,
    /// Named in `$fillable`/`$hidden`; type not yet known.
    Inferred,
    /// Refined by the model's casts.
    Cast,
    /// Declared by a migration; ground truth.
    Migration,
}

/// A model field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Column name.
    pub name: String,
    /// Semantic type.
    pub field_type: FieldType,
    /// Whether the column accepts null.
    pub nullable: bool,
    /// Literal default value.
    pub default: Option<String>,
    /// Column comment.
    pub comment: Option<String>,
    /// Provenance of the type and nullability.
    pub source: FieldSource,
}

impl Field {
    /// Creates a field with no default or comment.
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: FieldType, source: FieldSource) -> Self {
        Self {
            name: name.into(),
            field_type,
            nullable: false,
            default: None,
            comment: None,
            source,
        }
    }
}

/// Coarse cardinality of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// One-to-one.
    OneToOne,
    /// One-to-many.
    OneToMany,
    /// Inverse side of one-to-one or one-to-many.
    ManyToOne,
    /// Many-to-many.
    ManyToMany,
}

/// The fixed relationship-kind vocabulary.
///
/// # Examples
///
/// ```
/// use cv_core::{Cardinality, RelationshipKind};
///
/// let kind = RelationshipKind::from_method("morphMany").unwrap();
/// assert!(kind.is_polymorphic());
/// assert_eq!(kind.cardinality(), Cardinality::OneToMany);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    /// `hasOne`
    HasOne,
    /// `hasMany`
    HasMany,
    /// `belongsTo`
    BelongsTo,
    /// `belongsToMany`
    BelongsToMany,
    /// `morphOne`
    MorphOne,
    /// `morphMany`
    MorphMany,
    /// `morphTo`
    MorphTo,
    /// `morphToMany`
    MorphToMany,
    /// `morphedByMany`
    MorphedByMany,
    /// `hasOneThrough`
    HasOneThrough,
    /// `hasManyThrough`
    HasManyThrough,
}

impl RelationshipKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 11] = [
        Self::HasOne,
        Self::HasMany,
        Self::BelongsTo,
        Self::BelongsToMany,
        Self::MorphOne,
        Self::MorphMany,
        Self::MorphTo,
        Self::MorphToMany,
        Self::MorphedByMany,
        Self::HasOneThrough,
        Self::HasManyThrough,
    ];

    /// Returns the builder method that declares this kind.
    #[must_use]
    pub const fn method_name(self) -> &'static str {
        match self {
            Self::HasOne => "hasOne",
            Self::HasMany => "hasMany",
            Self::BelongsTo => "belongsTo",
            Self::BelongsToMany => "belongsToMany",
            Self::MorphOne => "morphOne",
            Self::MorphMany => "morphMany",
            Self::MorphTo => "morphTo",
            Self::MorphToMany => "morphToMany",
            Self::MorphedByMany => "morphedByMany",
            Self::HasOneThrough => "hasOneThrough",
            Self::HasManyThrough => "hasManyThrough",
        }
    }

    /// Looks up a kind by its builder method name.
    #[must_use]
    pub fn from_method(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.method_name() == name)
    }

    /// Returns `true` for the polymorphic variants.
    #[must_use]
    pub const fn is_polymorphic(self) -> bool {
        matches!(
            self,
            Self::MorphOne | Self::MorphMany | Self::MorphTo | Self::MorphToMany | Self::MorphedByMany
        )
    }

    /// Returns `true` for the through variants.
    #[must_use]
    pub const fn is_through(self) -> bool {
        matches!(self, Self::HasOneThrough | Self::HasManyThrough)
    }

    /// Returns the cardinality seen from the declaring model.
    #[must_use]
    pub const fn cardinality(self) -> Cardinality {
        match self {
            Self::HasOne | Self::MorphOne | Self::HasOneThrough => Cardinality::OneToOne,
            Self::HasMany | Self::MorphMany | Self::HasManyThrough => Cardinality::OneToMany,
            Self::BelongsTo | Self::MorphTo => Cardinality::ManyToOne,
            Self::BelongsToMany | Self::MorphToMany | Self::MorphedByMany => Cardinality::ManyToMany,
        }
    }
}

/// A named association between two models.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relationship {
    /// Declaring method name.
    pub name: String,
    /// Relationship kind.
    pub kind: RelationshipKind,
    /// Related entity name, normalized; `None` for `morphTo`.
    pub related: Option<String>,
}

/// A data-model class with its effective field list.
///
/// The field list is de-duplicated by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    /// Class name.
    pub name: String,
    /// Backing table.
    pub table: String,
    /// Whether the table was declared rather than derived.
    pub table_explicit: bool,
    /// Ordered, de-duplicated fields.
    pub fields: Vec<Field>,
    /// Relationship methods in declaration order.
    pub relationships: Vec<Relationship>,
    /// Declaring file.
    pub file: Utf8PathBuf,
}

impl Model {
    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Looks up a relationship by method name.
    #[must_use]
    pub fn relationship(&self, name: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.name == name)
    }
}

/// A column declared by a migration, before merging into models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationColumn {
    /// Table the column belongs to.
    pub table: String,
    /// Column name.
    pub column: String,
    /// Semantic type.
    pub field_type: FieldType,
    /// Whether `nullable()` appeared in the modifier chain.
    pub nullable: bool,
    /// Literal from `default(...)`.
    pub default: Option<String>,
    /// Text from `comment(...)`.
    pub comment: Option<String>,
    /// Migration file that last defined the column.
    pub file: Utf8PathBuf,
}

/// A simplified table view used to validate `exists:`/`unique:` arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatabaseTable {
    /// Table name.
    pub name: String,
    /// Column names in declaration order.
    pub columns: Vec<String>,
}

impl DatabaseTable {
    /// Returns `true` if the table declares `column`.
    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_serialization() {
        assert_eq!(serde_json::to_string(&FieldType::DateTime).unwrap(), r#""datetime""#);
        assert_eq!(serde_json::to_string(&FieldType::Integer).unwrap(), r#""integer""#);
        let parsed: FieldType = serde_json::from_str(r#""datetime""#).unwrap();
        assert_eq!(parsed, FieldType::DateTime);
    }

    #[test]
    fn test_field_source_precedence() {
        assert!(FieldSource::Migration > FieldSource::Cast);
        assert!(FieldSource::Cast > FieldSource::Inferred);
        assert!(FieldSource::Inferred > FieldSource::Implicit);
    }

    #[test]
    fn test_relationship_kind_lookup() {
        for kind in RelationshipKind::ALL {
            assert_eq!(RelationshipKind::from_method(kind.method_name()), Some(kind));
        }
        assert_eq!(RelationshipKind::from_method("hasFew"), None);
    }

    #[test]
    fn test_relationship_kind_flags() {
        assert!(RelationshipKind::MorphTo.is_polymorphic());
        assert!(!RelationshipKind::HasMany.is_polymorphic());
        assert!(RelationshipKind::HasManyThrough.is_through());
        assert_eq!(RelationshipKind::BelongsTo.cardinality(), Cardinality::ManyToOne);
        assert_eq!(
            RelationshipKind::BelongsToMany.cardinality(),
            Cardinality::ManyToMany
        );
    }

    #[test]
    fn test_model_lookups() {
        let model = Model {
            name: "Post".to_owned(),
            table: "posts".to_owned(),
            table_explicit: false,
            fields: vec![Field::new("title", FieldType::String, FieldSource::Inferred)],
            relationships: vec![Relationship {
                name: "author".to_owned(),
                kind: RelationshipKind::BelongsTo,
                related: Some("User".to_owned()),
            }],
            file: Utf8PathBuf::from("app/Models/Post.php"),
        };
        assert!(model.field("title").is_some());
        assert!(model.field("body").is_none());
        assert_eq!(
            model.relationship("author").and_then(|r| r.related.as_deref()),
            Some("User")
        );
    }

    #[test]
    fn test_database_table_has_column() {
        let table = DatabaseTable {
            name: "users".to_owned(),
            columns: vec!["id".to_owned(), "email".to_owned()],
        };
        assert!(table.has_column("email"));
        assert!(!table.has_column("name"));
    }
}
