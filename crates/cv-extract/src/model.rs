//! Model class extraction.
//!
//! Detection is permissive: a class counts as a model when it extends a known
//! model base, uses the `HasFactory` trait, or declares `$fillable`/`$table`.
//! Missing a model silently is worse than indexing an odd class.

use cv_core::{FieldType, Relationship, RelationshipKind};

use crate::error::ExtractError;
use crate::patterns;
use crate::php_array::{PhpItem, parse_array_at, string_pairs, string_values};
use crate::text::normalize_class_ref;

/// Base classes that mark a data model.
const MODEL_BASES: &[&str] = &["Model", "Authenticatable", "Pivot", "MorphPivot", "User"];

/// What a model class declares about itself, before schema merging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelClass {
    /// Class name.
    pub name: String,
    /// Explicit `$table`, if declared.
    pub table: Option<String>,
    /// Entries of `$fillable`.
    pub fillable: Vec<String>,
    /// Entries of `$hidden`.
    pub hidden: Vec<String>,
    /// `field => cast` pairs from `$casts` and `casts()`, in declaration order.
    pub casts: Vec<(String, String)>,
    /// Relationship methods in declaration order.
    pub relationships: Vec<Relationship>,
}

/// Maps a cast name to the semantic type it produces.
///
/// Parameterized casts (`decimal:2`, `datetime:Y-m-d`) are matched on their
/// base name. Returns `None` for casts that carry no type information, such as
/// custom cast classes.
///
/// # Examples
///
/// ```
/// use cv_extract::model::cast_type;
/// use cv_core::FieldType;
///
/// assert_eq!(cast_type("integer"), Some(FieldType::Integer));
/// assert_eq!(cast_type("decimal:2"), Some(FieldType::Decimal));
/// assert_eq!(cast_type("encrypted:array"), Some(FieldType::Array));
/// assert_eq!(cast_type("App\\Casts\\Money"), None);
/// ```
#[must_use]
pub fn cast_type(cast: &str) -> Option<FieldType> {
    let cast = cast.trim();
    if let Some(inner) = cast.strip_prefix("encrypted:") {
        return cast_type(inner);
    }
    let base = cast.split(':').next().unwrap_or(cast).to_ascii_lowercase();
    let field_type = match base.as_str() {
        "int" | "integer" => FieldType::Integer,
        "real" | "float" | "double" => FieldType::Float,
        "decimal" => FieldType::Decimal,
        "string" | "encrypted" | "hashed" => FieldType::String,
        "bool" | "boolean" => FieldType::Boolean,
        "object" => FieldType::Object,
        "array" => FieldType::Array,
        "json" => FieldType::Json,
        "collection" => FieldType::Collection,
        "date" | "immutable_date" => FieldType::Date,
        "datetime" | "immutable_datetime" | "custom_datetime" => FieldType::DateTime,
        "timestamp" => FieldType::Timestamp,
        _ => return None,
    };
    Some(field_type)
}

/// Extracts the model declared in `content`, if the file holds one.
///
/// Returns `Ok(None)` for files without a model class. Malformed array
/// literals in `$fillable`, `$hidden`, or the casts are reported as errors.
///
/// # Examples
///
/// ```
/// use cv_extract::model::extract_model;
///
/// let source = r#"<?php
/// class Post extends Model
/// {
///     protected $fillable = ['title', 'body'];
///
///     public function author()
///     {
///         return $this->belongsTo(\App\Models\User::class, 'author_id');
///     }
/// }
/// "#;
///
/// let model = extract_model(source)?.unwrap();
/// assert_eq!(model.name, "Post");
/// assert_eq!(model.fillable, vec!["title", "body"]);
/// assert_eq!(model.relationships[0].related.as_deref(), Some("User"));
/// # Ok::<(), cv_extract::ExtractError>(())
/// ```
pub fn extract_model(content: &str) -> Result<Option<ModelClass>, ExtractError> {
    let Some(class) = patterns::CLASS_DECL
        .captures_iter(content)
        .find(|caps| caps.get(1).is_none_or(|m| !m.as_str().starts_with("abstract")))
    else {
        return Ok(None);
    };
    let Some(name) = class.get(2) else {
        return Ok(None);
    };

    let extends_model = class.get(3).is_some_and(|base| {
        let base = normalize_class_ref(base.as_str());
        MODEL_BASES.contains(&base.as_str()) || base.ends_with("Model")
    });
    let table = patterns::TABLE_PROP.captures(content).map(|c| c[1].to_owned());
    let has_fillable = patterns::ARRAY_PROP
        .captures_iter(content)
        .any(|c| &c[1] == "fillable");

    let is_model = extends_model
        || patterns::HAS_FACTORY.is_match(content)
        || has_fillable
        || table.is_some();
    if !is_model {
        return Ok(None);
    }

    let mut model = ModelClass {
        name: name.as_str().to_owned(),
        table,
        ..ModelClass::default()
    };

    for caps in patterns::ARRAY_PROP.captures_iter(content) {
        let (Some(prop), Some(whole)) = (caps.get(1), caps.get(0)) else {
            continue;
        };
        let Some(items) = literal_at(content, whole.end())? else {
            continue;
        };
        match prop.as_str() {
            "fillable" => model.fillable.extend(string_values(&items)),
            "hidden" => model.hidden.extend(string_values(&items)),
            _ => model.casts.extend(string_pairs(&items)),
        }
    }

    if let Some(method) = patterns::CASTS_METHOD.find(content) {
        if let Some(items) = literal_at(content, method.end())? {
            model.casts.extend(string_pairs(&items));
        }
    }

    model.relationships = relationships(content);
    Ok(Some(model))
}

/// Parses the array literal at `offset`, or `None` when the value is not one.
fn literal_at(content: &str, offset: usize) -> Result<Option<Vec<PhpItem>>, ExtractError> {
    let rest = content[offset..].trim_start();
    let is_literal = rest.starts_with('[')
        || rest
            .get(..5)
            .is_some_and(|word| word.eq_ignore_ascii_case("array"));
    if !is_literal {
        return Ok(None);
    }
    parse_array_at(content, offset).map(Some)
}

/// Finds relationship methods: a method whose body calls `$this-><kind>(...)`.
fn relationships(content: &str) -> Vec<Relationship> {
    let methods: Vec<_> = patterns::METHOD_DECL.captures_iter(content).collect();
    let mut out = Vec::new();
    for (i, caps) in methods.iter().enumerate() {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let end = methods
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(content.len(), |m| m.start());
        let body = &content[whole.end()..end];

        let found = patterns::RELATION_CALL.captures_iter(body).find_map(|call| {
            let kind = RelationshipKind::from_method(&call[1])?;
            let related = match kind {
                RelationshipKind::MorphTo => None,
                _ => Some(normalize_class_ref(&call[2])).filter(|r| !r.is_empty()),
            };
            Some((kind, related))
        });
        if let Some((kind, related)) = found {
            out.push(Relationship {
                name: name.as_str().to_owned(),
                kind,
                related,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: &str = r#"<?php

namespace App\Models;

use Illuminate\Database\Eloquent\Factories\HasFactory;
use Illuminate\Foundation\Auth\User as Authenticatable;

class User extends Authenticatable
{
    use HasFactory, Notifiable;

    protected $fillable = [
        'name',
        'email',
        'password',
    ];

    protected $hidden = [
        'password',
        'remember_token',
    ];

    protected function casts(): array
    {
        return [
            'email_verified_at' => 'datetime',
            'password' => 'hashed',
            'settings' => AsArrayObject::class,
        ];
    }

    public function posts(): HasMany
    {
        return $this->hasMany(Post::class);
    }

    public function roles()
    {
        return $this->belongsToMany('App\Models\Role', 'role_user');
    }

    public function imageable()
    {
        return $this->morphTo();
    }

    public function getNameAttribute($value)
    {
        return ucfirst($value);
    }
}
"#;

    #[test]
    fn test_user_model() {
        let model = extract_model(USER).unwrap().unwrap();
        assert_eq!(model.name, "User");
        assert_eq!(model.table, None);
        assert_eq!(model.fillable, vec!["name", "email", "password"]);
        assert_eq!(model.hidden, vec!["password", "remember_token"]);
        assert_eq!(
            model.casts,
            vec![
                ("email_verified_at".to_owned(), "datetime".to_owned()),
                ("password".to_owned(), "hashed".to_owned()),
            ]
        );
    }

    #[test]
    fn test_relationships() {
        let model = extract_model(USER).unwrap().unwrap();
        let rels: Vec<_> = model
            .relationships
            .iter()
            .map(|r| (r.name.as_str(), r.kind, r.related.as_deref()))
            .collect();
        assert_eq!(
            rels,
            vec![
                ("posts", RelationshipKind::HasMany, Some("Post")),
                ("roles", RelationshipKind::BelongsToMany, Some("Role")),
                ("imageable", RelationshipKind::MorphTo, None),
            ]
        );
    }

    #[test]
    fn test_casts_property_and_explicit_table() {
        let source = "<?php\nclass Invoice extends Model {\n protected $table = 'billing_invoices';\n protected $casts = ['total' => 'decimal:2', 'paid' => 'boolean'];\n}";
        let model = extract_model(source).unwrap().unwrap();
        assert_eq!(model.table.as_deref(), Some("billing_invoices"));
        assert_eq!(model.casts.len(), 2);
    }

    #[test]
    fn test_detection_by_fillable_only() {
        let source = "<?php\nclass Legacy {\n protected $fillable = ['code'];\n}";
        assert!(extract_model(source).unwrap().is_some());
    }

    #[test]
    fn test_non_model_class() {
        let source = "<?php\nclass UserController extends Controller {\n public function index() { return view('users'); }\n}";
        assert!(extract_model(source).unwrap().is_none());
    }

    #[test]
    fn test_abstract_base_skipped() {
        let source = "<?php\nabstract class BaseModel extends Model {}\n";
        assert!(extract_model(source).unwrap().is_none());
    }

    #[test]
    fn test_non_literal_fillable_skipped() {
        let source = "<?php\nclass Tag extends Model {\n protected $fillable = self::FIELDS;\n}";
        let model = extract_model(source).unwrap().unwrap();
        assert!(model.fillable.is_empty());
    }

    #[test]
    fn test_malformed_fillable_is_error() {
        let source = "<?php\nclass Tag extends Model {\n protected $fillable = ['name', 'slug];\n}";
        assert!(extract_model(source).is_err());
    }

    #[test]
    fn test_cast_type_table() {
        assert_eq!(cast_type("bool"), Some(FieldType::Boolean));
        assert_eq!(cast_type("immutable_datetime"), Some(FieldType::DateTime));
        assert_eq!(cast_type("datetime:Y-m-d"), Some(FieldType::DateTime));
        assert_eq!(cast_type("collection"), Some(FieldType::Collection));
        assert_eq!(cast_type("json"), Some(FieldType::Json));
        assert_eq!(cast_type("timestamp"), Some(FieldType::Timestamp));
        assert_eq!(cast_type("encrypted"), Some(FieldType::String));
        assert_eq!(cast_type("unknown"), None);
    }
}
