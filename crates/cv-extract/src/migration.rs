//! Schema migration extraction.
//!
//! Only the `up()` method of a migration is read; its `Schema::create` and
//! `Schema::table` blocks are scanned for blueprint call chains of the form
//! `$table-><verb>('<column>'[, <args>])<modifiers>;`. The result is an ordered
//! list of [`MigrationOp`]s that the schema synthesizer replays across every
//! migration file in filename order.

use camino::Utf8Path;
use cv_core::{FieldType, MigrationColumn};

use crate::patterns;
use crate::text::{normalize_class_ref, quoted_strings, snake_case, strip_quotes};

/// One schema change, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOp {
    /// `Schema::create`; starts the table from scratch.
    CreateTable {
        /// Table name.
        table: String,
    },
    /// `Schema::table`; modifies an existing table.
    AlterTable {
        /// Table name.
        table: String,
    },
    /// `Schema::drop` or `Schema::dropIfExists`.
    DropTable {
        /// Table name.
        table: String,
    },
    /// `Schema::rename`.
    RenameTable {
        /// Old name.
        from: String,
        /// New name.
        to: String,
    },
    /// A column definition; replaces any earlier definition of the same column.
    Column(MigrationColumn),
    /// `$table->dropColumn(...)` and its convenience forms.
    DropColumn {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },
    /// `$table->renameColumn('from', 'to')`.
    RenameColumn {
        /// Table name.
        table: String,
        /// Old column name.
        from: String,
        /// New column name.
        to: String,
    },
}

/// Maps a blueprint column verb to its semantic type.
///
/// Returns `None` for verbs that do not declare a typed column (indexes,
/// foreign keys, conveniences handled separately).
///
/// # Examples
///
/// ```
/// use cv_extract::migration::column_type;
/// use cv_core::FieldType;
///
/// assert_eq!(column_type("foreignId"), Some(FieldType::Integer));
/// assert_eq!(column_type("jsonb"), Some(FieldType::Json));
/// assert_eq!(column_type("index"), None);
/// ```
#[must_use]
pub fn column_type(verb: &str) -> Option<FieldType> {
    let field_type = match verb {
        "string" | "char" | "text" | "tinyText" | "mediumText" | "longText" | "uuid" | "ulid"
        | "enum" | "set" | "ipAddress" | "macAddress" | "time" | "timeTz" => FieldType::String,
        "id" | "increments" | "tinyIncrements" | "smallIncrements" | "mediumIncrements"
        | "bigIncrements" | "integer" | "tinyInteger" | "smallInteger" | "mediumInteger"
        | "bigInteger" | "unsignedInteger" | "unsignedTinyInteger" | "unsignedSmallInteger"
        | "unsignedMediumInteger" | "unsignedBigInteger" | "foreignId" | "year" => {
            FieldType::Integer
        }
        "decimal" | "unsignedDecimal" => FieldType::Decimal,
        "float" | "double" => FieldType::Float,
        "boolean" => FieldType::Boolean,
        "date" => FieldType::Date,
        "dateTime" | "dateTimeTz" => FieldType::DateTime,
        "timestamp" | "timestampTz" => FieldType::Timestamp,
        "json" | "jsonb" => FieldType::Json,
        "binary" => FieldType::Binary,
        _ => return None,
    };
    Some(field_type)
}

/// Extracts the schema operations of a migration's `up()` method.
///
/// # Examples
///
/// ```
/// use cv_extract::migration::{extract_migration, MigrationOp};
/// use camino::Utf8Path;
///
/// let source = r#"
/// public function up(): void
/// {
///     Schema::create('orders', function (Blueprint $table) {
///         $table->id();
///         $table->string('status')->default('pending');
///         $table->timestamps();
///     });
/// }
/// "#;
///
/// let ops = extract_migration(source, Utf8Path::new("2024_01_01_create_orders.php"));
/// let columns: Vec<_> = ops
///     .iter()
///     .filter_map(|op| match op {
///         MigrationOp::Column(c) => Some(c.column.as_str()),
///         _ => None,
///     })
///     .collect();
/// assert_eq!(columns, vec!["id", "status", "created_at", "updated_at"]);
/// ```
#[must_use]
pub fn extract_migration(content: &str, file: &Utf8Path) -> Vec<MigrationOp> {
    let body = up_body(content);
    let calls: Vec<_> = patterns::SCHEMA_CALL.captures_iter(body).collect();
    let mut ops = Vec::new();

    for (i, caps) in calls.iter().enumerate() {
        let (Some(whole), Some(kind), Some(table)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        let table = table.as_str().to_owned();
        let region_end = calls
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(body.len(), |m| m.start());
        let region = &body[whole.end()..region_end];

        match kind.as_str() {
            "create" => {
                ops.push(MigrationOp::CreateTable { table: table.clone() });
                blueprint_ops(region, &table, file, &mut ops);
            }
            "table" => {
                ops.push(MigrationOp::AlterTable { table: table.clone() });
                blueprint_ops(region, &table, file, &mut ops);
            }
            "rename" => {
                if let Some(to) = caps.get(3) {
                    ops.push(MigrationOp::RenameTable {
                        from: table,
                        to: to.as_str().to_owned(),
                    });
                }
            }
            _ => ops.push(MigrationOp::DropTable { table }),
        }
    }

    ops
}

/// Returns the text of the `up()` method, or the whole file when absent.
fn up_body(content: &str) -> &str {
    let Some(up) = patterns::UP_METHOD.find(content) else {
        return content;
    };
    let rest = &content[up.end()..];
    let end = patterns::DOWN_METHOD.find(rest).map_or(rest.len(), |m| m.start());
    &rest[..end]
}

/// A single `->name(args)` link of a call chain.
#[derive(Debug)]
struct Call<'a> {
    name: &'a str,
    args: &'a str,
}

fn blueprint_ops(region: &str, table: &str, file: &Utf8Path, ops: &mut Vec<MigrationOp>) {
    let mut consumed = 0;
    for caps in patterns::BLUEPRINT_CALL.captures_iter(region) {
        let (Some(whole), Some(var)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() < consumed || var.as_str() == "this" {
            continue;
        }
        let start = var.end();
        let (chain, end) = call_chain(region, start);
        consumed = end;
        let Some((verb, modifiers)) = chain.split_first() else {
            continue;
        };
        apply_chain(verb, modifiers, table, file, ops);
    }
}

fn apply_chain(
    verb: &Call<'_>,
    modifiers: &[Call<'_>],
    table: &str,
    file: &Utf8Path,
    ops: &mut Vec<MigrationOp>,
) {
    let args = split_args(verb.args);
    let first = args.first().map(|a| strip_quotes(a)).filter(|a| !a.is_empty());
    let column = |name: &str, field_type: FieldType, nullable: bool| {
        MigrationOp::Column(MigrationColumn {
            table: table.to_owned(),
            column: name.to_owned(),
            field_type,
            nullable,
            default: None,
            comment: None,
            file: file.to_owned(),
        })
    };
    let drop = |name: &str| MigrationOp::DropColumn {
        table: table.to_owned(),
        column: name.to_owned(),
    };

    let nullable = modifiers
        .iter()
        .any(|m| m.name == "nullable" && strip_quotes(m.args) != "false");

    match verb.name {
        "timestamps" | "timestampsTz" | "nullableTimestamps" => {
            ops.push(column("created_at", FieldType::Timestamp, true));
            ops.push(column("updated_at", FieldType::Timestamp, true));
        }
        "softDeletes" | "softDeletesTz" => {
            ops.push(column(first.unwrap_or("deleted_at"), FieldType::Timestamp, true));
        }
        "rememberToken" => ops.push(column("remember_token", FieldType::String, true)),
        "morphs" | "nullableMorphs" | "uuidMorphs" | "nullableUuidMorphs" | "ulidMorphs"
        | "nullableUlidMorphs" => {
            let Some(name) = first else { return };
            let id_type = if verb.name.contains("Uuid") || verb.name.contains("Ulid") {
                FieldType::String
            } else {
                FieldType::Integer
            };
            let nullable = nullable || verb.name.starts_with("nullable");
            ops.push(column(&format!("{name}_id"), id_type, nullable));
            ops.push(column(&format!("{name}_type"), FieldType::String, nullable));
        }
        "foreignIdFor" => {
            let name = args.get(1).map(|a| strip_quotes(a).to_owned()).unwrap_or_else(|| {
                format!("{}_id", snake_case(&normalize_class_ref(args.first().unwrap_or(&""))))
            });
            ops.push(with_modifiers(column(&name, FieldType::Integer, nullable), modifiers));
        }
        "dropColumn" | "dropColumns" => {
            ops.extend(quoted_strings(verb.args).iter().map(|c| drop(c)));
        }
        "dropTimestamps" | "dropTimestampsTz" => {
            ops.push(drop("created_at"));
            ops.push(drop("updated_at"));
        }
        "dropSoftDeletes" | "dropSoftDeletesTz" => ops.push(drop(first.unwrap_or("deleted_at"))),
        "dropRememberToken" => ops.push(drop("remember_token")),
        "dropMorphs" => {
            if let Some(name) = first {
                ops.push(drop(&format!("{name}_id")));
                ops.push(drop(&format!("{name}_type")));
            }
        }
        "renameColumn" => {
            if let [from, to] = args.as_slice() {
                ops.push(MigrationOp::RenameColumn {
                    table: table.to_owned(),
                    from: strip_quotes(from).to_owned(),
                    to: strip_quotes(to).to_owned(),
                });
            }
        }
        "id" => {
            let name = first.unwrap_or("id");
            ops.push(with_modifiers(column(name, FieldType::Integer, nullable), modifiers));
        }
        other => {
            let Some(field_type) = column_type(other) else { return };
            // Only quoted names declare columns; arrays are composite indexes.
            let Some(raw) = args.first() else { return };
            if !raw.starts_with(['\'', '"']) {
                return;
            }
            let Some(name) = first else { return };
            ops.push(with_modifiers(column(name, field_type, nullable), modifiers));
        }
    }
}

fn with_modifiers(op: MigrationOp, modifiers: &[Call<'_>]) -> MigrationOp {
    let MigrationOp::Column(mut column) = op else {
        return op;
    };
    for modifier in modifiers {
        match modifier.name {
            "default" => column.default = Some(strip_quotes(modifier.args).to_owned()),
            "comment" => column.comment = Some(strip_quotes(modifier.args).to_owned()),
            _ => {}
        }
    }
    MigrationOp::Column(column)
}

/// Reads `->name(args)` links starting at `start`.
///
/// Returns the links and the offset just past the last one.
fn call_chain(text: &str, start: usize) -> (Vec<Call<'_>>, usize) {
    let mut calls = Vec::new();
    let mut pos = start;
    loop {
        let rest = &text[pos..];
        let trimmed = rest.trim_start();
        let Some(after_arrow) = trimmed.strip_prefix("->") else {
            break;
        };
        let name_start = pos + (rest.len() - after_arrow.len());
        let after_arrow = after_arrow.trim_start();
        let name_start = name_start + (text[name_start..].len() - after_arrow.len());
        let name_len = after_arrow
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(after_arrow.len());
        if name_len == 0 {
            break;
        }
        let name = &text[name_start..name_start + name_len];
        let after_name = &text[name_start + name_len..];
        let Some(open_rel) = after_name.find(|c: char| !c.is_whitespace()) else {
            break;
        };
        if !after_name[open_rel..].starts_with('(') {
            break;
        }
        let args_start = name_start + name_len + open_rel + 1;
        let Some(args_len) = matching_paren(&text[args_start..]) else {
            break;
        };
        calls.push(Call {
            name,
            args: text[args_start..args_start + args_len].trim(),
        });
        pos = args_start + args_len + 1;
    }
    (calls, pos)
}

/// Finds the byte length up to the `)` closing an already opened paren.
fn matching_paren(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' | '[' => depth += 1,
            ')' if depth == 0 => return Some(i),
            ')' | ']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    None
}

/// Splits call arguments on top-level commas.
fn split_args(args: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in args.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(args[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let tail = args[start..].trim();
    if !tail.is_empty() {
        parts.push(tail);
    }
    parts
}
