//! Declarative CRUD over one table.
//!
//! A [`Resource`] describes a table: its key, the columns a client may write
//! and how each is typed, which columns must stay unique, which columns point
//! at other tables, and which tables point back at it. Every statement the
//! list/get/create/update/delete routes run is built from that description.

use chrono::NaiveDate;
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Connection, OptionalExtension, Params, Row};
use serde_json::{json, Map, Value as JsonValue};
use tracing::debug;

use super::auth::hash_password;
use super::error::{AppError, Reply};
use super::types::Body;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Decimal,
    /// `YYYY-MM-DD`.
    Date,
    Choice(&'static [&'static str]),
    /// Stored as a salted hash, never selected back out.
    Password,
}

#[derive(Debug)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub nullable: bool,
    /// False for columns only written on create.
    pub updatable: bool,
}

impl Field {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            nullable: false,
            updatable: true,
        }
    }

    pub const fn create_only(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            nullable: false,
            updatable: false,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            nullable: true,
            updatable: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// Integer rowid assigned on insert.
    Generated,
    /// Text key supplied by the client on create and never updated.
    Natural,
}

#[derive(Debug)]
pub struct Key {
    pub column: &'static str,
    pub kind: KeyKind,
}

#[derive(Debug)]
pub struct Unique {
    pub column: &'static str,
    pub on_create: &'static str,
    pub on_update: &'static str,
}

#[derive(Debug)]
pub struct ForeignKey {
    pub column: &'static str,
    pub table: &'static str,
    pub references: &'static str,
    pub message: &'static str,
}

#[derive(Debug)]
pub struct Dependent {
    pub table: &'static str,
    pub column: &'static str,
    pub message: &'static str,
}

#[derive(Debug)]
pub struct Messages {
    pub not_found: &'static str,
    pub created: &'static str,
    pub updated: &'static str,
    pub deleted: &'static str,
    /// `{field}` is replaced by the first missing field name.
    pub missing_field: &'static str,
    pub no_fields: &'static str,
    pub invalid_choice: &'static str,
}

#[derive(Debug)]
pub struct Resource {
    /// Segment under `/api/`.
    pub path: &'static str,
    pub table: &'static str,
    pub key: Key,
    pub fields: &'static [Field],
    /// SELECT ... FROM ... [JOIN ...] without WHERE or ORDER BY.
    pub select: &'static str,
    /// Key column as it must be written inside `select` (alias-qualified).
    pub select_key: &'static str,
    pub unique: &'static [Unique],
    pub foreign_keys: &'static [ForeignKey],
    pub dependents: &'static [Dependent],
    pub messages: Messages,
    pub requires_session: bool,
}

type Assignment<'a> = (&'a str, FieldKind, Value);

impl Resource {
    /// Path keys that do not parse for the key type address no row.
    pub fn parse_key(&self, raw: &str) -> Result<Value, AppError> {
        match self.key.kind {
            KeyKind::Generated => raw
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| self.not_found()),
            KeyKind::Natural => Ok(Value::Text(raw.to_string())),
        }
    }

    pub fn list(&self, conn: &Connection) -> Result<Vec<JsonValue>, AppError> {
        let sql = format!("{} ORDER BY {}", self.select, self.select_key);
        Ok(query_rows(conn, &sql, [])?)
    }

    pub fn get(&self, conn: &Connection, key: &Value) -> Result<JsonValue, AppError> {
        let sql = format!("{} WHERE {} = ?", self.select, self.select_key);
        query_row(conn, &sql, [key])?.ok_or_else(|| self.not_found())
    }

    pub fn create(&self, conn: &Connection, body: &Body) -> Result<Reply, AppError> {
        if self.key.kind == KeyKind::Natural && !body.contains_key(self.key.column) {
            return Err(self.missing(self.key.column));
        }
        if let Some(field) = self
            .fields
            .iter()
            .find(|f| f.required && !body.contains_key(f.name))
        {
            return Err(self.missing(field.name));
        }

        let mut assignments: Vec<Assignment<'_>> = Vec::new();
        if self.key.kind == KeyKind::Natural {
            let key_field = Field::required(self.key.column, FieldKind::Text);
            let value = self.convert(&key_field, &body[self.key.column])?;
            assignments.push((self.key.column, FieldKind::Text, value));
        }
        assignments.extend(self.collect(body, false)?);

        for rule in self.unique {
            if let Some(value) = assigned(&assignments, rule.column) {
                if self.value_taken(conn, rule.column, value, None)? {
                    return Err(AppError::Conflict(rule.on_create.to_string()));
                }
            }
        }
        self.check_references(conn, &assignments)?;
        seal_passwords(&mut assignments)?;

        let columns: Vec<&str> = assignments.iter().map(|(c, _, _)| *c).collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {}({}) VALUES({})",
            self.table,
            columns.join(", "),
            placeholders
        );
        let values: Vec<Value> = assignments.into_iter().map(|(_, _, v)| v).collect();
        let key_value = match self.key.kind {
            KeyKind::Natural => values.first().cloned(),
            KeyKind::Generated => None,
        };

        conn.execute(&sql, params_from_iter(values))?;

        let id = match key_value {
            Some(value) => sql_to_json(&value),
            None => json!(conn.last_insert_rowid()),
        };
        debug!(table = self.table, %id, "row created");

        Ok(Reply::created(json!({
            "message": self.messages.created,
            "id": id,
        })))
    }

    pub fn update(&self, conn: &Connection, key: &Value, body: &Body) -> Result<Reply, AppError> {
        if !self.exists(conn, key)? {
            return Err(self.not_found());
        }

        let mut assignments = self.collect(body, true)?;
        for rule in self.unique {
            if let Some(value) = assigned(&assignments, rule.column) {
                if self.value_taken(conn, rule.column, value, Some(key))? {
                    return Err(AppError::Conflict(rule.on_update.to_string()));
                }
            }
        }
        self.check_references(conn, &assignments)?;

        if assignments.is_empty() {
            return Err(AppError::BadRequest(self.messages.no_fields.to_string()));
        }
        seal_passwords(&mut assignments)?;

        let set_parts: Vec<String> = assignments
            .iter()
            .map(|(column, _, _)| format!("{column} = ?"))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            self.table,
            set_parts.join(", "),
            self.key.column
        );
        let mut bind_values: Vec<Value> = assignments.into_iter().map(|(_, _, v)| v).collect();
        bind_values.push(key.clone());

        let affected = conn.execute(&sql, params_from_iter(bind_values))?;
        debug!(table = self.table, affected, "row updated");

        Ok(Reply::ok(json!({
            "message": self.messages.updated,
            "affected_rows": affected,
        })))
    }

    pub fn delete(&self, conn: &Connection, key: &Value) -> Result<Reply, AppError> {
        if !self.exists(conn, key)? {
            return Err(self.not_found());
        }

        for dependent in self.dependents {
            let sql = format!(
                "SELECT 1 FROM {} WHERE {} = ? LIMIT 1",
                dependent.table, dependent.column
            );
            let blocked = conn
                .query_row(&sql, [key], |r| r.get::<_, i64>(0))
                .optional()?
                .is_some();
            if blocked {
                debug!(
                    table = self.table,
                    blocking = dependent.table,
                    "delete refused"
                );
                return Err(AppError::Conflict(dependent.message.to_string()));
            }
        }

        let sql = format!("DELETE FROM {} WHERE {} = ?", self.table, self.key.column);
        let affected = conn.execute(&sql, [key])?;

        Ok(Reply::ok(json!({
            "message": self.messages.deleted,
            "affected_rows": affected,
        })))
    }

    pub fn exists(&self, conn: &Connection, key: &Value) -> Result<bool, AppError> {
        let sql = format!("SELECT 1 FROM {} WHERE {} = ?", self.table, self.key.column);
        Ok(conn
            .query_row(&sql, [key], |r| r.get::<_, i64>(0))
            .optional()?
            .is_some())
    }

    pub fn not_found(&self) -> AppError {
        AppError::NotFound(self.messages.not_found.to_string())
    }

    fn missing(&self, field: &str) -> AppError {
        AppError::BadRequest(self.messages.missing_field.replace("{field}", field))
    }

    /// Converts every declared field present in `body`, in declaration order.
    /// On update, create-only fields are ignored like unknown ones.
    fn collect(&self, body: &Body, updating: bool) -> Result<Vec<Assignment<'static>>, AppError> {
        let mut out = Vec::new();
        for field in self.fields {
            if updating && !field.updatable {
                continue;
            }
            if let Some(raw) = body.get(field.name) {
                out.push((field.name, field.kind, self.convert(field, raw)?));
            }
        }
        Ok(out)
    }

    fn convert(&self, field: &Field, raw: &JsonValue) -> Result<Value, AppError> {
        let invalid = || AppError::BadRequest(format!("Invalid value for field: {}", field.name));

        if raw.is_null() {
            return if field.nullable {
                Ok(Value::Null)
            } else {
                Err(invalid())
            };
        }

        let converted = match field.kind {
            FieldKind::Text | FieldKind::Password => {
                raw.as_str().map(|s| Value::Text(s.to_string()))
            }
            FieldKind::Integer => raw
                .as_i64()
                .or_else(|| raw.as_str().and_then(|s| s.trim().parse().ok()))
                .map(Value::Integer),
            FieldKind::Decimal => raw
                .as_f64()
                .or_else(|| raw.as_str().and_then(|s| s.trim().parse().ok()))
                .filter(|f| f.is_finite())
                .map(Value::Real),
            FieldKind::Date => raw
                .as_str()
                .filter(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok())
                .map(|s| Value::Text(s.to_string())),
            FieldKind::Choice(options) => match raw.as_str() {
                Some(s) if options.contains(&s) => Some(Value::Text(s.to_string())),
                _ => {
                    return Err(AppError::BadRequest(
                        self.messages.invalid_choice.to_string(),
                    ))
                }
            },
        };

        converted.ok_or_else(invalid)
    }

    fn value_taken(
        &self,
        conn: &Connection,
        column: &str,
        value: &Value,
        except: Option<&Value>,
    ) -> Result<bool, AppError> {
        if matches!(value, Value::Null) {
            return Ok(false);
        }
        let found = match except {
            Some(key) => {
                let sql = format!(
                    "SELECT 1 FROM {} WHERE {} = ? AND {} != ? LIMIT 1",
                    self.table, column, self.key.column
                );
                conn.query_row(&sql, [value, key], |r| r.get::<_, i64>(0))
                    .optional()?
            }
            None => {
                let sql = format!("SELECT 1 FROM {} WHERE {} = ? LIMIT 1", self.table, column);
                conn.query_row(&sql, [value], |r| r.get::<_, i64>(0))
                    .optional()?
            }
        };
        Ok(found.is_some())
    }

    fn check_references(
        &self,
        conn: &Connection,
        assignments: &[Assignment<'_>],
    ) -> Result<(), AppError> {
        for fk in self.foreign_keys {
            let Some(value) = assigned(assignments, fk.column) else {
                continue;
            };
            if matches!(value, Value::Null) {
                continue;
            }
            let sql = format!("SELECT 1 FROM {} WHERE {} = ?", fk.table, fk.references);
            let found = conn
                .query_row(&sql, [value], |r| r.get::<_, i64>(0))
                .optional()?;
            if found.is_none() {
                return Err(AppError::NotFound(fk.message.to_string()));
            }
        }
        Ok(())
    }
}

fn assigned<'v>(assignments: &'v [Assignment<'_>], column: &str) -> Option<&'v Value> {
    assignments
        .iter()
        .find(|(c, _, _)| *c == column)
        .map(|(_, _, v)| v)
}

fn seal_passwords(assignments: &mut [Assignment<'_>]) -> Result<(), AppError> {
    for (_, kind, value) in assignments.iter_mut() {
        if *kind != FieldKind::Password {
            continue;
        }
        if let Value::Text(plain) = value {
            *value = Value::Text(hash_password(plain)?);
        }
    }
    Ok(())
}

pub fn query_rows<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> rusqlite::Result<Vec<JsonValue>> {
    let mut stmt = conn.prepare(sql)?;
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let rows = stmt
        .query_map(params, |row| row_to_json(row, &names))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn query_row<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> rusqlite::Result<Option<JsonValue>> {
    let mut stmt = conn.prepare(sql)?;
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    stmt.query_row(params, |row| row_to_json(row, &names))
        .optional()
}

fn row_to_json(row: &Row<'_>, names: &[String]) -> rusqlite::Result<JsonValue> {
    let mut out = Map::with_capacity(names.len());
    for (i, name) in names.iter().enumerate() {
        let value = match row.get_ref(i)? {
            ValueRef::Null => JsonValue::Null,
            ValueRef::Integer(n) => json!(n),
            ValueRef::Real(f) => json!(f),
            ValueRef::Text(t) => JsonValue::String(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => json!(b),
        };
        out.insert(name.clone(), value);
    }
    Ok(JsonValue::Object(out))
}

fn sql_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Integer(n) => json!(n),
        Value::Real(f) => json!(f),
        Value::Text(s) => json!(s),
        Value::Blob(b) => json!(b),
    }
}
