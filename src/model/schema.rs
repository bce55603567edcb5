//! Declarative description of an entity table. One `EntitySchema` drives
//! payload validation, SQL generation, uniqueness checks and the OpenAPI
//! document for its routes.

use strum_macros::Display;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ColumnKind {
    #[strum(to_string = "string")]
    Text,
    #[strum(to_string = "integer")]
    Integer,
    /// Reference to another row's id.
    #[strum(to_string = "positive integer id")]
    Id,
    #[strum(to_string = "number")]
    Float,
    #[strum(to_string = "boolean")]
    Boolean,
    #[strum(to_string = "date (YYYY-MM-DD)")]
    Date,
    #[strum(to_string = "datetime")]
    DateTime,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnDefault {
    Bool(bool),
    Int(i64),
    Float(f64),
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub required: bool,
    pub default: Option<ColumnDefault>,
    /// Longest accepted text, in characters.
    pub max_len: Option<usize>,
}

/// `VARCHAR(255)`, the width of a plain text column.
pub const VARCHAR_LEN: usize = 255;
/// A `TEXT` column holds 65535 bytes, four per character in utf8mb4.
pub const TEXT_LEN: usize = 16_383;

impl Column {
    const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Column {
            name,
            kind,
            required: false,
            default: None,
            max_len: None,
        }
    }

    pub const fn text(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Text).max_len(VARCHAR_LEN)
    }

    pub const fn long_text(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Text).max_len(TEXT_LEN)
    }

    pub const fn integer(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Integer)
    }

    pub const fn id(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Id)
    }

    pub const fn float(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Float)
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Boolean)
    }

    pub const fn date(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Date)
    }

    pub const fn datetime(name: &'static str) -> Self {
        Self::new(name, ColumnKind::DateTime)
    }

    pub const fn required(self) -> Self {
        Column {
            required: true,
            ..self
        }
    }

    pub const fn default(self, value: ColumnDefault) -> Self {
        Column {
            default: Some(value),
            ..self
        }
    }

    pub const fn max_len(self, max_len: usize) -> Self {
        Column {
            max_len: Some(max_len),
            ..self
        }
    }

    /// Only optional columns without a default accept an explicit `null`.
    pub fn nullable(&self) -> bool {
        !self.required && self.default.is_none()
    }
}

/// Soft-delete flag present on every entity table.
pub static IS_ACTIVE: Column = Column::boolean("is_active").default(ColumnDefault::Bool(true));

/// A tuple of columns that must not repeat. `NULL` never conflicts.
#[derive(Debug, Clone, Copy)]
pub struct UniqueRule {
    pub columns: &'static [&'static str],
    /// Parent column the rule is scoped to, e.g. `branch_id`.
    pub scope: Option<&'static str>,
    /// Only rows with `is_active = TRUE` count as duplicates.
    pub active_only: bool,
    pub message: Option<&'static str>,
}

impl UniqueRule {
    pub const fn on(columns: &'static [&'static str]) -> Self {
        UniqueRule {
            columns,
            scope: None,
            active_only: false,
            message: None,
        }
    }

    pub const fn within(self, scope: &'static str) -> Self {
        UniqueRule {
            scope: Some(scope),
            ..self
        }
    }

    pub const fn among_active(self) -> Self {
        UniqueRule {
            active_only: true,
            ..self
        }
    }

    pub const fn message(self, message: &'static str) -> Self {
        UniqueRule {
            message: Some(message),
            ..self
        }
    }

    pub fn conflict_message(&self, label: &str) -> String {
        if let Some(message) = self.message {
            return message.to_string();
        }
        let fields = self
            .columns
            .iter()
            .map(|c| c.replace('_', " "))
            .collect::<Vec<_>>()
            .join(" and ");
        match self.scope {
            Some(scope) => format!(
                "{label} with this {fields} already exists in this {}",
                scope.trim_end_matches("_id").replace('_', " ")
            ),
            None => format!("{label} with this {fields} already exists"),
        }
    }
}

/// Entity-specific behaviour layered on the generic write path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    None,
    /// Fill `employee_code` with `EMP-%06d` when it is left empty.
    EmployeeCode,
    /// Keep at most one active profile per employee.
    SingleActiveProfile,
}

#[derive(Debug)]
pub struct EntitySchema {
    /// Human name used in messages, e.g. `"Bank detail"`.
    pub label: &'static str,
    pub table: &'static str,
    /// Route segment, e.g. `"/employeebankdetail"`.
    pub path: &'static str,
    pub columns: &'static [Column],
    pub unique: &'static [UniqueRule],
    pub order_by: &'static str,
    pub hook: Hook,
}

impl EntitySchema {
    pub const fn new(
        label: &'static str,
        table: &'static str,
        path: &'static str,
        columns: &'static [Column],
    ) -> Self {
        EntitySchema {
            label,
            table,
            path,
            columns,
            unique: &[],
            order_by: "id ASC",
            hook: Hook::None,
        }
    }

    pub const fn unique(self, unique: &'static [UniqueRule]) -> Self {
        EntitySchema { unique, ..self }
    }

    pub const fn order_by(self, order_by: &'static str) -> Self {
        EntitySchema { order_by, ..self }
    }

    pub const fn hook(self, hook: Hook) -> Self {
        EntitySchema { hook, ..self }
    }

    /// Declared columns followed by `is_active`.
    pub fn writable_columns(&self) -> impl Iterator<Item = &'static Column> {
        let columns: &'static [Column] = self.columns;
        columns.iter().chain(std::iter::once(&IS_ACTIVE))
    }

    pub fn column(&self, name: &str) -> Option<&'static Column> {
        self.writable_columns().find(|c| c.name == name)
    }

    pub fn select_list(&self) -> String {
        std::iter::once("id")
            .chain(self.writable_columns().map(|c| c.name))
            .chain(["created_at", "updated_at"])
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `"Bank detail"` -> `"BankDetail"`.
    pub fn type_name(&self) -> String {
        self.label
            .split_whitespace()
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect()
    }

    pub fn not_found(&self) -> ApiError {
        ApiError::NotFound(format!("{} not found", self.label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static WIDGET: EntitySchema = EntitySchema::new(
        "Widget part",
        "widget_parts",
        "/widgetparts",
        &[Column::text("name").required(), Column::id("group_id")],
    )
    .unique(&[UniqueRule::on(&["name"]).within("group_id")]);

    #[test]
    fn is_active_is_appended_to_declared_columns() {
        let names: Vec<_> = WIDGET.writable_columns().map(|c| c.name).collect();
        assert_eq!(names, ["name", "group_id", "is_active"]);
        assert_eq!(
            WIDGET.select_list(),
            "id, name, group_id, is_active, created_at, updated_at"
        );
    }

    #[test]
    fn nullability_follows_required_and_default() {
        assert!(!WIDGET.column("name").unwrap().nullable());
        assert!(WIDGET.column("group_id").unwrap().nullable());
        assert!(!WIDGET.column("is_active").unwrap().nullable());
        assert!(WIDGET.column("color").is_none());
    }

    #[test]
    fn conflict_messages() {
        assert_eq!(
            WIDGET.unique[0].conflict_message(WIDGET.label),
            "Widget part with this name already exists in this group"
        );
        let pair = UniqueRule::on(&["short_name", "code"]);
        assert_eq!(
            pair.conflict_message("Branch"),
            "Branch with this short name and code already exists"
        );
        let custom = UniqueRule::on(&["name"]).message("Taken");
        assert_eq!(custom.conflict_message("Branch"), "Taken");
    }

    #[test]
    fn text_columns_are_bounded() {
        assert_eq!(Column::text("name").max_len, Some(VARCHAR_LEN));
        assert_eq!(Column::text("zip_code").max_len(20).max_len, Some(20));
        assert_eq!(Column::long_text("address").max_len, Some(TEXT_LEN));
        assert_eq!(Column::integer("age").max_len, None);
    }

    #[test]
    fn type_name_is_pascal_case() {
        assert_eq!(WIDGET.type_name(), "WidgetPart");
    }

    #[test]
    fn kind_display() {
        assert_eq!(ColumnKind::Date.to_string(), "date (YYYY-MM-DD)");
        assert_eq!(ColumnKind::Id.to_string(), "positive integer id");
    }
}
