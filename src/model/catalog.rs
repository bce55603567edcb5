//! Small name/description lookup tables referenced by employee records.

use super::schema::{Column, ColumnDefault, EntitySchema, UniqueRule};

const NAMED: &[Column] = &[Column::text("name").required(), Column::long_text("description")];

const UNIQUE_NAME: &[UniqueRule] = &[UniqueRule::on(&["name"])];

pub static DESIGNATION: EntitySchema =
    EntitySchema::new("Designation", "designations", "/designations", NAMED).unique(UNIQUE_NAME);

pub static EMPLOYEE_TYPE: EntitySchema =
    EntitySchema::new("Employee type", "employee_types", "/employee_types", NAMED)
        .unique(UNIQUE_NAME);

pub static DOCUMENT_TYPE: EntitySchema =
    EntitySchema::new("Document type", "document_types", "/document_types", NAMED)
        .unique(UNIQUE_NAME);

pub static GRADE: EntitySchema = EntitySchema::new(
    "Grade",
    "grades",
    "/grades",
    &[
        Column::text("name").required(),
        Column::float("min_salary").default(ColumnDefault::Float(0.0)),
        Column::float("max_salary").default(ColumnDefault::Float(0.0)),
        Column::long_text("description"),
    ],
)
.unique(UNIQUE_NAME);
