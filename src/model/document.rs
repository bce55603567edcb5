use super::schema::{Column, ColumnDefault, EntitySchema};

pub static DOCUMENT: EntitySchema = EntitySchema::new(
    "Document",
    "documents",
    "/employeedocument",
    &[
        Column::id("employee_id").required(),
        Column::id("document_type_id").required(),
        Column::text("document_file").max_len(500).required(),
        Column::date("issue_date"),
        Column::date("expiry_date"),
        Column::boolean("is_verified").default(ColumnDefault::Bool(false)),
    ],
)
.order_by("created_at DESC, id DESC");
