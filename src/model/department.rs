use super::schema::{Column, EntitySchema, UniqueRule};

/// Department names repeat across branches, never within one.
pub static DEPARTMENT: EntitySchema = EntitySchema::new(
    "Department",
    "departments",
    "/departments",
    &[
        Column::id("branch_id").required(),
        Column::text("name").required(),
        Column::text("short_name").max_len(50).required(),
        Column::long_text("description"),
    ],
)
.unique(&[
    UniqueRule::on(&["name"]).within("branch_id"),
    UniqueRule::on(&["short_name"]).within("branch_id"),
]);
