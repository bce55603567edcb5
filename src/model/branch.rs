use super::schema::{Column, EntitySchema, UniqueRule};

pub static BRANCH: EntitySchema = EntitySchema::new(
    "Branch",
    "branches",
    "/branches",
    &[
        Column::id("company_id").required(),
        Column::text("name").required(),
        Column::text("short_name").max_len(50).required(),
        Column::text("email"),
        Column::text("phone").max_len(50),
        Column::long_text("address"),
        Column::text("city").max_len(100),
        Column::text("state").max_len(100),
        Column::text("country").max_len(100),
        Column::text("zip_code").max_len(20),
    ],
)
.unique(&[UniqueRule::on(&["name"]), UniqueRule::on(&["short_name"])]);
