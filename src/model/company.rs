use super::schema::{Column, EntitySchema, UniqueRule};

pub static COMPANY: EntitySchema = EntitySchema::new(
    "Company",
    "companies",
    "/companies",
    &[
        Column::text("name").required(),
        Column::text("legal_name"),
        Column::text("email"),
        Column::text("phone").max_len(50),
        Column::integer("established_year"),
        Column::long_text("address"),
        Column::text("website"),
        Column::text("city").max_len(100),
        Column::text("state").max_len(100),
        Column::text("country").max_len(100),
        Column::text("zip_code").max_len(20),
    ],
)
.unique(&[UniqueRule::on(&["name"]), UniqueRule::on(&["email"])]);
