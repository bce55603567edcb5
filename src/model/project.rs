use super::schema::{Column, ColumnDefault, EntitySchema, UniqueRule};

pub static PROJECT: EntitySchema = EntitySchema::new(
    "Project",
    "projects",
    "/projects",
    &[
        Column::text("name").required(),
        Column::text("short_name").max_len(50).required(),
        Column::text("status").max_len(50),
        Column::text("priority").max_len(50),
        Column::date("start_date"),
        Column::date("end_date"),
        Column::float("budget").default(ColumnDefault::Float(0.0)),
        Column::long_text("description"),
        Column::text("client_name"),
        Column::text("client_email"),
        Column::text("client_phone").max_len(50),
        Column::long_text("client_address"),
        Column::long_text("remarks"),
    ],
)
.unique(&[UniqueRule::on(&["name"]), UniqueRule::on(&["short_name"])]);
