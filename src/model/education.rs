use super::schema::{Column, ColumnDefault, EntitySchema};

pub static EDUCATION: EntitySchema = EntitySchema::new(
    "Education",
    "educations",
    "/employeeeducation",
    &[
        Column::id("employee_id").required(),
        Column::text("institution_name").required(),
        Column::text("degree"),
        Column::text("field_of_study"),
        Column::date("start_date"),
        Column::date("end_date"),
        Column::text("grade").max_len(50),
        Column::float("grade_value").default(ColumnDefault::Float(0.0)),
        Column::long_text("description"),
    ],
);
