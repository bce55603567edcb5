use super::schema::{Column, EntitySchema};

pub static WORK_EXPERIENCE: EntitySchema = EntitySchema::new(
    "Work experience",
    "work_experiences",
    "/employeeworkexperience",
    &[
        Column::id("employee_id").required(),
        Column::text("company_name").required(),
        Column::text("designation"),
        Column::date("start_date"),
        Column::date("end_date"),
        Column::long_text("responsibilities"),
    ],
);
