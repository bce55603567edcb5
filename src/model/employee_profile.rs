use super::schema::{Column, EntitySchema, Hook, UniqueRule};

pub static EMPLOYEE_PROFILE: EntitySchema = EntitySchema::new(
    "Employee profile",
    "employee_profiles",
    "/employeeprofile",
    &[
        Column::id("employee_id").required(),
        Column::id("employee_type_id").required(),
        Column::id("branch_id").required(),
        Column::id("department_id").required(),
        Column::id("designation_id").required(),
        Column::id("grade_id").required(),
        Column::id("reporting_manager_id"),
        Column::text("work_location"),
        Column::text("shift_timing").max_len(100),
        Column::date("effective_date"),
    ],
)
.unique(&[UniqueRule::on(&[
    "employee_id",
    "employee_type_id",
    "branch_id",
    "department_id",
    "designation_id",
    "grade_id",
    "reporting_manager_id",
    "work_location",
    "shift_timing",
])
.among_active()
.message("Employee profile with same data already exists.")])
.hook(Hook::SingleActiveProfile);
