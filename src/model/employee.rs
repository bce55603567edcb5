use super::schema::{Column, ColumnDefault, EntitySchema, Hook, UniqueRule};

pub static EMPLOYEE: EntitySchema = EntitySchema::new(
    "Employee",
    "employees",
    "/employees",
    &[
        Column::text("profile_picture").max_len(500),
        Column::text("name").required(),
        Column::text("father_name").required(),
        Column::text("mother_name").required(),
        Column::date("date_of_birth").required(),
        Column::text("email").required(),
        Column::text("phone").max_len(50).required(),
        Column::text("gender").max_len(20).required(),
        Column::text("marital_status").max_len(20).required(),
        Column::integer("age"),
        Column::text("blood_group").max_len(10),
        Column::text("category").max_len(50),
        Column::text("religion").max_len(50),
        Column::text("nationality").max_len(50),
        // statutory ids
        Column::text("adhaar_number").max_len(20),
        Column::text("pan_number").max_len(20),
        Column::text("passport_number").max_len(20),
        Column::text("esic_number").max_len(30),
        Column::text("uan_number").max_len(30),
        Column::text("pf_number").max_len(30),
        Column::boolean("is_disability").default(ColumnDefault::Bool(false)),
        Column::text("disability_type").max_len(100),
        Column::text("disability_certificate_file").max_len(500),
        Column::long_text("current_address"),
        Column::text("current_postal_code").max_len(20),
        Column::text("current_city").max_len(100),
        Column::text("current_state").max_len(100),
        Column::text("current_country").max_len(100),
        Column::long_text("permanent_address"),
        Column::text("permanent_postal_code").max_len(20),
        Column::text("permanent_city").max_len(100),
        Column::text("permanent_state").max_len(100),
        Column::text("permanent_country").max_len(100),
        Column::text("emergency_contact_name"),
        Column::text("emergency_contact_relationship").max_len(50),
        Column::text("emergency_contact_phone").max_len(50),
        // employment lifecycle
        Column::text("employee_code").max_len(50),
        Column::text("official_email"),
        Column::datetime("date_of_joining"),
        Column::datetime("rejoin_date"),
        Column::datetime("date_of_leaving"),
        Column::datetime("confirmation_date"),
        Column::long_text("reason_of_leaving"),
        Column::text("relieving_certificate_file").max_len(500),
        Column::integer("probation_period_months").default(ColumnDefault::Int(3)),
        Column::integer("notice_period_days").default(ColumnDefault::Int(30)),
    ],
)
.unique(&[
    UniqueRule::on(&["email"]),
    UniqueRule::on(&["phone"]),
    UniqueRule::on(&["employee_code"]),
    UniqueRule::on(&["official_email"]),
    UniqueRule::on(&["adhaar_number"]),
    UniqueRule::on(&["pan_number"]),
    UniqueRule::on(&["passport_number"]),
    UniqueRule::on(&["esic_number"]),
    UniqueRule::on(&["uan_number"]),
    UniqueRule::on(&["pf_number"]),
])
.hook(Hook::EmployeeCode);

/// `EMP-` followed by the row id padded to six digits.
pub fn employee_code(id: u64) -> String {
    format!("EMP-{id:06}")
}

/// Whether `code` has the generated shape. Compared the way MySQL's default
/// collation does: case-insensitive, trailing spaces ignored.
pub fn is_generated_code(code: &str) -> bool {
    let code = code.trim_end();
    match (code.get(..4), code.get(4..)) {
        (Some(prefix), Some(digits)) => {
            prefix.eq_ignore_ascii_case("EMP-")
                && digits.len() >= 6
                && digits.bytes().all(|b| b.is_ascii_digit())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_zero_padded() {
        assert_eq!(employee_code(42), "EMP-000042");
        assert_eq!(employee_code(1), "EMP-000001");
        assert_eq!(employee_code(1_234_567), "EMP-1234567");
    }

    #[test]
    fn generated_shape_is_recognised() {
        assert!(is_generated_code("EMP-000042"));
        assert!(is_generated_code("emp-000042 "));
        assert!(is_generated_code("EMP-1234567"));
        assert!(!is_generated_code("EMP-42"));
        assert!(!is_generated_code("EMP-00004X"));
        assert!(!is_generated_code("HR-000042"));
        assert!(!is_generated_code("É"));
    }
}
