use super::schema::{Column, ColumnDefault, EntitySchema, UniqueRule};

pub static BANK_DETAIL: EntitySchema = EntitySchema::new(
    "Bank detail",
    "bank_details",
    "/employeebankdetail",
    &[
        Column::id("employee_id").required(),
        Column::text("bank_name").required(),
        Column::text("account_number").max_len(50).required(),
        Column::text("ifsc_code").max_len(20).required(),
        Column::text("branch_name").required(),
        Column::text("account_type").max_len(50).required(),
        Column::boolean("is_primary").default(ColumnDefault::Bool(false)),
    ],
)
.unique(&[UniqueRule::on(&["account_number"])])
.order_by("account_type DESC, id ASC");
