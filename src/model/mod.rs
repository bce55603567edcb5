pub mod bank_detail;
pub mod branch;
pub mod catalog;
pub mod company;
pub mod department;
pub mod document;
pub mod education;
pub mod employee;
pub mod employee_profile;
pub mod project;
pub mod schema;
pub mod user;
pub mod work_experience;

use schema::EntitySchema;

/// Every entity served by the generic CRUD routes, in route-registration order.
pub static ENTITIES: &[&EntitySchema] = &[
    &company::COMPANY,
    &branch::BRANCH,
    &department::DEPARTMENT,
    &project::PROJECT,
    &catalog::DESIGNATION,
    &catalog::EMPLOYEE_TYPE,
    &catalog::GRADE,
    &catalog::DOCUMENT_TYPE,
    &employee::EMPLOYEE,
    &employee_profile::EMPLOYEE_PROFILE,
    &bank_detail::BANK_DETAIL,
    &document::DOCUMENT,
    &work_experience::WORK_EXPERIENCE,
    &education::EDUCATION,
];
