use utoipa::openapi::path::{
    OperationBuilder, ParameterBuilder, ParameterIn, PathItem, PathItemType,
};
use utoipa::openapi::request_body::RequestBodyBuilder;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityRequirement, SecurityScheme};
use utoipa::openapi::{
    ArrayBuilder, ContentBuilder, KnownFormat, ObjectBuilder, Ref, RefOr, Required,
    ResponseBuilder, Schema, SchemaFormat, SchemaType, Tag,
};
use utoipa::{Modify, OpenApi, openapi};

use crate::model::ENTITIES;
use crate::model::schema::{Column, ColumnKind, EntitySchema};
use crate::model::user::Credential;
use crate::models::{LoginRequest, LoginResponse, RegisterRequest};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HR Administration API",
        version = "1.0.0",
        description = r#"
## HR Administration

Manages the organisation (companies, branches, departments, projects and the
designation, employee type, grade and document type catalogues) and employee
records (profiles, bank details, documents, work experience, education).

### 🔐 Security
Everything except `/register`, `/login` and `/health` needs a
**JWT Bearer** token obtained from `/login`.

### 📦 Conventions
- Deleting a record marks it inactive; list endpoints return active records only.
- `PATCH` updates the supplied fields, `PUT` replaces the whole record.
- Errors are returned as `{"detail": "..."}`.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::me,
        crate::api::health::health,
    ),
    components(schemas(RegisterRequest, LoginRequest, LoginResponse, Credential)),
    modifiers(&SecurityAddon, &EntityDocs),
    tags(
        (name = "Auth", description = "Registration, login and the current user"),
        (name = "Health", description = "Service health"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Paths, schemas and a tag for every generic entity route.
pub struct EntityDocs;

impl Modify for EntityDocs {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        for schema in ENTITIES {
            components
                .schemas
                .insert(schema.type_name(), object(record_schema(schema)));
            components
                .schemas
                .insert(input_name(schema), object(input_schema(schema)));
        }

        let tags = openapi.tags.get_or_insert_with(Vec::new);
        for schema in ENTITIES {
            let mut tag = Tag::new(schema.label);
            tag.description = Some(format!("{} records", schema.label));
            tags.push(tag);
        }

        for schema in ENTITIES {
            openapi
                .paths
                .paths
                .insert(schema.path.to_string(), collection_item(schema));
            openapi
                .paths
                .paths
                .insert(format!("{}/{{id}}", schema.path), member_item(schema));
        }
    }
}

fn input_name(schema: &EntitySchema) -> String {
    format!("{}Input", schema.type_name())
}

fn object(built: utoipa::openapi::Object) -> RefOr<Schema> {
    RefOr::T(Schema::Object(built))
}

fn reference(name: String) -> RefOr<Schema> {
    RefOr::Ref(Ref::from_schema_name(name))
}

fn column_property(kind: ColumnKind, nullable: bool) -> ObjectBuilder {
    let (schema_type, format) = match kind {
        ColumnKind::Text => (SchemaType::String, None),
        ColumnKind::Integer | ColumnKind::Id => (SchemaType::Integer, Some(KnownFormat::Int64)),
        ColumnKind::Float => (SchemaType::Number, Some(KnownFormat::Double)),
        ColumnKind::Boolean => (SchemaType::Boolean, None),
        ColumnKind::Date => (SchemaType::String, Some(KnownFormat::Date)),
        ColumnKind::DateTime => (SchemaType::String, Some(KnownFormat::DateTime)),
    };
    ObjectBuilder::new()
        .schema_type(schema_type)
        .format(format.map(SchemaFormat::KnownFormat))
        .nullable(nullable)
}

fn declared_property(column: &Column) -> ObjectBuilder {
    column_property(column.kind, column.nullable()).max_length(column.max_len)
}

fn record_schema(schema: &EntitySchema) -> utoipa::openapi::Object {
    let mut builder = ObjectBuilder::new()
        .property("id", column_property(ColumnKind::Id, false))
        .required("id");
    for column in schema.writable_columns() {
        builder = builder.property(column.name, declared_property(column));
    }
    builder
        .property("created_at", column_property(ColumnKind::DateTime, false))
        .property("updated_at", column_property(ColumnKind::DateTime, true))
        .build()
}

fn input_schema(schema: &EntitySchema) -> utoipa::openapi::Object {
    let mut builder = ObjectBuilder::new().description(Some(
        "Request body for create and replace. PATCH accepts any subset.",
    ));
    for column in schema.writable_columns() {
        builder = builder.property(column.name, declared_property(column));
        if column.required {
            builder = builder.required(column.name);
        }
    }
    builder.build()
}

fn json_response(description: &str, body: RefOr<Schema>) -> RefOr<utoipa::openapi::Response> {
    RefOr::T(
        ResponseBuilder::new()
            .description(description)
            .content("application/json", ContentBuilder::new().schema(body).build())
            .build(),
    )
}

fn plain_response(description: &str) -> RefOr<utoipa::openapi::Response> {
    RefOr::T(ResponseBuilder::new().description(description).build())
}

fn operation(schema: &EntitySchema, summary: String, operation_id: String) -> OperationBuilder {
    OperationBuilder::new()
        .tag(schema.label)
        .summary(Some(summary))
        .operation_id(Some(operation_id))
        .security(SecurityRequirement::new("bearer_auth", Vec::<String>::new()))
        .response("401", plain_response("Missing or invalid token"))
}

fn json_body(schema: &EntitySchema) -> utoipa::openapi::request_body::RequestBody {
    RequestBodyBuilder::new()
        .content(
            "application/json",
            ContentBuilder::new().schema(reference(input_name(schema))).build(),
        )
        .required(Some(Required::True))
        .build()
}

fn collection_item(schema: &EntitySchema) -> PathItem {
    let name = schema.type_name();

    let list = operation(schema, format!("List active {} records", schema.label), format!("list{name}"))
        .response(
            "200",
            json_response(
                "Active records",
                RefOr::T(Schema::Array(
                    ArrayBuilder::new().items(reference(name.clone())).build(),
                )),
            ),
        );

    let create = operation(schema, format!("Create a {} record", schema.label), format!("create{name}"))
        .request_body(Some(json_body(schema)))
        .response("201", json_response("Created", reference(name.clone())))
        .response("400", plain_response("Duplicate value"))
        .response("422", plain_response("Invalid payload"));

    let mut item = PathItem::new(PathItemType::Get, list);
    item.operations.insert(PathItemType::Post, create.build());
    item
}

fn member_item(schema: &EntitySchema) -> PathItem {
    let name = schema.type_name();
    let id_param = || {
        ParameterBuilder::new()
            .name("id")
            .parameter_in(ParameterIn::Path)
            .required(Required::True)
            .description(Some("Record id"))
            .schema(Some(object(
                column_property(ColumnKind::Id, false).build(),
            )))
            .build()
    };

    let get = operation(schema, format!("Get a {} record", schema.label), format!("get{name}"))
        .parameter(id_param())
        .response("200", json_response("Record, active or not", reference(name.clone())))
        .response("404", plain_response("Not found"));

    let patch = operation(schema, format!("Update some fields of a {} record", schema.label), format!("patch{name}"))
        .parameter(id_param())
        .request_body(Some(json_body(schema)))
        .response("200", json_response("Updated", reference(name.clone())))
        .response("400", plain_response("Duplicate value"))
        .response("404", plain_response("Not found"))
        .response("422", plain_response("Invalid payload"));

    let put = operation(schema, format!("Replace a {} record", schema.label), format!("replace{name}"))
        .parameter(id_param())
        .request_body(Some(json_body(schema)))
        .response("200", json_response("Replaced", reference(name.clone())))
        .response("400", plain_response("Duplicate value"))
        .response("404", plain_response("Not found"))
        .response("422", plain_response("Invalid payload"));

    let delete = operation(schema, format!("Deactivate a {} record", schema.label), format!("delete{name}"))
        .parameter(id_param())
        .response("204", plain_response("Deactivated"))
        .response("404", plain_response("Not found"));

    let mut item = PathItem::new(PathItemType::Get, get);
    item.operations.insert(PathItemType::Patch, patch.build());
    item.operations.insert(PathItemType::Put, put.build());
    item.operations.insert(PathItemType::Delete, delete.build());
    item
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn document() -> Value {
        serde_json::to_value(ApiDoc::openapi()).unwrap()
    }

    #[test]
    fn every_entity_has_collection_and_member_paths() {
        let doc = document();
        for schema in ENTITIES {
            let collection = &doc["paths"][schema.path];
            assert!(collection["get"].is_object(), "{}", schema.path);
            assert!(collection["post"].is_object(), "{}", schema.path);

            let member = &doc["paths"][format!("{}/{{id}}", schema.path)];
            for method in ["get", "patch", "put", "delete"] {
                assert!(member[method].is_object(), "{} {method}", schema.path);
            }
        }
    }

    #[test]
    fn input_schema_lists_required_columns() {
        let doc = document();
        let input = &doc["components"]["schemas"]["DepartmentInput"];
        let required: Vec<_> = input["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(required, ["branch_id", "name", "short_name"]);
        assert_eq!(input["properties"]["short_name"]["maxLength"], 50);
    }

    #[test]
    fn auth_routes_and_bearer_scheme_are_documented() {
        let doc = document();
        assert!(doc["paths"]["/login"]["post"].is_object());
        assert!(doc["paths"]["/register"]["post"].is_object());
        assert!(doc["components"]["securitySchemes"]["bearer_auth"].is_object());
    }
}
