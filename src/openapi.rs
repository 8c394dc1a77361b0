use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "worksign API",
        version = "0.1.0",
        description = r#"
# worksign API

Maintenance work-order tracking with share-link signature capture, plus a
PDF signature module.

## Work orders

Create a ticket with photo attachments, share it through an unguessable
link, collect a drawn signature, and export the filtered ticket base as CSV.

## Documents

Upload a PDF, lay out signature/text/date fields, publish it, and collect
one signature from a recipient before the share link expires.

## Access model

The admin JSON API carries no credentials; the public pages are addressed by
share token, and knowledge of the token is the only credential.

## Error handling

Errors use a consistent envelope:

```json
{
  "success": false,
  "error": "Work order not found"
}
```
"#
    ),
    paths(
        crate::handlers::work_orders::create_work_order,
        crate::handlers::work_orders::list_work_orders,
        crate::handlers::work_orders::export_work_orders,
        crate::handlers::work_orders::get_work_order,
        crate::handlers::work_orders::delete_work_order,
        crate::handlers::work_orders::add_signature,
        crate::handlers::work_orders::recent_sites,
        crate::handlers::workers::create_worker,
        crate::handlers::workers::list_workers,
        crate::handlers::workers::search_workers,
        crate::handlers::workers::update_worker,
        crate::handlers::workers::delete_worker,
        crate::handlers::documents::upload_document,
        crate::handlers::documents::list_documents,
        crate::handlers::documents::get_document,
        crate::handlers::documents::save_fields,
        crate::handlers::documents::list_fields,
        crate::handlers::documents::publish_document,
        crate::handlers::documents::delete_document,
        crate::handlers::public::work_order_data,
        crate::handlers::public::document_data,
        crate::handlers::public::sign_document,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::handlers::work_orders::SignatureRequest,
        crate::handlers::workers::WorkerRequest,
        crate::handlers::documents::FieldSpec,
        crate::handlers::public::DocumentSignRequest,
        crate::entities::WorkOrderStatus,
        crate::entities::DocumentStatus,
        crate::entities::FieldKind,
    )),
    tags(
        (name = "work-orders", description = "Maintenance ticket management"),
        (name = "workers", description = "Worker roster"),
        (name = "documents", description = "PDF signature documents"),
        (name = "public", description = "Token-addressed public endpoints"),
    )
)]
pub struct ApiDoc;

/// Swagger UI mounted at `/swagger-ui`, serving the spec from
/// `/api-docs/openapi.json`.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
