use std::sync::Arc;

use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde_json::Value as JsonValue;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        document,
        document::DocumentStatus,
        document_field,
        document_field::FieldKind,
        document_signature,
    },
    errors::ServiceError,
};

/// Metadata for an uploaded PDF whose bytes have already been persisted to
/// the document store.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub title: String,
    pub description: Option<String>,
    pub stored_name: String,
    pub original_name: String,
    pub file_size: i64,
}

/// One field placement from the layout editor.
#[derive(Debug, Clone)]
pub struct NewField {
    pub field_type: FieldKind,
    pub name: String,
    pub label: Option<String>,
    pub page_number: i32,
    pub pos_x: f64,
    pub pos_y: f64,
    pub width: f64,
    pub height: f64,
    pub required: bool,
}

#[derive(Debug, Clone)]
pub struct NewDocumentSignature {
    pub data: String,
    pub signer_name: String,
    pub signer_email: Option<String>,
    pub field_values: JsonValue,
}

/// Check the raw upload for the PDF magic bytes: the `%PDF` header and a
/// `%%EOF` marker within the final kilobyte.
pub fn is_pdf_payload(bytes: &[u8]) -> bool {
    if !bytes.starts_with(b"%PDF") {
        return false;
    }
    let tail_start = bytes.len().saturating_sub(1024);
    bytes[tail_start..]
        .windows(5)
        .any(|window| window == b"%%EOF")
}

#[derive(Debug, Clone)]
pub struct DocumentService {
    db: Arc<DbPool>,
    expiry_days: i64,
}

impl DocumentService {
    pub fn new(db: Arc<DbPool>, expiry_days: i64) -> Self {
        Self { db, expiry_days }
    }

    #[instrument(skip(self, input), err)]
    pub async fn create(&self, input: NewDocument) -> Result<document::Model, ServiceError> {
        let created = document::ActiveModel {
            title: Set(input.title),
            description: Set(input.description),
            file_path: Set(input.stored_name),
            original_name: Set(input.original_name),
            file_size: Set(input.file_size),
            unique_id: Set(Uuid::new_v4().to_string()),
            status: Set(DocumentStatus::Pending),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;

        info!(id = created.id, "document uploaded");
        Ok(created)
    }

    #[instrument(skip(self), err)]
    pub async fn list(&self) -> Result<Vec<document::Model>, ServiceError> {
        Ok(document::Entity::find()
            .order_by_desc(document::Column::CreatedAt)
            .order_by_desc(document::Column::Id)
            .all(self.db.as_ref())
            .await?)
    }

    #[instrument(skip(self), err)]
    pub async fn get(&self, id: i32) -> Result<Option<document::Model>, ServiceError> {
        Ok(document::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?)
    }

    /// Resolve a document by its share token, lazily expiring it when the
    /// link has outlived its window. The expired state is persisted so later
    /// accesses short-circuit.
    #[instrument(skip(self), err)]
    pub async fn get_by_token(&self, token: &str) -> Result<Option<document::Model>, ServiceError> {
        let Some(doc) = document::Entity::find()
            .filter(document::Column::UniqueId.eq(token))
            .one(self.db.as_ref())
            .await?
        else {
            return Ok(None);
        };

        if matches!(doc.status, DocumentStatus::Pending | DocumentStatus::Ready)
            && Utc::now() > doc.created_at + Duration::days(self.expiry_days)
        {
            let mut model: document::ActiveModel = doc.into();
            model.status = Set(DocumentStatus::Expired);
            let doc = model.update(self.db.as_ref()).await?;
            info!(id = doc.id, "document share link expired");
            return Ok(Some(doc));
        }

        Ok(Some(doc))
    }

    /// Replace the whole field layout; the admin editor always posts the
    /// complete set.
    #[instrument(skip(self, fields), err)]
    pub async fn replace_fields(
        &self,
        document_id: i32,
        fields: Vec<NewField>,
    ) -> Result<Vec<document_field::Model>, ServiceError> {
        for field in &fields {
            if field.name.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "Field name is required".to_string(),
                ));
            }
            if field.width <= 0.0 || field.height <= 0.0 {
                return Err(ServiceError::ValidationError(format!(
                    "Field '{}' must have a positive size",
                    field.name
                )));
            }
            if field.page_number < 1 {
                return Err(ServiceError::ValidationError(format!(
                    "Field '{}' has an invalid page number",
                    field.name
                )));
            }
        }

        let txn = self.db.begin().await?;

        let doc = document::Entity::find_by_id(document_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Document not found".to_string()))?;

        if matches!(doc.status, DocumentStatus::Signed | DocumentStatus::Expired) {
            txn.rollback().await.ok();
            return Err(ServiceError::Conflict(
                "Document layout can no longer be edited".to_string(),
            ));
        }

        document_field::Entity::delete_many()
            .filter(document_field::Column::DocumentId.eq(doc.id))
            .exec(&txn)
            .await?;

        let mut saved = Vec::with_capacity(fields.len());
        for (index, field) in fields.into_iter().enumerate() {
            saved.push(
                document_field::ActiveModel {
                    document_id: Set(doc.id),
                    field_type: Set(field.field_type),
                    name: Set(field.name),
                    label: Set(field.label),
                    page_number: Set(field.page_number),
                    pos_x: Set(field.pos_x),
                    pos_y: Set(field.pos_y),
                    width: Set(field.width),
                    height: Set(field.height),
                    required: Set(field.required),
                    sort_order: Set(index as i32),
                    ..Default::default()
                }
                .insert(&txn)
                .await?,
            );
        }

        txn.commit().await?;

        info!(document_id, count = saved.len(), "document field layout saved");
        Ok(saved)
    }

    #[instrument(skip(self), err)]
    pub async fn fields(&self, document_id: i32) -> Result<Vec<document_field::Model>, ServiceError> {
        Ok(document_field::Entity::find()
            .filter(document_field::Column::DocumentId.eq(document_id))
            .order_by_asc(document_field::Column::SortOrder)
            .order_by_asc(document_field::Column::Id)
            .all(self.db.as_ref())
            .await?)
    }

    /// `pending` → `ready`. Publishing an already-ready document is a no-op;
    /// signed and expired documents cannot be republished.
    #[instrument(skip(self), err)]
    pub async fn publish(&self, id: i32) -> Result<document::Model, ServiceError> {
        let doc = document::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound("Document not found".to_string()))?;

        match doc.status {
            DocumentStatus::Ready => Ok(doc),
            DocumentStatus::Pending => {
                let mut model: document::ActiveModel = doc.into();
                model.status = Set(DocumentStatus::Ready);
                let doc = model.update(self.db.as_ref()).await?;
                info!(id = doc.id, "document published");
                Ok(doc)
            }
            DocumentStatus::Signed => Err(ServiceError::Conflict(
                "Document already signed".to_string(),
            )),
            DocumentStatus::Expired => Err(ServiceError::Conflict(
                "Document link has expired".to_string(),
            )),
        }
    }

    /// Collect the one signature for a ready document and flip it to
    /// `signed`, atomically. Same create-once, never-revert policy as the
    /// work-order flow.
    #[instrument(skip(self, input), err)]
    pub async fn sign(
        &self,
        token: &str,
        input: NewDocumentSignature,
    ) -> Result<document_signature::Model, ServiceError> {
        super::validate_signature_image(&input.data)?;
        if input.signer_name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Signer name is required".to_string(),
            ));
        }

        let doc = self
            .get_by_token(token)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Document not found".to_string()))?;

        match doc.status {
            DocumentStatus::Ready => {}
            DocumentStatus::Pending => {
                return Err(ServiceError::Conflict(
                    "Document is not ready for signing".to_string(),
                ))
            }
            DocumentStatus::Signed => {
                return Err(ServiceError::Conflict(
                    "Document already signed".to_string(),
                ))
            }
            DocumentStatus::Expired => {
                return Err(ServiceError::Conflict(
                    "Document link has expired".to_string(),
                ))
            }
        }

        self.check_required_fields(doc.id, &input.field_values)
            .await?;

        let txn = self.db.begin().await?;

        // Re-read under the transaction; the public page races against itself.
        let doc = document::Entity::find_by_id(doc.id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Document not found".to_string()))?;
        let already_signed = document_signature::Entity::find()
            .filter(document_signature::Column::DocumentId.eq(doc.id))
            .count(&txn)
            .await?
            > 0;
        if already_signed || doc.status != DocumentStatus::Ready {
            txn.rollback().await.ok();
            return Err(ServiceError::Conflict(
                "Document already signed".to_string(),
            ));
        }

        let saved = document_signature::ActiveModel {
            document_id: Set(doc.id),
            signature_data: Set(input.data),
            signer_name: Set(input.signer_name.trim().to_string()),
            signer_email: Set(input
                .signer_email
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty())),
            field_values: Set(input.field_values),
            signed_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut model: document::ActiveModel = doc.into();
        model.status = Set(DocumentStatus::Signed);
        model.update(&txn).await?;

        txn.commit().await?;

        info!(document_id = saved.document_id, "document signed");
        Ok(saved)
    }

    #[instrument(skip(self), err)]
    pub async fn signature(
        &self,
        document_id: i32,
    ) -> Result<Option<document_signature::Model>, ServiceError> {
        Ok(document_signature::Entity::find()
            .filter(document_signature::Column::DocumentId.eq(document_id))
            .one(self.db.as_ref())
            .await?)
    }

    /// Delete the document with its fields and signature in one transaction.
    /// Returns the stored filename so the caller can remove the file.
    #[instrument(skip(self), err)]
    pub async fn delete(&self, id: i32) -> Result<String, ServiceError> {
        let txn = self.db.begin().await?;

        let doc = document::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Document not found".to_string()))?;
        let stored_name = doc.file_path.clone();

        document_signature::Entity::delete_many()
            .filter(document_signature::Column::DocumentId.eq(doc.id))
            .exec(&txn)
            .await?;
        document_field::Entity::delete_many()
            .filter(document_field::Column::DocumentId.eq(doc.id))
            .exec(&txn)
            .await?;
        document::Entity::delete_by_id(doc.id).exec(&txn).await?;

        txn.commit().await?;

        info!(document_id = id, "document deleted");
        Ok(stored_name)
    }

    /// Every required text/date field must have a non-empty value; the
    /// signature fields are satisfied by the signature image itself.
    async fn check_required_fields(
        &self,
        document_id: i32,
        values: &JsonValue,
    ) -> Result<(), ServiceError> {
        let fields = self.fields(document_id).await?;
        for field in fields
            .iter()
            .filter(|f| f.required && f.field_type != FieldKind::Signature)
        {
            let filled = values
                .get(&field.name)
                .and_then(|v| v.as_str())
                .map(|v| !v.trim().is_empty())
                .unwrap_or(false);
            if !filled {
                return Err(ServiceError::ValidationError(format!(
                    "Field '{}' is required",
                    field.label.as_deref().unwrap_or(&field.name)
                )));
            }
        }
        Ok(())
    }
}
