use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        signature, site, work_order,
        work_order::WorkOrderStatus,
        work_order_photo,
    },
    errors::ServiceError,
};

/// Retries for the create transaction when the generated ticket number loses
/// the race against a concurrent same-date insert and hits the UNIQUE column.
const TICKET_NUMBER_RETRIES: u32 = 3;

/// Input for creating a work order.
#[derive(Debug, Clone, Default)]
pub struct NewWorkOrder {
    pub date: Option<String>,
    pub site_name: Option<String>,
    pub building: Option<String>,
    pub floor: Option<String>,
    pub unit: Option<String>,
    pub reason: Option<String>,
    pub worker_name: Option<String>,
    pub amount: Option<f64>,
}

/// A photo already persisted to the upload store, awaiting its database row.
#[derive(Debug, Clone)]
pub struct NewPhoto {
    pub stored_name: String,
    pub original_name: Option<String>,
    pub file_size: i64,
}

#[derive(Debug, Clone)]
pub struct NewSignature {
    pub data: String,
    pub signer_name: Option<String>,
    pub signer_email: Option<String>,
}

/// Optional list filters; all of them combine conjunctively.
#[derive(Debug, Clone, Default)]
pub struct WorkOrderFilters {
    pub site_name: Option<String>,
    pub building: Option<String>,
    pub status: Option<WorkOrderStatus>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

/// A work order hydrated with its photos and signature, the shape every read
/// endpoint returns.
#[derive(Debug, Clone, Serialize)]
pub struct WorkOrderDetail {
    #[serde(flatten)]
    pub order: work_order::Model,
    pub photos: Vec<work_order_photo::Model>,
    pub signature: Option<signature::Model>,
}

#[derive(Debug, Clone)]
pub struct WorkOrderService {
    db: Arc<DbPool>,
}

impl WorkOrderService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Create a work order together with its photo rows and the site-MRU
    /// upsert, all in one transaction. The ticket number is derived from the
    /// order's date; a unique-constraint collision restarts the transaction
    /// with a recomputed sequence.
    #[instrument(skip(self, input, photos), err)]
    pub async fn create(
        &self,
        input: NewWorkOrder,
        photos: Vec<NewPhoto>,
    ) -> Result<WorkOrderDetail, ServiceError> {
        let date = normalize_date(input.date.as_deref())?;
        let amount = input.amount.unwrap_or(0.0);
        if !amount.is_finite() {
            return Err(ServiceError::ValidationError(
                "Amount must be a number".to_string(),
            ));
        }

        let mut attempt = 0;
        loop {
            attempt += 1;

            let txn = self.db.begin().await?;

            let same_date = work_order::Entity::find()
                .filter(work_order::Column::Date.eq(date.clone()))
                .count(&txn)
                .await?;
            let number = format_ticket_number(&date, same_date + 1);
            let unique_link = Uuid::new_v4().to_string();

            let order = work_order::ActiveModel {
                work_order_number: Set(number.clone()),
                date: Set(date.clone()),
                site_name: Set(none_if_blank(input.site_name.clone())),
                building: Set(none_if_blank(input.building.clone())),
                floor: Set(none_if_blank(input.floor.clone())),
                unit: Set(none_if_blank(input.unit.clone())),
                reason: Set(none_if_blank(input.reason.clone())),
                worker_name: Set(none_if_blank(input.worker_name.clone())),
                amount: Set(amount),
                status: Set(WorkOrderStatus::Pending),
                unique_link: Set(unique_link),
                ..Default::default()
            };

            let order = match order.insert(&txn).await {
                Ok(order) => order,
                Err(err) => {
                    txn.rollback().await.ok();
                    if is_unique_violation(&err) && attempt < TICKET_NUMBER_RETRIES {
                        warn!(
                            ticket = %number,
                            attempt,
                            "ticket number collided with a concurrent insert, retrying"
                        );
                        continue;
                    }
                    if is_unique_violation(&err) {
                        return Err(ServiceError::Conflict(
                            "Could not allocate a unique work order number".to_string(),
                        ));
                    }
                    return Err(err.into());
                }
            };

            for photo in &photos {
                work_order_photo::ActiveModel {
                    work_order_id: Set(order.id),
                    photo_path: Set(photo.stored_name.clone()),
                    original_name: Set(photo.original_name.clone()),
                    file_size: Set(Some(photo.file_size)),
                    uploaded_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
            }

            if let Some(site_name) = order.site_name.clone() {
                site::Entity::insert(site::ActiveModel {
                    name: Set(site_name),
                    last_used_at: Set(Utc::now()),
                    ..Default::default()
                })
                .on_conflict(
                    OnConflict::column(site::Column::Name)
                        .update_column(site::Column::LastUsedAt)
                        .to_owned(),
                )
                .exec(&txn)
                .await?;
            }

            txn.commit().await?;

            info!(id = order.id, ticket = %order.work_order_number, "work order created");

            return Ok(WorkOrderDetail {
                photos: self.photos_of(order.id).await?,
                signature: None,
                order,
            });
        }
    }

    #[instrument(skip(self), err)]
    pub async fn get(&self, id: i32) -> Result<Option<WorkOrderDetail>, ServiceError> {
        let Some(order) = work_order::Entity::find_by_id(id).one(self.db.as_ref()).await? else {
            return Ok(None);
        };
        Ok(Some(self.hydrate(order).await?))
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_token(&self, token: &str) -> Result<Option<WorkOrderDetail>, ServiceError> {
        let Some(order) = work_order::Entity::find()
            .filter(work_order::Column::UniqueLink.eq(token))
            .one(self.db.as_ref())
            .await?
        else {
            return Ok(None);
        };
        Ok(Some(self.hydrate(order).await?))
    }

    /// List work orders newest-created-first, hydrated. The extra per-row
    /// queries are fine at this data scale.
    #[instrument(skip(self, filters), err)]
    pub async fn list(
        &self,
        filters: &WorkOrderFilters,
    ) -> Result<Vec<WorkOrderDetail>, ServiceError> {
        let mut condition = Condition::all();
        if let Some(site_name) = filters.site_name.as_deref().filter(|s| !s.is_empty()) {
            condition = condition.add(work_order::Column::SiteName.contains(site_name));
        }
        if let Some(building) = filters.building.as_deref().filter(|s| !s.is_empty()) {
            condition = condition.add(work_order::Column::Building.contains(building));
        }
        if let Some(status) = filters.status {
            condition = condition.add(work_order::Column::Status.eq(status));
        }
        if let Some(from) = filters.date_from.as_deref().filter(|s| !s.is_empty()) {
            condition = condition.add(work_order::Column::Date.gte(from));
        }
        if let Some(to) = filters.date_to.as_deref().filter(|s| !s.is_empty()) {
            condition = condition.add(work_order::Column::Date.lte(to));
        }

        let orders = work_order::Entity::find()
            .filter(condition)
            .order_by_desc(work_order::Column::CreatedAt)
            .order_by_desc(work_order::Column::Id)
            .all(self.db.as_ref())
            .await?;

        let mut details = Vec::with_capacity(orders.len());
        for order in orders {
            details.push(self.hydrate(order).await?);
        }
        Ok(details)
    }

    /// Attach the signature and flip the order to `confirmed`, atomically.
    ///
    /// An order that already carries a signature is rejected with a conflict;
    /// the confirmed state never reverts and is entered exactly once.
    #[instrument(skip(self, input), err)]
    pub async fn add_signature(
        &self,
        id: i32,
        input: NewSignature,
    ) -> Result<signature::Model, ServiceError> {
        super::validate_signature_image(&input.data)?;

        let txn = self.db.begin().await?;

        let order = work_order::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Work order not found".to_string()))?;

        let already_signed = signature::Entity::find()
            .filter(signature::Column::WorkOrderId.eq(order.id))
            .count(&txn)
            .await?
            > 0;
        if already_signed || order.status == WorkOrderStatus::Confirmed {
            txn.rollback().await.ok();
            return Err(ServiceError::Conflict(
                "Work order already signed".to_string(),
            ));
        }

        let saved = signature::ActiveModel {
            work_order_id: Set(order.id),
            signature_data: Set(input.data),
            signer_name: Set(none_if_blank(input.signer_name)),
            signer_email: Set(none_if_blank(input.signer_email)),
            signed_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut order: work_order::ActiveModel = order.into();
        order.status = Set(WorkOrderStatus::Confirmed);
        order.update(&txn).await?;

        txn.commit().await?;

        info!(work_order_id = id, "work order signed and confirmed");

        Ok(saved)
    }

    /// Delete the order with its signature and photo rows in one transaction.
    /// Returns the stored photo filenames so the caller can clean up the
    /// files afterwards, best-effort.
    #[instrument(skip(self), err)]
    pub async fn delete(&self, id: i32) -> Result<Vec<String>, ServiceError> {
        let txn = self.db.begin().await?;

        let order = work_order::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Work order not found".to_string()))?;

        let photo_paths: Vec<String> = work_order_photo::Entity::find()
            .filter(work_order_photo::Column::WorkOrderId.eq(order.id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|photo| photo.photo_path)
            .collect();

        signature::Entity::delete_many()
            .filter(signature::Column::WorkOrderId.eq(order.id))
            .exec(&txn)
            .await?;
        work_order_photo::Entity::delete_many()
            .filter(work_order_photo::Column::WorkOrderId.eq(order.id))
            .exec(&txn)
            .await?;
        work_order::Entity::delete_by_id(order.id).exec(&txn).await?;

        txn.commit().await?;

        info!(work_order_id = id, "work order deleted");

        Ok(photo_paths)
    }

    /// The most recently used site names, for autocomplete.
    #[instrument(skip(self), err)]
    pub async fn recent_sites(&self, limit: u64) -> Result<Vec<String>, ServiceError> {
        let sites = site::Entity::find()
            .order_by_desc(site::Column::LastUsedAt)
            .order_by_desc(site::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;
        Ok(sites.into_iter().map(|s| s.name).collect())
    }

    async fn hydrate(&self, order: work_order::Model) -> Result<WorkOrderDetail, ServiceError> {
        let photos = self.photos_of(order.id).await?;
        let signature = signature::Entity::find()
            .filter(signature::Column::WorkOrderId.eq(order.id))
            .one(self.db.as_ref())
            .await?;
        Ok(WorkOrderDetail {
            order,
            photos,
            signature,
        })
    }

    async fn photos_of(&self, order_id: i32) -> Result<Vec<work_order_photo::Model>, ServiceError> {
        Ok(work_order_photo::Entity::find()
            .filter(work_order_photo::Column::WorkOrderId.eq(order_id))
            .order_by_asc(work_order_photo::Column::Id)
            .all(self.db.as_ref())
            .await?)
    }
}

/// `WO<YYYYMMDD><seq>`, sequence zero-padded to 3 digits.
pub fn format_ticket_number(date: &str, seq: u64) -> String {
    format!("WO{}{:03}", date.replace('-', ""), seq)
}

fn normalize_date(date: Option<&str>) -> Result<String, ServiceError> {
    match date.map(str::trim).filter(|d| !d.is_empty()) {
        Some(date) => {
            NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
                ServiceError::ValidationError(format!("Invalid date: {}", date))
            })?;
            Ok(date.to_string())
        }
        None => Ok(Utc::now().format("%Y-%m-%d").to_string()),
    }
}

fn none_if_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
