use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{info, instrument};

use crate::{db::DbPool, entities::worker, errors::ServiceError};

/// Input for creating or updating a roster entry.
#[derive(Debug, Clone)]
pub struct WorkerInput {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WorkerService {
    db: Arc<DbPool>,
}

impl WorkerService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input), err)]
    pub async fn create(&self, input: WorkerInput) -> Result<worker::Model, ServiceError> {
        let created = worker::ActiveModel {
            name: Set(input.name),
            phone: Set(input.phone),
            email: Set(input.email),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;

        info!(id = created.id, "worker created");
        Ok(created)
    }

    #[instrument(skip(self), err)]
    pub async fn list(&self) -> Result<Vec<worker::Model>, ServiceError> {
        Ok(worker::Entity::find()
            .order_by_asc(worker::Column::Name)
            .all(self.db.as_ref())
            .await?)
    }

    #[instrument(skip(self), err)]
    pub async fn get(&self, id: i32) -> Result<Option<worker::Model>, ServiceError> {
        Ok(worker::Entity::find_by_id(id).one(self.db.as_ref()).await?)
    }

    #[instrument(skip(self, input), err)]
    pub async fn update(&self, id: i32, input: WorkerInput) -> Result<worker::Model, ServiceError> {
        let existing = worker::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound("Worker not found".to_string()))?;

        let mut model: worker::ActiveModel = existing.into();
        model.name = Set(input.name);
        model.phone = Set(input.phone);
        model.email = Set(input.email);

        Ok(model.update(self.db.as_ref()).await?)
    }

    #[instrument(skip(self), err)]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let result = worker::Entity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound("Worker not found".to_string()));
        }
        info!(id, "worker deleted");
        Ok(())
    }

    /// Substring search across name, phone and email, alphabetical order.
    #[instrument(skip(self), err)]
    pub async fn search(&self, query: &str) -> Result<Vec<worker::Model>, ServiceError> {
        if query.trim().is_empty() {
            return self.list().await;
        }

        Ok(worker::Entity::find()
            .filter(
                Condition::any()
                    .add(worker::Column::Name.contains(query))
                    .add(worker::Column::Phone.contains(query))
                    .add(worker::Column::Email.contains(query)),
            )
            .order_by_asc(worker::Column::Name)
            .all(self.db.as_ref())
            .await?)
    }
}
