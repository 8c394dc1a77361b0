use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle of a maintenance ticket. `Confirmed` is entered exactly once,
/// when a signature is attached, and never reverts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "work_order_status")]
#[serde(rename_all = "lowercase")]
pub enum WorkOrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
}

impl WorkOrderStatus {
    /// Localized label used by the CSV export and the public pages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "待確認",
            Self::Confirmed => "已確認",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "work_orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Human-readable ticket number, `WO<YYYYMMDD><seq>`; unique and immutable
    pub work_order_number: String,
    /// Ticket date, stored as a `YYYY-MM-DD` string
    pub date: String,
    pub site_name: Option<String>,
    pub building: Option<String>,
    pub floor: Option<String>,
    pub unit: Option<String>,
    pub reason: Option<String>,
    pub worker_name: Option<String>,
    pub amount: f64,
    pub status: WorkOrderStatus,
    /// Opaque share token; knowing it is the only credential for the public view
    pub unique_link: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::work_order_photo::Entity")]
    Photos,
    #[sea_orm(has_many = "super::signature::Entity")]
    Signatures,
}

impl Related<super::work_order_photo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Photos.def()
    }
}

impl Related<super::signature::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Signatures.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;

        let now = Utc::now();

        if insert {
            active_model.created_at = Set(now);
        }

        active_model.updated_at = Set(now);

        Ok(active_model)
    }
}
