pub mod common;
pub mod documents;
pub mod public;
pub mod work_orders;
pub mod workers;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::services::documents::DocumentService;
use crate::services::notifications::Mailer;
use crate::services::work_orders::WorkOrderService;
use crate::services::workers::WorkerService;
use crate::storage::UploadStore;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers.
/// Built once at startup; everything here is cheap to clone.
#[derive(Clone)]
pub struct AppServices {
    pub work_orders: Arc<WorkOrderService>,
    pub workers: Arc<WorkerService>,
    pub documents: Arc<DocumentService>,
    pub mailer: Arc<Mailer>,
    pub photo_store: UploadStore,
    pub document_store: UploadStore,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, cfg: &AppConfig) -> Result<Self, ServiceError> {
        Ok(Self {
            work_orders: Arc::new(WorkOrderService::new(db.clone())),
            workers: Arc::new(WorkerService::new(db.clone())),
            documents: Arc::new(DocumentService::new(db, cfg.document_expiry_days)),
            mailer: Arc::new(Mailer::from_config(&cfg.smtp)?),
            photo_store: UploadStore::new(&cfg.upload_dir),
            document_store: UploadStore::new(&cfg.document_dir),
        })
    }
}
