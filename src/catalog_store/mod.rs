mod models;
pub mod normalize;
pub mod reconcile;
mod schema;
mod store;
mod trait_def;

pub use models::*;
pub use reconcile::{plan_reconciliation, ReconcileError, ReconciliationPlan};
pub use schema::CATALOG_VERSIONED_SCHEMAS;
pub use store::SqliteCatalogStore;
pub use trait_def::CatalogStore;

#[cfg(any(test, feature = "mock"))]
pub use trait_def::MockCatalogStore;

use crate::error::ServiceError;

impl From<ReconcileError> for ServiceError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::DuplicateAssociationId(_) => ServiceError::BadRequest(err.to_string()),
            ReconcileError::UnknownAssociationId(_) => ServiceError::NotFound(err.to_string()),
        }
    }
}
