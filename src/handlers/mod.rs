pub mod cash;
pub mod customers;
pub mod dashboard;
pub mod inventory;
pub mod returns;
pub mod settings;
pub mod suppliers;

use std::sync::Arc;

use crate::{db::DbPool, events::EventSender};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub suppliers: Arc<crate::services::suppliers::SupplierService>,
    pub customers: Arc<crate::services::customers::CustomerService>,
    pub inventory: Arc<crate::services::inventory::InventoryService>,
    pub returns: Arc<crate::services::returns::ReturnService>,
    pub cash: Arc<crate::services::cash::CashService>,
    pub reports: Arc<crate::services::reports::ReportService>,
    pub settings: Arc<crate::services::settings::SettingsService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        let suppliers = Arc::new(crate::services::suppliers::SupplierService::new(
            db.clone(),
            event_sender.clone(),
        ));
        let customers = Arc::new(crate::services::customers::CustomerService::new(
            db.clone(),
            event_sender.clone(),
        ));
        let inventory = Arc::new(crate::services::inventory::InventoryService::new(
            db.clone(),
            event_sender.clone(),
        ));
        let returns = Arc::new(crate::services::returns::ReturnService::new(
            db.clone(),
            event_sender.clone(),
        ));
        let cash = Arc::new(crate::services::cash::CashService::new(
            db.clone(),
            event_sender.clone(),
        ));
        let reports = Arc::new(crate::services::reports::ReportService::new(db.clone()));
        let settings = Arc::new(crate::services::settings::SettingsService::new(
            db,
            event_sender,
        ));

        Self {
            suppliers,
            customers,
            inventory,
            returns,
            cash,
            reports,
            settings,
        }
    }
}
