use crate::{
    config::Config,
    services::{
        archive::ArchiveService, directory::DirectoryService, invoice::InvoiceService,
        ledger::LedgerService, lifecycle::ReviewPolicy, notification::NotificationDispatcher,
        salary::SalaryService,
    },
    store::Store,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<Config>,
    pub policy: Arc<ReviewPolicy>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
            policy: Arc::new(ReviewPolicy::default()),
        }
    }

    pub fn salaries(&self) -> SalaryService {
        SalaryService::new(self.store.clone())
    }

    pub fn invoices(&self) -> InvoiceService {
        InvoiceService::new(self.store.clone(), self.policy.clone())
    }

    pub fn ledger(&self) -> LedgerService {
        LedgerService::new(
            self.store.clone(),
            self.policy.clone(),
            self.config.conflict_retry_attempts,
        )
    }

    pub fn notifications(&self) -> NotificationDispatcher {
        NotificationDispatcher::new(self.store.clone())
    }

    pub fn directory(&self) -> DirectoryService {
        DirectoryService::new(self.store.clone())
    }

    pub fn archive(&self) -> ArchiveService {
        ArchiveService::new(self.store.clone())
    }
}
