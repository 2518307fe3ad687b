use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::{DbPool, OrmConn};
use crate::gateways::{Mailer, PaymentGateway, TextEnhancer};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub payments: Arc<dyn PaymentGateway>,
    pub enhancer: Arc<dyn TextEnhancer>,
    pub mailer: Arc<dyn Mailer>,
    pub config: AppConfig,
}
