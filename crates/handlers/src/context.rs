use infrastructure::{TableGateway, Tables};
use shared::Config;
use std::sync::Arc;

use crate::constraints::Constraints;

/// コールドスタート時に一度だけ組み立て、全リクエストで共有する依存関係
#[derive(Clone)]
pub struct HandlerContext {
    pub config: Config,
    pub tables: Tables,
    pub gateway: Arc<dyn TableGateway>,
    pub constraints: Arc<Constraints>,
}

impl HandlerContext {
    pub fn new(
        config: Config,
        tables: Tables,
        gateway: Arc<dyn TableGateway>,
        constraints: Arc<Constraints>,
    ) -> Self {
        Self {
            config,
            tables,
            gateway,
            constraints,
        }
    }
}
