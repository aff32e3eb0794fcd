use std::sync::Arc;

use crate::config::AppConfig;
use crate::store::{PgStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn init(config: AppConfig) -> Self {
        let store = Arc::new(PgStore::connect(&config.db)) as Arc<dyn UserStore>;
        Self {
            store,
            config: Arc::new(config),
        }
    }

    pub fn from_parts(store: Arc<dyn UserStore>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    /// State backed by an in-memory store, for tests.
    pub fn in_memory() -> Self {
        use crate::config::DbConfig;
        use crate::store::MemoryStore;

        let config = Arc::new(AppConfig {
            db: DbConfig {
                host: "localhost".into(),
                name: "test".into(),
                user: "test".into(),
                password: "test".into(),
            },
            listen_host: "127.0.0.1".into(),
            listen_port: 8080,
        });
        Self {
            store: Arc::new(MemoryStore::default()) as Arc<dyn UserStore>,
            config,
        }
    }
}
