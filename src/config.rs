//! Desk configuration and bootstrap
//!
//! `desk_config.json` picks the backend every collection is served from,
//! per-view page sizes and the log directory. `Desk::open` builds one
//! repository per collection from it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::{Faq, Lead, Subscriber, Testimonial};
use crate::repository::sqlite::SharedConnection;
use crate::repository::{
    init_db, CollectionRepository, DbState, HttpRepository, InMemoryRepository, SqliteRepository,
    WireRecord,
};
use crate::transfer::Transferable;
use crate::view::{CollectionView, LeadBoard, ViewConfig};

pub const CONFIG_FILE: &str = "desk_config.json";

const APP_NAME: &str = "AgencyDesk";

/// Where the collections live
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Process-local store, empty at start
    #[default]
    Memory,
    Sqlite {
        path: PathBuf,
    },
    Http {
        base_url: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeskConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    /// View name -> page size
    #[serde(default)]
    pub page_sizes: BTreeMap<String, usize>,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl DeskConfig {
    pub fn page_size_for(&self, view: &str) -> Option<usize> {
        self.page_sizes.get(view).copied().filter(|&n| n > 0)
    }

    /// Preset with this config's page size override applied
    fn view_config<T: Transferable>(&self, preset: ViewConfig<T>) -> ViewConfig<T> {
        match self.page_size_for(preset.name) {
            Some(n) => preset.with_page_size(n),
            None => preset,
        }
    }
}

pub fn config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE)
}

/// Read `desk_config.json` from `dir`. Missing or unreadable files give `None`.
pub fn load_config(dir: &Path) -> Option<DeskConfig> {
    let path = config_path(dir);
    let text = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&text) {
        Ok(config) => Some(config),
        Err(e) => {
            log::warn!("Ignoring invalid {}: {}", path.display(), e);
            None
        }
    }
}

pub fn save_config(dir: &Path, config: &DeskConfig) -> Result<(), String> {
    std::fs::create_dir_all(dir).map_err(|e| format!("Failed to create config dir: {}", e))?;
    let json = serde_json::to_string_pretty(config).map_err(|e| e.to_string())?;
    std::fs::write(config_path(dir), json).map_err(|e| format!("Failed to write config: {}", e))
}

/// Start the rolling file logger when a log directory is configured
pub fn init_logging(config: &DeskConfig) -> Result<(), String> {
    match &config.log_dir {
        Some(dir) => rolling_logger::init_logger(dir.clone(), APP_NAME),
        None => Ok(()),
    }
}

enum Backend {
    Memory,
    Sqlite(SharedConnection),
    Http(reqwest::Client, String),
}

impl Backend {
    fn repository<T: WireRecord>(&self) -> Arc<dyn CollectionRepository<T>> {
        match self {
            Backend::Memory => Arc::new(InMemoryRepository::<T>::new()),
            Backend::Sqlite(conn) => Arc::new(SqliteRepository::<T>::new(conn.clone())),
            Backend::Http(client, base_url) => {
                Arc::new(HttpRepository::<T>::with_client(client.clone(), base_url))
            }
        }
    }
}

/// Repositories for every collection, built from one config
pub struct Desk {
    pub subscribers: Arc<dyn CollectionRepository<Subscriber>>,
    pub leads: Arc<dyn CollectionRepository<Lead>>,
    pub faqs: Arc<dyn CollectionRepository<Faq>>,
    pub testimonials: Arc<dyn CollectionRepository<Testimonial>>,
    config: DeskConfig,
    db_state: Option<DbState>,
}

impl Desk {
    pub async fn open(config: &DeskConfig) -> Result<Self, String> {
        let (backend, db_state) = match &config.backend {
            BackendConfig::Memory => (Backend::Memory, None),
            BackendConfig::Sqlite { path } => {
                let db_state = init_db(path).await?;
                (Backend::Sqlite(db_state.conn.clone()), Some(db_state))
            }
            BackendConfig::Http { base_url } => {
                if base_url.trim().is_empty() {
                    return Err("HTTP backend needs a base_url".to_string());
                }
                (Backend::Http(reqwest::Client::new(), base_url.clone()), None)
            }
        };
        log::info!("Desk opened with {:?} backend", config.backend);

        Ok(Self {
            subscribers: backend.repository(),
            leads: backend.repository(),
            faqs: backend.repository(),
            testimonials: backend.repository(),
            config: config.clone(),
            db_state,
        })
    }

    pub fn config(&self) -> &DeskConfig {
        &self.config
    }

    pub fn subscriber_table(
        &self,
    ) -> CollectionView<Subscriber, dyn CollectionRepository<Subscriber>> {
        let config = self.config.view_config(ViewConfig::subscriber_table());
        CollectionView::new(self.subscribers.clone(), config)
    }

    pub fn lead_table(&self) -> CollectionView<Lead, dyn CollectionRepository<Lead>> {
        CollectionView::new(self.leads.clone(), self.config.view_config(ViewConfig::lead_table()))
    }

    pub fn lead_board(&self) -> LeadBoard<dyn CollectionRepository<Lead>> {
        let config = self.config.view_config(ViewConfig::lead_board());
        LeadBoard::with_config(self.leads.clone(), config)
    }

    pub fn faq_list(&self) -> CollectionView<Faq, dyn CollectionRepository<Faq>> {
        CollectionView::new(self.faqs.clone(), self.config.view_config(ViewConfig::faq_list()))
    }

    pub fn testimonial_table(
        &self,
    ) -> CollectionView<Testimonial, dyn CollectionRepository<Testimonial>> {
        let config = self.config.view_config(ViewConfig::testimonial_table());
        CollectionView::new(self.testimonials.clone(), config)
    }

    /// Release the database connection, if any
    pub async fn close(&self) {
        if let Some(db_state) = &self.db_state {
            db_state.close().await;
        }
    }
}
