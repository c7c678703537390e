//! Startup orchestration.
//!
//! Config is already validated when it reaches this module. Collaborators are
//! built in dependency order and any failure is fatal.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::auth::AuthError;
use crate::config::{AppConfig, MailProvider};
use crate::mail::{HttpMailer, LogMailer, MailError, Mailer};
use crate::store::{MemoryStore, Seed, Store};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to load seed data from {path}: {source}")]
    Seed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to build mail client: {0}")]
    Mail(#[from] MailError),
    #[error("failed to build auth client: {0}")]
    Auth(#[from] AuthError),
}

/// External collaborators the routes delegate to.
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn Store>,
    pub mailer: Arc<dyn Mailer>,
}

impl Services {
    pub fn new(store: Arc<dyn Store>, mailer: Arc<dyn Mailer>) -> Self {
        Self { store, mailer }
    }

    /// Build the store and mailer described by `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self, StartupError> {
        let store = match &config.store.seed_path {
            Some(path) => {
                let seed = Seed::load_from_file(Path::new(path)).map_err(|source| StartupError::Seed {
                    path: path.clone(),
                    source,
                })?;
                MemoryStore::from_seed(seed)
            }
            None => {
                tracing::warn!("No seed data configured; starting with an empty store");
                MemoryStore::new()
            }
        };

        let mailer: Arc<dyn Mailer> = match config.mail.provider {
            MailProvider::Log => Arc::new(LogMailer),
            MailProvider::Http => Arc::new(HttpMailer::new(
                &config.mail,
                Duration::from_secs(config.timeouts.mail_secs),
            )?),
        };

        tracing::info!(mail_provider = ?config.mail.provider, "Services initialized");
        Ok(Self::new(Arc::new(store), mailer))
    }
}
