use std::sync::Arc;

use crate::auth::TokenKeys;
use crate::clock::Clock;
use crate::config::AppConfig;
use crate::database::CustomerStore;
use crate::entitlement::RemediationLinks;

/// Everything a request handler needs, built once at startup and cloned
/// into each request. Collaborators are injected here instead of living in
/// process-wide singletons.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn CustomerStore>,
    pub clock: Arc<dyn Clock>,
    pub tokens: TokenKeys,
    pub links: RemediationLinks,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn CustomerStore>, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        config.validate()?;
        let tokens = TokenKeys::from_config(&config.security)?;
        let links = config.remediation_links()?;
        Ok(Self {
            config: Arc::new(config),
            store,
            clock,
            tokens,
            links,
        })
    }
}
