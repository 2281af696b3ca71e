//! Provider lifecycle management
//!
//! Maps provider names to factories, owns the live adapter instances and
//! tracks initialization outcomes. Factories are registered explicitly at
//! construction time; the provider set is statically known.

use crate::config::ProviderConfig;
use crate::error::{RelayError, RelayResult};
use crate::provider::mock::MockProvider;
use crate::provider::traits::Provider;
use crate::provider::types::HealthReport;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Constructor for a provider adapter
pub type ProviderFactory = Arc<dyn Fn(ProviderConfig) -> Arc<dyn Provider> + Send + Sync>;

/// Lifecycle snapshot for one provider name
#[derive(Debug, Clone)]
pub struct LifecycleStatus {
    pub provider: String,
    /// A factory is registered under this name
    pub registered: bool,
    /// A live instance exists
    pub initialized: bool,
    /// The live instance reports itself available
    pub available: bool,
    /// Outcome of the most recent initialization attempt
    pub init_ok: bool,
    /// When this provider was last health-checked through the registry
    pub last_health_check: Option<DateTime<Utc>>,
}

/// Registry of provider factories and live instances
pub struct ProviderRegistry {
    factories: DashMap<String, ProviderFactory>,
    instances: DashMap<String, Arc<dyn Provider>>,
    /// Latest known config per name, used by `reinitialize`
    configs: DashMap<String, ProviderConfig>,
    init_status: DashMap<String, bool>,
    last_health_checks: DashMap<String, DateTime<Utc>>,
}

impl ProviderRegistry {
    /// Create a registry with the built-in factory table
    pub fn new() -> Self {
        let registry = Self {
            factories: DashMap::new(),
            instances: DashMap::new(),
            configs: DashMap::new(),
            init_status: DashMap::new(),
            last_health_checks: DashMap::new(),
        };
        registry.register("mock", Arc::new(|config| Arc::new(MockProvider::new(config))));
        registry
    }

    /// Register a factory under a provider name
    ///
    /// Registering an existing name replaces the previous factory.
    pub fn register(&self, name: impl Into<String>, factory: ProviderFactory) {
        let name = name.into();
        if self.factories.insert(name.clone(), factory).is_some() {
            warn!(provider = %name, "provider factory replaced");
        } else {
            info!(provider = %name, "provider factory registered");
        }
    }

    /// Initialize every enabled config, tolerating per-provider failure
    ///
    /// Returns the per-name boolean outcome; one bad provider never blocks
    /// the others.
    pub async fn initialize_all(
        &self,
        configs: Vec<ProviderConfig>,
    ) -> HashMap<String, bool> {
        let mut results = HashMap::new();

        for config in configs {
            if !config.enabled {
                continue;
            }
            let name = config.name.clone();
            let ok = match self.initialize_one(config).await {
                Ok(()) => true,
                Err(e) => {
                    error!(provider = %name, error = %e, "provider initialization failed");
                    false
                }
            };
            results.insert(name, ok);
        }

        info!(?results, "provider initialization complete");
        results
    }

    async fn initialize_one(&self, config: ProviderConfig) -> RelayResult<()> {
        let name = config.name.clone();
        self.configs.insert(name.clone(), config.clone());

        config.validate()?;

        // Clone the factory out so no map guard is held across `.await`.
        let factory: ProviderFactory = self
            .factories
            .get(&name)
            .map(|f| f.value().clone())
            .ok_or_else(|| RelayError::Configuration {
                message: format!("no factory registered for provider '{}'", name),
                provider: Some(name.clone()),
            })?;

        let timeout = config.timeout;
        let instance = factory(config);

        let outcome = tokio::time::timeout(timeout, instance.initialize())
            .await
            .map_err(|_| RelayError::timeout(name.as_str(), timeout.as_secs()))
            .and_then(|r| r);

        match outcome {
            Ok(()) => {
                self.instances.insert(name.clone(), instance);
                self.init_status.insert(name.clone(), true);
                info!(provider = %name, "provider initialized");
                Ok(())
            }
            Err(e) => {
                self.init_status.insert(name, false);
                Err(e)
            }
        }
    }

    /// Get a live provider, only while it reports itself available
    ///
    /// "Never existed" and "currently unavailable" are indistinguishable
    /// to callers.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        let instance = self.instances.get(name)?;
        if !instance.is_available() {
            warn!(provider = %name, "provider exists but is not available");
            return None;
        }
        Some(instance.clone())
    }

    /// Shut a provider down and remove its bookkeeping
    pub async fn shutdown(&self, name: &str) -> RelayResult<()> {
        let Some((_, instance)) = self.instances.remove(name) else {
            return Err(RelayError::unavailable(name, "provider not initialized"));
        };

        self.init_status.insert(name.to_string(), false);
        self.last_health_checks.remove(name);

        instance.shutdown().await?;
        info!(provider = %name, "provider shut down");
        Ok(())
    }

    /// Shut down, then initialize again from the latest configuration
    ///
    /// Supports live credential/model rotation without a process restart;
    /// call [`ProviderRegistry::update_config`] first to rotate.
    pub async fn reinitialize(&self, name: &str) -> RelayResult<()> {
        if self.instances.contains_key(name) {
            if let Err(e) = self.shutdown(name).await {
                warn!(provider = %name, error = %e, "shutdown before reinitialize failed");
            }
        }

        let config = self
            .configs
            .get(name)
            .map(|c| c.clone())
            .ok_or_else(|| RelayError::Configuration {
                message: format!("no configuration known for provider '{}'", name),
                provider: Some(name.to_string()),
            })?;

        self.initialize_one(config).await
    }

    /// Record a new config for a provider, used by the next `reinitialize`
    pub fn update_config(&self, config: ProviderConfig) {
        self.configs.insert(config.name.clone(), config);
    }

    /// Health-check every live provider concurrently
    ///
    /// Check failures are folded into unhealthy reports rather than
    /// aborting the sweep.
    pub async fn health_check_all(&self) -> HashMap<String, HealthReport> {
        let instances: Vec<(String, Arc<dyn Provider>)> = self
            .instances
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();

        let checks = instances.into_iter().map(|(name, instance)| async move {
            let report = match instance.health_check().await {
                Ok(report) => report,
                Err(e) => {
                    error!(provider = %name, error = %e, "health check failed");
                    HealthReport::unhealthy(name.as_str(), e.to_string())
                }
            };
            (name, report)
        });

        let mut reports = HashMap::new();
        for (name, report) in join_all(checks).await {
            self.last_health_checks.insert(name.clone(), Utc::now());
            reports.insert(name, report);
        }
        reports
    }

    /// Names with a registered factory
    pub fn registered_providers(&self) -> Vec<String> {
        self.factories.iter().map(|e| e.key().clone()).collect()
    }

    /// Names with a live instance, regardless of availability
    pub fn initialized_providers(&self) -> Vec<String> {
        self.instances.iter().map(|e| e.key().clone()).collect()
    }

    /// Names whose live instance reports itself available
    pub fn available_providers(&self) -> Vec<String> {
        self.instances
            .iter()
            .filter(|e| e.value().is_available())
            .map(|e| e.key().clone())
            .collect()
    }

    /// Lifecycle snapshot for one provider
    pub fn lifecycle_status(&self, name: &str) -> LifecycleStatus {
        let instance = self.instances.get(name);
        LifecycleStatus {
            provider: name.to_string(),
            registered: self.factories.contains_key(name),
            initialized: instance.is_some(),
            available: instance.map(|i| i.is_available()).unwrap_or(false),
            init_ok: self.init_status.get(name).map(|v| *v).unwrap_or(false),
            last_health_check: self.last_health_checks.get(name).map(|t| *t),
        }
    }

    /// Shut down every live provider
    pub async fn shutdown_all(&self) {
        let names: Vec<String> = self.initialized_providers();
        for name in names {
            if let Err(e) = self.shutdown(&name).await {
                warn!(provider = %name, error = %e, "shutdown failed");
            }
        }
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
