//! Test configuration loaders for scenarios covering success and failure paths.

use std::collections::HashMap;
use std::ffi::OsString;
use std::sync::Arc;

use inputpoller_config::{ClientBinding, Config};
use ortho_config::{OrthoConfig, OrthoError};

use crate::bootstrap::ConfigLoader;

/// Loader returning a configuration tuned for fast in-memory polling.
#[derive(Debug, Clone)]
pub struct TestConfigLoader {
    config: Config,
    environment: HashMap<String, String>,
}

impl TestConfigLoader {
    /// One client, `acme`, with zero wait and zero backoff.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: Config {
                wait_seconds: 0,
                receive_failure_backoff_ms: 0,
                clients: vec![ClientBinding::new("acme", "memory://acme-input")],
                ..Config::default()
            },
            environment: HashMap::new(),
        }
    }

    /// Applies an edit to the returned configuration.
    pub fn update(&mut self, edit: impl FnOnce(&mut Config)) {
        edit(&mut self.config);
    }

    /// Sets an environment value visible to client resolution.
    pub fn set_env(&mut self, key: &str, value: &str) {
        self.environment.insert(key.to_owned(), value.to_owned());
    }
}

impl Default for TestConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }

    fn environment(&self, key: &str) -> Option<String> {
        self.environment.get(key).cloned()
    }
}

/// Loader that intentionally fails by passing an invalid CLI argument.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("inputpollerd"),
            OsString::from("--poll-mode"),
            OsString::from("round_robin"),
        ];
        Config::load_from_iter(args)
    }

    fn environment(&self, _key: &str) -> Option<String> {
        None
    }
}
