//! Name to factory table used to pick a provider at startup.

use crate::error::Error;
use crate::provider::{cloudflare, desec, hetzner, memory, DynProvider};
use std::collections::BTreeMap;

/// Looks up a configuration variable by name, `std::env::var` in production.
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Builds a provider from its configuration variables.
#[allow(clippy::module_name_repetitions)]
pub trait ProviderFactory: Send + Sync {
    /// # Errors
    ///
    /// Returns [`Error::MissingEnv`] when a required credential variable is unset, or any
    /// error from constructing the provider.
    fn create(&self, env: EnvLookup<'_>) -> Result<DynProvider, Error>;
}

impl<F> ProviderFactory for F
where
    F: Fn(EnvLookup<'_>) -> Result<DynProvider, Error> + Send + Sync,
{
    fn create(&self, env: EnvLookup<'_>) -> Result<DynProvider, Error> {
        self(env)
    }
}

/// Provider factories by name.
#[derive(Default)]
#[allow(clippy::module_name_repetitions)]
pub struct ProviderRegistry {
    factories: BTreeMap<String, Box<dyn ProviderFactory>>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every backend shipped with dyncrab.
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(cloudflare::NAME, cloudflare::from_env);
        registry.register(desec::NAME, desec::from_env);
        registry.register(hetzner::NAME, hetzner::from_env);
        registry.register(memory::NAME, memory::from_env);
        registry
    }

    /// Register `factory` under `name`, replacing any earlier registration.
    pub fn register(&mut self, name: impl Into<String>, factory: impl ProviderFactory + 'static) {
        self.factories.insert(name.into(), Box::new(factory));
    }

    #[must_use]
    pub fn has_provider(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered provider names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Create the provider registered as `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownProvider`] if nothing is registered under `name`, otherwise
    /// whatever the factory returns.
    pub fn create(&self, name: &str, env: EnvLookup<'_>) -> Result<DynProvider, Error> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| Error::UnknownProvider(name.to_string()))?;
        factory.create(env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn builtin_backends_are_registered() {
        let registry = ProviderRegistry::with_builtin();
        assert_eq!(registry.names(), vec!["cloudflare", "desec", "hetzner", "memory"]);
        assert!(registry.has_provider("memory"));
        assert!(!registry.has_provider("bunny"));
    }

    #[test]
    fn unknown_provider_is_a_config_error() {
        let registry = ProviderRegistry::with_builtin();
        let env = lookup(&[]);
        assert!(matches!(
            registry.create("route53", &env),
            Err(Error::UnknownProvider(name)) if name == "route53"
        ));
    }

    #[test]
    fn backends_require_their_credentials() {
        let registry = ProviderRegistry::with_builtin();
        let env = lookup(&[]);
        for (name, var) in [
            ("cloudflare", "DDNS_CLOUDFLARE_APITOKEN"),
            ("desec", "DDNS_DESEC_TOKEN"),
            ("hetzner", "DDNS_HETZNER_TOKEN"),
        ] {
            assert!(
                matches!(registry.create(name, &env), Err(Error::MissingEnv(v)) if v == var),
                "provider {name}"
            );
        }
    }

    #[test]
    fn creates_configured_backends() {
        let registry = ProviderRegistry::with_builtin();
        let env = lookup(&[
            ("DDNS_CLOUDFLARE_APITOKEN", "cf-token"),
            ("DDNS_DESEC_TOKEN", "desec-token"),
            ("DDNS_HETZNER_TOKEN", "hetzner-token"),
        ]);
        for name in ["cloudflare", "desec", "hetzner", "memory"] {
            let provider = registry.create(name, &env).unwrap();
            assert_eq!(provider.name(), name);
        }
    }

    #[test]
    fn custom_factories_can_be_registered() {
        let mut registry = ProviderRegistry::new();
        registry.register("custom", |_env: EnvLookup<'_>| {
            Ok(std::sync::Arc::new(memory::InMemoryProvider::new(["example.net"])) as DynProvider)
        });
        let env = lookup(&[]);
        assert_eq!(registry.create("custom", &env).unwrap().name(), "memory");
    }
}
