// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Client Registry
//!
//! Global-by-name lookup of `RabbitClient`s. The registry is an ordinary value: the
//! application creates one at its composition root and shares it where clients
//! need to be found by name.

use crate::{
    client::RabbitClient, config::RabbitClientConfig, errors::AmqpError,
    transport::ConnectionManager,
};
use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};
use tracing::warn;

/// Maps logical client names to clients. Entries live until unregistered.
#[derive(Default)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<String, Arc<RabbitClient>>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a client for `config` and registers it right away.
    ///
    /// The client is not connected; call `RabbitClient::connect` on the result.
    pub fn client(
        &self,
        config: RabbitClientConfig,
        manager: Arc<dyn ConnectionManager>,
    ) -> Result<Arc<RabbitClient>, AmqpError> {
        let client = RabbitClient::new(config, manager);
        self.register(client.clone())?;
        Ok(client)
    }

    /// Registers `client` under its name and returns the client it replaced.
    ///
    /// A name collision overwrites the previous entry.
    pub fn register(
        &self,
        client: Arc<RabbitClient>,
    ) -> Result<Option<Arc<RabbitClient>>, AmqpError> {
        if client.name().is_empty() {
            return Err(AmqpError::ConfigurationError(
                "client name is required".to_owned(),
            ));
        }

        let mut clients = self.clients.write().unwrap_or_else(PoisonError::into_inner);
        let previous = clients.insert(client.name().to_owned(), client);
        if let Some(previous) = &previous {
            warn!(name = previous.name(), "client name registered twice, replacing it");
        }

        Ok(previous)
    }

    /// Returns the client registered under `name`.
    ///
    /// # Errors
    /// `UnknownClient` listing every registered name when `name` is not registered.
    pub fn lookup(&self, name: &str) -> Result<Arc<RabbitClient>, AmqpError> {
        if name.is_empty() {
            return Err(AmqpError::ConfigurationError(
                "client name is required".to_owned(),
            ));
        }

        if let Some(client) = self
            .clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Ok(client.clone());
        }

        Err(AmqpError::UnknownClient {
            name: name.to_owned(),
            available: self.names().join(", "),
        })
    }

    pub fn unregister(&self, name: &str) -> Option<Arc<RabbitClient>> {
        self.clients
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let clients = self.clients.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = clients.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockConnectionManager;

    fn manager() -> Arc<dyn ConnectionManager> {
        Arc::new(MockConnectionManager::new())
    }

    #[test]
    fn client_is_found_under_its_name() {
        let registry = ClientRegistry::new();
        let billing = registry
            .client(RabbitClientConfig::new("localhost").name("billing"), manager())
            .unwrap();
        let default = registry
            .client(RabbitClientConfig::new("localhost"), manager())
            .unwrap();

        assert!(Arc::ptr_eq(&registry.lookup("billing").unwrap(), &billing));
        assert!(Arc::ptr_eq(&registry.lookup("_def").unwrap(), &default));
    }

    #[test]
    fn unknown_name_lists_registered_clients() {
        let registry = ClientRegistry::new();
        registry
            .client(RabbitClientConfig::new("localhost").name("orders"), manager())
            .unwrap();
        registry
            .client(RabbitClientConfig::new("localhost").name("billing"), manager())
            .unwrap();

        let err = registry.lookup("audit").err().unwrap();
        assert_eq!(
            err,
            AmqpError::UnknownClient {
                name: "audit".to_owned(),
                available: "billing, orders".to_owned(),
            }
        );
        assert!(err.to_string().contains("billing, orders"));
    }

    #[test]
    fn same_name_overwrites_previous_client() {
        let registry = ClientRegistry::new();
        let first = registry
            .client(RabbitClientConfig::new("one").name("main"), manager())
            .unwrap();

        let second = RabbitClient::new(RabbitClientConfig::new("two").name("main"), manager());
        let replaced = registry.register(second.clone()).unwrap().unwrap();

        assert!(Arc::ptr_eq(&replaced, &first));
        assert!(Arc::ptr_eq(&registry.lookup("main").unwrap(), &second));
        assert_eq!(registry.names(), vec!["main".to_owned()]);
    }

    #[test]
    fn empty_names_are_rejected_and_unregister_removes() {
        let registry = ClientRegistry::new();
        let nameless = RabbitClient::new(RabbitClientConfig::new("localhost").name(""), manager());

        assert!(matches!(
            registry.register(nameless),
            Err(AmqpError::ConfigurationError(_))
        ));
        assert!(matches!(
            registry.lookup(""),
            Err(AmqpError::ConfigurationError(_))
        ));

        registry
            .client(RabbitClientConfig::new("localhost"), manager())
            .unwrap();
        assert!(registry.unregister("_def").is_some());
        assert!(registry.lookup("_def").is_err());
    }
}
