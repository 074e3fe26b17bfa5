//! Named event-handler factories.
//!
//! Behaviour units are registered by name at startup and instantiated per
//! network from the `modules` list in its configuration.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::config::NetworkConfig;
use crate::event::{Event, EventHandler};

/// Builds a handler for one network.
pub type ModuleFactory = fn(&NetworkConfig) -> Box<dyn EventHandler>;

/// Registry of module factories, keyed by case-insensitive name.
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    factories: BTreeMap<String, ModuleFactory>,
}

impl ModuleRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: &str, factory: ModuleFactory) -> &mut Self {
        if self
            .factories
            .insert(name.to_ascii_lowercase(), factory)
            .is_some()
        {
            debug!(module = name, "replacing registered module");
        }
        self
    }

    /// Instantiate a module by name.
    pub fn create(&self, name: &str, config: &NetworkConfig) -> Option<Box<dyn EventHandler>> {
        self.factories
            .get(&name.to_ascii_lowercase())
            .map(|factory| factory(config))
    }

    /// Instantiate every module a network asks for. Unknown names are
    /// logged and skipped.
    pub fn load(&self, config: &NetworkConfig) -> Vec<Box<dyn EventHandler>> {
        config
            .modules
            .iter()
            .filter_map(|name| {
                let module = self.create(name, config);
                if module.is_none() {
                    warn!(network = %config.network, module = %name, "unknown module, skipping");
                }
                module
            })
            .collect()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

/// Registry with the modules that ship with the bot.
pub fn builtin() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    registry.register("logger", |config: &NetworkConfig| -> Box<dyn EventHandler> {
        Box::new(EventLogger {
            network: config.network.clone(),
        })
    });
    registry
}

/// Logs conversation events at `info`.
struct EventLogger {
    network: String,
}

impl EventHandler for EventLogger {
    fn notify(&self, event: &Event) {
        match event {
            Event::Message { actor, target, text } => {
                info!(network = %self.network, from = %actor.nick, to = ?target, "<{}> {}", actor.nick, text)
            }
            Event::Action { actor, target, text } => {
                info!(network = %self.network, from = %actor.nick, to = ?target, "* {} {}", actor.nick, text)
            }
            Event::Notice { actor, text, .. } => {
                info!(network = %self.network, from = %actor.nick, "-{}- {}", actor.nick, text)
            }
            Event::Join { actor, channel } => info!(network = %self.network, channel = %channel, "{} joined", actor.nick),
            Event::Part { actor, channel, .. } => info!(network = %self.network, channel = %channel, "{} left", actor.nick),
            Event::Kick { actor, channel, kicked, reason } => {
                info!(network = %self.network, channel = %channel, "{} kicked {} ({})", actor.nick, kicked, reason)
            }
            Event::Quit { actor, reason } => info!(network = %self.network, "{} quit ({})", actor.nick, reason),
            Event::Nick { actor, new_nick } => info!(network = %self.network, "{} is now {}", actor.nick, new_nick),
            _ => {}
        }
    }
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Silent;

    impl EventHandler for Silent {
        fn notify(&self, _event: &Event) {}
    }

    fn silent(_: &NetworkConfig) -> Box<dyn EventHandler> {
        Box::new(Silent)
    }

    #[test]
    fn test_load_skips_unknown() {
        let mut registry = ModuleRegistry::new();
        registry.register("Silent", silent);

        let mut config = NetworkConfig::new("net", "irc.example.com", 6667, "Bot");
        config.modules = vec!["silent".into(), "missing".into()];

        assert_eq!(registry.load(&config).len(), 1);
        assert!(registry.create("SILENT", &config).is_some());
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["silent"]);
    }

    #[test]
    fn test_builtin_logger() {
        let config = NetworkConfig::new("net", "irc.example.com", 6667, "Bot");
        let logger = builtin().create("logger", &config).unwrap();
        logger.notify(&Event::Quit {
            actor: Default::default(),
            reason: "bye".into(),
        });
    }
}
