//! Food Rebalanced Override Engine
//!
//! Host-agnostic core for rebalancing consumable items in a running simulation.
//! Operators edit a JSON override file; the engine patches item definitions at
//! startup, recomputes nutrition on every consumption, rolls secondary effects,
//! and grants enchantments. The host plugs in through the traits in [`host`].

pub mod command;
pub mod config;
pub mod consumption;
pub mod host;
pub mod identity;
pub mod patcher;
pub mod record;
pub mod resolver;
pub mod sandbox;
pub mod store;

// Re-export commonly used types
pub use command::{AdminCommand, CommandReply, dispatch, tab_complete, usage};
pub use config::{ConfigError, DEFAULT_FILE_NAME, EngineConfig};
pub use consumption::{
    ConsumptionOutcome, ConsumptionProcessor, EffectGrant, EnchantGrant, NutritionChange,
};
pub use host::{
    CommandSender, ConsumedItem, Consumer, DefaultEffect, EffectCatalog, EffectHandle,
    EmbeddedEffect, EnchantHandle, EnchantmentCatalog, FoodCatalog, FoodDefaults, FoodDefinitions,
    HostError,
};
pub use identity::{IdentityParseError, ItemIdentity};
pub use patcher::{PatchReport, apply_overrides};
pub use record::{
    EffectSpec, EnchantSpec, OverrideDocument, OverrideMap, OverrideRecord, RetainedEntries,
};
pub use resolver::{resolve_effect, resolve_enchantment};
pub use sandbox::{SandboxConsumer, SandboxHost, SandboxSender, SandboxStack};
pub use store::{
    LoadReport, MemorySource, OverrideFile, OverrideSource, OverrideStore, SourceState, StoreError,
};

use rand::Rng;

/// Owning handle for the engine's process-wide state.
///
/// Created once during host startup, shared with event handlers by reference,
/// and consumed by [`OverrideEngine::shutdown`].
pub struct OverrideEngine {
    config: EngineConfig,
    store: OverrideStore,
    startup: LoadReport,
    patch: PatchReport,
}

impl OverrideEngine {
    /// Load the override file from the configured directory and patch the
    /// host's item definitions.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid. File problems are
    /// logged and never fail startup.
    pub fn init<H>(config: EngineConfig, host: &mut H) -> Result<Self, ConfigError>
    where
        H: FoodDefinitions + EffectCatalog + ?Sized,
    {
        config.validate()?;
        let store = OverrideStore::from_config(&config);
        Ok(Self::with_store(config, store, host))
    }

    /// Start the engine over an already constructed store.
    pub fn with_store<H>(config: EngineConfig, store: OverrideStore, host: &mut H) -> Self
    where
        H: FoodDefinitions + EffectCatalog + ?Sized,
    {
        let startup = store.load(&*host, &*host);
        let patch = apply_overrides(host, &store);
        Self {
            config,
            store,
            startup,
            patch,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub const fn store(&self) -> &OverrideStore {
        &self.store
    }

    #[must_use]
    pub const fn startup_report(&self) -> LoadReport {
        self.startup
    }

    #[must_use]
    pub const fn patch_report(&self) -> PatchReport {
        self.patch
    }

    /// Re-read the override file. Item definitions are not re-patched.
    pub fn reload<H>(&self, host: &H) -> LoadReport
    where
        H: FoodCatalog + EffectCatalog + ?Sized,
    {
        self.store.reload(host, host)
    }

    /// Handle a "consumer finished eating" notification.
    pub fn on_item_consumed<I, P, H>(
        &self,
        item: &mut I,
        consumer: &mut P,
        host: &H,
    ) -> Option<ConsumptionOutcome>
    where
        I: ConsumedItem + ?Sized,
        P: Consumer + ?Sized,
        H: EffectCatalog + EnchantmentCatalog + ?Sized,
    {
        ConsumptionProcessor::new(&self.store).process(item, consumer, host, host)
    }

    /// Same as [`OverrideEngine::on_item_consumed`] with a caller-supplied generator.
    pub fn on_item_consumed_with_rng<I, P, H, R>(
        &self,
        item: &mut I,
        consumer: &mut P,
        host: &H,
        rng: &mut R,
    ) -> Option<ConsumptionOutcome>
    where
        I: ConsumedItem + ?Sized,
        P: Consumer + ?Sized,
        H: EffectCatalog + EnchantmentCatalog + ?Sized,
        R: Rng + ?Sized,
    {
        ConsumptionProcessor::new(&self.store).process_with_rng(item, consumer, host, host, rng)
    }

    /// Run the operator command with the arguments after `/fb`.
    pub fn handle_command<S, A, H>(&self, sender: &mut S, args: &[A], host: &H) -> CommandReply
    where
        S: CommandSender + ?Sized,
        A: AsRef<str>,
        H: FoodCatalog + EffectCatalog + ?Sized,
    {
        dispatch(sender, args, &self.config.file_name, || self.reload(host))
    }

    /// Write the map one last time and release the engine.
    pub fn shutdown(self) -> bool {
        let saved = self.store.save();
        log::info!("Food overrides shut down ({} entries)", self.store.len());
        saved
    }
}
