use anyhow::{Context, Result, bail};
use foodrebalanced_engine::{
    CommandReply, ConsumedItem, Consumer, EffectCatalog, EngineConfig, ItemIdentity, LoadReport,
    NutritionChange, OverrideEngine, PatchReport, SandboxConsumer, SandboxHost, SandboxSender,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Which sandbox sender issues an admin command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderKind {
    Console,
    Operator,
    Player,
}

impl SenderKind {
    fn sender(self) -> SandboxSender {
        match self {
            Self::Console => SandboxSender::console(),
            Self::Operator => SandboxSender::player(true),
            Self::Player => SandboxSender::player(false),
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Console => "console",
            Self::Operator => "operator",
            Self::Player => "player",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    pub location: String,
    pub startup: LoadReport,
    pub patch: PatchReport,
    pub entries: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EatSummary {
    pub item: ItemIdentity,
    pub runs: usize,
    pub seed: u64,
    pub starting_food_level: i32,
    pub discovered: bool,
    /// Food bar after the host's own nutrition and the override adjustment.
    pub final_food_level: i32,
    pub final_saturation: f32,
    pub nutrition: Option<NutritionChange>,
    pub effects: BTreeMap<String, usize>,
    pub enchantments: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminSummary {
    pub sender: &'static str,
    pub reply: CommandReply,
    pub messages: Vec<String>,
}

/// Sandbox host from a fixture file, or the vanilla roster.
pub fn load_host(path: Option<&Path>) -> Result<SandboxHost> {
    let Some(path) = path else {
        return Ok(SandboxHost::vanilla());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read host fixture {}", path.display()))?;
    let host = SandboxHost::from_json(&json)
        .with_context(|| format!("failed to parse host fixture {}", path.display()))?;
    log::info!(
        "Loaded host fixture {} ({} foods)",
        path.display(),
        host.items.len()
    );
    Ok(host)
}

fn start_engine(config: EngineConfig, host: &mut SandboxHost) -> Result<OverrideEngine> {
    log::debug!("Starting engine in {}", config.config_dir.display());
    OverrideEngine::init(config, host).context("invalid engine configuration")
}

pub fn run_load(config: EngineConfig, host: &mut SandboxHost) -> Result<LoadSummary> {
    let engine = start_engine(config, host)?;
    let summary = LoadSummary {
        location: engine.store().location().display().to_string(),
        startup: engine.startup_report(),
        patch: engine.patch_report(),
        entries: engine.store().len(),
    };
    engine.shutdown();
    Ok(summary)
}

pub fn run_eat(
    config: EngineConfig,
    host: &mut SandboxHost,
    item: &str,
    runs: usize,
    food_level: i32,
    seed: u64,
) -> Result<EatSummary> {
    let identity: ItemIdentity = item
        .parse()
        .with_context(|| format!("invalid item identity `{item}`"))?;
    let engine = start_engine(config, host)?;
    let host = &*host;
    if host.stack(&identity).identity().is_none() {
        bail!("{identity} is not a consumable in the host catalog");
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut summary = EatSummary {
        item: identity.clone(),
        runs,
        seed,
        starting_food_level: food_level,
        discovered: false,
        final_food_level: food_level,
        final_saturation: 0.0,
        nutrition: None,
        effects: BTreeMap::new(),
        enchantments: BTreeMap::new(),
    };

    for _ in 0..runs {
        let mut stack = host.stack(&identity);
        let mut consumer = SandboxConsumer::with_food_level(food_level);
        // The host feeds the consumer from the (patched) definition first.
        if let Ok(own) = stack.nutrition() {
            consumer.apply_nutrition(own.hunger, own.saturation);
        }

        let Some(outcome) =
            engine.on_item_consumed_with_rng(&mut stack, &mut consumer, host, &mut rng)
        else {
            continue;
        };
        summary.discovered |= outcome.discovered;
        summary.nutrition = Some(outcome.nutrition);
        summary.final_food_level = consumer.food_level();
        summary.final_saturation = consumer.saturation;
        for grant in outcome.effects {
            let name = host
                .effect_name(grant.effect)
                .unwrap_or_else(|| format!("#{}", grant.effect.0));
            *summary.effects.entry(name).or_default() += 1;
        }
        for grant in outcome.enchantments {
            let name = host
                .enchantments
                .get(grant.enchantment.0)
                .map_or_else(|| format!("#{}", grant.enchantment.0), |e| e.name.clone());
            *summary
                .enchantments
                .entry(format!("{name} {}", grant.level))
                .or_default() += 1;
        }
    }

    engine.shutdown();
    Ok(summary)
}

pub fn run_admin(
    config: EngineConfig,
    host: &mut SandboxHost,
    sender: SenderKind,
    args: &[String],
) -> Result<AdminSummary> {
    let engine = start_engine(config, host)?;
    let mut issuer = sender.sender();
    let reply = engine.handle_command(&mut issuer, args, &*host);
    engine.shutdown();
    Ok(AdminSummary {
        sender: sender.label(),
        reply,
        messages: issuer.messages,
    })
}
