use foodrebalanced_engine::{
    EngineConfig, FoodCatalog, ItemIdentity, MemorySource, OverrideFile, OverrideRecord,
    OverrideStore, SandboxHost, SourceState,
};
use serde_json::Value;
use std::fs;

fn config_in(dir: &std::path::Path) -> EngineConfig {
    EngineConfig::in_dir(dir.join("foodrebalanced"))
}

#[test]
fn empty_directory_load_writes_every_catalog_item() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let host = SandboxHost::vanilla();
    let store = OverrideStore::from_config(&config);

    let report = store.load(&host, &host);
    assert_eq!(report.source, SourceState::Missing);
    assert!(report.persisted);

    let written = fs::read_to_string(config.overrides_path()).expect("override file created");
    let document: Value = serde_json::from_str(&written).unwrap();
    let entries = document.as_object().unwrap();
    assert_eq!(entries.len(), host.food_items().len());

    for (key, entry) in entries {
        let identity: ItemIdentity = key.parse().unwrap();
        let defaults = host.defaults(&identity).unwrap();
        assert_eq!(entry["hunger"].as_i64(), Some(i64::from(defaults.hunger)), "{key}");
        assert!(entry["saturation"].is_f64(), "{key} saturation should be a float");
        let effects = entry["effects"].as_array().unwrap();
        assert_eq!(effects.len(), usize::from(defaults.default_effect.is_some()), "{key}");
        assert!(entry.get("meta").is_none());
    }

    let apple = &entries["minecraft:apple"];
    assert_eq!(apple["effects"], Value::Array(Vec::new()));
    assert!(written.contains("\n  "), "file is pretty-printed");
}

#[test]
fn save_then_load_reproduces_records() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    fs::create_dir_all(&config.config_dir).unwrap();
    fs::write(
        config.overrides_path(),
        r#"{
            "mod:berry": {
                "hunger": 5,
                "saturation": 0.8,
                "effects": [{"id": "poison", "duration": 100, "amplifier": 0, "chance": 0.5}],
                "enchantments": [{"id": "unbreaking", "level": 1}]
            },
            "mod:crumb": {"effects": [{"id": "speed"}]}
        }"#,
    )
    .unwrap();

    let host = SandboxHost::default();
    let first = OverrideStore::from_config(&config);
    let report = first.load(&host, &host);
    assert_eq!(report.from_file, 2);
    assert!(first.save());

    let second = OverrideStore::from_config(&config);
    second.load(&host, &host);
    assert_eq!(*first.snapshot(), *second.snapshot());

    let crumb = second.get(&ItemIdentity::new("mod:crumb")).unwrap();
    assert_eq!(crumb.hunger, None, "absent fields stay absent across saves");
    assert_eq!(crumb.effects[0].duration, None);
    let written = fs::read_to_string(config.overrides_path()).unwrap();
    assert!(!written.contains("null"));
}

#[test]
fn auto_discovered_records_reach_disk() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let host = SandboxHost::default();
    let store = OverrideStore::from_config(&config);
    store.load(&host, &host);

    let (_, inserted) = store.register_if_absent(
        ItemIdentity::new("mod:jerky"),
        OverrideRecord::with_nutrition(3, 0.5),
    );
    assert!(inserted);

    let reread = OverrideFile::new(config.overrides_path());
    let fresh = OverrideStore::new(reread, &config);
    fresh.load(&host, &host);
    assert_eq!(
        fresh.get(&ItemIdentity::new("mod:jerky")),
        Some(OverrideRecord::with_nutrition(3, 0.5))
    );
}

#[test]
fn variants_round_trip_when_tracked() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig {
        track_variants: true,
        ..config_in(dir.path())
    };
    let mut host = SandboxHost::default();
    host.items.insert(
        ItemIdentity::with_variant("minecraft:fish", 1),
        foodrebalanced_engine::FoodDefaults {
            hunger: 2,
            saturation: 0.1,
            default_effect: None,
        },
    );

    let store = OverrideStore::from_config(&config);
    store.load(&host, &host);
    let written = fs::read_to_string(config.overrides_path()).unwrap();
    let document: Value = serde_json::from_str(&written).unwrap();
    assert_eq!(document["minecraft:fish@1"]["meta"], Value::from(1));

    let again = OverrideStore::from_config(&config);
    let report = again.load(&host, &host);
    assert_eq!(report.discovered, 0);
    assert!(
        again
            .get(&ItemIdentity::with_variant("minecraft:fish", 1))
            .is_some()
    );
    assert!(again.get(&ItemIdentity::new("minecraft:fish")).is_none());
}

#[test]
fn malformed_file_is_left_for_the_operator() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    fs::create_dir_all(&config.config_dir).unwrap();
    fs::write(config.overrides_path(), "{ \"mod:berry\": ").unwrap();

    let host = SandboxHost::vanilla();
    let store = OverrideStore::from_config(&config);
    let report = store.load(&host, &host);
    assert_eq!(report.source, SourceState::Unreadable);
    assert_eq!(store.len(), host.food_items().len());
    assert_eq!(
        fs::read_to_string(config.overrides_path()).unwrap(),
        "{ \"mod:berry\": "
    );
}

#[test]
fn lenient_entries_keep_operator_values_on_disk() {
    let host = SandboxHost::vanilla();
    let source = std::sync::Arc::new(MemorySource::with_contents(
        r#"{
            "minecraft:apple": {"hunger": 9, "effects": null},
            "minecraft:bread": {"hunger": 9.0, "saturation": 1.5}
        }"#,
    ));
    let store = OverrideStore::new(std::sync::Arc::clone(&source), &EngineConfig::default());
    let report = store.load(&host, &host);
    assert_eq!(report.from_file, 2);

    let apple = store.get(&ItemIdentity::new("minecraft:apple")).unwrap();
    assert_eq!(apple.hunger, Some(9));
    assert!(apple.effects.is_empty());

    let document: Value = serde_json::from_str(&source.contents().unwrap()).unwrap();
    assert_eq!(document["minecraft:apple"]["hunger"], 9);
    assert_eq!(document["minecraft:bread"]["hunger"], 9);
    assert_eq!(document["minecraft:bread"]["saturation"], 1.5);
}

#[test]
fn unusable_entries_are_written_back_untouched() {
    let host = SandboxHost::vanilla();
    let source = std::sync::Arc::new(MemorySource::with_contents(
        r#"{"minecraft:apple": {"hunger": "plenty", "saturation": 0.9}}"#,
    ));
    let store = OverrideStore::new(std::sync::Arc::clone(&source), &EngineConfig::default());
    store.load(&host, &host);

    // Memory falls back to the catalog default until the entry is fixed.
    assert_eq!(
        store
            .get(&ItemIdentity::new("minecraft:apple"))
            .and_then(|record| record.hunger),
        Some(4)
    );
    let document: Value = serde_json::from_str(&source.contents().unwrap()).unwrap();
    assert_eq!(document["minecraft:apple"]["hunger"], "plenty");
    assert_eq!(document.as_object().unwrap().len(), host.food_items().len());

    source.set_contents(r#"{"minecraft:apple": {"hunger": 7}}"#);
    store.reload(&host, &host);
    assert_eq!(
        store
            .get(&ItemIdentity::new("minecraft:apple"))
            .and_then(|record| record.hunger),
        Some(7)
    );
}

#[test]
fn variant_entries_survive_while_variants_are_untracked() {
    let mut host = SandboxHost::default();
    host.add_food("minecraft:fish", 2, 0.1, None);
    let source = std::sync::Arc::new(MemorySource::with_contents(
        r#"{"minecraft:fish": {"hunger": 2}, "minecraft:fish@1": {"hunger": 5}}"#,
    ));
    let store = OverrideStore::new(std::sync::Arc::clone(&source), &EngineConfig::default());
    store.load(&host, &host);
    assert!(store.save());

    let document: Value = serde_json::from_str(&source.contents().unwrap()).unwrap();
    assert_eq!(document["minecraft:fish"]["hunger"], 2);
    assert_eq!(document["minecraft:fish@1"]["hunger"], 5);

    let tracked = OverrideStore::new(
        MemorySource::with_contents(source.contents().unwrap()),
        &EngineConfig {
            track_variants: true,
            ..EngineConfig::default()
        },
    );
    tracked.load(&host, &host);
    assert_eq!(
        tracked
            .get(&ItemIdentity::with_variant("minecraft:fish", 1))
            .and_then(|record| record.hunger),
        Some(5)
    );
}
