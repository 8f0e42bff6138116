use foodrebalanced_engine::{
    ConsumptionProcessor, EngineConfig, ItemIdentity, MemorySource, OverrideRecord,
    OverrideStore, SandboxConsumer, SandboxHost,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde_json::Value;
use std::sync::{Arc, Barrier};
use std::thread;

const THREADS: usize = 8;

fn shared_store(json: &str) -> (OverrideStore, Arc<MemorySource>) {
    let source = Arc::new(MemorySource::with_contents(json));
    let store = OverrideStore::new(Arc::clone(&source), &EngineConfig::default());
    (store, source)
}

#[test]
fn simultaneous_first_discovery_registers_once() {
    let host = SandboxHost::default();
    let (store, source) = shared_store("{}");
    store.load(&host, &host);
    let writes_before = source.writes();
    let identity = ItemIdentity::new("mod:berry");
    let barrier = Barrier::new(THREADS);

    let results: Vec<(OverrideRecord, bool)> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|n| {
                let store = &store;
                let barrier = &barrier;
                let identity = identity.clone();
                scope.spawn(move || {
                    barrier.wait();
                    let hunger = i32::try_from(n).unwrap_or(0);
                    store.register_if_absent(identity, OverrideRecord::with_nutrition(hunger, 0.1))
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    let inserted: Vec<_> = results.iter().filter(|(_, inserted)| *inserted).collect();
    assert_eq!(inserted.len(), 1);
    let winner = &inserted[0].0;
    assert!(results.iter().all(|(record, _)| record == winner));
    assert_eq!(store.get(&identity).as_ref(), Some(winner));
    assert_eq!(source.writes(), writes_before + 1);

    let document: Value = serde_json::from_str(&source.contents().unwrap()).unwrap();
    assert_eq!(document.as_object().unwrap().len(), 1);
}

#[test]
fn consumption_during_reload_sees_a_whole_map() {
    let mut host = SandboxHost::default();
    for n in 0..16 {
        host.add_food(&format!("mod:snack_{n}"), 2, 0.2, None);
    }
    let (store, source) = shared_store(r#"{"mod:snack_0": {"hunger": 4}}"#);
    store.load(&host, &host);
    let barrier = Barrier::new(THREADS + 1);

    thread::scope(|scope| {
        for n in 0..THREADS {
            let (store, host, barrier) = (&store, &host, &barrier);
            scope.spawn(move || {
                barrier.wait();
                let processor = ConsumptionProcessor::new(store);
                let mut rng = SmallRng::seed_from_u64(n as u64);
                for round in 0..200 {
                    let identity = ItemIdentity::new(format!("mod:snack_{}", round % 16));
                    let mut consumer = SandboxConsumer::default();
                    let outcome = processor
                        .process_with_rng(
                            &mut host.stack(&identity),
                            &mut consumer,
                            host,
                            host,
                            &mut rng,
                        )
                        .unwrap();
                    assert!(!outcome.discovered, "every snack has a record");
                }
            });
        }

        barrier.wait();
        for hunger in 0..20 {
            source.set_contents(format!(r#"{{"mod:snack_0": {{"hunger": {hunger}}}}}"#));
            let report = store.reload(&host, &host);
            assert_eq!(report.total, 16);
        }
    });

    assert_eq!(
        store
            .get(&ItemIdentity::new("mod:snack_0"))
            .and_then(|record| record.hunger),
        Some(19)
    );
    let document: Value = serde_json::from_str(&source.contents().unwrap()).unwrap();
    assert_eq!(document.as_object().unwrap().len(), 16);
}
