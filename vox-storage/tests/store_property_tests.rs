//! Property-Based Tests for the Configuration Store
//!
//! Properties:
//! - The store never holds more entries than its capacity
//! - The evicted entry is always the oldest one, ties going to the smallest key
//! - Freshness flips exactly when age exceeds the TTL
//! - Agent invalidation removes exactly that agent's keys

use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use vox_core::{AgentConfig, Clock, ManualClock};
use vox_storage::{CacheKey, ConfigStore, Freshness};

// ============================================================================
// GENERATORS
// ============================================================================

fn arb_agent() -> impl Strategy<Value = String> {
    "[a-e][0-9]{0,1}"
}

fn arb_campaign() -> impl Strategy<Value = Option<String>> {
    proptest::option::of("[xyz ]{1,2}")
}

/// A put: which key, and how far the clock moves before it.
fn arb_put() -> impl Strategy<Value = (String, Option<String>, u64)> {
    (arb_agent(), arb_campaign(), 0u64..3)
}

fn config_for(agent: &str) -> AgentConfig {
    let mut config = AgentConfig::default_config();
    config.agent_id = agent.to_string();
    config
}

const TTL: Duration = Duration::from_secs(3600);

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Size never exceeds capacity after any sequence of puts.
    #[test]
    fn prop_size_never_exceeds_capacity(
        capacity in 1usize..6,
        puts in prop::collection::vec(arb_put(), 0..40),
    ) {
        let clock = Arc::new(ManualClock::starting_now());
        let store = ConfigStore::with_clock(capacity, clock.clone());

        for (agent, campaign, tick) in puts {
            clock.advance(Duration::from_millis(tick));
            let key = CacheKey::new(&agent, campaign.as_deref()).unwrap();
            store.put(key, config_for(&agent), TTL);
            prop_assert!(store.len() <= capacity);
        }
    }

    /// The victim matches a reference model: oldest cached_at, then smallest key.
    #[test]
    fn prop_eviction_matches_model(
        capacity in 1usize..5,
        puts in prop::collection::vec(arb_put(), 1..40),
    ) {
        let clock = Arc::new(ManualClock::starting_now());
        let store = ConfigStore::with_clock(capacity, clock.clone());
        let mut model: BTreeMap<CacheKey, chrono::DateTime<chrono::Utc>> = BTreeMap::new();

        for (agent, campaign, tick) in puts {
            clock.advance(Duration::from_millis(tick));
            let now = clock.now();
            let key = CacheKey::new(&agent, campaign.as_deref()).unwrap();

            let expected_victim = if !model.contains_key(&key) && model.len() >= capacity {
                model
                    .iter()
                    .min_by(|(ka, ta), (kb, tb)| ta.cmp(tb).then_with(|| ka.cmp(kb)))
                    .map(|(k, _)| k.clone())
            } else {
                None
            };
            if let Some(victim) = &expected_victim {
                model.remove(victim);
            }
            model.insert(key.clone(), now);

            let evicted = store.put(key, config_for(&agent), TTL);
            prop_assert_eq!(evicted, expected_victim);
        }

        let model_keys: Vec<CacheKey> = model.keys().cloned().collect();
        prop_assert_eq!(store.keys(), model_keys);
    }

    /// An entry is fresh up to and including its TTL, and stale after.
    #[test]
    fn prop_freshness_boundary(ttl_ms in 1u64..10_000, extra_ms in 1u64..10_000) {
        let clock = Arc::new(ManualClock::starting_now());
        let store = ConfigStore::with_clock(4, clock.clone());
        let key = CacheKey::new("agent", None).unwrap();
        store.put(key.clone(), config_for("agent"), Duration::from_millis(ttl_ms));

        clock.advance(Duration::from_millis(ttl_ms));
        prop_assert!(store.get(&key, Freshness::WithinTtl).is_some());

        clock.advance(Duration::from_millis(extra_ms));
        prop_assert!(store.get(&key, Freshness::WithinTtl).is_none());
        prop_assert!(store.get(&key, Freshness::IgnoreTtl).is_some());
    }

    /// Invalidating an agent removes all of its keys and nothing else.
    #[test]
    fn prop_invalidate_agent_is_exact(
        puts in prop::collection::vec(arb_put(), 0..30),
        target in arb_agent(),
    ) {
        let store = ConfigStore::new(64);
        for (agent, campaign, _) in &puts {
            let key = CacheKey::new(agent, campaign.as_deref()).unwrap();
            store.put(key, config_for(agent), TTL);
        }

        let before = store.keys();
        let removed = store.invalidate_agent(&target);
        let after = store.keys();

        let expected: Vec<CacheKey> = before
            .iter()
            .filter(|k| k.agent_id() != target)
            .cloned()
            .collect();
        prop_assert_eq!(removed, before.len() - expected.len());
        prop_assert_eq!(after, expected);
        prop_assert_eq!(store.invalidate_agent(&target), 0);
    }
}
