//! Property-based tests for core components using proptest.

use proptest::prelude::*;

use rand::SeedableRng;
use rand::rngs::StdRng;
use smartsoc_core::config::{DelayRange, SimulationConfig};
use smartsoc_core::feed::BoundedLog;
use smartsoc_core::resolver::resolution_for;
use smartsoc_core::{
    Category, EventGenerator, EventStatus, Incident, SimulationState, ThreatAggregator,
};

fn category_strategy() -> impl Strategy<Value = Category> {
    prop::sample::select(Category::ALL.to_vec())
}

// --- Bounded log properties ---

proptest! {
    #[test]
    fn bounded_log_never_exceeds_capacity(capacity in 1usize..64, pushes in 0usize..300) {
        let mut log = BoundedLog::new(capacity);
        for i in 0..pushes {
            log.push_front(i);
            prop_assert!(log.len() <= capacity);
        }
        prop_assert_eq!(log.len(), pushes.min(capacity));
    }

    #[test]
    fn bounded_log_evicts_oldest_first(capacity in 1usize..32, pushes in 0usize..200) {
        let mut log = BoundedLog::new(capacity);
        for i in 0..pushes {
            let evicted = log.push_front(i);
            if i >= capacity {
                prop_assert_eq!(evicted, Some(i - capacity));
            } else {
                prop_assert_eq!(evicted, None);
            }
        }
        let kept = log.to_vec();
        let expected: Vec<usize> = (pushes.saturating_sub(capacity)..pushes).rev().collect();
        prop_assert_eq!(kept, expected);
    }
}

// --- Generation and resolution properties ---

proptest! {
    #[test]
    fn brute_force_blocks_exactly_above_threshold(attempts in 0u64..200, seed in any::<u64>()) {
        let mut generator = EventGenerator::new();
        let record = generator.brute_force(attempts, &mut StdRng::seed_from_u64(seed));
        let resolution = resolution_for(&record, 20);
        if attempts > 20 {
            prop_assert_eq!(resolution.map(|r| r.status), Some(EventStatus::Blocked));
        } else {
            prop_assert!(resolution.is_none());
        }
    }

    #[test]
    fn incident_only_for_high_or_critical(category in category_strategy(), seed in any::<u64>()) {
        let mut generator = EventGenerator::new();
        let record = generator.generate(category, &mut StdRng::seed_from_u64(seed));
        let incident = Incident::from_event("INC-1".into(), &record);
        prop_assert_eq!(incident.is_some(), record.severity.warrants_incident());
    }

    #[test]
    fn record_transitions_at_most_once(category in category_strategy(), seed in any::<u64>()) {
        let mut generator = EventGenerator::new();
        let mut record = generator.generate(category, &mut StdRng::seed_from_u64(seed));
        record.transition(EventStatus::Contained).unwrap();
        for to in [EventStatus::Blocked, EventStatus::Mitigated, EventStatus::Resolved] {
            prop_assert!(record.transition(to).is_err());
        }
        prop_assert_eq!(record.status(), EventStatus::Contained);
    }

    #[test]
    fn delay_sample_stays_in_range(min in 0u64..10_000, span in 1u64..10_000, seed in any::<u64>()) {
        let range = DelayRange { min_ms: min, max_ms: min + span };
        let d = range.sample(&mut StdRng::seed_from_u64(seed));
        prop_assert!(d >= range.min() && d < range.max());
    }
}

// --- Aggregator properties ---

proptest! {
    #[test]
    fn aggregator_percentages_consistent(
        picks in prop::collection::vec((category_strategy(), 0usize..24), 0..80),
    ) {
        let origins = [
            "Russia", "China", "North Korea", "Iran", "United States", "Germany", "Brazil",
            "Finland", "Unknown", "Internal",
        ];
        let mut generator = EventGenerator::new();
        let mut rng = StdRng::seed_from_u64(1);
        let mut agg = ThreatAggregator::new();
        for (category, origin_idx) in picks.iter() {
            let mut record = generator.generate(*category, &mut rng);
            record.actor.origin = origins[origin_idx % origins.len()].to_string();
            agg.record(&record);
        }
        prop_assert_eq!(agg.total(), picks.len() as u64);

        let origin_sum: f64 = agg.origins().iter().map(|o| o.percentage).sum();
        let vector_sum: f64 = agg.vectors().iter().map(|v| v.percentage).sum();
        prop_assert!(origin_sum <= 100.0 + 1e-9);
        prop_assert!(vector_sum <= 100.0 + 1e-9);

        for bucket in agg.origins() {
            let expected = if picks.is_empty() {
                0.0
            } else {
                bucket.count as f64 / picks.len() as f64 * 100.0
            };
            prop_assert!((bucket.percentage - expected).abs() < 1e-9);
        }

        let top = agg.top_vectors(6);
        for pair in top.windows(2) {
            prop_assert!(pair[0].count >= pair[1].count);
        }
    }
}

// --- Engine state properties ---

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn state_logs_stay_capped(events in 0usize..250, seed in any::<u64>()) {
        let mut state = SimulationState::new(SimulationConfig {
            seed: Some(seed),
            ..Default::default()
        })
        .unwrap();
        for i in 0..events {
            state.generate(Category::ALL[i % Category::ALL.len()]);
        }
        prop_assert!(state.events().len() <= 100);
        prop_assert!(state.incidents().len() <= 50);
        prop_assert_eq!(state.stats().total_events, events as u64);
        for incident in state.incidents() {
            prop_assert!(incident.severity.warrants_incident());
        }
    }
}
