//! End-to-end scenarios for the simulation engine, run on a paused clock.

use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use smartsoc_core::config::SimulationConfig;
use smartsoc_core::error::{ConfigError, EngineError, SinkError};
use smartsoc_core::{
    Category, DashboardSnapshot, EngineHandle, EventRecord, EventSink, EventStatus, Incident,
    RunState, Severity, SimulationEngine,
};

fn spawn_engine() -> EngineHandle {
    SimulationEngine::spawn(SimulationConfig {
        seed: Some(42),
        ..Default::default()
    })
    .unwrap()
}

#[derive(Default)]
struct Counts {
    events: usize,
    incidents: usize,
    status_changes: usize,
    snapshots: usize,
}

struct CountingSink(Arc<Mutex<Counts>>);

impl EventSink for CountingSink {
    fn name(&self) -> &str {
        "counting"
    }

    fn on_event(&mut self, _record: &EventRecord) -> Result<(), SinkError> {
        self.0.lock().unwrap().events += 1;
        Ok(())
    }

    fn on_incident(&mut self, _incident: &Incident) -> Result<(), SinkError> {
        self.0.lock().unwrap().incidents += 1;
        Ok(())
    }

    fn on_status_change(&mut self, _record: &EventRecord) -> Result<(), SinkError> {
        self.0.lock().unwrap().status_changes += 1;
        Ok(())
    }

    fn on_snapshot(&mut self, _snapshot: &DashboardSnapshot) -> Result<(), SinkError> {
        self.0.lock().unwrap().snapshots += 1;
        Ok(())
    }
}

struct PanickingSink;

impl EventSink for PanickingSink {
    fn name(&self) -> &str {
        "panicking"
    }

    fn on_event(&mut self, _record: &EventRecord) -> Result<(), SinkError> {
        panic!("render failed");
    }
}

#[tokio::test(start_paused = true)]
async fn brute_force_over_threshold_is_blocked_within_seven_seconds() {
    let engine = spawn_engine();
    let record = engine.trigger_brute_force(35).await.unwrap();
    assert_eq!(record.severity, Severity::High);
    assert_eq!(engine.stats().await.unwrap().blocked_events, 0);

    tokio::time::sleep(Duration::from_secs(7)).await;

    let events = engine.events().await.unwrap();
    let stored = events.iter().find(|e| e.id == record.id).unwrap();
    assert_eq!(stored.status(), EventStatus::Blocked);
    assert!(stored.resolved_at().is_some());
    assert_eq!(engine.stats().await.unwrap().blocked_events, 1);
}

#[tokio::test(start_paused = true)]
async fn brute_force_at_or_below_threshold_stays_active() {
    let engine = spawn_engine();
    let record = engine.trigger_brute_force(20).await.unwrap();
    assert_eq!(record.severity, Severity::Medium);
    tokio::time::sleep(Duration::from_secs(30)).await;

    let events = engine.events().await.unwrap();
    assert_eq!(events[0].status(), EventStatus::Active);
    assert_eq!(engine.stats().await.unwrap().blocked_events, 0);
}

#[tokio::test(start_paused = true)]
async fn malware_and_ddos_resolve_phishing_does_not() {
    let engine = spawn_engine();
    let malware = engine.trigger(Category::Malware).await.unwrap();
    let ddos = engine.trigger(Category::Ddos).await.unwrap();
    let phishing = engine.trigger(Category::Phishing).await.unwrap();
    tokio::time::sleep(Duration::from_secs(8)).await;

    let events = engine.events().await.unwrap();
    let status = |id: &str| events.iter().find(|e| e.id == id).unwrap().status();
    assert_eq!(status(&malware.id), EventStatus::Contained);
    assert_eq!(status(&ddos.id), EventStatus::Mitigated);
    assert_eq!(status(&phishing.id), EventStatus::Active);
}

#[tokio::test(start_paused = true)]
async fn start_and_stop_are_idempotent() {
    let engine = spawn_engine();
    assert!(!engine.stop().await.unwrap());

    assert!(engine.start().await.unwrap());
    assert!(!engine.start().await.unwrap());
    let status = engine.status().await.unwrap();
    assert_eq!(status.state, RunState::Running);
    // Six category timers plus the refresh ticker.
    assert_eq!(status.timers, 7);

    assert!(engine.stop().await.unwrap());
    assert!(!engine.stop().await.unwrap());
    let status = engine.status().await.unwrap();
    assert_eq!(status.state, RunState::Stopped);
    assert_eq!(status.timers, 0);
}

#[tokio::test(start_paused = true)]
async fn timers_generate_until_stopped() {
    let engine = spawn_engine();
    engine.start().await.unwrap();
    tokio::time::sleep(Duration::from_secs(120)).await;

    let total = engine.stats().await.unwrap().total_events;
    // Every category fires at least twice in two minutes.
    assert!(total >= 12, "only {total} events");
    let events = engine.events().await.unwrap();
    for category in Category::ALL {
        assert!(events.iter().any(|e| e.category == category), "no {category} event");
    }

    engine.stop().await.unwrap();
    let stopped_at = engine.stats().await.unwrap().total_events;
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(engine.stats().await.unwrap().total_events, stopped_at);
}

#[tokio::test(start_paused = true)]
async fn no_events_are_generated_after_stop_returns() {
    let engine = spawn_engine();
    engine.start().await.unwrap();
    tokio::time::sleep(Duration::from_secs(45)).await;
    assert!(engine.stop().await.unwrap());

    let at_stop = engine.stats().await.unwrap().total_events;
    assert!(at_stop > 0);
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(engine.stats().await.unwrap().total_events, at_stop);
    assert_eq!(engine.status().await.unwrap().timers, 0);
}

#[tokio::test(start_paused = true)]
async fn incident_log_keeps_newest_fifty() {
    let engine = spawn_engine();
    let mut ids = Vec::new();
    for _ in 0..60 {
        ids.push(engine.trigger(Category::Exfiltration).await.unwrap().id);
    }
    let incidents = engine.incidents().await.unwrap();
    assert_eq!(incidents.len(), 50);
    assert_eq!(engine.stats().await.unwrap().incidents_created, 60);
    assert_eq!(incidents[0].event_id, ids[59]);
    assert_eq!(incidents[49].event_id, ids[10]);
    for evicted in &ids[..10] {
        assert!(incidents.iter().all(|i| &i.event_id != evicted));
    }
}

#[tokio::test(start_paused = true)]
async fn duplicate_ingest_is_rejected() {
    let engine = spawn_engine();
    let record = engine.trigger_brute_force(45).await.unwrap();
    let err = engine.ingest(record.clone()).await.unwrap_err();
    assert!(matches!(err, EngineError::DuplicateEvent { .. }));

    let events = engine.events().await.unwrap();
    assert_eq!(events.iter().filter(|e| e.id == record.id).count(), 1);
    let incidents = engine.incidents().await.unwrap();
    assert_eq!(incidents.iter().filter(|i| i.event_id == record.id).count(), 1);

    tokio::time::sleep(Duration::from_secs(8)).await;
    assert_eq!(engine.stats().await.unwrap().blocked_events, 1);
}

#[tokio::test]
async fn invalid_config_is_rejected_at_spawn() {
    let result = SimulationEngine::spawn(SimulationConfig {
        refresh_interval_ms: 0,
        ..Default::default()
    });
    assert!(matches!(result, Err(ConfigError::Invalid { .. })));
}

#[tokio::test(start_paused = true)]
async fn restart_after_stop_resumes_generation() {
    let engine = spawn_engine();
    engine.start().await.unwrap();
    engine.stop().await.unwrap();
    assert!(engine.start().await.unwrap());
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(engine.stats().await.unwrap().total_events > 0);
    assert_eq!(engine.status().await.unwrap().timers, 7);
}

#[tokio::test(start_paused = true)]
async fn event_log_keeps_newest_hundred() {
    let engine = spawn_engine();
    let mut ids = Vec::new();
    for i in 0..150 {
        let record = engine.trigger(Category::ALL[i % 6]).await.unwrap();
        ids.push(record.id);
    }
    let events = engine.events().await.unwrap();
    assert_eq!(events.len(), 100);
    for old in &ids[..50] {
        assert!(events.iter().all(|e| &e.id != old));
    }
    let newest: Vec<&String> = ids.iter().rev().take(100).collect();
    let kept: Vec<&String> = events.iter().map(|e| &e.id).collect();
    assert_eq!(kept, newest);
    assert!(engine.incidents().await.unwrap().len() <= 50);
}

#[tokio::test(start_paused = true)]
async fn resolution_after_eviction_is_harmless() {
    let engine = SimulationEngine::spawn(SimulationConfig {
        seed: Some(3),
        event_capacity: 2,
        ..Default::default()
    })
    .unwrap();
    let malware = engine.trigger(Category::Malware).await.unwrap();
    engine.trigger(Category::Phishing).await.unwrap();
    engine.trigger(Category::Phishing).await.unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;

    let events = engine.events().await.unwrap();
    assert!(events.iter().all(|e| e.id != malware.id));
    assert!(events.iter().all(|e| e.status() == EventStatus::Active));
    assert_eq!(engine.stats().await.unwrap().total_events, 3);
}

#[tokio::test(start_paused = true)]
async fn sinks_receive_events_incidents_and_snapshots() {
    let engine = spawn_engine();
    let counts = Arc::new(Mutex::new(Counts::default()));
    engine.register_sink(Box::new(PanickingSink)).unwrap();
    engine
        .register_sink(Box::new(CountingSink(counts.clone())))
        .unwrap();

    engine.trigger(Category::Exfiltration).await.unwrap();
    engine.trigger(Category::Malware).await.unwrap();
    {
        let c = counts.lock().unwrap();
        assert_eq!(c.events, 2);
        assert_eq!(c.incidents, 2);
    }

    engine.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(10_500)).await;
    engine.stop().await.unwrap();
    let total = engine.stats().await.unwrap().total_events;

    let c = counts.lock().unwrap();
    assert_eq!(c.snapshots, 5);
    // The malware record was contained.
    assert!(c.status_changes >= 1);
    assert_eq!(c.events as u64, total);
}

#[tokio::test(start_paused = true)]
async fn unregistered_sink_stops_receiving() {
    let engine = spawn_engine();
    let counts = Arc::new(Mutex::new(Counts::default()));
    engine
        .register_sink(Box::new(CountingSink(counts.clone())))
        .unwrap();
    engine.trigger(Category::Phishing).await.unwrap();
    assert!(engine.unregister_sink("counting").await.unwrap());
    assert!(!engine.unregister_sink("counting").await.unwrap());
    engine.trigger(Category::Phishing).await.unwrap();
    assert_eq!(counts.lock().unwrap().events, 1);
}

#[tokio::test(start_paused = true)]
async fn aggregates_follow_generated_events() {
    let engine = spawn_engine();
    for _ in 0..4 {
        engine.trigger(Category::Ddos).await.unwrap();
    }
    let aggregates = engine.aggregates().await.unwrap();
    assert_eq!(aggregates.total, 4);
    assert_eq!(aggregates.vectors[0].name, "DDoS");
    assert_eq!(aggregates.vectors[0].percentage, 100.0);

    engine.clear_aggregates().unwrap();
    assert_eq!(engine.aggregates().await.unwrap().total, 0);
}

#[tokio::test(start_paused = true)]
async fn dashboard_reflects_counters() {
    let engine = spawn_engine();
    engine.trigger(Category::Exfiltration).await.unwrap();
    let dashboard = engine.dashboard().await.unwrap();
    assert_eq!(dashboard.state, RunState::Stopped);
    assert_eq!(dashboard.stats.total_events, 1);
    assert_eq!(dashboard.stats.incidents_created, 1);
    assert_eq!(dashboard.stats.active_events, 1);
}

#[tokio::test(start_paused = true)]
async fn handle_errors_after_shutdown() {
    let engine = spawn_engine();
    engine.start().await.unwrap();
    engine.shutdown().await.unwrap();
    let err = engine.stats().await.unwrap_err();
    assert!(matches!(err, EngineError::ShutDown | EngineError::NoReply));
}
