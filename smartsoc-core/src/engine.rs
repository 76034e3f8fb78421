//! The simulation engine.
//!
//! All model state lives in [`SimulationState`], owned by a single task that
//! processes [`Command`]s one at a time. Timers never touch the state; they
//! only send commands. Callers talk to the owner through a cloneable
//! [`EngineHandle`], with queries answered over oneshot channels.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::aggregator::{AggregateSnapshot, ThreatAggregator};
use crate::config::SimulationConfig;
use crate::dispatch::{EventSink, FanOut, isolate};
use crate::error::{ConfigError, EngineError};
use crate::feed::BoundedLog;
use crate::generator::EventGenerator;
use crate::incident::Incident;
use crate::resolver;
use crate::scheduler::{self, CategoryTimer};
use crate::stats::{DashboardSnapshot, RunState, SimulationStats};
use crate::types::{Category, EventRecord, EventStatus};

/// The simulation model: event and incident logs, counters, the aggregator,
/// and the registered sinks. Synchronous and single-owner.
pub struct SimulationState {
    config: SimulationConfig,
    generator: EventGenerator,
    events: BoundedLog<EventRecord>,
    incidents: BoundedLog<Incident>,
    aggregator: ThreatAggregator,
    sinks: FanOut,
    rng: StdRng,
    run_state: RunState,
    total_events: u64,
    blocked_events: u64,
    incidents_created: u64,
}

impl SimulationState {
    /// Build the model. Fails when `config` does not validate.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            events: BoundedLog::new(config.event_capacity),
            incidents: BoundedLog::new(config.incident_capacity),
            generator: EventGenerator::new(),
            aggregator: ThreatAggregator::new(),
            sinks: FanOut::new(),
            rng,
            run_state: RunState::Stopped,
            total_events: 0,
            blocked_events: 0,
            incidents_created: 0,
            config,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Synthesize one record for `category` and ingest it.
    pub fn generate(&mut self, category: Category) -> EventRecord {
        let record = self.generator.generate(category, &mut self.rng);
        self.admit(record.clone());
        record
    }

    /// Synthesize and ingest a brute-force record with a fixed attempt count.
    pub fn generate_brute_force(&mut self, attempts: u64) -> EventRecord {
        let record = self.generator.brute_force(attempts, &mut self.rng);
        self.admit(record.clone());
        record
    }

    /// Add an externally built record. A record whose id is still retained
    /// is rejected so it can never derive a second incident.
    pub fn ingest(&mut self, record: EventRecord) -> Result<Option<Incident>, EngineError> {
        if self.events.find(|r| r.id == record.id).is_some() {
            return Err(EngineError::DuplicateEvent { id: record.id });
        }
        Ok(self.admit(record))
    }

    /// Prepend to the event log, derive an incident when the severity
    /// warrants one, then fan the record out to the aggregator and every sink.
    fn admit(&mut self, record: EventRecord) -> Option<Incident> {
        self.total_events += 1;
        if let Some(evicted) = self.events.push_front(record.clone()) {
            debug!(id = %evicted.id, "Evicted oldest event");
        }

        let incident = self.derive_incident(&record);

        let aggregator = &mut self.aggregator;
        isolate("aggregator", "on_event", || aggregator.on_event(&record));
        self.sinks.publish_event(&record);
        incident
    }

    fn derive_incident(&mut self, record: &EventRecord) -> Option<Incident> {
        if !record.severity.warrants_incident() {
            return None;
        }
        let incident = Incident::from_event(self.generator.next_incident_id(), record)?;
        self.incidents_created += 1;
        info!(
            incident = %incident.id,
            event = %record.id,
            severity = %incident.severity,
            "Incident created"
        );
        self.incidents.push_front(incident.clone());
        self.sinks.publish_incident(&incident);
        Some(incident)
    }

    /// Apply the auto-resolution rule to the record with `event_id`.
    ///
    /// A record that was evicted, already left `Active`, or has no rule for
    /// its category is left untouched and `None` is returned.
    pub fn resolve(&mut self, event_id: &str) -> Option<EventStatus> {
        let threshold = self.config.block_attempts_threshold;
        let Some(record) = self.events.find_mut(|r| r.id == event_id) else {
            debug!(id = event_id, "Resolution skipped; event no longer retained");
            return None;
        };
        let resolution = resolver::resolution_for(record, threshold)?;
        if record.transition(resolution.status).is_err() {
            return None;
        }
        if resolution.status == EventStatus::Blocked {
            self.blocked_events += 1;
        }
        info!(
            id = %record.id,
            status = %resolution.status,
            target = %record.asset.id,
            source_ip = %record.source_ip,
            "{}", resolution.action
        );
        let record = record.clone();
        self.sinks.publish_status_change(&record);
        Some(resolution.status)
    }

    /// Build a dashboard snapshot and publish it to the sinks.
    pub fn refresh(&mut self) -> DashboardSnapshot {
        let snapshot = self.dashboard();
        self.sinks.publish_snapshot(&snapshot);
        snapshot
    }

    /// Build a dashboard snapshot without publishing it.
    pub fn dashboard(&mut self) -> DashboardSnapshot {
        let stats = self.stats();
        DashboardSnapshot::sample(self.run_state, stats, &mut self.rng)
    }

    pub fn stats(&self) -> SimulationStats {
        SimulationStats {
            total_events: self.total_events,
            blocked_events: self.blocked_events,
            incidents_created: self.incidents_created,
            resolved_incidents: 0,
            active_events: self
                .events
                .iter()
                .filter(|r| r.status() == EventStatus::Active)
                .count(),
        }
    }

    /// Newest-first copy of the event log.
    pub fn events(&self) -> Vec<EventRecord> {
        self.events.to_vec()
    }

    pub fn event(&self, id: &str) -> Option<&EventRecord> {
        self.events.find(|r| r.id == id)
    }

    /// Newest-first copy of the incident log.
    pub fn incidents(&self) -> Vec<Incident> {
        self.incidents.to_vec()
    }

    pub fn aggregates(&self) -> AggregateSnapshot {
        self.aggregator.snapshot()
    }

    pub fn clear_aggregates(&mut self) {
        self.aggregator.clear();
    }

    pub fn register_sink(&mut self, sink: Box<dyn EventSink>) {
        let name = sink.name().to_string();
        if self.sinks.register(sink).is_some() {
            debug!(sink = %name, "Replaced sink");
        } else {
            debug!(sink = %name, "Registered sink");
        }
    }

    pub fn unregister_sink(&mut self, name: &str) -> bool {
        self.sinks.unregister(name).is_some()
    }

    pub fn sink_names(&self) -> Vec<String> {
        self.sinks.names()
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn set_run_state(&mut self, state: RunState) {
        self.run_state = state;
    }

    /// Draw an auto-resolution delay.
    pub fn resolution_delay(&mut self) -> Duration {
        self.config.resolution_delay.sample(&mut self.rng)
    }

    /// Seed for a child RNG, so every timer gets an independent stream.
    pub fn child_seed(&mut self) -> u64 {
        self.rng.r#gen()
    }
}

/// Owner-side view of the running timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineStatus {
    pub state: RunState,
    /// Live category timers plus the refresh ticker.
    pub timers: usize,
    pub sinks: usize,
}

/// Messages processed by the owner task.
enum Command {
    Start(oneshot::Sender<bool>),
    Stop(oneshot::Sender<bool>),
    Fire(Category),
    Resolve(String),
    Refresh,
    Trigger {
        category: Category,
        attempts: Option<u64>,
        reply: oneshot::Sender<EventRecord>,
    },
    Ingest(
        Box<EventRecord>,
        oneshot::Sender<Result<Option<Incident>, EngineError>>,
    ),
    Events(oneshot::Sender<Vec<EventRecord>>),
    Incidents(oneshot::Sender<Vec<Incident>>),
    Stats(oneshot::Sender<SimulationStats>),
    Aggregates(oneshot::Sender<AggregateSnapshot>),
    Dashboard(oneshot::Sender<DashboardSnapshot>),
    Status(oneshot::Sender<EngineStatus>),
    ClearAggregates,
    RegisterSink(Box<dyn EventSink>),
    UnregisterSink(String, oneshot::Sender<bool>),
    Shutdown(oneshot::Sender<()>),
}

struct TimerSet {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

/// The owner task: holds the state and the running timers.
pub struct SimulationEngine {
    state: SimulationState,
    rx: mpsc::UnboundedReceiver<Command>,
    weak_tx: mpsc::WeakUnboundedSender<Command>,
    timers: Option<TimerSet>,
}

impl SimulationEngine {
    /// Build an engine and the handle that drives it. Call [`run`] (or use
    /// [`spawn`]) to start processing commands.
    ///
    /// [`run`]: SimulationEngine::run
    /// [`spawn`]: SimulationEngine::spawn
    pub fn new(config: SimulationConfig) -> Result<(Self, EngineHandle), ConfigError> {
        let state = SimulationState::new(config)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = Self {
            state,
            rx,
            weak_tx: tx.downgrade(),
            timers: None,
        };
        Ok((engine, EngineHandle { tx }))
    }

    /// Spawn the owner task and return a handle to it.
    pub fn spawn(config: SimulationConfig) -> Result<EngineHandle, ConfigError> {
        let (engine, handle) = Self::new(config)?;
        tokio::spawn(engine.run());
        Ok(handle)
    }

    /// Process commands until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        while let Some(command) = self.rx.recv().await {
            match command {
                Command::Shutdown(reply) => {
                    self.stop().await;
                    info!("Simulation engine shut down");
                    let _ = reply.send(());
                    return;
                }
                other => self.handle(other).await,
            }
        }
        self.stop().await;
        debug!("All engine handles dropped");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Start(reply) => {
                let _ = reply.send(self.start());
            }
            Command::Stop(reply) => {
                let stopped = self.stop().await;
                let _ = reply.send(stopped);
            }
            Command::Fire(category) => {
                // A timer may fire while a stop is being processed.
                if self.state.run_state() == RunState::Running {
                    let record = self.state.generate(category);
                    self.schedule_resolution(&record);
                }
            }
            Command::Resolve(id) => {
                self.state.resolve(&id);
            }
            Command::Refresh => {
                self.state.refresh();
            }
            Command::Trigger {
                category,
                attempts,
                reply,
            } => {
                let record = match (category, attempts) {
                    (Category::BruteForce, Some(n)) => self.state.generate_brute_force(n),
                    _ => self.state.generate(category),
                };
                self.schedule_resolution(&record);
                let _ = reply.send(record);
            }
            Command::Ingest(record, reply) => {
                let id = record.id.clone();
                let result = self.state.ingest(*record);
                if result.is_ok() {
                    self.schedule_resolution_for(id);
                }
                let _ = reply.send(result);
            }
            Command::Events(reply) => {
                let _ = reply.send(self.state.events());
            }
            Command::Incidents(reply) => {
                let _ = reply.send(self.state.incidents());
            }
            Command::Stats(reply) => {
                let _ = reply.send(self.state.stats());
            }
            Command::Aggregates(reply) => {
                let _ = reply.send(self.state.aggregates());
            }
            Command::Dashboard(reply) => {
                let _ = reply.send(self.state.dashboard());
            }
            Command::Status(reply) => {
                let _ = reply.send(self.status());
            }
            Command::ClearAggregates => self.state.clear_aggregates(),
            Command::RegisterSink(sink) => self.state.register_sink(sink),
            Command::UnregisterSink(name, reply) => {
                let _ = reply.send(self.state.unregister_sink(&name));
            }
            Command::Shutdown(_) => {}
        }
    }

    fn status(&self) -> EngineStatus {
        EngineStatus {
            state: self.state.run_state(),
            timers: self
                .timers
                .as_ref()
                .map_or(0, |t| t.handles.iter().filter(|h| !h.is_finished()).count()),
            sinks: self.state.sink_names().len(),
        }
    }

    /// Arm all category timers and the refresh ticker. No-op when running.
    fn start(&mut self) -> bool {
        if self.timers.is_some() {
            debug!("Start ignored; simulation already running");
            return false;
        }
        let cancel = CancellationToken::new();
        let mut handles = Vec::with_capacity(Category::ALL.len() + 1);

        for category in Category::ALL {
            let range = self.state.config().intervals.for_category(category);
            let rng = StdRng::seed_from_u64(self.state.child_seed());
            let weak = self.weak_tx.clone();
            handles.push(scheduler::spawn_category_loop(
                CategoryTimer::new(category, range),
                rng,
                cancel.clone(),
                move |category| {
                    weak.upgrade()
                        .is_some_and(|tx| tx.send(Command::Fire(category)).is_ok())
                },
            ));
        }

        let weak = self.weak_tx.clone();
        handles.push(scheduler::spawn_ticker(
            self.state.config().refresh_interval(),
            cancel.clone(),
            move || {
                weak.upgrade()
                    .is_some_and(|tx| tx.send(Command::Refresh).is_ok())
            },
        ));

        self.timers = Some(TimerSet { cancel, handles });
        self.state.set_run_state(RunState::Running);
        info!(timers = Category::ALL.len(), "Simulation started");
        true
    }

    /// Cancel every category timer and the ticker. No-op when stopped.
    /// Pending resolution timers are left to fire.
    async fn stop(&mut self) -> bool {
        let Some(timers) = self.timers.take() else {
            debug!("Stop ignored; simulation not running");
            return false;
        };
        timers.cancel.cancel();
        for handle in timers.handles {
            let _ = handle.await;
        }
        self.state.set_run_state(RunState::Stopped);
        info!("Simulation stopped");
        true
    }

    fn schedule_resolution(&mut self, record: &EventRecord) {
        self.schedule_resolution_for(record.id.clone());
    }

    fn schedule_resolution_for(&mut self, id: String) {
        let delay = self.state.resolution_delay();
        let weak = self.weak_tx.clone();
        scheduler::spawn_once(delay, move || {
            // Dropped silently once the engine is gone.
            if let Some(tx) = weak.upgrade() {
                let _ = tx.send(Command::Resolve(id));
            }
        });
    }
}

/// Cloneable handle to a running [`SimulationEngine`].
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl EngineHandle {
    fn send(&self, command: Command) -> Result<(), EngineError> {
        self.tx.send(command).map_err(|_| EngineError::ShutDown)
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(make(reply))?;
        rx.await.map_err(|_| EngineError::NoReply)
    }

    /// Start the category timers. Returns `false` if already running.
    pub async fn start(&self) -> Result<bool, EngineError> {
        self.request(Command::Start).await
    }

    /// Stop the category timers. Returns `false` if already stopped.
    pub async fn stop(&self) -> Result<bool, EngineError> {
        self.request(Command::Stop).await
    }

    /// Generate one record now, outside the timers.
    pub async fn trigger(&self, category: Category) -> Result<EventRecord, EngineError> {
        self.request(|reply| Command::Trigger {
            category,
            attempts: None,
            reply,
        })
        .await
    }

    /// Generate one brute-force record with a fixed attempt count.
    pub async fn trigger_brute_force(&self, attempts: u64) -> Result<EventRecord, EngineError> {
        self.request(|reply| Command::Trigger {
            category: Category::BruteForce,
            attempts: Some(attempts),
            reply,
        })
        .await
    }

    /// Feed an externally built record through the fan-out path. Returns
    /// the derived incident, or `DuplicateEvent` if the id is still retained.
    pub async fn ingest(&self, record: EventRecord) -> Result<Option<Incident>, EngineError> {
        self.request(|reply| Command::Ingest(Box::new(record), reply))
            .await?
    }

    pub async fn events(&self) -> Result<Vec<EventRecord>, EngineError> {
        self.request(Command::Events).await
    }

    pub async fn incidents(&self) -> Result<Vec<Incident>, EngineError> {
        self.request(Command::Incidents).await
    }

    pub async fn stats(&self) -> Result<SimulationStats, EngineError> {
        self.request(Command::Stats).await
    }

    pub async fn aggregates(&self) -> Result<AggregateSnapshot, EngineError> {
        self.request(Command::Aggregates).await
    }

    pub async fn dashboard(&self) -> Result<DashboardSnapshot, EngineError> {
        self.request(Command::Dashboard).await
    }

    pub async fn status(&self) -> Result<EngineStatus, EngineError> {
        self.request(Command::Status).await
    }

    pub fn clear_aggregates(&self) -> Result<(), EngineError> {
        self.send(Command::ClearAggregates)
    }

    pub fn register_sink(&self, sink: Box<dyn EventSink>) -> Result<(), EngineError> {
        self.send(Command::RegisterSink(sink))
    }

    pub async fn unregister_sink(&self, name: &str) -> Result<bool, EngineError> {
        let name = name.to_string();
        self.request(|reply| Command::UnregisterSink(name, reply))
            .await
    }

    /// Stop the timers and end the owner task.
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        self.request(Command::Shutdown).await
    }
}
