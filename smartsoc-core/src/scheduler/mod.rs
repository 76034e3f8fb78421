//! Background timers driving the simulation.
//!
//! Category timers and the dashboard ticker run as `tokio::spawn` tasks that
//! stop when their `CancellationToken` fires. One-shot timers are not
//! cancellable; their callbacks must tolerate running late.

pub mod timer;

pub use timer::{CategoryTimer, TimerPhase};

use rand::rngs::StdRng;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::types::Category;

const MIN_TICK: Duration = Duration::from_millis(1);

/// Drive `timer` until cancelled. `on_fire` is called once per firing and
/// returns `false` when its receiver is gone, which also ends the loop.
pub fn spawn_category_loop<F>(
    mut timer: CategoryTimer,
    mut rng: StdRng,
    cancel: CancellationToken,
    mut on_fire: F,
) -> JoinHandle<()>
where
    F: FnMut(Category) -> bool + Send + 'static,
{
    tokio::spawn(async move {
        let category = timer.category();
        loop {
            let delay = timer.arm(&mut rng);
            trace!(%category, delay_ms = delay.as_millis() as u64, "Category timer armed");
            tokio::select! {
                _ = cancel.cancelled() => {
                    timer.disarm();
                    debug!(%category, fired = timer.fired_count(), "Category timer cancelled");
                    break;
                }
                _ = tokio::time::sleep(delay) => {
                    if timer.fire() && !on_fire(category) {
                        timer.disarm();
                        debug!(%category, "Category timer receiver closed");
                        break;
                    }
                }
            }
        }
    })
}

/// Call `on_tick` every `period`, first after one full period, until
/// cancelled or `on_tick` returns `false`. A zero period is raised to 1ms.
pub fn spawn_ticker<F>(period: Duration, cancel: CancellationToken, mut on_tick: F) -> JoinHandle<()>
where
    F: FnMut() -> bool + Send + 'static,
{
    let period = period.max(MIN_TICK);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if !on_tick() {
                        break;
                    }
                }
            }
        }
        debug!("Ticker stopped");
    })
}

/// Run `action` once after `delay`. Not cancellable.
pub fn spawn_once<F>(delay: Duration, action: F) -> JoinHandle<()>
where
    F: FnOnce() + Send + 'static,
{
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        action();
    })
}
