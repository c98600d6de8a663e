use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::event::Event;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimerOperation {
    /// Begin delivering `Event::TimerTicked` every `interval_ms`.
    Start { interval_ms: u64 },
    Cancel,
}

impl Operation for TimerOperation {
    type Output = ();
}

/// Asks the shell to start or stop the focus tick. Ticks arrive as ordinary
/// `Event::TimerTicked` events, not as resolutions of this request.
pub struct Timer<Ev> {
    context: CapabilityContext<TimerOperation, Ev>,
}

impl<Ev> Capability<Ev> for Timer<Ev> {
    type Operation = TimerOperation;
    type MappedSelf<MappedEv> = Timer<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Timer::new(self.context.map_event(f))
    }
}

impl<Ev> Timer<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<TimerOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn start(&self, interval_ms: u64) {
        self.notify(TimerOperation::Start { interval_ms });
    }

    pub fn cancel(&self) {
        self.notify(TimerOperation::Cancel);
    }

    fn notify(&self, operation: TimerOperation) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(operation).await;
        });
    }
}

/// Shell-side driver for the repeating tick. At most one tick task is live.
///
/// Needs to run inside a tokio runtime.
#[derive(Debug)]
pub struct TickScheduler {
    events: UnboundedSender<Event>,
    task: Option<JoinHandle<()>>,
}

impl TickScheduler {
    pub fn new(events: UnboundedSender<Event>) -> Self {
        Self { events, task: None }
    }

    pub fn apply(&mut self, operation: TimerOperation) {
        match operation {
            TimerOperation::Start { interval_ms } => self.start(interval_ms),
            TimerOperation::Cancel => self.cancel(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    fn start(&mut self, interval_ms: u64) {
        self.cancel();
        let events = self.events.clone();
        let period = Duration::from_millis(interval_ms.max(1));
        debug!(interval_ms, "tick scheduler started");

        self.task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; a countdown second starts after it.
            interval.tick().await;
            loop {
                interval.tick().await;
                if events.send(Event::TimerTicked).is_err() {
                    break;
                }
            }
        }));
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("tick scheduler cancelled");
        }
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
