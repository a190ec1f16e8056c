use std::collections::HashMap;
use std::time::Duration;

/// Handle to a scheduled timer. Owners keep it in a field and compare fired
/// handles against it; a handle that no longer matches is stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Host-provided scheduling facility.
///
/// Timers never run code on their own: the driver pulls due handles with
/// [`Scheduler::pop_due`] and hands each one to whoever scheduled it.
pub trait Scheduler {
    /// Schedule a repeating timer firing every `period`.
    fn every(&mut self, period: Duration) -> TimerId;

    /// Schedule a one-shot timer firing once after `delay`.
    fn after(&mut self, delay: Duration) -> TimerId;

    /// Cancel a timer. Unknown or already fired handles are ignored.
    fn cancel(&mut self, id: TimerId);

    /// Current time on the scheduler's clock.
    fn now(&self) -> Duration;

    /// Return the earliest timer due at or before `until` and move the clock
    /// to its deadline. Once nothing else is due the clock rests at `until`
    /// and `None` is returned.
    fn pop_due(&mut self, until: Duration) -> Option<TimerId>;

    /// Number of live timers.
    fn active(&self) -> usize;
}

#[derive(Clone, Copy, Debug)]
struct Timer {
    deadline: Duration,
    period: Option<Duration>,
}

/// Deterministic virtual clock. The terminal host advances it with real
/// elapsed time; tests advance it by hand.
#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Duration,
    next_id: u64,
    timers: HashMap<TimerId, Timer>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.timers.contains_key(&id)
    }

    fn insert(&mut self, delay: Duration, period: Option<Duration>) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.insert(
            id,
            Timer {
                deadline: self.now + delay,
                period,
            },
        );
        id
    }
}

impl Scheduler for TimerQueue {
    fn every(&mut self, period: Duration) -> TimerId {
        // a zero period would keep the same timer due forever
        let period = period.max(Duration::from_millis(1));
        self.insert(period, Some(period))
    }

    fn after(&mut self, delay: Duration) -> TimerId {
        self.insert(delay, None)
    }

    fn cancel(&mut self, id: TimerId) {
        self.timers.remove(&id);
    }

    fn now(&self) -> Duration {
        self.now
    }

    fn pop_due(&mut self, until: Duration) -> Option<TimerId> {
        let next = self
            .timers
            .iter()
            .filter(|(_, t)| t.deadline <= until)
            .min_by_key(|(id, t)| (t.deadline, **id))
            .map(|(id, t)| (*id, *t));

        match next {
            Some((id, timer)) => {
                self.now = self.now.max(timer.deadline);
                match timer.period {
                    Some(period) => {
                        if let Some(t) = self.timers.get_mut(&id) {
                            t.deadline = timer.deadline + period;
                        }
                    }
                    None => {
                        self.timers.remove(&id);
                    }
                }
                Some(id)
            }
            None => {
                self.now = self.now.max(until);
                None
            }
        }
    }

    fn active(&self) -> usize {
        self.timers.len()
    }
}
