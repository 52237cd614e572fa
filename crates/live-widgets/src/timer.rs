//! Virtual-clock timer service.
//!
//! The runtime is single-threaded and cooperatively scheduled, so timers run
//! on a virtual clock measured in ticks rather than on an OS timer thread. A
//! deadline heap tracks the next due entry; repeating timers re-arm when they
//! fire.

use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap},
    fmt,
};

use crate::runtime::InstanceId;

/// Identifier for a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    /// Construct a timer id from its raw value. Used by widgets that stash a
    /// timer handle in their model.
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// The raw id value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a timer does when it fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerTask {
    /// Run a document scan.
    Scan,
    /// Invoke a controller action on an instance, with no arguments.
    Action {
        /// Target instance.
        instance: InstanceId,
        /// Action name to invoke.
        action: String,
    },
}

/// A timer with a pending deadline.
#[derive(Debug)]
struct Deadline {
    /// Scheduled tick for the fire.
    time: u64,
    /// Insertion sequence, to keep equal deadlines in schedule order.
    seq: u64,
    /// Timer this deadline belongs to.
    id: TimerId,
}

impl PartialEq for Deadline {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}

impl Eq for Deadline {}

/// Reverse order so the deadline closest in time is at the top.
impl PartialOrd for Deadline {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Reverse order so the deadline closest in time is at the top.
impl Ord for Deadline {
    fn cmp(&self, other: &Self) -> Ordering {
        other.time.cmp(&self.time).then(other.seq.cmp(&self.seq))
    }
}

/// Live timer bookkeeping.
struct TimerEntry {
    /// Re-arm period for repeating timers.
    period: Option<u64>,
    /// Task to run when the timer fires.
    task: TimerTask,
}

/// The timer table and deadline heap.
#[derive(Default)]
pub struct Timers {
    /// Pending deadline heap. Cancelled timers leave stale heap entries that
    /// are skipped lazily when they surface.
    heap: BinaryHeap<Deadline>,
    /// Live timers by id.
    entries: HashMap<TimerId, TimerEntry>,
    /// Next timer id to allocate.
    next_id: u64,
    /// Next deadline sequence number.
    next_seq: u64,
}

impl Timers {
    /// Create an empty timer table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a task `delay` ticks after `now`. A `period` makes the timer
    /// repeat with that spacing after the first fire; a zero period is
    /// clamped to one tick.
    pub fn schedule(
        &mut self,
        now: u64,
        delay: u64,
        period: Option<u64>,
        task: TimerTask,
    ) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.insert(
            id,
            TimerEntry {
                period: period.map(|p| p.max(1)),
                task,
            },
        );
        self.push_deadline(now + delay.max(1), id);
        id
    }

    /// Push a heap deadline for a timer.
    fn push_deadline(&mut self, time: u64, id: TimerId) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Deadline { time, seq, id });
    }

    /// Cancel a timer. Returns true if it was still live. Idempotent.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Cancel every timer owned by an instance.
    pub fn cancel_for(&mut self, instance: InstanceId) {
        self.entries.retain(|_, e| {
            !matches!(&e.task, TimerTask::Action { instance: i, .. } if *i == instance)
        });
    }

    /// Is the timer still live?
    pub fn is_active(&self, id: TimerId) -> bool {
        self.entries.contains_key(&id)
    }

    /// The tick of the next live deadline, if any. Stale deadlines for
    /// cancelled timers are discarded along the way.
    pub fn next_deadline(&mut self) -> Option<u64> {
        while let Some(top) = self.heap.peek() {
            if self.entries.contains_key(&top.id) {
                return Some(top.time);
            }
            self.heap.pop();
        }
        None
    }

    /// Pop every timer due at or before `now`, in deadline order, re-arming
    /// repeating entries.
    pub fn due(&mut self, now: u64) -> Vec<(TimerId, TimerTask)> {
        let mut fired = Vec::new();
        while let Some(top) = self.heap.peek() {
            if top.time > now {
                break;
            }
            // Unwrap is safe, peek returned Some.
            let d = self.heap.pop().unwrap();
            let Some(entry) = self.entries.get(&d.id) else {
                // Cancelled; drop the stale deadline.
                continue;
            };
            fired.push((d.id, entry.task.clone()));
            if let Some(period) = entry.period {
                self.push_deadline(d.time + period, d.id);
            } else {
                self.entries.remove(&d.id);
            }
        }
        fired
    }

    /// Number of live timers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Are there no live timers?
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
