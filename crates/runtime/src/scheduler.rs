//! Timer queue for encounter ticks and effect cadences.
//!
//! A min-heap keyed by next-fire time, owned by the single worker loop.
//! Encounters self-reschedule by pushing their next tick; the slow
//! cadence doubles as a watchdog that re-creates any missing encounter
//! tick, so a dropped entry can stall a fight only until the next
//! reconciliation pass.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use combat_core::types::{EncounterId, SimTime};

/// What a scheduled entry does when it fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum TaskKind {
    /// Advance one encounter.
    EncounterTick(EncounterId),
    /// Fast cadence: regen/DoT ticks.
    FastEffects,
    /// Slow cadence: buff decay plus the watchdog pass.
    SlowEffects,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct ScheduledTask {
    at: SimTime,
    /// Insertion sequence; keeps equal-time tasks in FIFO order.
    seq: u64,
    kind: TaskKind,
}

/// Min-heap of scheduled tasks.
#[derive(Debug, Default)]
pub struct TaskQueue {
    heap: BinaryHeap<Reverse<ScheduledTask>>,
    seq: u64,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, at: SimTime, kind: TaskKind) {
        self.seq += 1;
        self.heap.push(Reverse(ScheduledTask {
            at,
            seq: self.seq,
            kind,
        }));
    }

    /// Earliest pending fire time.
    pub fn next_deadline(&self) -> Option<SimTime> {
        self.heap.peek().map(|Reverse(task)| task.at)
    }

    /// Pop the next task due at or before `now`.
    pub fn pop_due(&mut self, now: SimTime) -> Option<TaskKind> {
        if self.heap.peek().is_some_and(|Reverse(task)| task.at <= now) {
            self.heap.pop().map(|Reverse(task)| task.kind)
        } else {
            None
        }
    }

    /// Whether a tick is already pending for this encounter.
    ///
    /// The watchdog consults this before repairing a schedule.
    pub fn has_encounter_tick(&self, encounter: EncounterId) -> bool {
        self.heap
            .iter()
            .any(|Reverse(task)| task.kind == TaskKind::EncounterTick(encounter))
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_time_order() {
        let mut queue = TaskQueue::new();
        queue.schedule(SimTime::from_secs(9), TaskKind::FastEffects);
        queue.schedule(SimTime::from_secs(3), TaskKind::EncounterTick(EncounterId(1)));
        queue.schedule(SimTime::from_secs(6), TaskKind::SlowEffects);

        let now = SimTime::from_secs(10);
        assert_eq!(
            queue.pop_due(now),
            Some(TaskKind::EncounterTick(EncounterId(1)))
        );
        assert_eq!(queue.pop_due(now), Some(TaskKind::SlowEffects));
        assert_eq!(queue.pop_due(now), Some(TaskKind::FastEffects));
        assert_eq!(queue.pop_due(now), None);
    }

    #[test]
    fn future_tasks_are_not_due() {
        let mut queue = TaskQueue::new();
        queue.schedule(SimTime::from_secs(5), TaskKind::FastEffects);
        assert_eq!(queue.pop_due(SimTime::from_secs(4)), None);
        assert_eq!(queue.next_deadline(), Some(SimTime::from_secs(5)));
    }

    #[test]
    fn watchdog_can_detect_missing_ticks() {
        let mut queue = TaskQueue::new();
        queue.schedule(SimTime::from_secs(1), TaskKind::EncounterTick(EncounterId(7)));
        assert!(queue.has_encounter_tick(EncounterId(7)));
        assert!(!queue.has_encounter_tick(EncounterId(8)));
    }

    #[test]
    fn equal_times_pop_fifo() {
        let mut queue = TaskQueue::new();
        let at = SimTime::from_secs(2);
        queue.schedule(at, TaskKind::EncounterTick(EncounterId(1)));
        queue.schedule(at, TaskKind::EncounterTick(EncounterId(2)));
        assert_eq!(
            queue.pop_due(at),
            Some(TaskKind::EncounterTick(EncounterId(1)))
        );
        assert_eq!(
            queue.pop_due(at),
            Some(TaskKind::EncounterTick(EncounterId(2)))
        );
    }
}
