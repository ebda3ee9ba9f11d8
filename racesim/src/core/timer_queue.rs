use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Deferred work that falls due at a point of virtual race time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Pit stop of the given agent is completed.
    PitExit { agent_id: u32 },
    /// Periodic raindrop generation while it is raining.
    RainSpawn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScheduledTimer {
    at_us: u64,
    seq: u64,
    event: TimerEvent,
}

impl Ord for ScheduledTimer {
    fn cmp(&self, other: &Self) -> Ordering {
        // equal times fire in scheduling order
        (self.at_us, self.seq).cmp(&(other.at_us, other.seq))
    }
}

impl PartialOrd for ScheduledTimer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// TimerQueue is a min-heap of one-shot timers keyed by virtual time (in microseconds).
#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Reverse<ScheduledTimer>>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// schedule registers event to fire at virtual time at_us.
    pub fn schedule(&mut self, at_us: u64, event: TimerEvent) {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.heap.push(Reverse(ScheduledTimer { at_us, seq, event }));
    }

    /// pop_due removes and returns the earliest timer that is due at now_us.
    pub fn pop_due(&mut self, now_us: u64) -> Option<(u64, TimerEvent)> {
        match self.heap.peek() {
            Some(Reverse(top)) if top.at_us <= now_us => {
                let Reverse(timer) = self.heap.pop()?;
                Some((timer.at_us, timer.event))
            }
            _ => None,
        }
    }

    /// cancel_where drops all pending timers matching the predicate and returns how many were
    /// dropped.
    pub fn cancel_where<F>(&mut self, mut pred: F) -> usize
    where
        F: FnMut(&TimerEvent) -> bool,
    {
        let len_before = self.heap.len();
        self.heap.retain(|Reverse(timer)| !pred(&timer.event));
        len_before - self.heap.len()
    }

    pub fn is_pending(&self, event: &TimerEvent) -> bool {
        self.heap.iter().any(|Reverse(timer)| timer.event == *event)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timers_fire_in_time_then_scheduling_order() {
        let mut queue = TimerQueue::new();
        queue.schedule(500, TimerEvent::PitExit { agent_id: 1 });
        queue.schedule(100, TimerEvent::PitExit { agent_id: 2 });
        queue.schedule(500, TimerEvent::PitExit { agent_id: 3 });

        assert_eq!(queue.pop_due(50), None);
        assert_eq!(
            queue.pop_due(1000),
            Some((100, TimerEvent::PitExit { agent_id: 2 }))
        );
        assert_eq!(
            queue.pop_due(1000),
            Some((500, TimerEvent::PitExit { agent_id: 1 }))
        );
        assert_eq!(
            queue.pop_due(1000),
            Some((500, TimerEvent::PitExit { agent_id: 3 }))
        );
        assert_eq!(queue.pop_due(u64::MAX), None);
    }

    #[test]
    fn cancel_where_only_drops_matching_timers() {
        let mut queue = TimerQueue::new();
        queue.schedule(10, TimerEvent::RainSpawn);
        queue.schedule(20, TimerEvent::PitExit { agent_id: 4 });

        let dropped = queue.cancel_where(|ev| matches!(ev, TimerEvent::RainSpawn));
        assert_eq!(dropped, 1);
        assert!(!queue.is_pending(&TimerEvent::RainSpawn));
        assert!(queue.is_pending(&TimerEvent::PitExit { agent_id: 4 }));
        assert_eq!(queue.pop_due(100), Some((20, TimerEvent::PitExit { agent_id: 4 })));
        assert_eq!(queue.pop_due(100), None);
    }
}
