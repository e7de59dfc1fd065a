//! Interrupt → loop event queue.
//!
//! Timer handlers post minimal-payload events; the cooperative loop drains
//! them in FIFO order each iteration. Payloads only identify the source.
//! Data travels through single-writer fields owned by that source.

use delta_common::consts::EVENT_QUEUE_SLOTS;
use heapless::spsc::Queue;
use static_assertions::assert_eq_size;

/// Event posted from interrupt context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Axis step queue ran empty.
    AxisIdle(u8),
    /// End-stop triggered during a homing move; the axis stopped.
    EndstopHit(u8),
    /// New temperature sample stored for a heater.
    HeaterSample(u8),
    /// Planner idle-flush deadline reached.
    FlushTimeout,
}

assert_eq_size!(Event, [u8; 2]);

/// Bounded FIFO with a configured logical capacity.
pub struct EventQueue {
    queue: Queue<Event, EVENT_QUEUE_SLOTS>,
    limit: usize,
    overflows: u64,
}

impl EventQueue {
    /// `limit` is clamped to what the backing queue can hold.
    pub fn new(limit: usize) -> Self {
        let queue: Queue<Event, EVENT_QUEUE_SLOTS> = Queue::new();
        let limit = limit.clamp(1, queue.capacity());
        Self {
            queue,
            limit,
            overflows: 0,
        }
    }

    /// Post from interrupt context. A full queue drops the event and counts
    /// the overflow.
    pub fn post(&mut self, event: Event) -> bool {
        if self.queue.len() >= self.limit || self.queue.enqueue(event).is_err() {
            self.overflows += 1;
            return false;
        }
        true
    }

    pub fn next(&mut self) -> Option<Event> {
        self.queue.dequeue()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn overflows(&self) -> u64 {
        self.overflows
    }

    pub fn clear(&mut self) {
        while self.queue.dequeue().is_some() {}
    }
}
