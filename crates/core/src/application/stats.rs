// Queue introspection snapshot

use serde::{Deserialize, Serialize};

/// Point-in-time view of a dispatch queue, taken under the state lock
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Items waiting in the buffer
    pub length: usize,
    pub capacity: usize,
    /// Live workers (eligible for matching)
    pub pool_size: usize,
    pub busy_workers: usize,
    pub idle_workers: usize,
    /// Workers detached by a shrink that are still finishing an event
    pub draining_workers: usize,

    pub counters: QueueCounters,
}

/// Monotonic totals since the queue was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounters {
    pub submitted: u64,
    /// Bound straight to an idle worker at submission time
    pub dispatched_direct: u64,
    /// Bound later by a dispatch pass
    pub dispatched_buffered: u64,
    pub buffered: u64,
    pub rejected: u64,
    pub completed: u64,
    /// Buffered items whose handle was dropped before a worker freed up
    pub abandoned: u64,
}
