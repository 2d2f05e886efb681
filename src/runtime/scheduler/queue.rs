//! Per-phase record queues
//!
//! The runner keeps two of these: the live buckets it resumes, and the
//! pending queues that collect submissions until the next cycle starts.

use std::collections::VecDeque;

use super::task::TaskRecord;
use crate::runtime::phase::{Phase, PhaseTable};

/// One FIFO of task records per phase.
#[derive(Debug, Default)]
pub(crate) struct PhaseQueues {
    queues: PhaseTable<VecDeque<TaskRecord>>,
}

impl PhaseQueues {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append at the tail of `phase`'s queue.
    #[inline]
    pub(crate) fn push(
        &mut self,
        phase: Phase,
        record: TaskRecord,
    ) {
        self.queues[phase].push_back(record);
    }

    /// Take the whole queue of `phase`, leaving it empty.
    #[inline]
    pub(crate) fn take(
        &mut self,
        phase: Phase,
    ) -> VecDeque<TaskRecord> {
        std::mem::take(&mut self.queues[phase])
    }

    /// Put `records` back in front of whatever `phase` currently holds.
    pub(crate) fn restore(
        &mut self,
        phase: Phase,
        mut records: VecDeque<TaskRecord>,
    ) {
        let queue = &mut self.queues[phase];
        if queue.is_empty() {
            *queue = records;
        } else {
            records.append(queue);
            *queue = records;
        }
    }

    /// Move every record into `target`, phase by phase, preserving order.
    pub(crate) fn drain_into(
        &mut self,
        target: &mut PhaseQueues,
    ) -> usize {
        let mut moved = 0;
        for (phase, queue) in self.queues.iter_mut() {
            moved += queue.len();
            target.queues[phase].append(queue);
        }
        moved
    }

    #[inline]
    pub(crate) fn len_of(
        &self,
        phase: Phase,
    ) -> usize {
        self.queues[phase].len()
    }

    pub(crate) fn len(&self) -> usize {
        self.queues.iter().map(|(_, queue)| queue.len()).sum()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// IDs queued at `phase`, front to back.
    pub(crate) fn ids_of(
        &self,
        phase: Phase,
    ) -> Vec<super::TaskId> {
        self.queues[phase].iter().map(TaskRecord::id).collect()
    }
}
