//! Instruction queue.
//!
//! A FIFO of program counters over the (immutable) program. The frontend is
//! strictly in-program-order: only the head is examined per cycle, and a
//! taken branch flushes the queue and reloads it from the target.

use std::collections::VecDeque;

/// FIFO of pending instruction indices.
#[derive(Clone, Debug)]
pub struct InstructionQueue {
    queue: VecDeque<usize>,
    program_len: usize,
}

impl InstructionQueue {
    /// Loads the queue with the whole program, in order.
    pub fn new(program_len: usize) -> Self {
        Self {
            queue: (0..program_len).collect(),
            program_len,
        }
    }

    /// The pc at the head, if any.
    pub fn head(&self) -> Option<usize> {
        self.queue.front().copied()
    }

    /// Dequeues the head after a successful issue.
    pub fn pop(&mut self) -> Option<usize> {
        self.queue.pop_front()
    }

    /// Flushes everything and reloads from `target` to the end of the
    /// program (taken branch).
    pub fn reload_from(&mut self, target: usize) {
        self.queue.clear();
        self.queue.extend(target..self.program_len);
    }

    /// True when nothing is left to issue.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of pending instructions.
    pub fn len(&self) -> usize {
        self.queue.len()
    }
}
