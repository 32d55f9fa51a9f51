//! Calls deferred to the next display refresh.

use std::collections::VecDeque;

type Deferred<C, E> = Box<dyn FnOnce(&mut C) -> Result<(), E>>;

/// FIFO of calls run at the next `flip`.
pub struct FlipQueue<C, E> {
    pending: VecDeque<Deferred<C, E>>,
}

impl<C, E> FlipQueue<C, E> {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
        }
    }

    pub fn call_on_flip<F>(&mut self, f: F)
    where
        F: FnOnce(&mut C) -> Result<(), E> + 'static,
    {
        self.pending.push_back(Box::new(f));
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Runs every queued call in order. The first error stops the flip and
    /// the calls still queued are discarded.
    pub fn flip(&mut self, ctx: &mut C) -> Result<usize, E> {
        let mut ran = 0;
        while let Some(call) = self.pending.pop_front() {
            if let Err(e) = call(ctx) {
                self.pending.clear();
                return Err(e);
            }
            ran += 1;
        }
        Ok(ran)
    }
}

impl<C, E> Default for FlipQueue<C, E> {
    fn default() -> Self {
        Self::new()
    }
}
