//! Visit-once worklist engine.
//!
//! A queue of unprocessed elements plus a visited-set keyed by a
//! caller-supplied key (so, e.g., two `GeometricTreeNode`s with the same
//! `state` collapse into a single visit). The callback returns newly
//! discovered candidates instead of calling back into `add` on a shared
//! `&mut self`, avoiding a reentrant borrow.

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

pub struct CompletionAlgorithm<T, K> {
    visited: HashSet<K>,
    queue: VecDeque<T>,
    result: Vec<T>,
    key_fn: Box<dyn Fn(&T) -> K>,
}

impl<T: Clone, K: Eq + Hash + Clone> CompletionAlgorithm<T, K> {
    pub fn new(seed: Vec<T>, key_fn: impl Fn(&T) -> K + 'static) -> Self {
        let mut alg = CompletionAlgorithm {
            visited: HashSet::new(),
            queue: VecDeque::new(),
            result: Vec::new(),
            key_fn: Box::new(key_fn),
        };
        for item in seed {
            alg.add(item);
        }
        alg
    }

    /// Enqueues `item` unless its key has already been visited.
    pub fn add(&mut self, item: T) {
        let key = (self.key_fn)(&item);
        if self.visited.insert(key) {
            self.queue.push_back(item);
        }
    }

    /// Drains the queue, calling `func` once per popped element. `func`
    /// returns candidate successors, which are enqueued through `add` (so
    /// already-visited ones are silently dropped).
    pub fn compute_single_completion(&mut self, mut func: impl FnMut(&T) -> Vec<T>) {
        while let Some(item) = self.queue.pop_front() {
            let successors = func(&item);
            self.result.push(item);
            for s in successors {
                self.add(s);
            }
        }
    }

    pub fn result(&self) -> &[T] {
        &self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visits_each_key_once() {
        // a cycle of 4 values mod 4, started from 0, should visit exactly
        // {0,1,2,3} despite each step proposing the next one repeatedly.
        let mut alg = CompletionAlgorithm::new(vec![0i32], |v| *v);
        alg.compute_single_completion(|&v| vec![(v + 1) % 4, (v + 1) % 4]);
        let mut seen: Vec<i32> = alg.result().to_vec();
        seen.sort();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }
}
