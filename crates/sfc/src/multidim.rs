//! Growable rank-r lookup table with a default value.
//!
//! Rust has no convenient way to recurse a type over a runtime-only rank,
//! and the neighbor/opponent/parent-facet tables this backs are sparse
//! relative to their nominal bounds (most `[child][state][facet]` cells are
//! never written), so this keeps the *observable* semantics — default
//! reads, grow-on-write, dense iteration/codegen over the materialized
//! bounds — on top of a `HashMap` rather than a nested-`Vec` layout.

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct MultidimArray<T> {
    data: HashMap<Vec<usize>, T>,
    sizes: Vec<usize>,
    rank: usize,
    default: T,
}

impl<T: Clone + PartialEq> MultidimArray<T> {
    pub fn new(rank: usize, default: T) -> Self {
        MultidimArray {
            data: HashMap::new(),
            sizes: vec![0; rank],
            rank,
            default,
        }
    }

    fn check_index(&self, index: &[usize]) {
        assert_eq!(index.len(), self.rank, "MultidimArray rank mismatch");
    }

    /// Reads the cell, returning the default value if it was never written.
    pub fn get(&self, index: &[usize]) -> T {
        self.check_index(index);
        self.data.get(index).cloned().unwrap_or_else(|| self.default.clone())
    }

    /// Writes the cell, growing the recorded size along each dimension to
    /// include the index.
    pub fn set(&mut self, index: &[usize], value: T) {
        self.check_index(index);
        for (dim, &i) in index.iter().enumerate() {
            if i + 1 > self.sizes[dim] {
                self.sizes[dim] = i + 1;
            }
        }
        self.data.insert(index.to_vec(), value);
    }

    /// True only if a write materialized a non-default value at `index`.
    pub fn contains_not_default(&self, index: &[usize]) -> bool {
        self.check_index(index);
        self.data.get(index).is_some_and(|v| *v != self.default)
    }

    pub fn size(&self, dim: usize) -> usize {
        self.sizes[dim]
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Iterates over every cell within the materialized (dense) bounds,
    /// yielding `(indices, value)` in row-major order. Used by the
    /// table-generation sink to emit a nested-array initializer.
    pub fn dense_iter(&self) -> impl Iterator<Item = (Vec<usize>, T)> + '_ {
        let sizes = self.sizes.clone();
        CartesianIndices::new(sizes).map(move |idx| {
            let v = self.get(&idx);
            (idx, v)
        })
    }
}

struct CartesianIndices {
    sizes: Vec<usize>,
    next: Option<Vec<usize>>,
}

impl CartesianIndices {
    fn new(sizes: Vec<usize>) -> Self {
        let start = if sizes.iter().all(|&s| s > 0) {
            Some(vec![0; sizes.len()])
        } else {
            None
        };
        CartesianIndices { sizes, next: start }
    }
}

impl Iterator for CartesianIndices {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.next.clone()?;
        let mut bumped = current.clone();
        for dim in (0..bumped.len()).rev() {
            bumped[dim] += 1;
            if bumped[dim] < self.sizes[dim] {
                self.next = Some(bumped);
                return Some(current);
            }
            bumped[dim] = 0;
        }
        self.next = None;
        Some(current)
    }
}

/// Serializes a table as nested literal arrays; the caller supplies the
/// element formatter, so this stays agnostic to the target language a
/// generated table is meant for.
pub fn emit_nested_array<T: Clone + PartialEq>(
    table: &MultidimArray<T>,
    name: &str,
    fmt: impl Fn(&T) -> String,
) -> String {
    fn build<T: Clone + PartialEq>(
        table: &MultidimArray<T>,
        prefix: &mut Vec<usize>,
        dim: usize,
        fmt: &impl Fn(&T) -> String,
    ) -> String {
        if dim == table.rank() {
            return fmt(&table.get(prefix));
        }
        let mut parts = Vec::new();
        for i in 0..table.size(dim) {
            prefix.push(i);
            parts.push(build(table, prefix, dim + 1, fmt));
            prefix.pop();
        }
        format!("{{{}}}", parts.join(", "))
    }

    let mut prefix = Vec::new();
    let body = build(table, &mut prefix, 0, &fmt);
    format!("{name} = {body};")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grows_on_write_and_defaults_elsewhere() {
        let mut t: MultidimArray<i64> = MultidimArray::new(2, -1);
        assert_eq!(t.get(&[0, 0]), -1);
        t.set(&[1, 2], 7);
        assert_eq!(t.size(0), 2);
        assert_eq!(t.size(1), 3);
        assert_eq!(t.get(&[1, 2]), 7);
        assert_eq!(t.get(&[0, 0]), -1);
        assert!(t.contains_not_default(&[1, 2]));
        assert!(!t.contains_not_default(&[0, 0]));
    }

    #[test]
    fn dense_iter_covers_materialized_bounds() {
        let mut t: MultidimArray<i64> = MultidimArray::new(2, 0);
        t.set(&[1, 1], 5);
        let cells: Vec<_> = t.dense_iter().collect();
        assert_eq!(cells.len(), 4); // 2x2
    }
}
