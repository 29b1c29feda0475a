//! Chunk planning
//!
//! Decides whether a value is stored whole or split into contiguous
//! chunks. Only lists and tuples with at least as many elements as the
//! requested chunk count are split; everything else is written whole to
//! chunk 0, whatever count was requested.

use crate::value::Value;
use std::num::NonZeroUsize;
use std::ops::Range;

/// How a value will be laid out on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkPlan {
    /// One file at index 0
    Whole,
    /// `chunks` files, each holding at most `chunk_size` elements of a
    /// sequence of `len` elements
    Split {
        len: usize,
        chunks: NonZeroUsize,
        chunk_size: usize,
    },
}

impl ChunkPlan {
    /// Plan the storage of `value` across `chunks` files
    pub fn for_value(value: &Value, chunks: NonZeroUsize) -> Self {
        match value.as_sequence() {
            Some(items) if items.len() >= chunks.get() => Self::Split {
                len: items.len(),
                chunks,
                chunk_size: items.len().div_ceil(chunks.get()),
            },
            _ => Self::Whole,
        }
    }

    /// Number of chunk files this plan writes
    pub fn chunk_count(&self) -> usize {
        match self {
            Self::Whole => 1,
            Self::Split { chunks, .. } => chunks.get(),
        }
    }

    /// Element range of chunk `index`, or `None` for a whole plan or an
    /// index past the last chunk
    pub fn range(&self, index: usize) -> Option<Range<usize>> {
        match *self {
            Self::Split {
                len,
                chunks,
                chunk_size,
            } if index < chunks.get() => {
                let start = (index * chunk_size).min(len);
                let end = ((index + 1) * chunk_size).min(len);
                Some(start..end)
            }
            _ => None,
        }
    }

    /// Element ranges of each chunk, in index order.
    ///
    /// Always yields exactly `chunks` ranges; trailing ranges may be short
    /// or empty.
    pub fn ranges(&self) -> Vec<Range<usize>> {
        (0..self.chunk_count())
            .filter_map(|index| self.range(index))
            .collect()
    }

    /// Sub-value of chunk `index` alone, without materializing the others.
    /// Lists split into lists, tuples into tuples; a whole plan yields the
    /// value itself.
    pub fn part(&self, value: &Value, index: usize) -> Value {
        match (self.range(index), value) {
            (Some(range), Value::List(items)) => Value::List(items[range].to_vec()),
            (Some(range), Value::Tuple(items)) => Value::Tuple(items[range].to_vec()),
            _ => value.clone(),
        }
    }

    /// Sub-values of every chunk, in index order
    pub fn split(&self, value: &Value) -> Vec<Value> {
        (0..self.chunk_count())
            .map(|index| self.part(value, index))
            .collect()
    }
}
