//! Run merging for short single-byte strings.
//!
//! Short keys and tags tend to sit a few bytes apart and contain only ASCII.
//! Rather than allocating one string each, the accumulator keeps a pending
//! run covering all of them, including the header bytes in between, and
//! materializes the whole range once. A consumer that knows each string's
//! offset slices it back out of the run.
//!
//! A run is flushed when:
//! - the next span needs real UTF-8 decoding
//! - the gap since the previous span exceeds `max_gap`
//! - the run would grow past `merge_cap`
//! - the call ends

use std::ops::Range;

use tracing::trace;

use crate::text::{ascii_prefix_len, decode_latin1, decode_utf8};

/// Limits that govern when a pending run is flushed
#[derive(Debug, Clone, Copy)]
pub(crate) struct RunLimits {
    /// Spans at or above this length skip the single-byte probe
    pub(crate) fast_scan_limit: usize,
    /// Largest gap between spans that still merges
    pub(crate) max_gap: usize,
    /// Largest run, measured from run start to span end
    pub(crate) merge_cap: usize,
}

/// Accumulates decoded strings for one extraction call
#[derive(Debug)]
pub(crate) struct RunAccumulator {
    limits: RunLimits,
    run: Option<Range<usize>>,
}

impl RunAccumulator {
    pub(crate) fn new(limits: RunLimits) -> Self {
        Self { limits, run: None }
    }

    /// Whether a run is pending
    pub(crate) fn has_run(&self) -> bool {
        self.run.is_some()
    }

    /// Handle the text span `data[span]`, appending any materialized
    /// strings to `out`.
    pub(crate) fn push(&mut self, data: &[u8], span: Range<usize>, out: &mut Vec<String>) {
        let bytes = &data[span.clone()];
        let single_byte =
            bytes.len() < self.limits.fast_scan_limit && ascii_prefix_len(bytes) == bytes.len();

        if !single_byte {
            self.flush(data, out);
            out.push(decode_utf8(bytes));
            return;
        }

        self.run = Some(match self.run.take() {
            Some(run) => {
                let gap = span.start.saturating_sub(run.end);
                let merged_len = span.end - run.start;
                if gap > self.limits.max_gap || merged_len > self.limits.merge_cap {
                    trace!(
                        "Flushing run {}..{} (gap {}, merged length {})",
                        run.start,
                        run.end,
                        gap,
                        merged_len
                    );
                    out.push(decode_latin1(&data[run]));
                    span
                } else {
                    run.start..span.end
                }
            }
            None => span,
        });
    }

    /// Materialize the pending run, if any, into `out`.
    pub(crate) fn flush(&mut self, data: &[u8], out: &mut Vec<String>) {
        if let Some(run) = self.take(data) {
            out.push(run);
        }
    }

    /// Materialize and clear the pending run.
    pub(crate) fn take(&mut self, data: &[u8]) -> Option<String> {
        self.run.take().map(|run| decode_latin1(&data[run]))
    }
}
