//! Window selection and the completed-prefix cursor.

use crate::report::{JobReport, JobStatus};
use crate::retry::RetryPolicy;

/// End of the longest contiguous run of successful jobs starting at index 0.
///
/// Stored as the length of that run, so "before index 0" needs no sentinel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    prefix: usize,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last index of the success prefix, `None` while job 0 has not succeeded.
    pub fn index(&self) -> Option<usize> {
        self.prefix.checked_sub(1)
    }

    /// The cursor's immediate successor: the first index not known to be done.
    pub fn next_index(&self) -> usize {
        self.prefix
    }

    /// True once every one of `len` jobs lies inside the prefix (trivially for `len == 0`).
    pub fn covers(&self, len: usize) -> bool {
        self.prefix >= len
    }

    /// Moves past the contiguous run of successes following the cursor.
    /// Returns how many indices were passed.
    pub fn advance<T, E>(&mut self, reports: &[JobReport<T, E>]) -> usize {
        let run = reports
            .get(self.prefix..)
            .unwrap_or_default()
            .iter()
            .take_while(|report| report.status() == JobStatus::Success)
            .count();
        self.prefix += run;
        run
    }
}

/// Indices in `cursor+1 ..= cursor+window_size` (clipped) that may launch now.
pub fn select_next_batch<T, E>(
    reports: &[JobReport<T, E>],
    cursor: Cursor,
    window_size: usize,
    policy: &RetryPolicy,
) -> Vec<usize> {
    reports
        .iter()
        .skip(cursor.next_index())
        .take(window_size)
        .filter(|report| policy.is_eligible(report))
        .map(JobReport::index)
        .collect()
}
