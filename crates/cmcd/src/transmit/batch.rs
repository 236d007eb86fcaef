use std::mem;

use crate::value::CmcdFields;

/// Reports waiting to be posted as one JSON array.
///
/// The buffer is handed out whole once it reaches the batch size and is
/// never flushed partially.
#[derive(Debug)]
pub struct BatchBuffer {
    reports: Vec<CmcdFields>,
    batch_size: usize,
}

impl BatchBuffer {
    pub fn new(batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            reports: Vec::with_capacity(batch_size),
            batch_size,
        }
    }

    /// Appends a report. Returns the full batch, leaving the buffer empty,
    /// when the append reached the batch size.
    pub fn push(&mut self, report: CmcdFields) -> Option<Vec<CmcdFields>> {
        self.reports.push(report);
        if self.reports.len() >= self.batch_size {
            Some(mem::replace(
                &mut self.reports,
                Vec::with_capacity(self.batch_size),
            ))
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Drops whatever is buffered, returning how many reports were lost.
    pub fn discard(&mut self) -> usize {
        let dropped = self.reports.len();
        self.reports.clear();
        dropped
    }
}
