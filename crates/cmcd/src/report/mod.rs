// Report assembly: turns a trigger plus session state into CMCD fields.

pub mod builder;
pub mod keys;

pub use builder::{EventCode, ReportBuilder, Trigger};

use url::Url;

use crate::value::CmcdFields;

/// One assembled report. Built per trigger, handed to the sender, then dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct CmcdReport {
    pub fields: CmcdFields,
    /// Resource the report correlates to, for load-triggered reports.
    pub request: Option<Url>,
}

impl CmcdReport {
    pub fn get(&self, key: &str) -> Option<&crate::CmcdValue> {
        self.fields.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
