use crate::model::{FileAction, JobResourceResult, JobResourceSummary};
use std::collections::BTreeMap;

/// Per `(group, kind)` counters, ordered for stable status output.
#[derive(Debug, Default)]
pub(crate) struct SummaryTable {
    entries: BTreeMap<(String, String), JobResourceSummary>,
}

impl SummaryTable {
    pub(crate) fn record(&mut self, result: &JobResourceResult) {
        let group = result.group.clone().unwrap_or_default();
        let kind = result.kind.clone().unwrap_or_default();
        let entry = self
            .entries
            .entry((group.clone(), kind.clone()))
            .or_insert_with(|| JobResourceSummary {
                group,
                kind,
                ..JobResourceSummary::default()
            });

        if result.error.is_some() {
            entry.error += 1;
            return;
        }
        match result.action {
            FileAction::Created => entry.create += 1,
            FileAction::Updated => entry.update += 1,
            FileAction::Deleted => entry.delete += 1,
            FileAction::Renamed => entry.rename += 1,
            FileAction::Ignored => {}
        }
    }

    pub(crate) fn snapshot(&self) -> Vec<JobResourceSummary> {
        self.entries.values().cloned().collect()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
