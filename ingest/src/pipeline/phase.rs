use std::fmt;

use ingest_config::shared::UpdateMethod;

use crate::table::TableConfig;

/// Phase of a single table run.
///
/// Database sources go through `Extracting` and `Uploading`; object-storage sources replace both
/// with `Claiming`. `Done`, `Skipped` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IngestionPhase {
    Reconciling,
    Claiming,
    Extracting,
    Uploading,
    Staging,
    Tracking,
    Merging,
    Replacing,
    Appending,
    Bookmarking,
    Archiving,
    Done,
    Skipped,
    Failed,
}

impl IngestionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            IngestionPhase::Done | IngestionPhase::Skipped | IngestionPhase::Failed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IngestionPhase::Reconciling => "reconciling",
            IngestionPhase::Claiming => "claiming",
            IngestionPhase::Extracting => "extracting",
            IngestionPhase::Uploading => "uploading",
            IngestionPhase::Staging => "staging",
            IngestionPhase::Tracking => "tracking",
            IngestionPhase::Merging => "merging",
            IngestionPhase::Replacing => "replacing",
            IngestionPhase::Appending => "appending",
            IngestionPhase::Bookmarking => "bookmarking",
            IngestionPhase::Archiving => "archiving",
            IngestionPhase::Done => "done",
            IngestionPhase::Skipped => "skipped",
            IngestionPhase::Failed => "failed",
        }
    }
}

impl fmt::Display for IngestionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the phase following `phase` for `table`.
///
/// Terminal phases map to themselves. Skipping after an empty claim is decided by the runner,
/// since it depends on the object store contents.
pub fn next_phase(phase: IngestionPhase, table: &TableConfig) -> IngestionPhase {
    match phase {
        IngestionPhase::Reconciling if table.source_platform.is_database() => {
            IngestionPhase::Extracting
        }
        IngestionPhase::Reconciling => IngestionPhase::Claiming,
        IngestionPhase::Claiming => IngestionPhase::Staging,
        IngestionPhase::Extracting => IngestionPhase::Uploading,
        IngestionPhase::Uploading => IngestionPhase::Staging,
        IngestionPhase::Staging if table.include_load_dts => IngestionPhase::Tracking,
        IngestionPhase::Staging | IngestionPhase::Tracking => resolve_phase(table.update_method),
        IngestionPhase::Merging | IngestionPhase::Replacing | IngestionPhase::Appending
            if table.is_incremental() =>
        {
            IngestionPhase::Bookmarking
        }
        IngestionPhase::Merging
        | IngestionPhase::Replacing
        | IngestionPhase::Appending
        | IngestionPhase::Bookmarking => IngestionPhase::Archiving,
        IngestionPhase::Archiving => IngestionPhase::Done,
        IngestionPhase::Done | IngestionPhase::Skipped | IngestionPhase::Failed => phase,
    }
}

fn resolve_phase(update_method: UpdateMethod) -> IngestionPhase {
    match update_method {
        UpdateMethod::Merge => IngestionPhase::Merging,
        UpdateMethod::FullLoad => IngestionPhase::Replacing,
        UpdateMethod::IncrementalLoad | UpdateMethod::Append => IngestionPhase::Appending,
    }
}
