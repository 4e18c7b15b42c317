/// Actions that operate on the runner's own state rather than on the data store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAction {
    ListCommands,
    Exit,
}

/// The illustrative data-access scenarios the harness can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DemoOperation {
    ChangeTracking,
    Projections,
    NPlusOneQuery,
    OverInclusion,
    PagedResults,
    SplitQuery,
    StringAggregation,
    DateFunctions,
    BulkUpdate,
}

impl DemoOperation {
    /// Every operation, in the order the default catalog declares them.
    pub const ALL: [DemoOperation; 9] = [
        DemoOperation::ChangeTracking,
        DemoOperation::Projections,
        DemoOperation::NPlusOneQuery,
        DemoOperation::OverInclusion,
        DemoOperation::PagedResults,
        DemoOperation::SplitQuery,
        DemoOperation::StringAggregation,
        DemoOperation::DateFunctions,
        DemoOperation::BulkUpdate,
    ];

    /// Returns true for operations that write to the store.
    ///
    /// Re-running one of these changes the data further every time.
    pub fn is_mutating(&self) -> bool {
        matches!(self, DemoOperation::OverInclusion | DemoOperation::BulkUpdate)
    }
}

/// What the runner does once a command has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandAction {
    Control(ControlAction),
    Operation(DemoOperation),
}
