use std::fmt;

use crate::enums::{CommandAction, ControlAction, DemoOperation};

/// A single entry in the command catalog.
///
/// The display label is carried as plain data. When it is absent the
/// identifier `name` is shown instead (see [`crate::display::label_of`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub code: i32,
    pub name: String,
    pub label: Option<String>,
    pub action: CommandAction,
}

impl Command {
    /// Creates a command without a display label.
    pub fn new(code: i32, name: impl Into<String>, action: CommandAction) -> Self {
        Self {
            code,
            name: name.into(),
            label: None,
            action,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Shorthand for a labelled control command.
    pub fn control(code: i32, name: &str, label: &str, action: ControlAction) -> Self {
        Self::new(code, name, CommandAction::Control(action)).with_label(label)
    }

    /// Shorthand for a labelled demo operation command.
    pub fn operation(code: i32, name: &str, label: &str, operation: DemoOperation) -> Self {
        Self::new(code, name, CommandAction::Operation(operation)).with_label(label)
    }
}

/// Renders the catalog listing line, e.g. `2 - Change Tracking`.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.code, crate::display::label_of(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_label_when_present() {
        let cmd = Command::operation(2, "ChangeTracking", "Change Tracking", DemoOperation::ChangeTracking);
        assert_eq!(cmd.to_string(), "2 - Change Tracking");
    }

    #[test]
    fn display_falls_back_to_identifier() {
        let cmd = Command::new(7, "SplitQuery", CommandAction::Operation(DemoOperation::SplitQuery));
        assert_eq!(cmd.to_string(), "7 - SplitQuery");
    }

    #[test]
    fn only_over_inclusion_and_bulk_update_mutate() {
        let mutating: Vec<_> = DemoOperation::ALL.iter().filter(|op| op.is_mutating()).collect();
        assert_eq!(mutating, vec![&DemoOperation::OverInclusion, &DemoOperation::BulkUpdate]);
    }
}
