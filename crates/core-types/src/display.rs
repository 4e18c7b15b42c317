//! Human-readable labels for catalog entries.

use crate::command::Command;
use crate::error::CoreError;

/// Returns the configured label, or the command's identifier when none is set.
pub fn label_of(command: &Command) -> &str {
    command.label.as_deref().unwrap_or(command.name.as_str())
}

/// Strict variant of [`label_of`] for asserting that a catalog is fully labelled.
pub fn require_label_of(command: &Command) -> Result<&str, CoreError> {
    command
        .label
        .as_deref()
        .ok_or_else(|| CoreError::MissingLabel(command.name.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::{CommandAction, ControlAction};

    #[test]
    fn label_of_prefers_configured_label() {
        let cmd = Command::control(99, "Exit", "Leave the demo", ControlAction::Exit);
        assert_eq!(label_of(&cmd), "Leave the demo");
        assert_eq!(require_label_of(&cmd), Ok("Leave the demo"));
    }

    #[test]
    fn missing_label_is_only_an_error_in_strict_mode() {
        let cmd = Command::new(1, "ListCommands", CommandAction::Control(ControlAction::ListCommands));
        assert_eq!(label_of(&cmd), "ListCommands");
        assert_eq!(
            require_label_of(&cmd),
            Err(CoreError::MissingLabel("ListCommands".to_string()))
        );
    }
}
