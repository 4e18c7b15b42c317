use crate::command::Command;
use crate::display::require_label_of;
use crate::enums::{ControlAction, DemoOperation};
use crate::error::CoreError;
use std::collections::HashSet;

/// The ordered, immutable set of commands the runner understands.
///
/// Listing order is declaration order. It is never re-sorted, even when the
/// codes happen to be declared out of numeric order.
#[derive(Debug, Clone)]
pub struct CommandCatalog {
    commands: Vec<Command>,
}

impl CommandCatalog {
    /// Builds a catalog, rejecting any code declared twice.
    pub fn new(commands: Vec<Command>) -> Result<Self, CoreError> {
        let mut seen = HashSet::with_capacity(commands.len());
        for command in &commands {
            if !seen.insert(command.code) {
                return Err(CoreError::DuplicateCode(command.code));
            }
        }
        Ok(Self { commands })
    }

    /// All commands in declaration order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// One `"{code} - {label}"` line per command, in declaration order.
    pub fn listing(&self) -> Vec<String> {
        self.commands.iter().map(Command::to_string).collect()
    }

    /// Resolves raw user input to a command by its numeric code.
    ///
    /// Surrounding whitespace is ignored. Anything that is not an integer, or an
    /// integer that matches no code, is `NotFound`.
    pub fn resolve(&self, raw: &str) -> Result<&Command, CoreError> {
        let not_found = || CoreError::NotFound(raw.to_string());
        let code: i32 = raw.trim().parse().map_err(|_| not_found())?;
        self.commands
            .iter()
            .find(|command| command.code == code)
            .ok_or_else(not_found)
    }

    /// Asserts that every command carries a display label.
    pub fn require_labels(&self) -> Result<(), CoreError> {
        for command in &self.commands {
            require_label_of(command)?;
        }
        Ok(())
    }
}

/// The catalog shipped with the harness.
pub fn demo_catalog() -> CommandCatalog {
    CommandCatalog::new(vec![
        Command::control(1, "ListCommands", "List Commands", ControlAction::ListCommands),
        Command::operation(2, "ChangeTracking", "Change Tracking", DemoOperation::ChangeTracking),
        Command::operation(3, "Projections", "Projections", DemoOperation::Projections),
        Command::operation(4, "NPlusQuery", "N+1 Queries", DemoOperation::NPlusOneQuery),
        Command::operation(5, "OverInclusions", "Over Inclusions", DemoOperation::OverInclusion),
        Command::operation(6, "PagedResults", "Paged Results", DemoOperation::PagedResults),
        Command::operation(7, "SplitQuery", "Split Query Example", DemoOperation::SplitQuery),
        Command::operation(8, "StringAggregation", "String Aggregation", DemoOperation::StringAggregation),
        Command::operation(9, "DateFunctions", "Date Functions", DemoOperation::DateFunctions),
        Command::operation(10, "BulkUpdates", "Bulk Updates", DemoOperation::BulkUpdate),
        Command::control(99, "Exit", "Exit", ControlAction::Exit),
    ])
    .expect("demo catalog declares each code once")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::CommandAction;

    fn op(code: i32, name: &str) -> Command {
        Command::new(code, name, CommandAction::Operation(DemoOperation::PagedResults))
    }

    #[test]
    fn resolves_every_declared_code() {
        let catalog = demo_catalog();
        for command in catalog.commands() {
            let resolved = catalog.resolve(&command.code.to_string()).unwrap();
            assert_eq!(resolved, command);
        }
    }

    #[test]
    fn resolve_ignores_surrounding_whitespace() {
        let catalog = demo_catalog();
        assert_eq!(catalog.resolve(" 99\r\n").unwrap().name, "Exit");
    }

    #[test]
    fn unknown_or_non_numeric_input_is_not_found() {
        let catalog = demo_catalog();
        for raw in ["abc", "", "11", "-1", "2.5", "Exit", "ListCommands", "1 2"] {
            assert_eq!(
                catalog.resolve(raw),
                Err(CoreError::NotFound(raw.to_string())),
                "input {raw:?} should not resolve"
            );
        }
    }

    #[test]
    fn listing_keeps_declaration_order() {
        let catalog = CommandCatalog::new(vec![op(5, "Five"), op(1, "One"), op(3, "Three")]).unwrap();
        let expected = vec!["5 - Five", "1 - One", "3 - Three"];
        assert_eq!(catalog.listing(), expected);
        assert_eq!(catalog.listing(), expected);
    }

    #[test]
    fn duplicate_codes_are_rejected() {
        let result = CommandCatalog::new(vec![op(1, "One"), op(1, "Uno")]);
        assert_eq!(result.unwrap_err(), CoreError::DuplicateCode(1));
    }

    #[test]
    fn demo_catalog_codes_are_unique() {
        let commands = demo_catalog().commands().to_vec();
        assert_eq!(commands.len(), 11);
        assert!(CommandCatalog::new(commands).is_ok());
    }

    #[test]
    fn demo_catalog_is_fully_labelled() {
        let catalog = demo_catalog();
        assert!(catalog.require_labels().is_ok());
        assert_eq!(catalog.listing().first().map(String::as_str), Some("1 - List Commands"));
        assert_eq!(catalog.listing().last().map(String::as_str), Some("99 - Exit"));
    }

    #[test]
    fn require_labels_reports_the_unlabelled_command() {
        let catalog = CommandCatalog::new(vec![op(4, "Unlabelled")]).unwrap();
        assert_eq!(
            catalog.require_labels(),
            Err(CoreError::MissingLabel("Unlabelled".to_string()))
        );
    }

    #[test]
    fn every_operation_has_exactly_one_command() {
        let catalog = demo_catalog();
        for operation in DemoOperation::ALL {
            let count = catalog
                .commands()
                .iter()
                .filter(|c| c.action == CommandAction::Operation(operation))
                .count();
            assert_eq!(count, 1, "{operation:?}");
        }
    }
}
