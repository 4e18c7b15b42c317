use crate::demo::DemoEngine;
use crate::error::EngineError;
use core_types::{CommandAction, CommandCatalog, ControlAction};
use std::io::{BufRead, Write};

pub const LISTING_HEADER: &str = "The following commands are available to demo";
pub const PROMPT: &str = "Please Enter Requested Command?";
pub const INVALID_COMMAND: &str =
    "Invalid command entered. Enter 1 to list all commands, 99 to exit";

/// Where the dispatch loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunnerState {
    Listing,
    AwaitingInput,
    Dispatching(CommandAction),
    Exiting,
}

/// The interactive command loop.
///
/// Lists the catalog, then repeatedly reads one line, resolves it and runs
/// the matching control action or demo operation until Exit is chosen or the
/// input ends. Exactly one operation runs at a time.
pub struct DemoRunner<E> {
    engine: E,
    catalog: CommandCatalog,
}

impl<E: DemoEngine> DemoRunner<E> {
    pub fn new(engine: E, catalog: CommandCatalog) -> Self {
        Self { engine, catalog }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Runs the loop until exit.
    ///
    /// A failing operation ends the loop and its error is returned untouched;
    /// only unresolvable input is handled here.
    pub async fn run<R: BufRead, W: Write>(&self, mut input: R, mut output: W) -> Result<(), EngineError> {
        let mut exit_requested = false;
        let mut state = RunnerState::Listing;

        while !exit_requested {
            state = match state {
                RunnerState::Listing => {
                    self.write_listing(&mut output)?;
                    RunnerState::AwaitingInput
                }
                RunnerState::AwaitingInput => {
                    writeln!(output, "{PROMPT}")?;
                    output.flush()?;

                    // Bytes, not `read_line`: a line that is not UTF-8 must still
                    // come back as invalid input rather than an I/O error.
                    let mut raw = Vec::new();
                    if input.read_until(b'\n', &mut raw)? == 0 {
                        tracing::debug!("Input closed, leaving the demo loop");
                        RunnerState::Exiting
                    } else {
                        let line = String::from_utf8_lossy(&raw);
                        if line.trim().is_empty() {
                            RunnerState::AwaitingInput
                        } else {
                            match self.catalog.resolve(&line) {
                                Ok(command) => RunnerState::Dispatching(command.action),
                                Err(_) => {
                                    writeln!(output, "{INVALID_COMMAND}")?;
                                    RunnerState::AwaitingInput
                                }
                            }
                        }
                    }
                }
                RunnerState::Dispatching(CommandAction::Control(ControlAction::ListCommands)) => {
                    RunnerState::Listing
                }
                RunnerState::Dispatching(CommandAction::Control(ControlAction::Exit)) => {
                    RunnerState::Exiting
                }
                RunnerState::Dispatching(CommandAction::Operation(operation)) => {
                    tracing::info!(?operation, "Running demo");
                    self.engine.run(operation).await?;
                    RunnerState::AwaitingInput
                }
                RunnerState::Exiting => {
                    exit_requested = true;
                    RunnerState::Exiting
                }
            };
        }

        output.flush()?;
        Ok(())
    }

    fn write_listing<W: Write>(&self, output: &mut W) -> Result<(), EngineError> {
        writeln!(output, "{LISTING_HEADER}")?;
        for line in self.catalog.listing() {
            writeln!(output, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use core_types::demo_catalog;
    use std::io::Cursor;

    /// Fails the test if any operation is dispatched.
    struct NoOperations;

    #[async_trait]
    impl DemoEngine for NoOperations {
        async fn demo_change_tracking(&self) -> Result<(), EngineError> {
            unreachable!()
        }
        async fn demo_multi_query_execution(&self) -> Result<(), EngineError> {
            unreachable!()
        }
        async fn demo_projections(&self) -> Result<(), EngineError> {
            unreachable!()
        }
        async fn demo_over_inclusion(&self) -> Result<(), EngineError> {
            unreachable!()
        }
        async fn demo_paged_results(&self) -> Result<(), EngineError> {
            unreachable!()
        }
        async fn demo_split_query(&self) -> Result<(), EngineError> {
            unreachable!()
        }
        async fn demo_string_aggregation(&self) -> Result<(), EngineError> {
            unreachable!()
        }
        async fn demo_date_functions(&self) -> Result<(), EngineError> {
            unreachable!()
        }
        async fn demo_bulk_update(&self) -> Result<(), EngineError> {
            unreachable!()
        }
    }

    async fn transcript(input: &str) -> String {
        let runner = DemoRunner::new(NoOperations, demo_catalog());
        let mut output = Vec::new();
        runner.run(Cursor::new(input), &mut output).await.unwrap();
        String::from_utf8(output).unwrap()
    }

    #[tokio::test]
    async fn blank_lines_reprompt_silently() {
        let out = transcript("\n   \n99\n").await;
        assert_eq!(out.matches(PROMPT).count(), 3);
        assert!(!out.contains(INVALID_COMMAND));
    }

    #[tokio::test]
    async fn end_of_input_ends_the_loop() {
        let out = transcript("").await;
        assert_eq!(out.matches(LISTING_HEADER).count(), 1);
        assert_eq!(out.matches(PROMPT).count(), 1);
    }

    #[tokio::test]
    async fn listing_lines_follow_the_header() {
        let out = transcript("99\n").await;
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines[0], LISTING_HEADER);
        assert_eq!(lines[1], "1 - List Commands");
        assert_eq!(lines[11], "99 - Exit");
        assert_eq!(lines[12], PROMPT);
        assert_eq!(lines.len(), 13);
    }
}
