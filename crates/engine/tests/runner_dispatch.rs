use async_trait::async_trait;
use core_types::{Command, CommandCatalog, ControlAction, DemoOperation, demo_catalog};
use database::DbError;
use engine::{DemoEngine, DemoRunner, EngineError, INVALID_COMMAND, LISTING_HEADER, PROMPT};
use std::io::Cursor;
use std::sync::Mutex;

/// Records every dispatched operation instead of touching a database.
#[derive(Default)]
struct RecordingEngine {
    calls: Mutex<Vec<DemoOperation>>,
    fail_on: Option<DemoOperation>,
}

impl RecordingEngine {
    fn failing_on(operation: DemoOperation) -> Self {
        Self {
            fail_on: Some(operation),
            ..Self::default()
        }
    }

    fn record(&self, operation: DemoOperation) -> Result<(), EngineError> {
        self.calls.lock().unwrap().push(operation);
        if self.fail_on == Some(operation) {
            return Err(EngineError::from(DbError::NotFound));
        }
        Ok(())
    }

    fn calls(&self) -> Vec<DemoOperation> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DemoEngine for RecordingEngine {
    async fn demo_change_tracking(&self) -> Result<(), EngineError> {
        self.record(DemoOperation::ChangeTracking)
    }
    async fn demo_multi_query_execution(&self) -> Result<(), EngineError> {
        self.record(DemoOperation::NPlusOneQuery)
    }
    async fn demo_projections(&self) -> Result<(), EngineError> {
        self.record(DemoOperation::Projections)
    }
    async fn demo_over_inclusion(&self) -> Result<(), EngineError> {
        self.record(DemoOperation::OverInclusion)
    }
    async fn demo_paged_results(&self) -> Result<(), EngineError> {
        self.record(DemoOperation::PagedResults)
    }
    async fn demo_split_query(&self) -> Result<(), EngineError> {
        self.record(DemoOperation::SplitQuery)
    }
    async fn demo_string_aggregation(&self) -> Result<(), EngineError> {
        self.record(DemoOperation::StringAggregation)
    }
    async fn demo_date_functions(&self) -> Result<(), EngineError> {
        self.record(DemoOperation::DateFunctions)
    }
    async fn demo_bulk_update(&self) -> Result<(), EngineError> {
        self.record(DemoOperation::BulkUpdate)
    }
}

async fn drive(
    catalog: CommandCatalog,
    engine: RecordingEngine,
    lines: &[&str],
) -> (Result<(), EngineError>, String, Vec<DemoOperation>) {
    let input = lines.iter().map(|line| format!("{line}\n")).collect::<String>();
    drive_bytes(catalog, engine, input.as_bytes()).await
}

async fn drive_bytes(
    catalog: CommandCatalog,
    engine: RecordingEngine,
    input: &[u8],
) -> (Result<(), EngineError>, String, Vec<DemoOperation>) {
    let runner = DemoRunner::new(engine, catalog);
    let mut output = Vec::new();
    let result = runner.run(Cursor::new(input), &mut output).await;
    let calls = runner.engine().calls();
    (result, String::from_utf8(output).unwrap(), calls)
}

#[tokio::test]
async fn list_then_exit_relists_once_and_runs_nothing() {
    let (result, out, calls) = drive(demo_catalog(), RecordingEngine::default(), &["1", "99"]).await;

    assert!(result.is_ok());
    // The initial listing plus exactly one re-listing.
    assert_eq!(out.matches(LISTING_HEADER).count(), 2);
    assert_eq!(out.matches(PROMPT).count(), 2);
    assert!(calls.is_empty());
}

#[tokio::test]
async fn invalid_input_is_reported_once_before_listing() {
    let (result, out, calls) = drive(demo_catalog(), RecordingEngine::default(), &["abc", "1"]).await;

    assert!(result.is_ok());
    assert_eq!(out.matches(INVALID_COMMAND).count(), 1);
    let invalid_at = out.find(INVALID_COMMAND).unwrap();
    let relisted_at = out.rfind(LISTING_HEADER).unwrap();
    assert!(invalid_at < relisted_at);
    assert_eq!(out.matches(LISTING_HEADER).count(), 2);
    assert!(calls.is_empty());
}

#[tokio::test]
async fn non_utf8_line_is_invalid_input_not_a_failure() {
    let (result, out, calls) =
        drive_bytes(demo_catalog(), RecordingEngine::default(), b"\xff\xfe\n99\n").await;

    assert!(result.is_ok());
    assert_eq!(out.matches(INVALID_COMMAND).count(), 1);
    // Prompted again after the garbled line, then Exit was read.
    assert_eq!(out.matches(PROMPT).count(), 2);
    assert!(calls.is_empty());
}

#[tokio::test]
async fn unknown_code_is_invalid_input() {
    let (_, out, calls) = drive(demo_catalog(), RecordingEngine::default(), &["42", "99"]).await;
    assert_eq!(out.matches(INVALID_COMMAND).count(), 1);
    assert!(calls.is_empty());
}

#[tokio::test]
async fn mutating_operation_runs_every_time_it_is_chosen() {
    let (result, _, calls) = drive(demo_catalog(), RecordingEngine::default(), &["10", "10", "99"]).await;

    assert!(result.is_ok());
    assert_eq!(calls, vec![DemoOperation::BulkUpdate, DemoOperation::BulkUpdate]);
}

#[tokio::test]
async fn every_default_code_reaches_its_operation() {
    let codes = ["2", "3", "4", "5", "6", "7", "8", "9", "10", "99"];
    let (result, _, calls) = drive(demo_catalog(), RecordingEngine::default(), &codes).await;

    assert!(result.is_ok());
    assert_eq!(
        calls,
        vec![
            DemoOperation::ChangeTracking,
            DemoOperation::Projections,
            DemoOperation::NPlusOneQuery,
            DemoOperation::OverInclusion,
            DemoOperation::PagedResults,
            DemoOperation::SplitQuery,
            DemoOperation::StringAggregation,
            DemoOperation::DateFunctions,
            DemoOperation::BulkUpdate,
        ]
    );
}

#[tokio::test]
async fn widget_catalog_runs_twice_then_stops_prompting() {
    let catalog = CommandCatalog::new(vec![
        Command::control(1, "ListCommands", "List Commands", ControlAction::ListCommands),
        Command::operation(2, "WidgetDemo", "Widget Demo", DemoOperation::PagedResults),
        Command::control(99, "Exit", "Exit", ControlAction::Exit),
    ])
    .unwrap();

    let (result, out, calls) = drive(catalog, RecordingEngine::default(), &["2", "2", "99", "2"]).await;

    assert!(result.is_ok());
    assert_eq!(calls, vec![DemoOperation::PagedResults, DemoOperation::PagedResults]);
    assert!(out.contains("2 - Widget Demo"));
    // One prompt per line read up to and including Exit; the trailing "2" is never read.
    assert_eq!(out.matches(PROMPT).count(), 3);
    assert!(out.trim_end().ends_with(PROMPT));
}

#[tokio::test]
async fn listing_follows_declaration_order() {
    let catalog = CommandCatalog::new(vec![
        Command::operation(5, "Five", "Five", DemoOperation::SplitQuery),
        Command::operation(1, "One", "One", DemoOperation::PagedResults),
        Command::control(3, "Three", "Three", ControlAction::Exit),
    ])
    .unwrap();

    let (_, out, _) = drive(catalog, RecordingEngine::default(), &["3"]).await;
    let listed: Vec<_> = out.lines().skip(1).take(3).collect();
    assert_eq!(listed, vec!["5 - Five", "1 - One", "3 - Three"]);
}

#[tokio::test]
async fn operation_failure_propagates_and_stops_the_loop() {
    let engine = RecordingEngine::failing_on(DemoOperation::OverInclusion);
    let (result, out, calls) = drive(demo_catalog(), engine, &["5", "2", "99"]).await;

    assert!(matches!(result, Err(EngineError::Unknown(DbError::NotFound))));
    assert_eq!(calls, vec![DemoOperation::OverInclusion]);
    assert_eq!(out.matches(PROMPT).count(), 1);
}
