use crate::error::EngineError;
use async_trait::async_trait;
use chrono::{Months, NaiveDateTime, Utc};
use configuration::DemoSettings;
use core_types::DemoOperation;
use database::{CustomerGraph, DbRepository};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::info;

/// The set of illustrative data-access scenarios.
///
/// Every operation takes no arguments, runs to completion and reports what it
/// observed through the log. Nothing is returned to the caller except failure.
#[async_trait]
pub trait DemoEngine: Send + Sync {
    /// Times the same read with and without change tracking.
    async fn demo_change_tracking(&self) -> Result<(), EngineError>;

    /// Filters on a relation that was never loaded, forcing one lazy query per row.
    async fn demo_multi_query_execution(&self) -> Result<(), EngineError>;

    /// Times a full entity graph against a narrowed projection.
    async fn demo_projections(&self) -> Result<(), EngineError>;

    /// Updates one column twice, the second time dragging in a collection it never uses.
    async fn demo_over_inclusion(&self) -> Result<(), EngineError>;

    async fn demo_paged_results(&self) -> Result<(), EngineError>;

    /// Times one combined join against one query per collection.
    async fn demo_split_query(&self) -> Result<(), EngineError>;

    async fn demo_string_aggregation(&self) -> Result<(), EngineError>;

    /// Client-computed vs. database-computed date filters and functions.
    async fn demo_date_functions(&self) -> Result<(), EngineError>;

    /// One set-based update across every matching row.
    async fn demo_bulk_update(&self) -> Result<(), EngineError>;

    /// Dispatches an operation to its method.
    async fn run(&self, operation: DemoOperation) -> Result<(), EngineError> {
        match operation {
            DemoOperation::ChangeTracking => self.demo_change_tracking().await,
            DemoOperation::Projections => self.demo_projections().await,
            DemoOperation::NPlusOneQuery => self.demo_multi_query_execution().await,
            DemoOperation::OverInclusion => self.demo_over_inclusion().await,
            DemoOperation::PagedResults => self.demo_paged_results().await,
            DemoOperation::SplitQuery => self.demo_split_query().await,
            DemoOperation::StringAggregation => self.demo_string_aggregation().await,
            DemoOperation::DateFunctions => self.demo_date_functions().await,
            DemoOperation::BulkUpdate => self.demo_bulk_update().await,
        }
    }
}

/// Awaits `future` and measures its wall-clock duration.
async fn timed<F: Future>(future: F) -> (F::Output, Duration) {
    let started = Instant::now();
    let output = future.await;
    (output, started.elapsed())
}

/// `now` shifted by whole years; falls back to `now` only on calendar overflow.
fn shift_years(now: NaiveDateTime, years: i32) -> NaiveDateTime {
    let months = Months::new(years.unsigned_abs() * 12);
    let shifted = if years >= 0 {
        now.checked_add_months(months)
    } else {
        now.checked_sub_months(months)
    };
    shifted.unwrap_or(now)
}

/// Runs the demos against PostgreSQL through [`DbRepository`].
pub struct SqlDemoEngine {
    repo: DbRepository,
    settings: DemoSettings,
}

impl SqlDemoEngine {
    pub fn new(repo: DbRepository, settings: DemoSettings) -> Self {
        Self { repo, settings }
    }
}

#[async_trait]
impl DemoEngine for SqlDemoEngine {
    async fn demo_change_tracking(&self) -> Result<(), EngineError> {
        let (tracked, tracked_elapsed) = timed(self.repo.tracked_customer_graphs()).await;
        let tracked = tracked?;
        let (untracked, untracked_elapsed) = timed(self.repo.customer_graphs()).await;
        let untracked = untracked?;

        info!(elapsed = ?tracked_elapsed, "Query with Tracking Execution");
        info!(count = tracked.len(), "Query with Tracking Count");
        info!(elapsed = ?untracked_elapsed, "Query W/o Tracking Execution");
        info!(count = untracked.len(), "Query W/o Tracking Count");
        Ok(())
    }

    async fn demo_multi_query_execution(&self) -> Result<(), EngineError> {
        let store_name = self.settings.store_name_filter.as_str();
        let started = Instant::now();
        let customers = self.repo.customers_with_person().await?;

        // The store was not part of the query, so filtering on it in memory
        // loads it separately for every customer.
        let mut lazy_loads = 0usize;
        let mut matches: Vec<CustomerGraph> = Vec::new();
        for graph in customers {
            let Some(store_id) = graph.customer.store_id else {
                continue;
            };
            lazy_loads += 1;
            let store = self.repo.store_by_id(store_id).await?;
            if store.as_ref().is_some_and(|s| s.name == store_name) {
                matches.push(CustomerGraph { store, ..graph });
            }
        }
        let in_memory_elapsed = started.elapsed();

        let (filtered, store_elapsed) = timed(self.repo.customer_graphs_for_store(store_name)).await;
        let filtered = filtered?;

        info!(elapsed = ?in_memory_elapsed, lazy_loads, count = matches.len(), store = store_name, "In-memory filter with lazy loading");
        info!(elapsed = ?store_elapsed, count = filtered.len(), store = store_name, "Database-side filter");
        Ok(())
    }

    async fn demo_projections(&self) -> Result<(), EngineError> {
        let (full, full_elapsed) = timed(self.repo.tracked_customer_graphs()).await;
        let full = full?;
        let (projected, projected_elapsed) = timed(self.repo.customer_list_items()).await;
        let projected = projected?;

        info!(elapsed = ?full_elapsed, "Full Query Execution");
        info!(count = full.len(), "Full items Count");
        info!(elapsed = ?projected_elapsed, "Projection Query Execution");
        info!(count = projected.len(), "Projection Count");
        Ok(())
    }

    async fn demo_over_inclusion(&self) -> Result<(), EngineError> {
        let person_id = self.settings.over_inclusion_person_id;

        // Only what the write needs.
        let started = Instant::now();
        let mut person = self.repo.find_person_tracked(person_id).await?;
        person.first_name = self.settings.first_name_update.clone();
        let rows = self.repo.save_person(&mut person).await?;
        info!(elapsed = ?started.elapsed(), rows, first_name = %person.first_name, "Targeted update");

        // Same write, with an eagerly loaded collection nobody reads.
        let started = Instant::now();
        let (mut person, customers) = self.repo.find_person_with_customers_tracked(person_id).await?;
        person.first_name = self.settings.second_first_name_update.clone();
        let rows = self.repo.save_person(&mut person).await?;
        info!(
            elapsed = ?started.elapsed(),
            rows,
            included_customers = customers.len(),
            first_name = %person.first_name,
            "Update with unnecessary include"
        );
        Ok(())
    }

    async fn demo_paged_results(&self) -> Result<(), EngineError> {
        let total = self.repo.count_customers_with_territory().await?;
        let (page, elapsed) = timed(
            self.repo
                .customer_page(self.settings.page_offset, self.settings.page_size),
        )
        .await;
        let page = page?;

        info!(total, "Customers with a territory");
        info!(
            elapsed = ?elapsed,
            offset = self.settings.page_offset,
            size = self.settings.page_size,
            returned = page.len(),
            "Paged Query"
        );
        if let Some(first) = page.first() {
            let name = first
                .person
                .as_ref()
                .map(|p| format!("{} {}", p.first_name, p.last_name))
                .unwrap_or_default();
            info!(customer_id = first.customer.customer_id, %name, "First row of page");
        }
        Ok(())
    }

    async fn demo_split_query(&self) -> Result<(), EngineError> {
        let (single, single_elapsed) = timed(self.repo.person_graphs_single_query()).await;
        let (single, joined_rows) = single?;
        let (split, split_elapsed) = timed(self.repo.person_graphs_split_query()).await;
        let split = split?;

        info!(elapsed = ?single_elapsed, "Without Split Execution");
        info!(count = single.len(), joined_rows, "Without Split Count");
        info!(elapsed = ?split_elapsed, "With Split Execution");
        info!(count = split.len(), "With Split Count");
        Ok(())
    }

    async fn demo_string_aggregation(&self) -> Result<(), EngineError> {
        let groups = self
            .repo
            .account_numbers_by_first_name(&self.settings.aggregation_separator)
            .await?;

        info!(count = groups.len(), "Total Records");
        for group in groups.iter().take(self.settings.sample_size as usize) {
            info!("{} Accounts: {}", group.first_name, group.accounts);
        }
        Ok(())
    }

    async fn demo_date_functions(&self) -> Result<(), EngineError> {
        // Threshold computed here and sent as a parameter.
        let min_date = shift_years(Utc::now().naive_utc(), -1);
        let (client, client_elapsed) = timed(self.repo.customers_modified_since(min_date)).await;
        let client = client?;

        // Threshold computed by the database.
        let (server, server_elapsed) = timed(self.repo.customers_modified_within_last_year()).await;
        let server = server?;

        info!(elapsed = ?client_elapsed, count = client.len(), %min_date, "Client-computed date filter");
        info!(elapsed = ?server_elapsed, count = server.len(), "Database-computed date filter");

        let sample = self
            .repo
            .customer_modification_ages(&self.settings.time_zone, self.settings.sample_size)
            .await?;
        for row in sample {
            info!(
                "{} - Modified {} days ago - {} - {} {}",
                row.customer_id,
                row.modified_days_ago,
                row.modified_date,
                row.modified_local_time,
                self.settings.time_zone
            );
        }
        Ok(())
    }

    async fn demo_bulk_update(&self) -> Result<(), EngineError> {
        let threshold = shift_years(
            Utc::now().naive_utc(),
            self.settings.bulk_threshold_years as i32,
        );
        let (rows, elapsed) = timed(
            self.repo
                .shift_customer_modified_dates(threshold, self.settings.bulk_shift_days),
        )
        .await;
        let rows = rows?;

        info!(
            elapsed = ?elapsed,
            rows,
            days = self.settings.bulk_shift_days,
            %threshold,
            "Bulk update shifted modified dates"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap()
    }

    #[test]
    fn shift_years_moves_both_directions() {
        assert_eq!(shift_years(at(2024, 6, 15), -1), at(2023, 6, 15));
        assert_eq!(shift_years(at(2024, 6, 15), 4), at(2028, 6, 15));
        assert_eq!(shift_years(at(2024, 6, 15), 0), at(2024, 6, 15));
    }

    #[test]
    fn shift_years_clamps_leap_day() {
        assert_eq!(shift_years(at(2024, 2, 29), -1), at(2023, 2, 28));
    }
}
