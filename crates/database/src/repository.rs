use crate::DbError;
use crate::models::{
    AccountAggregate, BusinessEntityContact, Customer, CustomerGraph, CustomerListItem,
    CustomerModificationAge, EmailAddress, Person, PersonGraph, Store,
};
use crate::tracking::{ChangeTracker, PersonColumn, Tracked};
use chrono::NaiveDateTime;
use sqlx::postgres::{PgPool, PgRow, Postgres};
use sqlx::{QueryBuilder, Row};
use std::collections::HashMap;

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

const CUSTOMER_COLUMNS: &str = "c.customer_id, c.person_id, c.store_id, c.territory_id, \
     c.account_number, c.rowguid, c.modified_date";

const STORE_COLUMNS: &str = "s.business_entity_id AS store_business_entity_id, \
     s.name AS store_name, s.sales_person_id AS store_sales_person_id, \
     s.modified_date AS store_modified_date";

const PERSON_COLUMNS: &str = "p.business_entity_id AS person_business_entity_id, \
     p.person_type AS person_person_type, p.title AS person_title, \
     p.first_name AS person_first_name, p.middle_name AS person_middle_name, \
     p.last_name AS person_last_name, p.modified_date AS person_modified_date";

/// Which relations a customer query joined in.
#[derive(Debug, Clone, Copy)]
struct Includes {
    store: bool,
    person: bool,
}

fn customer_graph_from_row(row: &PgRow, includes: Includes) -> Result<CustomerGraph, sqlx::Error> {
    let customer = Customer::from_prefixed_row(row, "")?
        .ok_or_else(|| sqlx::Error::ColumnNotFound("customer_id".to_string()))?;
    let store = if includes.store {
        Store::from_prefixed_row(row, "store_")?
    } else {
        None
    };
    let person = if includes.person {
        Person::from_prefixed_row(row, "person_")?
    } else {
        None
    };
    Ok(CustomerGraph { customer, store, person })
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==========================================================================
    // Customer graphs
    // ==========================================================================

    /// Every customer with its store and person eagerly loaded.
    pub async fn customer_graphs(&self) -> Result<Vec<CustomerGraph>, DbError> {
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS}, {STORE_COLUMNS}, {PERSON_COLUMNS} \
             FROM sales.customer AS c \
             LEFT JOIN sales.store AS s ON s.business_entity_id = c.store_id \
             LEFT JOIN person.person AS p ON p.business_entity_id = c.person_id"
        );
        let includes = Includes { store: true, person: true };
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        let graphs = rows
            .iter()
            .map(|row| customer_graph_from_row(row, includes))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(graphs)
    }

    /// Same rows as [`Self::customer_graphs`], attached to a change tracker.
    pub async fn tracked_customer_graphs(&self) -> Result<ChangeTracker<i32, CustomerGraph>, DbError> {
        let mut tracker = ChangeTracker::new();
        for graph in self.customer_graphs().await? {
            tracker.attach(graph.customer.customer_id, graph);
        }
        Ok(tracker)
    }

    /// Every customer with only its person loaded; `store` is left empty.
    pub async fn customers_with_person(&self) -> Result<Vec<CustomerGraph>, DbError> {
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS}, {PERSON_COLUMNS} \
             FROM sales.customer AS c \
             LEFT JOIN person.person AS p ON p.business_entity_id = c.person_id"
        );
        let includes = Includes { store: false, person: true };
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        let graphs = rows
            .iter()
            .map(|row| customer_graph_from_row(row, includes))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(graphs)
    }

    /// Loads a single store on demand.
    pub async fn store_by_id(&self, business_entity_id: i32) -> Result<Option<Store>, DbError> {
        let store = sqlx::query_as::<_, Store>(
            "SELECT business_entity_id, name, sales_person_id, modified_date \
             FROM sales.store WHERE business_entity_id = $1",
        )
        .bind(business_entity_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(store)
    }

    /// Customers of the named store, filtered by the database.
    pub async fn customer_graphs_for_store(&self, store_name: &str) -> Result<Vec<CustomerGraph>, DbError> {
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS}, {STORE_COLUMNS}, {PERSON_COLUMNS} \
             FROM sales.customer AS c \
             JOIN sales.store AS s ON s.business_entity_id = c.store_id \
             LEFT JOIN person.person AS p ON p.business_entity_id = c.person_id \
             WHERE s.name = $1"
        );
        let includes = Includes { store: true, person: true };
        let rows = sqlx::query(&sql).bind(store_name).fetch_all(&self.pool).await?;
        let graphs = rows
            .iter()
            .map(|row| customer_graph_from_row(row, includes))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(graphs)
    }

    /// The narrowed customer listing: only the columns a list view shows.
    pub async fn customer_list_items(&self) -> Result<Vec<CustomerListItem>, DbError> {
        let items = sqlx::query_as::<_, CustomerListItem>(
            r#"
            SELECT
                c.customer_id,
                c.account_number,
                p.first_name AS contact_first_name,
                p.last_name AS contact_last_name,
                p.title AS contact_title,
                s.name AS store_name
            FROM sales.customer AS c
            LEFT JOIN person.person AS p ON p.business_entity_id = c.person_id
            LEFT JOIN sales.store AS s ON s.business_entity_id = c.store_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    // ==========================================================================
    // People
    // ==========================================================================

    /// Loads one person into a tracked working copy.
    pub async fn find_person_tracked(&self, business_entity_id: i32) -> Result<Tracked<Person>, DbError> {
        let person = sqlx::query_as::<_, Person>(
            "SELECT business_entity_id, person_type, title, first_name, middle_name, last_name, modified_date \
             FROM person.person WHERE business_entity_id = $1",
        )
        .bind(business_entity_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(Tracked::new(person))
    }

    /// Loads one person and eagerly loads their customers collection as well.
    pub async fn find_person_with_customers_tracked(
        &self,
        business_entity_id: i32,
    ) -> Result<(Tracked<Person>, Vec<Customer>), DbError> {
        let person = self.find_person_tracked(business_entity_id).await?;
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM sales.customer AS c \
             WHERE c.person_id = $1 ORDER BY c.customer_id"
        ))
        .bind(business_entity_id)
        .fetch_all(&self.pool)
        .await?;
        Ok((person, customers))
    }

    /// Persists the changed columns of a tracked person.
    ///
    /// Returns the number of rows written; an unmodified person issues no SQL.
    pub async fn save_person(&self, person: &mut Tracked<Person>) -> Result<u64, DbError> {
        let changes = person.changes();
        if changes.is_empty() {
            return Ok(0);
        }

        let mut builder = QueryBuilder::<Postgres>::new("UPDATE person.person SET ");
        {
            let mut set = builder.separated(", ");
            for column in &changes {
                match column {
                    PersonColumn::PersonType => {
                        set.push("person_type = ").push_bind_unseparated(person.person_type.clone());
                    }
                    PersonColumn::Title => {
                        set.push("title = ").push_bind_unseparated(person.title.clone());
                    }
                    PersonColumn::FirstName => {
                        set.push("first_name = ").push_bind_unseparated(person.first_name.clone());
                    }
                    PersonColumn::MiddleName => {
                        set.push("middle_name = ").push_bind_unseparated(person.middle_name.clone());
                    }
                    PersonColumn::LastName => {
                        set.push("last_name = ").push_bind_unseparated(person.last_name.clone());
                    }
                    PersonColumn::ModifiedDate => {
                        set.push("modified_date = ").push_bind_unseparated(person.modified_date);
                    }
                }
            }
        }
        builder
            .push(" WHERE business_entity_id = ")
            .push_bind(person.business_entity_id);

        let result = builder.build().execute(&self.pool).await?;
        tracing::debug!(?changes, rows = result.rows_affected(), "Saved person changes");
        person.accept_changes();
        Ok(result.rows_affected())
    }

    // ==========================================================================
    // Paging
    // ==========================================================================

    /// Number of customers assigned to a sales territory.
    pub async fn count_customers_with_territory(&self) -> Result<i64, DbError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sales.customer WHERE territory_id IS NOT NULL",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    /// One page of territory customers ordered by contact name.
    ///
    /// The statement is tagged with a comment naming the query and its call
    /// site so it can be picked out of the server's statement log.
    pub async fn customer_page(&self, offset: i64, limit: i64) -> Result<Vec<CustomerGraph>, DbError> {
        let sql = format!(
            "-- Paged Query\n-- {}:{}\n\
             SELECT {CUSTOMER_COLUMNS}, {PERSON_COLUMNS} \
             FROM sales.customer AS c \
             LEFT JOIN person.person AS p ON p.business_entity_id = c.person_id \
             WHERE c.territory_id IS NOT NULL \
             ORDER BY p.first_name, p.last_name, c.customer_id \
             OFFSET $1 LIMIT $2",
            file!(),
            line!()
        );
        let includes = Includes { store: false, person: true };
        let rows = sqlx::query(&sql)
            .bind(offset)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        let page = rows
            .iter()
            .map(|row| customer_graph_from_row(row, includes))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(page)
    }

    // ==========================================================================
    // Split queries
    // ==========================================================================

    /// People with emails, contacts and customers in one joined statement.
    ///
    /// Returns the folded graphs and the number of raw rows the join produced,
    /// which grows with the product of the three collection sizes.
    pub async fn person_graphs_single_query(&self) -> Result<(Vec<PersonGraph>, usize), DbError> {
        let sql = format!(
            "SELECT {PERSON_COLUMNS}, \
                 e.email_address_id AS email_email_address_id, e.email_address AS email_email_address, \
                 bec.business_entity_id AS contact_business_entity_id, bec.contact_type_id AS contact_contact_type_id, \
                 c.customer_id AS customer_customer_id, c.person_id AS customer_person_id, \
                 c.store_id AS customer_store_id, c.territory_id AS customer_territory_id, \
                 c.account_number AS customer_account_number, c.rowguid AS customer_rowguid, \
                 c.modified_date AS customer_modified_date \
             FROM person.person AS p \
             LEFT JOIN person.email_address AS e ON e.business_entity_id = p.business_entity_id \
             LEFT JOIN person.business_entity_contact AS bec ON bec.person_id = p.business_entity_id \
             LEFT JOIN sales.customer AS c ON c.person_id = p.business_entity_id \
             ORDER BY p.business_entity_id"
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        let row_count = rows.len();

        let mut graphs: Vec<PersonGraph> = Vec::new();
        let mut positions: HashMap<i32, usize> = HashMap::new();
        for row in &rows {
            let Some(person) = Person::from_prefixed_row(row, "person_")? else {
                continue;
            };
            let person_id = person.business_entity_id;
            let position = *positions.entry(person_id).or_insert_with(|| {
                graphs.push(PersonGraph::new(person));
                graphs.len() - 1
            });
            let graph = &mut graphs[position];

            if let Some(email_address_id) = row.try_get::<Option<i32>, _>("email_email_address_id")? {
                if !graph.email_addresses.iter().any(|e| e.email_address_id == email_address_id) {
                    graph.email_addresses.push(EmailAddress {
                        business_entity_id: person_id,
                        email_address_id,
                        email_address: row.try_get("email_email_address")?,
                    });
                }
            }

            if let Some(business_entity_id) = row.try_get::<Option<i32>, _>("contact_business_entity_id")? {
                let contact = BusinessEntityContact {
                    business_entity_id,
                    person_id,
                    contact_type_id: row.try_get("contact_contact_type_id")?,
                };
                if !graph.contacts.contains(&contact) {
                    graph.contacts.push(contact);
                }
            }

            if let Some(customer) = Customer::from_prefixed_row(row, "customer_")? {
                if !graph.customers.iter().any(|c| c.customer_id == customer.customer_id) {
                    graph.customers.push(customer);
                }
            }
        }

        Ok((graphs, row_count))
    }

    /// The same graphs as [`Self::person_graphs_single_query`], loaded with one
    /// statement per collection and stitched together in memory.
    pub async fn person_graphs_split_query(&self) -> Result<Vec<PersonGraph>, DbError> {
        let people = sqlx::query_as::<_, Person>(
            "SELECT business_entity_id, person_type, title, first_name, middle_name, last_name, modified_date \
             FROM person.person ORDER BY business_entity_id",
        )
        .fetch_all(&self.pool)
        .await?;

        let emails = sqlx::query_as::<_, EmailAddress>(
            "SELECT business_entity_id, email_address_id, email_address \
             FROM person.email_address ORDER BY business_entity_id, email_address_id",
        )
        .fetch_all(&self.pool)
        .await?;

        let contacts = sqlx::query_as::<_, BusinessEntityContact>(
            "SELECT business_entity_id, person_id, contact_type_id \
             FROM person.business_entity_contact ORDER BY person_id",
        )
        .fetch_all(&self.pool)
        .await?;

        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM sales.customer AS c \
             WHERE c.person_id IS NOT NULL ORDER BY c.person_id, c.customer_id"
        ))
        .fetch_all(&self.pool)
        .await?;

        let positions: HashMap<i32, usize> = people
            .iter()
            .enumerate()
            .map(|(position, person)| (person.business_entity_id, position))
            .collect();
        let mut graphs: Vec<PersonGraph> = people.into_iter().map(PersonGraph::new).collect();

        for email in emails {
            if let Some(&position) = positions.get(&email.business_entity_id) {
                graphs[position].email_addresses.push(email);
            }
        }
        for contact in contacts {
            if let Some(&position) = positions.get(&contact.person_id) {
                graphs[position].contacts.push(contact);
            }
        }
        for customer in customers {
            if let Some(&position) = customer.person_id.and_then(|id| positions.get(&id)) {
                graphs[position].customers.push(customer);
            }
        }

        Ok(graphs)
    }

    // ==========================================================================
    // Aggregation and date functions
    // ==========================================================================

    /// Account numbers of customers grouped by their contact's first name.
    pub async fn account_numbers_by_first_name(&self, separator: &str) -> Result<Vec<AccountAggregate>, DbError> {
        let groups = sqlx::query_as::<_, AccountAggregate>(
            r#"
            SELECT p.first_name, string_agg(c.account_number, $1::text ORDER BY c.account_number) AS accounts
            FROM sales.customer AS c
            JOIN person.person AS p ON p.business_entity_id = c.person_id
            GROUP BY p.first_name
            ORDER BY p.first_name
            "#,
        )
        .bind(separator)
        .fetch_all(&self.pool)
        .await?;
        Ok(groups)
    }

    /// Customers modified at or after a threshold computed by the caller.
    pub async fn customers_modified_since(&self, since: NaiveDateTime) -> Result<Vec<Customer>, DbError> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM sales.customer AS c WHERE c.modified_date >= $1"
        ))
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(customers)
    }

    /// Customers modified within the last year, with the cut-off computed by the database.
    pub async fn customers_modified_within_last_year(&self) -> Result<Vec<Customer>, DbError> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM sales.customer AS c \
             WHERE c.modified_date > (NOW() AT TIME ZONE 'UTC') - INTERVAL '1 year'"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(customers)
    }

    /// Days since modification and the modification time in `time_zone`,
    /// both evaluated by the database.
    pub async fn customer_modification_ages(
        &self,
        time_zone: &str,
        limit: i64,
    ) -> Result<Vec<CustomerModificationAge>, DbError> {
        let rows = sqlx::query_as::<_, CustomerModificationAge>(
            r#"
            SELECT
                c.customer_id,
                (CURRENT_DATE - c.modified_date::date) AS modified_days_ago,
                c.modified_date,
                (c.modified_date AT TIME ZONE 'UTC') AT TIME ZONE $1::text AS modified_local_time
            FROM sales.customer AS c
            ORDER BY c.customer_id
            LIMIT $2
            "#,
        )
        .bind(time_zone)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ==========================================================================
    // Bulk writes
    // ==========================================================================

    /// Moves `modified_date` forward by `days` for every customer modified
    /// before `before`, in a single set-based statement.
    pub async fn shift_customer_modified_dates(&self, before: NaiveDateTime, days: i32) -> Result<u64, DbError> {
        let result = sqlx::query(
            "UPDATE sales.customer \
             SET modified_date = modified_date + make_interval(days => $1) \
             WHERE modified_date < $2",
        )
        .bind(days)
        .bind(before)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
