//! Row shapes for the AdventureWorks subset.

use chrono::NaiveDateTime;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use uuid::Uuid;

/// A row of `person.person`.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Person {
    pub business_entity_id: i32,
    pub person_type: String,
    pub title: Option<String>,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub modified_date: NaiveDateTime,
}

/// A row of `sales.store`.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Store {
    pub business_entity_id: i32,
    pub name: String,
    pub sales_person_id: Option<i32>,
    pub modified_date: NaiveDateTime,
}

/// A row of `sales.customer`.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Customer {
    pub customer_id: i32,
    pub person_id: Option<i32>,
    pub store_id: Option<i32>,
    pub territory_id: Option<i32>,
    pub account_number: String,
    pub rowguid: Uuid,
    pub modified_date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct EmailAddress {
    pub business_entity_id: i32,
    pub email_address_id: i32,
    pub email_address: Option<String>,
}

/// Links a contact person to the store or vendor they represent.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct BusinessEntityContact {
    pub business_entity_id: i32,
    pub person_id: i32,
    pub contact_type_id: i32,
}

/// A customer together with whichever relations the query loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerGraph {
    pub customer: Customer,
    pub store: Option<Store>,
    pub person: Option<Person>,
}

/// A person with all three collections the split query demo loads.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonGraph {
    pub person: Person,
    pub email_addresses: Vec<EmailAddress>,
    pub contacts: Vec<BusinessEntityContact>,
    pub customers: Vec<Customer>,
}

impl PersonGraph {
    pub fn new(person: Person) -> Self {
        Self {
            person,
            email_addresses: Vec::new(),
            contacts: Vec::new(),
            customers: Vec::new(),
        }
    }
}

/// The narrowed shape used by the projection demo.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct CustomerListItem {
    pub customer_id: i32,
    pub account_number: String,
    pub contact_first_name: Option<String>,
    pub contact_last_name: Option<String>,
    pub contact_title: Option<String>,
    pub store_name: Option<String>,
}

/// One group of the string aggregation demo.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct AccountAggregate {
    pub first_name: String,
    pub accounts: String,
}

/// Store-side date arithmetic and time zone conversion for one customer.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct CustomerModificationAge {
    pub customer_id: i32,
    pub modified_days_ago: i32,
    pub modified_date: NaiveDateTime,
    pub modified_local_time: NaiveDateTime,
}

// Joined rows alias related columns with a table prefix (`store_name`,
// `person_first_name`, ...). A NULL key means the relation is absent.

impl Person {
    pub(crate) fn from_prefixed_row(row: &PgRow, prefix: &str) -> Result<Option<Self>, sqlx::Error> {
        let col = |name: &str| format!("{prefix}{name}");
        let Some(business_entity_id) = row.try_get::<Option<i32>, _>(col("business_entity_id").as_str())? else {
            return Ok(None);
        };
        Ok(Some(Self {
            business_entity_id,
            person_type: row.try_get(col("person_type").as_str())?,
            title: row.try_get(col("title").as_str())?,
            first_name: row.try_get(col("first_name").as_str())?,
            middle_name: row.try_get(col("middle_name").as_str())?,
            last_name: row.try_get(col("last_name").as_str())?,
            modified_date: row.try_get(col("modified_date").as_str())?,
        }))
    }
}

impl Store {
    pub(crate) fn from_prefixed_row(row: &PgRow, prefix: &str) -> Result<Option<Self>, sqlx::Error> {
        let col = |name: &str| format!("{prefix}{name}");
        let Some(business_entity_id) = row.try_get::<Option<i32>, _>(col("business_entity_id").as_str())? else {
            return Ok(None);
        };
        Ok(Some(Self {
            business_entity_id,
            name: row.try_get(col("name").as_str())?,
            sales_person_id: row.try_get(col("sales_person_id").as_str())?,
            modified_date: row.try_get(col("modified_date").as_str())?,
        }))
    }
}

impl Customer {
    pub(crate) fn from_prefixed_row(row: &PgRow, prefix: &str) -> Result<Option<Self>, sqlx::Error> {
        let col = |name: &str| format!("{prefix}{name}");
        let Some(customer_id) = row.try_get::<Option<i32>, _>(col("customer_id").as_str())? else {
            return Ok(None);
        };
        Ok(Some(Self {
            customer_id,
            person_id: row.try_get(col("person_id").as_str())?,
            store_id: row.try_get(col("store_id").as_str())?,
            territory_id: row.try_get(col("territory_id").as_str())?,
            account_number: row.try_get(col("account_number").as_str())?,
            rowguid: row.try_get(col("rowguid").as_str())?,
            modified_date: row.try_get(col("modified_date").as_str())?,
        }))
    }
}
