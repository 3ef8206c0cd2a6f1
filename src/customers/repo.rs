use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use crate::error::ApiError;

/// Delivery status of a customer order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "status_description")]
pub enum Status {
    Delivered,
    Pending,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub date: String,
    pub payments: f64,
    pub status: Status,
}

const CUSTOMER_COLUMNS: &str = "id, name, email, phone, address, date, payments, status";

/// Explicit allow-list for sortable columns. Anything else is a validation
/// error; column names never come from the request verbatim.
fn sort_column(name: &str) -> Option<&'static str> {
    match name {
        "id" => Some("id"),
        "name" => Some("name"),
        "email" => Some("email"),
        "phone" => Some("phone"),
        "address" => Some("address"),
        "date" => Some("date"),
        "payments" => Some("payments"),
        "status" => Some("status"),
        _ => None,
    }
}

fn build_list_query(
    search: bool,
    sort_by: Option<&str>,
    sort_order: &str,
) -> Result<String, ApiError> {
    let mut sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers");
    if search {
        sql.push_str(
            " WHERE name ILIKE $1 OR email ILIKE $1 OR phone ILIKE $1 \
             OR address ILIKE $1 OR payments::text ILIKE $1 OR status::text ILIKE $1",
        );
    }
    if let Some(by) = sort_by {
        let column = sort_column(by).ok_or_else(|| ApiError::InvalidSortColumn(by.to_string()))?;
        let direction = if sort_order == "desc" { "DESC" } else { "ASC" };
        sql.push_str(&format!(" ORDER BY {column} {direction}"));
    }
    Ok(sql)
}

impl Customer {
    pub async fn list(
        db: &PgPool,
        search: Option<&str>,
        sort_by: Option<&str>,
        sort_order: &str,
    ) -> Result<Vec<Customer>, ApiError> {
        let sql = build_list_query(search.is_some(), sort_by, sort_order)?;
        let mut query = sqlx::query_as::<_, Customer>(&sql);
        if let Some(term) = search {
            query = query.bind(format!("%{term}%"));
        }
        Ok(query.fetch_all(db).await?)
    }

    pub async fn find_by_id(db: &PgPool, id: i64) -> Result<Option<Customer>, ApiError> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(customer)
    }

    /// Insert with a client-supplied id; the primary-key constraint rejects
    /// duplicates.
    pub async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        customer: &Customer,
    ) -> Result<Customer, ApiError> {
        sqlx::query_as::<_, Customer>(&format!(
            r#"
            INSERT INTO customers (id, name, email, phone, address, date, payments, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(&customer.date)
        .bind(customer.payments)
        .bind(customer.status)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ApiError::DuplicateCustomerId(customer.id)
            }
            _ => ApiError::Database(e),
        })
    }

    /// Partial update; absent fields keep their stored value.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        db: &PgPool,
        id: i64,
        name: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
        address: Option<&str>,
        date: Option<&str>,
        payments: Option<f64>,
        status: Option<Status>,
    ) -> Result<Option<Customer>, ApiError> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            r#"
            UPDATE customers SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                address = COALESCE($5, address),
                date = COALESCE($6, date),
                payments = COALESCE($7, payments),
                status = COALESCE($8, status)
            WHERE id = $1
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(address)
        .bind(date)
        .bind(payments)
        .bind(status)
        .fetch_optional(db)
        .await?;
        Ok(customer)
    }

    /// Hard removal; returns whether a row existed.
    pub async fn delete(db: &PgPool, id: i64) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
