//! `PostgreSQL` address collection.
//!
//! Each address is a row of `addresses` with one `TEXT` column per field.
//! A `seq` column records insertion order; an upsert keeps the original
//! `seq`, so updated records do not move in listings.
//!
//! Queries are built at runtime with `sqlx::QueryBuilder` because filters
//! are dynamic. Column names come from [`ADDRESS_FIELDS`] and
//! [`AddressFilter::clauses`], never from request input.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use addressbook_core::{ADDRESS_FIELDS, Address, AddressId, DomainCode, INDEXED_FIELDS, Page, UserId};

use super::{AddressCollection, AddressFilter, RepositoryError};

const TABLE: &str = "addresses";

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS addresses (
        seq          BIGSERIAL   NOT NULL,
        id           TEXT        NOT NULL,
        domain       TEXT        NOT NULL,
        id_user      TEXT,
        "type"       TEXT,
        name         TEXT,
        address      TEXT,
        nr           TEXT,
        zip          TEXT,
        city         TEXT,
        state        TEXT,
        country      TEXT,
        company_name TEXT,
        fiscal_code  TEXT,
        vat_number   TEXT,
        sdi          TEXT,
        pec          TEXT,
        created_at   TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at   TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
"#;

const CREATE_ID_INDEX: &str = "CREATE UNIQUE INDEX IF NOT EXISTS addresses_id_key ON addresses (id)";

/// Row shape of the `addresses` table.
#[derive(sqlx::FromRow)]
struct AddressRow {
    id: AddressId,
    domain: DomainCode,
    id_user: Option<UserId>,
    #[sqlx(rename = "type")]
    kind: Option<String>,
    name: Option<String>,
    address: Option<String>,
    nr: Option<String>,
    zip: Option<String>,
    city: Option<String>,
    state: Option<String>,
    country: Option<String>,
    company_name: Option<String>,
    fiscal_code: Option<String>,
    vat_number: Option<String>,
    sdi: Option<String>,
    pec: Option<String>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: row.id,
            domain: row.domain,
            id_user: row.id_user,
            kind: row.kind,
            name: row.name,
            address: row.address,
            nr: row.nr,
            zip: row.zip,
            city: row.city,
            state: row.state,
            country: row.country,
            company_name: row.company_name,
            fiscal_code: row.fiscal_code,
            vat_number: row.vat_number,
            sdi: row.sdi,
            pec: row.pec,
        }
    }
}

/// Quote a column name; `type` is a keyword.
fn column(name: &str) -> String {
    format!("\"{name}\"")
}

/// The quoted, comma-separated column list of [`ADDRESS_FIELDS`].
fn column_list() -> String {
    ADDRESS_FIELDS
        .iter()
        .map(|field| column(field))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Append a `WHERE` clause for `filter` (nothing if it is unconstrained).
fn push_filter<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &'a AddressFilter) {
    let mut separator = " WHERE ";
    for (name, value) in filter.clauses() {
        qb.push(separator)
            .push(column(name))
            .push(" = ")
            .push_bind(value);
        separator = " AND ";
    }
}

/// Addresses stored in `PostgreSQL`.
#[derive(Debug, Clone)]
pub struct PgAddresses {
    pool: PgPool,
}

impl PgAddresses {
    /// Create a collection backed by `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AddressCollection for PgAddresses {
    async fn init(&self) -> Result<(), RepositoryError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_ID_INDEX).execute(&self.pool).await?;

        for field in INDEXED_FIELDS {
            let statement = format!(
                "CREATE INDEX IF NOT EXISTS {TABLE}_{field}_idx ON {TABLE} ({})",
                column(field)
            );
            sqlx::query(&statement).execute(&self.pool).await?;
        }

        tracing::debug!(indexes = INDEXED_FIELDS.len() + 1, "addresses collection ready");
        Ok(())
    }

    async fn find_one(&self, filter: &AddressFilter) -> Result<Option<Address>, RepositoryError> {
        let mut qb = QueryBuilder::new(format!("SELECT {} FROM {TABLE}", column_list()));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY seq LIMIT 1");

        let row = qb
            .build_query_as::<AddressRow>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Address::from))
    }

    async fn find_all(
        &self,
        filter: &AddressFilter,
        page: Page,
    ) -> Result<Vec<Address>, RepositoryError> {
        let mut qb = QueryBuilder::new(format!("SELECT {} FROM {TABLE}", column_list()));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY seq");

        if let Some(limit) = page.limit() {
            qb.push(" LIMIT ")
                .push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }
        if page.offset() > 0 {
            qb.push(" OFFSET ")
                .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));
        }

        let rows = qb
            .build_query_as::<AddressRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Address::from).collect())
    }

    async fn delete(&self, filter: &AddressFilter) -> Result<u64, RepositoryError> {
        let mut qb = QueryBuilder::new(format!("DELETE FROM {TABLE}"));
        push_filter(&mut qb, filter);

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn upsert(&self, address: &Address) -> Result<Address, RepositoryError> {
        let mut qb = QueryBuilder::new(format!("INSERT INTO {TABLE} ({}) ", column_list()));
        qb.push_values(std::iter::once(address), |mut row, a| {
            row.push_bind(&a.id)
                .push_bind(&a.domain)
                .push_bind(&a.id_user)
                .push_bind(&a.kind)
                .push_bind(&a.name)
                .push_bind(&a.address)
                .push_bind(&a.nr)
                .push_bind(&a.zip)
                .push_bind(&a.city)
                .push_bind(&a.state)
                .push_bind(&a.country)
                .push_bind(&a.company_name)
                .push_bind(&a.fiscal_code)
                .push_bind(&a.vat_number)
                .push_bind(&a.sdi)
                .push_bind(&a.pec);
        });

        let updates = ADDRESS_FIELDS
            .iter()
            .filter(|field| **field != "id")
            .map(|field| format!("{0} = EXCLUDED.{0}", column(field)))
            .collect::<Vec<_>>()
            .join(", ");
        qb.push(format!(
            " ON CONFLICT (id) DO UPDATE SET {updates}, updated_at = NOW() RETURNING {}",
            column_list()
        ));

        let row = qb
            .build_query_as::<AddressRow>()
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
