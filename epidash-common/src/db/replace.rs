//! Replace-write table persistence
//!
//! Every dataset in the store is rewritten wholesale on each run: the
//! table is dropped, recreated and refilled inside one transaction, so an
//! external reader observes either the previous generation or the new one,
//! never a partial write.

use crate::Result;
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use sqlx::{Sqlite, SqlitePool};
use tracing::debug;

/// Binds one row's values onto a prepared INSERT statement
pub trait BindRow {
    fn bind<'q>(
        &'q self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>>;
}

/// Replace `table` with the given rows.
///
/// `create_sql` must be a full CREATE TABLE statement for `table`;
/// `insert_sql` an INSERT with one `?` placeholder per bound value;
/// `index_sql` any CREATE INDEX statements to apply after the fill.
///
/// Returns the number of rows written.
pub async fn replace_table<R: BindRow>(
    pool: &SqlitePool,
    table: &str,
    create_sql: &str,
    insert_sql: &str,
    index_sql: &[&str],
    rows: &[R],
) -> Result<u64> {
    let mut tx = pool.begin().await?;

    sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
        .execute(&mut *tx)
        .await?;
    sqlx::query(create_sql).execute(&mut *tx).await?;

    for row in rows {
        row.bind(sqlx::query(insert_sql)).execute(&mut *tx).await?;
    }

    for sql in index_sql {
        sqlx::query(sql).execute(&mut *tx).await?;
    }

    tx.commit().await?;

    debug!(table = table, rows = rows.len(), "replaced table");

    Ok(rows.len() as u64)
}

// Bind orders below are the column orders the store schemas use.

impl BindRow for super::models::Observation {
    /// region, province, lat, long, date, value
    fn bind<'q>(
        &'q self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        query
            .bind(self.region.as_str())
            .bind(self.province.as_str())
            .bind(self.lat)
            .bind(self.long)
            .bind(self.date)
            .bind(self.value)
    }
}

impl BindRow for super::models::LookupRecord {
    /// iso2, iso3, region, province, population
    fn bind<'q>(
        &'q self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        query
            .bind(self.iso2.as_str())
            .bind(self.iso3.as_str())
            .bind(self.region.as_str())
            .bind(self.province.as_str())
            .bind(self.population)
    }
}

impl BindRow for super::models::UkLocalRecord {
    /// area_code, area_name, date, new_cases
    fn bind<'q>(
        &'q self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        query
            .bind(self.area_code.as_str())
            .bind(self.area_name.as_str())
            .bind(self.date)
            .bind(self.new_cases)
    }
}

impl BindRow for super::models::VaccinationObservation {
    /// region, iso_code, date, total_vaccinations, daily_vaccinations
    fn bind<'q>(
        &'q self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        query
            .bind(self.region.as_str())
            .bind(self.iso_code.as_str())
            .bind(self.date)
            .bind(self.total_vaccinations)
            .bind(self.daily_vaccinations)
    }
}
