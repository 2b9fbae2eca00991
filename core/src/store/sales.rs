use super::SalesStore;
use crate::{
    error::YoyResult,
    record::SalesRecord,
    types::SalesMonth,
};
use rusqlite::{params, types::Type, OptionalExtension, Row};

const RECORD_COLUMNS: &str = "customer_name, contract_id, facility_id, product_name,
    address, normalized_address, province, district, latitude, longitude,
    industry_category, industry, sales_month,
    current_volume, prior_volume, current_cumulative, prior_cumulative,
    status, change_category";

impl SalesStore {
    // ── Sales records ──────────────────────────────────────────

    /// Persist a full dataset as one import. Returns the import id.
    pub fn insert_records(&self, source: &str, records: &[SalesRecord]) -> YoyResult<i64> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO dataset_import (source, row_count, imported_at) VALUES (?1, ?2, ?3)",
            params![source, records.len() as i64, chrono::Utc::now().to_rfc3339()],
        )?;
        let import_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO sales_record (import_id, {RECORD_COLUMNS})
                 VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19,?20)"
            ))?;
            for r in records {
                stmt.execute(params![
                    import_id,
                    r.customer_name,
                    r.contract_id,
                    r.facility_id,
                    r.product_name,
                    r.address,
                    r.normalized_address,
                    r.province,
                    r.district,
                    r.latitude,
                    r.longitude,
                    r.industry_category,
                    r.industry,
                    r.sales_month.to_string(),
                    r.current_volume,
                    r.prior_volume,
                    r.current_cumulative,
                    r.prior_cumulative,
                    r.status.as_str(),
                    r.change_category.as_str(),
                ])?;
            }
        }

        tx.commit()?;
        log::info!("Imported {} records from {source} as import {import_id}", records.len());
        Ok(import_id)
    }

    pub fn latest_import_id(&self) -> YoyResult<Option<i64>> {
        let id = self
            .conn
            .query_row("SELECT MAX(import_id) FROM dataset_import", params![], |row| {
                row.get::<_, Option<i64>>(0)
            })
            .optional()?
            .flatten();
        Ok(id)
    }

    /// Every record of the most recent import, in insertion order.
    pub fn load_records(&self) -> YoyResult<Vec<SalesRecord>> {
        let Some(import_id) = self.latest_import_id()? else {
            return Ok(Vec::new());
        };
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM sales_record WHERE import_id = ?1 ORDER BY id ASC"
        ))?;
        let records = stmt
            .query_map(params![import_id], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub fn record_count(&self) -> YoyResult<i64> {
        let Some(import_id) = self.latest_import_id()? else {
            return Ok(0);
        };
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM sales_record WHERE import_id = ?1",
                params![import_id],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    pub fn products(&self) -> YoyResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT product_name FROM sales_record
             WHERE import_id = (SELECT MAX(import_id) FROM dataset_import)
             ORDER BY product_name ASC",
        )?;
        let products = stmt
            .query_map(params![], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(products)
    }

    pub fn months(&self) -> YoyResult<Vec<SalesMonth>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT sales_month FROM sales_record
             WHERE import_id = (SELECT MAX(import_id) FROM dataset_import)
             ORDER BY sales_month ASC",
        )?;
        let months = stmt
            .query_map(params![], |row| parse_column::<SalesMonth>(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(months)
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<SalesRecord> {
    Ok(SalesRecord {
        customer_name: row.get(0)?,
        contract_id: row.get(1)?,
        facility_id: row.get(2)?,
        product_name: row.get(3)?,
        address: row.get(4)?,
        normalized_address: row.get(5)?,
        province: row.get(6)?,
        district: row.get(7)?,
        latitude: row.get(8)?,
        longitude: row.get(9)?,
        industry_category: row.get(10)?,
        industry: row.get(11)?,
        sales_month: parse_column(row, 12)?,
        current_volume: row.get(13)?,
        prior_volume: row.get(14)?,
        current_cumulative: row.get(15)?,
        prior_cumulative: row.get(16)?,
        status: parse_column(row, 17)?,
        change_category: parse_column(row, 18)?,
    })
}

/// Read a TEXT column through the type's `FromStr`.
fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("{e}").into(),
        )
    })
}
