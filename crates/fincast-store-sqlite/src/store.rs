//! [`SqliteStore`], the SQLite implementation of [`RecordStore`].

use std::{collections::BTreeMap, path::Path};

use chrono::Utc;
use fincast_core::{
  Record,
  RecordSet,
  RecordType,
  store::{RecordQuery, RecordStore},
};

use crate::{
  Error,
  Result,
  encode::{RawRecord, encode_date, encode_dt, encode_record},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A fincast record store backed by a single SQLite file.
///
/// Clones share one reference-counted connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a `SELECT record_type, payload_json …` and decode every row.
  async fn select_records(
    &self,
    sql: &'static str,
    params: Vec<rusqlite::types::Value>,
  ) -> Result<Vec<Record>> {
    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), |row| {
            Ok(RawRecord {
              record_type:  row.get(0)?,
              payload_json: row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = Error;

  async fn insert_records(&self, records: Vec<Record>) -> Result<usize> {
    let encoded = records
      .iter()
      .map(encode_record)
      .collect::<Result<Vec<_>>>()?;
    let loaded_at = encode_dt(Utc::now());

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut written = 0usize;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO records (
               record_id, record_type, indicator_code, observation_date,
               payload_json, loaded_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(record_id) DO UPDATE SET
               record_type      = excluded.record_type,
               indicator_code   = excluded.indicator_code,
               observation_date = excluded.observation_date,
               payload_json     = excluded.payload_json,
               loaded_at        = excluded.loaded_at",
          )?;
          for rec in &encoded {
            written += stmt.execute(rusqlite::params![
              rec.record_id,
              rec.record_type,
              rec.indicator_code,
              rec.observation_date,
              rec.payload_json,
              loaded_at,
            ])?;
          }
        }
        tx.commit()?;
        Ok(written)
      })
      .await?;

    tracing::debug!(written, "inserted records");
    Ok(written)
  }

  async fn snapshot(&self) -> Result<RecordSet> {
    let records = self
      .select_records(
        "SELECT record_type, payload_json FROM records ORDER BY seq",
        vec![],
      )
      .await?;
    Ok(RecordSet::new(records))
  }

  async fn list_records(&self, query: &RecordQuery) -> Result<Vec<Record>> {
    use rusqlite::types::Value;

    let text = |s: Option<String>| s.map_or(Value::Null, Value::Text);
    let params = vec![
      text(query.record_type.map(|t| t.as_ref().to_owned())),
      text(query.indicator_code.clone()),
      text(query.dated_from.map(encode_date)),
      text(query.dated_until.map(encode_date)),
      Value::Integer(query.limit.map_or(-1, |l| l as i64)),
      Value::Integer(query.offset.unwrap_or(0) as i64),
    ];

    // Undated rows compare as NULL, so they never satisfy a date bound.
    self
      .select_records(
        "SELECT record_type, payload_json FROM records
         WHERE (?1 IS NULL OR record_type = ?1)
           AND (?2 IS NULL OR indicator_code = ?2)
           AND (?3 IS NULL OR observation_date >= ?3)
           AND (?4 IS NULL OR observation_date <= ?4)
         ORDER BY seq
         LIMIT ?5 OFFSET ?6",
        params,
      )
      .await
  }

  async fn count_by_type(&self) -> Result<BTreeMap<RecordType, usize>> {
    let counts: Vec<(String, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT record_type, COUNT(*) FROM records GROUP BY record_type")?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    counts
      .into_iter()
      .map(|(kind, n)| -> Result<(RecordType, usize)> {
        let kind: RecordType = kind
          .parse()
          .map_err(|_| fincast_core::Error::UnknownRecordType(kind.clone()))?;
        Ok((kind, n as usize))
      })
      .collect()
  }
}
