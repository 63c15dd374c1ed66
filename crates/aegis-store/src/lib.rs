//! Aegis Storage Layer
//!
//! Implements the ClaimStore trait using SQLite.
//!
//! # Architecture
//!
//! - `claims` holds every claim with its derived fields, lease, and revision
//! - `verified_records` holds at most one record per claim
//! - Batch leasing runs in an immediate transaction, so concurrent engines
//!   sharing a database file never lease the same claim
//! - Transitions are revision-guarded and written together with their record
//!
//! # Examples
//!
//! ```no_run
//! use aegis_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for claim operations
//! ```

#![warn(missing_docs)]

use aegis_domain::traits::{ClaimQuery, ClaimStore, CommitOutcome, Lease};
use aegis_domain::{Claim, ClaimId, ClaimStatus, ResolutionPath, Verdict, VerifiedRecord};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored JSON document could not be (de)serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid data format or a claim that violates its status invariants
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A claim with this ID already exists
    #[error("Duplicate claim: {0}")]
    Duplicate(ClaimId),

    /// Claim not found
    #[error("Claim not found: {0}")]
    NotFound(ClaimId),
}

const CLAIM_COLUMNS: &str = "id, text, source_metadata, suspicion, credibility, evidence, \
                             status, retry_count, created_at, updated_at, revision";

/// SQLite-based implementation of ClaimStore
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each engine should own its own
/// SqliteStore instance; several instances may open the same database file.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use aegis_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("aegis.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Current lease on a claim, as `(owner, expires_at)`
    pub fn lease_of(&self, id: ClaimId) -> Result<Option<(String, u64)>, StoreError> {
        let lease = self
            .conn
            .query_row(
                "SELECT leased_by, lease_expires_at FROM claims WHERE id = ?1",
                params![claim_id_to_bytes(id)],
                |row| {
                    let owner: Option<String> = row.get(0)?;
                    let expires: Option<i64> = row.get(1)?;
                    Ok(owner.zip(expires.map(|t| t as u64)))
                },
            )
            .optional()?
            .flatten();
        Ok(lease)
    }
}

/// Convert ClaimId to bytes for storage
///
/// Big-endian keeps the byte order equal to the UUIDv7 time order.
fn claim_id_to_bytes(id: ClaimId) -> Vec<u8> {
    id.value().to_be_bytes().to_vec()
}

/// Convert bytes to ClaimId
fn bytes_to_claim_id(bytes: &[u8]) -> Result<ClaimId, StoreError> {
    let arr: [u8; 16] = bytes.try_into().map_err(|_| {
        StoreError::InvalidData(format!("Expected 16 bytes for ClaimId, got {}", bytes.len()))
    })?;
    Ok(ClaimId::from_value(u128::from_be_bytes(arr)))
}

/// Wrap a decoding error so it can travel through a rusqlite row mapper
fn conversion_error(column: usize, ty: rusqlite::types::Type, e: StoreError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, ty, Box::new(e))
}

fn parse_json(column: usize, text: &str) -> rusqlite::Result<serde_json::Value> {
    serde_json::from_str(text)
        .map_err(|e| conversion_error(column, rusqlite::types::Type::Text, e.into()))
}

/// Map a row selected with [`CLAIM_COLUMNS`] to a claim
///
/// Unknown status strings are rejected rather than passed on.
fn row_to_claim(row: &Row<'_>) -> rusqlite::Result<Claim> {
    use rusqlite::types::Type;

    let id_bytes: Vec<u8> = row.get(0)?;
    let id = bytes_to_claim_id(&id_bytes).map_err(|e| conversion_error(0, Type::Blob, e))?;

    let metadata: String = row.get(2)?;
    let evidence: Option<String> = row.get(5)?;
    let status: String = row.get(6)?;
    let status = ClaimStatus::parse(&status).ok_or_else(|| {
        conversion_error(6, Type::Text, StoreError::InvalidData(format!("Unknown claim status: {}", status)))
    })?;

    Ok(Claim {
        id,
        text: row.get(1)?,
        source_metadata: parse_json(2, &metadata)?,
        suspicion: row.get(3)?,
        credibility: row.get(4)?,
        evidence: evidence.as_deref().map(|e| parse_json(5, e)).transpose()?,
        status,
        retry_count: row.get(7)?,
        created_at: row.get::<_, i64>(8)? as u64,
        updated_at: row.get::<_, i64>(9)? as u64,
        revision: row.get::<_, i64>(10)? as u64,
    })
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<VerifiedRecord> {
    use rusqlite::types::Type;

    let id_bytes: Vec<u8> = row.get(0)?;
    let claim_id = bytes_to_claim_id(&id_bytes).map_err(|e| conversion_error(0, Type::Blob, e))?;

    let verdict: String = row.get(1)?;
    let verdict = Verdict::parse(&verdict).ok_or_else(|| {
        conversion_error(1, Type::Text, StoreError::InvalidData(format!("Unknown verdict: {}", verdict)))
    })?;

    let path: String = row.get(3)?;
    let resolution_path = ResolutionPath::parse(&path).ok_or_else(|| {
        conversion_error(3, Type::Text, StoreError::InvalidData(format!("Unknown resolution path: {}", path)))
    })?;

    Ok(VerifiedRecord {
        claim_id,
        verdict,
        explanation: row.get(2)?,
        resolution_path,
        confidence: row.get(4)?,
        created_at: row.get::<_, i64>(5)? as u64,
    })
}

impl ClaimStore for SqliteStore {
    type Error = StoreError;

    fn insert_claim(&mut self, claim: &Claim) -> Result<ClaimId, Self::Error> {
        claim
            .check_invariants()
            .map_err(|e| StoreError::InvalidData(e.to_string()))?;

        let id_bytes = claim_id_to_bytes(claim.id);
        let exists = self
            .conn
            .query_row("SELECT 1 FROM claims WHERE id = ?1", params![&id_bytes], |_| Ok(true))
            .optional()?
            .unwrap_or(false);
        if exists {
            return Err(StoreError::Duplicate(claim.id));
        }

        self.conn.execute(
            "INSERT INTO claims (id, text, source_metadata, suspicion, credibility, evidence,
                                 status, retry_count, created_at, updated_at, revision)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                &id_bytes,
                &claim.text,
                serde_json::to_string(&claim.source_metadata)?,
                claim.suspicion,
                claim.credibility,
                claim.evidence.as_ref().map(serde_json::to_string).transpose()?,
                claim.status.as_str(),
                claim.retry_count,
                claim.created_at as i64,
                claim.updated_at as i64,
                claim.revision as i64,
            ],
        )?;

        Ok(claim.id)
    }

    fn get_claim(&self, id: ClaimId) -> Result<Option<Claim>, Self::Error> {
        let claim = self
            .conn
            .query_row(
                &format!("SELECT {} FROM claims WHERE id = ?1", CLAIM_COLUMNS),
                params![claim_id_to_bytes(id)],
                row_to_claim,
            )
            .optional()?;
        Ok(claim)
    }

    fn query_claims(&self, query: &ClaimQuery) -> Result<Vec<Claim>, Self::Error> {
        let mut sql = format!("SELECT {} FROM claims WHERE 1=1", CLAIM_COLUMNS);
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            params.push(Box::new(status.as_str()));
        }

        if let Some(max) = query.max_retry_count {
            sql.push_str(" AND retry_count < ?");
            params.push(Box::new(max));
        }

        sql.push_str(" ORDER BY id");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let claims = stmt
            .query_map(&param_refs[..], row_to_claim)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(claims)
    }

    fn lease_batch(&mut self, query: &ClaimQuery, lease: &Lease) -> Result<Vec<Claim>, Self::Error> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut sql = format!(
            "SELECT {} FROM claims WHERE (leased_by IS NULL OR lease_expires_at <= ?)",
            CLAIM_COLUMNS
        );
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(lease.acquired_at as i64)];

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            params.push(Box::new(status.as_str()));
        }

        if let Some(max) = query.max_retry_count {
            sql.push_str(" AND retry_count < ?");
            params.push(Box::new(max));
        }

        sql.push_str(" ORDER BY id");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        let claims = {
            let mut stmt = tx.prepare(&sql)?;
            let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
            let claims = stmt
                .query_map(&param_refs[..], row_to_claim)?
                .collect::<Result<Vec<_>, _>>()?;
            claims
        };

        {
            let mut mark = tx.prepare(
                "UPDATE claims SET leased_by = ?1, lease_expires_at = ?2 WHERE id = ?3",
            )?;
            for claim in &claims {
                mark.execute(params![
                    &lease.owner,
                    lease.expires_at as i64,
                    claim_id_to_bytes(claim.id)
                ])?;
            }
        }

        tx.commit()?;
        Ok(claims)
    }

    fn commit_transition(
        &mut self,
        claim: &Claim,
        record: Option<&VerifiedRecord>,
    ) -> Result<CommitOutcome, Self::Error> {
        claim
            .check_invariants()
            .map_err(|e| StoreError::InvalidData(e.to_string()))?;
        if let Some(record) = record {
            if record.claim_id != claim.id {
                return Err(StoreError::InvalidData(format!(
                    "Record for claim {} committed with claim {}",
                    record.claim_id, claim.id
                )));
            }
        }

        let id_bytes = claim_id_to_bytes(claim.id);
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let stored: Option<(String, i64)> = tx
            .query_row(
                "SELECT status, revision FROM claims WHERE id = ?1",
                params![&id_bytes],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((stored_status, stored_revision)) = stored else {
            return Err(StoreError::NotFound(claim.id));
        };
        if stored_revision as u64 != claim.revision {
            return Ok(CommitOutcome::Conflict);
        }
        let stored_status = ClaimStatus::parse(&stored_status)
            .ok_or_else(|| StoreError::InvalidData(format!("Unknown claim status: {}", stored_status)))?;
        if !stored_status.can_transition_to(claim.status) {
            return Err(StoreError::InvalidData(format!(
                "Illegal transition for claim {}: {} -> {}",
                claim.id, stored_status, claim.status
            )));
        }

        tx.execute(
            "UPDATE claims
             SET suspicion = ?1, credibility = ?2, evidence = ?3, status = ?4, retry_count = ?5,
                 updated_at = ?6, revision = revision + 1, leased_by = NULL, lease_expires_at = NULL
             WHERE id = ?7 AND revision = ?8",
            params![
                claim.suspicion,
                claim.credibility,
                claim.evidence.as_ref().map(serde_json::to_string).transpose()?,
                claim.status.as_str(),
                claim.retry_count,
                claim.updated_at as i64,
                &id_bytes,
                stored_revision,
            ],
        )?;

        if let Some(record) = record {
            let inserted = tx.execute(
                "INSERT INTO verified_records
                     (claim_id, verdict, explanation, resolution_path, confidence, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(claim_id) DO NOTHING",
                params![
                    &id_bytes,
                    record.verdict.as_str(),
                    &record.explanation,
                    record.resolution_path.as_str(),
                    record.confidence,
                    record.created_at as i64,
                ],
            )?;
            if inserted == 0 {
                // Dropping the transaction rolls back the claim update too
                return Ok(CommitOutcome::Conflict);
            }
        }

        tx.commit()?;
        Ok(CommitOutcome::Committed)
    }

    fn release_lease(&mut self, id: ClaimId, owner: &str) -> Result<(), Self::Error> {
        self.conn.execute(
            "UPDATE claims SET leased_by = NULL, lease_expires_at = NULL
             WHERE id = ?1 AND leased_by = ?2",
            params![claim_id_to_bytes(id), owner],
        )?;
        Ok(())
    }

    fn release_leases(&mut self, owner: &str) -> Result<usize, Self::Error> {
        let released = self.conn.execute(
            "UPDATE claims SET leased_by = NULL, lease_expires_at = NULL WHERE leased_by = ?1",
            params![owner],
        )?;
        Ok(released)
    }

    fn get_record(&self, claim_id: ClaimId) -> Result<Option<VerifiedRecord>, Self::Error> {
        let record = self
            .conn
            .query_row(
                "SELECT claim_id, verdict, explanation, resolution_path, confidence, created_at
                 FROM verified_records WHERE claim_id = ?1",
                params![claim_id_to_bytes(claim_id)],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    fn list_records(&self, limit: Option<usize>) -> Result<Vec<VerifiedRecord>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT claim_id, verdict, explanation, resolution_path, confidence, created_at
             FROM verified_records ORDER BY created_at DESC, claim_id DESC LIMIT ?1",
        )?;
        // SQLite treats a negative LIMIT as unbounded
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let records = stmt
            .query_map(params![limit], row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn count_by_status(&self) -> Result<BTreeMap<ClaimStatus, usize>, Self::Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM claims GROUP BY status")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut counts = BTreeMap::new();
        for (status, count) in rows {
            let status = ClaimStatus::parse(&status)
                .ok_or_else(|| StoreError::InvalidData(format!("Unknown claim status: {}", status)))?;
            counts.insert(status, count as usize);
        }
        Ok(counts)
    }
}
