//! On-disk / on-wire encoding of plan records: zstd-compressed JSON.

use std::io::{Read, Write};

use crate::addr::PlanAddr;
use crate::error::StorageError;
use crate::record::PlanRecord;

pub const CONTENT_TYPE: &str = "application/zstd";

const LEVEL: i32 = 3;

pub fn encode(record: &PlanRecord) -> Result<Vec<u8>, StorageError> {
    let json = serde_json::to_vec(record)?;
    let mut buf = Vec::new();
    {
        let mut encoder = zstd::Encoder::new(&mut buf, LEVEL)?;
        encoder.write_all(&json)?;
        encoder.finish()?;
    }
    Ok(buf)
}

/// Decode a stored record. `key` only labels errors.
pub fn decode(key: &str, bytes: &[u8]) -> Result<PlanRecord, StorageError> {
    let corrupted = |reason: String| StorageError::Corrupted {
        key: key.to_string(),
        reason,
    };

    let mut json = Vec::new();
    zstd::Decoder::new(bytes)
        .and_then(|mut decoder| decoder.read_to_end(&mut json))
        .map_err(|e| corrupted(e.to_string()))?;

    serde_json::from_slice(&json).map_err(|e| corrupted(e.to_string()))
}

/// Decode the record stored under `addr`'s key, rejecting one that was
/// written for a different address.
pub fn decode_for(addr: &PlanAddr, key: &str, bytes: &[u8]) -> Result<PlanRecord, StorageError> {
    let record = decode(key, bytes)?;
    if record.addr != *addr {
        return Err(StorageError::Corrupted {
            key: key.to_string(),
            reason: format!("record belongs to {}, expected {addr}", record.addr),
        });
    }
    Ok(record)
}
