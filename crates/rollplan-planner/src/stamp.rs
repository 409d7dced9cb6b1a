use rollplan_core::plan::RESTART_STAMP_ENV;
use rollplan_core::Instruction;
use sha2::{Digest, Sha256};

/// Content hash of an instruction list, hex encoded.
///
/// Restart stamp entries are dropped first so a plan that already carries
/// its stamp hashes the same as one that does not.
pub fn restart_stamp(instructions: &[Instruction]) -> Result<String, serde_json::Error> {
    let stripped: Vec<Instruction> = instructions
        .iter()
        .map(|instruction| Instruction {
            env: instruction
                .env
                .iter()
                .filter(|e| !is_stamp_entry(e))
                .cloned()
                .collect(),
            ..instruction.clone()
        })
        .collect();

    let bytes = serde_json::to_vec(&stripped)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Matches both `RESTART_STAMP=...` and `$env:RESTART_STAMP=...`.
pub fn is_stamp_entry(entry: &str) -> bool {
    let name = entry.strip_prefix("$env:").unwrap_or(entry);
    name.split_once('=')
        .is_some_and(|(key, _)| key == RESTART_STAMP_ENV)
}
