//! Scratch-file naming for saved failing cases (§ Glossary "scratch file",
//! supplemented from `pwd_id.go`).

/// FNV-1a 64-bit hash, matching the original's scratch-file naming scheme.
const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Derives a stable scratch-file name for a failing case's seed, so re-runs
/// of the same seed overwrite the same file rather than accumulating one
/// file per run.
#[must_use]
pub fn scratch_file_name(working_dir_hint: &str, seed: &[u8]) -> String {
    let mut key = Vec::with_capacity(working_dir_hint.len() + seed.len());
    key.extend_from_slice(working_dir_hint.as_bytes());
    key.extend_from_slice(seed);
    format!("{:016x}.json", fnv1a64(&key))
}
