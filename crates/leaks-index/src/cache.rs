//! On-disk cache for the reverse index.
//!
//! The index is serialized into a gzip envelope stored next to the snapshot
//! (`<snapshot>.ri`) and keyed by a content fingerprint: the snapshot's file
//! size plus the SHA-256 of its first 64 KiB. Logical layout, all integers
//! little-endian, inside one gzip stream:
//!
//! ```text
//! magic (4B) | version (4B) | snapshot_size (8B) | fingerprint_len (4B)
//! | fingerprint | entry_count (4B)
//! | entry_count x { child_id (8B) | parent_count (4B) | parent_ids (8B each) }
//! ```
//!
//! Verification failures are never fatal: any mismatch, short read or
//! decompression error is logged and answered by rebuilding the index from
//! the snapshot.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use leaks_snapshot::{HeapGraph, ObjectId};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::builder::build_reverse_index;
use crate::error::IndexError;
use crate::reverse::ReverseIndex;

pub const CACHE_MAGIC: [u8; 4] = *b"LKRI";
pub const CACHE_VERSION: u32 = 1;

/// How much of the snapshot participates in the fingerprint. The header and
/// first records change whenever the dump does; hashing the whole multi-GB
/// file on every run would defeat the cache.
const FINGERPRINT_WINDOW: usize = 64 * 1024;

/// The cache file for a snapshot: the snapshot path with `.ri` appended.
pub fn cache_path(snapshot_path: &Path) -> PathBuf {
    let mut os = snapshot_path.as_os_str().to_owned();
    os.push(".ri");
    PathBuf::from(os)
}

/// Computes the snapshot's (size, SHA-256-of-first-64KiB) fingerprint.
pub fn fingerprint(
    snapshot_path: &Path,
) -> Result<(u64, [u8; 32]), IndexError> {
    let mut file = File::open(snapshot_path)?;
    let size = file.metadata()?.len();
    let mut window = vec![0u8; FINGERPRINT_WINDOW.min(size as usize)];
    file.read_exact(&mut window)?;
    let digest: [u8; 32] = Sha256::digest(&window).into();
    Ok((size, digest))
}

/// Serializes the index into the cache file for `snapshot_path`.
///
/// # Errors
///
/// Returns [`IndexError`] on any I/O failure. Callers treat a failed save
/// as a warning; the in-memory index is still good.
pub fn save(
    index: &ReverseIndex,
    snapshot_path: &Path,
) -> Result<(), IndexError> {
    let (size, digest) = fingerprint(snapshot_path)?;
    let path = cache_path(snapshot_path);
    let file = File::create(&path)?;
    let mut out =
        GzEncoder::new(BufWriter::new(file), Compression::default());

    out.write_all(&CACHE_MAGIC)?;
    out.write_all(&CACHE_VERSION.to_le_bytes())?;
    out.write_all(&size.to_le_bytes())?;
    out.write_all(&(digest.len() as u32).to_le_bytes())?;
    out.write_all(&digest)?;

    // Sort children for a deterministic file; per-entry parent order is
    // preserved verbatim because the walker depends on it.
    let mut entries: Vec<(ObjectId, &[ObjectId])> = index.iter().collect();
    entries.sort_unstable_by_key(|(child, _)| *child);
    out.write_all(&(entries.len() as u32).to_le_bytes())?;
    for (child, parents) in entries {
        out.write_all(&child.0.to_le_bytes())?;
        out.write_all(&(parents.len() as u32).to_le_bytes())?;
        for parent in parents {
            out.write_all(&parent.0.to_le_bytes())?;
        }
    }
    out.finish()?.flush()?;

    info!(
        path = %path.display(),
        children = index.len(),
        edges = index.edge_count(),
        "cache.saved"
    );
    Ok(())
}

/// Loads the cached index for `snapshot_path` if it exists and verifies.
///
/// Returns `None` (after logging) when there is no cache, when the envelope
/// does not match the snapshot, or when the file cannot be decoded. The
/// caller rebuilds in every one of those cases.
pub fn load(snapshot_path: &Path) -> Option<ReverseIndex> {
    let path = cache_path(snapshot_path);
    if !path.exists() {
        debug!(path = %path.display(), "cache.absent");
        return None;
    }
    match try_load(&path, snapshot_path) {
        Ok(index) => {
            info!(
                path = %path.display(),
                children = index.len(),
                "cache.loaded"
            );
            Some(index)
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "cache.rejected");
            None
        }
    }
}

/// Loads the cache or rebuilds the index from the snapshot, saving the
/// rebuilt index for next time. Save failures are logged, not propagated.
pub fn load_or_build(
    graph: &dyn HeapGraph,
    snapshot_path: &Path,
) -> ReverseIndex {
    if let Some(index) = load(snapshot_path) {
        return index;
    }
    let index = build_reverse_index(graph);
    if let Err(err) = save(&index, snapshot_path) {
        warn!(error = %err, "cache.save_failed");
    }
    index
}

fn try_load(
    path: &Path,
    snapshot_path: &Path,
) -> Result<ReverseIndex, IndexError> {
    let (size, digest) = fingerprint(snapshot_path)?;
    let file = File::open(path)?;
    let mut input = GzDecoder::new(BufReader::new(file));

    let magic: [u8; 4] = read_array(&mut input)?;
    if magic != CACHE_MAGIC {
        return Err(IndexError::cache_mismatch("magic"));
    }
    let version = read_u32(&mut input)?;
    if version != CACHE_VERSION {
        return Err(IndexError::cache_mismatch("version"));
    }
    let cached_size = read_u64(&mut input)?;
    if cached_size != size {
        return Err(IndexError::cache_mismatch("snapshot size"));
    }
    let fingerprint_len = read_u32(&mut input)?;
    if fingerprint_len as usize != digest.len() {
        return Err(IndexError::cache_mismatch("fingerprint length"));
    }
    let cached_digest: [u8; 32] = read_array(&mut input)?;
    if cached_digest != digest {
        debug!(
            cached = %hex::encode(cached_digest),
            current = %hex::encode(digest),
            "fingerprint differs"
        );
        return Err(IndexError::cache_mismatch("fingerprint"));
    }

    let entry_count = read_u32(&mut input)?;
    let mut index = ReverseIndex::new();
    for _ in 0..entry_count {
        let child = ObjectId(read_u64(&mut input)?);
        let parent_count = read_u32(&mut input)?;
        for _ in 0..parent_count {
            index.push(child, ObjectId(read_u64(&mut input)?));
        }
    }
    Ok(index)
}

fn read_array<const N: usize>(
    input: &mut impl Read,
) -> Result<[u8; N], IndexError> {
    let mut bytes = [0u8; N];
    input.read_exact(&mut bytes)?;
    Ok(bytes)
}

fn read_u32(input: &mut impl Read) -> Result<u32, IndexError> {
    Ok(u32::from_le_bytes(read_array(input)?))
}

fn read_u64(input: &mut impl Read) -> Result<u64, IndexError> {
    Ok(u64::from_le_bytes(read_array(input)?))
}
