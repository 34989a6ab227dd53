//! Channel-list state files.
//!
//! Layout: `b"scc-state"`, the writer's snapshot version as a little-endian `u32`, then the raw
//! channel list bytes.

use k051649::{SnapshotError, K051649, SNAPSHOT_LEN, SNAPSHOT_MIN_VERSION};
use std::fs::File;
use std::io;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use thiserror::Error;

const FILE_PREFIX: &[u8; 9] = b"scc-state";

#[derive(Debug, Error)]
pub enum StateFileError {
    #[error("I/O error accessing state file: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
    #[error("not an SCC state file")]
    BadPrefix,
    #[error(
        "state version {version:06X} is older than the minimum supported {min:06X}",
        min = SNAPSHOT_MIN_VERSION
    )]
    UnsupportedVersion { version: u32 },
    #[error("error restoring channel list: {source}")]
    Restore {
        #[from]
        source: SnapshotError,
    },
}

/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_state(chip: &K051649, path: &Path) -> Result<(), StateFileError> {
    let snapshot = chip.snapshot_describe();

    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(FILE_PREFIX)?;
    writer.write_all(&snapshot.min_version.to_le_bytes())?;
    writer.write_all(snapshot.data)?;
    writer.flush()?;

    log::info!("Saved {} state to '{}'", snapshot.name, path.display());

    Ok(())
}

/// # Errors
///
/// Returns an error if the file cannot be read, has the wrong header or version, or its channel
/// list has the wrong length.
pub fn load_state(chip: &mut K051649, path: &Path) -> Result<(), StateFileError> {
    let mut reader = BufReader::new(File::open(path)?);

    let mut prefix = [0; FILE_PREFIX.len()];
    reader.read_exact(&mut prefix).map_err(truncated_as_bad_prefix)?;
    if &prefix != FILE_PREFIX {
        return Err(StateFileError::BadPrefix);
    }

    let mut version = [0; 4];
    reader.read_exact(&mut version).map_err(truncated_as_bad_prefix)?;
    let version = u32::from_le_bytes(version);
    if version < SNAPSHOT_MIN_VERSION {
        return Err(StateFileError::UnsupportedVersion { version });
    }

    let mut data = Vec::with_capacity(SNAPSHOT_LEN);
    reader.read_to_end(&mut data)?;
    chip.restore_snapshot(&data)?;

    log::info!("Loaded state version {version:06X} from '{}'", path.display());

    Ok(())
}

fn truncated_as_bad_prefix(err: io::Error) -> StateFileError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        StateFileError::BadPrefix
    } else {
        StateFileError::Io { source: err }
    }
}
