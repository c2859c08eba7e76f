//! Transcript archiving.
//!
//! Transcripts land in a `messages/` directory under the working directory,
//! one file per fetch, never overwriting: `messages.txt`, `messages1.txt`,
//! `messages2.txt`, ...

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Default archive directory, relative to the working directory.
pub const ARCHIVE_DIR: &str = "messages";

fn file_name(index: u32) -> String {
    if index == 0 {
        "messages.txt".to_string()
    } else {
        format!("messages{index}.txt")
    }
}

/// Write `lines` (chronological order) to the first free file name in `dir`.
///
/// Returns the path written. Uses `create_new` so a concurrent writer can
/// never be clobbered; on collision the next name is tried.
pub fn write_transcript(dir: &Path, lines: &[String]) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let mut index = 0u32;
    loop {
        let path = dir.join(file_name(index));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                for line in lines {
                    file.write_all(line.as_bytes())?;
                    file.write_all(b"\n")?;
                }
                return Ok(path);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                index = index.checked_add(1).ok_or_else(|| {
                    io::Error::other("archive directory has no free file name")
                })?;
            }
            Err(e) => return Err(e),
        }
    }
}
