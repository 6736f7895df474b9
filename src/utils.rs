/*!
 * Utility functions for backutil
 */

use std::io;
use std::path::Path;

use walkdir::WalkDir;

/// Count regular files under `dir` for progress tracking
pub fn count_files(dir: &Path) -> io::Result<u64> {
    let mut count = 0;

    for entry in WalkDir::new(dir) {
        if entry.map_err(io::Error::from)?.file_type().is_file() {
            count += 1;
        }
    }

    Ok(count)
}

/// Format a human-readable file size
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::tempdir;

    #[test]
    fn test_count_files_ignores_directories() -> io::Result<()> {
        let temp_dir = tempdir()?;
        fs::create_dir_all(temp_dir.path().join("a").join("b"))?;
        File::create(temp_dir.path().join("one"))?;
        File::create(temp_dir.path().join("a").join("two"))?;
        File::create(temp_dir.path().join("a").join("b").join("three"))?;

        assert_eq!(count_files(temp_dir.path())?, 3);
        Ok(())
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(512), "512 bytes");
        assert_eq!(format_file_size(1536), "1.50 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3.00 GB");
    }
}
