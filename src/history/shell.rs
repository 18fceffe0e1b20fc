use std::io;
use std::path::Path;

/// The parts of the filesystem and OS shell the history core talks to.
///
/// Every probe is a point-in-time read; the file can change right after.
pub trait FileShell {
    /// True iff a regular file exists at `path`.
    fn exists(&self, path: &Path) -> bool;
    fn size(&self, path: &Path) -> io::Result<u64>;
    /// Open the file with its default application.
    fn open(&self, path: &Path) -> io::Result<()>;
    /// Show the file selected in the platform file manager.
    fn reveal(&self, path: &Path) -> io::Result<()>;
}

/// The real filesystem plus the platform opener.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemShell;

impl FileShell for SystemShell {
    fn exists(&self, path: &Path) -> bool {
        is_regular_file(path)
    }

    fn size(&self, path: &Path) -> io::Result<u64> {
        let meta = std::fs::metadata(path)?;
        if !meta.is_file() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"));
        }
        Ok(meta.len())
    }

    fn open(&self, path: &Path) -> io::Result<()> {
        opener::open(path).map_err(io::Error::other)
    }

    fn reveal(&self, path: &Path) -> io::Result<()> {
        opener::reveal(path).map_err(io::Error::other)
    }
}

pub(crate) fn is_regular_file(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_shell_probes() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("out.txt");
        std::fs::write(&file, b"hello world!").unwrap();

        let shell = SystemShell;
        assert!(shell.exists(&file));
        assert_eq!(shell.size(&file).unwrap(), 12);

        // Directories are not files.
        assert!(!shell.exists(dir.path()));
        assert!(shell.size(dir.path()).is_err());

        let gone = dir.path().join("gone.txt");
        assert!(!shell.exists(&gone));
        assert!(shell.size(&gone).is_err());
    }
}
