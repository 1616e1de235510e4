//! Walks the configured roots and feeds [`TestJob`] records to the engine
//! over a bounded channel, concurrently with test execution.

use std::path::{Path, PathBuf};
use std::sync::mpsc;

use crate::error::Error;

const CHANNEL_CAPACITY: usize = 10;

pub struct TestJob {
    pub path: PathBuf,
    pub content: Result<Vec<u8>, Error>,
}

/// Spawn a discovery thread over `roots`, returning the receiving end of its
/// output channel. The sender is dropped (closing the channel) once every
/// root has been walked.
pub fn discover(roots: Vec<PathBuf>, extension: String) -> mpsc::Receiver<TestJob> {
    let (tx, rx) = mpsc::sync_channel(CHANNEL_CAPACITY);
    std::thread::spawn(move || {
        for root in roots {
            walk_root(&root, &extension, &tx);
        }
    });
    rx
}

fn walk_root(root: &Path, extension: &str, tx: &mpsc::SyncSender<TestJob>) {
    let meta = match std::fs::symlink_metadata(root) {
        Ok(meta) => meta,
        Err(e) => {
            let _ = tx.send(error_job(root, format!("{}: {e}", root.display())));
            return;
        }
    };

    if meta.is_file() {
        let _ = tx.send(read_job(root));
        return;
    }

    if meta.is_dir() {
        walk_dir(root, extension, tx);
        return;
    }

    let _ = tx.send(error_job(
        root,
        format!("{}: not a regular file or directory", root.display()),
    ));
}

fn walk_dir(dir: &Path, extension: &str, tx: &mpsc::SyncSender<TestJob>) {
    let walker = walkdir::WalkDir::new(dir).sort_by_file_name();
    for entry in walker {
        match entry {
            Ok(entry) => {
                if !entry.file_type().is_file() {
                    continue;
                }
                let name = entry.file_name().to_string_lossy();
                if name.ends_with(extension) {
                    let _ = tx.send(read_job(entry.path()));
                }
            }
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
                let _ = tx.send(error_job(&path, format!("{}: {e}", path.display())));
            }
        }
    }
}

fn read_job(path: &Path) -> TestJob {
    tracing::trace!(path = %path.display(), "discovered test file");
    let content = std::fs::read(path).map_err(|e| Error::other(format!("{}: {e}", path.display())));
    TestJob {
        path: path.to_path_buf(),
        content,
    }
}

fn error_job(path: &Path, message: String) -> TestJob {
    TestJob {
        path: path.to_path_buf(),
        content: Err(Error::other(message)),
    }
}
