use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio_stream::wrappers::ReadDirStream;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub filename: String,
}

impl FileEntry {
    pub fn from_path(path: PathBuf) -> Option<Self> {
        let filename = path.file_name()?.to_string_lossy().to_string();
        Some(FileEntry { path, filename })
    }

    pub fn is_hidden(&self) -> bool {
        self.filename.starts_with('.')
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("not a file or directory: {0}")]
    Unsupported(PathBuf),
}

impl CoreError {
    fn read(path: &Path, source: std::io::Error) -> Self {
        CoreError::Read {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ListOptions {
    pub include_hidden: bool,
}

pub async fn read_dir_stream(path: &Path) -> Result<ReadDirStream, CoreError> {
    let reader = fs::read_dir(path)
        .await
        .map_err(|err| CoreError::read(path, err))?;
    Ok(ReadDirStream::new(reader))
}

/// Regular files directly inside `path`; subdirectories are not descended.
pub async fn list_dir(path: &Path, options: ListOptions) -> Result<Vec<FileEntry>, CoreError> {
    let mut stream = read_dir_stream(path).await?;
    let mut entries = Vec::new();
    while let Some(entry) = stream.next().await {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(dir = %path.display(), error = %err, "skipping unreadable entry");
                continue;
            }
        };
        let is_file = match entry.file_type().await {
            Ok(file_type) => file_type.is_file(),
            Err(_) => false,
        };
        if !is_file {
            continue;
        }
        let Some(file_entry) = FileEntry::from_path(entry.path()) else {
            continue;
        };
        if file_entry.is_hidden() && !options.include_hidden {
            continue;
        }
        entries.push(file_entry);
    }
    debug!(dir = %path.display(), count = entries.len(), "listed directory");
    Ok(entries)
}

/// Reads one path per line. Blank lines and `#` comments are ignored and
/// relative paths resolve against the list file's directory.
pub async fn load_list(path: &Path) -> Result<Vec<PathBuf>, CoreError> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|err| CoreError::read(path, err))?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    Ok(parse_list(&content, base))
}

fn parse_list(content: &str, base: &Path) -> Vec<PathBuf> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            let candidate = PathBuf::from(line);
            if candidate.is_absolute() {
                candidate
            } else {
                base.join(candidate)
            }
        })
        .collect()
}

/// Expands directories, keeps files, drops duplicate paths and sorts by name.
pub async fn collect_entries(
    paths: &[PathBuf],
    options: ListOptions,
) -> Result<Vec<FileEntry>, CoreError> {
    let mut entries = Vec::new();
    for path in paths {
        let metadata = fs::metadata(path)
            .await
            .map_err(|err| CoreError::read(path, err))?;
        if metadata.is_dir() {
            entries.extend(list_dir(path, options).await?);
        } else if metadata.is_file() {
            let entry = FileEntry::from_path(path.clone())
                .ok_or_else(|| CoreError::Unsupported(path.clone()))?;
            entries.push(entry);
        } else {
            return Err(CoreError::Unsupported(path.clone()));
        }
    }
    let mut seen = HashSet::new();
    entries.retain(|entry| seen.insert(entry.path.clone()));
    sort_entries(&mut entries);
    Ok(entries)
}

pub fn sort_entries(entries: &mut [FileEntry]) {
    entries.sort_by(|a, b| {
        a.filename
            .to_ascii_lowercase()
            .cmp(&b.filename.to_ascii_lowercase())
            .then_with(|| a.path.cmp(&b.path))
    });
}

pub async fn rename_path(src: &Path, dest: &Path) -> std::io::Result<()> {
    fs::rename(src, dest).await
}

pub async fn copy_path(src: &Path, dest: &Path) -> std::io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::copy(src, dest).await.map(|_| ())
}
