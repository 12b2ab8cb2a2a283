//! Artifact packaging
//!
//! iOS builds are `.app` directories and are zipped into a temporary archive
//! before upload. Android builds are single `.apk` files and are uploaded
//! as they are.

use std::fs::File;
use std::io::{self, Seek, Write};
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tracing::{debug, info, instrument};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{PublishError, Result};
use crate::types::Platform;

/// An artifact ready to upload
///
/// A temporary archive is deleted when this value is dropped.
#[derive(Debug)]
pub struct PackagedArtifact {
    path: PathBuf,
    len: u64,
    temp: Option<TempPath>,
}

impl PackagedArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the file is a temporary archive owned by this value
    pub fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }

    /// Open the artifact for streaming
    pub async fn open(&self) -> Result<tokio::fs::File> {
        Ok(tokio::fs::File::open(&self.path).await?)
    }
}

/// Locates and packages build artifacts inside a workspace
#[derive(Debug, Clone)]
pub struct ArtifactPackager {
    workspace: PathBuf,
    temp_dir: Option<PathBuf>,
}

impl ArtifactPackager {
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        Self {
            workspace: workspace.into(),
            temp_dir: None,
        }
    }

    /// Create temporary archives in `dir` instead of the system temp dir
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Resolve `app_path` and check it has the shape `platform` expects
    pub fn locate(&self, app_path: &str, platform: Platform) -> Result<PathBuf> {
        if app_path.trim().is_empty() {
            return Err(PublishError::Validation("Empty appPath".to_string()));
        }

        let path = self.workspace.join(app_path);
        let found = match platform {
            Platform::Ios => path.is_dir(),
            Platform::Android => path.is_file(),
        };

        if !found {
            return Err(PublishError::ArtifactNotFound(path));
        }

        debug!(path = %path.display(), %platform, "located artifact");
        Ok(path)
    }

    /// Produce the uploadable artifact for a located path
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn package(&self, path: &Path, platform: Platform) -> Result<PackagedArtifact> {
        if !platform.is_bundle() {
            let metadata = tokio::fs::metadata(path)
                .await
                .map_err(|_| PublishError::ArtifactNotFound(path.to_path_buf()))?;
            if !metadata.is_file() {
                return Err(PublishError::ArtifactNotFound(path.to_path_buf()));
            }
            return Ok(PackagedArtifact {
                path: path.to_path_buf(),
                len: metadata.len(),
                temp: None,
            });
        }

        if !path.is_dir() {
            return Err(PublishError::ArtifactNotFound(path.to_path_buf()));
        }

        let source = path.to_path_buf();
        let temp_dir = self.temp_dir.clone();
        let temp = tokio::task::spawn_blocking(move || zip_bundle(&source, temp_dir.as_deref()))
            .await
            .map_err(|e| PublishError::Packaging(format!("archiving task failed: {}", e)))??;

        let len = std::fs::metadata(&temp)?.len();
        info!(archive = %temp.display(), bytes = len, "created bundle archive");

        Ok(PackagedArtifact {
            path: temp.to_path_buf(),
            len,
            temp: Some(temp),
        })
    }
}

/// Zip `source` into a new temporary file
///
/// Entries are rooted at the bundle directory name (`MyApp.app/...`).
fn zip_bundle(source: &Path, temp_dir: Option<&Path>) -> Result<TempPath> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("appetize").suffix(".zip");
    let temp = match temp_dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .map_err(|e| PublishError::Packaging(format!("failed to create temporary file: {}", e)))?;

    let root_name = source
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("bundle")
        .to_string();

    let mut zip = ZipWriter::new(temp);
    write_entries(&mut zip, source, &root_name)
        .map_err(|e| PublishError::Packaging(e.to_string()))?;

    let temp = zip
        .finish()
        .map_err(|e| PublishError::Packaging(e.to_string()))?;

    Ok(temp.into_temp_path())
}

fn write_entries<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    source: &Path,
    root_name: &str,
) -> io::Result<()> {
    let mut entries = 0usize;

    for entry in WalkDir::new(source).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(io::Error::other)?;

        let mut name = root_name.to_string();
        for component in relative.components() {
            name.push('/');
            name.push_str(&component.as_os_str().to_string_lossy());
        }

        let metadata = entry.path().symlink_metadata()?;
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(unix_mode(&metadata));

        let file_type = entry.file_type();
        if file_type.is_symlink() {
            let target = std::fs::read_link(entry.path())?;
            zip.add_symlink(name, target.to_string_lossy(), options)
                .map_err(io::Error::other)?;
        } else if file_type.is_dir() {
            zip.add_directory(format!("{}/", name), options)
                .map_err(io::Error::other)?;
        } else {
            zip.start_file(name, options).map_err(io::Error::other)?;
            let mut file = File::open(entry.path())?;
            io::copy(&mut file, zip)?;
        }
        entries += 1;
    }

    debug!(entries, "wrote archive entries");
    Ok(())
}

#[cfg(unix)]
fn unix_mode(metadata: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn unix_mode(metadata: &std::fs::Metadata) -> u32 {
    if metadata.is_dir() {
        0o755
    } else {
        0o644
    }
}
