//! File-backed build record sink

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use appetize_publish::{BuildRecord, BuildRecordSink, PublishError};
use tracing::{debug, info};

/// Writes build records as JSON and exports their variables to an env file
#[derive(Debug, Clone)]
pub struct FileRecordSink {
    dir: PathBuf,
    env_file: Option<PathBuf>,
}

impl FileRecordSink {
    pub fn new(dir: impl Into<PathBuf>, env_file: Option<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            env_file,
        }
    }

    /// Path of the record for a build number
    pub fn record_path(&self, build_number: u64) -> PathBuf {
        self.dir.join(format!("build-{}.json", build_number))
    }

    /// Read back a previously attached record
    pub fn load(&self, build_number: u64) -> appetize_publish::Result<Option<BuildRecord>> {
        let path = self.record_path(build_number);
        if !path.exists() {
            return Ok(None);
        }
        read_record(&path).map(Some)
    }

    /// The record with the highest build number, if any
    pub fn latest(&self) -> appetize_publish::Result<Option<BuildRecord>> {
        if !self.dir.is_dir() {
            return Ok(None);
        }

        let mut newest: Option<u64> = None;
        for entry in std::fs::read_dir(&self.dir)? {
            let name = entry?.file_name();
            let number = name
                .to_str()
                .and_then(|n| n.strip_prefix("build-"))
                .and_then(|n| n.strip_suffix(".json"))
                .and_then(|n| n.parse::<u64>().ok());
            if let Some(number) = number {
                newest = newest.max(Some(number));
            }
        }

        match newest {
            Some(number) => {
                debug!(build = number, "latest build record");
                self.load(number)
            }
            None => Ok(None),
        }
    }

    fn append_env(&self, path: &Path, record: &BuildRecord) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        for (key, value) in record.env_vars() {
            writeln!(file, "{}={}", key, value)?;
        }
        Ok(())
    }
}

impl BuildRecordSink for FileRecordSink {
    fn attach(&self, record: &BuildRecord) -> appetize_publish::Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        let path = self.record_path(record.build_number);
        let content = serde_json::to_string_pretty(record)
            .map_err(|e| PublishError::Record(format!("failed to encode: {}", e)))?;
        std::fs::write(&path, content)?;
        info!(path = %path.display(), "saved build record");

        if let Some(env_file) = &self.env_file {
            self.append_env(env_file, record)?;
            debug!(path = %env_file.display(), "exported build variables");
        }

        Ok(())
    }
}

fn read_record(path: &Path) -> appetize_publish::Result<BuildRecord> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| PublishError::Record(format!("invalid record {}: {}", path.display(), e)))
}
