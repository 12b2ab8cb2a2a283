//! Common types for the publish pipeline

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PublishError;

/// Tag sent with every update so the service can tell where uploads come from
pub const SOURCE_TAG: &str = "appetize-jenkins-plugin";

/// Target platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// iOS simulator build (`.app` directory, zipped before upload)
    Ios,
    /// Android package (`.apk` file, uploaded as-is)
    Android,
}

impl Platform {
    /// Wire value used by the remote service
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Android => "android",
        }
    }

    /// Whether the artifact for this platform is a directory bundle
    pub fn is_bundle(&self) -> bool {
        matches!(self, Platform::Ios)
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Ios => write!(f, "iOS"),
            Platform::Android => write!(f, "Android"),
        }
    }
}

impl FromStr for Platform {
    type Err = PublishError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("ios") {
            Ok(Platform::Ios)
        } else if s.eq_ignore_ascii_case("android") {
            Ok(Platform::Android)
        } else {
            Err(PublishError::Validation(format!("Invalid platform {}", s)))
        }
    }
}

/// Inputs for a single publish run
///
/// `platform` is kept as the raw configured value; it is parsed during
/// validation so that an unknown platform fails before any network call.
#[derive(Debug, Clone)]
pub struct PublishRequest {
    /// Configured platform ("ios" or "android", any case)
    pub platform: String,
    /// App path relative to the workspace root
    pub app_path: String,
    /// Credential reference; `None`, empty or the placeholder id select the placeholder token
    pub credential_ref: Option<String>,
    /// Build number of the triggering build
    pub build_number: u64,
    /// Name of the project being built
    pub project_name: String,
    /// Persisted identifier of this host instance
    pub instance_id: String,
    /// Workspace root that `app_path` is resolved against
    pub workspace: PathBuf,
}

/// Upload URLs returned by the presign endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUrls {
    /// Upload URL for iOS bundles
    pub ios_url: String,
    /// Upload URL for Android packages
    pub android_url: String,
}

impl PresignedUrls {
    /// Select the upload URL for a platform
    pub fn url_for(&self, platform: Platform) -> &str {
        match platform {
            Platform::Ios => &self.ios_url,
            Platform::Android => &self.android_url,
        }
    }
}

/// Body of the app update call
#[derive(Debug, Clone, Serialize)]
pub struct UpdateRequest {
    /// Presigned URL the artifact was uploaded to
    pub url: String,
    pub platform: Platform,
    /// API token
    pub token: String,
    /// Always null: the service derives the record from the job identifier
    #[serde(rename = "privateKey")]
    pub private_key: Option<String>,
    pub source: String,
    #[serde(rename = "jenkinsUUID")]
    pub instance_id: String,
    #[serde(rename = "jobUUID")]
    pub job_id: String,
    #[serde(rename = "buildNumber")]
    pub build_number: u64,
}

/// Remote app record returned by the update call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResult {
    #[serde(rename = "publicKey")]
    pub public_key: String,
    #[serde(rename = "privateKey", default)]
    pub private_key: Option<String>,
    #[serde(rename = "publicURL")]
    pub public_url: String,
    #[serde(rename = "appURL", default)]
    pub app_url: Option<String>,
    #[serde(rename = "manageURL")]
    pub manage_url: String,
}

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validating,
    ResolvingCredentials,
    FetchingPresignedUrls,
    Packaging,
    Uploading,
    DerivingJobId,
    UpdatingRecord,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Validating => "validating",
            Stage::ResolvingCredentials => "resolving credentials",
            Stage::FetchingPresignedUrls => "fetching upload URLs",
            Stage::Packaging => "packaging",
            Stage::Uploading => "uploading",
            Stage::DerivingJobId => "deriving job identifier",
            Stage::UpdatingRecord => "updating app record",
        };
        f.write_str(name)
    }
}

/// Terminal value of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PublishOutcome {
    /// App record created or updated
    Success { platform: Platform, result: UpdateResult },
    /// The run stopped at `stage`
    Failure { stage: Stage, reason: String },
}

impl PublishOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PublishOutcome::Success { .. })
    }
}
