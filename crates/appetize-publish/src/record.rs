//! App and build records produced by a successful publish

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Platform, UpdateResult};

/// Environment variable carrying the app's public key
pub const ENV_PUBLIC_KEY: &str = "APPETIZEIO_PUBLIC_KEY";
/// Environment variable carrying the app's private key
pub const ENV_PRIVATE_KEY: &str = "APPETIZEIO_PRIVATE_KEY";
/// Environment variable carrying the public app URL
pub const ENV_PUBLIC_URL: &str = "APPETIZEIO_PUBLIC_URL";
/// Environment variable carrying the manage URL
pub const ENV_MANAGE_URL: &str = "APPETIZEIO_MANAGE_URL";

const EMBED_BASE: &str = "https://appetize.io/embed";

/// Current keys and URLs of a remote app record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRecord {
    pub platform: Platform,
    pub private_key: Option<String>,
    pub public_key: String,
    pub public_url: String,
    pub manage_url: String,
}

impl AppRecord {
    pub fn from_update(platform: Platform, result: &UpdateResult) -> Self {
        Self {
            platform,
            private_key: result.private_key.clone(),
            public_key: result.public_key.clone(),
            public_url: result.public_url.clone(),
            manage_url: result.manage_url.clone(),
        }
    }

    /// Iframe snippet embedding the app in a device frame
    ///
    /// Empty when the record has no private key.
    pub fn embed_html(&self) -> String {
        if self.private_key.is_none() {
            return String::new();
        }

        let (device, width, height) = match self.platform {
            Platform::Ios => ("iphone", "284px", "600px"),
            Platform::Android => ("nexus5", "300px", "597px"),
        };

        let source = format!(
            "{}/{}?device={}&scale=75&autoplay=false&orientation=portrait&deviceColor=black",
            EMBED_BASE, self.public_key, device
        );

        format!(
            "<iframe src=\"{}\" width=\"{}\" height=\"{}\" frameborder=\"0\" scrolling=\"no\"></iframe>",
            source, width, height
        )
    }
}

/// An app record attached to the build that published it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRecord {
    pub app: AppRecord,
    pub build_number: u64,
    pub published_at: DateTime<Utc>,
}

impl BuildRecord {
    pub fn new(app: AppRecord, build_number: u64) -> Self {
        Self {
            app,
            build_number,
            published_at: Utc::now(),
        }
    }

    /// Variables exposed to later build stages
    pub fn env_vars(&self) -> Vec<(&'static str, String)> {
        vec![
            (ENV_PUBLIC_KEY, self.app.public_key.clone()),
            (
                ENV_PRIVATE_KEY,
                self.app.private_key.clone().unwrap_or_default(),
            ),
            (ENV_PUBLIC_URL, self.app.public_url.clone()),
            (ENV_MANAGE_URL, self.app.manage_url.clone()),
        ]
    }
}
