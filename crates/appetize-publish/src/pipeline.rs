//! Publish pipeline
//!
//! One run per build: validate, resolve the API token, fetch presigned URLs,
//! package, upload, derive the job identifier, and update the app record.
//! Every stage runs once; the first failure ends the run.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::api::AppetizeApi;
use crate::credentials::CredentialResolver;
use crate::error::{PublishError, Result};
use crate::job_id::derive_job_id;
use crate::packager::ArtifactPackager;
use crate::traits::{BuildLog, CredentialStore};
use crate::types::{
    Platform, PublishOutcome, PublishRequest, Stage, UpdateRequest, UpdateResult, SOURCE_TAG,
};

/// Orchestrates a single publish
pub struct PublishPipeline {
    api: AppetizeApi,
    credentials: Arc<dyn CredentialStore>,
    log: Arc<dyn BuildLog>,
    cancel: CancellationToken,
    temp_dir: Option<PathBuf>,
}

impl PublishPipeline {
    pub fn new(
        api: AppetizeApi,
        credentials: Arc<dyn CredentialStore>,
        log: Arc<dyn BuildLog>,
    ) -> Self {
        Self {
            api,
            credentials,
            log,
            cancel: CancellationToken::new(),
            temp_dir: None,
        }
    }

    /// Observe the surrounding build's cancellation between stages
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Directory for temporary bundle archives
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Run the pipeline to completion
    ///
    /// Never returns an error: every failure is logged and folded into
    /// [`PublishOutcome::Failure`].
    #[instrument(skip_all, fields(project = %request.project_name, build = request.build_number))]
    pub async fn run(&self, request: &PublishRequest) -> PublishOutcome {
        let mut stage = Stage::Validating;

        match self.execute(request, &mut stage).await {
            Ok((platform, result)) => {
                info!(%platform, public_url = %result.public_url, "published");
                self.log.println("Success uploading to Appetize.io");
                self.log
                    .println(&format!("You can view your app at {}", result.public_url));
                self.log
                    .println(&format!("You can manage your app at {}", result.manage_url));
                PublishOutcome::Success { platform, result }
            }
            Err(e) => {
                warn!(%stage, error = %e, "publish failed");
                self.log
                    .println(&format!("Appetize.io publish failed while {}: {}", stage, e));
                PublishOutcome::Failure {
                    stage,
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn execute(
        &self,
        request: &PublishRequest,
        stage: &mut Stage,
    ) -> Result<(Platform, UpdateResult)> {
        self.enter(stage, Stage::Validating)?;
        let platform: Platform = request.platform.parse()?;
        let mut packager = ArtifactPackager::new(&request.workspace);
        if let Some(dir) = &self.temp_dir {
            packager = packager.with_temp_dir(dir);
        }
        let app_path = packager.locate(&request.app_path, platform)?;

        self.enter(stage, Stage::ResolvingCredentials)?;
        let token = CredentialResolver::new(self.credentials.as_ref())
            .resolve(request.credential_ref.as_deref())?;

        self.enter(stage, Stage::FetchingPresignedUrls)?;
        let urls = self.cancellable(self.api.presign()).await?;

        self.enter(stage, Stage::Packaging)?;
        let upload_url = urls.url_for(platform).to_string();
        let artifact = packager.package(&app_path, platform).await?;

        // The archive is released when `artifact` drops, on every path out of here,
        // including a cancelled upload.
        self.enter(stage, Stage::Uploading)?;
        self.cancellable(self.api.upload(&artifact, &upload_url)).await?;
        drop(artifact);

        self.enter(stage, Stage::DerivingJobId)?;
        let job_id = derive_job_id(&request.instance_id, &request.project_name);
        debug!(job_id = %job_id, "derived job identifier");

        self.enter(stage, Stage::UpdatingRecord)?;
        let update = UpdateRequest {
            url: upload_url,
            platform,
            token,
            private_key: None,
            source: SOURCE_TAG.to_string(),
            instance_id: request.instance_id.clone(),
            job_id,
            build_number: request.build_number,
        };
        let result = self.cancellable(self.api.update(&update)).await?;

        Ok((platform, result))
    }

    /// Abandon a network call as soon as the build is cancelled
    async fn cancellable<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!("cancelled during network call");
                Err(PublishError::Cancelled)
            }
            result = call => result,
        }
    }

    fn enter(&self, current: &mut Stage, next: Stage) -> Result<()> {
        *current = next;
        if self.cancel.is_cancelled() {
            return Err(PublishError::Cancelled);
        }
        debug!(stage = %next, "entering stage");
        Ok(())
    }
}
