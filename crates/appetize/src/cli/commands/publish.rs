//! Publish command

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use console::style;
use tracing::{info, warn};

use appetize_core::{ConfiguredProxyResolver, FileCredentialStore, FileRecordSink, InstanceId};
use appetize_publish::{
    AppRecord, AppetizeApi, BuildLog, BuildRecord, BuildRecordSink, CancellationToken,
    PublishOutcome, PublishPipeline, PublishRequest, Stage, TracingLog, TransportClient,
};

use crate::cli::{output, Cli, OutputFormat};
use crate::exit_codes;

/// Publish a build to Appetize.io
#[derive(Debug, Args)]
pub struct PublishCommand {
    /// Target platform (ios or android)
    #[arg(long, env = "APPETIZE_PLATFORM")]
    pub platform: String,

    /// Simulator .app directory or .apk file, relative to the workspace
    #[arg(long, env = "APPETIZE_APP_PATH")]
    pub app_path: String,

    /// Stored credential id (placeholder token when omitted)
    #[arg(long, env = "APPETIZE_CREDENTIAL")]
    pub credential: Option<String>,

    /// Build number
    #[arg(long, env = "BUILD_NUMBER")]
    pub build_number: u64,

    /// Project (job) name
    #[arg(long, env = "JOB_NAME")]
    pub project: String,

    /// Workspace directory (defaults to the working directory)
    #[arg(long, env = "WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Override the API host from configuration
    #[arg(long, env = "APPETIZE_API_URL")]
    pub api_url: Option<String>,

    /// Exit non-zero when the publish fails
    #[arg(long)]
    pub strict: bool,
}

/// Build console that mirrors pipeline lines to the terminal
struct ConsoleLog {
    inner: TracingLog,
}

impl BuildLog for ConsoleLog {
    fn println(&self, line: &str) {
        self.inner.println(line);
        println!("{} {}", style("→").blue(), line);
    }
}

/// Host setup that failed before the pipeline could start
struct SetupFailure {
    stage: Stage,
    error: anyhow::Error,
}

fn failed_at<E: Into<anyhow::Error>>(stage: Stage) -> impl FnOnce(E) -> SetupFailure {
    move |e| SetupFailure {
        stage,
        error: e.into(),
    }
}

/// Everything a run needs once configuration has been applied
struct Prepared {
    pipeline: PublishPipeline,
    request: PublishRequest,
    records: FileRecordSink,
}

impl PublishCommand {
    /// Execute the publish command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<i32> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.run(cli))
    }

    async fn run(&self, cli: &Cli) -> anyhow::Result<i32> {
        info!(
            platform = %self.platform,
            app_path = %self.app_path,
            build = self.build_number,
            "executing publish command"
        );

        let log: Arc<dyn BuildLog> = if cli.show_progress() {
            Arc::new(ConsoleLog { inner: TracingLog })
        } else {
            Arc::new(TracingLog)
        };
        let cancel = CancellationToken::new();

        let (outcome, record_path) = match self.prepare(cli, log.clone(), &cancel) {
            Ok(prepared) => {
                let watcher = tokio::spawn(cancel_on_ctrl_c(cancel.clone()));
                let outcome = prepared.pipeline.run(&prepared.request).await;
                watcher.abort();

                let record_path = self.save_record(&outcome, &prepared.records);
                (outcome, record_path)
            }
            Err(SetupFailure { stage, error }) => {
                let reason = format!("{:#}", error);
                warn!(%stage, error = %reason, "publish setup failed");
                log.println(&format!("Appetize.io publish failed while {}: {}", stage, reason));
                (PublishOutcome::Failure { stage, reason }, None)
            }
        };

        match cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            }
            OutputFormat::Text => {
                if !cli.quiet {
                    print_outcome(&outcome, record_path.as_deref());
                }
            }
        }

        if outcome.is_success() || !self.strict {
            return Ok(exit_codes::SUCCESS);
        }
        if cancel.is_cancelled() {
            return Ok(exit_codes::CANCELLED);
        }
        Ok(exit_codes::PUBLISH_FAILED)
    }

    /// Apply configuration and build the pipeline
    fn prepare(
        &self,
        cli: &Cli,
        log: Arc<dyn BuildLog>,
        cancel: &CancellationToken,
    ) -> Result<Prepared, SetupFailure> {
        let config = cli.load_config().map_err(failed_at(Stage::Validating))?;
        let workspace = match &self.workspace {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().map_err(failed_at(Stage::Validating))?,
        };

        let state_dir = config.state_dir().map_err(failed_at(Stage::Validating))?;
        let instance =
            InstanceId::load_or_create(&state_dir).map_err(failed_at(Stage::Validating))?;
        let proxies = Arc::new(ConfiguredProxyResolver::new(&config.proxy));
        let transport = TransportClient::new(&config.api.transport(), proxies)
            .map_err(failed_at(Stage::Validating))?;
        let credentials_file = config
            .credentials_file()
            .map_err(failed_at(Stage::ResolvingCredentials))?;

        let base_url = self
            .api_url
            .clone()
            .unwrap_or_else(|| config.api.base_url.clone());
        let api = AppetizeApi::with_base_url(transport, base_url, log.clone());
        let credentials = Arc::new(FileCredentialStore::new(credentials_file));

        if cli.verbose && cli.show_progress() {
            println!("{}", output::key_value("API", api.base_url()));
            println!("{}", output::key_value("Instance", instance.as_str()));
            println!(
                "{}",
                output::key_value(
                    "Credentials",
                    &output::path_style()
                        .apply_to(credentials.path().display())
                        .to_string()
                )
            );
        }

        let records = FileRecordSink::new(
            config.records.dir_in(&workspace),
            config.records.env_file(),
        );
        let pipeline =
            PublishPipeline::new(api, credentials, log).with_cancellation(cancel.clone());
        let request = PublishRequest {
            platform: self.platform.clone(),
            app_path: self.app_path.clone(),
            credential_ref: self.credential.clone(),
            build_number: self.build_number,
            project_name: self.project.clone(),
            instance_id: instance.to_string(),
            workspace,
        };

        Ok(Prepared {
            pipeline,
            request,
            records,
        })
    }

    /// Persist the record of a successful publish
    fn save_record(&self, outcome: &PublishOutcome, records: &FileRecordSink) -> Option<PathBuf> {
        let PublishOutcome::Success { platform, result } = outcome else {
            return None;
        };

        let app = AppRecord::from_update(*platform, result);
        let record = BuildRecord::new(app, self.build_number);
        match records.attach(&record) {
            Ok(()) => Some(records.record_path(self.build_number)),
            Err(e) => {
                warn!(error = %e, "failed to save build record");
                output::warning(&format!("Could not save build record: {}", e));
                None
            }
        }
    }
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        warn!("interrupt received, cancelling publish");
        cancel.cancel();
    }
}

fn print_outcome(outcome: &PublishOutcome, record_path: Option<&std::path::Path>) {
    match outcome {
        PublishOutcome::Success { platform, result } => {
            println!();
            output::success(&format!("Published {} build", platform));
            println!(
                "{}",
                output::key_value(
                    "Public URL",
                    &output::url_style().apply_to(&result.public_url).to_string()
                )
            );
            println!(
                "{}",
                output::key_value(
                    "Manage URL",
                    &output::url_style().apply_to(&result.manage_url).to_string()
                )
            );
            if let Some(path) = record_path {
                println!(
                    "{}",
                    output::key_value(
                        "Record",
                        &output::path_style().apply_to(path.display()).to_string()
                    )
                );
            }
        }
        PublishOutcome::Failure { stage, reason } => {
            println!();
            output::error(&format!("Publish failed while {}: {}", stage, reason));
        }
    }
}
