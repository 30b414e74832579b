//! xmake lane CLI
//!
//! Entry point for the `xmake-build` command-line tool.

use clap::{Args, Parser, Subcommand};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use xmake_lane::build::BuildType;
use xmake_lane::config::{host_config_path, repo_config_path, ConfigError, EffectiveConfig, LaneSettings};
use xmake_lane::host::{Credentials, JenkinsConfig, JenkinsConnector};
use xmake_lane::job::{HttpJobFinder, JobNameRequest};
use xmake_lane::pipeline::{Pipeline, PipelineDeps, PipelineRequest};
use xmake_lane::projection::{HttpSbomFetcher, SbomFetcher, ENVIRONMENT_FILE};
use xmake_lane::report::DEFAULT_STEP_NAME;
use xmake_lane::summary::{summary_file_name, ErrorCategory, StepSummary};
use xmake_lane::workspace::Workspace;
use xmake_rules::RuleSet;

#[derive(Parser)]
#[command(name = "xmake-build")]
#[command(about = "Trigger, wait for and evaluate remote xmake builds", version)]
struct Cli {
    /// Debug logging (overridden by RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Directory reports and outputs are written to (default: current directory)
    #[arg(long, short = 'w', global = true)]
    workspace: Option<PathBuf>,

    /// Host config file (default: ~/.config/xmake-lane/config.toml)
    #[arg(long, global = true)]
    host_config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a stage build
    Stage {
        #[command(flatten)]
        build: BuildArgs,
    },

    /// Promote a staged build
    Promote {
        #[command(flatten)]
        build: BuildArgs,

        /// Staging repository to promote
        #[arg(long, env = "XMAKE_STAGING_REPOSITORY_ID")]
        staging_repository_id: String,
    },

    /// Match a local console log against the error rules
    ExplainLog {
        /// Console log file
        log: PathBuf,

        /// Rules file replacing the embedded rules
        #[arg(long)]
        rules: Option<PathBuf>,
    },

    /// Print the effective configuration (secrets redacted)
    Config,
}

#[derive(Args)]
struct BuildArgs {
    /// Owner of the source repository
    #[arg(long)]
    owner: String,

    /// Name of the source repository
    #[arg(long)]
    repository: String,

    /// Milestone or Release
    #[arg(long, default_value = "Milestone")]
    build_quality: String,

    /// Shipment type suffix of release jobs
    #[arg(long, default_value = "")]
    shipment_type: String,

    /// GitHub-Internal or GitHub-Tools
    #[arg(long, default_value = "GitHub-Internal")]
    job_name_pattern: String,

    /// Deprecated: concrete job name
    #[arg(long, default_value = "", hide = true)]
    xmake_job_name: String,

    /// Deprecated: job name template
    #[arg(long, default_value = "", hide = true)]
    xmake_job_name_template: String,

    /// Commit to build
    #[arg(long, env = "GIT_COMMIT")]
    commit_id: String,

    /// Additional `KEY=VALUE` job parameter (repeatable)
    #[arg(long = "job-parameter")]
    job_parameters: Vec<String>,

    #[arg(long, env = "XMAKE_USERNAME")]
    username: String,

    #[arg(long, env = "XMAKE_TOKEN", hide_env_values = true)]
    token: String,

    /// Job finder service URL
    #[arg(long)]
    job_finder_url: Option<String>,

    /// Glob restricting exported artifacts by file name
    #[arg(long)]
    artifact_pattern: Option<String>,

    /// Step name used for report and summary file names
    #[arg(long)]
    step_name: Option<String>,

    /// Milliseconds between two build polls
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Poll errors tolerated while waiting
    #[arg(long)]
    max_retries: Option<u32>,

    /// job_failure or downstreams
    #[arg(long)]
    diagnosis_strategy: Option<String>,

    /// Rules file replacing the embedded rules
    #[arg(long)]
    rules_file: Option<PathBuf>,

    /// Skip the SBOM download of raw repositories
    #[arg(long)]
    no_sbom: bool,
}

impl BuildArgs {
    /// Flags that were set, as a config layer
    fn overrides(&self) -> Value {
        let mut root = Map::new();
        let mut set = |section: &str, key: &str, value: Value| {
            let entry = root.entry(section.to_string()).or_insert_with(|| json!({}));
            if let Some(table) = entry.as_object_mut() {
                table.insert(key.to_string(), value);
            }
        };

        if let Some(url) = &self.job_finder_url {
            set("job_finder", "url", json!(url));
        }
        if let Some(pattern) = &self.artifact_pattern {
            set("artifact", "pattern", json!(pattern));
        }
        if let Some(step) = &self.step_name {
            set("reports", "step_name", json!(step));
        }
        if let Some(interval) = self.poll_interval_ms {
            set("poll", "interval_ms", json!(interval));
        }
        if let Some(retries) = self.max_retries {
            set("poll", "max_retries", json!(retries));
        }
        if let Some(strategy) = &self.diagnosis_strategy {
            set("diagnosis", "strategy", json!(strategy));
        }
        if let Some(rules) = &self.rules_file {
            set("diagnosis", "rules_file", json!(rules.to_string_lossy()));
        }
        if self.no_sbom {
            set("sbom", "download", json!(false));
        }
        Value::Object(root)
    }

    fn request(&self, build_type: BuildType, staging_repository_id: &str) -> PipelineRequest {
        PipelineRequest {
            build_type,
            job: JobNameRequest {
                owner: self.owner.clone(),
                repository: self.repository.clone(),
                quality: self.build_quality.clone(),
                shipment_type: self.shipment_type.clone(),
                pattern: self.job_name_pattern.clone(),
                legacy_job_name: self.xmake_job_name.clone(),
                legacy_job_name_template: self.xmake_job_name_template.clone(),
            },
            commit_id: self.commit_id.clone(),
            staging_repository_id: staging_repository_id.to_string(),
            job_parameters: self.job_parameters.clone(),
            credentials: Credentials::new(self.username.clone(), self.token.clone()),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let workspace = match &cli.workspace {
        Some(dir) => Workspace::new(dir),
        None => Workspace::current_dir(),
    };
    let host_config = cli.host_config.clone().or_else(host_config_path);

    let code = match cli.command {
        Commands::Stage { build } => run_build(&workspace, host_config.as_deref(), &build, BuildType::Stage, ""),
        Commands::Promote {
            build,
            staging_repository_id,
        } => run_build(
            &workspace,
            host_config.as_deref(),
            &build,
            BuildType::Promote,
            &staging_repository_id,
        ),
        Commands::ExplainLog { log, rules } => run_explain_log(&log, rules.as_deref()),
        Commands::Config => run_config(&workspace, host_config.as_deref()),
    };
    process::exit(code);
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(workspace: &Workspace, host_config: Option<&Path>, overrides: Option<Value>) -> Result<EffectiveConfig, ConfigError> {
    let repo_config = repo_config_path(workspace.root());
    EffectiveConfig::build(host_config, Some(&repo_config), overrides)
}

fn run_build(
    workspace: &Workspace,
    host_config: Option<&Path>,
    args: &BuildArgs,
    build_type: BuildType,
    staging_repository_id: &str,
) -> i32 {
    let fallback_step = args.step_name.clone().unwrap_or_else(|| DEFAULT_STEP_NAME.to_string());

    let settings = match load_config(workspace, host_config, Some(args.overrides()))
        .and_then(|config| LaneSettings::from_config(&config))
    {
        Ok(settings) => settings,
        Err(e) => return abort(workspace, &fallback_step, build_type, ErrorCategory::Configuration, &e.to_string()),
    };
    let rules = match settings.load_rules() {
        Ok(rules) => rules,
        Err(e) => return abort(workspace, &settings.step_name, build_type, ErrorCategory::Configuration, &e.to_string()),
    };

    let credentials = Credentials::new(args.username.clone(), args.token.clone());
    let finder = match HttpJobFinder::new(settings.job_finder_url.clone(), credentials, settings.http_timeout) {
        Ok(finder) => finder,
        Err(e) => return abort(workspace, &settings.step_name, build_type, ErrorCategory::Infrastructure, &e.to_string()),
    };
    let connector = match JenkinsConnector::new(JenkinsConfig {
        request_timeout: settings.http_timeout,
        ..JenkinsConfig::default()
    }) {
        Ok(connector) => connector,
        Err(e) => return abort(workspace, &settings.step_name, build_type, ErrorCategory::Infrastructure, &e.to_string()),
    };
    let sbom_fetcher = match HttpSbomFetcher::new(settings.http_timeout) {
        Ok(fetcher) => Some(fetcher),
        Err(e) => {
            tracing::warn!("SBOM download disabled: {}", e);
            None
        }
    };

    let step_name = settings.step_name.clone();
    let deps = PipelineDeps {
        finder: &finder,
        connector: &connector,
        sbom_fetcher: sbom_fetcher.as_ref().map(|f| f as &dyn SbomFetcher),
        rules: &rules,
        workspace,
    };
    let mut pipeline = Pipeline::new(deps, settings);
    let (result, summary) = pipeline.run_summarized(&args.request(build_type, staging_repository_id));

    if let Err(e) = workspace.write_json(ENVIRONMENT_FILE, pipeline.environment()) {
        tracing::warn!("failed to write {}: {}", ENVIRONMENT_FILE, e);
    }
    write_summary(workspace, &step_name, &summary);

    match result {
        Ok(outcome) => {
            tracing::info!("xmake {} build {} succeeded", build_type, outcome.build.url);
            0
        }
        Err(e) => {
            tracing::error!("{}", e);
            e.exit_code().as_i32()
        }
    }
}

fn abort(workspace: &Workspace, step_name: &str, build_type: BuildType, category: ErrorCategory, message: &str) -> i32 {
    tracing::error!("{}", message);
    let summary = StepSummary::failure(build_type, category, message.to_string(), 0);
    write_summary(workspace, step_name, &summary);
    summary.exit_code
}

fn write_summary(workspace: &Workspace, step_name: &str, summary: &StepSummary) {
    let file_name = summary_file_name(step_name);
    if let Err(e) = workspace.write_json(&file_name, summary) {
        tracing::warn!("failed to write {}: {}", file_name, e);
    }
}

fn run_explain_log(log: &Path, rules_file: Option<&Path>) -> i32 {
    let console = match fs::read(log) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            eprintln!("Error: failed to read {}: {}", log.display(), e);
            return ErrorCategory::Configuration.exit_code().as_i32();
        }
    };
    let rules = match rules_file {
        Some(path) => {
            let settings = LaneSettings {
                rules_file: Some(path.to_path_buf()),
                ..LaneSettings::default()
            };
            match settings.load_rules() {
                Ok(rules) => rules,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ErrorCategory::Configuration.exit_code().as_i32();
                }
            }
        }
        None => RuleSet::builtin(),
    };

    match rules.scan(&console) {
        Some(found) => {
            println!("{}", found.rule);
            println!("  line {}: {}", found.line_number, found.line.trim_end());
        }
        None => println!("No error rule matched"),
    }
    0
}

fn run_config(workspace: &Workspace, host_config: Option<&Path>) -> i32 {
    let config = match load_config(workspace, host_config, None) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ErrorCategory::Configuration.exit_code().as_i32();
        }
    };
    match config.to_json() {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ErrorCategory::Configuration.exit_code().as_i32()
        }
    }
}
