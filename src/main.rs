//! Howtank build notifier
//!
//! Run as a post-build step: tells a Howtank stream how the build went.
//! Delivery problems are logged but never fail the build.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use howtank_notifier::config::Config;
use howtank_notifier::models::{
    BuildContext, BuildOutcome, BuildResult, NotificationConfig, NotificationSettings,
};
use howtank_notifier::services::{BuildNotifier, BuildTokenExpander, DeliveryStatus};

/// Howtank stream notifier for build pipelines
#[derive(Parser)]
#[command(name = "howtank-notify")]
#[command(version)]
#[command(about = "Post build outcomes to a Howtank stream")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to configuration file (TOML)
    #[arg(short, long, env = "HOWTANK_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    build: BuildArgs,

    #[command(flatten)]
    settings: SettingsArgs,

    /// Add mode=expert to the API command
    #[arg(long, global = true)]
    expert_mode: bool,

    /// Print the request instead of sending it
    #[arg(long, global = true)]
    dry_run: bool,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// Evaluate triggers and send the notification (default)
    Send,
    /// Only report whether the build would be notified
    Check,
}

#[derive(Args)]
struct BuildArgs {
    /// Result of this build (SUCCESS, UNSTABLE, FAILURE, NOT_BUILT, ABORTED)
    #[arg(short, long, global = true)]
    result: Option<BuildResult>,

    /// Result of the previous build of the same job
    #[arg(short, long, global = true)]
    previous_result: Option<BuildResult>,

    #[arg(long, env = "JOB_NAME", global = true)]
    job_name: Option<String>,

    #[arg(long, env = "BUILD_NUMBER", global = true)]
    build_number: Option<u64>,

    #[arg(long, env = "BUILD_URL", global = true)]
    build_url: Option<String>,

    #[arg(long, env = "WORKSPACE", global = true)]
    workspace: Option<String>,

    /// Extra placeholder value, KEY=VALUE (repeatable)
    #[arg(long = "var", value_parser = parse_var, global = true)]
    vars: Vec<(String, String)>,
}

#[derive(Args)]
struct SettingsArgs {
    /// Howtank stream to post to
    #[arg(long, global = true)]
    stream_id: Option<String>,

    /// Message template, e.g. "${JOB_NAME} #${BUILD_NUMBER}: ${BUILD_STATUS}"
    #[arg(short, long, global = true)]
    message: Option<String>,

    /// Bearer token or id:<credential-id>
    #[arg(long, global = true)]
    access_token: Option<String>,

    #[arg(long, global = true)]
    notify_aborted: bool,

    #[arg(long, global = true)]
    notify_failure: bool,

    #[arg(long, global = true)]
    notify_not_built: bool,

    #[arg(long, global = true)]
    notify_success: bool,

    #[arg(long, global = true)]
    notify_unstable: bool,

    #[arg(long, global = true)]
    notify_back_to_normal: bool,
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

impl BuildArgs {
    fn context(&self) -> BuildContext {
        let mut context = BuildContext::new(BuildOutcome::new(self.result, self.previous_result));
        context.job_name = self.job_name.clone();
        context.build_number = self.build_number;
        context.build_url = self.build_url.clone();
        context.workspace = self.workspace.clone();
        context.variables.extend(self.vars.iter().cloned());
        context
    }
}

impl SettingsArgs {
    fn to_settings(&self) -> NotificationSettings {
        NotificationSettings {
            stream_id: self.stream_id.clone(),
            message: self.message.clone(),
            access_token: self.access_token.clone(),
            notify_aborted: self.notify_aborted,
            notify_failure: self.notify_failure,
            notify_not_built: self.notify_not_built,
            notify_success: self.notify_success,
            notify_unstable: self.notify_unstable,
            notify_back_to_normal: self.notify_back_to_normal,
        }
    }
}

async fn send(
    config: &Config,
    notification: &NotificationConfig,
    context: &BuildContext,
    dry_run: bool,
) -> anyhow::Result<()> {
    let notifier = BuildNotifier::new(config.dispatcher()?, BuildTokenExpander);

    if dry_run {
        if !notifier.should_send(notification, &context.outcome) {
            println!("Notification will not be sent to Howtank for this build");
            return Ok(());
        }
        let message = notifier.render(notification, context);
        let url = notifier
            .dispatcher()
            .request_url(&notification.stream_id, &message)?;
        println!("POST {}", url);
        println!("{}", message);
        return Ok(());
    }

    let resolver = config.credential_resolver();
    let result = notifier.notify(notification, context, &resolver).await;

    match result.status {
        DeliveryStatus::Sent => log::info!("Notification delivered to stream {}", notification.stream_id),
        DeliveryStatus::Failed => log::warn!(
            "Notification not delivered: {}",
            result.error_message.as_deref().unwrap_or("unknown error")
        ),
        DeliveryStatus::Skipped => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if cli.expert_mode {
        config.api.expert_mode = true;
    }
    config.notification = std::mem::take(&mut config.notification).merge(cli.settings.to_settings());

    let notification = config.resolve_notification().map_err(|e| {
        log::error!("{}", e);
        e
    })?;
    let context = cli.build.context();

    match cli.command.unwrap_or(Commands::Send) {
        Commands::Check => {
            let notify = howtank_notifier::services::should_notify_or_default(
                &notification.triggers,
                &context.outcome,
            );
            println!("{}", if notify { "notify" } else { "skip" });
        }
        Commands::Send => send(&config, &notification, &context, cli.dry_run).await?,
    }

    Ok(())
}
