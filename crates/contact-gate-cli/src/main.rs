// crates/contact-gate-cli/src/main.rs
// ============================================================================
// Module: Contact Gate CLI Entry Point
// Description: Command dispatcher for the contact server and terminal form.
// Purpose: Provide a localized CLI to serve, check config, and submit forms.
// Dependencies: clap, contact-gate-cli, contact-gate-config, contact-gate-server, tokio.
// ============================================================================

//! ## Overview
//! `contact-gate serve` runs the HTTP backend, `contact-gate config check`
//! validates configuration, and `contact-gate submit` fills the contact form
//! from the terminal. All user-facing strings go through the message catalog
//! with an explicitly resolved locale.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use contact_gate_cli::client::ContactClient;
use contact_gate_cli::i18n::Locale;
use contact_gate_cli::presentation::FileTokenWidget;
use contact_gate_cli::presentation::StaticTokenWidget;
use contact_gate_cli::presentation::TokenWidget;
use contact_gate_cli::presentation::acquire_token;
use contact_gate_cli::presentation::feedback;
use contact_gate_cli::presentation::render;
use contact_gate_cli::t;
use contact_gate_config::ContactGateConfig;
use contact_gate_core::BoundedPoll;
use contact_gate_core::ContactResponse;
use contact_gate_core::PipelineResult;
use contact_gate_core::RawSubmission;
use contact_gate_core::validate_submission;
use contact_gate_server::ContactServer;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable selecting the output language.
const LANG_ENV: &str = "CONTACT_GATE_LANG";
/// Default contact service URL for `submit`.
const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080";
/// Default widget action label.
const DEFAULT_ACTION: &str = "contact";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "contact-gate", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Preferred output language (overrides `CONTACT_GATE_LANG`).
    #[arg(long, value_enum, value_name = "LANG", global = true)]
    lang: Option<LangArg>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the contact HTTP server.
    Serve(ConfigArgs),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Submit the contact form from the terminal.
    Submit(SubmitCommand),
}

/// Shared config path argument.
#[derive(Args, Debug)]
struct ConfigArgs {
    /// Optional config file path (defaults to contact-gate.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate configuration.
    Check(ConfigArgs),
}

/// Arguments for the `submit` command.
#[derive(Args, Debug)]
struct SubmitCommand {
    /// Contact service base URL.
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,
    /// Sender first name.
    #[arg(long)]
    first_name: String,
    /// Sender last name.
    #[arg(long)]
    last_name: String,
    /// Sender email address.
    #[arg(long)]
    email: String,
    /// Message subject.
    #[arg(long)]
    subject: String,
    /// Message body.
    #[arg(long)]
    message: String,
    /// Challenge answer (challenge-answer mode).
    #[arg(long, value_name = "ANSWER")]
    answer: Option<String>,
    /// Pre-minted CAPTCHA token (managed-token mode).
    #[arg(long, value_name = "TOKEN", conflicts_with = "token_file")]
    token: Option<String>,
    /// File an external widget writes the CAPTCHA token into (managed-token mode).
    #[arg(long, value_name = "PATH")]
    token_file: Option<PathBuf>,
    /// Unix epoch milliseconds when the form was opened.
    #[arg(long, value_name = "MS")]
    started_at: Option<i64>,
    /// Request timeout in milliseconds.
    #[arg(long, default_value_t = 20_000)]
    timeout_ms: u64,
}

/// Language options accepted by `--lang`.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum LangArg {
    /// English.
    En,
    /// Spanish.
    Es,
}

impl From<LangArg> for Locale {
    fn from(value: LangArg) -> Self {
        match value {
            LangArg::En => Self::En,
            LangArg::Es => Self::Es,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for localized error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a localized message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let env_lang = std::env::var(LANG_ENV).ok();
    let locale = resolve_locale(cli.lang, env_lang.as_deref())?;

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(locale, &t!(locale, "main.version", version = version))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        let mut command = <Cli as clap::CommandFactory>::command();
        command.print_help().map_err(|err| output_error(locale, "stdout", &err))?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Serve(args) => command_serve(locale, &args).await,
        Commands::Config {
            command: ConfigCommand::Check(args),
        } => command_config_check(locale, &args),
        Commands::Submit(command) => command_submit(locale, command).await,
    }
}

/// Resolves the output locale from the flag, then the environment.
fn resolve_locale(flag: Option<LangArg>, env_value: Option<&str>) -> CliResult<Locale> {
    if let Some(flag) = flag {
        return Ok(flag.into());
    }
    match env_value.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(Locale::En),
        Some(value) => Locale::parse(value).ok_or_else(|| {
            CliError::new(t!(Locale::En, "i18n.lang.invalid_env", env = LANG_ENV, value = value))
        }),
    }
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(locale: Locale, args: &ConfigArgs) -> CliResult<ExitCode> {
    let config = ContactGateConfig::load(args.config.as_deref())
        .map_err(|err| CliError::new(t!(locale, "config.load_failed", error = err)))?;
    let server = ContactServer::from_config(&config)
        .map_err(|err| CliError::new(t!(locale, "serve.init_failed", error = err)))?;
    write_stderr_line(locale, &t!(locale, "serve.listening", bind = server.bind_addr()))?;
    server.serve().await.map_err(|err| CliError::new(t!(locale, "serve.failed", error = err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Executes the `config check` command.
fn command_config_check(locale: Locale, args: &ConfigArgs) -> CliResult<ExitCode> {
    let config = ContactGateConfig::load(args.config.as_deref())
        .map_err(|err| CliError::new(t!(locale, "config.load_failed", error = err)))?;
    let status = |present: bool| {
        if present {
            t!(locale, "config.check.present")
        } else {
            t!(locale, "config.check.missing")
        }
    };
    write_stdout_line(locale, &t!(locale, "config.check.ok"))?;
    write_stdout_line(
        locale,
        &t!(locale, "config.check.captcha_mode", mode = config.captcha.mode.as_str()),
    )?;
    write_stdout_line(
        locale,
        &t!(locale, "config.check.email_key", status = status(config.email.key().is_some())),
    )?;
    write_stdout_line(
        locale,
        &t!(
            locale,
            "config.check.captcha_secret",
            status = status(config.captcha.secret().is_some())
        ),
    )?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Submit Command
// ============================================================================

/// Executes the `submit` command.
async fn command_submit(locale: Locale, command: SubmitCommand) -> CliResult<ExitCode> {
    let mut form = Map::new();
    form.insert("firstName".to_string(), Value::from(command.first_name.clone()));
    form.insert("lastName".to_string(), Value::from(command.last_name.clone()));
    form.insert("email".to_string(), Value::from(command.email.clone()));
    form.insert("subject".to_string(), Value::from(command.subject.clone()));
    form.insert("message".to_string(), Value::from(command.message.clone()));
    if let Some(started_at) = command.started_at {
        form.insert("formStartTime".to_string(), Value::from(started_at));
    }

    if let Err(issues) = validate_submission(&RawSubmission::from_json(Value::Object(form.clone())))
    {
        return show_feedback(locale, &PipelineResult::RejectedValidation(issues).to_response());
    }

    let client = ContactClient::new(&command.endpoint, Duration::from_millis(command.timeout_ms))
        .map_err(|err| CliError::new(t!(locale, "submit.failed", error = err)))?;
    let settings = client
        .captcha_settings()
        .await
        .map_err(|err| CliError::new(t!(locale, "submit.failed", error = err)))?;
    let proof = if settings.mode == "challenge_answer" {
        command
            .answer
            .clone()
            .ok_or_else(|| CliError::new(t!(locale, "submit.captcha.answer_required")))?
    } else {
        let widget: Box<dyn TokenWidget> = match (&command.token, &command.token_file) {
            (Some(token), _) => Box::new(StaticTokenWidget::new(token.clone())),
            (None, Some(path)) => Box::new(FileTokenWidget::new(path.clone())),
            (None, None) => {
                return Err(CliError::new(t!(locale, "submit.captcha.token_required")));
            }
        };
        let site_key = settings
            .site_key
            .as_deref()
            .ok_or_else(|| CliError::new(t!(locale, "submit.captcha.site_key_missing")))?;
        let action = settings.action.as_deref().unwrap_or(DEFAULT_ACTION);
        acquire_token(widget.as_ref(), site_key, action, BoundedPoll::default())
            .await
            .map_err(|_| CliError::new(t!(locale, "submit.captcha.widget_unavailable")))?
    };
    form.insert("captchaProof".to_string(), Value::from(proof));

    let response = client
        .submit(&Value::Object(form))
        .await
        .map_err(|err| CliError::new(t!(locale, "submit.failed", error = err)))?;
    show_feedback(locale, &response)
}

/// Prints feedback and maps it to an exit code.
fn show_feedback(locale: Locale, response: &ContactResponse) -> CliResult<ExitCode> {
    let outcome = feedback(response, locale);
    for line in render(&outcome, locale) {
        write_stdout_line(locale, &line)?;
    }
    Ok(if outcome.success { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a line to stdout.
fn write_stdout_line(locale: Locale, message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}").map_err(|err| output_error(locale, "stdout", &err))
}

/// Writes a line to stderr.
fn write_stderr_line(locale: Locale, message: &str) -> CliResult<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}").map_err(|err| output_error(locale, "stderr", &err))
}

/// Formats a localized output error.
fn output_error(locale: Locale, stream: &str, error: &std::io::Error) -> CliError {
    CliError::new(t!(locale, "output.write_failed", stream = stream, error = error))
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = writeln!(std::io::stderr(), "{message}");
    ExitCode::FAILURE
}

// ============================================================================
// SECTION: Tests
// ============================================================================
