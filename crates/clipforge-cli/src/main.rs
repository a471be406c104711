//! Clipforge CLI: command-line client for the Clipforge API.
//!
//! Set CLIPFORGE_API_URL (or API_URL). Auth is a bearer token from
//! CLIPFORGE_API_TOKEN, or a session opened in-process with `--email`
//! (password from CLIPFORGE_PASSWORD or a prompt).

use anyhow::Context;
use clap::{Parser, Subcommand};
use clipforge_api_client::ApiClient;
use clipforge_cli::{init_tracing, print_json, progress_line, SettingsOverrides};
use clipforge_core::models::{ChangePasswordRequest, LoginRequest, RegisterRequest};
use clipforge_core::ClientConfig;
use clipforge_storage::StateStores;
use clipforge_upload::{UploadSessionController, UploadSnapshot};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Parser)]
#[command(name = "clipforge", about = "Clipforge API CLI")]
struct Cli {
    /// Log in with this email before running the command
    #[arg(long = "email", global = true)]
    session_email: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check credentials and open a session
    Login {
        /// Account email
        email: String,
    },
    /// Create an account
    Register {
        /// Account email
        email: String,
    },
    /// End the current session
    Logout,
    /// Show the current account (email, plan, credits)
    Me,
    /// Change the account password
    Password,
    /// Upload a video and wait for its clips
    Upload {
        /// Path to the video file
        file: PathBuf,
        #[command(flatten)]
        settings: SettingsOverrides,
    },
    /// Resume polling the job of an interrupted upload
    Resume,
    /// Get a job by ID
    Job {
        /// Job ID
        id: i64,
    },
    /// List generated clips
    Clips {
        /// Only clips of this upload
        #[arg(long, conflicts_with = "grouped")]
        upload_id: Option<i64>,
        /// Group clips by source upload
        #[arg(long)]
        grouped: bool,
    },
    /// Output settings used for uploads
    Settings {
        #[command(subcommand)]
        sub: SettingsCommands,
    },
    /// Forget the stored upload session
    Reset,
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Print stored settings
    Show,
    /// Update stored settings
    Set {
        #[command(flatten)]
        settings: SettingsOverrides,
    },
}

/// Read a secret from `env_var`, falling back to a prompt on stderr.
fn read_secret(env_var: &str, prompt: &str) -> anyhow::Result<String> {
    if let Ok(value) = std::env::var(env_var) {
        if !value.is_empty() {
            return Ok(value);
        }
    }

    eprint!("{}: ", prompt);
    std::io::stderr().flush().ok();
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn login(client: &ApiClient, email: &str) -> anyhow::Result<()> {
    let password = read_secret("CLIPFORGE_PASSWORD", "Password")?;
    client
        .login(&LoginRequest {
            email: email.to_string(),
            password,
        })
        .await
        .context("Login failed")?;
    tracing::info!(email = %email, "Logged in");
    Ok(())
}

/// Print a progress line whenever the upload snapshot changes.
fn spawn_progress_printer(mut rx: watch::Receiver<UploadSnapshot>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut last = String::new();
        while rx.changed().await.is_ok() {
            let snapshot = rx.borrow_and_update().clone();
            let line = progress_line(&snapshot);
            if line != last {
                eprintln!("{}", line);
                last = line;
            }
            if snapshot.state.is_terminal() {
                break;
            }
        }
    })
}

/// Run `fut` to completion; Ctrl-C cancels the controller and waits for it to settle.
async fn run_cancellable<T>(
    controller: &UploadSessionController,
    fut: impl std::future::Future<Output = T>,
) -> T {
    tokio::pin!(fut);
    tokio::select! {
        result = &mut fut => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, canceling upload");
            controller.cancel();
            fut.await
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ClientConfig::from_env().context("Invalid configuration")?;
    init_tracing(config.log_format);

    let client = Arc::new(ApiClient::from_config(&config).context(
        "Failed to create API client. Check CLIPFORGE_API_URL (or API_URL)",
    )?);
    let stores = StateStores::from_config(&config)
        .await
        .context("Failed to open client state")?;

    if let Some(email) = &cli.session_email {
        login(&client, email).await?;
    }

    match cli.command {
        Commands::Login { email } => {
            login(&client, &email).await?;
            let account = client.me().await.context("Fetch account")?;
            print_json(&account)?;
        }
        Commands::Register { email } => {
            let password = read_secret("CLIPFORGE_PASSWORD", "Choose a password")?;
            let response = client
                .register_account(&RegisterRequest { email, password })
                .await?;
            print_json(&response)?;
        }
        Commands::Logout => {
            client.logout().await?;
            print_json(&serde_json::json!({ "ok": true }))?;
        }
        Commands::Me => {
            let account = client.me().await?;
            print_json(&account)?;
        }
        Commands::Password => {
            let current_password = read_secret("CLIPFORGE_PASSWORD", "Current password")?;
            let new_password = read_secret("CLIPFORGE_NEW_PASSWORD", "New password")?;
            let response = client
                .change_password(&ChangePasswordRequest {
                    current_password,
                    new_password,
                })
                .await?;
            print_json(&response)?;
        }
        Commands::Upload { file, settings } => {
            let stored = stores
                .settings
                .load()
                .await
                .context("Load output settings")?
                .unwrap_or_default();
            let output = settings.apply(stored);
            if !settings.is_empty() {
                stores
                    .settings
                    .save(&output)
                    .await
                    .context("Save output settings")?;
            }

            let account = client
                .me()
                .await
                .context("Fetch account (log in with --email or set CLIPFORGE_API_TOKEN)")?;

            let controller =
                UploadSessionController::new(client.clone(), Arc::clone(&stores.session));
            let printer = spawn_progress_printer(controller.subscribe());

            controller.select_file(&file).await?;
            let result =
                run_cancellable(&controller, controller.start_upload(&output, &account.plan))
                    .await;
            drop(controller);
            printer.await.ok();

            let job = result?;
            let clips = client.list_clips(job.upload_id).await?;
            print_json(&serde_json::json!({ "job": job, "clips": clips }))?;
        }
        Commands::Resume => {
            let controller =
                UploadSessionController::new(client.clone(), Arc::clone(&stores.session));
            let printer = spawn_progress_printer(controller.subscribe());

            let result = run_cancellable(&controller, controller.resume()).await;
            drop(controller);
            printer.await.ok();

            match result? {
                Some(job) => {
                    let clips = client.list_clips(job.upload_id).await?;
                    print_json(&serde_json::json!({ "job": job, "clips": clips }))?;
                }
                None => print_json(&serde_json::json!({ "resumed": false }))?,
            }
        }
        Commands::Job { id } => {
            let job = client.get_job(id).await?;
            print_json(&job)?;
        }
        Commands::Clips { upload_id, grouped } => match upload_id {
            Some(upload_id) => print_json(&client.list_clips(upload_id).await?)?,
            None if grouped => print_json(&client.list_grouped_clips().await?)?,
            None => anyhow::bail!("Pass --upload-id <ID> or --grouped"),
        },
        Commands::Settings { sub } => match sub {
            SettingsCommands::Show => {
                let settings = stores
                    .settings
                    .load()
                    .await
                    .context("Load output settings")?
                    .unwrap_or_default();
                print_json(&settings)?;
            }
            SettingsCommands::Set { settings } => {
                let stored = stores
                    .settings
                    .load()
                    .await
                    .context("Load output settings")?
                    .unwrap_or_default();
                let updated = settings.apply(stored);
                stores
                    .settings
                    .save(&updated)
                    .await
                    .context("Save output settings")?;
                print_json(&updated)?;
            }
        },
        Commands::Reset => {
            let controller =
                UploadSessionController::new(client.clone(), Arc::clone(&stores.session));
            controller.reset().await?;
            print_json(&serde_json::json!({ "ok": true }))?;
        }
    }

    Ok(())
}
