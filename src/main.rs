mod commands;

use std::io::IsTerminal;
use std::process::ExitCode;

use clap::Parser;
use tera::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use eco_collect::classify::StatusLine;
use eco_collect::components::history::{self, HistoryFilters, HISTORY_FAILED};
use eco_collect::components::upload::{CENTERS_UNAVAILABLE, SUBMIT_FAILED};
use eco_collect::components::verification::{APPROVE_FAILED, UPLOADS_FAILED};
use eco_collect::components::{CenterDirectory, UploadForm, VerificationReview};
use eco_collect::config::Config;
use eco_collect::error::CaptureError;
use eco_collect::state::AppState;
use eco_collect::templates::render;
use eco_collect::{Error, Result};

use commands::{Cli, Commands, HistoryArgs, UploadArgs, VerifyCommand};

const LOGIN_FAILED: &str = "Login failed. Check your email and password.";
const LOGOUT_FAILED: &str = "Failed to log out.";
const WHOAMI_FAILED: &str = "Could not reach the server.";
const SESSION_EXPIRED: &str = "Session expired. Please log in again.";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eco_collect=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let fallback = failure_message(&cli.command);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("{}", e.user_message(fallback));
            ExitCode::FAILURE
        }
    }
}

fn failure_message(command: &Commands) -> &'static str {
    match command {
        Commands::Login { .. } => LOGIN_FAILED,
        Commands::Logout => LOGOUT_FAILED,
        Commands::Whoami => WHOAMI_FAILED,
        Commands::Centers => CENTERS_UNAVAILABLE,
        Commands::Upload(_) => SUBMIT_FAILED,
        Commands::Verify(VerifyCommand::List) => UPLOADS_FAILED,
        Commands::Verify(VerifyCommand::Approve { .. }) => APPROVE_FAILED,
        Commands::History(_) => HISTORY_FAILED,
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::from_env()?;
    if let Some(url) = cli.api_url {
        config.api_base_url = url.trim_end_matches('/').to_string();
    }
    let state = AppState::new(config)?;

    match cli.command {
        Commands::Login { email, password } => run_login(&state, &email, &password).await,
        Commands::Logout => run_logout(&state).await,
        Commands::Whoami => run_whoami(&state).await,
        Commands::Centers => run_centers(&state).await,
        Commands::Upload(args) => run_upload(&state, args).await,
        Commands::Verify(VerifyCommand::List) => run_verify_list(&state).await,
        Commands::Verify(VerifyCommand::Approve { id }) => run_verify_approve(&state, id).await,
        Commands::History(args) => run_history(&state, args).await,
    }
}

async fn run_login(state: &AppState, email: &str, password: &str) -> Result<()> {
    let session = state.api.login(email, password).await?;
    state.sessions.save(&session).await?;
    let user = session.user();
    println!("Logged in as {} ({})", user.user_name, user.role);
    Ok(())
}

async fn run_logout(state: &AppState) -> Result<()> {
    let Some(session) = state.session().await? else {
        println!("Not logged in.");
        return Ok(());
    };
    let outcome = state.api.logout(session).await;
    // The local session is gone whether or not the server heard about it.
    state.sessions.clear().await?;
    outcome?;
    println!("Logged out.");
    Ok(())
}

async fn run_whoami(state: &AppState) -> Result<()> {
    let Some(session) = state.session().await? else {
        println!("Not logged in.");
        return Ok(());
    };
    match state.api.current_user(&session).await {
        Ok(Some(user)) => {
            println!("{} <{}>", user.user_name, user.email.as_deref().unwrap_or("-"));
            println!("Role:   {}", user.role);
            println!("Points: {}", user.point_score.unwrap_or(0));
            Ok(())
        }
        Ok(None) | Err(Error::Server { status: 401, .. }) => {
            state.sessions.clear().await?;
            println!("{}", SESSION_EXPIRED);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

async fn run_centers(state: &AppState) -> Result<()> {
    let session = state.session().await?;
    let centers = state.api.list_centers(session.as_ref()).await?;
    let mut ctx = Context::new();
    ctx.insert("centers", &centers);
    print!("{}", render("centers.txt", &ctx)?);
    Ok(())
}

/// Print rotating status text to stderr while a preview is in flight.
fn spawn_status_printer(mut rx: watch::Receiver<StatusLine>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let line = *rx.borrow_and_update();
            if let Some(text) = line.text {
                eprintln!("  {}", text);
            }
        }
    })
}

/// Ask for a value on an interactive terminal. `None` when stdin is not a
/// terminal or the user enters nothing.
async fn prompt(label: &str) -> Result<Option<String>> {
    if !std::io::stdin().is_terminal() {
        return Ok(None);
    }
    eprint!("{}: ", label);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    Ok(lines
        .next_line()
        .await?
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty()))
}

async fn run_upload(state: &AppState, args: UploadArgs) -> Result<()> {
    let session = state.session().await?;
    let mut form = UploadForm::new(state.config.status_interval);

    let printer = spawn_status_printer(form.preview().status().subscribe());
    let classified = if args.camera {
        match state.camera() {
            Some(camera) => {
                form.take_photo(&state.api, session.as_ref(), &camera, state.config.camera_settle)
                    .await
            }
            None => Err(CaptureError::CameraUnavailable {
                reason: "CAMERA_COMMAND is not set".to_string(),
            }
            .into()),
        }
    } else {
        form.select_file(&state.api, session.as_ref(), args.file.as_deref())
            .await
    };
    printer.abort();
    let classification = classified?;

    let mut ctx = Context::new();
    ctx.insert(
        "preview",
        form.preview_handle().map(|p| p.as_str()).unwrap_or("-"),
    );
    ctx.insert("category", &classification.category);
    ctx.insert("confidence", &classification.confidence_percent());
    print!("{}", render("classification.txt", &ctx)?);

    let weight = match args.weight {
        Some(w) => Some(w),
        None => prompt("Weight (kg)").await?,
    };
    let center = match args.center {
        Some(c) => Some(c),
        None => {
            form.load_centers(&state.api, session.as_ref()).await;
            if std::io::stdin().is_terminal() {
                let mut ctx = Context::new();
                ctx.insert("centers", form.centers());
                eprint!("{}", render("centers.txt", &ctx)?);
            }
            prompt("Collection center id").await?
        }
    };

    if weight.is_none() && center.is_none() {
        println!("Preview only. Pass --weight and --center to submit.");
        return Ok(());
    }
    form.set_weight(weight.unwrap_or_default());
    form.set_collection_center(center.unwrap_or_default());

    if form.centers().is_empty() {
        form.load_centers(&state.api, session.as_ref()).await;
    }
    let directory = CenterDirectory::from_centers(form.centers());

    let submission = form.submit(&state.api, session.as_ref()).await?;
    let mut ctx = Context::new();
    ctx.insert("notice", form.notice().unwrap_or_default());
    ctx.insert("id", &submission.id);
    ctx.insert(
        "category",
        submission
            .category
            .as_deref()
            .unwrap_or(&classification.category),
    );
    ctx.insert("weight", &submission.weight.unwrap_or_default());
    ctx.insert("center", directory.name(submission.centre_id));
    ctx.insert("points", &submission.points());
    print!("{}", render("submission.txt", &ctx)?);
    Ok(())
}

async fn run_verify_list(state: &AppState) -> Result<()> {
    let session = state.session().await?;
    let review = VerificationReview::load(&state.api, session.as_ref()).await?;
    let mut ctx = Context::new();
    ctx.insert("cards", &review.cards());
    ctx.insert("pending", &review.pending_count());
    print!("{}", render("verification.txt", &ctx)?);
    Ok(())
}

async fn run_verify_approve(state: &AppState, id: i64) -> Result<()> {
    let session = state.session().await?;
    let mut review = VerificationReview::load(&state.api, session.as_ref()).await?;
    match review.uploads().iter().find(|u| u.id == id) {
        None => {
            println!("Upload #{} not found.", id);
            return Ok(());
        }
        Some(u) if u.is_verified() => {
            println!("Upload #{} is already verified.", id);
            return Ok(());
        }
        Some(_) => {}
    }
    review.approve(&state.api, session.as_ref(), id).await?;
    println!(
        "Upload #{} verified. {} pending.",
        id,
        review.pending_count()
    );
    Ok(())
}

async fn run_history(state: &AppState, args: HistoryArgs) -> Result<()> {
    let session = state.require_session().await?;
    let filters = HistoryFilters {
        status: args.status,
        category: args.category.into(),
        page: args.page,
        limit: args.limit.unwrap_or(state.config.history_page_limit),
    };

    let view = history::load(&state.api, &session, &filters).await?;
    let centers = match state.api.list_centers(Some(&session)).await {
        Ok(centers) => CenterDirectory::from_centers(&centers),
        Err(e) => {
            tracing::warn!(error = %e, "center names unavailable for history");
            CenterDirectory::default()
        }
    };

    let rows: Vec<serde_json::Value> = view
        .page_items()
        .iter()
        .map(|entry| {
            serde_json::json!({
                "category": entry.category,
                "center": match entry.center {
                    Some(id) => centers.name(Some(id)).to_string(),
                    None => "Not assigned".to_string(),
                },
                "weight": entry.weight_kg,
                "status": entry.status.to_string(),
                "points": entry.points,
                "date": entry
                    .date
                    .map(|d| d.format("%d %b %Y").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            })
        })
        .collect();

    let mut ctx = Context::new();
    ctx.insert("stats", &view.stats);
    ctx.insert("pagination", &view.pagination);
    ctx.insert("rows", &rows);
    print!("{}", render("history.txt", &ctx)?);
    Ok(())
}
