use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use zezployee::agent::create_reader;
use zezployee::config::{AgentMode, AppConfig};
use zezployee::platform::github::GitHubPlatform;
use zezployee::platform::Platform;
use zezployee::selector;
use zezployee::workflow::{IssuePipeline, PipelineSettings, WorkflowOutcome};
use zezployee::workspace::GitWorkspace;

#[derive(Parser)]
#[command(
    name = "zezployee",
    about = "Select a GitHub issue and solve it with Claude Code"
)]
struct Cli {
    /// GitHub token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Work on this issue number instead of picking interactively
    #[arg(short, long)]
    issue: Option<u64>,

    /// Wait for a single JSON result instead of streaming events
    #[arg(long)]
    batch: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref(), cli.token)?;
    if cli.batch {
        config.agent.mode = AgentMode::Batch;
    }

    let workspace = GitWorkspace::new(&config.workspace, &config.github);
    if !workspace.path().join(".git").exists() {
        anyhow::bail!(
            "Must be run from a git repository root (looked in {})",
            workspace.path().display()
        );
    }

    let remote_url = workspace.remote_url().await?;
    let platform = GitHubPlatform::new(&config.github, &remote_url)?;

    let repo = platform.repo_info().await?;
    println!("Repository: {}", repo.full_name);

    let issues = platform.list_open_issues().await?;
    if issues.is_empty() {
        println!("No open issues found.");
        return Ok(());
    }

    let selected = match cli.issue {
        Some(number) => match selector::find_issue(&issues, number) {
            Some(issue) => issue,
            None => anyhow::bail!("Issue #{number} is not an open issue in {}", repo.full_name),
        },
        None => {
            let stdin = std::io::stdin();
            let mut input = stdin.lock();
            let mut output = std::io::stdout();
            match selector::select_issue(&issues, chrono::Utc::now(), &mut input, &mut output)? {
                Some(issue) => issue,
                None => {
                    println!("No issue selected.");
                    return Ok(());
                }
            }
        }
    };

    println!("Selected issue #{}: {}", selected.number, selected.title);
    tracing::info!(
        issue = selected.number,
        mode = ?config.agent.mode,
        max_turns = config.agent.max_turns,
        "Starting pipeline"
    );

    let reader = create_reader(&config.agent);
    let mut pipeline = IssuePipeline::new(
        &platform,
        &workspace,
        reader.as_ref(),
        PipelineSettings::from_config(&config),
    );

    match pipeline.run(&selected).await? {
        WorkflowOutcome::Published {
            pr_url,
            cost_usd,
            turn_count,
            ..
        } => {
            println!("Cost: ${cost_usd:.4}");
            println!("Turns: {turn_count}");
            println!("Pull request created: {pr_url}");
            println!("Issue #{} closed", selected.number);
            Ok(())
        }
        WorkflowOutcome::Aborted { reason, .. } => {
            eprintln!("Agent failed: {reason}");
            eprintln!(
                "Branch issue-{} was left in place for inspection",
                selected.number
            );
            std::process::exit(1);
        }
    }
}
