use std::env;

use orchestrator::{AgentConfig, AppContext, CancellationToken, Orchestrator};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "orchestrator=info,agent_tools=info";

const USAGE: &str = "Usage: berlin-agent [--tools] [--trace] [QUERY...]

With no QUERY, queries are read from stdin, one per line.

Options:
  --tools    Print the tool definitions as JSON and exit
  --trace    Print the full response (answer, outcome and trace) as JSON
  --help     Show this message";

struct Args {
    tools: bool,
    trace: bool,
    help: bool,
    query: Option<String>,
}

fn parse_args() -> Args {
    let mut args = Args {
        tools: false,
        trace: false,
        help: false,
        query: None,
    };
    let mut words = Vec::new();

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--tools" => args.tools = true,
            "--trace" => args.trace = true,
            "-h" | "--help" => args.help = true,
            _ => words.push(arg),
        }
    }

    if !words.is_empty() {
        args.query = Some(words.join(" "));
    }
    args
}

async fn answer(
    orchestrator: &Orchestrator,
    query: &str,
    trace: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            on_interrupt.cancel();
        }
    });

    let response = orchestrator.run_cancellable(query, cancel).await;
    watcher.abort();

    if trace {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}", response.answer);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args();
    if args.help {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = AgentConfig::from_env()?;
    let context = AppContext::load(&config)?;

    if args.tools {
        let definitions = context.registry().definitions();
        println!("{}", serde_json::to_string_pretty(&definitions)?);
        return Ok(());
    }

    let orchestrator = Orchestrator::from_context(&context);
    info!(
        max_iterations = config.max_iterations,
        tool_timeout_ms = config.tool_timeout.as_millis() as u64,
        "Agent ready"
    );

    if let Some(query) = args.query {
        return answer(&orchestrator, &query, args.trace).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        answer(&orchestrator, line, args.trace).await?;
    }

    Ok(())
}
