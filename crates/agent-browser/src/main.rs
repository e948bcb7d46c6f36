use clap::CommandFactory;
use clap::Parser;
use clap_complete::generate;
use serde_json::json;

use agent_browser::commands::{Cli, Commands};
use agent_browser::handlers::call_and_print;
use agent_browser::lifecycle;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Daemon { options } => {
            let config = options.engine_config()?;
            agent_browser_daemon::run(config)?;
            Ok(())
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "agent-browser", &mut std::io::stdout());
            Ok(())
        }

        Commands::Start { url, options } => lifecycle::start(&options, url.as_deref()),
        Commands::Stop => lifecycle::stop(),
        Commands::Status => lifecycle::status(),

        Commands::Navigate { url } => Ok(call_and_print("navigate", vec![json!(url)])?),
        Commands::Back => Ok(call_and_print("back", vec![])?),
        Commands::Forward => Ok(call_and_print("forward", vec![])?),
        Commands::Refresh => Ok(call_and_print("refresh", vec![])?),

        Commands::Snapshot => Ok(call_and_print("snapshot", vec![])?),
        Commands::Tree => Ok(call_and_print("tree", vec![])?),
        Commands::Markdown => Ok(call_and_print("markdown", vec![])?),

        Commands::Click { target } => Ok(call_and_print("click", vec![json!(target)])?),
        Commands::Fill { target, value } => {
            Ok(call_and_print("fill", vec![json!(target), json!(value)])?)
        }
        Commands::Select { target, value } => {
            Ok(call_and_print("select", vec![json!(target), json!(value)])?)
        }
        Commands::Hover { target } => Ok(call_and_print("hover", vec![json!(target)])?),
        Commands::Type { text } => Ok(call_and_print("type", vec![json!(text)])?),

        Commands::Url => Ok(call_and_print("url", vec![])?),
        Commands::Title => Ok(call_and_print("title", vec![])?),
        Commands::Eval { expression } => Ok(call_and_print("eval", vec![json!(expression)])?),
        Commands::Screenshot { path } => {
            let args = match path {
                Some(path) => vec![json!(path)],
                None => vec![],
            };
            Ok(call_and_print("screenshot", args)?)
        }
        Commands::Stealth { profile } => Ok(call_and_print("stealth", vec![json!(profile)])?),

        Commands::Wait { selector, timeout } => {
            let mut args = vec![json!(selector)];
            if let Some(timeout) = timeout {
                args.push(json!(timeout));
            }
            Ok(call_and_print("wait", args)?)
        }
        Commands::WaitDownload { filename, timeout } => {
            let mut args = vec![json!(filename.unwrap_or_default())];
            if let Some(timeout) = timeout {
                args.push(json!(timeout));
            }
            Ok(call_and_print("wait_download", args)?)
        }
    }
}
