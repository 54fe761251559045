use clap::Parser;
use tracing_subscriber::EnvFilter;

use causerie::core::app::{bootstrap, AppInitConfig};
use causerie::core::config::Config;
use causerie::ui::chat_loop::run_chat;

#[derive(Parser)]
#[command(name = "causerie")]
#[command(about = "A terminal chat interface for the Gemini API")]
#[command(
    long_about = "Causerie is a full-screen terminal chat interface for the Google Gemini API. \
It supports streaming responses, multiple named sessions, personality presets, and \
tunable generation settings.\n\n\
Environment Variables:\n\
  GEMINI_API_KEY    Your Gemini API key (also settable in config.toml)\n\n\
Controls:\n\
  Type              Enter your message in the input field\n\
  Enter             Send the message (or run a /command)\n\
  Up/Down/Mouse     Scroll through chat history\n\
  Alt+1..4          Pick a starter prompt while the session is empty\n\
  Ctrl+C            Quit"
)]
struct Args {
    #[arg(short, long, help = "Model to chat with")]
    model: Option<String>,

    #[arg(short, long, help = "Personality preset to start with")]
    personality: Option<String>,

    #[arg(long, help = "Append the transcript to this file")]
    log: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::load()?;

    let (app, rx) = bootstrap(
        AppInitConfig {
            model: args.model,
            personality: args.personality,
            log_file: args.log,
        },
        &config,
    )?;

    run_chat(app, rx).await
}
