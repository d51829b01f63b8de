use clap::Parser;

use studycore_server::args::Args;
use studycore_server::run;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt().with_env_filter(args.log_level.as_filter()).init();

    if let Err(err) = run(args).await {
        tracing::error!(%err, "study orchestration core exited with an error");
        std::process::exit(1);
    }
}
