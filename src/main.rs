// src/main.rs

use cronguard::engine::EXIT_FATAL;
use cronguard::{cli, logging, run};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let code = match run_main().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("cronguard error: {err:?}");
            EXIT_FATAL
        }
    };
    std::process::exit(code);
}

async fn run_main() -> anyhow::Result<i32> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    Ok(run(args).await?)
}
