// src/main.rs

use buildrun::{cli, logging, run};

#[tokio::main]
async fn main() {
    match run_main().await {
        // The process finishes with the exit status of the child it ran.
        Ok(status) => std::process::exit(status),
        Err(err) => {
            eprintln!("buildrun error: {err}");
            std::process::exit(1);
        }
    }
}

async fn run_main() -> buildrun::errors::Result<i32> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
