// src/main.rs

use poolrun::{cli, exit_code, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();
    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("poolrun error: {err:?}");
        std::process::exit(1);
    }

    let result = run(args).await;
    if let Err(err) = &result {
        eprintln!("poolrun error: {err}");
    }
    std::process::exit(exit_code(&result));
}
