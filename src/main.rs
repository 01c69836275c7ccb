// src/main.rs

use schedgraph::errors::ScheduleError;
use schedgraph::{cli, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        let needs_repair = err
            .downcast_ref::<ScheduleError>()
            .is_some_and(ScheduleError::needs_repair);

        if needs_repair {
            eprintln!("schedgraph error: state needs repair: {err:?}");
            std::process::exit(3);
        }
        eprintln!("schedgraph error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
