use clap::Parser;

use courier::cli::{self, Args};
use courier::logging;
use courier::status::ExitStatus;

#[tokio::main]
async fn main() -> ExitStatus {
    let args = Args::parse();
    logging::init(args.verbose, args.log_json);

    cli::run(args).await
}
