use clap::Parser;
use quickmail::app;
use quickmail::cli::{handle_token_clear, Cli};
use quickmail::logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let config = cli.config();

    if cli.clear_token {
        handle_token_clear(&config)?;
        return Ok(());
    }

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut out = std::io::stdout();

    // Credential failures end up here and terminate the process.
    app::run(&config, &mut input, &mut out).await?;
    Ok(())
}
