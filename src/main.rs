use clap::Parser;

use betteraccounting::cli::{self, Cli, Commands};

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Reconcile {
            ledger,
            import,
            accept_all,
            json,
        } => cli::reconcile::run(&ledger, &import, accept_all, json),
        Commands::Predict {
            ledger,
            text,
            confidence,
            explain,
        } => cli::predict::run(&ledger, &text, confidence, explain),
        Commands::Suggest { ledger, json } => cli::suggest::run(&ledger, json),
        Commands::Settings {
            category_confidence,
            strict_category_confidence,
            tag_confidence,
            tag_relative_threshold,
        } => cli::settings::run(cli::settings::Changes {
            category_confidence,
            strict_category_confidence,
            tag_confidence,
            tag_relative_threshold,
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
