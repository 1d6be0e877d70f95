use buy_or_rent::api::{self, ScenarioArgs};
use buy_or_rent::log::init_logging;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "buy-or-rent",
    version,
    about = "Compare 30-year wealth from buying a home against renting and investing the proceeds"
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Project both paths year by year and print the result as JSON
    Project(ScenarioArgs),
    /// Print the stamp duty due on a purchase price
    StampDuty {
        #[arg(allow_hyphen_values = true)]
        price: f64,
    },
    /// Serve the HTTP API
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Project(args) => api::project_command(args).map(|out| println!("{out}")),
        Commands::StampDuty { price } => api::stamp_duty_command(price).map(|out| println!("{out}")),
        Commands::Serve { port } => api::run_http_server(port)
            .await
            .map_err(|e| format!("Server error: {e}")),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "buy-or-rent failed");
        std::process::exit(1);
    }
}
