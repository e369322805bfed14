use anyhow::Result;
use clap::{Parser, Subcommand};

use rapidxcel_logistics::app::SERVICE_NAME;
use rapidxcel_logistics::commands::{self, CreateUserArgs};
use rapidxcel_logistics::logging::init_logging;
use rapidxcel_logistics::models::Role;
use rapidxcel_logistics::server::{run_server, ServeOptions};
use rapidxcel_logistics::AppConfig;

#[derive(Parser)]
#[command(name = "rapidxcel-logistics")]
#[command(about = "RapidXcel logistics backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API (default command)
    Serve {
        /// Host to bind
        #[arg(short = 'H', long, env = "RAPIDXCEL_HOST")]
        host: Option<String>,

        /// Port to bind
        #[arg(short, long, env = "RAPIDXCEL_PORT")]
        port: Option<u16>,
    },

    /// Create the instance directory and run migrations
    InitDb,

    /// Create the default accounts if no users exist
    Seed,

    /// Create a user account
    CreateUser {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long, env = "RAPIDXCEL_NEW_USER_PASSWORD")]
        password: String,

        /// admin, customer, supplier or courier
        #[arg(long, default_value = "customer")]
        role: Role,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load(None)?;
    let _guards = init_logging(&config.log_dir, SERVICE_NAME)?;

    match cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
    }) {
        Commands::Serve { host, port } => run_server(ServeOptions { host, port }).await?,
        Commands::InitDb => {
            commands::init_db(&config).await?;
            println!("Initialized the database at {}", config.database_url);
        }
        Commands::Seed => {
            let report = commands::seed(&config).await?;
            println!(
                "Seeded {} user(s) and {} supplier(s)",
                report.users_created, report.suppliers_created
            );
        }
        Commands::CreateUser {
            username,
            email,
            password,
            role,
        } => {
            let user = commands::create_user(
                &config,
                CreateUserArgs {
                    username,
                    email,
                    password,
                    role,
                },
            )
            .await?;
            println!("Created {} user {} (id {})", user.role, user.username, user.id);
        }
    }

    Ok(())
}
