use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use negocio_api::{
    config,
    db,
    migrator::Migrator,
    services::empleados::{CrearEmpleado, EmpleadoService},
};
use sea_orm_migration::MigratorTrait;
use tracing::info;

#[derive(Parser)]
#[command(name = "migration", about = "Schema management for negocio-api", version)]
struct Cli {
    /// Overrides `database_url` from the loaded configuration
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending migrations
    Up {
        #[arg(long)]
        steps: Option<u32>,
    },
    /// Roll back applied migrations (one step by default)
    Down {
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
    /// Show applied and pending migrations
    Status,
    /// Drop every table and re-apply all migrations
    Fresh,
    /// Create the first gerente so the API has someone to authenticate
    SeedGerente(SeedGerente),
}

#[derive(Args)]
struct SeedGerente {
    #[arg(long)]
    rut: String,
    #[arg(long)]
    nombre: String,
    #[arg(long)]
    apellido: String,
    #[arg(long)]
    password: String,
    #[arg(long, default_value = "Gerente")]
    cargo: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = config::load_config().context("loading configuration")?;
    if let Some(url) = cli.database_url {
        cfg.database_url = url;
    }
    config::init_tracing(cfg.log_level(), cfg.log_json);

    let pool = db::establish_connection_from_app_config(&cfg)
        .await
        .context("connecting to database")?;

    match cli.command {
        Command::Up { steps } => {
            Migrator::up(&pool, steps).await?;
            info!("migrations applied");
        }
        Command::Down { steps } => {
            Migrator::down(&pool, Some(steps)).await?;
            info!(steps, "migrations rolled back");
        }
        Command::Status => {
            Migrator::status(&pool).await?;
        }
        Command::Fresh => {
            Migrator::fresh(&pool).await?;
            info!("schema recreated");
        }
        Command::SeedGerente(args) => {
            Migrator::up(&pool, None).await?;
            let service = EmpleadoService::new(std::sync::Arc::new(pool));
            let empleado = service
                .bootstrap_gerente(CrearEmpleado::gerente(
                    args.rut,
                    args.nombre,
                    args.apellido,
                    args.cargo,
                    args.password,
                ))
                .await?;
            println!("gerente {} creado (id {})", empleado.rut, empleado.id);
        }
    }

    Ok(())
}
