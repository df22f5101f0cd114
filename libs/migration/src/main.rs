use migration::Migrator;
use sea_orm_migration::cli;

// The CLI installs its own tracing subscriber.
#[tokio::main]
async fn main() {
    cli::run_cli(Migrator).await;
}
