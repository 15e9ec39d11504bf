pub mod worker;

use clap::Parser;
use color_eyre::eyre;
use tracing_subscriber::EnvFilter;

use devmatch_cli::ConfigArgs;
use devmatch_service::MatchService;
use devmatch_storage::db::Db;

#[derive(Debug, Parser)]
#[command(
	version = devmatch_cli::VERSION,
	rename_all = "kebab",
	styles = devmatch_cli::styles(),
)]
pub struct Args {
	#[command(flatten)]
	pub config: ConfigArgs,
	/// Run a single backfill sweep and exit.
	#[arg(long)]
	pub once: bool,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = devmatch_config::load(&args.config.config)?;
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.try_init()
		.map_err(|err| eyre::eyre!("Failed to initialize tracing: {err}."))?;

	let db = Db::connect(&config.storage.postgres).await?;

	db.ensure_schema().await?;

	let service = MatchService::new(config, db);

	if args.once {
		worker::run_once(&service).await?;

		return Ok(());
	}

	worker::run_worker(&service).await
}
