use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = devmatch_worker::Args::parse();

	devmatch_worker::run(args).await
}
