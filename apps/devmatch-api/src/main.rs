use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = devmatch_api::Args::parse();

	devmatch_api::run(args).await
}
