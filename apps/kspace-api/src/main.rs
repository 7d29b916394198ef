use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = kspace_api::Args::parse();

	kspace_api::run(args).await
}
