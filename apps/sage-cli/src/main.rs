use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = sage_cli::Args::parse();

	sage_cli::run(args).await
}
