use clap::Parser;
use extension_catalog::cli::{self, Cli};
use extension_catalog::{config, logging};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init(&config::log_path(), cli.verbose)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(cli::run(cli))
}
