mod cli;
mod logging;
mod status_sink;

fn main() -> anyhow::Result<()> {
    logging::init();
    cli::run()
}
