use basic_cleaning::artifact::LocalArtifactStore;
use basic_cleaning::config::CleaningConfig;
use basic_cleaning::pipeline;
use clap::Parser;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = CleaningConfig::parse();

    let result = LocalArtifactStore::open(&cfg.artifact_root)
        .map_err(anyhow::Error::from)
        .and_then(|store| pipeline::go(&store, &cfg));

    match result {
        Ok(summary) => log::info!(
            "Run {} kept {} of {} rows",
            summary.run.id,
            summary.report.output_rows,
            summary.report.input_rows
        ),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}
