use std::path::Path;
use std::process::ExitCode;

use console::Style;
use harvest_logging::{harvest_error, harvest_info, harvest_warn, LogDestination};
use harvester_engine::{
    Collaborators, HttpCatalog, Orchestrator, RunError, RunReport, StreamDownloader,
};
use log::LevelFilter;

use super::config::{load_config, HarvestConfig, LoadedConfig, CONFIG_FILENAME};
use super::prompt::InquirePrompt;
use super::render::{ConsoleReporter, IndicatifProgress};

/// Some collection was partial, aborted, or failed to merge.
const EXIT_INCOMPLETE: u8 = 2;

pub fn run_app() -> ExitCode {
    let (loaded, config_problem) = match load_config(Path::new(".")) {
        Ok(loaded) => (loaded, None),
        Err(err) => (
            LoadedConfig {
                config: HarvestConfig::default(),
                source: None,
            },
            Some(err),
        ),
    };
    let config = loaded.config;

    let level = if config.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    harvest_logging::initialize(LogDestination::for_verbosity(config.verbose), level);

    match (&loaded.source, &config_problem) {
        (Some(path), _) => harvest_info!("Loaded configuration from {:?}", path),
        (None, None) => harvest_info!("No {} found; using defaults", CONFIG_FILENAME),
        (None, Some(_)) => {}
    }
    if let Some(problem) = config_problem {
        harvest_warn!("{}; using defaults", problem);
        eprintln!(
            "{}",
            Style::new()
                .yellow()
                .apply_to(format!("Warning: {problem}; using defaults"))
        );
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            harvest_error!("Failed to start async runtime: {}", err);
            eprintln!("Failed to start async runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(harvest(&config)) {
        Ok(report) if report.is_clean() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(EXIT_INCOMPLETE),
        Err(err) => {
            harvest_error!("Run aborted: {}", err);
            eprintln!("{}", Style::new().red().bold().apply_to(format!("Error: {err}")));
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("cannot set up catalog access: {0}")]
    Catalog(#[from] harvester_engine::CatalogError),
    #[error(transparent)]
    Run(#[from] RunError),
}

async fn harvest(config: &HarvestConfig) -> Result<RunReport, AppError> {
    harvest_info!(
        "Harvesting channel {} into {:?}",
        config.channel_id,
        config.output_root
    );
    let catalog = HttpCatalog::new(config.catalog_settings())?;
    let downloader = StreamDownloader::new(config.download_settings());
    let prompt = InquirePrompt::new(config.page_size);
    let progress = IndicatifProgress::default();
    let status = ConsoleReporter::new(&progress);

    let orchestrator = Orchestrator::new(
        Collaborators {
            catalog: &catalog,
            downloader: &downloader,
            prompt: &prompt,
            progress: &progress,
            status: &status,
        },
        config.link_extractor(),
        config.layout(),
        config.run_settings(),
    );
    let report = orchestrator.run().await?;
    harvest_info!(
        "Run finished: {} collection(s), clean={}",
        report.collections.len(),
        report.is_clean()
    );
    Ok(report)
}
