use anyhow::Context;
use clap::Parser;
use eframe::CreationContext;
use evidence_uploader::app::{BootstrapFailed, EvidenceUploader};
use evidence_uploader::config::{Cli, UploaderConfig};
use evidence_uploader::error::UploaderError;
use evidence_uploader::session::SessionIdentity;
use evidence_uploader::verify::RasterDecoderAdapter;
use reqwest::Url;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn bootstrap(cli: &Cli) -> Result<(SessionIdentity, UploaderConfig), UploaderError> {
    let entry = Url::parse(&cli.entry_url)
        .map_err(|e| UploaderError::session(format!("Invalid entry link: {}", e)))?;
    let session = SessionIdentity::from_entry_url(&entry)?;
    let config = UploaderConfig::from_cli(cli, &entry)?;
    Ok((session, config))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([480.0, 720.0])
            .with_min_inner_size([360.0, 520.0]),
        ..Default::default()
    };

    let creator: eframe::AppCreator = match bootstrap(&cli) {
        Ok((session, config)) => Box::new(move |cc: &CreationContext| {
            Box::new(EvidenceUploader::new(
                cc,
                session,
                config,
                RasterDecoderAdapter::platform_default(),
            )) as Box<dyn eframe::App>
        }),
        Err(e) => {
            error!(error = %e, "session bootstrap failed");
            Box::new(move |cc: &CreationContext| {
                Box::new(BootstrapFailed::new(cc, e)) as Box<dyn eframe::App>
            })
        }
    };

    eframe::run_native("Photo Evidence Upload", options, creator)
        .map_err(|e| anyhow::anyhow!(e.to_string()))
        .context("failed to run the uploader window")
}
