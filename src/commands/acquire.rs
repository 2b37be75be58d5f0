//! Download and unpack commands

use std::path::Path;
use std::thread;

use console::Style;

use crate::acquire::{AcquisitionJob, AcquisitionKind, ItemStatus};
use crate::cli::{DownloadArgs, UnpackArgs};
use crate::error::Result;
use crate::package::Package;
use crate::progress::ProgressDisplay;

use super::helpers::{TICK, load_config, open_package, update_package};

/// Run download command
pub fn run_download(config: &Path, args: &DownloadArgs) -> Result<()> {
    let config = load_config(config)?;
    let package = open_package(&config)?;
    if args.update {
        let version = update_package(&package, &config)?;
        tracing::info!(
            package = %package.name(),
            %version,
            "Planning download against updated manifest"
        );
    }
    let options = args.limits.apply(config.acquisition_options());
    let job = package.create_download_job(args.select.selector(), options)?;
    drive(&package, &job, AcquisitionKind::Download)
}

/// Run unpack command
pub fn run_unpack(config: &Path, args: &UnpackArgs) -> Result<()> {
    let config = load_config(config)?;
    let package = open_package(&config)?;
    let options = args.limits.apply(config.acquisition_options());
    let job = package.create_unpack_job(args.select.selector(), options)?;
    drive(&package, &job, AcquisitionKind::Unpack)
}

fn drive(package: &Package, job: &AcquisitionJob, kind: AcquisitionKind) -> Result<()> {
    let total = job.report().total();
    if total == 0 {
        package.wait(job.handle(), TICK);
        println!("Nothing to {kind}.");
        return Ok(());
    }

    let display = ProgressDisplay::new(total as u64);
    while !job.is_done() {
        package.tick();
        display.update(&job.report());
        thread::sleep(TICK);
    }

    let report = job.report();
    if report.failed() == 0 {
        display.finish();
    } else {
        display.abandon();
    }

    println!(
        "{} {} of {} bundle(s), {} bytes",
        Style::new().green().bold().apply_to(capitalize(kind)),
        report.succeeded(),
        report.total(),
        report.bytes_transferred()
    );
    for item in &report.items {
        if let ItemStatus::Failed { attempts, reason } = &item.status {
            println!(
                "  {} {} after {attempts} attempt(s): {reason}",
                Style::new().red().apply_to("failed"),
                item.bundle
            );
        }
    }

    match job.handle().take() {
        Some(Err(e)) => Err(e),
        _ => Ok(()),
    }
}

fn capitalize(kind: AcquisitionKind) -> &'static str {
    match kind {
        AcquisitionKind::Download => "Downloaded",
        AcquisitionKind::Unpack => "Unpacked",
    }
}
