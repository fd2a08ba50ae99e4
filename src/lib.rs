//! Main library entry point for pg-replicate.

pub mod args;
pub mod catalog;
pub mod conf_file;
pub mod error;
pub mod hba;
pub mod logging;
pub mod primary;
pub mod role;
pub mod service;
pub mod settings;
pub mod standby;
pub mod status;
pub mod system;

// Re-export key types for ergonomic access

pub use args::{Args, Mode, StatusFormat};
pub use catalog::{Catalog, ClientCatalog, PsqlCatalog};
pub use error::SetupError;
pub use primary::PrimaryConfigurator;
pub use settings::Settings;
pub use standby::StandbyConfigurator;
pub use status::StatusCheck;
pub use system::{HostSystem, System};

use std::io::Write;

use anyhow::Result;

/// Runs the configurator for the selected mode, then the status query if asked.
/// Status output goes to `out`.
pub fn run<S: System + ?Sized, W: Write>(settings: &Settings, system: &S, out: &mut W) -> Result<()> {
    match &settings.admin_url {
        Some(url) => run_with(settings, system, &mut ClientCatalog::new(url), out),
        None => run_with(
            settings,
            system,
            &mut PsqlCatalog::new(system, &settings.os_user),
            out,
        ),
    }
}

pub fn run_with<S, C, W>(settings: &Settings, system: &S, catalog: &mut C, out: &mut W) -> Result<()>
where
    S: System + ?Sized,
    C: Catalog + ?Sized,
    W: Write,
{
    match settings.mode {
        Mode::Primary => PrimaryConfigurator::new(settings, system).configure(catalog)?,
        Mode::Standby => StandbyConfigurator::new(settings, system).configure()?,
    }
    if settings.check {
        let report = StatusCheck::new(settings.mode, settings.status_format).run(catalog)?;
        out.write_all(report.as_bytes())?;
        out.flush()?;
    }
    Ok(())
}
