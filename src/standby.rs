use std::fs::{self, DirBuilder};
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;

use crate::conf_file::ConfFile;
use crate::error::SetupError;
use crate::service::Service;
use crate::settings::Settings;
use crate::system::{Invocation, System};

pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Where an existing data directory is moved before it is rebuilt.
pub fn backup_path(data_dir: &Path, at: NaiveDateTime) -> PathBuf {
    let mut name = data_dir.as_os_str().to_os_string();
    name.push(format!(".bak-{}", at.format(BACKUP_TIMESTAMP_FORMAT)));
    PathBuf::from(name)
}

pub struct StandbyConfigurator<'a, S: System + ?Sized> {
    pub settings: &'a Settings,
    pub system: &'a S,
}

impl<'a, S: System + ?Sized> StandbyConfigurator<'a, S> {
    pub fn new(settings: &'a Settings, system: &'a S) -> Self {
        Self { settings, system }
    }

    pub fn base_backup_invocation(&self) -> Invocation {
        let s = self.settings;
        Invocation::as_user(&s.os_user, "pg_basebackup")
            .args(["-h", s.primary_host.as_str()])
            .args(["-p".to_string(), s.port.to_string()])
            .args(["-U", s.role.name.as_str()])
            .arg("-D")
            .arg(s.data_dir.display().to_string())
            .args(["-X", "stream", "-R", "-P"])
            .env("PGPASSWORD", &s.role.password)
            .inherit_output()
    }

    pub fn recovery_settings(&self) -> String {
        let s = self.settings;
        let conninfo = format!(
            "host={} port={} user={} password={}",
            conninfo_value(&s.primary_host),
            s.port,
            conninfo_value(&s.role.name),
            conninfo_value(&s.role.password)
        );
        let mut block = format!("primary_conninfo = {}\n", conf_literal(&conninfo));
        if s.supports_trigger_file() {
            block.push_str(&format!(
                "promote_trigger_file = {}\n",
                conf_literal(&s.trigger_file.display().to_string())
            ));
        } else {
            tracing::warn!(
                pg_version = s.pg_version,
                "promote_trigger_file is not supported on this server version, skipping it"
            );
        }
        block.push_str("hot_standby = on\n");
        block
    }

    /// Rebuilds this host as a standby streaming from the primary.
    pub fn configure(&self) -> Result<()> {
        if !self.system.is_privileged() {
            return Err(SetupError::NotPrivileged.into());
        }
        tracing::info!("configuring standby");
        let service = Service::new(&self.settings.service);
        service.stop(self.system)?;

        self.move_data_dir_aside()?;
        self.recreate_data_dir()?;
        self.run_base_backup()?;

        let conf = ConfFile::new(self.settings.standby_conf());
        conf.append(&self.recovery_settings())?;
        self.system.chown(&conf.path, &self.settings.os_user)?;

        service.start(self.system)?;
        tracing::info!("standby configured");
        Ok(())
    }

    /// Renames an existing data directory to a timestamped sibling.
    /// Returns the new path, or `None` when there was nothing to move.
    pub fn move_data_dir_aside(&self) -> Result<Option<PathBuf>> {
        let data_dir = &self.settings.data_dir;
        if !data_dir.exists() {
            return Ok(None);
        }
        let backup = backup_path(data_dir, self.system.now());
        if backup.exists() {
            return Err(SetupError::BackupPathExists(backup).into());
        }
        fs::rename(data_dir, &backup).with_context(|| {
            format!(
                "failed to move {} to {}",
                data_dir.display(),
                backup.display()
            )
        })?;
        tracing::info!(
            from = %data_dir.display(),
            to = %backup.display(),
            "moved existing data directory aside"
        );
        Ok(Some(backup))
    }

    fn recreate_data_dir(&self) -> Result<()> {
        let data_dir = &self.settings.data_dir;
        DirBuilder::new()
            .recursive(true)
            .mode(0o700)
            .create(data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;
        self.system.chown(data_dir, &self.settings.os_user)?;
        Ok(())
    }

    fn run_base_backup(&self) -> Result<()> {
        let invocation = self.base_backup_invocation();
        tracing::info!(primary = %self.settings.primary_host, "starting base backup");
        let completed = self.system.run(&invocation)?;
        if !completed.success() {
            tracing::error!(code = ?completed.code, "base backup failed");
            return Err(SetupError::BaseBackupFailed {
                code: completed.code,
            }
            .into());
        }
        tracing::info!("base backup complete");
        Ok(())
    }
}

/// Quotes a value for postgresql.conf, where backslash is also an escape.
fn conf_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
}

/// Quotes a libpq connection-string value when it needs it.
fn conninfo_value(value: &str) -> String {
    if !value.is_empty() && !value.contains([' ', '\'', '\\']) {
        return value.to_string();
    }
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}
