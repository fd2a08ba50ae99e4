use anyhow::Result;

use crate::catalog::Catalog;
use crate::conf_file::ConfFile;
use crate::error::SetupError;
use crate::hba::HbaRule;
use crate::service::Service;
use crate::settings::Settings;
use crate::system::System;

/// First line of the block appended to postgresql.conf. Stock configs already
/// carry a commented `#wal_level = replica`, so the setting itself is no marker.
pub const REPLICATION_MARKER: &str = "# Streaming replication (managed by pg-replicate)";

pub struct PrimaryConfigurator<'a, S: System + ?Sized> {
    pub settings: &'a Settings,
    pub system: &'a S,
}

impl<'a, S: System + ?Sized> PrimaryConfigurator<'a, S> {
    pub fn new(settings: &'a Settings, system: &'a S) -> Self {
        Self { settings, system }
    }

    pub fn replication_block(&self) -> String {
        let s = self.settings;
        format!(
            "\n{REPLICATION_MARKER}\n\
             listen_addresses = '{}'\n\
             wal_level = replica\n\
             max_wal_senders = {}\n\
             max_replication_slots = {}\n\
             hot_standby = on\n",
            s.listen_addresses, s.max_wal_senders, s.max_replication_slots
        )
    }

    pub fn hba_rule(&self) -> HbaRule {
        HbaRule::replication(&self.settings.role.name, &self.settings.standby_host)
    }

    /// Brings the primary's configuration, role and service into shape.
    /// Every step is safe to repeat.
    pub fn configure<C: Catalog + ?Sized>(&self, catalog: &mut C) -> Result<()> {
        if !self.system.is_privileged() {
            return Err(SetupError::NotPrivileged.into());
        }
        tracing::info!("configuring primary");

        let conf = ConfFile::new(self.settings.postgresql_conf());
        conf.backup_once(&self.settings.postgresql_conf_backup())?;
        conf.append_unless_present(REPLICATION_MARKER, &self.replication_block())?;

        self.ensure_hba_rule()?;

        self.settings.role.ensure(catalog)?;

        Service::new(&self.settings.service).restart(self.system)?;
        tracing::info!("primary configured");
        Ok(())
    }

    fn ensure_hba_rule(&self) -> Result<bool> {
        let hba = ConfFile::new(self.settings.pg_hba_conf());
        let rule = self.hba_rule();
        if rule.is_present_in(&hba.read()?) {
            tracing::info!(rule = %rule, "replication access rule already present");
            return Ok(false);
        }
        hba.append(&rule.to_string())?;
        tracing::info!(rule = %rule, "added replication access rule");
        Ok(true)
    }
}
