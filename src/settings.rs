//! Resolved configuration for one run.

use std::path::PathBuf;

use crate::args::{Args, Mode, StatusFormat};
use crate::role::ReplicationRole;

/// Password used when none is supplied on the command line or environment.
pub const DEFAULT_REPLICATION_PASSWORD: &str = "replicator_password";

#[derive(Clone, Debug)]
pub struct Settings {
    pub mode: Mode,
    pub check: bool,
    pub pg_version: u32,
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub primary_host: String,
    pub standby_host: String,
    pub port: u16,
    pub role: ReplicationRole,
    pub service: String,
    pub os_user: String,
    pub trigger_file: PathBuf,
    pub max_wal_senders: u32,
    pub max_replication_slots: u32,
    pub listen_addresses: String,
    pub admin_url: Option<String>,
    pub status_format: StatusFormat,
}

impl Settings {
    pub fn from_args(args: &Args) -> Self {
        let password = match &args.replication_password {
            Some(password) => password.clone(),
            None => {
                tracing::warn!(
                    role = %args.replication_user,
                    "no replication password supplied, using the built-in default"
                );
                DEFAULT_REPLICATION_PASSWORD.to_string()
            }
        };
        if let Some(followup) = args.followup.as_deref().filter(|_| !args.wants_check()) {
            tracing::warn!(argument = followup, "ignoring unrecognised trailing argument");
        }
        Settings {
            mode: args.mode,
            check: args.wants_check(),
            pg_version: args.pg_version,
            config_dir: args
                .config_dir
                .clone()
                .unwrap_or_else(|| default_config_dir(args.pg_version)),
            data_dir: args
                .data_dir
                .clone()
                .unwrap_or_else(|| default_data_dir(args.pg_version)),
            primary_host: args.primary_host.clone(),
            standby_host: args.standby_host.clone(),
            port: args.port,
            role: ReplicationRole::new(&args.replication_user, &password),
            service: args.service.clone(),
            os_user: args.os_user.clone(),
            trigger_file: args.trigger_file.clone(),
            max_wal_senders: args.max_wal_senders,
            max_replication_slots: args.max_replication_slots,
            listen_addresses: args.listen_addresses.clone(),
            admin_url: args.admin_url.clone(),
            status_format: args.status_format,
        }
    }

    pub fn postgresql_conf(&self) -> PathBuf {
        self.config_dir.join("postgresql.conf")
    }

    pub fn postgresql_conf_backup(&self) -> PathBuf {
        self.config_dir.join("postgresql.conf.backup")
    }

    pub fn pg_hba_conf(&self) -> PathBuf {
        self.config_dir.join("pg_hba.conf")
    }

    /// Configuration file inside the data directory that recovery settings go to.
    pub fn standby_conf(&self) -> PathBuf {
        self.data_dir.join("postgresql.auto.conf")
    }

    /// `promote_trigger_file` was removed in PostgreSQL 16.
    pub fn supports_trigger_file(&self) -> bool {
        self.pg_version < 16
    }
}

pub fn default_config_dir(pg_version: u32) -> PathBuf {
    PathBuf::from(format!("/etc/postgresql/{pg_version}/main"))
}

pub fn default_data_dir(pg_version: u32) -> PathBuf {
    PathBuf::from(format!("/var/lib/postgresql/{pg_version}/main"))
}
