use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

/// Word that requests a status query after configuration.
pub const CHECK: &str = "check";

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Configure this host as the replication primary
    Primary,
    /// Rebuild this host as a streaming standby of the primary
    Standby,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Which side of the replication pair this host is
    #[arg(value_enum)]
    pub mode: Mode,

    /// Pass `check` to run a replication status query afterwards
    pub followup: Option<String>,

    /// PostgreSQL major version, used to derive default paths
    #[arg(long, env = "PG_REPLICATE_PG_VERSION", default_value_t = 14)]
    pub pg_version: u32,

    /// Directory holding postgresql.conf and pg_hba.conf
    #[arg(long, env = "PG_REPLICATE_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Cluster data directory
    #[arg(long, env = "PG_REPLICATE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Address of the primary server
    #[arg(long, env = "PG_REPLICATE_PRIMARY_HOST", default_value = "192.168.1.10")]
    pub primary_host: String,

    /// Address of the standby allowed to replicate from the primary
    #[arg(long, env = "PG_REPLICATE_STANDBY_HOST", default_value = "192.168.1.11")]
    pub standby_host: String,

    /// Port the primary listens on
    #[arg(long, env = "PG_REPLICATE_PORT", default_value_t = 5432)]
    pub port: u16,

    /// Name of the replication role
    #[arg(long, env = "PG_REPLICATE_USER", default_value = "replicator")]
    pub replication_user: String,

    /// Password of the replication role
    #[arg(long, env = "PG_REPLICATE_PASSWORD", hide_env_values = true)]
    pub replication_password: Option<String>,

    /// systemd unit controlling the server
    #[arg(long, env = "PG_REPLICATE_SERVICE", default_value = "postgresql")]
    pub service: String,

    /// Operating system account that owns the cluster
    #[arg(long, env = "PG_REPLICATE_OS_USER", default_value = "postgres")]
    pub os_user: String,

    /// File whose creation promotes the standby (servers before 16)
    #[arg(
        long,
        env = "PG_REPLICATE_TRIGGER_FILE",
        default_value = "/tmp/postgresql.trigger.5432"
    )]
    pub trigger_file: PathBuf,

    #[arg(long, default_value_t = 10)]
    pub max_wal_senders: u32,

    #[arg(long, default_value_t = 10)]
    pub max_replication_slots: u32,

    #[arg(long, default_value = "*")]
    pub listen_addresses: String,

    /// Connect directly with this URI instead of running psql
    #[arg(long, env = "PG_REPLICATE_ADMIN_URL", hide_env_values = true)]
    pub admin_url: Option<String>,

    /// Output format of the status query
    #[arg(long, value_enum, default_value_t = StatusFormat::Text)]
    pub status_format: StatusFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Whether the trailing positional asked for a status query.
    pub fn wants_check(&self) -> bool {
        self.followup.as_deref() == Some(CHECK)
    }
}

pub fn get_args() -> Result<Args, clap::Error> {
    Args::try_parse()
}
