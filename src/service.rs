use anyhow::Result;

use crate::system::{Invocation, System};

/// A systemd unit controlling the database server.
#[derive(Clone, Debug)]
pub struct Service {
    pub unit: String,
}

impl Service {
    pub fn new(unit: &str) -> Self {
        Service {
            unit: unit.to_string(),
        }
    }

    pub fn start<S: System + ?Sized>(&self, system: &S) -> Result<()> {
        self.systemctl(system, "start")
    }

    pub fn stop<S: System + ?Sized>(&self, system: &S) -> Result<()> {
        self.systemctl(system, "stop")
    }

    pub fn restart<S: System + ?Sized>(&self, system: &S) -> Result<()> {
        self.systemctl(system, "restart")
    }

    pub fn invocation(&self, action: &str) -> Invocation {
        Invocation::new("systemctl").args([action, self.unit.as_str()])
    }

    fn systemctl<S: System + ?Sized>(&self, system: &S, action: &str) -> Result<()> {
        tracing::info!(unit = %self.unit, action, "controlling database service");
        system.run_checked(&self.invocation(action))?;
        Ok(())
    }
}
