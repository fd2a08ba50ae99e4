// Host-based authentication rules for replication connections.

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HbaRule {
    pub database: String,
    pub user: String,
    pub address: String,
    pub method: String,
}

impl HbaRule {
    /// Rule admitting `user` from a single host to the replication pseudo-database.
    pub fn replication(user: &str, host: &str) -> Self {
        let address = if host.contains('/') {
            host.to_string()
        } else if host.contains(':') {
            format!("{host}/128")
        } else {
            format!("{host}/32")
        };
        HbaRule {
            database: "replication".to_string(),
            user: user.to_string(),
            address,
            method: "md5".to_string(),
        }
    }

    /// Whether an active line in `contents` already grants this access.
    /// Compares fields, so spacing and the auth method do not matter.
    pub fn is_present_in(&self, contents: &str) -> bool {
        contents.lines().any(|line| self.matches_line(line))
    }

    fn matches_line(&self, line: &str) -> bool {
        let line = line.split('#').next().unwrap_or_default();
        let fields: Vec<&str> = line.split_whitespace().collect();
        matches!(
            fields.as_slice(),
            ["host" | "hostssl" | "hostnossl", database, user, address, ..]
                if *database == self.database && *user == self.user && *address == self.address
        )
    }
}

impl fmt::Display for HbaRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "host    {:<15} {:<15} {:<23} {}",
            self.database, self.user, self.address, self.method
        )
    }
}
