use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use clap::Parser;
use pg_replicate::system::{Completed, Invocation};
use pg_replicate::{Args, Catalog, Settings, System};
use tempfile::TempDir;

/// Ordered record of everything the fakes were asked to do.
pub type Journal = Rc<RefCell<Vec<String>>>;

pub struct FakeSystem {
    pub privileged: bool,
    pub now: NaiveDateTime,
    /// Exit codes keyed by the program actually run (after `runuser -u x --`).
    pub exit_codes: HashMap<String, i32>,
    /// Captured stdout keyed the same way.
    pub stdout: HashMap<String, String>,
    pub invocations: RefCell<Vec<Invocation>>,
    pub chowned: RefCell<Vec<(PathBuf, String)>>,
    pub journal: Journal,
}

#[allow(dead_code)]
impl FakeSystem {
    pub fn new(journal: Journal) -> Self {
        FakeSystem {
            privileged: true,
            now: NaiveDate::from_ymd_opt(2024, 3, 9)
                .unwrap()
                .and_hms_opt(7, 5, 1)
                .unwrap(),
            exit_codes: HashMap::new(),
            stdout: HashMap::new(),
            invocations: RefCell::new(Vec::new()),
            chowned: RefCell::new(Vec::new()),
            journal,
        }
    }

    pub fn commands(&self) -> Vec<String> {
        self.invocations
            .borrow()
            .iter()
            .map(|invocation| invocation.to_string())
            .collect()
    }
}

fn effective_program(invocation: &Invocation) -> String {
    if invocation.program == "runuser" {
        if let Some(pos) = invocation.args.iter().position(|arg| arg == "--") {
            if let Some(program) = invocation.args.get(pos + 1) {
                return program.clone();
            }
        }
    }
    invocation.program.clone()
}

impl System for FakeSystem {
    fn is_privileged(&self) -> bool {
        self.privileged
    }

    fn run(&self, invocation: &Invocation) -> Result<Completed> {
        let program = effective_program(invocation);
        self.invocations.borrow_mut().push(invocation.clone());
        self.journal.borrow_mut().push(invocation.to_string());
        Ok(Completed {
            code: Some(*self.exit_codes.get(&program).unwrap_or(&0)),
            stdout: self.stdout.get(&program).cloned().unwrap_or_default(),
            stderr: String::new(),
        })
    }

    fn chown(&self, path: &Path, owner: &str) -> Result<()> {
        self.chowned
            .borrow_mut()
            .push((path.to_path_buf(), owner.to_string()));
        self.journal
            .borrow_mut()
            .push(format!("chown {owner} {}", path.display()));
        Ok(())
    }

    fn now(&self) -> NaiveDateTime {
        self.now
    }
}

/// In-memory stand-in for the server's role catalog.
pub struct FakeCatalog {
    pub roles: HashSet<String>,
    pub executed: Vec<String>,
    pub journal: Journal,
}

#[allow(dead_code)]
impl FakeCatalog {
    pub fn new(journal: Journal) -> Self {
        FakeCatalog {
            roles: HashSet::new(),
            executed: Vec::new(),
            journal,
        }
    }
}

impl Catalog for FakeCatalog {
    fn scalar(&mut self, sql: &str) -> Result<Option<String>> {
        self.journal.borrow_mut().push(format!("scalar: {sql}"));
        if sql.contains("pg_roles") {
            let found = self
                .roles
                .iter()
                .any(|role| sql.contains(&format!("'{role}'")));
            return Ok(found.then(|| "1".to_string()));
        }
        if sql.contains("json_agg") {
            return Ok(Some(r#"[{"client_addr":"192.168.1.11","state":"streaming"}]"#.to_string()));
        }
        Ok(None)
    }

    fn execute(&mut self, sql: &str) -> Result<()> {
        self.journal.borrow_mut().push(format!("execute: {sql}"));
        self.executed.push(sql.to_string());
        Ok(())
    }

    fn render(&mut self, sql: &str) -> Result<String> {
        self.journal.borrow_mut().push(format!("render: {sql}"));
        Ok(format!("result of {sql}\n"))
    }
}

/// A scratch host layout: config dir with stock files, and a data dir path.
pub struct Host {
    pub dir: TempDir,
}

#[allow(dead_code)]
impl Host {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let conf = dir.path().join("conf");
        std::fs::create_dir_all(&conf).unwrap();
        std::fs::write(
            conf.join("postgresql.conf"),
            "port = 5432\n#wal_level = replica\t\t\t# minimal, replica, or logical\n",
        )
        .unwrap();
        std::fs::write(
            conf.join("pg_hba.conf"),
            "local   all             postgres                                peer\n",
        )
        .unwrap();
        Host { dir }
    }

    pub fn conf_dir(&self) -> PathBuf {
        self.dir.path().join("conf")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data").join("main")
    }

    pub fn settings(&self, argv: &[&str]) -> Settings {
        let conf_dir = self.conf_dir();
        let data_dir = self.data_dir();
        let mut full = vec![
            "pg-replicate",
            "--config-dir",
            conf_dir.to_str().unwrap(),
            "--data-dir",
            data_dir.to_str().unwrap(),
            "--replication-password",
            "s3cret",
        ];
        full.extend_from_slice(argv);
        Settings::from_args(&Args::try_parse_from(full).unwrap())
    }

    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.conf_dir().join(name)).unwrap()
    }
}

pub fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}
