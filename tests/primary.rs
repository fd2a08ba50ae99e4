mod common;

use common::{FakeCatalog, FakeSystem, Host, journal};
use pg_replicate::primary::REPLICATION_MARKER;
use pg_replicate::{PrimaryConfigurator, SetupError};

#[test]
fn test_configure_appends_block_rule_and_creates_role() {
    let host = Host::new();
    let settings = host.settings(&["primary"]);
    let log = journal();
    let system = FakeSystem::new(log.clone());
    let mut catalog = FakeCatalog::new(log.clone());

    PrimaryConfigurator::new(&settings, &system)
        .configure(&mut catalog)
        .expect("configure primary");

    let conf = host.read("postgresql.conf");
    assert!(conf.contains(REPLICATION_MARKER));
    assert!(conf.contains("\nwal_level = replica\n"));
    assert!(conf.contains("max_wal_senders = 10"));
    assert!(conf.contains("max_replication_slots = 10"));
    assert!(conf.contains("hot_standby = on"));

    let hba = host.read("pg_hba.conf");
    assert!(hba.contains("host    replication     replicator      192.168.1.11/32         md5"));

    assert_eq!(
        catalog.executed,
        vec!["CREATE ROLE \"replicator\" WITH REPLICATION LOGIN PASSWORD 's3cret'".to_string()]
    );
    assert_eq!(system.commands(), vec!["systemctl restart postgresql".to_string()]);
}

#[test]
fn test_backup_is_taken_from_the_untouched_file() {
    let host = Host::new();
    let original = host.read("postgresql.conf");
    let settings = host.settings(&["primary"]);
    let log = journal();
    let system = FakeSystem::new(log.clone());
    let mut catalog = FakeCatalog::new(log.clone());

    PrimaryConfigurator::new(&settings, &system)
        .configure(&mut catalog)
        .unwrap();

    assert_eq!(host.read("postgresql.conf.backup"), original);
}

#[test]
fn test_configure_twice_is_idempotent() {
    let host = Host::new();
    let settings = host.settings(&["primary"]);
    let log = journal();
    let system = FakeSystem::new(log.clone());
    let mut catalog = FakeCatalog::new(log.clone());
    let configurator = PrimaryConfigurator::new(&settings, &system);

    configurator.configure(&mut catalog).unwrap();
    let backup_after_first = host.read("postgresql.conf.backup");
    catalog.roles.insert("replicator".to_string());
    configurator.configure(&mut catalog).unwrap();

    let conf = host.read("postgresql.conf");
    assert_eq!(conf.matches(REPLICATION_MARKER).count(), 1);
    assert_eq!(conf.matches("\nwal_level = replica\n").count(), 1);
    let hba = host.read("pg_hba.conf");
    assert_eq!(hba.matches("replication").count(), 1);
    assert_eq!(host.read("postgresql.conf.backup"), backup_after_first);
    // Restart happens on every run.
    assert_eq!(
        system.commands(),
        vec![
            "systemctl restart postgresql".to_string(),
            "systemctl restart postgresql".to_string()
        ]
    );
}

#[test]
fn test_existing_role_is_not_recreated() {
    let host = Host::new();
    let settings = host.settings(&["primary"]);
    let log = journal();
    let system = FakeSystem::new(log.clone());
    let mut catalog = FakeCatalog::new(log.clone());
    catalog.roles.insert("replicator".to_string());

    PrimaryConfigurator::new(&settings, &system)
        .configure(&mut catalog)
        .unwrap();

    assert!(catalog.executed.is_empty());
}

#[test]
fn test_unprivileged_run_changes_nothing() {
    let host = Host::new();
    let before = host.read("postgresql.conf");
    let settings = host.settings(&["primary"]);
    let log = journal();
    let mut system = FakeSystem::new(log.clone());
    system.privileged = false;
    let mut catalog = FakeCatalog::new(log.clone());

    let err = PrimaryConfigurator::new(&settings, &system)
        .configure(&mut catalog)
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SetupError>(),
        Some(SetupError::NotPrivileged)
    ));
    assert_eq!(host.read("postgresql.conf"), before);
    assert!(!host.conf_dir().join("postgresql.conf.backup").exists());
    assert!(log.borrow().is_empty());
}

#[test]
fn test_failed_restart_is_reported() {
    let host = Host::new();
    let settings = host.settings(&["primary"]);
    let log = journal();
    let mut system = FakeSystem::new(log.clone());
    system.exit_codes.insert("systemctl".to_string(), 5);
    let mut catalog = FakeCatalog::new(log.clone());

    let err = PrimaryConfigurator::new(&settings, &system)
        .configure(&mut catalog)
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SetupError>(),
        Some(SetupError::CommandFailed { code: Some(5), .. })
    ));
}

#[test]
fn test_custom_peer_and_limits() {
    let host = Host::new();
    let settings = host.settings(&[
        "--standby-host",
        "10.0.0.7",
        "--replication-user",
        "streamer",
        "--max-wal-senders",
        "4",
        "primary",
    ]);
    let log = journal();
    let system = FakeSystem::new(log.clone());
    let mut catalog = FakeCatalog::new(log.clone());

    PrimaryConfigurator::new(&settings, &system)
        .configure(&mut catalog)
        .unwrap();

    assert!(host.read("postgresql.conf").contains("max_wal_senders = 4"));
    assert!(host.read("pg_hba.conf").contains("streamer        10.0.0.7/32"));
}
