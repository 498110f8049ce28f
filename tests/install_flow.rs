use std::rc::Rc;

use nbx_domain::InstallSettings;
use nbx_host::{FakeHost, RunLock};
use netbox_provision::console::Console;
use netbox_provision::install::{finish, install};
use netbox_provision::AppError;

fn run(host: &Rc<FakeHost>) -> (Result<(), AppError>, String) {
    let dir = tempfile::tempdir().unwrap();
    let lock = dir.path().join("provision.lock");
    let mut console = Console::new(Vec::new());
    let outcome = install(host.clone(), InstallSettings::default(), &lock, &mut console).and_then(finish);
    assert!(RunLock::acquire(&lock).is_ok(), "lock must be released");
    (outcome, String::from_utf8(console.into_inner()).unwrap())
}

#[test]
fn full_install_prints_summary() {
    let host = Rc::new(FakeHost::new());
    let (outcome, out) = run(&host);

    assert!(outcome.is_ok());
    assert!(out.contains("Preflight passed on Ubuntu 24.04.1 LTS"));
    assert!(out.contains("create-service-user"));
    assert!(out.contains("netbox-rq: active"));
    assert!(out.contains("17 completed, 2 skipped, 0 warned of 19 steps"));
    assert!(out.contains("platform: Ubuntu 24.04.1 LTS"));
    assert!(out.contains("release: 4.1.11"));
    assert!(out.contains("/tmp/netbox-credentials.txt"));
    assert!(out.contains("manage.py createsuperuser"));
}

#[test]
fn rerun_reports_everything_skipped() {
    let host = Rc::new(FakeHost::new());
    assert!(run(&host).0.is_ok());
    let (outcome, out) = run(&host);
    assert!(outcome.is_ok());
    assert!(out.contains("0 completed, 19 skipped"));
}

#[test]
fn root_invocation_exits_before_any_step() {
    let host = Rc::new(FakeHost::new().with_uid(0));
    let (outcome, out) = run(&host);

    let err = outcome.unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert!(!out.contains("Steps:"));
    assert!(!host.ran("apt-get"));
}

#[test]
fn aborted_step_is_named_in_the_error() {
    let host = Rc::new(FakeHost::new());
    host.fail_on("nginx -t");
    let (outcome, out) = run(&host);

    let err = outcome.unwrap_err();
    assert_eq!(err.exit_code(), 1);
    assert!(err.to_string().contains("configure-nginx"), "{err}");
    assert!(out.contains("rollback: removed /tmp/netbox-credentials.txt"));
    assert!(!out.contains("createsuperuser"));
}

#[test]
fn held_lock_refuses_a_second_run() {
    let dir = tempfile::tempdir().unwrap();
    let lock = dir.path().join("provision.lock");
    let _held = RunLock::acquire(&lock).unwrap();
    let host = Rc::new(FakeHost::new());
    let mut console = Console::new(Vec::new());

    let err = install(host.clone(), InstallSettings::default(), &lock, &mut console).unwrap_err();
    assert_eq!(err.exit_code(), 3);
    assert!(!host.ran("apt-get"));
}

#[test]
fn lock_file_left_by_a_crashed_run_is_taken_over() {
    let dir = tempfile::tempdir().unwrap();
    let lock = dir.path().join("provision.lock");
    std::fs::write(&lock, "999999\n").unwrap();
    let host = Rc::new(FakeHost::new());
    let mut console = Console::new(Vec::new());

    let result = install(host.clone(), InstallSettings::default(), &lock, &mut console).unwrap();
    assert!(result.fatal.is_none());
    assert!(host.ran("apt-get"));
}
