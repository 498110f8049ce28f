use std::rc::Rc;

use nbx_adapters::{netbox_registry, ActionExecutor, DiagnosticAction, Diagnostics, StepEnv};
use nbx_core::{RunContext, StepRunner};
use nbx_domain::InstallSettings;
use nbx_host::FakeHost;

fn installed() -> (Rc<FakeHost>, Diagnostics) {
    let host = Rc::new(FakeHost::new());
    let env = StepEnv::new(host.clone()).unwrap();
    let registry = netbox_registry(&env).unwrap();
    let mut ctx = RunContext::new(InstallSettings::default());
    assert!(StepRunner::new().run(&registry, &mut ctx).is_success());
    host.clear_commands();
    (host, Diagnostics::new(env, InstallSettings::default()))
}

fn config_path() -> String {
    InstallSettings::default().config_file().display().to_string()
}

#[test]
fn healthy_install_passes_every_check() {
    let (_host, diag) = installed();
    for action in [DiagnosticAction::ServiceStatus,
                   DiagnosticAction::CheckConfiguration,
                   DiagnosticAction::CheckDatabase,
                   DiagnosticAction::CheckRedis]
    {
        let reports = diag.execute(action);
        assert_eq!(reports.len(), 1);
        assert!(reports[0].is_ok(), "{action:?}: {:?}", reports[0].error);
    }
}

#[test]
fn stopped_service_is_reported() {
    let (host, diag) = installed();
    host.stop_service("netbox-rq");
    let report = diag.execute(DiagnosticAction::ServiceStatus).remove(0);
    assert!(report.error.unwrap().to_string().contains("netbox-rq"));
}

#[test]
fn loose_configuration_is_flagged_then_fixed() {
    let (host, diag) = installed();
    let contents = host.file(&config_path()).unwrap().contents;
    host.put_file(&config_path(), &contents, 0o644, "root");

    let check = diag.execute(DiagnosticAction::CheckConfiguration).remove(0);
    let msg = check.error.unwrap().to_string();
    assert!(msg.contains("expected 600") && msg.contains("expected netbox"), "{msg}");

    assert!(diag.execute(DiagnosticAction::FixPermissions)[0].is_ok());
    let fixed = host.file(&config_path()).unwrap();
    assert_eq!((fixed.mode, fixed.owner.as_str()), (0o600, "netbox"));
    assert!(diag.execute(DiagnosticAction::CheckConfiguration)[0].is_ok());
}

#[test]
fn missing_configuration_fails_checks() {
    let (host, diag) = installed();
    host.remove_path(&config_path());
    assert!(!diag.execute(DiagnosticAction::CheckConfiguration)[0].is_ok());
    assert!(!diag.execute(DiagnosticAction::CheckDatabase)[0].is_ok());
}

#[test]
fn database_down_is_detected() {
    let (host, diag) = installed();
    host.stop_service("postgresql");
    let report = diag.execute(DiagnosticAction::CheckDatabase).remove(0);
    assert!(report.error.unwrap().to_string().contains("not ready"));
}

#[test]
fn runtime_repair_recreates_the_virtualenv() {
    let (host, diag) = installed();
    host.remove_path("/opt/netbox/venv");
    assert!(diag.execute(DiagnosticAction::FixRuntime)[0].is_ok());
    assert!(host.ran("python3 -m venv /opt/netbox/venv"));
    assert!(host.file("/opt/netbox/venv/bin/gunicorn").is_some());
}

#[test]
fn migrations_run_even_when_nothing_is_pending() {
    let (host, diag) = installed();
    assert!(diag.execute(DiagnosticAction::RunMigrations)[0].is_ok());
    assert!(host.ran("manage.py migrate --no-input"));
    assert!(diag.execute(DiagnosticAction::CollectStatic)[0].is_ok());
    assert!(host.ran("manage.py collectstatic --no-input"));
}

#[test]
fn run_all_continues_past_failures() {
    let (host, diag) = installed();
    host.stop_service("redis-server");
    let reports = diag.execute(DiagnosticAction::RunAll);

    let order: Vec<DiagnosticAction> = reports.iter().map(|r| r.action).collect();
    assert_eq!(order, DiagnosticAction::ALL[..10].to_vec());
    let failed: Vec<DiagnosticAction> = reports.iter().filter(|r| !r.is_ok()).map(|r| r.action).collect();
    assert_eq!(failed, vec![DiagnosticAction::ServiceStatus, DiagnosticAction::CheckRedis]);
    assert!(host.ran("journalctl -u netbox -u netbox-rq -n 50"));
}

#[test]
fn exit_runs_nothing() {
    let (host, diag) = installed();
    assert!(diag.execute(DiagnosticAction::Exit).is_empty());
    assert!(host.commands().is_empty());
}
