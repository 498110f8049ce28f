use std::rc::Rc;
use std::time::Duration;

use nbx_adapters::{netbox_registry, preflight, HostRollback, PreflightError, StepEnv};
use nbx_core::{RetryPolicy, RunContext, RunResult, StepRunner, StepStatus};
use nbx_domain::{DomainError, InstallSettings, SecretBundle};
use nbx_host::{read_secrets_file, FakeHost, FakeService};

fn install(host: &Rc<FakeHost>) -> RunResult {
    run_with(host, StepEnv::new(host.clone()).unwrap())
}

fn run_with(host: &Rc<FakeHost>, env: StepEnv) -> RunResult {
    let settings = InstallSettings::default();
    let registry = netbox_registry(&env).unwrap();
    let mut runner = StepRunner::new().with_rollback(HostRollback::new(host.clone()));
    let mut ctx = RunContext::new(settings);
    runner.run(&registry, &mut ctx)
}

fn status_of(result: &RunResult, id: &str) -> StepStatus {
    result.report.slots.iter().find(|s| s.step_id == id).map(|s| s.status).unwrap()
}

#[test]
fn fresh_host_is_fully_provisioned() {
    let host = Rc::new(FakeHost::new());
    let result = install(&host);

    assert!(result.is_success(), "{:?}", result.fatal);
    assert_eq!(result.total, 19);
    // redis y nginx quedan activos al instalar los paquetes
    assert_eq!(result.skipped, 2);
    assert_eq!(result.completed, 17);
    assert!(host.has_user("netbox"));
    assert!(host.has_package("postgresql"));
    assert!(host.has_database("netbox"));
    assert!(host.static_collected());
    for svc in ["netbox", "netbox-rq", "nginx"] {
        assert!(host.service(svc).unwrap().active, "{svc} not running");
    }
    assert_eq!(host.link("/etc/nginx/sites-enabled/default"), None);
}

#[test]
fn secrets_are_identical_on_every_surface() {
    let host = Rc::new(FakeHost::new());
    assert!(install(&host).is_success());
    let settings = InstallSettings::default();

    let config = host.file(&settings.config_file().display().to_string()).unwrap();
    assert_eq!((config.mode, config.owner.as_str()), (0o600, "netbox"));
    let committed = nbx_adapters::netbox_config::parse_secrets(&config.contents).unwrap();

    let file = host.file(&settings.secrets_file.display().to_string()).unwrap();
    assert_eq!(file.mode, 0o600);
    let written: SecretBundle = read_secrets_file(host.as_ref(), &settings.secrets_file).unwrap().unwrap();
    assert_eq!(written, committed);
    assert_eq!(host.pg_password("netbox").as_deref(), Some(committed.db_password()));
}

#[test]
fn credentials_file_is_restricted_before_it_is_filled() {
    let host = Rc::new(FakeHost::new());
    assert!(install(&host).is_success());
    let cmds = host.commands();
    let restrict = cmds.iter().position(|c| c.contains("install") && c.contains("0600") && c.contains("netbox-credentials"));
    let fill = cmds.iter().position(|c| c.contains("tee") && c.contains("netbox-credentials"));
    assert!(restrict.unwrap() < fill.unwrap());
    // /tmp es sticky: el contenido lo escribe la cuenta dueña, no root
    assert!(cmds[fill.unwrap()].starts_with("sudo -u netbox tee"));
}

#[test]
fn pending_migrations_are_applied_on_rerun() {
    let host = Rc::new(FakeHost::new());
    assert!(install(&host).is_success());
    host.set_migrations_pending(true);

    let again = install(&host);
    assert!(again.is_success(), "{:?}", again.fatal);
    assert_eq!(again.completed, 1);
    assert_eq!(status_of(&again, "run-migrations"), StepStatus::Completed);
    for slot in again.report.slots.iter().filter(|s| s.step_id != "run-migrations") {
        assert_eq!(slot.status, StepStatus::Skipped, "{}", slot.step_id);
    }
    assert!(host.ran("manage.py migrate --no-input"));
}

#[test]
fn transient_network_failure_is_retried() {
    let host = Rc::new(FakeHost::new());
    host.fail_times("apt-get install -y", 1);
    let env = StepEnv::new(host.clone()).unwrap().with_network_retry(RetryPolicy::new(3, Duration::ZERO));

    let result = run_with(&host, env);
    assert!(result.is_success(), "{:?}", result.fatal);
    let slot = result.report.slots.iter().find(|s| s.step_id == "install-packages").unwrap();
    assert_eq!(slot.status, StepStatus::Completed);
    assert_eq!(slot.attempts, 2);
    assert!(host.has_package("nginx"));
}

#[test]
fn interrupted_run_resumes_where_it_stopped() {
    let host = Rc::new(FakeHost::new());
    host.fail_on("nginx -t");
    assert!(install(&host).fatal.is_some());
    host.clear_failures();

    let resumed = install(&host);
    assert!(resumed.is_success(), "{:?}", resumed.fatal);
    assert_eq!(status_of(&resumed, "create-service-user"), StepStatus::Skipped);
    assert_eq!(status_of(&resumed, "configure-nginx"), StepStatus::Completed);
    assert!(host.service("netbox").unwrap().active);
}

#[test]
fn second_run_changes_nothing() {
    let host = Rc::new(FakeHost::new());
    let first = install(&host);
    assert!(first.is_success());
    let password = host.pg_password("netbox");
    host.clear_commands();

    let second = install(&host);
    assert!(second.is_success(), "{:?}", second.fatal);
    assert_eq!(second.completed, 0);
    assert_eq!(second.skipped, second.total);
    assert_eq!(status_of(&second, "create-service-user"), StepStatus::Skipped);
    assert!(!host.ran("useradd"));
    assert!(!host.ran("apt-get"));
    assert!(!host.ran("rolname="));
    assert_eq!(host.pg_password("netbox"), password);
    // los steps de arranque consultan la salud en vivo
    assert!(host.ran("systemctl is-active netbox-rq"));
}

#[test]
fn stopped_service_is_restarted_on_rerun() {
    let host = Rc::new(FakeHost::new());
    assert!(install(&host).is_success());
    host.stop_service("netbox");

    let again = install(&host);
    assert!(again.is_success());
    assert_eq!(again.completed, 1);
    assert_eq!(status_of(&again, "start-netbox"), StepStatus::Completed);
    assert!(host.service("netbox").unwrap().active);
}

#[test]
fn aborting_step_halts_and_cleans_up() {
    let host = Rc::new(FakeHost::new());
    host.fail_on("nginx -t");
    let result = install(&host);

    let fatal = result.fatal.as_ref().unwrap();
    assert_eq!(fatal.step_id, "configure-nginx");
    assert_eq!(status_of(&result, "install-housekeeping"), StepStatus::Pending);
    assert_eq!(status_of(&result, "start-netbox"), StepStatus::Pending);
    assert!(result.report.aborted);
    assert!(host.file("/tmp/netbox-credentials.txt").is_none());
    assert!(result.report.rollback.iter().any(|a| a.contains("netbox-credentials")));
    assert!(!host.ran("enable --now netbox"));
}

#[test]
fn rollback_stops_services_started_by_the_run() {
    let host = Rc::new(FakeHost::new());
    host.set_service("netbox-rq",
                     FakeService { fail_start: true,
                                   ..FakeService::default() });
    let result = install(&host);

    assert_eq!(result.fatal.as_ref().unwrap().step_id, "start-netbox-rq");
    let netbox = host.service("netbox").unwrap();
    assert!(!netbox.active && !netbox.enabled);
    // nginx ya corría antes: no se toca
    assert!(host.service("nginx").unwrap().active);
    assert!(result.report.rollback.iter().any(|a| a == "stopped and disabled netbox"));
}

#[test]
fn rollback_stops_redis_when_the_run_started_it() {
    let host = Rc::new(FakeHost::new());
    // el primer PING no responde: configure-redis arranca el servicio
    host.fail_times("redis-cli", 1);
    host.fail_on("nginx -t");
    let result = install(&host);

    assert_eq!(status_of(&result, "configure-redis"), StepStatus::Completed);
    assert_eq!(result.fatal.as_ref().unwrap().step_id, "configure-nginx");
    let redis = host.service("redis-server").unwrap();
    assert!(!redis.active && !redis.enabled);
    assert!(result.report.rollback.iter().any(|a| a == "stopped and disabled redis-server"));
}

#[test]
fn housekeeping_failure_only_warns() {
    let host = Rc::new(FakeHost::new());
    host.fail_on("ln -sfn /opt/netbox/contrib");
    let result = install(&host);

    assert!(result.is_success());
    assert_eq!(result.warned, 1);
    assert_eq!(status_of(&result, "install-housekeeping"), StepStatus::Warned);
    assert_eq!(status_of(&result, "start-nginx"), StepStatus::Skipped);
    assert!(host.service("netbox").unwrap().active);
}

#[test]
fn existing_configuration_secrets_are_adopted() {
    let host = Rc::new(FakeHost::new());
    assert!(install(&host).is_success());
    let settings = InstallSettings::default();
    let before = host.file(&settings.config_file().display().to_string()).unwrap().contents;
    host.remove_path("/tmp/netbox-credentials.txt");

    let again = install(&host);
    assert!(again.is_success());
    assert_eq!(status_of(&again, "generate-secrets"), StepStatus::Skipped);
    assert!(host.file("/tmp/netbox-credentials.txt").is_none());
    assert_eq!(host.file(&settings.config_file().display().to_string()).unwrap().contents, before);
}

#[test]
fn preflight_rejects_root_before_any_effect() {
    let host = FakeHost::new().with_uid(0);
    let err = preflight(&host, &InstallSettings::default()).unwrap_err();
    assert!(matches!(err, PreflightError::RunningAsRoot));
    assert!(!host.ran("apt-get"));
    assert!(host.commands().is_empty());
}

#[test]
fn preflight_requires_passwordless_sudo() {
    let host = FakeHost::new().without_sudo();
    let err = preflight(&host, &InstallSettings::default()).unwrap_err();
    assert!(matches!(err, PreflightError::SudoUnavailable(_)));
}

#[test]
fn preflight_rejects_unsupported_platforms() {
    let debian = FakeHost::new().with_os_release("ID=debian\nVERSION_ID=\"12\"\nPRETTY_NAME=\"Debian 12\"\n");
    let err = preflight(&debian, &InstallSettings::default()).unwrap_err();
    assert!(matches!(err, PreflightError::Platform(DomainError::UnsupportedPlatform(_))));

    let old = FakeHost::new().with_os_release("ID=ubuntu\nVERSION_ID=\"20.04\"\nPRETTY_NAME=\"Ubuntu 20.04\"\n");
    assert!(preflight(&old, &InstallSettings::default()).is_err());

    let ok = preflight(&FakeHost::new(), &InstallSettings::default()).unwrap();
    assert_eq!(ok.version_id, "24.04");
}
