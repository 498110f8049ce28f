//! Service Health Checker.
//!
//! Consulta en vivo `systemctl is-active`; no hay cache ni reintentos, cada
//! llamada refleja el estado del host en ese instante.

use std::rc::Rc;

use log::debug;
use nbx_domain::ServiceStatus;

use crate::{CommandSpec, Host};

#[derive(Clone)]
pub struct HealthChecker {
    host: Rc<dyn Host>,
}

impl HealthChecker {
    pub fn new(host: Rc<dyn Host>) -> Self {
        Self { host }
    }

    pub fn check(&self, service: &str) -> ServiceStatus {
        let cmd = CommandSpec::new("systemctl").arg("is-active").arg(service);
        match self.host.run(&cmd) {
            Ok(out) => ServiceStatus::from_is_active(out.stdout.trim()),
            Err(e) => {
                debug!("health probe for {service} failed: {e}");
                ServiceStatus::Unknown
            }
        }
    }

    pub fn check_all<'a, I>(&self, services: I) -> Vec<(String, ServiceStatus)>
        where I: IntoIterator<Item = &'a str>
    {
        services.into_iter().map(|s| (s.to_string(), self.check(s))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeHost, FakeService};
    use crate::services;

    #[test]
    fn health_follows_live_state() {
        let host = Rc::new(FakeHost::new());
        host.set_service("netbox", FakeService::default());
        let checker = HealthChecker::new(host.clone());

        assert_eq!(checker.check("netbox"), ServiceStatus::Inactive);
        services::enable_now(host.as_ref(), "netbox").unwrap();
        assert_eq!(checker.check("netbox"), ServiceStatus::Active);
        host.stop_service("netbox");
        assert_eq!(checker.check("netbox"), ServiceStatus::Inactive);
    }

    #[test]
    fn failed_health_queries_are_unknown() {
        let host = Rc::new(FakeHost::new());
        host.fail_on("is-active redis-server");
        assert_eq!(HealthChecker::new(host).check("redis-server"), ServiceStatus::Unknown);
    }

    #[test]
    fn failed_start_leaves_service_inactive() {
        let host = Rc::new(FakeHost::new());
        host.set_service("netbox-rq",
                         FakeService { fail_start: true,
                                       ..FakeService::default() });
        assert!(services::enable_now(host.as_ref(), "netbox-rq").is_err());
        assert_eq!(HealthChecker::new(host).check("netbox-rq"), ServiceStatus::Inactive);
    }
}
