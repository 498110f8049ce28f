//! Renderizado de archivos de configuración con Tera.
//!
//! Las plantillas viven en `templates/` y se embeben en el binario con
//! `include_str!`, así el aprovisionador funciona copiando sólo el ejecutable.

use log::debug;
use nbx_domain::{InstallSettings, SecretBundle};
use tera::{Context, Tera};

use crate::AdapterError;

pub const CONFIGURATION: &str = "configuration.py";
pub const GUNICORN: &str = "gunicorn.py";
pub const NETBOX_UNIT: &str = "netbox.service";
pub const NETBOX_RQ_UNIT: &str = "netbox-rq.service";
pub const NGINX_SITE: &str = "nginx-netbox.conf";

/// Dirección donde escucha gunicorn y hacia donde proxya Nginx.
pub const GUNICORN_BIND: &str = "127.0.0.1:8001";
const GUNICORN_WORKERS: u32 = 5;

const ALL_TEMPLATES: &[(&str, &str)] = &[(CONFIGURATION, include_str!("../templates/configuration.py.j2")),
                                         (GUNICORN, include_str!("../templates/gunicorn.py.j2")),
                                         (NETBOX_UNIT, include_str!("../templates/netbox.service.j2")),
                                         (NETBOX_RQ_UNIT, include_str!("../templates/netbox-rq.service.j2")),
                                         (NGINX_SITE, include_str!("../templates/nginx-netbox.conf.j2"))];

#[derive(Debug)]
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    pub fn from_embedded() -> Result<Self, AdapterError> {
        let mut tera = Tera::default();
        for (name, content) in ALL_TEMPLATES {
            tera.add_raw_template(name, content)
                .map_err(|source| AdapterError::Template { name: name.to_string(),
                                                           source })?;
        }
        debug!("loaded {} embedded templates", ALL_TEMPLATES.len());
        Ok(Self { tera })
    }

    fn render(&self, name: &str, ctx: &Context) -> Result<String, AdapterError> {
        self.tera
            .render(name, ctx)
            .map_err(|source| AdapterError::Template { name: name.to_string(),
                                                       source })
    }

    fn paths(settings: &InstallSettings) -> Context {
        let mut ctx = Context::new();
        ctx.insert("user", &settings.service_user);
        ctx.insert("group", settings.service_group());
        ctx.insert("app_root", &settings.app_root().display().to_string());
        ctx.insert("project_dir", &settings.project_dir().display().to_string());
        ctx.insert("venv_bin", &settings.venv_dir().join("bin").display().to_string());
        ctx.insert("gunicorn_config", &settings.gunicorn_config().display().to_string());
        ctx.insert("static_root", &settings.static_root().display().to_string());
        ctx.insert("media_root", &settings.media_root().display().to_string());
        ctx.insert("bind", GUNICORN_BIND);
        ctx
    }

    /// `configuration.py` de NetBox con los secretos de la ejecución.
    pub fn configuration(&self, settings: &InstallSettings, secrets: &SecretBundle) -> Result<String, AdapterError> {
        let mut ctx = Self::paths(settings);
        ctx.insert("allowed_hosts", &settings.allowed_hosts());
        ctx.insert("db_name", &settings.db_name);
        ctx.insert("db_user", &settings.db_user);
        ctx.insert("db_host", &settings.db_host);
        ctx.insert("db_password", secrets.db_password());
        ctx.insert("redis_host", &settings.redis_host);
        ctx.insert("redis_port", &settings.redis_port);
        ctx.insert("redis_password", secrets.redis_password());
        ctx.insert("secret_key", secrets.secret_key());
        ctx.insert("admin_email", &settings.admin_email);
        self.render(CONFIGURATION, &ctx)
    }

    pub fn gunicorn(&self, settings: &InstallSettings) -> Result<String, AdapterError> {
        let mut ctx = Self::paths(settings);
        ctx.insert("workers", &GUNICORN_WORKERS);
        self.render(GUNICORN, &ctx)
    }

    pub fn unit(&self, name: &str, settings: &InstallSettings) -> Result<String, AdapterError> {
        self.render(name, &Self::paths(settings))
    }

    pub fn nginx_site(&self, settings: &InstallSettings) -> Result<String, AdapterError> {
        let mut ctx = Self::paths(settings);
        ctx.insert("domain", settings.domain.trim());
        self.render(NGINX_SITE, &ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netbox_config;

    #[test]
    fn configuration_embeds_run_secrets() {
        let r = TemplateRenderer::from_embedded().unwrap();
        let secrets = SecretBundle::new("pw123", "k$y(=)").unwrap();
        let text = r.configuration(&InstallSettings::default(), &secrets).unwrap();
        assert!(text.contains("ALLOWED_HOSTS = ['localhost', '127.0.0.1']"));
        assert!(text.contains("'PASSWORD': 'pw123',"));
        assert!(text.contains("SECRET_KEY = 'k$y(=)'"));
        assert!(text.contains("('NetBox Admin', 'admin@localhost')"));
        assert_eq!(netbox_config::parse_secrets(&text), Some(secrets));
    }

    #[test]
    fn units_point_into_the_virtualenv() {
        let r = TemplateRenderer::from_embedded().unwrap();
        let s = InstallSettings::default();
        let unit = r.unit(NETBOX_UNIT, &s).unwrap();
        assert!(unit.contains("ExecStart=/opt/netbox/venv/bin/gunicorn"));
        assert!(unit.contains("Restart=on-failure"));
        assert!(unit.contains("WorkingDirectory=/opt/netbox\n"));
        let rq = r.unit(NETBOX_RQ_UNIT, &s).unwrap();
        assert!(rq.contains("manage.py rqworker"));
    }

    #[test]
    fn nginx_proxies_to_gunicorn() {
        let r = TemplateRenderer::from_embedded().unwrap();
        let s = InstallSettings { domain: "netbox.example.com".into(), ..InstallSettings::default() };
        let site = r.nginx_site(&s).unwrap();
        assert!(site.contains("server_name netbox.example.com;"));
        assert!(site.contains("proxy_pass http://127.0.0.1:8001;"));
        assert!(site.contains("alias /opt/netbox/netbox/static/;"));
        assert!(r.gunicorn(&s).unwrap().contains("bind = '127.0.0.1:8001'"));
    }
}
