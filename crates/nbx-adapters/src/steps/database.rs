//! Redis y PostgreSQL.

use log::info;
use nbx_core::{RunContext, StepDefinition, StepError, StepOutput, StepRunResult};
use nbx_domain::InstallSettings;
use nbx_host::{services, CommandSpec, Host, HostError};

use super::StepEnv;
use crate::netbox_config::DatabaseConfig;

/// Identificador SQL entre comillas dobles.
pub fn sql_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Literal SQL entre comillas simples.
pub fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// `redis-cli ping` contra el Redis configurado.
pub fn redis_answers(host: &dyn Host, settings: &InstallSettings) -> Result<bool, HostError> {
    let out = host.run(&CommandSpec::new("redis-cli").arg("-h")
                                                     .arg(&settings.redis_host)
                                                     .arg("-p")
                                                     .arg(settings.redis_port.to_string())
                                                     .arg("ping"))?;
    Ok(out.success() && out.stdout.trim() == "PONG")
}

/// Login TCP con usuario y contraseña, como lo hará NetBox.
pub fn database_login(host: &dyn Host, db: &DatabaseConfig) -> Result<bool, HostError> {
    let server = if db.host.is_empty() { "localhost" } else { db.host.as_str() };
    let out = host.run(&CommandSpec::new("psql").args(["-h", server, "-U", db.user.as_str()])
                                                .args(["-d", db.name.as_str(), "-tAc", "SELECT 1"])
                                                .env("PGPASSWORD", db.password.as_str()))?;
    Ok(out.success() && out.stdout.trim() == "1")
}

fn run_credentials(ctx: &RunContext) -> Result<DatabaseConfig, StepError> {
    let s = &ctx.settings;
    Ok(DatabaseConfig { name: s.db_name.clone(),
                        user: s.db_user.clone(),
                        password: ctx.secrets()?.db_password().to_string(),
                        host: s.db_host.clone() })
}

fn postgres(host: &dyn Host, query: &str) -> Result<bool, HostError> {
    let out = host.run_checked(&CommandSpec::as_user("psql", "postgres").args(["-tAc", query]))?;
    Ok(out.stdout.trim() == "1")
}

pub struct ConfigureRedis {
    env: StepEnv,
}

impl ConfigureRedis {
    pub fn new(env: StepEnv) -> Self {
        Self { env }
    }

    fn apply(&self, ctx: &RunContext) -> Result<Vec<StepOutput>, StepError> {
        services::enable_now(self.env.host(), "redis-server")?;
        if !redis_answers(self.env.host(), &ctx.settings)? {
            return Err(StepError::Verification("redis did not answer PING".into()));
        }
        Ok(vec![StepOutput::ServiceStarted("redis-server".into())])
    }
}

impl StepDefinition for ConfigureRedis {
    fn id(&self) -> &str {
        "configure-redis"
    }

    fn is_satisfied(&self, ctx: &RunContext) -> Result<bool, StepError> {
        Ok(redis_answers(self.env.host(), &ctx.settings)?)
    }

    fn run(&self, ctx: &RunContext) -> StepRunResult {
        self.apply(ctx).into()
    }
}

/// Rol y base de NetBox. El predicado intenta autenticarse con las
/// credenciales de la ejecución; si el rol existe con otra contraseña la
/// acción la reemplaza.
pub struct ConfigureDatabase {
    env: StepEnv,
}

impl ConfigureDatabase {
    pub fn new(env: StepEnv) -> Self {
        Self { env }
    }

    fn apply(&self, ctx: &RunContext) -> Result<Vec<StepOutput>, StepError> {
        let host = self.env.host();
        let s = &ctx.settings;
        let password = ctx.secrets()?.db_password();
        let (role, db) = (sql_ident(&s.db_user), sql_ident(&s.db_name));

        let role_exists = postgres(host, &format!("SELECT 1 FROM pg_roles WHERE rolname={}", sql_literal(&s.db_user)))?;
        let db_exists = postgres(host, &format!("SELECT 1 FROM pg_database WHERE datname={}", sql_literal(&s.db_name)))?;

        let mut sql = if role_exists {
            format!("ALTER ROLE {role} WITH LOGIN PASSWORD {};\n", sql_literal(password))
        } else {
            format!("CREATE ROLE {role} LOGIN PASSWORD {};\n", sql_literal(password))
        };
        if !db_exists {
            sql.push_str(&format!("CREATE DATABASE {db} OWNER {role};\n"));
        }
        sql.push_str(&format!("ALTER DATABASE {db} OWNER TO {role};\n"));
        sql.push_str(&format!("GRANT ALL PRIVILEGES ON DATABASE {db} TO {role};\n"));
        host.run_checked(&CommandSpec::as_user("psql", "postgres").args(["-v", "ON_ERROR_STOP=1", "-q"]).stdin(sql))?;

        if !database_login(host, &run_credentials(ctx)?)? {
            return Err(StepError::Verification(format!("cannot log in to database {} as {}", s.db_name, s.db_user)));
        }
        info!("database {} ready (role {})", s.db_name, s.db_user);
        Ok(vec![])
    }
}

impl StepDefinition for ConfigureDatabase {
    fn id(&self) -> &str {
        "configure-database"
    }

    fn is_satisfied(&self, ctx: &RunContext) -> Result<bool, StepError> {
        Ok(database_login(self.env.host(), &run_credentials(ctx)?)?)
    }

    fn run(&self, ctx: &RunContext) -> StepRunResult {
        self.apply(ctx).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_doubles_the_quote_char() {
        assert_eq!(sql_ident("net\"box"), "\"net\"\"box\"");
        assert_eq!(sql_literal("it's"), "'it''s'");
    }
}
