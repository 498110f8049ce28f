//! Lectura de valores de un `configuration.py` ya escrito.
//!
//! No es un parser de Python: reconoce la forma que produce la plantilla
//! (asignaciones `KEY = '...'` y diccionarios con una clave por línea), que
//! también es la del `configuration_example.py` de NetBox.

use nbx_domain::SecretBundle;

/// Claves que debe definir una configuración utilizable.
pub const REQUIRED_KEYS: &[&str] = &["ALLOWED_HOSTS", "DATABASE", "REDIS", "SECRET_KEY"];

/// Parámetros de conexión del diccionario `DATABASE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub name: String,
    pub user: String,
    pub password: String,
    pub host: String,
}

fn unquote(raw: &str) -> Option<String> {
    let v = raw.trim().trim_end_matches(',').trim();
    let quote = v.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    v.strip_prefix(quote)?.strip_suffix(quote).map(str::to_string)
}

/// Valor de una asignación de nivel superior (`SECRET_KEY = '...'`).
pub fn top_level(text: &str, key: &str) -> Option<String> {
    text.lines()
        .filter(|l| !l.starts_with(' ') && !l.starts_with('\t'))
        .find_map(|l| {
            let (k, v) = l.split_once('=')?;
            (k.trim() == key).then(|| unquote(v)).flatten()
        })
}

/// Entradas `'KEY': 'value'` del primer nivel del diccionario `dict`.
fn dict_entry(text: &str, dict: &str, key: &str) -> Option<String> {
    let mut inside = false;
    for line in text.lines() {
        let trimmed = line.trim();
        if !inside {
            inside = trimmed.split_once('=').is_some_and(|(k, v)| k.trim() == dict && v.trim() == "{");
            continue;
        }
        if line.starts_with('}') {
            return None;
        }
        let Some((k, v)) = trimmed.split_once(':') else { continue };
        if unquote(k).as_deref() == Some(key) {
            return unquote(v);
        }
    }
    None
}

pub fn defines(text: &str, key: &str) -> bool {
    text.lines().any(|l| l.split_once('=').is_some_and(|(k, _)| !l.starts_with(' ') && k.trim() == key))
}

pub fn parse_database(text: &str) -> Option<DatabaseConfig> {
    Some(DatabaseConfig { name: dict_entry(text, "DATABASE", "NAME")?,
                          user: dict_entry(text, "DATABASE", "USER")?,
                          password: dict_entry(text, "DATABASE", "PASSWORD")?,
                          host: dict_entry(text, "DATABASE", "HOST").unwrap_or_default() })
}

/// Secretos comprometidos en la configuración, si están completos.
pub fn parse_secrets(text: &str) -> Option<SecretBundle> {
    let secret_key = top_level(text, "SECRET_KEY")?;
    let db = parse_database(text)?;
    SecretBundle::new(db.password, secret_key).ok()
}
