//! Generador de credenciales.
//!
//! `SecretBundle` agrupa la contraseña de base de datos y la `SECRET_KEY` de
//! la aplicación. Se genera una sola vez por ejecución con el CSPRNG del
//! sistema operativo y se serializa como líneas `KEY=VALUE`.
use std::fmt;

use rand::rngs::OsRng;
use rand::{CryptoRng, Rng, RngCore};

use crate::DomainError;

const PASSWORD_LEN: usize = 32;
const SECRET_KEY_LEN: usize = 50;
const PASSWORD_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
// Alfabeto de netbox/generate_secret_key.py (sin comillas ni backslash).
const SECRET_KEY_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*(-_=+)";

pub const DB_PASSWORD_KEY: &str = "DB_PASSWORD";
pub const SECRET_KEY_KEY: &str = "SECRET_KEY";
pub const REDIS_PASSWORD_KEY: &str = "REDIS_PASSWORD";

#[derive(Clone, PartialEq, Eq)]
pub struct SecretBundle {
    db_password: String,
    secret_key: String,
    /// Vacío por defecto: el Redis local corre sin autenticación.
    redis_password: String,
}

// Nunca imprimir valores en logs.
impl fmt::Debug for SecretBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretBundle")
         .field("db_password", &"<redacted>")
         .field("secret_key", &"<redacted>")
         .field("redis_password", &if self.redis_password.is_empty() { "" } else { "<redacted>" })
         .finish()
    }
}

impl SecretBundle {
    pub fn new(db_password: impl Into<String>, secret_key: impl Into<String>) -> Result<Self, DomainError> {
        let bundle = Self { db_password: db_password.into(),
                            secret_key: secret_key.into(),
                            redis_password: String::new() };
        if bundle.db_password.is_empty() || bundle.secret_key.is_empty() {
            return Err(DomainError::ValidationError("secret values must not be empty".into()));
        }
        Ok(bundle)
    }

    /// Genera un bundle nuevo desde el CSPRNG del sistema operativo.
    pub fn generate() -> Self {
        Self::generate_with(&mut OsRng)
    }

    pub fn generate_with<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self { db_password: random_string(rng, PASSWORD_ALPHABET, PASSWORD_LEN),
               secret_key: random_string(rng, SECRET_KEY_ALPHABET, SECRET_KEY_LEN),
               redis_password: String::new() }
    }

    pub fn with_redis_password(mut self, password: impl Into<String>) -> Self {
        self.redis_password = password.into();
        self
    }

    pub fn db_password(&self) -> &str {
        &self.db_password
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    pub fn redis_password(&self) -> &str {
        &self.redis_password
    }

    /// Contenido del archivo de credenciales (`KEY=VALUE` por línea).
    pub fn to_env_file(&self) -> String {
        let mut out = format!("{DB_PASSWORD_KEY}={}\n{SECRET_KEY_KEY}={}\n", self.db_password, self.secret_key);
        if !self.redis_password.is_empty() {
            out.push_str(&format!("{REDIS_PASSWORD_KEY}={}\n", self.redis_password));
        }
        out
    }

    /// Inverso de `to_env_file`. Ignora comentarios, líneas vacías y claves
    /// desconocidas; el valor es todo lo que sigue al primer `=`.
    pub fn from_env_file(contents: &str) -> Result<Self, DomainError> {
        let mut db_password = None;
        let mut secret_key = None;
        let mut redis_password = String::new();
        for (n, line) in contents.lines().map(str::trim).enumerate() {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(DomainError::ParseError(format!("malformed secrets line {}", n + 1)));
            };
            match key.trim() {
                DB_PASSWORD_KEY => db_password = Some(value.to_string()),
                SECRET_KEY_KEY => secret_key = Some(value.to_string()),
                REDIS_PASSWORD_KEY => redis_password = value.to_string(),
                _ => {}
            }
        }
        match (db_password, secret_key) {
            (Some(p), Some(k)) => Ok(Self::new(p, k)?.with_redis_password(redis_password)),
            _ => Err(DomainError::ParseError("secrets file is missing DB_PASSWORD or SECRET_KEY".into())),
        }
    }
}

fn random_string<R: RngCore + CryptoRng>(rng: &mut R, alphabet: &[u8], len: usize) -> String {
    (0..len).map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_values_have_expected_shape() {
        let b = SecretBundle::generate();
        assert_eq!(b.db_password().len(), PASSWORD_LEN);
        assert_eq!(b.secret_key().len(), SECRET_KEY_LEN);
        assert!(b.db_password().bytes().all(|c| PASSWORD_ALPHABET.contains(&c)));
        assert!(b.secret_key().bytes().all(|c| SECRET_KEY_ALPHABET.contains(&c)));
        assert!(!b.secret_key().contains('\'') && !b.secret_key().contains('\\'));
    }

    #[test]
    fn two_generations_differ() {
        assert_ne!(SecretBundle::generate(), SecretBundle::generate());
    }

    #[test]
    fn env_file_parses_back() {
        let b = SecretBundle::new("pw", "k=ey").unwrap();
        let text = format!("# generated\n{}", b.to_env_file());
        assert_eq!(SecretBundle::from_env_file(&text).unwrap(), b);
    }

    #[test]
    fn redis_password_is_optional() {
        let b = SecretBundle::new("pw", "key").unwrap();
        assert!(!b.to_env_file().contains(REDIS_PASSWORD_KEY));
        let with = b.with_redis_password("r3d1s");
        assert_eq!(SecretBundle::from_env_file(&with.to_env_file()).unwrap().redis_password(), "r3d1s");
    }

    #[test]
    fn env_file_missing_key_fails() {
        assert!(SecretBundle::from_env_file("DB_PASSWORD=x\n").is_err());
        assert!(SecretBundle::from_env_file("garbage\n").is_err());
    }

    #[test]
    fn debug_redacts_values() {
        let b = SecretBundle::new("hunter2", "topsecret").unwrap();
        let dbg = format!("{b:?}");
        assert!(!dbg.contains("hunter2") && !dbg.contains("topsecret"));
    }
}
