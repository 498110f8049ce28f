//! Carga de `.env` una sola vez por proceso.
//!
//! Los binarios llaman `init_dotenv()` antes de parsear flags para que las
//! variables `NETBOX_*` definidas en `.env` actúen como valores por defecto.

use dotenvy::dotenv;
use once_cell::sync::Lazy;

static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

/// Forzar carga temprana de .env.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}
