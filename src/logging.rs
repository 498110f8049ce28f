//! Backend de `log`: `env_logger` con `RUST_LOG`, `info` por defecto.
use env_logger::Env;

pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(default)).format_target(false)
                                                                                  .try_init();
}
