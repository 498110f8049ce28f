use std::time::Duration;

/// Qué hace el runner cuando la acción de un step falla.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Detiene la ejecución, dispara rollback y reporta el step.
    Abort,
    /// Registra el fallo y continúa con el siguiente step.
    WarnAndContinue,
}

/// Reintentos acotados con backoff lineal (`backoff * intento`).
///
/// Sólo lo declaran steps con operaciones de red transitorias (descargas de
/// paquetes, release, dependencias Python).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub const fn none() -> Self {
        Self { max_attempts: 1,
               backoff: Duration::ZERO }
    }

    pub const fn network() -> Self {
        Self { max_attempts: 3,
               backoff: Duration::from_secs(5) }
    }

    pub const fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self { max_attempts, backoff }
    }

    /// Espera antes del intento `attempt + 1` (attempt empieza en 1).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_linearly() {
        let p = RetryPolicy::new(3, Duration::from_millis(10));
        assert_eq!(p.delay_after(1), Duration::from_millis(10));
        assert_eq!(p.delay_after(2), Duration::from_millis(20));
        assert_eq!(RetryPolicy::default().max_attempts, 1);
    }
}
