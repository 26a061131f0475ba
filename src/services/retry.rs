//! Retry com backoff exponencial para chamadas aos provedores
//!
//! Só erros transitórios (429, 5xx, falha de conexão) são repetidos; os demais
//! retornam na primeira tentativa. Um 5xx pode vir depois do provedor aceitar
//! a mensagem, então a repetição pode gerar envio duplicado nesse caso.

use std::future::Future;
use std::time::Duration;

use crate::config::DeliverySettings;
use crate::utils::logging::log_provider_error;

/// Erro que sabe dizer se vale a pena tentar de novo
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for evolution::EvolutionError {
    fn is_transient(&self) -> bool {
        evolution::EvolutionError::is_transient(self)
    }
}

impl Transient for meta_graph::GraphError {
    fn is_transient(&self) -> bool {
        meta_graph::GraphError::is_transient(self)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&DeliverySettings::default())
    }
}

impl RetryPolicy {
    pub fn from_settings(settings: &DeliverySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
            max_backoff: Duration::from_millis(settings.max_backoff_ms),
        }
    }

    /// Espera antes da tentativa seguinte a `attempt` (1-based): 100ms, 200ms, 400ms...
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
    }
}

/// Executa `operation` até `max_attempts` vezes enquanto o erro for transitório
pub async fn retry_with_backoff<T, E, F, Fut>(policy: &RetryPolicy, provider: &str, mut operation: F) -> Result<T, E>
where
    E: Transient + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                log_provider_error(provider, attempt, &e.to_string());

                if !e.is_transient() || attempt >= policy.max_attempts {
                    return Err(e);
                }

                let backoff = policy.backoff_for(attempt);
                tracing::warn!(
                    "⚠️ Tentativa {}/{} falhou ({}). Retry em {}ms...",
                    attempt,
                    policy.max_attempts,
                    provider,
                    backoff.as_millis()
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct FakeError {
        transient: bool,
    }

    impl std::fmt::Display for FakeError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "fake error (transient: {})", self.transient)
        }
    }

    impl Transient for FakeError {
        fn is_transient(&self) -> bool {
            self.transient
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(4),
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(300),
        };
        assert_eq!(policy.backoff_for(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(200));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(300));
        assert_eq!(policy.backoff_for(40), Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried_until_success() {
        let calls = AtomicU32::new(0);
        let result: Result<&str, FakeError> = retry_with_backoff(&fast_policy(3), "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err(FakeError { transient: true })
                } else {
                    Ok("ok")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), FakeError> = retry_with_backoff(&fast_policy(5), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(FakeError { transient: false }) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), FakeError> = retry_with_backoff(&fast_policy(2), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(FakeError { transient: true }) }
        })
        .await;

        assert!(result.unwrap_err().transient);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
