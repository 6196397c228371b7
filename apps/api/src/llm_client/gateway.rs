//! Generation gateway — bounded retries around a [`TextGenerator`] transport.
//!
//! This is the only place in the pipeline where model-service instability
//! is absorbed. Everything downstream of it is total.

use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::{GenerateParams, LlmError, TextGenerator};
use crate::config::Config;

/// Retry policy for one logical generation call.
/// Attempts within a call are strictly sequential; delay is fixed, not
/// exponential.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            attempts: config.retry_count.max(1),
            delay: Duration::from_secs(config.retry_delay_secs),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// Wraps a transport with the retry policy. Cheap to clone.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<dyn TextGenerator>,
    policy: RetryPolicy,
}

impl Gateway {
    pub fn new(inner: Arc<dyn TextGenerator>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Issues one logical generation request.
    ///
    /// Retries on transient failures (transport trouble, malformed
    /// envelope, empty output) up to the attempt budget, sleeping the
    /// fixed delay between attempts. Terminal failures short-circuit
    /// without consuming the remaining budget. Never panics; the caller
    /// always gets text or a typed failure.
    pub async fn invoke(&self, prompt: &str, params: &GenerateParams) -> Result<String, LlmError> {
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..self.policy.attempts {
            if attempt > 0 {
                tokio::time::sleep(self.policy.delay).await;
            }

            let outcome = self.inner.generate(prompt, params).await;

            let error = match outcome {
                Ok(text) if !text.trim().is_empty() => return Ok(text),
                Ok(_) => LlmError::EmptyOutput,
                Err(e) => e,
            };

            if !error.is_retryable() {
                return Err(error);
            }

            warn!(
                "generation attempt {}/{} failed: {}",
                attempt + 1,
                self.policy.attempts,
                error
            );
            last_error = Some(error);
        }

        Err(LlmError::RetriesExhausted {
            attempts: self.policy.attempts,
            last: Box::new(last_error.unwrap_or(LlmError::EmptyOutput)),
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scripted generator: pops one canned outcome per call.
    /// Once the script is exhausted it keeps returning the final entry.
    pub struct ScriptedGenerator {
        script: Mutex<Vec<Result<String, LlmError>>>,
        pub calls: Mutex<u32>,
    }

    impl ScriptedGenerator {
        pub fn new(script: Vec<Result<String, LlmError>>) -> Self {
            Self {
                script: Mutex::new(script),
                calls: Mutex::new(0),
            }
        }

        pub fn always(text: &str) -> Self {
            Self::new(vec![Ok(text.to_string())])
        }

        pub fn call_count(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(
            &self,
            _prompt: &str,
            _params: &GenerateParams,
        ) -> Result<String, LlmError> {
            *self.calls.lock().unwrap() += 1;
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.remove(0)
            } else {
                match script.first() {
                    Some(Ok(text)) => Ok(text.clone()),
                    Some(Err(LlmError::EmptyOutput)) => Err(LlmError::EmptyOutput),
                    Some(Err(e)) => Err(LlmError::Transport(e.to_string())),
                    None => Err(LlmError::EmptyOutput),
                }
            }
        }
    }

    /// A gateway with zero inter-attempt delay, for fast tests.
    pub fn fast_gateway(generator: ScriptedGenerator) -> (Gateway, Arc<ScriptedGenerator>) {
        let generator = Arc::new(generator);
        let gateway = Gateway::new(
            generator.clone(),
            RetryPolicy {
                attempts: 3,
                delay: Duration::ZERO,
            },
        );
        (gateway, generator)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{fast_gateway, ScriptedGenerator};
    use super::*;

    #[tokio::test]
    async fn test_first_attempt_success_makes_one_call() {
        let (gateway, generator) = fast_gateway(ScriptedGenerator::always("ok"));
        let text = gateway.invoke("p", &GenerateParams::default()).await.unwrap();
        assert_eq!(text, "ok");
        assert_eq!(generator.call_count(), 1);
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let (gateway, generator) = fast_gateway(ScriptedGenerator::new(vec![
            Err(LlmError::Transport("connection reset".into())),
            Err(LlmError::EmptyOutput),
            Ok("recovered".into()),
        ]));
        let text = gateway.invoke("p", &GenerateParams::default()).await.unwrap();
        assert_eq!(text, "recovered");
        assert_eq!(generator.call_count(), 3);
    }

    #[tokio::test]
    async fn test_empty_text_counts_as_empty_output() {
        let (gateway, generator) = fast_gateway(ScriptedGenerator::new(vec![
            Ok("   \n".into()),
            Ok("real".into()),
        ]));
        let text = gateway.invoke("p", &GenerateParams::default()).await.unwrap();
        assert_eq!(text, "real");
        assert_eq!(generator.call_count(), 2);
    }

    #[tokio::test]
    async fn test_exhausts_budget_on_persistent_empty_output() {
        let (gateway, generator) =
            fast_gateway(ScriptedGenerator::new(vec![Err(LlmError::EmptyOutput)]));
        let err = gateway
            .invoke("p", &GenerateParams::default())
            .await
            .unwrap_err();
        assert_eq!(generator.call_count(), 3);
        match err {
            LlmError::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, LlmError::EmptyOutput));
            }
            other => panic!("expected RetriesExhausted, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_terminal_failure_short_circuits() {
        let (gateway, generator) = fast_gateway(ScriptedGenerator::new(vec![
            Err(LlmError::MissingField("response")),
            Ok("never reached".into()),
        ]));
        let err = gateway
            .invoke("p", &GenerateParams::default())
            .await
            .unwrap_err();
        assert_eq!(generator.call_count(), 1);
        assert!(matches!(err, LlmError::MissingField("response")));
    }
}
