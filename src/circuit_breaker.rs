use failsafe::{backoff, failure_policy, Config};
use std::time::Duration;

/// Creates a circuit breaker for actor-platform calls so a degraded
/// provider fails fast instead of stacking up poll loops.
///
/// - **Failure threshold**: 5 consecutive failures triggers OPEN state.
/// - **Backoff**: exponential from 10s to 60s before attempting recovery.
pub fn create_provider_circuit_breaker() -> impl failsafe::CircuitBreaker {
    let backoff_strategy = backoff::exponential(
        Duration::from_secs(10), // Initial delay
        Duration::from_secs(60), // Maximum delay
    );

    let failure_policy = failure_policy::consecutive_failures(5, backoff_strategy);

    Config::new().failure_policy(failure_policy).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use failsafe::{CircuitBreaker, Error};

    #[test]
    fn opens_after_consecutive_failures() {
        let cb = create_provider_circuit_breaker();

        for _ in 0..5 {
            let result: Result<(), Error<&str>> =
                cb.call(|| Err::<(), &str>("provider unavailable"));
            assert!(result.is_err());
        }

        let result: Result<(), Error<&str>> = cb.call(|| Ok::<(), &str>(()));
        match result {
            Err(Error::Rejected) => {} // circuit is open, expected
            _ => panic!("Expected circuit to be open and reject requests"),
        }
    }

    #[test]
    fn passes_successes_through() {
        let cb = create_provider_circuit_breaker();

        let result: Result<i32, Error<&str>> = cb.call(|| Ok::<i32, &str>(7));
        assert_eq!(result.unwrap(), 7);
    }
}
