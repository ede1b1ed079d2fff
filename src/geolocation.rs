//! Device position lookup.
//!
//! A one-shot fix from whatever sensor the host exposes, bounded by a timeout.

use std::time::Duration;

use address_wizard_types::Coordinate;
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::GeolocationError;
use crate::GEOLOCATION_TIMEOUT_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_millis(GEOLOCATION_TIMEOUT_MS),
        }
    }
}

/// Host-provided position sensor.
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<Coordinate, GeolocationError>;
}

/// Request one fix, giving up after `options.timeout`.
pub async fn locate(
    source: &dyn LocationSource,
    options: &PositionOptions,
) -> Result<Coordinate, GeolocationError> {
    debug!(high_accuracy = options.high_accuracy, timeout = ?options.timeout, "requesting position fix");

    let result = match tokio::time::timeout(options.timeout, source.current_position(options)).await
    {
        Ok(result) => result,
        Err(_) => Err(GeolocationError::Timeout(options.timeout)),
    };

    if let Err(e) = &result {
        warn!(error = %e, "position fix failed");
    }
    result
}

/// Source that always answers the same way. Stands in for a sensor on hosts
/// that have none (terminals, tests).
#[derive(Debug, Clone)]
pub struct FixedLocation {
    answer: Result<Coordinate, GeolocationError>,
}

impl FixedLocation {
    pub fn at(coordinate: Coordinate) -> Self {
        Self {
            answer: Ok(coordinate),
        }
    }

    pub fn failing(error: GeolocationError) -> Self {
        Self { answer: Err(error) }
    }

    pub fn unavailable() -> Self {
        Self::failing(GeolocationError::Unavailable)
    }
}

#[async_trait]
impl LocationSource for FixedLocation {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinate, GeolocationError> {
        self.answer.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NeverAnswers;

    #[async_trait]
    impl LocationSource for NeverAnswers {
        async fn current_position(
            &self,
            _options: &PositionOptions,
        ) -> Result<Coordinate, GeolocationError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(GeolocationError::Unavailable)
        }
    }

    #[tokio::test]
    async fn test_fixed_location_answers() {
        let source = FixedLocation::at(Coordinate::new(28.67, 77.45));
        let fix = locate(&source, &PositionOptions::default()).await.unwrap();
        assert_eq!(fix, Coordinate::new(28.67, 77.45));

        let denied = FixedLocation::failing(GeolocationError::PermissionDenied);
        assert_eq!(
            locate(&denied, &PositionOptions::default()).await,
            Err(GeolocationError::PermissionDenied)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_sensor_times_out_after_ten_seconds() {
        let started = tokio::time::Instant::now();
        let result = locate(&NeverAnswers, &PositionOptions::default()).await;

        assert_eq!(
            result,
            Err(GeolocationError::Timeout(Duration::from_secs(10)))
        );
        assert!(started.elapsed() >= Duration::from_secs(10));
    }
}
