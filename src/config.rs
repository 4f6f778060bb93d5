use crate::*;

/// Параметры обучения
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrainingConfig {
    /// Скорость обучения [0.0 .. 1.0]
    pub eta: f64,
    /// Момент: доля предыдущего изменения веса [0.0 .. n]
    pub alpha: f64,
    /// Коэффициент сглаживания средней ошибки [0.0 .. n]
    pub error_smoothing: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            eta: 0.15,
            alpha: 0.5,
            error_smoothing: 0.0,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.eta.is_finite() && (0.0..=1.0).contains(&self.eta)) {
            return Err(NetworkError::InvalidConfig {
                parameter: "eta",
                value: self.eta,
            });
        }
        for (parameter, value) in [("alpha", self.alpha), ("error_smoothing", self.error_smoothing)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(NetworkError::InvalidConfig { parameter, value });
            }
        }
        Ok(())
    }
}
