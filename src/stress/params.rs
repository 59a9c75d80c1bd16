//! Stress job parameters and their validation.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Resource targeted by a stress job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StressKind {
    Cpu,
    Memory,
}

impl StressKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StressKind::Cpu => "cpu",
            StressKind::Memory => "memory",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            StressKind::Cpu => "CPU",
            StressKind::Memory => "Memory",
        }
    }
}

impl fmt::Display for StressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected stress parameters. Nothing has been started when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StressError {
    #[error("{} percentage must be between 0 and 100", .0.label())]
    Intensity(StressKind),

    #[error("Duration must be non-negative")]
    Duration,
}

/// Validated parameters of one stress job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StressParams {
    pub kind: StressKind,
    /// Target utilisation, 0–100 inclusive.
    pub percent: u8,
    /// Whole seconds; no upper bound.
    pub duration_secs: u64,
}

impl StressParams {
    /// Parse raw query values. Missing, non-numeric and out-of-range values
    /// are all rejected; intensity is checked before duration.
    pub fn parse(
        kind: StressKind,
        percent: Option<&str>,
        duration: Option<&str>,
    ) -> Result<Self, StressError> {
        let percent = percent
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|p| (0..=100).contains(p))
            .ok_or(StressError::Intensity(kind))?;

        let duration_secs = duration
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|d| *d >= 0)
            .ok_or(StressError::Duration)?;

        Ok(Self {
            kind,
            percent: percent as u8,
            duration_secs: duration_secs as u64,
        })
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    /// Acknowledgement returned to the caller once the job is started.
    pub fn describe(&self) -> String {
        format!(
            "{} stressed at {}% for {} seconds",
            self.kind.label(),
            self.percent,
            self.duration_secs
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_inclusive_bounds() {
        let low = StressParams::parse(StressKind::Cpu, Some("0"), Some("0")).unwrap();
        assert_eq!((low.percent, low.duration_secs), (0, 0));

        let high = StressParams::parse(StressKind::Memory, Some("100"), Some("86400")).unwrap();
        assert_eq!((high.percent, high.duration_secs), (100, 86_400));
    }

    #[test]
    fn rejects_out_of_range_intensity() {
        for raw in ["150", "-1", "101"] {
            assert_eq!(
                StressParams::parse(StressKind::Cpu, Some(raw), Some("1")),
                Err(StressError::Intensity(StressKind::Cpu))
            );
        }
    }

    #[test]
    fn rejects_non_numeric_or_missing_values() {
        assert_eq!(
            StressParams::parse(StressKind::Memory, Some("lots"), Some("1")),
            Err(StressError::Intensity(StressKind::Memory))
        );
        assert_eq!(
            StressParams::parse(StressKind::Memory, None, Some("1")),
            Err(StressError::Intensity(StressKind::Memory))
        );
        assert_eq!(
            StressParams::parse(StressKind::Cpu, Some("10"), Some("soon")),
            Err(StressError::Duration)
        );
        assert_eq!(
            StressParams::parse(StressKind::Cpu, Some("10"), Some("-5")),
            Err(StressError::Duration)
        );
    }

    #[test]
    fn messages_name_the_resource() {
        assert_eq!(
            StressError::Intensity(StressKind::Cpu).to_string(),
            "CPU percentage must be between 0 and 100"
        );
        assert_eq!(
            StressError::Intensity(StressKind::Memory).to_string(),
            "Memory percentage must be between 0 and 100"
        );
        let params = StressParams::parse(StressKind::Cpu, Some("40"), Some("3")).unwrap();
        assert_eq!(params.describe(), "CPU stressed at 40% for 3 seconds");
    }
}
