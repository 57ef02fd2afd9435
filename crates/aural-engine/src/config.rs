//! Environment-variable configuration, read once at device-open time.
//!
//! Mirrors spec.md §6's environment variable table, renamed to this
//! project's own prefix. No config-file reading (an explicit non-goal) —
//! only the ambient environment-variable surface, which non-goals don't
//! scope out.

use std::env;

/// Logging verbosity, mirroring `ALSOFT_LOGLEVEL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn from_env_value(v: &str) -> Self {
        match v.trim() {
            "0" => Self::Off,
            "1" => Self::Error,
            "2" => Self::Warn,
            "3" => Self::Info,
            "4" => Self::Debug,
            "5" => Self::Trace,
            _ => Self::default(),
        }
    }

    pub fn as_tracing_filter(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Whether deferred-update batching (`alcSuspendContext`/`alcProcessContext`)
/// is honored, mirroring `__ALSOFT_SUSPEND_CONTEXT=ignore`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuspendContextMode {
    #[default]
    Honor,
    Ignore,
}

/// Process-wide configuration read once from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: LogLevel,
    pub log_file: Option<String>,
    pub driver_order: Vec<DriverSpec>,
    pub default_reverb: Option<String>,
    pub suspend_context: SuspendContextMode,
    pub half_angle_cones: bool,
    pub reverse_z: bool,
}

/// One entry in the backend driver-order list: a name plus whether it was
/// explicitly excluded with a leading `-`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverSpec {
    pub name: String,
    pub excluded: bool,
}

impl Config {
    /// Reads configuration from the process environment. Never panics —
    /// malformed values fall back to defaults.
    pub fn from_env() -> Self {
        let log_level = env::var("AURAL_LOGLEVEL")
            .map(|v| LogLevel::from_env_value(&v))
            .unwrap_or_default();
        let log_file = env::var("AURAL_LOGFILE").ok();
        let driver_order = env::var("AURAL_DRIVERS")
            .map(|v| parse_driver_order(&v))
            .unwrap_or_default();
        let default_reverb = env::var("AURAL_DEFAULT_REVERB").ok();
        let suspend_context = match env::var("AURAL_SUSPEND_CONTEXT").as_deref() {
            Ok("ignore") => SuspendContextMode::Ignore,
            _ => SuspendContextMode::Honor,
        };
        let half_angle_cones = env::var("AURAL_HALF_ANGLE_CONES").is_ok();
        let reverse_z = env::var("AURAL_REVERSE_Z").is_ok();

        Self {
            log_level,
            log_file,
            driver_order,
            default_reverb,
            suspend_context,
            half_angle_cones,
            reverse_z,
        }
    }
}

fn parse_driver_order(v: &str) -> Vec<DriverSpec> {
    v.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            if let Some(name) = s.strip_prefix('-') {
                DriverSpec { name: name.to_string(), excluded: true }
            } else {
                DriverSpec { name: s.to_string(), excluded: false }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_order_parses_exclusions() {
        let parsed = parse_driver_order("pulse,-jack,alsa");
        assert_eq!(
            parsed,
            vec![
                DriverSpec { name: "pulse".into(), excluded: false },
                DriverSpec { name: "jack".into(), excluded: true },
                DriverSpec { name: "alsa".into(), excluded: false },
            ]
        );
    }

    #[test]
    fn log_level_defaults_on_malformed_value() {
        assert_eq!(LogLevel::from_env_value("not-a-number"), LogLevel::Info);
        assert_eq!(LogLevel::from_env_value("5"), LogLevel::Trace);
    }
}
