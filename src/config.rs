//! Engine tunables
//!
//! Every value can be overridden from the command line or the environment
//! (a `.env` file is loaded first by the binary).

use clap::Args;

/// Tunable constants for aggregation and recommendation
#[derive(Debug, Clone, Args)]
pub struct EngineConfig {
    /// Nominal load (kg) for sets logged without external load
    #[arg(long, env = "RECOVERY_BODYWEIGHT_LOAD", default_value_t = 40.0)]
    pub bodyweight_load: f64,

    /// Volume weighting for a muscle listed as primary
    #[arg(long, env = "RECOVERY_PRIMARY_WEIGHT", default_value_t = 1.0)]
    pub primary_weight: f64,

    /// Volume weighting for a muscle listed as secondary
    #[arg(long, env = "RECOVERY_SECONDARY_WEIGHT", default_value_t = 0.5)]
    pub secondary_weight: f64,

    /// Largest fatigue increase a single session can add to one muscle
    #[arg(long, env = "RECOVERY_MAX_FATIGUE_DELTA", default_value_t = 60.0)]
    pub max_fatigue_delta: f64,

    /// Mean recovery progress (%) below which rest is suggested
    #[arg(long, env = "RECOVERY_REST_THRESHOLD", default_value_t = 25.0)]
    pub rest_threshold: f64,

    /// Readiness scores this close to the best count as tied
    #[arg(long, env = "RECOVERY_TIE_MARGIN", default_value_t = 1.0)]
    pub tie_margin: f64,

    /// Total tries (first one included) for the read-decay-add-write fold
    #[arg(long, env = "RECOVERY_MAX_WRITE_ATTEMPTS", default_value_t = 3)]
    pub max_write_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bodyweight_load: 40.0,
            primary_weight: 1.0,
            secondary_weight: 0.5,
            max_fatigue_delta: 60.0,
            rest_threshold: 25.0,
            tie_margin: 1.0,
            max_write_attempts: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        engine: EngineConfig,
    }

    #[test]
    fn test_cli_defaults_match_default_impl() {
        let parsed = Harness::parse_from(["test"]).engine;
        let defaults = EngineConfig::default();
        assert_eq!(parsed.bodyweight_load, defaults.bodyweight_load);
        assert_eq!(parsed.secondary_weight, defaults.secondary_weight);
        assert_eq!(parsed.max_fatigue_delta, defaults.max_fatigue_delta);
        assert_eq!(parsed.rest_threshold, defaults.rest_threshold);
        assert_eq!(parsed.max_write_attempts, defaults.max_write_attempts);
    }

    #[test]
    fn test_flag_override() {
        let parsed = Harness::parse_from(["test", "--secondary-weight", "0.25"]).engine;
        assert_eq!(parsed.secondary_weight, 0.25);
    }

    #[test]
    fn test_write_attempts_flag() {
        let parsed = Harness::parse_from(["test", "--max-write-attempts", "5"]).engine;
        assert_eq!(parsed.max_write_attempts, 5);
    }
}
