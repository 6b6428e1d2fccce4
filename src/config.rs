use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use tracing::{info, warn};

use crate::collision::{CollisionConfig, SearchPattern};
use crate::optimizer::{OptimizationConfig, OptimizationOverrides, Strategy};

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub planner: PlannerConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(env_string)
    }

    /// Creates a configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            api: ApiConfig::from_lookup(&lookup),
            planner: PlannerConfig::from_lookup(&lookup),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const HOST_VAR: &'static str = "SPACE_PLANNER_API_HOST";
    const PORT_VAR: &'static str = "SPACE_PLANNER_API_PORT";
    const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
    const DEFAULT_PORT: u16 = 8080;

    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Self {
        let (bind_ip, display_host) = match lookup(Self::HOST_VAR) {
            Some(raw) => match raw.parse::<IpAddr>() {
                Ok(ip) => (ip, raw),
                Err(err) => {
                    warn!(
                        var = Self::HOST_VAR,
                        value = %raw,
                        error = %err,
                        "Could not parse host, using {}",
                        Self::DEFAULT_HOST
                    );
                    (Self::DEFAULT_HOST, Self::DEFAULT_HOST.to_string())
                }
            },
            None => (Self::DEFAULT_HOST, Self::DEFAULT_HOST.to_string()),
        };

        let port = match lookup(Self::PORT_VAR) {
            Some(raw) => match raw.parse::<u16>() {
                Ok(value) if value != 0 => value,
                Ok(_) => {
                    warn!(var = Self::PORT_VAR, "Port must not be 0, using {}", Self::DEFAULT_PORT);
                    Self::DEFAULT_PORT
                }
                Err(err) => {
                    warn!(
                        var = Self::PORT_VAR,
                        value = %raw,
                        error = %err,
                        "Could not parse port, using {}",
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
            },
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }
}

/// Defaults applied to planning requests that do not set them.
#[derive(Clone, Debug)]
pub struct PlannerConfig {
    default_strategy: Strategy,
    grid_resolution: Option<f64>,
    collision: CollisionConfig,
}

impl PlannerConfig {
    const STRATEGY_VAR: &'static str = "SPACE_PLANNER_DEFAULT_STRATEGY";
    const GRID_RESOLUTION_VAR: &'static str = "SPACE_PLANNER_GRID_RESOLUTION";
    const COLLISION_STEP_VAR: &'static str = "SPACE_PLANNER_COLLISION_STEP";
    const COLLISION_MAX_DISTANCE_VAR: &'static str = "SPACE_PLANNER_COLLISION_MAX_DISTANCE";
    const COLLISION_PATTERN_VAR: &'static str = "SPACE_PLANNER_COLLISION_PATTERN";
    const COLLISION_GRID_SNAP_VAR: &'static str = "SPACE_PLANNER_COLLISION_GRID_SNAP";
    const COLLISION_VERTICAL_VAR: &'static str = "SPACE_PLANNER_COLLISION_VERTICAL";

    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Self {
        let default_strategy = lookup(Self::STRATEGY_VAR)
            .and_then(|raw| {
                let parsed = Strategy::parse(&raw);
                if parsed.is_none() {
                    warn!(
                        var = Self::STRATEGY_VAR,
                        value = %raw,
                        "Unknown strategy, using {}",
                        Strategy::default()
                    );
                }
                parsed
            })
            .unwrap_or_default();

        let grid_resolution = lookup(Self::GRID_RESOLUTION_VAR).map(|raw| {
            parse_f64_with_warning(
                Self::GRID_RESOLUTION_VAR,
                &raw,
                OptimizationConfig::GENERIC.grid_resolution,
                |value| value >= OptimizationConfig::MIN_GRID_RESOLUTION,
                "must be at least 0.05",
            )
        });

        let search_step_size = load_f64_with_warning(
            lookup,
            Self::COLLISION_STEP_VAR,
            CollisionConfig::DEFAULT_STEP_SIZE,
            |value| value >= CollisionConfig::MIN_STEP_SIZE,
            "must be at least 0.1",
        );

        let max_search_distance = load_f64_with_warning(
            lookup,
            Self::COLLISION_MAX_DISTANCE_VAR,
            CollisionConfig::DEFAULT_MAX_SEARCH_DISTANCE,
            |value| value >= CollisionConfig::MIN_SEARCH_DISTANCE,
            "must be at least 1",
        );

        let search_pattern = lookup(Self::COLLISION_PATTERN_VAR)
            .and_then(|raw| {
                let parsed = SearchPattern::parse(&raw);
                if parsed.is_none() {
                    warn!(
                        var = Self::COLLISION_PATTERN_VAR,
                        value = %raw,
                        "Unknown search pattern, using spiral"
                    );
                }
                parsed
            })
            .unwrap_or_default();

        let respect_grid_snap = lookup(Self::COLLISION_GRID_SNAP_VAR)
            .and_then(|raw| parse_bool(&raw, Self::COLLISION_GRID_SNAP_VAR))
            .unwrap_or(false);

        let search_vertical = lookup(Self::COLLISION_VERTICAL_VAR)
            .and_then(|raw| parse_bool(&raw, Self::COLLISION_VERTICAL_VAR))
            .unwrap_or(false);

        let collision = CollisionConfig::builder()
            .search_step_size(search_step_size)
            .max_search_distance(max_search_distance)
            .search_pattern(search_pattern)
            .respect_grid_snap(respect_grid_snap)
            .search_vertical(search_vertical)
            .build();

        Self {
            default_strategy,
            grid_resolution,
            collision,
        }
    }

    pub fn default_strategy(&self) -> Strategy {
        self.default_strategy
    }

    /// Collision settings used for every new resolver.
    pub fn collision_config(&self) -> CollisionConfig {
        self.collision
    }

    /// Request overrides layered over the server-wide grid resolution.
    pub fn overrides_for(&self, request: Option<OptimizationOverrides>) -> Option<OptimizationOverrides> {
        match (self.grid_resolution, request) {
            (None, request) => request,
            (Some(resolution), Some(mut request)) => {
                request.grid_resolution.get_or_insert(resolution);
                Some(request)
            }
            (Some(resolution), None) => Some(OptimizationOverrides {
                grid_resolution: Some(resolution),
                ..Default::default()
            }),
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            default_strategy: Strategy::default(),
            grid_resolution: None,
            collision: CollisionConfig::default(),
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!(var = name, error = %err, "Environment variable not readable, using default");
            None
        }
    }
}

fn parse_bool(raw: &str, var_name: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        other => {
            warn!(var = var_name, value = other, "Could not interpret as boolean, using default");
            None
        }
    }
}

fn load_f64_with_warning(
    lookup: &impl Fn(&str) -> Option<String>,
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
) -> f64 {
    match lookup(var_name) {
        Some(raw) => parse_f64_with_warning(var_name, &raw, default, validator, invalid_hint),
        None => default,
    }
}

fn parse_f64_with_warning(
    var_name: &str,
    raw: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && validator(value) => {
            let tolerance = default.abs().max(1.0) * 1e-9;
            if (value - default).abs() > tolerance {
                info!(var = var_name, value, "Using non-default value");
            }
            value
        }
        Ok(_) => {
            warn!(var = var_name, value = raw, "Invalid value ({}), using {}", invalid_hint, default);
            default
        }
        Err(err) => {
            warn!(var = var_name, value = raw, error = %err, "Could not parse number, using {}", default);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_parse_bool_true_values() {
        for raw in ["1", "true", "yes", "y", "on", "TRUE", "Yes", " on "] {
            assert_eq!(parse_bool(raw, "TEST_VAR"), Some(true), "{raw}");
        }
    }

    #[test]
    fn test_parse_bool_false_values() {
        for raw in ["0", "false", "no", "n", "off", "FALSE", "No", "  0  "] {
            assert_eq!(parse_bool(raw, "TEST_VAR"), Some(false), "{raw}");
        }
    }

    #[test]
    fn test_parse_bool_invalid_values() {
        assert_eq!(parse_bool("invalid", "TEST_VAR"), None);
        assert_eq!(parse_bool("2", "TEST_VAR"), None);
        assert_eq!(parse_bool("", "TEST_VAR"), None);
    }

    #[test]
    fn defaults_without_variables() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config.api.port(), 8080);
        assert!(config.api.binds_to_all_interfaces());
        assert_eq!(config.planner.default_strategy(), Strategy::Maximize);
        assert_eq!(config.planner.collision_config(), CollisionConfig::default());
        assert_eq!(config.planner.overrides_for(None), None);
    }

    #[test]
    fn reads_prefixed_variables() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("SPACE_PLANNER_API_HOST", "127.0.0.1"),
            ("SPACE_PLANNER_API_PORT", "9000"),
            ("SPACE_PLANNER_DEFAULT_STRATEGY", "comfort"),
            ("SPACE_PLANNER_GRID_RESOLUTION", "0.2"),
            ("SPACE_PLANNER_COLLISION_STEP", "0.5"),
            ("SPACE_PLANNER_COLLISION_PATTERN", "grid"),
            ("SPACE_PLANNER_COLLISION_VERTICAL", "yes"),
        ]));

        assert_eq!(config.api.display_host(), "127.0.0.1");
        assert_eq!(config.api.socket_addr().port(), 9000);
        assert!(!config.api.binds_to_all_interfaces());
        assert_eq!(config.planner.default_strategy(), Strategy::Comfort);

        let collision = config.planner.collision_config();
        assert_eq!(collision.search_step_size, 0.5);
        assert_eq!(collision.search_pattern, SearchPattern::Grid);
        assert!(collision.search_vertical);
        assert!(!collision.respect_grid_snap);

        let overrides = config.planner.overrides_for(None).unwrap();
        assert_eq!(overrides.grid_resolution, Some(0.2));
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("SPACE_PLANNER_API_HOST", "not-an-ip"),
            ("SPACE_PLANNER_API_PORT", "0"),
            ("SPACE_PLANNER_DEFAULT_STRATEGY", "chaos"),
            ("SPACE_PLANNER_GRID_RESOLUTION", "0.01"),
            ("SPACE_PLANNER_COLLISION_STEP", "0.01"),
            ("SPACE_PLANNER_COLLISION_MAX_DISTANCE", "abc"),
            ("SPACE_PLANNER_COLLISION_PATTERN", "zigzag"),
        ]));

        assert!(config.api.binds_to_all_interfaces());
        assert_eq!(config.api.port(), 8080);
        assert_eq!(config.planner.default_strategy(), Strategy::Maximize);

        let collision = config.planner.collision_config();
        assert_eq!(collision.search_step_size, CollisionConfig::DEFAULT_STEP_SIZE);
        assert_eq!(collision.max_search_distance, CollisionConfig::DEFAULT_MAX_SEARCH_DISTANCE);
        assert_eq!(collision.search_pattern, SearchPattern::Spiral);

        let overrides = config.planner.overrides_for(None).unwrap();
        assert_eq!(overrides.grid_resolution, Some(OptimizationConfig::GENERIC.grid_resolution));
    }

    #[test]
    fn request_grid_resolution_wins() {
        let config = PlannerConfig::from_lookup(&lookup_from(&[("SPACE_PLANNER_GRID_RESOLUTION", "0.3")]));
        let request = OptimizationOverrides {
            grid_resolution: Some(0.1),
            min_clearance: Some(0.5),
            ..Default::default()
        };
        let merged = config.overrides_for(Some(request)).unwrap();
        assert_eq!(merged.grid_resolution, Some(0.1));
        assert_eq!(merged.min_clearance, Some(0.5));
    }
}
