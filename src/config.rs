use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::types::MM_TO_M;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub mounting: MountingConfig,
    pub logic: LogicConfig,
    pub validation: ValidationConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        let electrical = ElectricalEnv::from_env();
        let server_max_density_kw = load_f64_with_warning(
            "CABINET_CONFIGURATOR_SERVER_MAX_DENSITY_KW",
            LogicConfig::DEFAULT_SERVER_MAX_DENSITY_KW,
            |value| value > 0.0,
            "must be greater than 0",
            "Adjusted server power density limit changes density warnings",
        );

        Self {
            api: ApiConfig::from_env(),
            mounting: MountingConfig::from_env(),
            logic: LogicConfig::from_env(&electrical, server_max_density_kw),
            validation: ValidationConfig::builder()
                .standard_voltage(electrical.standard_voltage)
                .breaker_rating(electrical.breaker_rating)
                .server_max_density_kw(server_max_density_kw)
                .build(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            mounting: MountingConfig::default(),
            logic: LogicConfig::default(),
            validation: ValidationConfig::default(),
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
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;
    const HOST_VAR: &'static str = "CABINET_CONFIGURATOR_API_HOST";
    const PORT_VAR: &'static str = "CABINET_CONFIGURATOR_API_PORT";

    fn from_env() -> Self {
        let host_value = env_string(Self::HOST_VAR).unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let (bind_ip, display_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value),
            Err(err) => {
                tracing::warn!(
                    var = Self::HOST_VAR,
                    value = %host_value,
                    error = %err,
                    "could not parse host, using {}",
                    Self::DEFAULT_HOST
                );
                (
                    IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                    Self::DEFAULT_HOST.to_string(),
                )
            }
        };

        let port = match env_string(Self::PORT_VAR) {
            Some(raw) => match raw.parse::<u16>() {
                Ok(value) if value != 0 => value,
                Ok(_) => {
                    tracing::warn!(var = Self::PORT_VAR, "port must not be 0, using {}", Self::DEFAULT_PORT);
                    Self::DEFAULT_PORT
                }
                Err(err) => {
                    tracing::warn!(
                        var = Self::PORT_VAR,
                        value = %raw,
                        error = %err,
                        "could not parse port, using {}",
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

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            display_host: Self::DEFAULT_HOST.to_string(),
            port: Self::DEFAULT_PORT,
        }
    }
}

/// Settings shared by all mounting strategies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MountingConfig {
    /// Height of one rack unit in metres.
    pub rack_unit_height: f64,
}

impl MountingConfig {
    /// EIA-310: 1U = 44.45 mm.
    pub const DEFAULT_RACK_UNIT_HEIGHT_MM: f64 = 44.45;
    const RACK_UNIT_HEIGHT_VAR: &'static str = "CABINET_CONFIGURATOR_RACK_UNIT_HEIGHT_MM";

    pub fn builder() -> MountingConfigBuilder {
        MountingConfigBuilder::default()
    }

    fn from_env() -> Self {
        let unit_mm = load_f64_with_warning(
            Self::RACK_UNIT_HEIGHT_VAR,
            Self::DEFAULT_RACK_UNIT_HEIGHT_MM,
            |value| value > 0.0,
            "must be greater than 0",
            "Non-standard rack unit height, rack placements will not match EIA-310 hardware",
        );
        Self::builder().rack_unit_height(unit_mm * MM_TO_M).build()
    }
}

impl Default for MountingConfig {
    fn default() -> Self {
        Self {
            rack_unit_height: Self::DEFAULT_RACK_UNIT_HEIGHT_MM * MM_TO_M,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct MountingConfigBuilder {
    config: MountingConfig,
}

impl MountingConfigBuilder {
    /// Sets the rack unit height in metres.
    pub fn rack_unit_height(mut self, height: f64) -> Self {
        self.config.rack_unit_height = height;
        self
    }

    pub fn build(self) -> MountingConfig {
        self.config
    }
}

/// Parameters of the physical models in the logic plugins.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogicConfig {
    pub standard_voltage: f64,
    pub breaker_rating: f64,
    /// W per (m³ · K), used for the enclosure temperature rise estimate.
    pub heat_transfer_coefficient: f64,
    pub ambient_temp_c: f64,
    pub server_max_density_kw: f64,
    pub passive_airflow_limit_w: f64,
    pub redundancy_threshold_kw: f64,
    /// Cooling and current ratios above this produce a near-limit warning.
    pub near_limit_ratio: f64,
    pub utilization_warn_ratio: f64,
    pub utilization_error_ratio: f64,
}

impl LogicConfig {
    pub const DEFAULT_STANDARD_VOLTAGE: f64 = 230.0;
    pub const DEFAULT_BREAKER_RATING: f64 = 16.0;
    pub const DEFAULT_HEAT_TRANSFER_COEFFICIENT: f64 = 5.5;
    pub const DEFAULT_AMBIENT_TEMP_C: f64 = 25.0;
    pub const DEFAULT_SERVER_MAX_DENSITY_KW: f64 = 1.0;
    pub const DEFAULT_PASSIVE_AIRFLOW_LIMIT_W: f64 = 1500.0;
    pub const DEFAULT_REDUNDANCY_THRESHOLD_KW: f64 = 5.0;
    pub const DEFAULT_NEAR_LIMIT_RATIO: f64 = 0.8;
    pub const DEFAULT_UTILIZATION_WARN_RATIO: f64 = 0.8;
    pub const DEFAULT_UTILIZATION_ERROR_RATIO: f64 = 0.9;

    pub fn builder() -> LogicConfigBuilder {
        LogicConfigBuilder::default()
    }

    fn from_env(electrical: &ElectricalEnv, server_max_density_kw: f64) -> Self {
        let heat_transfer_coefficient = load_f64_with_warning(
            "CABINET_CONFIGURATOR_HEAT_TRANSFER_COEFFICIENT",
            Self::DEFAULT_HEAT_TRANSFER_COEFFICIENT,
            |value| value > 0.0,
            "must be greater than 0",
            "Adjusted heat transfer coefficient changes temperature rise estimates",
        );
        let passive_airflow_limit_w = load_f64_with_warning(
            "CABINET_CONFIGURATOR_PASSIVE_AIRFLOW_LIMIT_W",
            Self::DEFAULT_PASSIVE_AIRFLOW_LIMIT_W,
            |value| value >= 0.0,
            "must not be negative",
            "Adjusted passive airflow limit changes airflow recommendations",
        );
        let redundancy_threshold_kw = load_f64_with_warning(
            "CABINET_CONFIGURATOR_REDUNDANCY_THRESHOLD_KW",
            Self::DEFAULT_REDUNDANCY_THRESHOLD_KW,
            |value| value >= 0.0,
            "must not be negative",
            "Adjusted redundancy threshold changes redundancy recommendations",
        );

        Self::builder()
            .standard_voltage(electrical.standard_voltage)
            .breaker_rating(electrical.breaker_rating)
            .heat_transfer_coefficient(heat_transfer_coefficient)
            .server_max_density_kw(server_max_density_kw)
            .passive_airflow_limit_w(passive_airflow_limit_w)
            .redundancy_threshold_kw(redundancy_threshold_kw)
            .build()
    }
}

impl Default for LogicConfig {
    fn default() -> Self {
        Self {
            standard_voltage: Self::DEFAULT_STANDARD_VOLTAGE,
            breaker_rating: Self::DEFAULT_BREAKER_RATING,
            heat_transfer_coefficient: Self::DEFAULT_HEAT_TRANSFER_COEFFICIENT,
            ambient_temp_c: Self::DEFAULT_AMBIENT_TEMP_C,
            server_max_density_kw: Self::DEFAULT_SERVER_MAX_DENSITY_KW,
            passive_airflow_limit_w: Self::DEFAULT_PASSIVE_AIRFLOW_LIMIT_W,
            redundancy_threshold_kw: Self::DEFAULT_REDUNDANCY_THRESHOLD_KW,
            near_limit_ratio: Self::DEFAULT_NEAR_LIMIT_RATIO,
            utilization_warn_ratio: Self::DEFAULT_UTILIZATION_WARN_RATIO,
            utilization_error_ratio: Self::DEFAULT_UTILIZATION_ERROR_RATIO,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct LogicConfigBuilder {
    config: LogicConfig,
}

impl LogicConfigBuilder {
    pub fn standard_voltage(mut self, volts: f64) -> Self {
        self.config.standard_voltage = volts;
        self
    }

    pub fn breaker_rating(mut self, amps: f64) -> Self {
        self.config.breaker_rating = amps;
        self
    }

    pub fn heat_transfer_coefficient(mut self, coefficient: f64) -> Self {
        self.config.heat_transfer_coefficient = coefficient;
        self
    }

    pub fn server_max_density_kw(mut self, kw_per_unit: f64) -> Self {
        self.config.server_max_density_kw = kw_per_unit;
        self
    }

    pub fn passive_airflow_limit_w(mut self, watts: f64) -> Self {
        self.config.passive_airflow_limit_w = watts;
        self
    }

    pub fn redundancy_threshold_kw(mut self, kw: f64) -> Self {
        self.config.redundancy_threshold_kw = kw;
        self
    }

    /// Sets the warning and error bands for rack-unit utilization.
    pub fn utilization_bands(mut self, warn: f64, error: f64) -> Self {
        self.config.utilization_warn_ratio = warn;
        self.config.utilization_error_ratio = error;
        self
    }

    pub fn build(self) -> LogicConfig {
        self.config
    }
}

/// Thresholds of the validation rules.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValidationConfig {
    pub standard_voltage: f64,
    pub breaker_rating: f64,
    pub power_info_ratio: f64,
    pub power_warn_ratio: f64,
    pub width_warn_ratio: f64,
    pub depth_warn_ratio: f64,
    /// Rack equipment shallower than this is suspicious, in metres.
    pub min_rack_depth: f64,
    pub server_max_density_kw: f64,
}

impl ValidationConfig {
    pub fn builder() -> ValidationConfigBuilder {
        ValidationConfigBuilder::default()
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            standard_voltage: LogicConfig::DEFAULT_STANDARD_VOLTAGE,
            breaker_rating: LogicConfig::DEFAULT_BREAKER_RATING,
            power_info_ratio: 0.75,
            power_warn_ratio: 0.9,
            width_warn_ratio: 0.95,
            depth_warn_ratio: 0.9,
            min_rack_depth: 0.2,
            server_max_density_kw: LogicConfig::DEFAULT_SERVER_MAX_DENSITY_KW,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ValidationConfigBuilder {
    config: ValidationConfig,
}

impl ValidationConfigBuilder {
    pub fn standard_voltage(mut self, volts: f64) -> Self {
        self.config.standard_voltage = volts;
        self
    }

    pub fn breaker_rating(mut self, amps: f64) -> Self {
        self.config.breaker_rating = amps;
        self
    }

    /// Sets the info and warning bands for power and load budgets.
    pub fn budget_bands(mut self, info: f64, warn: f64) -> Self {
        self.config.power_info_ratio = info;
        self.config.power_warn_ratio = warn;
        self
    }

    pub fn server_max_density_kw(mut self, kw_per_unit: f64) -> Self {
        self.config.server_max_density_kw = kw_per_unit;
        self
    }

    pub fn build(self) -> ValidationConfig {
        self.config
    }
}

/// Electrical constants used by both the logic plugins and the power rule.
struct ElectricalEnv {
    standard_voltage: f64,
    breaker_rating: f64,
}

impl ElectricalEnv {
    fn from_env() -> Self {
        Self {
            standard_voltage: load_f64_with_warning(
                "CABINET_CONFIGURATOR_STANDARD_VOLTAGE",
                LogicConfig::DEFAULT_STANDARD_VOLTAGE,
                |value| value > 0.0,
                "must be greater than 0",
                "Non-standard mains voltage, current estimates change",
            ),
            breaker_rating: load_f64_with_warning(
                "CABINET_CONFIGURATOR_BREAKER_RATING",
                LogicConfig::DEFAULT_BREAKER_RATING,
                |value| value > 0.0,
                "must be greater than 0",
                "Non-standard breaker rating, current warnings change",
            ),
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
            tracing::warn!(var = name, error = %err, "environment access failed, using default");
            None
        }
    }
}

fn load_f64_with_warning(
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    match env_string(var_name) {
        Some(raw) => parse_f64_with_warning(var_name, &raw, default, validator, invalid_hint, warning),
        None => default,
    }
}

fn parse_f64_with_warning(
    var_name: &str,
    raw: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && validator(value) => {
            let tolerance = default.abs().max(1.0) * 1e-9;
            if (value - default).abs() > tolerance {
                tracing::warn!(var = var_name, value, "{}", warning);
            }
            value
        }
        Ok(_) => {
            tracing::warn!(
                var = var_name,
                value = raw,
                "invalid value: {}, using {}",
                invalid_hint,
                default
            );
            default
        }
        Err(err) => {
            tracing::warn!(
                var = var_name,
                value = raw,
                error = %err,
                "could not parse number, using {}",
                default
            );
            default
        }
    }
}
