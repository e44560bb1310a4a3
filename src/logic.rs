//! Category-keyed calculation plugins.
//!
//! Each cabinet category has one plugin that sums the installed equipment
//! and runs its physical model. All plugins grade "required against
//! available" through [`RatioBands`].

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::cabinet::{Airflow, CabinetCategory, CabinetType, CategoryProfile, Redundancy};
use crate::config::LogicConfig;
use crate::equipment::EquipmentConfig;
use crate::validation::Severity;

const DEFAULT_RACK_UNITS: u32 = 42;
const OVERSIZED_COOLING_RATIO: f64 = 0.5;
const NEARLY_FULL_UNITS: u32 = 2;
const UNCOOLED_HEAT_LIMIT_KW: f64 = 1.0;
const BREAKER_STEP_A: f64 = 5.0;

/// Ratio thresholds shared by every "required vs available" check.
///
/// A ratio above `error_above` is an error, above `warn_above` a warning and
/// above `info_above` (when set) an info. Anything lower is not reported.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RatioBands {
    info_above: Option<f64>,
    warn_above: f64,
    error_above: f64,
}

impl RatioBands {
    pub const fn new(warn_above: f64, error_above: f64) -> Self {
        Self {
            info_above: None,
            warn_above,
            error_above,
        }
    }

    pub const fn with_info(mut self, info_above: f64) -> Self {
        self.info_above = Some(info_above);
        self
    }

    pub fn classify_ratio(&self, ratio: f64) -> Option<Severity> {
        if ratio > self.error_above {
            Some(Severity::Error)
        } else if ratio > self.warn_above {
            Some(Severity::Warning)
        } else if self.info_above.is_some_and(|info| ratio > info) {
            Some(Severity::Info)
        } else {
            None
        }
    }

    /// Grades `required / available`. Without any capacity, any demand is
    /// an error.
    pub fn classify(&self, required: f64, available: f64) -> Option<Severity> {
        if available <= 0.0 {
            return (required > 0.0).then_some(Severity::Error);
        }
        self.classify_ratio(required / available)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Recommendation {
    pub severity: Severity,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Recommendation {
    pub fn new(severity: Severity, kind: &str, message: impl Into<String>) -> Self {
        Self {
            severity,
            kind: kind.to_string(),
            message: message.into(),
            value: None,
            available: None,
            suggestion: None,
        }
    }

    pub fn value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn available(mut self, available: f64) -> Self {
        self.available = Some(available);
        self
    }

    pub fn suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CalculationResult {
    pub category: String,
    pub calculations: BTreeMap<String, f64>,
    pub flags: BTreeMap<String, bool>,
    pub recommendations: Vec<Recommendation>,
    pub warnings: Vec<String>,
}

impl CalculationResult {
    pub fn empty(category: CabinetCategory) -> Self {
        Self {
            category: category.as_str().to_string(),
            ..Self::default()
        }
    }

    fn set(&mut self, key: &str, value: f64) {
        self.calculations.insert(key.to_string(), value);
    }

    fn flag(&mut self, key: &str, value: bool) {
        self.flags.insert(key.to_string(), value);
    }

    fn recommend(&mut self, recommendation: Recommendation) {
        self.recommendations.push(recommendation);
    }

    pub fn metric(&self, key: &str) -> Option<f64> {
        self.calculations.get(key).copied()
    }

    pub fn has_severity(&self, severity: Severity) -> bool {
        self.recommendations.iter().any(|r| r.severity == severity)
    }
}

/// Physical model for one cabinet category.
pub trait LogicPlugin: Send + Sync {
    fn name(&self) -> &str;

    fn category(&self) -> CabinetCategory;

    fn calculate(
        &self,
        cabinet: &CabinetType,
        equipment: &[&EquipmentConfig],
    ) -> Result<CalculationResult, String>;
}

#[derive(Default)]
pub struct LogicEngine {
    plugins: BTreeMap<CabinetCategory, Box<dyn LogicPlugin>>,
}

impl LogicEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with the thermal, telecom and server plugins.
    pub fn with_default_plugins(config: LogicConfig) -> Self {
        let mut engine = Self::new();
        engine.register(Box::new(ThermalPlugin::new(config)));
        engine.register(Box::new(TelecomPlugin::new(config)));
        engine.register(Box::new(ServerPlugin::new(config)));
        engine
    }

    /// Registers a plugin, replacing any plugin for the same category.
    pub fn register(&mut self, plugin: Box<dyn LogicPlugin>) {
        tracing::debug!(
            plugin = plugin.name(),
            category = %plugin.category(),
            "logic plugin registered"
        );
        self.plugins.insert(plugin.category(), plugin);
    }

    pub fn has_plugin(&self, category: CabinetCategory) -> bool {
        self.plugins.contains_key(&category)
    }

    pub fn registered_categories(&self) -> Vec<CabinetCategory> {
        self.plugins.keys().copied().collect()
    }

    pub fn calculate(
        &self,
        cabinet: &CabinetType,
        equipment: &[&EquipmentConfig],
    ) -> CalculationResult {
        let category = cabinet.category();
        let Some(plugin) = self.plugins.get(&category) else {
            tracing::warn!(
                cabinet_id = %cabinet.id,
                category = %category,
                "no logic plugin for category"
            );
            return CalculationResult::empty(category);
        };

        let run = catch_unwind(AssertUnwindSafe(|| plugin.calculate(cabinet, equipment)));
        let failure = match run {
            Ok(Ok(result)) => return result,
            Ok(Err(message)) => message,
            Err(payload) => payload
                .downcast_ref::<&str>()
                .map(|text| (*text).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string()),
        };

        tracing::error!(
            plugin = plugin.name(),
            cabinet_id = %cabinet.id,
            message = %failure,
            "logic plugin failed"
        );
        let mut result = CalculationResult::empty(category);
        result
            .warnings
            .push(format!("{} failed: {failure}", plugin.name()));
        result
    }

    pub fn recommendations(
        &self,
        cabinet: &CabinetType,
        equipment: &[&EquipmentConfig],
    ) -> Vec<Recommendation> {
        self.calculate(cabinet, equipment).recommendations
    }
}

/// Heat balance and temperature rise of sealed enclosures.
pub struct ThermalPlugin {
    config: LogicConfig,
    cooling: RatioBands,
}

impl ThermalPlugin {
    pub fn new(config: LogicConfig) -> Self {
        Self {
            config,
            cooling: RatioBands::new(config.near_limit_ratio, 1.0),
        }
    }
}

impl LogicPlugin for ThermalPlugin {
    fn name(&self) -> &str {
        "ThermalPlugin"
    }

    fn category(&self) -> CabinetCategory {
        CabinetCategory::Thermal
    }

    fn calculate(
        &self,
        cabinet: &CabinetType,
        equipment: &[&EquipmentConfig],
    ) -> Result<CalculationResult, String> {
        let CategoryProfile::Thermal(profile) = &cabinet.profile else {
            return Err(format!("cabinet {} has no thermal profile", cabinet.id));
        };
        let mut result = CalculationResult::empty(CabinetCategory::Thermal);

        let total_heat: f64 = equipment.iter().map(|eq| eq.heat_dissipation()).sum();
        let total_power: f64 = equipment.iter().map(|eq| eq.specs.power_w).sum();
        let total_weight: f64 = equipment.iter().map(|eq| eq.specs.weight_kg).sum();

        let volume = cabinet.volume();
        let k = self.config.heat_transfer_coefficient;
        let delta_t = if volume > 0.0 && k > 0.0 {
            total_heat / (k * volume)
        } else {
            0.0
        };
        let internal_temp = self.config.ambient_temp_c + delta_t;
        let cooling = profile.cooling_power_w;

        result.set("total_heat_w", total_heat);
        result.set("total_power_w", total_power);
        result.set("volume_m3", volume);
        result.set("temperature_rise_c", delta_t);
        result.set("internal_temp_c", internal_temp);
        result.set("cooling_power_w", cooling);
        result.set("heating_power_w", profile.heating_power_w);
        if cooling > 0.0 {
            result.set("cooling_ratio", total_heat / cooling);
        }

        let overheated = internal_temp > profile.operating_temp.max_c;
        if overheated {
            result.warnings.push(format!(
                "estimated internal temperature {internal_temp:.1} °C exceeds {:.1} °C",
                profile.operating_temp.max_c
            ));
        }

        match self.cooling.classify(total_heat, cooling) {
            Some(Severity::Error) => result.recommend(
                Recommendation::new(Severity::Error, "cooling", "insufficient cooling capacity")
                    .value(total_heat)
                    .available(cooling)
                    .suggestion(format!("at least {:.0} W of cooling is required", total_heat)),
            ),
            Some(Severity::Warning) => result.recommend(
                Recommendation::new(Severity::Warning, "cooling", "cooling is near its limit")
                    .value(total_heat)
                    .available(cooling),
            ),
            _ if total_heat > 0.0 && total_heat < cooling * OVERSIZED_COOLING_RATIO => result
                .recommend(
                    Recommendation::new(Severity::Info, "cooling", "cooling is oversized")
                        .value(total_heat)
                        .available(cooling)
                        .suggestion("a smaller cooling unit would do"),
                ),
            _ => {}
        }
        result.flag(
            "requires_cooling",
            self.cooling.classify(total_heat, cooling).is_some(),
        );

        if total_heat > 0.0 && !profile.climate.has_cooler {
            result.recommend(
                Recommendation::new(Severity::Warning, "cooling", "no cooler installed")
                    .value(total_heat)
                    .suggestion("add a fan or cooling unit"),
            );
        }

        let requires_heating = profile.operating_temp.min_c < 0.0 && !profile.climate.has_heater;
        result.flag("requires_heating", requires_heating);
        if requires_heating {
            result.recommend(
                Recommendation::new(Severity::Warning, "heating", "heating is recommended")
                    .value(profile.operating_temp.min_c)
                    .suggestion("operating range goes below 0 °C, add a heater with thermostat"),
            );
        }

        if cabinet.max_power() > 0.0 && total_power > cabinet.max_power() {
            result.recommend(
                Recommendation::new(Severity::Error, "power", "maximum power exceeded")
                    .value(total_power)
                    .available(cabinet.max_power()),
            );
        }
        if cabinet.max_load() > 0.0 && total_weight > cabinet.max_load() {
            result.recommend(
                Recommendation::new(Severity::Error, "load", "maximum load exceeded")
                    .value(total_weight)
                    .available(cabinet.max_load()),
            );
        }
        result.flag("is_overheated", overheated);

        Ok(result)
    }
}

/// Rack utilisation, current draw and cabling of telecom racks.
pub struct TelecomPlugin {
    config: LogicConfig,
    utilization: RatioBands,
    current: RatioBands,
}

impl TelecomPlugin {
    pub fn new(config: LogicConfig) -> Self {
        Self {
            config,
            utilization: RatioBands::new(
                config.utilization_warn_ratio,
                config.utilization_error_ratio,
            ),
            current: RatioBands::new(config.near_limit_ratio, 1.0),
        }
    }
}

impl LogicPlugin for TelecomPlugin {
    fn name(&self) -> &str {
        "TelecomPlugin"
    }

    fn category(&self) -> CabinetCategory {
        CabinetCategory::Telecom
    }

    fn calculate(
        &self,
        cabinet: &CabinetType,
        equipment: &[&EquipmentConfig],
    ) -> Result<CalculationResult, String> {
        let CategoryProfile::Telecom(profile) = &cabinet.profile else {
            return Err(format!("cabinet {} has no telecom profile", cabinet.id));
        };
        if self.config.standard_voltage <= 0.0 {
            return Err("standard voltage must be positive".to_string());
        }
        let mut result = CalculationResult::empty(CabinetCategory::Telecom);

        let total_units = match cabinet.rack_units() {
            0 => DEFAULT_RACK_UNITS,
            units => units,
        };
        let used_units: u32 = equipment.iter().map(|eq| eq.mounting.rack_units).sum();
        let available_units = total_units.saturating_sub(used_units);
        let utilization = used_units as f64 / total_units as f64;
        let total_power: f64 = equipment.iter().map(|eq| eq.specs.power_w).sum();
        let total_current = total_power / self.config.standard_voltage;
        let cable_load: f64 = equipment.iter().map(|eq| eq.specs.cable_weight_kg).sum();
        let max_cable_load = profile.cabling.max_cable_load_kg;

        result.set("total_rack_units", total_units as f64);
        result.set("used_rack_units", used_units as f64);
        result.set("available_rack_units", available_units as f64);
        result.set("utilization_percent", utilization * 100.0);
        result.set("total_power_w", total_power);
        result.set("total_current_a", total_current);
        result.set("voltage_v", self.config.standard_voltage);
        result.set("phases", profile.power.phases as f64);
        result.set("max_current_a", profile.power.max_current_a);
        result.set("cable_load_kg", cable_load);
        result.set("max_cable_load_kg", max_cable_load);
        result.flag("is_overloaded", used_units > total_units);

        match self.utilization.classify_ratio(utilization) {
            Some(Severity::Error) => {
                result
                    .warnings
                    .push(format!("high utilization: {:.1}%", utilization * 100.0));
                result.recommend(
                    Recommendation::new(Severity::Error, "space", "almost all rack units are used")
                        .value(used_units as f64)
                        .available(total_units as f64)
                        .suggestion(format!("only {available_units}U free")),
                );
            }
            Some(Severity::Warning) => result.recommend(
                Recommendation::new(Severity::Warning, "density", "high mounting density")
                    .value(utilization * 100.0)
                    .suggestion("above 80% utilization active ventilation is recommended"),
            ),
            _ => {}
        }
        if used_units <= total_units && available_units < NEARLY_FULL_UNITS {
            result.recommend(
                Recommendation::new(Severity::Info, "space", "rack is nearly full")
                    .value(available_units as f64),
            );
        }

        let has_pdu = profile.power.has_pdu;
        let pdu_band = has_pdu
            .then(|| self.current.classify(total_current, profile.power.max_current_a))
            .flatten();
        let missing_pdu = total_current > 0.0 && !has_pdu;
        let pdu_undersized = pdu_band == Some(Severity::Error);
        result.flag("requires_pdu", missing_pdu || pdu_undersized);
        if missing_pdu {
            result.recommend(
                Recommendation::new(Severity::Error, "pdu", "a power distribution unit is required")
                    .value(total_current)
                    .suggestion(format!("total current: {total_current:.1} A")),
            );
        } else {
            match pdu_band {
                Some(Severity::Error) => {
                    result.warnings.push(format!(
                        "current {total_current:.1} A exceeds the PDU maximum {} A",
                        profile.power.max_current_a
                    ));
                    result.recommend(
                        Recommendation::new(Severity::Error, "pdu", "PDU capacity exceeded")
                            .value(total_current)
                            .available(profile.power.max_current_a)
                            .suggestion(format!(
                                "a PDU rated {} A or more is required",
                                total_current.ceil()
                            )),
                    );
                }
                Some(Severity::Warning) => result.recommend(
                    Recommendation::new(Severity::Warning, "pdu", "PDU is near its rating")
                        .value(total_current)
                        .available(profile.power.max_current_a),
                ),
                _ => {}
            }
        }

        let has_manager =
            profile.cabling.has_vertical_manager || profile.cabling.has_horizontal_manager;
        let requires_manager = cable_load > 0.0 && !has_manager;
        result.flag("requires_cable_manager", requires_manager);
        if requires_manager {
            result.recommend(
                Recommendation::new(Severity::Warning, "cable", "a cable manager is recommended")
                    .value(cable_load)
                    .suggestion(format!("cable load: {cable_load:.1} kg")),
            );
        }
        if max_cable_load > 0.0 && cable_load > max_cable_load {
            result.warnings.push(format!(
                "cable load {cable_load:.1} kg exceeds the maximum {max_cable_load} kg"
            ));
        }

        if total_current > self.config.breaker_rating {
            let needed = (total_current / BREAKER_STEP_A).ceil() * BREAKER_STEP_A;
            result.recommend(
                Recommendation::new(Severity::Warning, "circuit", "a higher rated breaker is required")
                    .value(total_current)
                    .suggestion(format!(
                        "a standard {} A breaker is not enough, {needed} A is required",
                        self.config.breaker_rating
                    )),
            );
        }

        Ok(result)
    }
}

/// Power density, cooling, airflow and redundancy of server racks.
pub struct ServerPlugin {
    config: LogicConfig,
    cooling: RatioBands,
}

impl ServerPlugin {
    pub fn new(config: LogicConfig) -> Self {
        Self {
            config,
            cooling: RatioBands::new(config.near_limit_ratio, 1.0),
        }
    }
}

impl LogicPlugin for ServerPlugin {
    fn name(&self) -> &str {
        "ServerPlugin"
    }

    fn category(&self) -> CabinetCategory {
        CabinetCategory::Server
    }

    fn calculate(
        &self,
        cabinet: &CabinetType,
        equipment: &[&EquipmentConfig],
    ) -> Result<CalculationResult, String> {
        let CategoryProfile::Server(profile) = &cabinet.profile else {
            return Err(format!("cabinet {} has no server profile", cabinet.id));
        };
        let mut result = CalculationResult::empty(CabinetCategory::Server);

        let total_power: f64 = equipment.iter().map(|eq| eq.specs.power_w).sum();
        let total_heat: f64 = equipment.iter().map(|eq| eq.heat_dissipation()).sum();
        let used_units: u32 = equipment.iter().map(|eq| eq.mounting.rack_units).sum();
        let power_kw = total_power / 1000.0;
        let heat_kw = total_heat / 1000.0;
        let density = if used_units > 0 {
            power_kw / used_units as f64
        } else {
            0.0
        };
        let max_density = profile
            .max_power_density_kw
            .unwrap_or(self.config.server_max_density_kw);
        let capacity = profile.cooling_capacity_kw;

        result.set("total_power_kw", power_kw);
        result.set("total_heat_kw", heat_kw);
        result.set("used_rack_units", used_units as f64);
        result.set("power_density_kw_per_u", density);
        result.set("max_power_density_kw_per_u", max_density);
        result.set("cooling_capacity_kw", capacity);

        if capacity <= 0.0 {
            if heat_kw > UNCOOLED_HEAT_LIMIT_KW {
                result.recommend(
                    Recommendation::new(Severity::Error, "cooling", "no cooling capacity declared")
                        .value(heat_kw),
                );
            }
        } else {
            result.set("cooling_ratio", heat_kw / capacity);
            match self.cooling.classify(heat_kw, capacity) {
                Some(Severity::Error) => result.recommend(
                    Recommendation::new(Severity::Error, "cooling", "insufficient cooling capacity")
                        .value(heat_kw)
                        .available(capacity),
                ),
                Some(Severity::Warning) => result.recommend(
                    Recommendation::new(Severity::Warning, "cooling", "cooling is near its limit")
                        .value(heat_kw)
                        .available(capacity),
                ),
                _ => {}
            }
        }
        result.flag(
            "cooling_sufficient",
            (capacity > 0.0 && heat_kw <= capacity)
                || (capacity <= 0.0 && heat_kw <= UNCOOLED_HEAT_LIMIT_KW),
        );

        if density > max_density {
            result.recommend(
                Recommendation::new(Severity::Warning, "density", "power density is high")
                    .value(density)
                    .available(max_density)
                    .suggestion("spread the load over more rack units or cabinets"),
            );
        }

        let airflow_restricted =
            profile.airflow == Airflow::Passive && total_power > self.config.passive_airflow_limit_w;
        result.flag("airflow_restricted", airflow_restricted);
        if airflow_restricted {
            result.recommend(
                Recommendation::new(Severity::Warning, "airflow", "airflow is restricted")
                    .value(total_power)
                    .suggestion("use front-to-back forced airflow"),
            );
        }

        let redundancy_risk = profile.redundancy == Redundancy::None
            && power_kw > self.config.redundancy_threshold_kw;
        result.flag("redundancy_risk", redundancy_risk);
        if redundancy_risk {
            result.recommend(
                Recommendation::new(Severity::Warning, "redundancy", "no cooling or power redundancy")
                    .value(power_kw)
                    .suggestion("consider N+1 redundancy"),
            );
        }

        if cabinet.max_power() > 0.0 && total_power > cabinet.max_power() {
            result.recommend(
                Recommendation::new(Severity::Error, "power", "maximum power exceeded")
                    .value(total_power)
                    .available(cabinet.max_power()),
            );
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogProvider, InMemoryCatalog};
    use std::sync::Arc;

    fn catalog() -> InMemoryCatalog {
        InMemoryCatalog::demo().unwrap()
    }

    fn many(config: &Arc<EquipmentConfig>, count: usize) -> Vec<&EquipmentConfig> {
        std::iter::repeat_n(config.as_ref(), count).collect()
    }

    #[test]
    fn ratio_bands_grade_required_against_available() {
        let bands = RatioBands::new(0.8, 1.0);
        assert_eq!(bands.classify(50.0, 100.0), None);
        assert_eq!(bands.classify(85.0, 100.0), Some(Severity::Warning));
        assert_eq!(bands.classify(101.0, 100.0), Some(Severity::Error));
        assert_eq!(bands.classify(1.0, 0.0), Some(Severity::Error));
        assert_eq!(bands.classify(0.0, 0.0), None);

        let with_info = RatioBands::new(0.9, 1.0).with_info(0.75);
        assert_eq!(with_info.classify_ratio(0.8), Some(Severity::Info));
        assert_eq!(with_info.classify_ratio(0.7), None);
    }

    #[test]
    fn telecom_utilization_bands() {
        let catalog = catalog();
        let rack = catalog.cabinet_type("telecom_42u").unwrap();
        let panel = catalog.equipment_config("patch_panel_1u").unwrap();
        let engine = LogicEngine::with_default_plugins(LogicConfig::default());

        let at_34 = engine.calculate(&rack, &many(&panel, 34));
        let utilization = at_34.metric("utilization_percent").unwrap();
        assert!((utilization - 80.952).abs() < 1e-2);
        assert!(!at_34.has_severity(Severity::Error));
        assert!(
            at_34
                .recommendations
                .iter()
                .any(|r| r.severity == Severity::Warning && r.kind == "density")
        );

        let at_40 = engine.calculate(&rack, &many(&panel, 40));
        assert!((at_40.metric("utilization_percent").unwrap() - 95.238).abs() < 1e-2);
        assert!(
            at_40
                .recommendations
                .iter()
                .any(|r| r.severity == Severity::Error && r.kind == "space")
        );
        assert!(at_40.warnings.iter().any(|w| w.starts_with("high utilization")));
    }

    #[test]
    fn telecom_current_and_pdu() {
        let catalog = catalog();
        let mut rack = catalog.cabinet_type("telecom_42u").unwrap();
        let switch = catalog.equipment_config("switch_1u").unwrap();
        let engine = LogicEngine::with_default_plugins(LogicConfig::default());

        // 30 x 150 W = 4500 W, 19.6 A: above the breaker, within the 32 A PDU
        let result = engine.calculate(&rack, &many(&switch, 30));
        assert!(result.recommendations.iter().any(|r| r.kind == "circuit"));
        assert!(!result.recommendations.iter().any(|r| r.kind == "pdu"));
        assert_eq!(result.flags["requires_pdu"], false);

        if let CategoryProfile::Telecom(profile) = &mut rack.profile {
            profile.power.has_pdu = false;
        }
        let result = engine.calculate(&rack, &many(&switch, 1));
        assert_eq!(result.flags["requires_pdu"], true);
        assert!(
            result
                .recommendations
                .iter()
                .any(|r| r.kind == "pdu" && r.severity == Severity::Error)
        );
    }

    #[test]
    fn undersized_pdu_still_requires_a_pdu() {
        let catalog = catalog();
        let mut rack = catalog.cabinet_type("telecom_42u").unwrap();
        let switch = catalog.equipment_config("switch_1u").unwrap();
        let engine = LogicEngine::with_default_plugins(LogicConfig::default());
        if let CategoryProfile::Telecom(profile) = &mut rack.profile {
            profile.power.has_pdu = true;
            profile.power.max_current_a = 10.0;
        }

        // 30 x 150 W = 19.6 A on a 10 A PDU
        let result = engine.calculate(&rack, &many(&switch, 30));
        assert_eq!(result.flags["requires_pdu"], true);
        assert!(result.recommendations.iter().any(|r| {
            r.kind == "pdu" && r.severity == Severity::Error && r.available == Some(10.0)
        }));
        assert!(result.warnings.iter().any(|w| w.contains("PDU maximum")));
    }

    #[test]
    fn thermal_temperature_rise() {
        let catalog = catalog();
        let ts = catalog.cabinet_type("ts_700_500_250").unwrap();
        let psu = catalog.equipment_config("power_supply_240w").unwrap();
        let engine = LogicEngine::with_default_plugins(LogicConfig::default());

        let result = engine.calculate(&ts, &many(&psu, 2));
        let volume = 0.5 * 0.7 * 0.25;
        let expected = 40.0 / (5.5 * volume);
        assert!((result.metric("temperature_rise_c").unwrap() - expected).abs() < 1e-9);
        assert!((result.metric("total_power_w").unwrap() - 520.0).abs() < 1e-9);
        assert_eq!(result.flags["requires_heating"], true);
        assert_eq!(result.flags["is_overheated"], true);
        assert!(
            result
                .recommendations
                .iter()
                .any(|r| r.kind == "cooling" && r.severity == Severity::Info)
        );
        assert_eq!(result.category, "thermal");
    }

    #[test]
    fn thermal_cooling_insufficient() {
        let catalog = catalog();
        let ts = catalog.cabinet_type("ts_700_500_250").unwrap();
        let psu = catalog.equipment_config("power_supply_240w").unwrap();
        let engine = LogicEngine::with_default_plugins(LogicConfig::default());

        // 26 x 20 W = 520 W of heat against 500 W of cooling
        let result = engine.calculate(&ts, &many(&psu, 26));
        assert!(
            result
                .recommendations
                .iter()
                .any(|r| r.kind == "cooling" && r.severity == Severity::Error)
        );
        // 26 x 260 W = 6760 W over the 2000 W maximum
        assert!(
            result
                .recommendations
                .iter()
                .any(|r| r.kind == "power" && r.severity == Severity::Error)
        );
    }

    #[test]
    fn server_airflow_and_redundancy() {
        let catalog = catalog();
        let mut rack = catalog.cabinet_type("server_47u").unwrap();
        let server = catalog.equipment_config("server_2u").unwrap();
        let engine = LogicEngine::with_default_plugins(LogicConfig::default());

        let result = engine.calculate(&rack, &many(&server, 2));
        assert!((result.metric("power_density_kw_per_u").unwrap() - 0.4).abs() < 1e-9);
        assert_eq!(result.flags["airflow_restricted"], false);
        assert!(result.recommendations.is_empty());

        if let CategoryProfile::Server(profile) = &mut rack.profile {
            profile.airflow = Airflow::Passive;
            profile.redundancy = Redundancy::None;
        }
        // 8 x 800 W = 6.4 kW
        let result = engine.calculate(&rack, &many(&server, 8));
        assert_eq!(result.flags["airflow_restricted"], true);
        assert_eq!(result.flags["redundancy_risk"], true);
        assert!(!result.has_severity(Severity::Error));
    }

    #[test]
    fn unknown_category_yields_empty_result() {
        let catalog = catalog();
        let mut ts = catalog.cabinet_type("ts_700_500_250").unwrap();
        ts.profile = CategoryProfile::Generic;
        let engine = LogicEngine::with_default_plugins(LogicConfig::default());

        let result = engine.calculate(&ts, &[]);
        assert_eq!(result.category, "generic");
        assert!(result.calculations.is_empty());
        assert!(result.recommendations.is_empty());
        assert!(!engine.has_plugin(CabinetCategory::Generic));
        assert_eq!(
            engine.registered_categories(),
            vec![
                CabinetCategory::Thermal,
                CabinetCategory::Telecom,
                CabinetCategory::Server
            ]
        );
    }

    struct Exploding;

    impl LogicPlugin for Exploding {
        fn name(&self) -> &str {
            "Exploding"
        }

        fn category(&self) -> CabinetCategory {
            CabinetCategory::Thermal
        }

        fn calculate(
            &self,
            _: &CabinetType,
            _: &[&EquipmentConfig],
        ) -> Result<CalculationResult, String> {
            panic!("division by zero")
        }
    }

    #[test]
    fn failing_plugin_becomes_a_warning() {
        let catalog = catalog();
        let ts = catalog.cabinet_type("ts_700_500_250").unwrap();
        let mut engine = LogicEngine::new();
        engine.register(Box::new(Exploding));

        let result = engine.calculate(&ts, &[]);
        assert_eq!(result.category, "thermal");
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("division by zero"));
        assert!(engine.recommendations(&ts, &[]).is_empty());
    }
}
