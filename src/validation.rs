//! Validation engine.
//!
//! Rules are independent. Each one inspects a cabinet type, the equipment to
//! be added and the totals of what is already installed, and reports errors,
//! warnings and info. The engine merges the outcomes. A rule that fails
//! internally (returns `Err` or panics) becomes exactly one error entry tagged
//! with its name; the remaining rules still run.

use std::fmt::Write as _;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::cabinet::{CabinetType, MountType};
use crate::config::ValidationConfig;
use crate::equipment::EquipmentConfig;
use crate::logic::RatioBands;

/// Severity of a finding or recommendation.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// What a single rule reports.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuleOutcome {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub info: Vec<String>,
}

impl RuleOutcome {
    pub fn push(&mut self, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Error => self.errors.push(message),
            Severity::Warning => self.warnings.push(message),
            Severity::Info => self.info.push(message),
        }
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Severity::Error, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(Severity::Warning, message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Severity::Info, message);
    }
}

/// A finding tagged with the rule that produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Issue {
    pub rule: String,
    pub message: String,
}

/// Merged outcome of all rules.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
    pub info: Vec<Issue>,
}

impl ValidationResult {
    fn absorb(&mut self, rule: &str, outcome: RuleOutcome) {
        let tag = |message: String| Issue {
            rule: rule.to_string(),
            message,
        };
        self.errors.extend(outcome.errors.into_iter().map(tag));
        self.warnings.extend(outcome.warnings.into_iter().map(tag));
        self.info.extend(outcome.info.into_iter().map(tag));
    }
}

/// Totals of the equipment already installed in the cabinet.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ValidationContext {
    pub total_power_w: f64,
    pub total_weight_kg: f64,
    pub used_rack_units: u32,
    pub installed_count: usize,
}

impl ValidationContext {
    pub fn from_installed<'a>(installed: impl IntoIterator<Item = &'a EquipmentConfig>) -> Self {
        installed
            .into_iter()
            .fold(Self::default(), |mut ctx, config| {
                ctx.total_power_w += config.specs.power_w;
                ctx.total_weight_kg += config.specs.weight_kg;
                ctx.used_rack_units += config.mounting.rack_units;
                ctx.installed_count += 1;
                ctx
            })
    }
}

/// A single, independent validation rule.
pub trait ValidationRule: Send + Sync {
    fn name(&self) -> &str;

    fn validate(
        &self,
        cabinet: &CabinetType,
        equipment: &EquipmentConfig,
        context: &ValidationContext,
    ) -> Result<RuleOutcome, String>;
}

/// Ordered set of rules.
#[derive(Default)]
pub struct ValidationEngine {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl ValidationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with the dimension, mount type, power, load and category rules.
    pub fn with_default_rules(config: ValidationConfig) -> Self {
        let mut engine = Self::new();
        engine.add_rule(Box::new(DimensionRule::new(config)));
        engine.add_rule(Box::new(MountTypeRule::new(config)));
        engine.add_rule(Box::new(PowerRule::new(config)));
        engine.add_rule(Box::new(LoadRule::new(config)));
        engine.add_rule(Box::new(CategoryRule::new(config)));
        engine
    }

    pub fn add_rule(&mut self, rule: Box<dyn ValidationRule>) {
        tracing::debug!(rule = rule.name(), "validation rule registered");
        self.rules.push(rule);
    }

    /// Removes every rule with the given name.
    pub fn remove_rule(&mut self, name: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|rule| rule.name() != name);
        before != self.rules.len()
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    pub fn validate(
        &self,
        cabinet: &CabinetType,
        equipment: &EquipmentConfig,
        context: &ValidationContext,
    ) -> ValidationResult {
        let mut result = ValidationResult::default();

        for rule in &self.rules {
            let name = rule.name();
            let run = catch_unwind(AssertUnwindSafe(|| {
                rule.validate(cabinet, equipment, context)
            }));
            match run {
                Ok(Ok(outcome)) => result.absorb(name, outcome),
                Ok(Err(message)) => {
                    tracing::error!(rule = name, %message, "validation rule failed");
                    result.errors.push(Issue {
                        rule: name.to_string(),
                        message: format!("rule failed: {message}"),
                    });
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    tracing::error!(rule = name, %message, "validation rule panicked");
                    result.errors.push(Issue {
                        rule: name.to_string(),
                        message: format!("rule failed: {message}"),
                    });
                }
            }
        }

        result.valid = result.errors.is_empty();
        result
    }

    /// Whether the equipment passes every rule.
    pub fn can_mount(
        &self,
        cabinet: &CabinetType,
        equipment: &EquipmentConfig,
        context: &ValidationContext,
    ) -> bool {
        self.validate(cabinet, equipment, context).valid
    }

    /// Human-readable multi-line report.
    pub fn format_report(result: &ValidationResult) -> String {
        let mut report = String::new();
        let verdict = if result.valid { "valid" } else { "invalid" };
        let _ = writeln!(
            report,
            "{verdict} ({} errors, {} warnings, {} info)",
            result.errors.len(),
            result.warnings.len(),
            result.info.len()
        );
        for (severity, issues) in [
            (Severity::Error, &result.errors),
            (Severity::Warning, &result.warnings),
            (Severity::Info, &result.info),
        ] {
            for issue in issues {
                let _ = writeln!(report, "[{severity}] {}: {}", issue.rule, issue.message);
            }
        }
        report
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn mm(metres: f64) -> f64 {
    (metres * 1000.0).round()
}

/// Equipment outer dimensions against the cabinet interior.
pub struct DimensionRule {
    width_warn_ratio: f64,
    depth_warn_ratio: f64,
}

impl DimensionRule {
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            width_warn_ratio: config.width_warn_ratio,
            depth_warn_ratio: config.depth_warn_ratio,
        }
    }
}

impl ValidationRule for DimensionRule {
    fn name(&self) -> &str {
        "DimensionRule"
    }

    fn validate(
        &self,
        cabinet: &CabinetType,
        equipment: &EquipmentConfig,
        _context: &ValidationContext,
    ) -> Result<RuleOutcome, String> {
        let mut outcome = RuleOutcome::default();
        let eq = equipment.dimensions;
        let cab = cabinet.dimensions;

        if eq.x > cab.x {
            outcome.error(format!(
                "equipment width ({} mm) exceeds cabinet width ({} mm)",
                mm(eq.x),
                mm(cab.x)
            ));
        } else if eq.x > cab.x * self.width_warn_ratio {
            outcome.warning(format!(
                "equipment width is close to the maximum (>{:.0}%)",
                self.width_warn_ratio * 100.0
            ));
        }

        if eq.z > cab.z {
            outcome.error(format!(
                "equipment depth ({} mm) exceeds cabinet depth ({} mm)",
                mm(eq.z),
                mm(cab.z)
            ));
        } else if eq.z > cab.z * self.depth_warn_ratio {
            outcome.warning(format!(
                "equipment depth is close to the maximum (>{:.0}%)",
                self.depth_warn_ratio * 100.0
            ));
        }

        if eq.y > cab.y {
            outcome.error(format!(
                "equipment height ({} mm) exceeds cabinet height ({} mm)",
                mm(eq.y),
                mm(cab.y)
            ));
        }

        let units = equipment.mounting.rack_units;
        if units > 0 && cabinet.has_rack_units() && units > cabinet.rack_units() {
            outcome.error(format!(
                "equipment needs {}U, cabinet offers {}U",
                units,
                cabinet.rack_units()
            ));
        }

        Ok(outcome)
    }
}

/// Mount type compatibility and zone sanity checks.
pub struct MountTypeRule {
    min_rack_depth: f64,
}

impl MountTypeRule {
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            min_rack_depth: config.min_rack_depth,
        }
    }
}

impl ValidationRule for MountTypeRule {
    fn name(&self) -> &str {
        "MountTypeRule"
    }

    fn validate(
        &self,
        cabinet: &CabinetType,
        equipment: &EquipmentConfig,
        _context: &ValidationContext,
    ) -> Result<RuleOutcome, String> {
        let mut outcome = RuleOutcome::default();
        let mount_type = equipment.mount_type();

        if !cabinet.mounting_capabilities.is_empty() && !cabinet.supports(mount_type) {
            outcome.error(format!("cabinet does not support {mount_type} mounting"));
            return Ok(outcome);
        }

        match mount_type {
            MountType::DinRail => {
                if !cabinet.has_din_rails() {
                    outcome.error("cabinet has no DIN rails");
                } else if cabinet.zones(MountType::DinRail).next().is_none() {
                    outcome.warning("DIN rails are not declared in the mounting zones");
                }
                if let Some(modules) = equipment.mounting.module_width {
                    if !(1.0..=24.0).contains(&modules) {
                        outcome.warning(format!(
                            "unusual module width: {modules} (typically 1-24)"
                        ));
                    }
                }
            }
            MountType::RackUnit => {
                if !cabinet.has_rack_units() {
                    outcome.error("cabinet is not a 19\" rack");
                }
                if equipment.dimensions.z < self.min_rack_depth {
                    outcome.warning(format!(
                        "shallow rack equipment: {} mm",
                        mm(equipment.dimensions.z)
                    ));
                }
            }
            MountType::MountingPlate => {
                if cabinet.zones(MountType::MountingPlate).next().is_none() {
                    outcome.warning("mounting plate is not declared in the cabinet configuration");
                }
            }
        }

        Ok(outcome)
    }
}

/// Cumulative power against the cabinet maximum and the breaker rating.
pub struct PowerRule {
    bands: RatioBands,
    standard_voltage: f64,
    breaker_rating: f64,
}

impl PowerRule {
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            bands: RatioBands::new(config.power_warn_ratio, 1.0).with_info(config.power_info_ratio),
            standard_voltage: config.standard_voltage,
            breaker_rating: config.breaker_rating,
        }
    }
}

impl ValidationRule for PowerRule {
    fn name(&self) -> &str {
        "PowerRule"
    }

    fn validate(
        &self,
        cabinet: &CabinetType,
        equipment: &EquipmentConfig,
        context: &ValidationContext,
    ) -> Result<RuleOutcome, String> {
        let mut outcome = RuleOutcome::default();
        let max_power = cabinet.max_power();
        if max_power <= 0.0 {
            outcome.info("cabinet maximum power is not defined");
            return Ok(outcome);
        }
        if self.standard_voltage <= 0.0 {
            return Err(format!("invalid standard voltage {}", self.standard_voltage));
        }

        let total = context.total_power_w + equipment.specs.power_w;
        match self.bands.classify(total, max_power) {
            Some(Severity::Error) => outcome.error(format!(
                "total power ({total:.0} W) would exceed the maximum ({max_power:.0} W)"
            )),
            Some(Severity::Warning) => outcome.warning(format!(
                "total power ({total:.0} W) is close to the maximum ({max_power:.0} W)"
            )),
            Some(Severity::Info) => outcome.info(format!(
                "power load: {:.1}%",
                total / max_power * 100.0
            )),
            None => {}
        }

        let current = total / self.standard_voltage;
        if current > self.breaker_rating {
            outcome.warning(format!(
                "estimated current ({current:.1} A) exceeds a standard {:.0} A breaker",
                self.breaker_rating
            ));
        }

        Ok(outcome)
    }
}

/// Cumulative weight against the cabinet's maximum load.
pub struct LoadRule {
    bands: RatioBands,
}

impl LoadRule {
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            bands: RatioBands::new(config.power_warn_ratio, 1.0).with_info(config.power_info_ratio),
        }
    }
}

impl ValidationRule for LoadRule {
    fn name(&self) -> &str {
        "LoadRule"
    }

    fn validate(
        &self,
        cabinet: &CabinetType,
        equipment: &EquipmentConfig,
        context: &ValidationContext,
    ) -> Result<RuleOutcome, String> {
        let mut outcome = RuleOutcome::default();
        let max_load = cabinet.max_load();
        if max_load <= 0.0 {
            return Ok(outcome);
        }

        let total = context.total_weight_kg + equipment.specs.weight_kg;
        match self.bands.classify(total, max_load) {
            Some(Severity::Error) => outcome.error(format!(
                "total weight ({total:.1} kg) would exceed the maximum load ({max_load:.1} kg)"
            )),
            Some(Severity::Warning) => outcome.warning(format!(
                "total weight ({total:.1} kg) is close to the maximum load ({max_load:.1} kg)"
            )),
            Some(Severity::Info) => {
                outcome.info(format!("load: {:.1}%", total / max_load * 100.0))
            }
            None => {}
        }
        Ok(outcome)
    }
}

/// Category-specific checks of the cabinet type.
pub struct CategoryRule {
    max_density_kw: f64,
}

impl CategoryRule {
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            max_density_kw: config.server_max_density_kw,
        }
    }
}

impl ValidationRule for CategoryRule {
    fn name(&self) -> &str {
        "CategoryRule"
    }

    fn validate(
        &self,
        cabinet: &CabinetType,
        equipment: &EquipmentConfig,
        _context: &ValidationContext,
    ) -> Result<RuleOutcome, String> {
        let mut outcome = RuleOutcome::default();
        for (severity, message) in cabinet.category_findings(equipment, self.max_density_kw) {
            outcome.push(severity, message);
        }
        Ok(outcome)
    }
}
