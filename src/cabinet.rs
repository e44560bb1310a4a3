//! Cabinet type model.
//!
//! A cabinet type is one struct with a category-specific profile. The profile
//! variants carry the physical data each category needs (thermal limits, rack
//! and cabling info, cooling and redundancy). Types are immutable once built
//! from catalog data.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::equipment::EquipmentConfig;
use crate::validation::Severity;
use crate::types::Vec3;

/// Kind of mounting surface.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum MountType {
    DinRail,
    RackUnit,
    MountingPlate,
}

impl MountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MountType::DinRail => "din_rail",
            MountType::RackUnit => "rack_unit",
            MountType::MountingPlate => "mounting_plate",
        }
    }
}

impl fmt::Display for MountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "din_rail" | "din" => Ok(MountType::DinRail),
            "rack_unit" | "rack" => Ok(MountType::RackUnit),
            "mounting_plate" | "plate" => Ok(MountType::MountingPlate),
            other => Err(format!("unknown mount type '{}'", other)),
        }
    }
}

/// Cabinet category, selecting the logic plugin and category checks.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum CabinetCategory {
    Thermal,
    Telecom,
    Server,
    Generic,
}

impl CabinetCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CabinetCategory::Thermal => "thermal",
            CabinetCategory::Telecom => "telecom",
            CabinetCategory::Server => "server",
            CabinetCategory::Generic => "generic",
        }
    }

    /// Resolves a catalog category, accepting the legacy aliases.
    /// Unknown names resolve to `Generic`.
    pub fn resolve(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "thermal" | "outdoor" => CabinetCategory::Thermal,
            "telecom" | "network" => CabinetCategory::Telecom,
            "server" | "datacenter" => CabinetCategory::Server,
            _ => CabinetCategory::Generic,
        }
    }
}

impl fmt::Display for CabinetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared group of mounting components inside the cabinet assembly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MountingZone {
    pub mount_type: MountType,
    pub component_names: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CabinetSpecs {
    pub max_load_kg: f64,
    pub max_power_w: f64,
    pub rack_units: u32,
}

/// Temperature range in degrees Celsius.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TempRange {
    pub min_c: f64,
    pub max_c: f64,
}

impl TempRange {
    pub fn contains(&self, other: &TempRange) -> bool {
        other.min_c >= self.min_c && other.max_c <= self.max_c
    }
}

impl Default for TempRange {
    fn default() -> Self {
        Self {
            min_c: -40.0,
            max_c: 55.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ClimateControl {
    pub has_heater: bool,
    pub has_cooler: bool,
    pub has_thermostat: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ThermalProfile {
    pub heating_power_w: f64,
    pub cooling_power_w: f64,
    pub operating_temp: TempRange,
    pub climate: ClimateControl,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct Cabling {
    pub has_horizontal_manager: bool,
    pub has_vertical_manager: bool,
    pub has_patch_panel: bool,
    /// 0 when no limit is declared.
    pub max_cable_load_kg: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct TelecomPower {
    pub has_pdu: bool,
    pub max_current_a: f64,
    pub phases: u32,
}

impl Default for TelecomPower {
    fn default() -> Self {
        Self {
            has_pdu: false,
            max_current_a: 16.0,
            phases: 1,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TelecomProfile {
    /// Usable rack depth in metres.
    pub rack_depth_m: f64,
    pub cabling: Cabling,
    pub power: TelecomPower,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Airflow {
    #[default]
    Passive,
    FrontToBack,
    BackToFront,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Redundancy {
    #[default]
    None,
    NPlusOne,
    TwoN,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ServerProfile {
    pub cooling_capacity_kw: f64,
    pub airflow: Airflow,
    pub has_hot_aisle: bool,
    pub has_cold_aisle: bool,
    /// Overrides the configured default density limit when set.
    pub max_power_density_kw: Option<f64>,
    pub redundancy: Redundancy,
}

/// Category-specific data. The variant determines the cabinet category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum CategoryProfile {
    Thermal(ThermalProfile),
    Telecom(TelecomProfile),
    Server(ServerProfile),
    Generic,
}

/// Equipment categories a server cabinet normally hosts.
const SERVER_EQUIPMENT_CATEGORIES: [&str; 4] = ["server", "network", "storage", "pdu"];

/// Immutable description of a cabinet model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CabinetType {
    pub id: String,
    pub name: String,
    /// Outer dimensions in metres.
    pub dimensions: Vec3,
    pub mounting_zones: Vec<MountingZone>,
    /// Sorted, without duplicates.
    pub mounting_capabilities: Vec<MountType>,
    pub specs: CabinetSpecs,
    pub profile: CategoryProfile,
    pub asset: String,
}

impl CabinetType {
    pub fn category(&self) -> CabinetCategory {
        match self.profile {
            CategoryProfile::Thermal(_) => CabinetCategory::Thermal,
            CategoryProfile::Telecom(_) => CabinetCategory::Telecom,
            CategoryProfile::Server(_) => CabinetCategory::Server,
            CategoryProfile::Generic => CabinetCategory::Generic,
        }
    }

    pub fn zones(&self, mount_type: MountType) -> impl Iterator<Item = &MountingZone> {
        self.mounting_zones
            .iter()
            .filter(move |zone| zone.mount_type == mount_type)
    }

    /// Component names of all zones of one mount type, in declaration order.
    pub fn zone_component_names(&self, mount_type: MountType) -> Vec<String> {
        self.zones(mount_type)
            .flat_map(|zone| zone.component_names.iter().cloned())
            .collect()
    }

    pub fn supports(&self, mount_type: MountType) -> bool {
        self.mounting_capabilities.contains(&mount_type)
    }

    pub fn has_din_rails(&self) -> bool {
        self.supports(MountType::DinRail) || self.zones(MountType::DinRail).next().is_some()
    }

    pub fn has_rack_units(&self) -> bool {
        self.specs.rack_units > 0
    }

    pub fn rack_units(&self) -> u32 {
        self.specs.rack_units
    }

    pub fn max_power(&self) -> f64 {
        self.specs.max_power_w
    }

    pub fn max_load(&self) -> f64 {
        self.specs.max_load_kg
    }

    /// Interior volume in cubic metres.
    pub fn volume(&self) -> f64 {
        self.dimensions.volume()
    }

    /// Category-specific compatibility findings for one equipment type.
    ///
    /// `max_density_kw` is the server density limit used when the profile
    /// does not declare its own.
    pub fn category_findings(
        &self,
        equipment: &EquipmentConfig,
        max_density_kw: f64,
    ) -> Vec<(Severity, String)> {
        let mut findings = Vec::new();

        match &self.profile {
            CategoryProfile::Thermal(thermal) => {
                if let Some(range) = equipment.specs.operating_temp {
                    if !thermal.operating_temp.contains(&range) {
                        findings.push((
                            Severity::Warning,
                            format!(
                                "equipment operating range {}..{} °C exceeds cabinet range {}..{} °C",
                                range.min_c,
                                range.max_c,
                                thermal.operating_temp.min_c,
                                thermal.operating_temp.max_c
                            ),
                        ));
                    }
                }
                let heat = equipment.heat_dissipation();
                if heat > 0.0 && heat > thermal.cooling_power_w {
                    findings.push((
                        Severity::Warning,
                        format!(
                            "heat dissipation {:.0} W exceeds cooling power {:.0} W",
                            heat, thermal.cooling_power_w
                        ),
                    ));
                }
            }
            CategoryProfile::Telecom(telecom) => {
                let units = equipment.mounting.rack_units;
                if units > 0 && units > self.specs.rack_units {
                    findings.push((
                        Severity::Error,
                        format!(
                            "equipment needs {}U, cabinet offers {}U",
                            units, self.specs.rack_units
                        ),
                    ));
                }
                if telecom.rack_depth_m > 0.0 && equipment.dimensions.z > telecom.rack_depth_m {
                    findings.push((
                        Severity::Error,
                        format!(
                            "equipment depth {:.0} mm exceeds rack depth {:.0} mm",
                            equipment.dimensions.z * 1000.0,
                            telecom.rack_depth_m * 1000.0
                        ),
                    ));
                }
                if equipment.specs.cable_weight_kg > 0.0 && !telecom.cabling.has_vertical_manager {
                    findings.push((
                        Severity::Warning,
                        "a vertical cable manager is recommended".to_string(),
                    ));
                }
            }
            CategoryProfile::Server(server) => {
                let category = equipment.category.to_ascii_lowercase();
                if !SERVER_EQUIPMENT_CATEGORIES.contains(&category.as_str()) {
                    findings.push((
                        Severity::Warning,
                        format!("'{}' equipment is atypical for a server cabinet", equipment.category),
                    ));
                }
                let units = equipment.mounting.rack_units.max(1) as f64;
                let density = equipment.specs.power_w / 1000.0 / units;
                let limit = server.max_power_density_kw.unwrap_or(max_density_kw);
                if density > limit {
                    findings.push((
                        Severity::Warning,
                        format!(
                            "power density {:.2} kW/U exceeds recommended {:.2} kW/U",
                            density, limit
                        ),
                    ));
                }
                if category == "server" && equipment.mounting.rack_units > 4 {
                    findings.push((
                        Severity::Info,
                        "tall server equipment may restrict ventilation".to_string(),
                    ));
                }
            }
            CategoryProfile::Generic => {}
        }

        findings
    }
}
