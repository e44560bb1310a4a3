//! Catalog boundary.
//!
//! Catalog data arrives in millimetres. This module is the only place that
//! converts it: everything returned by a [`CatalogProvider`] is in metres.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::cabinet::{
    CabinetCategory, CabinetSpecs, CabinetType, Cabling, CategoryProfile, MountType, MountingZone,
    ServerProfile, TelecomPower, TelecomProfile, ThermalProfile,
};
use crate::equipment::{AnchorSpec, EquipmentConfig, EquipmentSpecs, MountingDescriptor};
use crate::error::{ConfiguratorError, EntityKind, Result};
use crate::types::validation::{validate_dimensions_3d, validate_non_negative};
use crate::types::{Vec3, MM_TO_M};

/// Dimensions in millimetres.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DimensionsMm {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

impl DimensionsMm {
    fn to_metres(self, owner: &str) -> Result<Vec3> {
        validate_dimensions_3d((self.width, self.height, self.depth))
            .map_err(|msg| ConfiguratorError::InvalidDefinition(format!("{owner}: {msg}")))?;
        Ok(Vec3::new(self.width, self.height, self.depth) * MM_TO_M)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CabinetSpecsDefinition {
    #[serde(default)]
    pub max_load: f64,
    #[serde(default)]
    pub max_power: f64,
    #[serde(default)]
    pub rack_units: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TelecomDefinition {
    /// Usable rack depth in millimetres.
    #[serde(default)]
    pub rack_depth: f64,
    #[serde(default)]
    pub cabling: Cabling,
    #[serde(default)]
    pub power: TelecomPower,
}

/// Cabinet entry as stored in the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CabinetDefinition {
    pub id: String,
    pub name: String,
    /// `thermal`, `telecom`, `server` or an alias (`outdoor`, `network`, `datacenter`).
    pub category: String,
    pub dimensions: DimensionsMm,
    #[serde(default)]
    pub mounting_capabilities: Vec<MountType>,
    #[serde(default)]
    pub mounting_zones: Vec<MountingZone>,
    #[serde(default)]
    pub specs: CabinetSpecsDefinition,
    #[serde(default)]
    pub thermal: Option<ThermalProfile>,
    #[serde(default)]
    pub telecom: Option<TelecomDefinition>,
    #[serde(default)]
    pub server: Option<ServerProfile>,
    pub asset: String,
}

impl CabinetDefinition {
    /// Converts to the internal metre-based type.
    pub fn to_cabinet_type(&self) -> Result<CabinetType> {
        let dimensions = self.dimensions.to_metres(&self.id)?;
        let invalid = |msg: String| ConfiguratorError::InvalidDefinition(format!("{}: {msg}", self.id));
        validate_non_negative(self.specs.max_load, "maxLoad").map_err(invalid)?;
        validate_non_negative(self.specs.max_power, "maxPower").map_err(invalid)?;

        let profile = match CabinetCategory::resolve(&self.category) {
            CabinetCategory::Thermal => {
                CategoryProfile::Thermal(self.thermal.clone().unwrap_or_default())
            }
            CabinetCategory::Telecom => {
                let telecom = self.telecom.clone().unwrap_or_default();
                validate_non_negative(telecom.rack_depth, "rackDepth").map_err(invalid)?;
                CategoryProfile::Telecom(TelecomProfile {
                    rack_depth_m: telecom.rack_depth * MM_TO_M,
                    cabling: telecom.cabling,
                    power: telecom.power,
                })
            }
            CabinetCategory::Server => {
                CategoryProfile::Server(self.server.clone().unwrap_or_default())
            }
            CabinetCategory::Generic => CategoryProfile::Generic,
        };

        let mut capabilities = self.mounting_capabilities.clone();
        capabilities.sort();
        capabilities.dedup();

        Ok(CabinetType {
            id: self.id.clone(),
            name: self.name.clone(),
            dimensions,
            mounting_zones: self.mounting_zones.clone(),
            mounting_capabilities: capabilities,
            specs: CabinetSpecs {
                max_load_kg: self.specs.max_load,
                max_power_w: self.specs.max_power,
                rack_units: self.specs.rack_units,
            },
            profile,
            asset: self.asset.clone(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MountingDefinition {
    pub mount_type: MountType,
    /// Anchor offset in millimetres.
    #[serde(default)]
    #[schema(value_type = Vec<f64>)]
    pub anchor_offset: [f64; 3],
    /// Sub-part of the model that defines the attachment point.
    #[serde(default)]
    pub anchor_part: Option<String>,
    #[serde(default)]
    pub rack_units: u32,
    #[serde(default)]
    pub module_width: Option<f64>,
}

/// Equipment entry as stored in the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EquipmentDefinition {
    pub id: String,
    pub name: String,
    pub category: String,
    pub dimensions: DimensionsMm,
    pub mounting: MountingDefinition,
    #[serde(default)]
    pub specs: EquipmentSpecs,
    pub asset: String,
}

impl EquipmentDefinition {
    pub fn to_equipment_config(&self) -> Result<EquipmentConfig> {
        let dimensions = self.dimensions.to_metres(&self.id)?;
        let invalid = |msg: String| ConfiguratorError::InvalidDefinition(format!("{}: {msg}", self.id));
        validate_non_negative(self.specs.power_w, "power").map_err(invalid)?;
        validate_non_negative(self.specs.weight_kg, "weight").map_err(invalid)?;
        validate_non_negative(self.specs.cable_weight_kg, "cableWeight").map_err(invalid)?;
        if let Some(heat) = self.specs.heat_dissipation_w {
            validate_non_negative(heat, "heatDissipation").map_err(invalid)?;
        }
        if self.mounting.anchor_offset.iter().any(|v| !v.is_finite()) {
            return Err(invalid("anchor offset must be finite".to_string()));
        }

        Ok(EquipmentConfig {
            catalog_id: self.id.clone(),
            name: self.name.clone(),
            category: self.category.clone(),
            dimensions,
            mounting: MountingDescriptor {
                mount_type: self.mounting.mount_type,
                anchor: AnchorSpec {
                    offset: Vec3::from_array(self.mounting.anchor_offset) * MM_TO_M,
                    part_name: self.mounting.anchor_part.clone(),
                },
                rack_units: self.mounting.rack_units,
                module_width: self.mounting.module_width,
            },
            specs: self.specs.clone(),
            asset: self.asset.clone(),
        })
    }
}

/// Source of cabinet types and equipment configurations.
pub trait CatalogProvider: Send + Sync {
    fn cabinet_type(&self, id: &str) -> Result<CabinetType>;
    fn equipment_config(&self, id: &str) -> Result<Arc<EquipmentConfig>>;
    fn cabinet_ids(&self) -> Vec<String>;
    fn equipment_ids(&self) -> Vec<String>;
}

/// Catalog file layout.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct CatalogDocument {
    #[serde(default)]
    pub cabinets: Vec<CabinetDefinition>,
    #[serde(default)]
    pub equipment: Vec<EquipmentDefinition>,
}

/// Catalog held in memory, converted once on insert.
#[derive(Clone, Debug, Default)]
pub struct InMemoryCatalog {
    cabinets: BTreeMap<String, CabinetType>,
    equipment: BTreeMap<String, Arc<EquipmentConfig>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_document(document: &CatalogDocument) -> Result<Self> {
        let mut catalog = Self::new();
        for cabinet in &document.cabinets {
            catalog.insert_cabinet(cabinet)?;
        }
        for equipment in &document.equipment {
            catalog.insert_equipment(equipment)?;
        }
        Ok(catalog)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let document: CatalogDocument = serde_json::from_str(json)
            .map_err(|err| ConfiguratorError::InvalidDefinition(format!("catalog: {err}")))?;
        Self::from_document(&document)
    }

    /// Built-in demo catalog.
    pub fn demo() -> Result<Self> {
        Self::from_json(DEMO_CATALOG)
    }

    pub fn insert_cabinet(&mut self, definition: &CabinetDefinition) -> Result<()> {
        let cabinet = definition.to_cabinet_type()?;
        self.cabinets.insert(cabinet.id.clone(), cabinet);
        Ok(())
    }

    pub fn insert_equipment(&mut self, definition: &EquipmentDefinition) -> Result<()> {
        let config = definition.to_equipment_config()?;
        self.equipment
            .insert(config.catalog_id.clone(), Arc::new(config));
        Ok(())
    }
}

impl CatalogProvider for InMemoryCatalog {
    fn cabinet_type(&self, id: &str) -> Result<CabinetType> {
        self.cabinets
            .get(id)
            .cloned()
            .ok_or_else(|| ConfiguratorError::UnknownCatalogEntry {
                kind: EntityKind::Cabinet,
                id: id.to_string(),
            })
    }

    fn equipment_config(&self, id: &str) -> Result<Arc<EquipmentConfig>> {
        self.equipment
            .get(id)
            .cloned()
            .ok_or_else(|| ConfiguratorError::UnknownCatalogEntry {
                kind: EntityKind::Equipment,
                id: id.to_string(),
            })
    }

    fn cabinet_ids(&self) -> Vec<String> {
        self.cabinets.keys().cloned().collect()
    }

    fn equipment_ids(&self) -> Vec<String> {
        self.equipment.keys().cloned().collect()
    }
}

const DEMO_CATALOG: &str = r#"{
  "cabinets": [
    {
      "id": "ts_700_500_250",
      "name": "TS 700x500x250 outdoor enclosure",
      "category": "outdoor",
      "dimensions": { "width": 500, "height": 700, "depth": 250 },
      "mounting_capabilities": ["din_rail", "mounting_plate"],
      "mounting_zones": [
        { "mount_type": "din_rail", "component_names": ["din_rail_1", "din_rail_2", "din_rail_3"] },
        { "mount_type": "mounting_plate", "component_names": ["mounting_plate"] }
      ],
      "specs": { "max_load": 50, "max_power": 2000 },
      "thermal": {
        "heating_power_w": 100,
        "cooling_power_w": 500,
        "operating_temp": { "min_c": -20, "max_c": 45 },
        "climate": { "has_heater": false, "has_cooler": true, "has_thermostat": true }
      },
      "asset": "cabinets/ts_700_500_250.json"
    },
    {
      "id": "telecom_42u",
      "name": "Telecom rack 42U",
      "category": "telecom",
      "dimensions": { "width": 600, "height": 2000, "depth": 800 },
      "mounting_capabilities": ["rack_unit"],
      "mounting_zones": [
        { "mount_type": "rack_unit", "component_names": ["rack_frame"] }
      ],
      "specs": { "max_load": 800, "max_power": 5000, "rack_units": 42 },
      "telecom": {
        "rack_depth": 700,
        "cabling": { "has_horizontal_manager": true, "has_vertical_manager": true, "has_patch_panel": true, "max_cable_load_kg": 50 },
        "power": { "has_pdu": true, "max_current_a": 32, "phases": 1 }
      },
      "asset": "cabinets/telecom_42u.glb"
    },
    {
      "id": "server_47u",
      "name": "Server rack 47U",
      "category": "datacenter",
      "dimensions": { "width": 800, "height": 2200, "depth": 1200 },
      "mounting_capabilities": ["rack_unit"],
      "mounting_zones": [
        { "mount_type": "rack_unit", "component_names": ["rack_frame"] }
      ],
      "specs": { "max_load": 1200, "max_power": 20000, "rack_units": 47 },
      "server": {
        "cooling_capacity_kw": 10,
        "airflow": "front_to_back",
        "has_hot_aisle": true,
        "has_cold_aisle": true,
        "redundancy": "n_plus_one"
      },
      "asset": "cabinets/server_47u.glb"
    }
  ],
  "equipment": [
    {
      "id": "circuit_breaker_1p",
      "name": "Circuit breaker 1P C16",
      "category": "breaker",
      "dimensions": { "width": 18, "height": 80, "depth": 70 },
      "mounting": { "mount_type": "din_rail", "anchor_part": "din_clip", "module_width": 1 },
      "specs": { "power_w": 5, "heat_dissipation_w": 2, "weight_kg": 0.12, "cable_weight_kg": 0 },
      "asset": "equipment/circuit_breaker_1p.json"
    },
    {
      "id": "rcd_2p",
      "name": "Residual current device 2P",
      "category": "breaker",
      "dimensions": { "width": 36, "height": 80, "depth": 70 },
      "mounting": { "mount_type": "din_rail", "module_width": 2 },
      "specs": { "power_w": 3, "weight_kg": 0.25, "cable_weight_kg": 0 },
      "asset": "equipment/rcd_2p.json"
    },
    {
      "id": "power_supply_240w",
      "name": "DIN power supply 24V 240W",
      "category": "power_supply",
      "dimensions": { "width": 63, "height": 90, "depth": 110 },
      "mounting": { "mount_type": "din_rail", "anchor_part": "din_clip", "module_width": 3.5 },
      "specs": { "power_w": 260, "heat_dissipation_w": 20, "weight_kg": 0.9, "cable_weight_kg": 0 },
      "asset": "equipment/power_supply_240w.json"
    },
    {
      "id": "relay_plate",
      "name": "Plate-mounted contactor",
      "category": "relay",
      "dimensions": { "width": 60, "height": 80, "depth": 40 },
      "mounting": { "mount_type": "mounting_plate" },
      "specs": { "power_w": 2, "weight_kg": 0.3, "cable_weight_kg": 0 },
      "asset": "equipment/relay_plate.json"
    },
    {
      "id": "patch_panel_1u",
      "name": "Patch panel 24 port",
      "category": "network",
      "dimensions": { "width": 440, "height": 44, "depth": 120 },
      "mounting": { "mount_type": "rack_unit", "rack_units": 1 },
      "specs": { "power_w": 0, "weight_kg": 1.5, "cable_weight_kg": 2 },
      "asset": "equipment/patch_panel_1u.glb"
    },
    {
      "id": "switch_1u",
      "name": "Switch 48 port",
      "category": "network",
      "dimensions": { "width": 440, "height": 44, "depth": 300 },
      "mounting": { "mount_type": "rack_unit", "rack_units": 1 },
      "specs": { "power_w": 150, "weight_kg": 4, "cable_weight_kg": 1 },
      "asset": "equipment/switch_1u.glb"
    },
    {
      "id": "server_2u",
      "name": "Server 2U",
      "category": "server",
      "dimensions": { "width": 440, "height": 88, "depth": 700 },
      "mounting": { "mount_type": "rack_unit", "rack_units": 2 },
      "specs": { "power_w": 800, "weight_kg": 25, "cable_weight_kg": 0.5 },
      "asset": "equipment/server_2u.glb"
    }
  ]
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_catalog_converts_to_metres() {
        let catalog = InMemoryCatalog::demo().unwrap();

        let ts = catalog.cabinet_type("ts_700_500_250").unwrap();
        assert_eq!(ts.category(), CabinetCategory::Thermal);
        assert!((ts.dimensions.x - 0.5).abs() < 1e-12);
        assert!((ts.dimensions.y - 0.7).abs() < 1e-12);
        assert_eq!(
            ts.mounting_capabilities,
            vec![MountType::DinRail, MountType::MountingPlate]
        );

        let breaker = catalog.equipment_config("circuit_breaker_1p").unwrap();
        assert!((breaker.estimated_width() - 0.018).abs() < 1e-12);
        assert_eq!(breaker.mounting.anchor.part_name.as_deref(), Some("din_clip"));
        assert_eq!(breaker.heat_dissipation(), 2.0);

        let server = catalog.cabinet_type("server_47u").unwrap();
        assert_eq!(server.category(), CabinetCategory::Server);
        let telecom = catalog.cabinet_type("telecom_42u").unwrap();
        match telecom.profile {
            CategoryProfile::Telecom(profile) => {
                assert!((profile.rack_depth_m - 0.7).abs() < 1e-12)
            }
            other => panic!("unexpected profile {other:?}"),
        }
    }

    #[test]
    fn unknown_ids_are_catalog_errors() {
        let catalog = InMemoryCatalog::demo().unwrap();
        assert!(matches!(
            catalog.cabinet_type("nope"),
            Err(ConfiguratorError::UnknownCatalogEntry {
                kind: EntityKind::Cabinet,
                ..
            })
        ));
        assert!(catalog.equipment_config("nope").is_err());
        assert_eq!(catalog.cabinet_ids().len(), 3);
    }

    #[test]
    fn invalid_dimensions_are_rejected_at_the_boundary() {
        let json = r#"{ "equipment": [{
            "id": "broken", "name": "broken", "category": "x",
            "dimensions": { "width": 0, "height": 10, "depth": 10 },
            "mounting": { "mount_type": "din_rail" },
            "asset": "broken.json"
        }] }"#;
        let err = InMemoryCatalog::from_json(json).unwrap_err();
        assert!(matches!(err, ConfiguratorError::InvalidDefinition(ref msg) if msg.contains("broken")));
        assert!(InMemoryCatalog::from_json("{ not json").is_err());
    }
}
