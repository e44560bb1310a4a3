//! Equipment configuration and live equipment instances.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::cabinet::{MountType, TempRange};
use crate::scene::SceneNode;
use crate::types::Vec3;

/// Where the equipment attaches to its mounting surface.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnchorSpec {
    /// Shift from the equipment anchor to its attachment point, in metres.
    pub offset: Vec3,
    /// Sub-part of the model that defines the mechanical attachment point.
    pub part_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MountingDescriptor {
    pub mount_type: MountType,
    pub anchor: AnchorSpec,
    /// Height in rack units, 0 for non-rack equipment.
    pub rack_units: u32,
    /// DIN module count (one module = 18 mm), if declared.
    pub module_width: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct EquipmentSpecs {
    pub power_w: f64,
    /// Falls back to `power_w` when absent.
    pub heat_dissipation_w: Option<f64>,
    pub weight_kg: f64,
    pub cable_weight_kg: f64,
    pub operating_temp: Option<TempRange>,
}

/// Static configuration of an equipment type, in metres.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EquipmentConfig {
    pub catalog_id: String,
    pub name: String,
    /// Free-form category such as `breaker`, `server`, `network`, `pdu`.
    pub category: String,
    pub dimensions: Vec3,
    pub mounting: MountingDescriptor,
    pub specs: EquipmentSpecs,
    pub asset: String,
}

impl EquipmentConfig {
    /// Width used before an asset is loaded. Once loaded, placement always
    /// uses the measured width of the renderable.
    pub fn estimated_width(&self) -> f64 {
        self.dimensions.x
    }

    pub fn heat_dissipation(&self) -> f64 {
        self.specs.heat_dissipation_w.unwrap_or(self.specs.power_w)
    }

    pub fn mount_type(&self) -> MountType {
        self.mounting.mount_type
    }
}

/// Where a piece of equipment sits on its cabinet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Placement {
    pub mount_type: MountType,
    pub surface_index: usize,
    /// Start of the occupied interval along the surface, in metres.
    pub offset_m: f64,
    /// Length of the occupied interval.
    pub width_m: f64,
    /// Plate: vertical position. Rack: depth offset. Unused on DIN rails.
    pub cross_offset_m: f64,
    /// Extent perpendicular to the surface direction (height on a plate).
    pub cross_extent_m: f64,
    /// Translation of the renderable in the cabinet assembly frame.
    pub position: Vec3,
}

impl Placement {
    pub fn end_m(&self) -> f64 {
        self.offset_m + self.width_m
    }
}

/// Live equipment owned by one cabinet.
#[derive(Clone, Debug)]
pub struct EquipmentInstance {
    pub id: String,
    pub cabinet_id: String,
    pub config: Arc<EquipmentConfig>,
    pub renderable: SceneNode,
    pub placement: Placement,
}

impl EquipmentInstance {
    pub fn summary(&self) -> EquipmentSummary {
        EquipmentSummary {
            id: self.id.clone(),
            catalog_id: self.config.catalog_id.clone(),
            name: self.config.name.clone(),
            cabinet_id: self.cabinet_id.clone(),
            placement: self.placement.clone(),
        }
    }
}

/// Serializable view of an equipment instance.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct EquipmentSummary {
    pub id: String,
    pub catalog_id: String,
    pub name: String,
    pub cabinet_id: String,
    pub placement: Placement,
}
