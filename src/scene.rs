//! Renderable handles and the asset provider seam.
//!
//! The configurator never parses mesh files. It only needs what a loaded asset
//! exposes: a translation, bounding boxes, and named sub-components. `SceneNode`
//! is that handle. Nodes carry axis-aligned geometry bounds in their own frame
//! and a position relative to their parent.

use async_trait::async_trait;

use crate::cabinet::{CabinetType, MountType};
use crate::equipment::EquipmentConfig;
use crate::error::{ConfiguratorError, Result};
use crate::types::{BoundingBox, Vec3};

/// A node of a renderable asset.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
    pub name: String,
    /// Translation relative to the parent frame.
    pub position: Vec3,
    /// Bounds of this node's own geometry, in its local frame.
    pub geometry: Option<BoundingBox>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// A node without own geometry.
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: Vec3::zero(),
            geometry: None,
            children: Vec::new(),
        }
    }

    /// A node with geometry bounds.
    pub fn mesh(name: impl Into<String>, bounds: BoundingBox) -> Self {
        Self {
            geometry: Some(bounds),
            ..Self::group(name)
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    /// Bounds in the node's own frame, skipping every node named in `excluded`.
    ///
    /// This replaces the "hide helper mesh, measure, unhide" dance: the query
    /// has no side effects, so it is safe to call on shared handles.
    pub fn local_bounds_excluding(&self, excluded: &[&str]) -> Option<BoundingBox> {
        let mut acc = self.geometry;
        for child in &self.children {
            if excluded.contains(&child.name.as_str()) {
                continue;
            }
            if let Some(child_bounds) = child.local_bounds_excluding(excluded) {
                let moved = child_bounds.translated(child.position);
                acc = Some(match acc {
                    Some(current) => current.union(&moved),
                    None => moved,
                });
            }
        }
        acc
    }

    /// Bounds in the node's own frame.
    pub fn local_bounds(&self) -> Option<BoundingBox> {
        self.local_bounds_excluding(&[])
    }

    /// Bounds in the parent frame, i.e. with this node's position applied.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.local_bounds().map(|b| b.translated(self.position))
    }

    /// Bounds in the parent frame, skipping nodes named in `excluded`.
    pub fn bounding_box_excluding(&self, excluded: &[&str]) -> Option<BoundingBox> {
        self.local_bounds_excluding(excluded)
            .map(|b| b.translated(self.position))
    }

    /// Bounds of a named descendant expressed in this node's local frame.
    pub fn component_bounds(&self, name: &str) -> Option<BoundingBox> {
        self.children.iter().find_map(|child| {
            if child.name == name {
                child.bounding_box()
            } else {
                child
                    .component_bounds(name)
                    .map(|b| b.translated(child.position))
            }
        })
    }

    /// Names of all descendants, depth first.
    pub fn descendant_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for child in &self.children {
            names.push(child.name.as_str());
            names.extend(child.descendant_names());
        }
        names
    }
}

/// What the caller wants materialised. Real providers key off `path`; the
/// procedural provider builds geometry from the hint.
#[derive(Clone, Copy, Debug)]
pub enum AssetHint<'a> {
    Cabinet(&'a CabinetType),
    Equipment(&'a EquipmentConfig),
}

#[derive(Clone, Copy, Debug)]
pub struct AssetRequest<'a> {
    pub path: &'a str,
    pub instance_name: &'a str,
    pub hint: AssetHint<'a>,
}

/// External collaborator that loads renderable assets.
#[async_trait]
pub trait AssetProvider: Send + Sync {
    async fn load(&self, request: AssetRequest<'_>) -> Result<SceneNode>;
}

/// Standard DIN rail profile (TS35): 35 mm tall, 7.5 mm deep.
const DIN_RAIL_HEIGHT: f64 = 0.035;
const DIN_RAIL_DEPTH: f64 = 0.0075;
const DIN_CLIP_HEIGHT: f64 = 0.035;
/// Distance of the DIN clip centre above the module's visual centre.
const DIN_CLIP_RISE: f64 = 0.004;
/// 19" rack frame width (482.6 mm).
const RACK_FRAME_WIDTH: f64 = 0.4826;
const PLATE_THICKNESS: f64 = 0.002;
const MARGIN: f64 = 0.05;

/// Builds box-based assets from catalog dimensions.
///
/// Cabinet assemblies get a body plus one component per declared mounting-zone
/// name. Equipment gets a body centred on its origin and, when the catalog names
/// an anchor part, a flat clip plane slightly wider than the body.
#[derive(Clone, Debug)]
pub struct ProceduralAssetProvider {
    rack_unit_height: f64,
}

impl ProceduralAssetProvider {
    pub fn new(rack_unit_height: f64) -> Self {
        Self { rack_unit_height }
    }

    /// Builds a cabinet assembly for the given type.
    pub fn cabinet_assembly(&self, cabinet: &CabinetType, instance_name: &str) -> SceneNode {
        let dims = cabinet.dimensions;
        let (w, h, d) = (dims.x, dims.y, dims.z);

        let mut assembly = SceneNode::group(instance_name).with_child(SceneNode::mesh(
            "body",
            BoundingBox::new(Vec3::new(-w / 2.0, 0.0, -d / 2.0), Vec3::new(w / 2.0, h, d / 2.0)),
        ));

        let rail_names = cabinet.zone_component_names(MountType::DinRail);
        let step = h / (rail_names.len() as f64 + 1.0);
        let rail_length = (w - 2.0 * MARGIN).max(0.0);
        let rail_back = -d / 2.0 + MARGIN;
        for (i, name) in rail_names.iter().enumerate() {
            let center_y = h - step * (i as f64 + 1.0);
            assembly = assembly.with_child(SceneNode::mesh(
                name.clone(),
                BoundingBox::new(
                    Vec3::new(-rail_length / 2.0, center_y - DIN_RAIL_HEIGHT / 2.0, rail_back),
                    Vec3::new(
                        rail_length / 2.0,
                        center_y + DIN_RAIL_HEIGHT / 2.0,
                        rail_back + DIN_RAIL_DEPTH,
                    ),
                ),
            ));
        }

        let rack_height = cabinet.rack_units() as f64 * self.rack_unit_height;
        let rack_width = RACK_FRAME_WIDTH.min(w);
        let rack_base = ((h - rack_height) / 2.0).max(0.0);
        for name in cabinet.zone_component_names(MountType::RackUnit) {
            assembly = assembly.with_child(SceneNode::mesh(
                name,
                BoundingBox::new(
                    Vec3::new(-rack_width / 2.0, rack_base, -d / 2.0 + MARGIN),
                    Vec3::new(rack_width / 2.0, rack_base + rack_height, d / 2.0 - MARGIN),
                ),
            ));
        }

        for name in cabinet.zone_component_names(MountType::MountingPlate) {
            assembly = assembly.with_child(SceneNode::mesh(
                name,
                BoundingBox::new(
                    Vec3::new(-w / 2.0 + MARGIN, MARGIN, -d / 2.0 + 0.01),
                    Vec3::new(w / 2.0 - MARGIN, h - MARGIN, -d / 2.0 + 0.01 + PLATE_THICKNESS),
                ),
            ));
        }

        assembly
    }

    /// Builds an equipment renderable.
    pub fn equipment_model(&self, config: &EquipmentConfig, instance_name: &str) -> SceneNode {
        let dims = config.dimensions;
        let mut node =
            SceneNode::group(instance_name).with_child(SceneNode::mesh("body", BoundingBox::centered(dims)));

        if let Some(part) = &config.mounting.anchor.part_name {
            let back = -dims.z / 2.0;
            node = node.with_child(SceneNode::mesh(
                part.clone(),
                BoundingBox::new(
                    Vec3::new(
                        -dims.x / 2.0 - 0.002,
                        DIN_CLIP_RISE - DIN_CLIP_HEIGHT / 2.0,
                        back,
                    ),
                    Vec3::new(dims.x / 2.0 + 0.002, DIN_CLIP_RISE + DIN_CLIP_HEIGHT / 2.0, back),
                ),
            ));
        }

        node
    }
}

#[async_trait]
impl AssetProvider for ProceduralAssetProvider {
    async fn load(&self, request: AssetRequest<'_>) -> Result<SceneNode> {
        let node = match request.hint {
            AssetHint::Cabinet(cabinet) => self.cabinet_assembly(cabinet, request.instance_name),
            AssetHint::Equipment(config) => self.equipment_model(config, request.instance_name),
        };
        if node.local_bounds().is_none() {
            return Err(ConfiguratorError::AssetLoadFailure {
                asset: request.path.to_string(),
                reason: "asset has no geometry".to_string(),
            });
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EPSILON_LENGTH;

    fn equipment_with_clip() -> SceneNode {
        SceneNode::group("breaker")
            .with_child(SceneNode::mesh(
                "body",
                BoundingBox::centered(Vec3::new(0.018, 0.08, 0.07)),
            ))
            .with_child(SceneNode::mesh(
                "clip",
                BoundingBox::new(Vec3::new(-0.011, -0.01, -0.035), Vec3::new(0.011, 0.02, -0.035)),
            ))
    }

    #[test]
    fn bounds_excluding_named_part_ignore_helper_geometry() {
        let node = equipment_with_clip().at(Vec3::new(1.0, 0.0, 0.0));

        let full = node.local_bounds().unwrap();
        assert!((full.width() - 0.022).abs() < EPSILON_LENGTH);

        let footprint = node.local_bounds_excluding(&["clip"]).unwrap();
        assert!((footprint.width() - 0.018).abs() < EPSILON_LENGTH);

        let in_parent = node.bounding_box_excluding(&["clip"]).unwrap();
        assert!((in_parent.min.x - (1.0 - 0.009)).abs() < EPSILON_LENGTH);
    }

    #[test]
    fn component_bounds_accumulate_nested_positions() {
        let assembly = SceneNode::group("cabinet").with_child(
            SceneNode::group("frame")
                .at(Vec3::new(0.0, 1.0, 0.0))
                .with_child(
                    SceneNode::mesh(
                        "din_rail_1",
                        BoundingBox::new(Vec3::zero(), Vec3::new(0.4, 0.035, 0.0075)),
                    )
                    .at(Vec3::new(0.1, 0.0, 0.0)),
                ),
        );

        let rail = assembly.component_bounds("din_rail_1").unwrap();
        assert!((rail.min.x - 0.1).abs() < EPSILON_LENGTH);
        assert!((rail.min.y - 1.0).abs() < EPSILON_LENGTH);
        assert!(assembly.component_bounds("missing").is_none());
        assert_eq!(assembly.descendant_names(), vec!["frame", "din_rail_1"]);
    }
}
