//! Montagestrategien.
//!
//! Eine Strategietabelle pro Montageart. Eine Tabelle besteht aus wenigen
//! einfachen Funktionen: nach welchen Komponentennamen gesucht wird, wenn ein
//! Schrank keine Montagezonen deklariert, wie die Belegung einer Fläche
//! dimensioniert wird und wie eine Platzierung geplant wird. `MountingStrategy`
//! bindet eine Tabelle an die Flächen einer Schrankinstanz und besitzt deren
//! Belegungszustand.
//!
//! Planen verändert nie etwas. `mount` plant und bucht danach die Reservierung,
//! ein fehlgeschlagener Plan lässt die Belegung also unverändert.

use std::collections::BTreeMap;

use crate::cabinet::{CabinetType, MountType};
use crate::config::MountingConfig;
use crate::equipment::{EquipmentConfig, Placement};
use crate::error::{ConfiguratorError, Result};
use crate::geometry::{alignment_delta, anchor_point, AnchorRule};
use crate::occupancy::{search_order, NoSpace, OccupancyStats, PlateOccupancy, SurfaceOccupancy};
use crate::scene::SceneNode;
use crate::types::{BoundingBox, Vec3};

/// Belegungszustand einer Fläche.
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceTracker {
    Linear(SurfaceOccupancy),
    Planar(PlateOccupancy),
}

impl SurfaceTracker {
    fn reserve(&mut self, owner: &str, placement: &Placement) {
        match self {
            SurfaceTracker::Linear(rail) => {
                rail.reserve(placement.offset_m, placement.end_m(), owner)
            }
            SurfaceTracker::Planar(plate) => plate.reserve(
                (placement.offset_m, placement.end_m()),
                (
                    placement.cross_offset_m,
                    placement.cross_offset_m + placement.cross_extent_m,
                ),
                owner,
            ),
        }
    }

    fn release(&mut self, owner: &str) -> bool {
        match self {
            SurfaceTracker::Linear(rail) => rail.release(owner),
            SurfaceTracker::Planar(plate) => plate.release(owner),
        }
    }

    fn occupancy(&self) -> OccupancyStats {
        match self {
            SurfaceTracker::Linear(rail) => rail.occupancy(),
            SurfaceTracker::Planar(plate) => plate.occupancy(),
        }
    }
}

/// Eine physische Montagefläche einer Schrankinstanz.
#[derive(Clone, Debug, PartialEq)]
pub struct MountSurface {
    pub name: String,
    /// Grenzen im Koordinatensystem der Schrankbaugruppe.
    pub bounds: BoundingBox,
    pub tracker: SurfaceTracker,
}

/// Alles, was eine Planungsfunktion braucht.
pub struct PlanInput<'a> {
    pub surface: &'a MountSurface,
    pub surface_index: usize,
    pub renderable: &'a SceneNode,
    pub config: &'a EquipmentConfig,
    /// Expliziter Startoffset entlang der Fläche oder `None` für First-Fit.
    pub offset: Option<f64>,
    pub cross_offset: f64,
    pub settings: &'a MountingConfig,
    /// Besitzer, dessen aktuelle Reservierung ignoriert wird (beim Verschieben).
    pub excluding: Option<&'a str>,
}

pub type PlanFn = fn(&PlanInput<'_>) -> Result<Placement>;
pub type TrackerFn = fn(&BoundingBox, &CabinetType, &MountingConfig) -> SurfaceTracker;

/// Strategietabelle einer Montageart.
#[derive(Debug)]
pub struct StrategyOps {
    pub mount_type: MountType,
    /// Schlüsselwörter für die Namenssuche, ohne Beachtung der Groß-/Kleinschreibung.
    pub keywords: &'static [&'static str],
    /// Namen mit einem dieser Teile passen nie, auch mit Schlüsselwort.
    pub exclusions: &'static [&'static str],
    pub new_tracker: TrackerFn,
    pub plan: PlanFn,
}

pub static DIN_RAIL_OPS: StrategyOps = StrategyOps {
    mount_type: MountType::DinRail,
    keywords: &["din", "rail"],
    exclusions: &["rack"],
    new_tracker: linear_along_x,
    plan: plan_din_rail,
};

pub static RACK_UNIT_OPS: StrategyOps = StrategyOps {
    mount_type: MountType::RackUnit,
    keywords: &["rack"],
    exclusions: &[],
    new_tracker: linear_along_rack,
    plan: plan_rack_unit,
};

pub static MOUNTING_PLATE_OPS: StrategyOps = StrategyOps {
    mount_type: MountType::MountingPlate,
    keywords: &["plate"],
    exclusions: &[],
    new_tracker: planar,
    plan: plan_mounting_plate,
};

fn linear_along_x(bounds: &BoundingBox, _: &CabinetType, _: &MountingConfig) -> SurfaceTracker {
    SurfaceTracker::Linear(SurfaceOccupancy::new(bounds.width()))
}

fn linear_along_rack(
    bounds: &BoundingBox,
    cabinet: &CabinetType,
    settings: &MountingConfig,
) -> SurfaceTracker {
    let declared = cabinet.rack_units() as f64 * settings.rack_unit_height;
    let length = if declared > 0.0 {
        declared.min(bounds.height())
    } else {
        bounds.height()
    };
    SurfaceTracker::Linear(SurfaceOccupancy::new(length))
}

fn planar(bounds: &BoundingBox, _: &CabinetType, _: &MountingConfig) -> SurfaceTracker {
    SurfaceTracker::Planar(PlateOccupancy::new(bounds.width(), bounds.height()))
}

/// Gerätegrenzen im eigenen Koordinatensystem, ohne das Anker-Unterteil.
fn footprint(input: &PlanInput<'_>) -> Result<BoundingBox> {
    let excluded: Vec<&str> = input
        .config
        .mounting
        .anchor
        .part_name
        .as_deref()
        .into_iter()
        .collect();
    input
        .renderable
        .local_bounds_excluding(&excluded)
        .ok_or_else(|| ConfiguratorError::AssetLoadFailure {
            asset: input.config.asset.clone(),
            reason: "renderable has no measurable geometry".to_string(),
        })
}

fn overflow(surface: usize, err: NoSpace) -> ConfiguratorError {
    ConfiguratorError::SurfaceOverflow {
        surface,
        required_m: err.required,
        available_m: err.largest_gap,
    }
}

/// Bestimmt den Startoffset auf einer linearen Fläche.
fn linear_slot(input: &PlanInput<'_>, length: f64, step: Option<f64>) -> Result<f64> {
    let SurfaceTracker::Linear(rail) = &input.surface.tracker else {
        return Err(ConfiguratorError::InvalidDefinition(format!(
            "surface '{}' is not linear",
            input.surface.name
        )));
    };

    match input.offset {
        Some(offset) => {
            if rail.is_free(offset, offset + length, input.excluding) {
                Ok(offset)
            } else {
                Err(overflow(
                    input.surface_index,
                    NoSpace {
                        required: length,
                        largest_gap: rail.largest_gap(input.excluding),
                    },
                ))
            }
        }
        None => {
            let found = match step {
                Some(step) => rail.find_aligned_slot(length, step, input.excluding),
                None => rail.find_free_slot_excluding(length, 0.0, input.excluding),
            };
            found.map_err(|err| overflow(input.surface_index, err))
        }
    }
}

/// Hutschiene: linke Kante am Platzoffset, Ankerteil mittig auf der Schiene
/// und bündig mit ihrer Vorderseite.
fn plan_din_rail(input: &PlanInput<'_>) -> Result<Placement> {
    let rail = input.surface.bounds;
    let footprint = footprint(input)?;
    let width = input.config.estimated_width().max(footprint.width());
    let offset = linear_slot(input, width, None)?;

    let anchor = &input.config.mounting.anchor;
    let attachment = match anchor.part_name.as_deref() {
        Some(part) => input.renderable.component_bounds(part).unwrap_or_else(|| {
            tracing::warn!(
                part,
                equipment = %input.config.catalog_id,
                "anchor part not found, using full bounds"
            );
            footprint
        }),
        None => footprint,
    };

    let target = anchor_point(&rail, AnchorRule::RAIL_FRONT, Vec3::new(offset, 0.0, 0.0));
    let source =
        Vec3::new(footprint.min.x, attachment.center().y, attachment.min.z) + anchor.offset;
    let position = alignment_delta(target, source);

    tracing::debug!(
        surface = input.surface_index,
        offset_m = offset,
        width_m = width,
        "din rail placement"
    );

    Ok(Placement {
        mount_type: MountType::DinRail,
        surface_index: input.surface_index,
        offset_m: offset,
        width_m: width,
        cross_offset_m: 0.0,
        cross_extent_m: footprint.height(),
        position,
    })
}

/// Rack: ganze Höheneinheiten ab Rackboden, Gerätemitte auf der linken
/// Schienenkante, Tiefe vom Aufrufer.
fn plan_rack_unit(input: &PlanInput<'_>) -> Result<Placement> {
    let unit = input.settings.rack_unit_height;
    let units = input.config.mounting.rack_units.max(1);
    let height = units as f64 * unit;
    let footprint = footprint(input)?;

    let snapped = PlanInput {
        offset: input.offset.map(|offset| (offset / unit).round().max(0.0) * unit),
        ..*input
    };
    let start = linear_slot(&snapped, height, Some(unit))?;

    let target = anchor_point(
        &input.surface.bounds,
        AnchorRule::MIN_CORNER,
        Vec3::new(0.0, start, input.cross_offset),
    );
    let source = anchor_point(
        &footprint,
        AnchorRule::CENTER_BOTTOM_BACK,
        input.config.mounting.anchor.offset,
    );

    tracing::debug!(
        surface = input.surface_index,
        unit_index = (start / unit).round() as u32,
        units,
        "rack placement"
    );

    Ok(Placement {
        mount_type: MountType::RackUnit,
        surface_index: input.surface_index,
        offset_m: start,
        width_m: height,
        cross_offset_m: input.cross_offset,
        cross_extent_m: footprint.width(),
        position: alignment_delta(target, source),
    })
}

/// Platte: freie 2-D-Platzierung. Das belegte Rechteck beginnt bei (x, y), die
/// untere Gerätemitte sitzt darauf, die Rückseite auf der Plattenvorderseite.
fn plan_mounting_plate(input: &PlanInput<'_>) -> Result<Placement> {
    let SurfaceTracker::Planar(plate) = &input.surface.tracker else {
        return Err(ConfiguratorError::InvalidDefinition(format!(
            "surface '{}' is not planar",
            input.surface.name
        )));
    };

    let footprint = footprint(input)?;
    let width = input.config.estimated_width().max(footprint.width());
    let height = footprint.height();
    let y = (input.cross_offset, input.cross_offset + height);

    let x = match input.offset {
        Some(x) if plate.is_free((x, x + width), y, input.excluding) => x,
        Some(_) => {
            return Err(ConfiguratorError::SurfaceOverflow {
                surface: input.surface_index,
                required_m: width,
                available_m: plate.largest_gap_in_row(y, input.excluding),
            });
        }
        None => plate
            .find_free_in_row(width, y, input.excluding)
            .map_err(|err| overflow(input.surface_index, err))?,
    };

    let target = anchor_point(
        &input.surface.bounds,
        AnchorRule::PLATE_FRONT,
        Vec3::new(x + width / 2.0, input.cross_offset, 0.0),
    );
    let source = anchor_point(
        &footprint,
        AnchorRule::CENTER_BOTTOM_BACK,
        input.config.mounting.anchor.offset,
    );

    Ok(Placement {
        mount_type: MountType::MountingPlate,
        surface_index: input.surface_index,
        offset_m: x,
        width_m: width,
        cross_offset_m: input.cross_offset,
        cross_extent_m: height,
        position: alignment_delta(target, source),
    })
}

/// Wo der Aufrufer das Gerät haben möchte.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MountRequest {
    /// Bevorzugte Fläche. Zu große Indizes werden auf die letzte Fläche begrenzt.
    pub surface_index: usize,
    /// Expliziter Offset auf dieser Fläche. `None` durchsucht zuerst die
    /// bevorzugte Fläche, dann alle anderen ab Index 0.
    pub offset: Option<f64>,
    /// Vertikale Position auf einer Platte, Tiefenoffset im Rack.
    pub cross_offset: f64,
}

impl MountRequest {
    pub fn auto(surface_index: usize) -> Self {
        Self {
            surface_index,
            ..Self::default()
        }
    }

    pub fn at(surface_index: usize, offset: f64) -> Self {
        Self {
            surface_index,
            offset: Some(offset),
            cross_offset: 0.0,
        }
    }
}

/// Findet die Flächen einer Montageart in einer Schrankbaugruppe.
///
/// Deklarierte Montagezonen haben Vorrang. Ohne Deklaration werden die
/// Komponentennamen nach den Schlüsselwörtern der Strategie durchsucht und nach
/// Namen sortiert. Diese Suche ist nur eine Heuristik und wird als solche
/// geloggt. Ohne Treffer ist das Ergebnis leer.
pub fn locate_surfaces(
    ops: &StrategyOps,
    cabinet: &CabinetType,
    assembly: &SceneNode,
) -> Vec<(String, BoundingBox)> {
    let declared = cabinet.zone_component_names(ops.mount_type);
    if !declared.is_empty() {
        return declared
            .into_iter()
            .filter_map(|name| match assembly.component_bounds(&name) {
                Some(bounds) => Some((name, bounds)),
                None => {
                    tracing::warn!(
                        component = %name,
                        mount_type = %ops.mount_type,
                        cabinet = %cabinet.id,
                        "declared mounting component missing from assembly"
                    );
                    None
                }
            })
            .collect();
    }

    let mut names: Vec<&str> = assembly
        .descendant_names()
        .into_iter()
        .filter(|name| {
            let lower = name.to_ascii_lowercase();
            ops.keywords.iter().any(|k| lower.contains(k))
                && !ops.exclusions.iter().any(|k| lower.contains(k))
        })
        .collect();
    names.sort_unstable();
    names.dedup();

    if names.is_empty() {
        tracing::warn!(
            mount_type = %ops.mount_type,
            cabinet = %cabinet.id,
            "no mounting zones declared and no component matched by name"
        );
        return Vec::new();
    }

    tracing::warn!(
        mount_type = %ops.mount_type,
        cabinet = %cabinet.id,
        count = names.len(),
        "mounting surfaces located by name heuristic"
    );
    names
        .into_iter()
        .filter_map(|name| {
            assembly
                .component_bounds(name)
                .map(|bounds| (name.to_string(), bounds))
        })
        .collect()
}

/// An eine Schrankinstanz gebundene Strategie.
#[derive(Debug)]
pub struct MountingStrategy {
    ops: &'static StrategyOps,
    settings: MountingConfig,
    surfaces: Vec<MountSurface>,
}

impl MountingStrategy {
    pub fn new(
        ops: &'static StrategyOps,
        cabinet: &CabinetType,
        assembly: &SceneNode,
        settings: MountingConfig,
    ) -> Self {
        let surfaces = locate_surfaces(ops, cabinet, assembly)
            .into_iter()
            .map(|(name, bounds)| MountSurface {
                tracker: (ops.new_tracker)(&bounds, cabinet, &settings),
                name,
                bounds,
            })
            .collect();
        Self {
            ops,
            settings,
            surfaces,
        }
    }

    pub fn mount_type(&self) -> MountType {
        self.ops.mount_type
    }

    pub fn surfaces(&self) -> &[MountSurface] {
        &self.surfaces
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Günstige Kompatibilitätsprüfung, verändert nichts.
    pub fn can_mount(&self, config: &EquipmentConfig) -> bool {
        config.mount_type() == self.ops.mount_type && !self.surfaces.is_empty()
    }

    /// Berechnet eine Platzierung, ohne sie zu reservieren.
    pub fn plan(
        &self,
        renderable: &SceneNode,
        config: &EquipmentConfig,
        request: &MountRequest,
        excluding: Option<&str>,
    ) -> Result<Placement> {
        if self.surfaces.is_empty() {
            return Err(ConfiguratorError::NoMountSurface {
                mount_type: self.ops.mount_type,
            });
        }

        let last = self.surfaces.len() - 1;
        let preferred = if request.surface_index > last {
            tracing::warn!(
                requested = request.surface_index,
                available = self.surfaces.len(),
                "surface index out of range, using last surface"
            );
            last
        } else {
            request.surface_index
        };

        let order = if request.offset.is_some() {
            vec![preferred]
        } else {
            search_order(preferred, self.surfaces.len())
        };

        let mut first_error = None;
        for index in order {
            let input = PlanInput {
                surface: &self.surfaces[index],
                surface_index: index,
                renderable,
                config,
                offset: request.offset,
                cross_offset: request.cross_offset,
                settings: &self.settings,
                excluding,
            };
            match (self.ops.plan)(&input) {
                Ok(placement) => return Ok(placement),
                Err(err @ ConfiguratorError::SurfaceOverflow { .. }) => {
                    tracing::debug!(surface = index, error = %err, "surface full, trying next");
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
                Err(err) => return Err(err),
            }
        }

        Err(first_error.unwrap_or(ConfiguratorError::NoMountSurface {
            mount_type: self.ops.mount_type,
        }))
    }

    /// Reserviert eine geplante Platzierung für `owner`.
    pub fn commit(&mut self, owner: &str, placement: &Placement) {
        if let Some(surface) = self.surfaces.get_mut(placement.surface_index) {
            surface.tracker.reserve(owner, placement);
        }
    }

    /// Plant und reserviert in einem Schritt.
    pub fn mount(
        &mut self,
        owner: &str,
        renderable: &SceneNode,
        config: &EquipmentConfig,
        request: &MountRequest,
    ) -> Result<Placement> {
        if config.mount_type() != self.ops.mount_type {
            return Err(ConfiguratorError::UnsupportedMountType {
                mount_type: config.mount_type(),
            });
        }
        let placement = self.plan(renderable, config, request, None)?;
        self.commit(owner, &placement);
        Ok(placement)
    }

    /// Gibt die Reservierung von `owner` frei. Unbekannte Besitzer werden geloggt, nie ein Fehler.
    pub fn unmount(&mut self, owner: &str, surface_index: usize) -> bool {
        match self.surfaces.get_mut(surface_index) {
            Some(surface) => surface.tracker.release(owner),
            None => {
                tracing::warn!(owner, surface = surface_index, "unmount: no such surface");
                false
            }
        }
    }

    pub fn occupancy(&self, surface_index: usize) -> Option<OccupancyStats> {
        self.surfaces
            .get(surface_index)
            .map(|surface| surface.tracker.occupancy())
    }
}

/// Registry der Strategietabellen, nach Montageart.
#[derive(Clone, Debug)]
pub struct StrategyRegistry {
    tables: BTreeMap<MountType, &'static StrategyOps>,
    default_mount_type: MountType,
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(&DIN_RAIL_OPS);
        registry.register(&RACK_UNIT_OPS);
        registry.register(&MOUNTING_PLATE_OPS);
        registry
    }
}

impl StrategyRegistry {
    pub fn empty() -> Self {
        Self {
            tables: BTreeMap::new(),
            default_mount_type: MountType::DinRail,
        }
    }

    pub fn register(&mut self, ops: &'static StrategyOps) {
        self.tables.insert(ops.mount_type, ops);
    }

    pub fn get(&self, mount_type: MountType) -> Option<&'static StrategyOps> {
        self.tables.get(&mount_type).copied()
    }

    /// Baut die Strategien einer Schrankinstanz. Ein Schranktyp ohne deklarierte
    /// Fähigkeiten erhält nur die Standardstrategie (Hutschiene).
    pub fn build_for(
        &self,
        cabinet: &CabinetType,
        assembly: &SceneNode,
        settings: MountingConfig,
    ) -> BTreeMap<MountType, MountingStrategy> {
        let capabilities = if cabinet.mounting_capabilities.is_empty() {
            vec![self.default_mount_type]
        } else {
            cabinet.mounting_capabilities.clone()
        };

        capabilities
            .into_iter()
            .filter_map(|mount_type| match self.get(mount_type) {
                Some(ops) => Some((
                    mount_type,
                    MountingStrategy::new(ops, cabinet, assembly, settings),
                )),
                None => {
                    tracing::warn!(%mount_type, cabinet = %cabinet.id, "no strategy registered");
                    None
                }
            })
            .collect()
    }
}
