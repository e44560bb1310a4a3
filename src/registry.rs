//! Cabinet and equipment registries, owned by the `Configurator` context.
//!
//! The configurator is the single owner of all live state: cabinet instances
//! with their mounting strategies (and therefore their occupancy), equipment
//! instances, the engines and the event bus. Every mutating call either
//! completes fully or leaves no trace. Adds plan a placement before anything
//! is registered, so a failed placement only discards the loaded asset.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::cabinet::{CabinetCategory, CabinetType, MountType};
use crate::catalog::CatalogProvider;
use crate::config::{AppConfig, MountingConfig};
use crate::equipment::{EquipmentConfig, EquipmentInstance, EquipmentSummary, Placement};
use crate::error::{ConfiguratorError, EntityKind, Result};
use crate::events::{ConfiguratorEvent, EventBus};
use crate::logic::{CalculationResult, LogicEngine};
use crate::mounting::{MountRequest, MountingStrategy, StrategyRegistry};
use crate::occupancy::OccupancyStats;
use crate::scene::{AssetHint, AssetProvider, AssetRequest, SceneNode};
use crate::validation::{ValidationContext, ValidationEngine, ValidationResult};

/// A cabinet placed in the configuration.
#[derive(Debug)]
pub struct CabinetInstance {
    pub id: String,
    pub cabinet_type: CabinetType,
    pub assembly: SceneNode,
    strategies: BTreeMap<MountType, MountingStrategy>,
    equipment_ids: Vec<String>,
}

impl CabinetInstance {
    pub fn strategy(&self, mount_type: MountType) -> Option<&MountingStrategy> {
        self.strategies.get(&mount_type)
    }

    pub fn mount_types(&self) -> Vec<MountType> {
        self.strategies.keys().copied().collect()
    }

    /// Equipment ids in the order they were added.
    pub fn equipment_ids(&self) -> &[String] {
        &self.equipment_ids
    }

    pub fn summary(&self) -> CabinetSummary {
        let surfaces = self
            .strategies
            .values()
            .flat_map(|strategy| {
                strategy
                    .surfaces()
                    .iter()
                    .enumerate()
                    .map(|(index, surface)| SurfaceSummary {
                        mount_type: strategy.mount_type(),
                        index,
                        name: surface.name.clone(),
                        length_m: strategy
                            .occupancy(index)
                            .map(|stats| stats.surface_width)
                            .unwrap_or_default(),
                    })
            })
            .collect();

        CabinetSummary {
            id: self.id.clone(),
            type_id: self.cabinet_type.id.clone(),
            name: self.cabinet_type.name.clone(),
            category: self.cabinet_type.category(),
            mount_types: self.mount_types(),
            surfaces,
            equipment_count: self.equipment_ids.len(),
        }
    }
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct SurfaceSummary {
    pub mount_type: MountType,
    pub index: usize,
    pub name: String,
    pub length_m: f64,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct CabinetSummary {
    pub id: String,
    pub type_id: String,
    pub name: String,
    pub category: CabinetCategory,
    pub mount_types: Vec<MountType>,
    pub surfaces: Vec<SurfaceSummary>,
    pub equipment_count: usize,
}

/// Cabinet instances in insertion order, plus the active selection.
#[derive(Debug, Default)]
pub struct CabinetRegistry {
    cabinets: Vec<CabinetInstance>,
    active: Option<String>,
}

impl CabinetRegistry {
    pub fn len(&self) -> usize {
        self.cabinets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cabinets.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&CabinetInstance> {
        self.cabinets.iter().find(|cabinet| cabinet.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut CabinetInstance> {
        self.cabinets.iter_mut().find(|cabinet| cabinet.id == id)
    }

    /// Stores the cabinet and makes it active.
    fn insert(&mut self, cabinet: CabinetInstance) {
        self.active = Some(cabinet.id.clone());
        self.cabinets.push(cabinet);
    }

    /// Removes a cabinet. When it was active, the first remaining cabinet
    /// becomes active.
    fn remove(&mut self, id: &str) -> Option<CabinetInstance> {
        let index = self.cabinets.iter().position(|cabinet| cabinet.id == id)?;
        let removed = self.cabinets.remove(index);
        if self.active.as_deref() == Some(id) {
            self.active = self.cabinets.first().map(|cabinet| cabinet.id.clone());
        }
        Some(removed)
    }

    pub fn set_active(&mut self, id: &str) -> Result<()> {
        if self.get(id).is_none() {
            return Err(ConfiguratorError::unknown_cabinet(id));
        }
        self.active = Some(id.to_string());
        Ok(())
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active(&self) -> Option<&CabinetInstance> {
        self.active_id().and_then(|id| self.get(id))
    }

    pub fn list(&self) -> Vec<CabinetSummary> {
        self.cabinets.iter().map(CabinetInstance::summary).collect()
    }
}

#[derive(Debug, Default)]
pub struct EquipmentRegistry {
    items: BTreeMap<String, EquipmentInstance>,
}

impl EquipmentRegistry {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&EquipmentInstance> {
        self.items.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    pub fn in_cabinet<'a>(&'a self, cabinet_id: &'a str) -> impl Iterator<Item = &'a EquipmentInstance> {
        self.items
            .values()
            .filter(move |item| item.cabinet_id == cabinet_id)
    }

    fn insert(&mut self, instance: EquipmentInstance) {
        self.items.insert(instance.id.clone(), instance);
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut EquipmentInstance> {
        self.items.get_mut(id)
    }

    fn remove(&mut self, id: &str) -> Option<EquipmentInstance> {
        self.items.remove(id)
    }
}

/// Request to add one piece of equipment.
#[derive(Clone, Debug, PartialEq)]
pub struct AddEquipment {
    pub catalog_id: String,
    /// Target cabinet, the active one when `None`.
    pub cabinet_id: Option<String>,
    pub mount: MountRequest,
}

impl AddEquipment {
    pub fn new(catalog_id: impl Into<String>) -> Self {
        Self {
            catalog_id: catalog_id.into(),
            cabinet_id: None,
            mount: MountRequest::default(),
        }
    }

    pub fn in_cabinet(mut self, cabinet_id: impl Into<String>) -> Self {
        self.cabinet_id = Some(cabinet_id.into());
        self
    }

    pub fn on_surface(mut self, surface_index: usize) -> Self {
        self.mount.surface_index = surface_index;
        self
    }

    pub fn at_offset(mut self, offset: f64) -> Self {
        self.mount.offset = Some(offset);
        self
    }

    pub fn cross_offset(mut self, cross_offset: f64) -> Self {
        self.mount.cross_offset = cross_offset;
        self
    }
}

/// Top-level context owning every registry, engine and the event bus.
pub struct Configurator {
    catalog: Arc<dyn CatalogProvider>,
    assets: Arc<dyn AssetProvider>,
    strategies: StrategyRegistry,
    validation: ValidationEngine,
    logic: LogicEngine,
    events: EventBus,
    settings: MountingConfig,
    cabinets: CabinetRegistry,
    equipment: EquipmentRegistry,
}

impl Configurator {
    pub fn new(
        catalog: Arc<dyn CatalogProvider>,
        assets: Arc<dyn AssetProvider>,
        config: &AppConfig,
    ) -> Self {
        Self {
            catalog,
            assets,
            strategies: StrategyRegistry::default(),
            validation: ValidationEngine::with_default_rules(config.validation),
            logic: LogicEngine::with_default_plugins(config.logic),
            events: EventBus::default(),
            settings: config.mounting,
            cabinets: CabinetRegistry::default(),
            equipment: EquipmentRegistry::default(),
        }
    }

    pub fn catalog(&self) -> &dyn CatalogProvider {
        self.catalog.as_ref()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn cabinets(&self) -> &CabinetRegistry {
        &self.cabinets
    }

    pub fn equipment(&self) -> &EquipmentRegistry {
        &self.equipment
    }

    pub fn validation(&self) -> &ValidationEngine {
        &self.validation
    }

    pub fn validation_mut(&mut self) -> &mut ValidationEngine {
        &mut self.validation
    }

    pub fn logic(&self) -> &LogicEngine {
        &self.logic
    }

    pub fn logic_mut(&mut self) -> &mut LogicEngine {
        &mut self.logic
    }

    /// Instantiates a catalog cabinet type and makes it active.
    pub async fn add_cabinet(&mut self, type_id: &str) -> Result<String> {
        let cabinet_type = self.catalog.cabinet_type(type_id)?;
        let id = Uuid::new_v4().to_string();

        let assembly = self
            .assets
            .load(AssetRequest {
                path: &cabinet_type.asset,
                instance_name: &id,
                hint: AssetHint::Cabinet(&cabinet_type),
            })
            .await
            .inspect_err(|err| {
                tracing::error!(type_id, error = %err, "cabinet asset failed to load");
            })?;

        let strategies = self
            .strategies
            .build_for(&cabinet_type, &assembly, self.settings);
        let category = cabinet_type.category();

        tracing::info!(
            cabinet_id = %id,
            type_id,
            category = %category,
            strategies = strategies.len(),
            "cabinet added"
        );
        self.cabinets.insert(CabinetInstance {
            id: id.clone(),
            cabinet_type,
            assembly,
            strategies,
            equipment_ids: Vec::new(),
        });

        self.events.emit(ConfiguratorEvent::CabinetAdded {
            cabinet_id: id.clone(),
            type_id: type_id.to_string(),
            category,
        });
        self.events.emit(ConfiguratorEvent::ActiveCabinetChanged {
            cabinet_id: Some(id.clone()),
        });
        Ok(id)
    }

    /// Removes a cabinet together with all its equipment.
    pub fn remove_cabinet(&mut self, id: &str) -> bool {
        let was_active = self.cabinets.active_id() == Some(id);
        let Some(cabinet) = self.cabinets.remove(id) else {
            tracing::warn!(cabinet_id = id, "remove_cabinet: unknown cabinet");
            return false;
        };

        for equipment_id in &cabinet.equipment_ids {
            if self.equipment.remove(equipment_id).is_some() {
                self.events.emit(ConfiguratorEvent::EquipmentRemoved {
                    equipment_id: equipment_id.clone(),
                    cabinet_id: id.to_string(),
                });
            }
        }
        tracing::info!(
            cabinet_id = id,
            equipment = cabinet.equipment_ids.len(),
            "cabinet removed"
        );

        self.events.emit(ConfiguratorEvent::CabinetRemoved {
            cabinet_id: id.to_string(),
        });
        if was_active {
            self.events.emit(ConfiguratorEvent::ActiveCabinetChanged {
                cabinet_id: self.cabinets.active_id().map(str::to_string),
            });
        }
        true
    }

    pub fn set_active(&mut self, id: &str) -> Result<()> {
        self.cabinets.set_active(id)?;
        self.events.emit(ConfiguratorEvent::ActiveCabinetChanged {
            cabinet_id: Some(id.to_string()),
        });
        Ok(())
    }

    pub fn active_cabinet(&self) -> Option<&CabinetInstance> {
        self.cabinets.active()
    }

    pub fn list_cabinets(&self) -> Vec<CabinetSummary> {
        self.cabinets.list()
    }

    fn resolve_cabinet_id(&self, requested: Option<&str>) -> Result<String> {
        match requested {
            Some(id) if self.cabinets.get(id).is_some() => Ok(id.to_string()),
            Some(id) => Err(ConfiguratorError::unknown_cabinet(id)),
            None => self
                .cabinets
                .active_id()
                .map(str::to_string)
                .ok_or_else(|| ConfiguratorError::unknown_cabinet("(active)")),
        }
    }

    /// Loads, places and registers one piece of equipment.
    ///
    /// Either every piece of state is created or none is: the placement is
    /// planned before the instance is registered or any occupancy reserved.
    pub async fn add_equipment(&mut self, request: AddEquipment) -> Result<EquipmentSummary> {
        let cabinet_id = self.resolve_cabinet_id(request.cabinet_id.as_deref())?;
        let config = self.catalog.equipment_config(&request.catalog_id)?;
        let mount_type = config.mount_type();

        let supported = self
            .cabinets
            .get(&cabinet_id)
            .is_some_and(|cabinet| cabinet.strategies.contains_key(&mount_type));
        if !supported {
            return Err(ConfiguratorError::UnsupportedMountType { mount_type });
        }

        let id = Uuid::new_v4().to_string();
        let renderable = self
            .assets
            .load(AssetRequest {
                path: &config.asset,
                instance_name: &id,
                hint: AssetHint::Equipment(&config),
            })
            .await
            .inspect_err(|err| {
                tracing::error!(
                    catalog_id = %request.catalog_id,
                    error = %err,
                    "equipment asset failed to load"
                );
            })?;

        let cabinet = self
            .cabinets
            .get_mut(&cabinet_id)
            .ok_or_else(|| ConfiguratorError::unknown_cabinet(&cabinet_id))?;
        let strategy = cabinet
            .strategies
            .get_mut(&mount_type)
            .ok_or(ConfiguratorError::UnsupportedMountType { mount_type })?;

        let placement = match strategy.plan(&renderable, &config, &request.mount, None) {
            Ok(placement) => placement,
            Err(err) => {
                tracing::warn!(
                    cabinet_id = %cabinet_id,
                    catalog_id = %request.catalog_id,
                    error = %err,
                    "placement failed, loaded asset discarded"
                );
                return Err(err);
            }
        };
        strategy.commit(&id, &placement);
        cabinet.equipment_ids.push(id.clone());

        tracing::info!(
            equipment_id = %id,
            cabinet_id = %cabinet_id,
            catalog_id = %request.catalog_id,
            surface = placement.surface_index,
            offset_m = placement.offset_m,
            width_m = placement.width_m,
            "equipment added"
        );

        let instance = EquipmentInstance {
            id,
            cabinet_id: cabinet_id.clone(),
            config,
            renderable: renderable.at(placement.position),
            placement,
        };
        let summary = instance.summary();
        self.equipment.insert(instance);

        self.events.emit(ConfiguratorEvent::EquipmentAdded {
            equipment: summary.clone(),
        });
        self.publish_calculations(&cabinet_id);
        Ok(summary)
    }

    /// Releases the equipment's occupancy and unregisters it. Unknown ids are
    /// logged and reported as `false`.
    pub fn remove_equipment(&mut self, id: &str) -> bool {
        let Some(instance) = self.equipment.remove(id) else {
            tracing::warn!(equipment_id = id, "remove_equipment: unknown equipment");
            return false;
        };

        if let Some(cabinet) = self.cabinets.get_mut(&instance.cabinet_id) {
            if let Some(strategy) = cabinet.strategies.get_mut(&instance.placement.mount_type) {
                strategy.unmount(id, instance.placement.surface_index);
            }
            cabinet.equipment_ids.retain(|owned| owned != id);
        }
        tracing::info!(
            equipment_id = id,
            cabinet_id = %instance.cabinet_id,
            "equipment removed"
        );

        self.events.emit(ConfiguratorEvent::EquipmentRemoved {
            equipment_id: id.to_string(),
            cabinet_id: instance.cabinet_id.clone(),
        });
        self.publish_calculations(&instance.cabinet_id);
        true
    }

    /// Moves equipment to a new slot. The target is checked against every
    /// reservation except the equipment's own before anything changes.
    pub fn move_equipment(&mut self, id: &str, target: MountRequest) -> Result<Placement> {
        let Some(instance) = self.equipment.get_mut(id) else {
            tracing::warn!(equipment_id = id, "move_equipment: unknown equipment");
            return Err(ConfiguratorError::unknown_equipment(id));
        };
        let cabinet_id = instance.cabinet_id.clone();
        let previous = instance.placement.clone();

        let strategy = self
            .cabinets
            .get_mut(&cabinet_id)
            .and_then(|cabinet| cabinet.strategies.get_mut(&previous.mount_type))
            .ok_or_else(|| ConfiguratorError::unknown_cabinet(&cabinet_id))?;

        let placement = strategy.plan(&instance.renderable, &instance.config, &target, Some(id))?;
        strategy.unmount(id, previous.surface_index);
        strategy.commit(id, &placement);

        instance.renderable.position = placement.position;
        instance.placement = placement.clone();
        let summary = instance.summary();

        tracing::info!(
            equipment_id = id,
            cabinet_id = %cabinet_id,
            surface = placement.surface_index,
            offset_m = placement.offset_m,
            "equipment moved"
        );
        self.events.emit(ConfiguratorEvent::EquipmentMoved {
            equipment: summary,
            from: previous,
        });
        Ok(placement)
    }

    /// Occupancy of one surface of a cabinet.
    pub fn occupancy(
        &self,
        cabinet_id: &str,
        mount_type: MountType,
        surface_index: usize,
    ) -> Result<OccupancyStats> {
        let cabinet = self
            .cabinets
            .get(cabinet_id)
            .ok_or_else(|| ConfiguratorError::unknown_cabinet(cabinet_id))?;
        let strategy = cabinet
            .strategy(mount_type)
            .ok_or(ConfiguratorError::UnsupportedMountType { mount_type })?;
        strategy
            .occupancy(surface_index)
            .ok_or(ConfiguratorError::NoMountSurface { mount_type })
    }

    /// DIN rail occupancy of the active cabinet.
    pub fn rail_occupancy(&self, surface_index: usize) -> Result<OccupancyStats> {
        let cabinet_id = self.resolve_cabinet_id(None)?;
        self.occupancy(&cabinet_id, MountType::DinRail, surface_index)
    }

    fn installed_configs<'a>(&'a self, cabinet_id: &'a str) -> Vec<&'a EquipmentConfig> {
        self.equipment
            .in_cabinet(cabinet_id)
            .map(|item| item.config.as_ref())
            .collect()
    }

    pub fn calculate(&self, cabinet_id: &str) -> Result<CalculationResult> {
        let cabinet = self
            .cabinets
            .get(cabinet_id)
            .ok_or_else(|| ConfiguratorError::unknown_cabinet(cabinet_id))?;
        let installed = self.installed_configs(cabinet_id);
        Ok(self.logic.calculate(&cabinet.cabinet_type, &installed))
    }

    fn publish_calculations(&self, cabinet_id: &str) {
        if let Ok(result) = self.calculate(cabinet_id) {
            self.events.emit(ConfiguratorEvent::CalculationsUpdated {
                cabinet_id: cabinet_id.to_string(),
                result,
            });
        }
    }

    /// Validates adding a catalog equipment type to a cabinet, taking what is
    /// already installed into account.
    pub fn validate(&self, cabinet_id: &str, catalog_id: &str) -> Result<ValidationResult> {
        let cabinet = self
            .cabinets
            .get(cabinet_id)
            .ok_or_else(|| ConfiguratorError::unknown_cabinet(cabinet_id))?;
        let config = self.catalog.equipment_config(catalog_id)?;
        let context = ValidationContext::from_installed(self.installed_configs(cabinet_id));
        let result = self
            .validation
            .validate(&cabinet.cabinet_type, &config, &context);

        let (cabinet_id, catalog_id) = (cabinet_id.to_string(), catalog_id.to_string());
        let event = if !result.valid {
            ConfiguratorEvent::ValidationFailed {
                cabinet_id,
                catalog_id,
                result: result.clone(),
            }
        } else if !result.warnings.is_empty() {
            ConfiguratorEvent::ValidationWarning {
                cabinet_id,
                catalog_id,
                result: result.clone(),
            }
        } else {
            ConfiguratorEvent::ValidationSucceeded {
                cabinet_id,
                catalog_id,
            }
        };
        self.events.emit(event);
        Ok(result)
    }

    /// Entity kind of an id, if it is registered.
    pub fn kind_of(&self, id: &str) -> Option<EntityKind> {
        if self.cabinets.get(id).is_some() {
            Some(EntityKind::Cabinet)
        } else if self.equipment.contains(id) {
            Some(EntityKind::Equipment)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::scene::ProceduralAssetProvider;

    fn configurator() -> Configurator {
        let config = AppConfig::default();
        Configurator::new(
            Arc::new(InMemoryCatalog::demo().unwrap()),
            Arc::new(ProceduralAssetProvider::new(config.mounting.rack_unit_height)),
            &config,
        )
    }

    #[tokio::test]
    async fn removing_the_active_cabinet_activates_the_first_remaining() {
        let mut configurator = configurator();
        let first = configurator.add_cabinet("ts_700_500_250").await.unwrap();
        let second = configurator.add_cabinet("telecom_42u").await.unwrap();
        let third = configurator.add_cabinet("server_47u").await.unwrap();
        assert_eq!(configurator.cabinets().active_id(), Some(third.as_str()));

        configurator.set_active(&second).unwrap();
        assert!(configurator.remove_cabinet(&second));
        assert_eq!(configurator.cabinets().active_id(), Some(first.as_str()));
        assert!(!configurator.remove_cabinet(&second));
        assert_eq!(configurator.list_cabinets().len(), 2);
        assert!(configurator.set_active("missing").is_err());
    }

    #[tokio::test]
    async fn removing_a_cabinet_drops_its_equipment() {
        let mut configurator = configurator();
        let cabinet = configurator.add_cabinet("ts_700_500_250").await.unwrap();
        for _ in 0..3 {
            configurator
                .add_equipment(AddEquipment::new("circuit_breaker_1p"))
                .await
                .unwrap();
        }
        assert_eq!(configurator.equipment().len(), 3);

        configurator.remove_cabinet(&cabinet);
        assert!(configurator.equipment().is_empty());
        assert!(configurator.cabinets().active().is_none());
    }

    #[tokio::test]
    async fn equipment_goes_to_the_active_cabinet() {
        let mut configurator = configurator();
        let cabinet = configurator.add_cabinet("ts_700_500_250").await.unwrap();
        let summary = configurator
            .add_equipment(AddEquipment::new("rcd_2p").on_surface(1))
            .await
            .unwrap();

        assert_eq!(summary.cabinet_id, cabinet);
        assert_eq!(summary.placement.surface_index, 1);
        assert_eq!(summary.placement.offset_m, 0.0);
        assert_eq!(configurator.kind_of(&summary.id), Some(EntityKind::Equipment));

        let stats = configurator.rail_occupancy(1).unwrap();
        assert_eq!(stats.item_count, 1);
        assert!((stats.occupied_width - 0.036).abs() < 1e-9);
    }

    #[tokio::test]
    async fn unsupported_mount_type_is_rejected_before_loading() {
        let mut configurator = configurator();
        configurator.add_cabinet("telecom_42u").await.unwrap();
        let err = configurator
            .add_equipment(AddEquipment::new("circuit_breaker_1p"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ConfiguratorError::UnsupportedMountType {
                mount_type: MountType::DinRail
            }
        );
        assert!(configurator.equipment().is_empty());
    }

    #[tokio::test]
    async fn add_without_cabinet_fails() {
        let mut configurator = configurator();
        let err = configurator
            .add_equipment(AddEquipment::new("circuit_breaker_1p"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "unknown_entity");
    }

    #[tokio::test]
    async fn validation_counts_installed_equipment() {
        let mut configurator = configurator();
        let rack = configurator.add_cabinet("telecom_42u").await.unwrap();
        // 5000 W maximum: six servers draw 4800 W, a seventh would exceed it
        for _ in 0..6 {
            configurator
                .add_equipment(AddEquipment::new("server_2u"))
                .await
                .unwrap();
        }
        let result = configurator.validate(&rack, "server_2u").unwrap();
        assert!(!result.valid);
        assert!(result.errors.iter().any(|issue| issue.rule == "PowerRule"));

        let calculations = configurator.calculate(&rack).unwrap();
        assert_eq!(calculations.metric("used_rack_units"), Some(12.0));
    }

    #[tokio::test]
    async fn removing_unknown_equipment_is_a_no_op() {
        let mut configurator = configurator();
        configurator.add_cabinet("ts_700_500_250").await.unwrap();
        assert!(!configurator.remove_equipment("ghost"));
        assert_eq!(
            configurator.move_equipment("ghost", MountRequest::at(0, 0.1)),
            Err(ConfiguratorError::unknown_equipment("ghost"))
        );
    }
}
