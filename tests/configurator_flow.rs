use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use cabinet_configurator::cabinet::{CabinetCategory, CabinetType, MountType};
use cabinet_configurator::catalog::InMemoryCatalog;
use cabinet_configurator::config::AppConfig;
use cabinet_configurator::equipment::EquipmentConfig;
use cabinet_configurator::error::ConfiguratorError;
use cabinet_configurator::logic::{CalculationResult, LogicPlugin};
use cabinet_configurator::mounting::MountRequest;
use cabinet_configurator::scene::{AssetHint, AssetProvider, AssetRequest, ProceduralAssetProvider, SceneNode};
use cabinet_configurator::validation::{RuleOutcome, ValidationContext, ValidationRule};
use cabinet_configurator::{AddEquipment, Configurator, api};
use serde_json::Value;
use tower::ServiceExt;

const TOLERANCE: f64 = 1e-6;

fn configurator_with(assets: Arc<dyn AssetProvider>) -> Configurator {
    Configurator::new(
        Arc::new(InMemoryCatalog::demo().unwrap()),
        assets,
        &AppConfig::default(),
    )
}

fn configurator() -> Configurator {
    let height = AppConfig::default().mounting.rack_unit_height;
    configurator_with(Arc::new(ProceduralAssetProvider::new(height)))
}

/// Loads cabinets procedurally but fails every equipment asset.
struct BrokenEquipmentAssets(ProceduralAssetProvider);

#[async_trait]
impl AssetProvider for BrokenEquipmentAssets {
    async fn load(&self, request: AssetRequest<'_>) -> cabinet_configurator::Result<SceneNode> {
        match request.hint {
            AssetHint::Cabinet(_) => self.0.load(request).await,
            AssetHint::Equipment(_) => Err(ConfiguratorError::AssetLoadFailure {
                asset: request.path.to_string(),
                reason: "connection reset".to_string(),
            }),
        }
    }
}

struct NoAssets;

#[async_trait]
impl AssetProvider for NoAssets {
    async fn load(&self, request: AssetRequest<'_>) -> cabinet_configurator::Result<SceneNode> {
        Err(ConfiguratorError::AssetLoadFailure {
            asset: request.path.to_string(),
            reason: "not found".to_string(),
        })
    }
}

#[tokio::test]
async fn failed_placement_leaves_no_trace() {
    let mut configurator = configurator();
    let cabinet = configurator.add_cabinet("ts_700_500_250").await.unwrap();
    configurator
        .add_equipment(AddEquipment::new("circuit_breaker_1p").at_offset(0.0))
        .await
        .unwrap();

    // Rails are 0.4 m long: an 18 mm breaker at 0.39 m does not fit.
    let err = configurator
        .add_equipment(AddEquipment::new("circuit_breaker_1p").at_offset(0.39))
        .await
        .unwrap_err();
    assert!(matches!(err, ConfiguratorError::SurfaceOverflow { surface: 0, .. }));

    assert_eq!(configurator.equipment().len(), 1);
    let stats = configurator.rail_occupancy(0).unwrap();
    assert_eq!(stats.item_count, 1);
    assert!((stats.occupied_width - 0.018).abs() < TOLERANCE);
    assert_eq!(
        configurator.cabinets().get(&cabinet).unwrap().equipment_ids().len(),
        1
    );
}

#[tokio::test]
async fn failed_equipment_asset_leaves_no_trace() {
    let height = AppConfig::default().mounting.rack_unit_height;
    let mut configurator =
        configurator_with(Arc::new(BrokenEquipmentAssets(ProceduralAssetProvider::new(height))));
    configurator.add_cabinet("ts_700_500_250").await.unwrap();

    let err = configurator
        .add_equipment(AddEquipment::new("power_supply_240w"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "asset_load_failure");
    assert!(configurator.equipment().is_empty());
    assert_eq!(configurator.rail_occupancy(0).unwrap().item_count, 0);
}

#[tokio::test]
async fn failed_cabinet_asset_creates_no_cabinet() {
    let mut configurator = configurator_with(Arc::new(NoAssets));
    let mut events = configurator.events().subscribe();

    let err = configurator.add_cabinet("telecom_42u").await.unwrap_err();
    assert_eq!(err.code(), "asset_load_failure");
    assert!(configurator.cabinets().is_empty());
    assert!(configurator.cabinets().active_id().is_none());
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn placement_round_trips_through_the_transform() {
    let mut configurator = configurator();
    let cabinet_id = configurator.add_cabinet("ts_700_500_250").await.unwrap();
    let summary = configurator
        .add_equipment(AddEquipment::new("circuit_breaker_1p").on_surface(1).at_offset(0.137))
        .await
        .unwrap();

    let instance = configurator.equipment().get(&summary.id).unwrap();
    let rail = configurator
        .cabinets()
        .get(&cabinet_id)
        .unwrap()
        .strategy(MountType::DinRail)
        .unwrap()
        .surfaces()[1]
        .bounds;
    let footprint = instance
        .renderable
        .bounding_box_excluding(&["din_clip"])
        .unwrap();

    assert!((footprint.min.x - rail.min.x - 0.137).abs() < TOLERANCE);
    assert!((footprint.width() - 0.018).abs() < TOLERANCE);
    // Clip centre sits on the rail centre line, clip back on the rail front.
    let clip = instance.renderable.component_bounds("din_clip").unwrap();
    let clip = clip.translated(instance.renderable.position);
    assert!((clip.center().y - rail.center().y).abs() < TOLERANCE);
    assert!((clip.min.z - rail.max.z).abs() < TOLERANCE);
}

#[tokio::test]
async fn move_onto_an_occupied_slot_changes_nothing() {
    let mut configurator = configurator();
    configurator.add_cabinet("ts_700_500_250").await.unwrap();
    let a = configurator
        .add_equipment(AddEquipment::new("power_supply_240w").at_offset(0.1))
        .await
        .unwrap();
    let b = configurator
        .add_equipment(AddEquipment::new("power_supply_240w").at_offset(0.25))
        .await
        .unwrap();

    let err = configurator
        .move_equipment(&b.id, MountRequest::at(0, 0.12))
        .unwrap_err();
    assert!(matches!(err, ConfiguratorError::SurfaceOverflow { .. }));

    let stats = configurator.rail_occupancy(0).unwrap();
    let starts: Vec<(String, f64)> = stats
        .items
        .iter()
        .map(|item| (item.owner.clone(), item.start))
        .collect();
    assert_eq!(starts.len(), 2);
    assert!(starts.contains(&(a.id.clone(), 0.1)));
    assert!(starts.contains(&(b.id.clone(), 0.25)));
    assert_eq!(
        configurator.equipment().get(&b.id).unwrap().placement,
        b.placement
    );
}

#[tokio::test]
async fn move_may_overlap_its_own_old_slot() {
    let mut configurator = configurator();
    configurator.add_cabinet("ts_700_500_250").await.unwrap();
    let psu = configurator
        .add_equipment(AddEquipment::new("power_supply_240w").at_offset(0.1))
        .await
        .unwrap();

    let placement = configurator
        .move_equipment(&psu.id, MountRequest::at(0, 0.13))
        .unwrap();
    assert!((placement.offset_m - 0.13).abs() < TOLERANCE);

    let stats = configurator.rail_occupancy(0).unwrap();
    assert_eq!(stats.item_count, 1);
    assert!((stats.items[0].start - 0.13).abs() < TOLERANCE);

    let moved = configurator.equipment().get(&psu.id).unwrap();
    assert_eq!(moved.renderable.position, placement.position);

    // Onto another rail.
    let placement = configurator
        .move_equipment(&psu.id, MountRequest::at(2, 0.0))
        .unwrap();
    assert_eq!(placement.surface_index, 2);
    assert_eq!(configurator.rail_occupancy(0).unwrap().item_count, 0);
    assert_eq!(configurator.rail_occupancy(2).unwrap().item_count, 1);
}

#[tokio::test]
async fn remove_releases_occupancy_and_emits_events() {
    let mut configurator = configurator();
    let cabinet = configurator.add_cabinet("ts_700_500_250").await.unwrap();
    let mut events = configurator.events().subscribe();

    let breaker = configurator
        .add_equipment(AddEquipment::new("circuit_breaker_1p"))
        .await
        .unwrap();
    assert!(configurator.remove_equipment(&breaker.id));
    assert!(!configurator.remove_equipment(&breaker.id));
    assert_eq!(configurator.rail_occupancy(0).unwrap().item_count, 0);
    assert_eq!(
        configurator.cabinets().get(&cabinet).unwrap().equipment_ids().len(),
        0
    );

    let mut kinds = Vec::new();
    while let Ok(event) = events.try_recv() {
        kinds.push(event.kind());
    }
    assert_eq!(
        kinds,
        vec![
            "equipment_added",
            "calculations_updated",
            "equipment_removed",
            "calculations_updated"
        ]
    );
}

#[tokio::test]
async fn rack_and_plate_equipment_land_on_their_surfaces() {
    let mut configurator = configurator();
    let rack = configurator.add_cabinet("telecom_42u").await.unwrap();
    let first = configurator
        .add_equipment(AddEquipment::new("patch_panel_1u"))
        .await
        .unwrap();
    let second = configurator
        .add_equipment(AddEquipment::new("switch_1u"))
        .await
        .unwrap();
    let unit = AppConfig::default().mounting.rack_unit_height;
    assert_eq!(first.placement.offset_m, 0.0);
    assert!((second.placement.offset_m - unit).abs() < TOLERANCE);
    let stats = configurator.occupancy(&rack, MountType::RackUnit, 0).unwrap();
    assert!((stats.occupied_width - 2.0 * unit).abs() < TOLERANCE);

    configurator.add_cabinet("ts_700_500_250").await.unwrap();
    let relay = configurator
        .add_equipment(AddEquipment::new("relay_plate").at_offset(0.05).cross_offset(0.1))
        .await
        .unwrap();
    assert_eq!(relay.placement.mount_type, MountType::MountingPlate);
    assert!((relay.placement.cross_offset_m - 0.1).abs() < TOLERANCE);
}

/// Allows at most one installed item per cabinet.
struct SingleItemRule;

impl ValidationRule for SingleItemRule {
    fn name(&self) -> &str {
        "SingleItemRule"
    }

    fn validate(
        &self,
        _cabinet: &CabinetType,
        _equipment: &EquipmentConfig,
        context: &ValidationContext,
    ) -> Result<RuleOutcome, String> {
        let mut outcome = RuleOutcome::default();
        if context.installed_count >= 1 {
            outcome.error(format!("{} item(s) already installed", context.installed_count));
        }
        Ok(outcome)
    }
}

/// Counts rack items instead of the built-in telecom calculations.
struct ItemCounter;

impl LogicPlugin for ItemCounter {
    fn name(&self) -> &str {
        "ItemCounter"
    }

    fn category(&self) -> CabinetCategory {
        CabinetCategory::Telecom
    }

    fn calculate(
        &self,
        _cabinet: &CabinetType,
        equipment: &[&EquipmentConfig],
    ) -> Result<CalculationResult, String> {
        let mut result = CalculationResult::empty(CabinetCategory::Telecom);
        result
            .calculations
            .insert("items".to_string(), equipment.len() as f64);
        Ok(result)
    }
}

#[tokio::test]
async fn custom_rules_and_plugins_take_part() {
    let mut configurator = configurator();
    configurator.validation_mut().add_rule(Box::new(SingleItemRule));
    configurator.logic_mut().register(Box::new(ItemCounter));
    let rack = configurator.add_cabinet("telecom_42u").await.unwrap();

    let result = configurator.validate(&rack, "switch_1u").unwrap();
    assert!(!result.errors.iter().any(|issue| issue.rule == "SingleItemRule"));
    configurator
        .add_equipment(AddEquipment::new("switch_1u"))
        .await
        .unwrap();

    let result = configurator.validate(&rack, "switch_1u").unwrap();
    assert!(!result.valid);
    assert!(result.errors.iter().any(|issue| issue.rule == "SingleItemRule"));

    let calculations = configurator.calculate(&rack).unwrap();
    assert_eq!(calculations.metric("items"), Some(1.0));
    assert_eq!(calculations.metric("utilization_percent"), None);
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn http_flow_places_and_reports() {
    let app = api::router(configurator());

    let (status, catalog) = send(&app, "GET", "/catalog", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        catalog["cabinets"]
            .as_array()
            .unwrap()
            .iter()
            .any(|id| id == "ts_700_500_250")
    );

    let (status, cabinet) = send(
        &app,
        "POST",
        "/cabinets",
        Some(serde_json::json!({ "type_id": "ts_700_500_250" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let cabinet_id = cabinet["id"].as_str().unwrap().to_string();
    assert_eq!(cabinet["category"], "thermal");

    let (status, equipment) = send(
        &app,
        "POST",
        "/equipment",
        Some(serde_json::json!({ "catalog_id": "circuit_breaker_1p", "offset_m": 0.1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(equipment["cabinet_id"], cabinet_id.as_str());

    let (status, stats) = send(
        &app,
        "GET",
        &format!("/cabinets/{cabinet_id}/occupancy/din_rail/0"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["item_count"], 1);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/cabinets/{cabinet_id}/occupancy/magnetic/0"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, error) = send(
        &app,
        "POST",
        "/equipment",
        Some(serde_json::json!({ "catalog_id": "circuit_breaker_1p", "offset_m": 0.39 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["error"], "surface_overflow");

    let (status, calculations) = send(
        &app,
        "GET",
        &format!("/cabinets/{cabinet_id}/calculations"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(calculations["category"], "thermal");

    let (status, validation) = send(
        &app,
        "POST",
        &format!("/cabinets/{cabinet_id}/validate"),
        Some(serde_json::json!({ "catalog_id": "switch_1u" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(validation["valid"], false);

    let (status, _) = send(&app, "DELETE", "/equipment/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &format!("/cabinets/{cabinet_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn http_rejects_malformed_payloads() {
    let app = api::router(configurator());

    let (status, error) = send(&app, "POST", "/cabinets", Some(serde_json::json!({ "name": 1 }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["error"], "Invalid JSON data");

    let (status, error) = send(
        &app,
        "POST",
        "/cabinets",
        Some(serde_json::json!({ "type_id": "missing" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["error"], "unknown_catalog_entry");

    let (status, _) = send(
        &app,
        "POST",
        "/equipment",
        Some(serde_json::json!({ "catalog_id": "rcd_2p", "offset_m": -1.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
