//! Fire-and-forget notifications about configurator state changes.

use serde::Serialize;
use tokio::sync::broadcast;
use utoipa::ToSchema;

use crate::cabinet::CabinetCategory;
use crate::equipment::{EquipmentSummary, Placement};
use crate::logic::CalculationResult;
use crate::validation::ValidationResult;

const DEFAULT_CAPACITY: usize = 256;

#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConfiguratorEvent {
    CabinetAdded {
        cabinet_id: String,
        type_id: String,
        category: CabinetCategory,
    },
    CabinetRemoved {
        cabinet_id: String,
    },
    ActiveCabinetChanged {
        cabinet_id: Option<String>,
    },
    EquipmentAdded {
        equipment: EquipmentSummary,
    },
    EquipmentRemoved {
        equipment_id: String,
        cabinet_id: String,
    },
    EquipmentMoved {
        equipment: EquipmentSummary,
        from: Placement,
    },
    CalculationsUpdated {
        cabinet_id: String,
        result: CalculationResult,
    },
    ValidationSucceeded {
        cabinet_id: String,
        catalog_id: String,
    },
    ValidationWarning {
        cabinet_id: String,
        catalog_id: String,
        result: ValidationResult,
    },
    ValidationFailed {
        cabinet_id: String,
        catalog_id: String,
        result: ValidationResult,
    },
}

impl ConfiguratorEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ConfiguratorEvent::CabinetAdded { .. } => "cabinet_added",
            ConfiguratorEvent::CabinetRemoved { .. } => "cabinet_removed",
            ConfiguratorEvent::ActiveCabinetChanged { .. } => "active_cabinet_changed",
            ConfiguratorEvent::EquipmentAdded { .. } => "equipment_added",
            ConfiguratorEvent::EquipmentRemoved { .. } => "equipment_removed",
            ConfiguratorEvent::EquipmentMoved { .. } => "equipment_moved",
            ConfiguratorEvent::CalculationsUpdated { .. } => "calculations_updated",
            ConfiguratorEvent::ValidationSucceeded { .. } => "validation_succeeded",
            ConfiguratorEvent::ValidationWarning { .. } => "validation_warning",
            ConfiguratorEvent::ValidationFailed { .. } => "validation_failed",
        }
    }
}

/// Broadcast sink. Emitting never blocks and never fails, even without
/// subscribers. Slow subscribers lag and lose the oldest events.
#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<ConfiguratorEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn emit(&self, event: ConfiguratorEvent) {
        let kind = event.kind();
        match self.sender.send(event) {
            Ok(receivers) => tracing::debug!(event = kind, receivers, "event emitted"),
            Err(_) => tracing::trace!(event = kind, "event dropped, no subscribers"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConfiguratorEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emitting_without_subscribers_is_a_no_op() {
        let bus = EventBus::default();
        assert_eq!(bus.subscriber_count(), 0);
        bus.emit(ConfiguratorEvent::CabinetRemoved {
            cabinet_id: "c1".into(),
        });
    }

    #[test]
    fn every_subscriber_receives_each_event() {
        let bus = EventBus::new(8);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.emit(ConfiguratorEvent::ActiveCabinetChanged {
            cabinet_id: Some("c1".into()),
        });

        for receiver in [&mut first, &mut second] {
            let event = receiver.try_recv().unwrap();
            assert_eq!(event.kind(), "active_cabinet_changed");
        }
        drop(second);
        bus.emit(ConfiguratorEvent::CabinetRemoved {
            cabinet_id: "c1".into(),
        });
        assert_eq!(first.try_recv().unwrap().kind(), "cabinet_removed");
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let event = ConfiguratorEvent::CabinetAdded {
            cabinet_id: "c1".into(),
            type_id: "telecom_42u".into(),
            category: CabinetCategory::Telecom,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "cabinet_added");
        assert_eq!(json["category"], "telecom");
        assert_eq!(json["cabinet_id"], "c1");
    }
}
