//! Error taxonomy of the configurator core.

use crate::cabinet::MountType;

/// Errors surfaced by mounting, registry and catalog operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfiguratorError {
    /// The cabinet has no surface of the requested mount type.
    #[error("cabinet has no {mount_type} mounting surface")]
    NoMountSurface { mount_type: MountType },

    /// The requested or auto-found slot does not fit the remaining space.
    #[error(
        "surface {surface} cannot take {required_m:.4} m ({available_m:.4} m largest usable gap)"
    )]
    SurfaceOverflow {
        surface: usize,
        required_m: f64,
        available_m: f64,
    },

    /// A cabinet or equipment id that is not registered.
    #[error("unknown {kind} '{id}'")]
    UnknownEntity { kind: EntityKind, id: String },

    /// A validation rule or logic plugin failed internally.
    #[error("rule '{rule}' failed: {message}")]
    RuleExecutionFailure { rule: String, message: String },

    /// The asset provider could not materialise a renderable.
    #[error("asset '{asset}' could not be loaded: {reason}")]
    AssetLoadFailure { asset: String, reason: String },

    /// The cabinet exists but has no strategy for the equipment's mount type.
    #[error("cabinet does not support mount type {mount_type}")]
    UnsupportedMountType { mount_type: MountType },

    /// The catalog has no entry for the given id.
    #[error("catalog has no {kind} entry '{id}'")]
    UnknownCatalogEntry { kind: EntityKind, id: String },

    /// Catalog data failed boundary validation.
    #[error("invalid definition: {0}")]
    InvalidDefinition(String),
}

/// Entity kinds referenced by errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Cabinet,
    Equipment,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Cabinet => write!(f, "cabinet"),
            EntityKind::Equipment => write!(f, "equipment"),
        }
    }
}

impl ConfiguratorError {
    pub fn unknown_cabinet(id: impl Into<String>) -> Self {
        ConfiguratorError::UnknownEntity {
            kind: EntityKind::Cabinet,
            id: id.into(),
        }
    }

    pub fn unknown_equipment(id: impl Into<String>) -> Self {
        ConfiguratorError::UnknownEntity {
            kind: EntityKind::Equipment,
            id: id.into(),
        }
    }

    /// Stable machine-readable code, used by the HTTP layer.
    pub fn code(&self) -> &'static str {
        match self {
            ConfiguratorError::NoMountSurface { .. } => "no_mount_surface",
            ConfiguratorError::SurfaceOverflow { .. } => "surface_overflow",
            ConfiguratorError::UnknownEntity { .. } => "unknown_entity",
            ConfiguratorError::RuleExecutionFailure { .. } => "rule_execution_failure",
            ConfiguratorError::AssetLoadFailure { .. } => "asset_load_failure",
            ConfiguratorError::UnsupportedMountType { .. } => "unsupported_mount_type",
            ConfiguratorError::UnknownCatalogEntry { .. } => "unknown_catalog_entry",
            ConfiguratorError::InvalidDefinition(_) => "invalid_definition",
        }
    }
}

pub type Result<T, E = ConfiguratorError> = std::result::Result<T, E>;
