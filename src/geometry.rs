//! Ankergeometrie für die Montage.
//!
//! Jede Montagestrategie führt die Platzierung auf zwei Schritte zurück: einen
//! Ankerpunkt auf der Montagefläche und einen Ankerpunkt am Gerät bestimmen,
//! dann das Gerät um die Differenz verschieben. Rotationen kommen nicht vor.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::types::{BoundingBox, Vec3};

/// Welche Koordinate einer Bounding Box ein Anker entlang einer Achse verwendet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AxisAnchor {
    Min,
    Center,
    Max,
}

impl AxisAnchor {
    #[inline]
    fn pick(self, min: f64, max: f64) -> f64 {
        match self {
            AxisAnchor::Min => min,
            AxisAnchor::Center => (min + max) / 2.0,
            AxisAnchor::Max => max,
        }
    }
}

/// Ankerwahl pro Achse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AnchorRule {
    pub x: AxisAnchor,
    pub y: AxisAnchor,
    pub z: AxisAnchor,
}

impl AnchorRule {
    pub const fn new(x: AxisAnchor, y: AxisAnchor, z: AxisAnchor) -> Self {
        Self { x, y, z }
    }

    /// Linke Kante, vertikale Mitte, Vorderseite. Anker einer Hutschiene.
    pub const RAIL_FRONT: AnchorRule =
        AnchorRule::new(AxisAnchor::Min, AxisAnchor::Center, AxisAnchor::Max);

    /// Linke Kante, vertikale Mitte, Rückseite. Anker eines Hutschienenclips.
    pub const CLIP_BACK: AnchorRule =
        AnchorRule::new(AxisAnchor::Min, AxisAnchor::Center, AxisAnchor::Min);

    /// Horizontale Mitte, Unterkante, Rückseite. Anker von Rack- und Plattengeräten.
    pub const CENTER_BOTTOM_BACK: AnchorRule =
        AnchorRule::new(AxisAnchor::Center, AxisAnchor::Min, AxisAnchor::Min);

    /// Linke Kante, Unterkante, Rückseite. Anker der Rackschienen.
    pub const MIN_CORNER: AnchorRule =
        AnchorRule::new(AxisAnchor::Min, AxisAnchor::Min, AxisAnchor::Min);

    /// Linke Kante, Unterkante, Vorderseite. Anker einer Montageplatte.
    pub const PLATE_FRONT: AnchorRule =
        AnchorRule::new(AxisAnchor::Min, AxisAnchor::Min, AxisAnchor::Max);
}

/// Berechnet den Ankerpunkt einer Bounding Box.
///
/// # Parameter
/// * `bbox` - Bounding Box des Objekts im gemeinsamen Koordinatensystem
/// * `rule` - Welche Koordinate pro Achse genommen wird
/// * `offset` - Konfigurierbare Verschiebung, nach der Regel addiert
pub fn anchor_point(bbox: &BoundingBox, rule: AnchorRule, offset: Vec3) -> Vec3 {
    Vec3::new(
        rule.x.pick(bbox.min.x, bbox.max.x),
        rule.y.pick(bbox.min.y, bbox.max.y),
        rule.z.pick(bbox.min.z, bbox.max.z),
    ) + offset
}

/// Verschiebung, die `source` exakt auf `target` bringt.
#[inline]
pub fn alignment_delta(target: Vec3, source: Vec3) -> Vec3 {
    target - source
}

/// Berechnet die Überlappung zweier Intervalle in einer Dimension.
///
/// # Rückgabewert
/// Länge der Überlappung, mindestens 0.0
///
/// # Beispiel
/// ```
/// use cabinet_configurator::geometry::overlap_1d;
///
/// let overlap = overlap_1d(0.0, 5.0, 3.0, 8.0);
/// assert_eq!(overlap, 2.0);
/// ```
pub fn overlap_1d(a1: f64, a2: f64, b1: f64, b2: f64) -> f64 {
    (a2.min(b2) - a1.max(b1)).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EPSILON_LENGTH;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < EPSILON_LENGTH
    }

    #[test]
    fn anchor_point_applies_rule_and_offset() {
        let bbox = BoundingBox::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.4, 0.02, 0.01));
        let anchor = anchor_point(&bbox, AnchorRule::RAIL_FRONT, Vec3::zero());
        assert!(close(anchor, Vec3::new(0.0, 0.01, 0.01)));

        let shifted = anchor_point(&bbox, AnchorRule::RAIL_FRONT, Vec3::new(0.1, 0.0, -0.002));
        assert!(close(shifted, Vec3::new(0.1, 0.01, 0.008)));
    }

    #[test]
    fn realignment_is_idempotent() {
        let rail = BoundingBox::new(Vec3::new(-0.2, 0.3, -0.05), Vec3::new(0.2, 0.335, -0.0425));
        let equipment = BoundingBox::centered(Vec3::new(0.018, 0.08, 0.07));

        let target = anchor_point(&rail, AnchorRule::RAIL_FRONT, Vec3::zero());
        let delta = alignment_delta(target, anchor_point(&equipment, AnchorRule::CLIP_BACK, Vec3::zero()));
        let placed = equipment.translated(delta);

        let again = alignment_delta(target, anchor_point(&placed, AnchorRule::CLIP_BACK, Vec3::zero()));
        assert!(again.length() < EPSILON_LENGTH);
        assert!((placed.min.x - rail.min.x).abs() < EPSILON_LENGTH);
        assert!((placed.min.z - rail.max.z).abs() < EPSILON_LENGTH);
    }

    #[test]
    fn overlap_of_touching_and_nested_intervals() {
        assert_eq!(overlap_1d(0.0, 1.0, 2.0, 3.0), 0.0);
        assert_eq!(overlap_1d(0.0, 1.0, 1.0, 3.0), 0.0);
        assert!((overlap_1d(0.0, 0.45, 0.1, 0.118) - 0.018).abs() < EPSILON_LENGTH);
    }
}
