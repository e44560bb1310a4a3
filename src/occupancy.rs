//! Belegungsverwaltung für Montageflächen.
//!
//! Eine Schiene (oder Rackspalte) ist eine 1-D-Fläche: Geräte belegen darauf
//! Intervalle `[start, end)`. Eine Montageplatte ist 2-D und verwaltet Rechtecke.
//! Intervalle bleiben stets nach Startoffset sortiert.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::geometry::overlap_1d;
use crate::types::EPSILON_LENGTH;

/// Keine Lücke auf der Fläche ist groß genug.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
#[error("no free slot of {required:.4} m (largest gap {largest_gap:.4} m)")]
pub struct NoSpace {
    pub required: f64,
    pub largest_gap: f64,
}

/// Eine Reservierung auf einer Fläche.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OccupiedInterval {
    pub start: f64,
    pub end: f64,
    pub owner: String,
}

impl OccupiedInterval {
    pub fn width(&self) -> f64 {
        self.end - self.start
    }

    fn overlaps(&self, start: f64, end: f64) -> bool {
        start < self.end - EPSILON_LENGTH && self.start < end - EPSILON_LENGTH
    }
}

/// Füllstatistik einer Fläche.
///
/// Bei Montageplatten enthalten die Breitenfelder Flächen in Quadratmetern.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OccupancyStats {
    pub surface_width: f64,
    pub occupied_width: f64,
    pub free_width: f64,
    pub fill_percent: f64,
    pub item_count: usize,
    pub items: Vec<OccupiedInterval>,
}

/// Intervall-Allokator für eine lineare Fläche.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceOccupancy {
    length: f64,
    intervals: Vec<OccupiedInterval>,
}

impl SurfaceOccupancy {
    pub fn new(length: f64) -> Self {
        Self {
            length: length.max(0.0),
            intervals: Vec::new(),
        }
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn intervals(&self) -> &[OccupiedInterval] {
        &self.intervals
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// First-Fit-Suche.
    ///
    /// Durchläuft die Lücken ab `start_from` der Reihe nach und liefert den
    /// kleinsten Offset, dessen Lücke (inklusive Rest nach dem letzten
    /// Intervall) mindestens `width` lang ist.
    pub fn find_free_slot(&self, width: f64, start_from: f64) -> Result<f64, NoSpace> {
        self.find_free_slot_excluding(width, start_from, None)
    }

    /// First-Fit-Suche, die die Reservierungen von `excluding` ignoriert.
    pub fn find_free_slot_excluding(
        &self,
        width: f64,
        start_from: f64,
        excluding: Option<&str>,
    ) -> Result<f64, NoSpace> {
        let no_space = || NoSpace {
            required: width,
            largest_gap: self.largest_gap(excluding),
        };
        if width > self.length + EPSILON_LENGTH {
            return Err(no_space());
        }

        let mut cursor = start_from.clamp(0.0, self.length);
        for interval in self.live(excluding) {
            if interval.end <= cursor + EPSILON_LENGTH {
                continue;
            }
            if interval.start - cursor >= width - EPSILON_LENGTH {
                return Ok(cursor);
            }
            cursor = cursor.max(interval.end);
        }

        if self.length - cursor >= width - EPSILON_LENGTH {
            Ok(cursor)
        } else {
            Err(no_space())
        }
    }

    /// Erster freier Platz, dessen Start ein Vielfaches von `step` ist.
    pub fn find_aligned_slot(
        &self,
        width: f64,
        step: f64,
        excluding: Option<&str>,
    ) -> Result<f64, NoSpace> {
        if step > 0.0 {
            let mut start = 0.0;
            let mut index = 0u32;
            while start + width <= self.length + EPSILON_LENGTH {
                if self.is_free(start, start + width, excluding) {
                    return Ok(start);
                }
                index += 1;
                start = index as f64 * step;
            }
        }
        Err(NoSpace {
            required: width,
            largest_gap: self.largest_gap(excluding),
        })
    }

    /// Prüft, ob `[start, end)` auf der Fläche liegt und keine Reservierung
    /// außer denen von `excluding` überlappt.
    pub fn is_free(&self, start: f64, end: f64, excluding: Option<&str>) -> bool {
        if start < -EPSILON_LENGTH || end > self.length + EPSILON_LENGTH || end < start {
            return false;
        }
        !self.live(excluding).any(|iv| iv.overlaps(start, end))
    }

    /// Fügt eine Reservierung ein. Aufrufer prüfen den Platz vorher mit
    /// [`find_free_slot`](Self::find_free_slot) oder [`is_free`](Self::is_free).
    pub fn reserve(&mut self, start: f64, end: f64, owner: impl Into<String>) {
        debug_assert!(
            self.is_free(start, end, None),
            "reservation [{start}, {end}) overlaps an existing interval"
        );
        let index = self.intervals.partition_point(|iv| iv.start <= start);
        self.intervals.insert(
            index,
            OccupiedInterval {
                start,
                end,
                owner: owner.into(),
            },
        );
    }

    /// Entfernt alle Reservierungen von `owner`. `false`, wenn es keine gab.
    pub fn release(&mut self, owner: &str) -> bool {
        let before = self.intervals.len();
        self.intervals.retain(|iv| iv.owner != owner);
        let released = self.intervals.len() != before;
        if !released {
            tracing::warn!(owner, "release: no interval owned by this id");
        }
        released
    }

    pub fn occupancy(&self) -> OccupancyStats {
        let occupied: f64 = self.intervals.iter().map(OccupiedInterval::width).sum();
        OccupancyStats {
            surface_width: self.length,
            occupied_width: occupied,
            free_width: (self.length - occupied).max(0.0),
            fill_percent: if self.length > 0.0 {
                occupied / self.length * 100.0
            } else {
                0.0
            },
            item_count: self.intervals.len(),
            items: self.intervals.clone(),
        }
    }

    /// Größte Lücke, ohne die Reservierungen von `excluding`.
    pub fn largest_gap(&self, excluding: Option<&str>) -> f64 {
        let mut cursor = 0.0_f64;
        let mut largest = 0.0_f64;
        for interval in self.live(excluding) {
            largest = largest.max(interval.start - cursor);
            cursor = cursor.max(interval.end);
        }
        largest.max(self.length - cursor)
    }

    fn live<'a>(&'a self, excluding: Option<&'a str>) -> impl Iterator<Item = &'a OccupiedInterval> {
        self.intervals
            .iter()
            .filter(move |iv| Some(iv.owner.as_str()) != excluding)
    }
}

/// Reihenfolge, in der Flächen bei automatischer Platzierung versucht werden:
/// zuerst die bevorzugte, dann alle anderen ab Index 0.
pub fn search_order(preferred: usize, surface_count: usize) -> Vec<usize> {
    let mut order = Vec::with_capacity(surface_count);
    if preferred < surface_count {
        order.push(preferred);
    }
    order.extend((0..surface_count).filter(|&i| i != preferred));
    order
}

/// Auf einer Platte reserviertes Rechteck, in Plattenkoordinaten.
#[derive(Clone, Debug, PartialEq)]
pub struct OccupiedRect {
    pub x: (f64, f64),
    pub y: (f64, f64),
    pub owner: String,
}

impl OccupiedRect {
    fn overlaps(&self, x: (f64, f64), y: (f64, f64)) -> bool {
        overlap_1d(self.x.0, self.x.1, x.0, x.1) > EPSILON_LENGTH
            && overlap_1d(self.y.0, self.y.1, y.0, y.1) > EPSILON_LENGTH
    }

    fn area(&self) -> f64 {
        (self.x.1 - self.x.0) * (self.y.1 - self.y.0)
    }
}

/// Rechteck-Allokator für eine Montageplatte.
#[derive(Clone, Debug, PartialEq)]
pub struct PlateOccupancy {
    width: f64,
    height: f64,
    rects: Vec<OccupiedRect>,
}

impl PlateOccupancy {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
            rects: Vec::new(),
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn is_free(&self, x: (f64, f64), y: (f64, f64), excluding: Option<&str>) -> bool {
        let inside = x.0 >= -EPSILON_LENGTH
            && y.0 >= -EPSILON_LENGTH
            && x.1 <= self.width + EPSILON_LENGTH
            && y.1 <= self.height + EPSILON_LENGTH;
        inside
            && !self
                .rects
                .iter()
                .filter(|r| Some(r.owner.as_str()) != excluding)
                .any(|r| r.overlaps(x, y))
    }

    /// Belegte Abschnitte der Zeile `y.0 .. y.1`, projiziert auf x. `None`,
    /// wenn die Zeile die Platte verlässt.
    fn row(&self, y: (f64, f64), excluding: Option<&str>) -> Option<SurfaceOccupancy> {
        if y.0 < -EPSILON_LENGTH || y.1 > self.height + EPSILON_LENGTH {
            return None;
        }
        let mut row = SurfaceOccupancy::new(self.width);
        let mut blocking: Vec<&OccupiedRect> = self
            .rects
            .iter()
            .filter(|r| Some(r.owner.as_str()) != excluding)
            .filter(|r| overlap_1d(r.y.0, r.y.1, y.0, y.1) > EPSILON_LENGTH)
            .collect();
        blocking.sort_by(|a, b| a.x.0.total_cmp(&b.x.0));

        // Projektionen verschiedener Rechtecke können sich überlappen, daher vorher zusammenführen
        let mut merged: Vec<(f64, f64)> = Vec::new();
        for rect in blocking {
            match merged.last_mut() {
                Some(last) if rect.x.0 <= last.1 => last.1 = last.1.max(rect.x.1),
                _ => merged.push(rect.x),
            }
        }
        for (i, (start, end)) in merged.into_iter().enumerate() {
            row.reserve(start, end, format!("row-{i}"));
        }
        Some(row)
    }

    /// Erstes freies x in der Zeile `y.0 .. y.1`, Suche ab der linken Kante.
    pub fn find_free_in_row(
        &self,
        width: f64,
        y: (f64, f64),
        excluding: Option<&str>,
    ) -> Result<f64, NoSpace> {
        match self.row(y, excluding) {
            Some(row) => row.find_free_slot(width, 0.0),
            None => Err(NoSpace {
                required: width,
                largest_gap: 0.0,
            }),
        }
    }

    /// Breitester freier Abschnitt der Zeile `y.0 .. y.1`.
    pub fn largest_gap_in_row(&self, y: (f64, f64), excluding: Option<&str>) -> f64 {
        self.row(y, excluding).map_or(0.0, |row| row.largest_gap(None))
    }

    pub fn reserve(&mut self, x: (f64, f64), y: (f64, f64), owner: impl Into<String>) {
        debug_assert!(self.is_free(x, y, None), "plate reservation overlaps");
        self.rects.push(OccupiedRect {
            x,
            y,
            owner: owner.into(),
        });
    }

    pub fn release(&mut self, owner: &str) -> bool {
        let before = self.rects.len();
        self.rects.retain(|r| r.owner != owner);
        let released = self.rects.len() != before;
        if !released {
            tracing::warn!(owner, "plate release: no rectangle owned by this id");
        }
        released
    }

    pub fn occupancy(&self) -> OccupancyStats {
        let area = self.width * self.height;
        let occupied: f64 = self.rects.iter().map(OccupiedRect::area).sum();
        let mut items: Vec<OccupiedInterval> = self
            .rects
            .iter()
            .map(|r| OccupiedInterval {
                start: r.x.0,
                end: r.x.1,
                owner: r.owner.clone(),
            })
            .collect();
        items.sort_by(|a, b| a.start.total_cmp(&b.start));
        OccupancyStats {
            surface_width: area,
            occupied_width: occupied,
            free_width: (area - occupied).max(0.0),
            fill_percent: if area > 0.0 { occupied / area * 100.0 } else { 0.0 },
            item_count: self.rects.len(),
            items,
        }
    }
}
