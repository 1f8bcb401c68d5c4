// =============================================================================
// MOVEMENT.RS — Multi-probe movement resolution
//
// A moving box is resolved one axis at a time.  Along each axis it samples
// probe points on its leading edge, asks every obstacle how far that edge may
// go over the whole move, and keeps the tightest answer.
// =============================================================================

use glam::DVec2;

use crate::collision::{CollisionMap, MapError};
use crate::geometry::{Aabb, Axis, Direction};

/// Probe points are kept this far inside the mover's perpendicular span so a
/// box flush against a row or column boundary does not sample the cell beyond.
pub const PROBE_INSET: f64 = 0.5;

// ── Obstacle ─────────────────────────────────────────────────────────────────

/// Anything a moving box can collide with.
pub trait Obstacle {
    /// Size along `axis` of the smallest feature this obstacle can present.
    /// Probe density across the mover's edge is derived from it.
    fn probe_extent(&self, axis: Axis) -> f64;

    /// World-space span covered along `axis`.  Probes outside it are skipped.
    fn span(&self, axis: Axis) -> (f64, f64);

    /// The farthest coordinate a leading edge travelling `travel` units in
    /// `dir` may reach, given the point just ahead of it.  `None` means no
    /// limit.
    fn collision_edge(&self, dir: Direction, x: f64, y: f64, travel: f64) -> Result<Option<f64>, MapError>;
}

impl Obstacle for CollisionMap {
    fn probe_extent(&self, axis: Axis) -> f64 {
        self.quadrant_extent(axis)
    }

    fn span(&self, axis: Axis) -> (f64, f64) {
        self.bounds().span(axis)
    }

    fn collision_edge(&self, dir: Direction, x: f64, y: f64, travel: f64) -> Result<Option<f64>, MapError> {
        self.swept_edge(dir, x, y, travel)
    }
}

/// Another character's box, treated as one fully blocking tile.
impl Obstacle for Aabb {
    fn probe_extent(&self, axis: Axis) -> f64 {
        self.extent(axis)
    }

    fn span(&self, axis: Axis) -> (f64, f64) {
        Aabb::span(self, axis)
    }

    // Any box ahead of the probe limits the edge, so `travel` is not needed.
    fn collision_edge(&self, dir: Direction, x: f64, y: f64, _travel: f64) -> Result<Option<f64>, MapError> {
        if !(x.is_finite() && y.is_finite()) {
            return Err(MapError::NonFinite(x, y));
        }
        let axis = dir.axis();
        let (along, across) = match axis {
            Axis::X => (x, y),
            Axis::Y => (y, x),
        };
        let (plo, phi) = self.span(axis.perpendicular());
        if across < plo || across >= phi {
            return Ok(None);
        }
        let (lo, hi) = self.span(axis);
        let limit = if dir.is_positive() {
            (along < hi).then_some(lo)
        } else {
            (along >= lo).then_some(hi)
        };
        Ok(limit)
    }
}

// ── Resolution ───────────────────────────────────────────────────────────────

/// Evenly spaced probe coordinates across `[lo, hi]`, pulled in by
/// [`PROBE_INSET`].  `granularity` is the obstacle's feature size; finer
/// obstacles get more probes.
pub fn probe_points(lo: f64, hi: f64, granularity: f64) -> Vec<f64> {
    let extent = hi - lo;
    if extent <= PROBE_INSET * 2.0 {
        return vec![(lo + hi) / 2.0];
    }
    // NOTE: an obstacle much larger than the mover gets only the two end
    // probes; that is enough for solid boxes and tiles alike.
    let k = if granularity > 0.0 { (extent / granularity).floor() as usize + 1 } else { 1 };
    (0..=k)
        .map(|i| (lo + extent * i as f64 / k as f64).clamp(lo + PROBE_INSET, hi - PROBE_INSET))
        .collect()
}

fn resolve_axis(
    mover: &Aabb,
    axis: Axis,
    delta: f64,
    unit: f64,
    obstacles: &[&dyn Obstacle],
) -> Result<f64, MapError> {
    let center = mover.center(axis);
    let Some(dir) = Direction::from_delta(axis, delta) else {
        return Ok(center);
    };
    let half = mover.extent(axis) / 2.0;
    let edge = mover.leading_edge(dir);
    let probe_along = edge + unit;
    let (plo, phi) = mover.span(axis.perpendicular());

    let mut limit: Option<f64> = None;
    for obstacle in obstacles {
        // Only the part of the edge facing the obstacle is probed.
        let (olo, ohi) = obstacle.span(axis.perpendicular());
        let (lo, hi) = (plo.max(olo), phi.min(ohi));
        if lo >= hi {
            continue;
        }
        for across in probe_points(lo, hi, obstacle.probe_extent(axis.perpendicular())) {
            let (px, py) = match axis {
                Axis::X => (probe_along, across),
                Axis::Y => (across, probe_along),
            };
            if let Some(found) = obstacle.collision_edge(dir, px, py, delta.abs())? {
                limit = Some(match limit {
                    None => found,
                    Some(cur) if dir.is_positive() => cur.min(found),
                    Some(cur) => cur.max(found),
                });
            }
        }
    }

    // A limit can only shorten the move, never reverse or extend it.
    let wanted = edge + delta;
    let reached = match limit {
        None => wanted,
        Some(l) if dir.is_positive() => l.min(wanted).max(edge),
        Some(l) => l.max(wanted).min(edge),
    };
    Ok(reached - dir.sign() * half)
}

/// Resolve `mover` travelling by (`dx`, `dy`) against `obstacles`.
///
/// Axes are resolved independently from the starting box.  Returns the new
/// center.
pub fn resolve_move(
    mover: &Aabb,
    dx: f64,
    dy: f64,
    obstacles: &[&dyn Obstacle],
) -> Result<(f64, f64), MapError> {
    let unit = DVec2::new(dx, dy).normalize_or_zero();
    let x = resolve_axis(mover, Axis::X, dx, unit.x, obstacles)?;
    let y = resolve_axis(mover, Axis::Y, dy, unit.y, obstacles)?;
    Ok((x, y))
}

/// Round a resolved coordinate to an integer, toward where the move started,
/// so a box clamped to a fractional edge never ends up overlapping it.
pub fn snap_toward(start: i64, resolved: f64) -> i64 {
    if resolved >= start as f64 {
        resolved.floor() as i64
    } else {
        resolved.ceil() as i64
    }
}
