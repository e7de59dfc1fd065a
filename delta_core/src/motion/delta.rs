//! Delta kinematics and move splitting.
//!
//! Three vertical towers at 120° carry carriages joined to the effector by
//! diagonal rods of equal length. For tower `i` at `(tx, ty)` the carriage
//! height for effector `(x, y, z)` is
//!
//! ```text
//! Aᵢ = z + sqrt(rod² − (x − txᵢ)² − (y − tyᵢ)²)
//! ```
//!
//! The map is non-linear, so a straight Cartesian move is cut into short
//! sub-segments, each a straight line in tower space.

use delta_common::consts::{DELTA_TOWERS, MAX_AXES};
use delta_common::printer::config::PrinterConfig;
use delta_common::printer::motion::{CartesianMove, MoveSegment, RejectReason, SegmentFlags};
use heapless::Vec;

/// Cartesian moves shorter than this have no XYZ component.
const MIN_CARTESIAN_LENGTH: f64 = 1e-9;

/// `sin(60°)`
const SIN_60: f64 = 0.866_025_403_784_438_6;

// ─── Transform ──────────────────────────────────────────────────────

/// Tower geometry plus the limits needed to validate a split.
#[derive(Debug, Clone)]
pub struct DeltaTransform {
    rod2: f64,
    towers: [(f64, f64); DELTA_TOWERS],
    axes: [usize; DELTA_TOWERS],
    bounds: [(f64, f64); DELTA_TOWERS],
    distance_factor: Vec<f64, MAX_AXES>,
    segments_per_second: f64,
    min_split_length: f64,
    max_split_length: f64,
    speed_limit_multiply: f64,
}

impl DeltaTransform {
    /// `None` when the table has no `[delta]` section.
    pub fn new(config: &PrinterConfig) -> Option<Self> {
        let delta = config.delta.as_ref()?;
        let axes = config.tower_axes()?;
        let r = delta.tower_radius();
        let bounds = axes.map(|i| (config.axes[i].min, config.axes[i].max));
        let mut distance_factor = Vec::new();
        for a in config.axes.iter().take(MAX_AXES) {
            let _ = distance_factor.push(a.distance_factor);
        }
        Some(Self {
            rod2: delta.diagonal_rod * delta.diagonal_rod,
            towers: [(-SIN_60 * r, -0.5 * r), (SIN_60 * r, -0.5 * r), (0.0, r)],
            axes,
            bounds,
            distance_factor,
            segments_per_second: delta.segments_per_second,
            min_split_length: delta.min_split_length,
            max_split_length: delta.max_split_length,
            speed_limit_multiply: config.planner.speed_limit_multiply,
        })
    }

    /// Axis indices of towers A, B, C.
    pub fn tower_axes(&self) -> [usize; DELTA_TOWERS] {
        self.axes
    }

    /// Effector position → carriage heights. `None` if a rod cannot reach.
    pub fn inverse(&self, p: [f64; 3]) -> Option<[f64; DELTA_TOWERS]> {
        let mut out = [0.0; DELTA_TOWERS];
        for (slot, (tx, ty)) in out.iter_mut().zip(self.towers) {
            let dx = p[0] - tx;
            let dy = p[1] - ty;
            let h2 = self.rod2 - dx * dx - dy * dy;
            if h2 <= 0.0 {
                return None;
            }
            *slot = p[2] + h2.sqrt();
        }
        Some(out)
    }

    /// Carriage heights → effector position, by intersecting the three rod
    /// spheres and keeping the solution below the carriages.
    pub fn forward(&self, a: [f64; DELTA_TOWERS]) -> Option<[f64; 3]> {
        let p = [0, 1, 2].map(|i| [self.towers[i].0, self.towers[i].1, a[i]]);
        let p21 = sub(p[1], p[0]);
        let p31 = sub(p[2], p[0]);
        let d = norm(p21);
        if d == 0.0 {
            return None;
        }
        let ex = scale(p21, 1.0 / d);
        let i = dot(ex, p31);
        let ey_raw = sub(p31, scale(ex, i));
        let ey_len = norm(ey_raw);
        if ey_len == 0.0 {
            return None;
        }
        let ey = scale(ey_raw, 1.0 / ey_len);
        let ez = cross(ex, ey);
        let j = dot(ey, p31);

        // Equal radii simplify the general trilateration terms.
        let x = d / 2.0;
        let y = (i * i + j * j - 2.0 * i * x) / (2.0 * j);
        let z2 = self.rod2 - x * x - y * y;
        if z2 < 0.0 {
            return None;
        }
        let z = z2.sqrt();
        let base = add(p[0], add(scale(ex, x), scale(ey, y)));
        let up = add(base, scale(ez, z));
        let down = sub(base, scale(ez, z));
        Some(if up[2] < down[2] { up } else { down })
    }

    /// Inverse transform plus tower range check.
    fn towers_for(&self, p: [f64; 3]) -> Result<[f64; DELTA_TOWERS], RejectReason> {
        let heights = self.inverse(p).ok_or(RejectReason::Unreachable)?;
        for (k, h) in heights.iter().enumerate() {
            let (min, max) = self.bounds[k];
            if *h < min || *h > max {
                return Err(RejectReason::OutOfBounds {
                    axis: self.axes[k],
                    target: *h,
                    min,
                    max,
                });
            }
        }
        Ok(heights)
    }

    /// Number of sub-segments for a Cartesian move of `length` at
    /// `feedrate`.
    pub fn split_count(&self, length: f64, feedrate: f64) -> u32 {
        let speed = feedrate * self.speed_limit_multiply;
        let by_length = (length / self.max_split_length).ceil();
        let by_time = if speed > 0.0 {
            (length / speed * self.segments_per_second).ceil()
        } else {
            by_length
        };
        let n = by_length.min(by_time).max(1.0);
        let cap = (length / self.min_split_length).floor().max(1.0);
        n.min(cap).min(f64::from(u32::MAX)) as u32
    }

    /// Validate a whole Cartesian move and prepare its split.
    ///
    /// `from` is the current effector position and `passthrough_from` the
    /// planned position of every physical axis.
    pub fn plan(
        &self,
        from: [f64; 3],
        passthrough_from: [f64; MAX_AXES],
        mv: &CartesianMove,
    ) -> Result<DeltaSplit, RejectReason> {
        let delta = sub(mv.target, from);
        let length = norm(delta);
        let count = self.split_count(length, mv.feedrate);
        let start = self.towers_for(from)?;
        for k in 1..=count {
            self.towers_for(lerp3(from, mv.target, f64::from(k) / f64::from(count)))?;
        }
        Ok(DeltaSplit {
            from,
            to: mv.target,
            passthrough_from,
            passthrough_to: mv.passthrough,
            feedrate: mv.feedrate,
            sub_length: length / f64::from(count),
            count,
            next: 1,
            last_towers: start,
        })
    }
}

// ─── Split ──────────────────────────────────────────────────────────

/// A validated Cartesian move being fed to the planner piece by piece.
#[derive(Debug, Clone)]
pub struct DeltaSplit {
    from: [f64; 3],
    to: [f64; 3],
    passthrough_from: [f64; MAX_AXES],
    passthrough_to: [Option<f64>; MAX_AXES],
    feedrate: f64,
    sub_length: f64,
    count: u32,
    next: u32,
    last_towers: [f64; DELTA_TOWERS],
}

impl DeltaSplit {
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn remaining(&self) -> u32 {
        self.count + 1 - self.next
    }

    pub fn is_done(&self) -> bool {
        self.next > self.count
    }

    pub fn target(&self) -> [f64; 3] {
        self.to
    }

    /// The next sub-segment, without consuming it.
    ///
    /// Its feed rate is scaled so the effector moves at the requested
    /// Cartesian speed whatever the tower-space length.
    pub fn peek(&self, transform: &DeltaTransform) -> Option<MoveSegment> {
        if self.is_done() {
            return None;
        }
        let f = f64::from(self.next) / f64::from(self.count);
        let towers = transform.inverse(lerp3(self.from, self.to, f))?;
        let mut seg = MoveSegment::new(self.feedrate).with_flags(SegmentFlags::VIRTUAL);
        let mut path2 = 0.0;
        for (k, axis) in transform.axes.iter().enumerate() {
            seg = seg.with_axis(*axis, towers[k]);
            let df = transform.distance_factor.get(*axis).copied().unwrap_or(1.0);
            path2 += ((towers[k] - self.last_towers[k]) * df).powi(2);
        }
        let f_prev = f64::from(self.next - 1) / f64::from(self.count);
        for (axis, target) in self.passthrough_to.iter().enumerate() {
            let Some(to) = *target else { continue };
            let from = self.passthrough_from[axis];
            let value = from + (to - from) * f;
            let prev = from + (to - from) * f_prev;
            let df = transform.distance_factor.get(axis).copied().unwrap_or(1.0);
            path2 += ((value - prev) * df).powi(2);
            seg = seg.with_axis(axis, value);
        }
        if self.sub_length > 0.0 {
            seg.feedrate = self.feedrate * path2.sqrt() / self.sub_length;
        }
        Some(seg)
    }

    /// Mark the peeked sub-segment as enqueued.
    pub fn advance(&mut self, transform: &DeltaTransform) {
        if self.is_done() {
            return;
        }
        let f = f64::from(self.next) / f64::from(self.count);
        if let Some(towers) = transform.inverse(lerp3(self.from, self.to, f)) {
            self.last_towers = towers;
        }
        self.next += 1;
    }
}

/// `true` when the move has no XYZ component.
pub fn is_passthrough_only(from: [f64; 3], mv: &CartesianMove) -> bool {
    norm(sub(mv.target, from)) < MIN_CARTESIAN_LENGTH
}

// ─── Vector helpers ─────────────────────────────────────────────────

fn add(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn scale(a: [f64; 3], k: f64) -> [f64; 3] {
    [a[0] * k, a[1] * k, a[2] * k]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

fn lerp3(a: [f64; 3], b: [f64; 3], f: f64) -> [f64; 3] {
    add(a, scale(sub(b, a), f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn transform() -> DeltaTransform {
        DeltaTransform::new(&PrinterConfig::builtin().unwrap()).unwrap()
    }

    #[test]
    fn centre_heights_are_equal() {
        let t = transform();
        let a = t.inverse([0.0, 0.0, 50.0]).unwrap();
        assert!((a[0] - a[1]).abs() < 1e-9 && (a[1] - a[2]).abs() < 1e-9);
        // rod 214, radius 105.6 → h = sqrt(214² − 105.6²)
        let h = (214.0f64.powi(2) - 105.6f64.powi(2)).sqrt();
        assert!((a[0] - 50.0 - h).abs() < 1e-9);
    }

    #[test]
    fn forward_picks_effector_below_carriages() {
        let t = transform();
        let p = t.forward([300.0, 300.0, 300.0]).unwrap();
        assert!(p[0].abs() < 1e-9 && p[1].abs() < 1e-9);
        assert!(p[2] < 300.0);
    }

    #[test]
    fn unreachable_point_is_rejected() {
        let t = transform();
        assert!(t.inverse([400.0, 0.0, 0.0]).is_none());
        let mv = CartesianMove::new(400.0, 0.0, 0.0, 3000.0);
        let err = t.plan([0.0, 0.0, 50.0], [0.0; MAX_AXES], &mv).unwrap_err();
        assert_eq!(err, RejectReason::Unreachable);
    }

    #[test]
    fn split_count_respects_length_time_and_minimum() {
        let t = transform();
        // 40 mm at 50 mm/s: 10 by length, 80 by time.
        assert_eq!(t.split_count(40.0, 3000.0), 10);
        // 40 mm at 400 mm/s: 0.1 s → 10 segments at 100/s, 10 by length.
        assert_eq!(t.split_count(40.0, 24_000.0), 10);
        // 40 mm at 2000 mm/s: time cap of 2.
        assert_eq!(t.split_count(40.0, 120_000.0), 2);
        // 0.25 mm: floor(0.25 / 0.1) = 2 ≥ 1.
        assert_eq!(t.split_count(0.25, 3000.0), 1);
        assert_eq!(t.split_count(0.05, 3000.0), 1);
    }

    #[test]
    fn split_walks_to_target_and_scales_feed() {
        let t = transform();
        let from = [0.0, 0.0, 50.0];
        let mv = CartesianMove::new(20.0, 0.0, 50.0, 3000.0).with_axis(3, 2.0);
        let mut split = t.plan(from, [0.0; MAX_AXES], &mv).unwrap();
        assert_eq!(split.count(), 5);
        let mut last = None;
        while let Some(seg) = split.peek(&t) {
            assert!(seg.flags.contains(SegmentFlags::VIRTUAL));
            assert!(seg.feedrate > 0.0);
            split.advance(&t);
            last = Some(seg);
        }
        let last = last.unwrap();
        let expect = t.inverse([20.0, 0.0, 50.0]).unwrap();
        for (k, axis) in t.tower_axes().iter().enumerate() {
            assert!((last.target[*axis].unwrap() - expect[k]).abs() < 1e-9);
        }
        assert!((last.target[3].unwrap() - 2.0).abs() < 1e-12);
        assert_eq!(split.remaining(), 0);
    }

    proptest! {
        #[test]
        fn forward_inverts_inverse(
            r in 0.0f64..80.0,
            theta in 0.0f64..std::f64::consts::TAU,
            z in 0.0f64..120.0,
        ) {
            let t = transform();
            let p = [r * theta.cos(), r * theta.sin(), z];
            let a = t.inverse(p).unwrap();
            let q = t.forward(a).unwrap();
            for k in 0..3 {
                prop_assert!((p[k] - q[k]).abs() < 1e-6, "p={p:?} q={q:?}");
            }
        }
    }
}
