use std::fmt;

use serde::{Deserialize, Serialize};

/// Axial offsets of the six neighbors, in enumeration order.
pub const HEX_DIRECTIONS: [(i32, i32); 6] = [(1, 0), (-1, 0), (0, 1), (0, -1), (1, -1), (-1, 1)];

pub(crate) const SQRT_3: f64 = 1.732_050_807_568_877_2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HexCoord {
    pub q: i32,
    pub r: i32,
}

impl HexCoord {
    pub const ORIGIN: HexCoord = HexCoord { q: 0, r: 0 };

    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    pub fn distance(self, other: HexCoord) -> i32 {
        hex_distance(self.q, self.r, other.q, other.r)
    }

    pub fn within(self, other: HexCoord, radius: i32) -> bool {
        self.distance(other) <= radius
    }

    pub fn neighbors(self) -> [HexCoord; 6] {
        HEX_DIRECTIONS.map(|dir| self.offset(dir, 1))
    }

    pub fn offset(self, (dq, dr): (i32, i32), steps: i32) -> HexCoord {
        HexCoord {
            q: self.q + dq * steps,
            r: self.r + dr * steps,
        }
    }

    /// Projects a polar offset (radians, hex units) from `self` onto the grid.
    /// This is the flat-top pixel conversion with hex size `1/sqrt(3)`, so a
    /// distance of one is one neighbor step.
    ///
    /// Angle zero points between the (+1,0) and (+1,-1) neighbors; the (+1,0)
    /// neighbor sits at 30 degrees.
    pub fn toward_angle(self, angle: f64, distance: f64) -> HexCoord {
        let x = distance * angle.cos();
        let y = distance * angle.sin();
        let q = 2.0 / 3.0 * SQRT_3 * x;
        let r = -x / SQRT_3 + y;
        let rounded = cube_round(q, r);
        HexCoord {
            q: self.q + rounded.q,
            r: self.r + rounded.r,
        }
    }
}

impl fmt::Display for HexCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

impl From<(i32, i32)> for HexCoord {
    fn from((q, r): (i32, i32)) -> Self {
        Self { q, r }
    }
}

pub fn hex_distance(q1: i32, r1: i32, q2: i32, r2: i32) -> i32 {
    ((q1 - q2).abs() + (q1 + r1 - q2 - r2).abs() + (r1 - r2).abs()) / 2
}

fn cube_round(q: f64, r: f64) -> HexCoord {
    let s = -q - r;
    let mut rq = q.round();
    let mut rr = r.round();
    let rs = s.round();

    let dq = (rq - q).abs();
    let dr = (rr - r).abs();
    let ds = (rs - s).abs();

    if dq > dr && dq > ds {
        rq = -rr - rs;
    } else if dr > ds {
        rr = -rq - rs;
    }
    HexCoord {
        q: rq as i32,
        r: rr as i32,
    }
}
