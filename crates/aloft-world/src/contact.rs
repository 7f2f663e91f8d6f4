//! Viewpoint-versus-terrain contact classification.
use aloft_geom::DVec3;

use crate::field::TerrainField;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactParams {
    /// Clearance below which a pass counts as grazing.
    pub graze_clearance: f64,
    /// Ground contact faster than this is a crash.
    pub crash_speed: f32,
    /// Water contact faster than this is a ditching.
    pub ditch_speed: f32,
    /// Height above ground a soft landing settles at.
    pub rest_offset: f64,
}

impl Default for ContactParams {
    fn default() -> Self {
        Self {
            graze_clearance: 5.0,
            crash_speed: 0.3,
            ditch_speed: 0.1,
            rest_offset: 0.5,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Contact {
    Airborne { clearance: f64 },
    Grazing { clearance: f64 },
    /// Slow contact; the viewpoint should be placed at `rest_y`.
    Touchdown { rest_y: f64 },
    Crash,
    Ditched,
}

impl Contact {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Contact::Crash | Contact::Ditched)
    }
}

pub fn probe(field: &TerrainField, pos: DVec3, speed: f32) -> Contact {
    probe_with(field, pos, speed, &ContactParams::default())
}

pub fn probe_with(field: &TerrainField, pos: DVec3, speed: f32, params: &ContactParams) -> Contact {
    let ground = f64::from(field.height(pos.x, pos.z));
    let water = f64::from(field.water_level());
    let ground_clearance = pos.y - ground;
    let water_clearance = pos.y - water;
    let submerged = ground < water;

    if submerged && water_clearance <= 0.0 {
        if speed > params.ditch_speed {
            return Contact::Ditched;
        }
        if ground_clearance > 0.0 {
            return Contact::Touchdown { rest_y: water };
        }
    }
    if ground_clearance <= 0.0 {
        if speed > params.crash_speed {
            return Contact::Crash;
        }
        return Contact::Touchdown {
            rest_y: ground + params.rest_offset,
        };
    }

    let clearance = if submerged {
        ground_clearance.min(water_clearance)
    } else {
        ground_clearance
    };
    let grazing_ground = ground_clearance < params.graze_clearance;
    let grazing_water = submerged && water_clearance > 0.0 && water_clearance < params.graze_clearance;
    if grazing_ground || grazing_water {
        Contact::Grazing { clearance }
    } else {
        Contact::Airborne { clearance }
    }
}

/// A projectile is spent once it reaches the ground under it.
#[inline]
pub fn projectile_hits_ground(field: &TerrainField, pos: DVec3) -> bool {
    pos.y <= f64::from(field.height(pos.x, pos.z))
}
