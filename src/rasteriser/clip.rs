//! Clipping against the six planes of the homogeneous view volume, -w <= x, y, z <= w.

use nalgebra as na;
use na::{Vector2, Vector4};

use crate::colour::Colour;
use crate::util::{lerp_vector2, lerp_vector4};

pub const INSIDE: u8 = 0;
pub const LEFT: u8 = 1;
pub const RIGHT: u8 = 2;
pub const BOTTOM: u8 = 4;
pub const TOP: u8 = 8;
pub const FAR: u8 = 16;
pub const NEAR: u8 = 32;

/// Every plane bit, in the order planes are clipped against.
pub const PLANES: [u8; 6] = [LEFT, RIGHT, BOTTOM, TOP, FAR, NEAR];

/// Clip space vertex with the attributes that get interpolated along with it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipVertex {
    pub position: Vector4<f32>,
    pub colour: Colour,
    pub tex_coord: Vector2<f32>,
}

impl ClipVertex {
    pub fn lerp(a: &ClipVertex, b: &ClipVertex, t: f32) -> ClipVertex {
        return ClipVertex {
            position: lerp_vector4(a.position, b.position, t),
            colour: Colour::lerp(a.colour, b.colour, t),
            tex_coord: lerp_vector2(a.tex_coord, b.tex_coord, t),
        };
    }
}

/// Bitmask of the planes `v` lies outside of.
pub fn homogeneous_outcode(v: &Vector4<f32>) -> u8 {
    let mut outcode = INSIDE;

    if v.x < -v.w {
        outcode |= LEFT;
    } else if v.x > v.w {
        outcode |= RIGHT;
    }

    if v.y < -v.w {
        outcode |= BOTTOM;
    } else if v.y > v.w {
        outcode |= TOP;
    }

    if v.z < -v.w {
        outcode |= NEAR;
    } else if v.z > v.w {
        outcode |= FAR;
    }

    return outcode;
}

/// Fraction of the way from `a` to `b` at which the edge crosses `plane`, at most 1.
pub fn clip_edge(a: &Vector4<f32>, b: &Vector4<f32>, plane: u8) -> f32 {
    // Solves a.c + t * (b.c - a.c) = +-(a.w + t * (b.w - a.w)) for the plane's coordinate c.
    let dw = b.w - a.w;
    let ratio = match plane {
        LEFT => (-a.w - a.x) / ((b.x - a.x) + dw),
        RIGHT => (a.w - a.x) / ((b.x - a.x) - dw),
        BOTTOM => (-a.w - a.y) / ((b.y - a.y) + dw),
        TOP => (a.w - a.y) / ((b.y - a.y) - dw),
        NEAR => (-a.w - a.z) / ((b.z - a.z) + dw),
        FAR => (a.w - a.z) / ((b.z - a.z) - dw),
        _ => 0.0,
    };
    return ratio.min(1.0);
}

/// Cohen-Sutherland line clip. Moves whichever endpoint lies outside a plane onto it.
/// Returns false if the segment lies entirely outside the view volume.
pub fn cohen_sutherland_line(a: &mut ClipVertex, b: &mut ClipVertex) -> bool {
    for plane in PLANES {
        let outside_a = homogeneous_outcode(&a.position) & plane != 0;
        let outside_b = homogeneous_outcode(&b.position) & plane != 0;

        if outside_a && outside_b {
            return false;
        }
        if !outside_a && !outside_b {
            continue;
        }

        let ratio = clip_edge(&a.position, &b.position, plane);
        let clipped = ClipVertex::lerp(a, b, ratio);
        if outside_a {
            *a = clipped;
        } else {
            *b = clipped;
        }
    }

    return true;
}

/// Sutherland-Hodgman clip of a triangle. Returns the clipped convex polygon in winding
/// order, empty if nothing of the triangle is inside the view volume.
pub fn sutherland_hodgman_tri(v0: ClipVertex, v1: ClipVertex, v2: ClipVertex) -> Vec<ClipVertex> {
    let mut polygon = vec![v0, v1, v2];

    for plane in PLANES {
        if polygon.is_empty() {
            break;
        }
        let input = std::mem::take(&mut polygon);
        let mut previous = input[input.len() - 1];
        for current in input {
            let previous_inside = homogeneous_outcode(&previous.position) & plane == 0;
            let current_inside = homogeneous_outcode(&current.position) & plane == 0;

            if current_inside {
                if !previous_inside {
                    let ratio = clip_edge(&previous.position, &current.position, plane);
                    polygon.push(ClipVertex::lerp(&previous, &current, ratio));
                }
                polygon.push(current);
            } else if previous_inside {
                let ratio = clip_edge(&previous.position, &current.position, plane);
                polygon.push(ClipVertex::lerp(&previous, &current, ratio));
            }
            previous = current;
        }
    }

    return polygon;
}
