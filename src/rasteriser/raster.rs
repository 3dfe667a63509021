use nalgebra as na;
use na::{vector, Vector2, Vector3, Vector4};

use crate::colour::Colour;
use crate::mesh::PrimitiveType;
use crate::render_object::RenderObject;
use crate::texture::Texture;
use crate::util::divide_by_w;

use super::clip::{
    cohen_sutherland_line, homogeneous_outcode, sutherland_hodgman_tri, ClipVertex, INSIDE,
};
use super::state::SampleMode;
use super::SoftwareRasteriser;

/// Triangles covering less screen area than this are not drawn.
const MIN_TRIANGLE_AREA: f64 = 1.0;
/// Slack in the inside test, in screen area units.
const INSIDE_EPSILON: f64 = 0.01;

/// Vertex after projection and viewport mapping.
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    // x, y in pixels, z in depth units, w is the clip space w.
    position: Vector4<f32>,
    colour: Colour,
    // (u / w, v / w, 1 / w) so it can be interpolated linearly in screen space.
    tex: Vector3<f32>,
}

/// Inclusive pixel range covered by a triangle, clamped to the frame.
#[derive(Debug)]
struct BoundingBox {
    min_x: i32,
    min_y: i32,
    max_x: i32,
    max_y: i32,
}

fn signed_area(v0: &Vector4<f32>, v1: &Vector4<f32>, v2: &Vector4<f32>) -> f64 {
    let (x0, y0) = (v0.x as f64, v0.y as f64);
    let (x1, y1) = (v1.x as f64, v1.y as f64);
    let (x2, y2) = (v2.x as f64, v2.y as f64);
    return 0.5 * ((x0 * y1 + x1 * y2 + x2 * y0) - (x1 * y0 + x2 * y1 + x0 * y2));
}

/// Signed screen space area of a triangle, positive for counter-clockwise winding
/// with y pointing up. Only x and y are used.
pub fn screen_area_of_tri(v0: &Vector4<f32>, v1: &Vector4<f32>, v2: &Vector4<f32>) -> f32 {
    return signed_area(v0, v1, v2) as f32;
}

/// Barycentric weights (alpha, beta, gamma) of `p` for the vertices v0, v1, v2.
/// alpha comes from the sub-triangle v1 v2 p, beta from v2 v0 p and gamma from v0 v1 p,
/// so each weight belongs to the vertex opposite its sub-triangle. Weights are signed, so
/// they still sum to 1 for points outside the triangle.
/// `None` for a triangle with no area.
pub fn calculate_weights(
    v0: &Vector4<f32>,
    v1: &Vector4<f32>,
    v2: &Vector4<f32>,
    p: &Vector4<f32>,
) -> Option<Vector3<f32>> {
    let area = signed_area(v0, v1, v2);
    if area == 0.0 || !area.is_finite() {
        return None;
    }
    return Some(vector![
        (signed_area(p, v1, v2) / area) as f32,
        (signed_area(v0, p, v2) / area) as f32,
        (signed_area(v0, v1, p) / area) as f32
    ]);
}

/// Liang-Barsky clip of a screen space segment to the frame, widened by one pixel on every
/// side. Segments already inside are returned untouched, `None` if nothing is left.
fn fit_line_to_frame(
    v0: &ScreenVertex,
    v1: &ScreenVertex,
    width: u32,
    height: u32,
) -> Option<(ScreenVertex, ScreenVertex)> {
    let (x0, y0) = (v0.position.x as f64, v0.position.y as f64);
    let dx = v1.position.x as f64 - x0;
    let dy = v1.position.y as f64 - y0;
    let (min_x, max_x) = (-1.0, width as f64);
    let (min_y, max_y) = (-1.0, height as f64);

    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;
    for (p, q) in [(-dx, x0 - min_x), (dx, max_x - x0), (-dy, y0 - min_y), (dy, max_y - y0)] {
        if !(p.is_finite() && q.is_finite()) {
            return None;
        }
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }

    if t0 == 0.0 && t1 == 1.0 {
        return Some((*v0, *v1));
    }
    // In f64, endpoints may be far enough apart to overflow f32 differences.
    let lerp = |a: f32, b: f32, t: f64| (a as f64 + (b as f64 - a as f64) * t) as f32;
    let at = |t: f64| ScreenVertex {
        position: vector![
            lerp(v0.position.x, v1.position.x, t),
            lerp(v0.position.y, v1.position.y, t),
            lerp(v0.position.z, v1.position.z, t),
            lerp(v0.position.w, v1.position.w, t)
        ],
        colour: Colour::lerp(v0.colour, v1.colour, t as f32),
        tex: v0.tex + (v1.tex - v0.tex) * t as f32,
    };
    return Some((at(t0), at(t1)));
}

/// Perspective correct texture coordinate from interpolated (u / w, v / w, 1 / w).
fn perspective_uv(
    s0: &ScreenVertex,
    s1: &ScreenVertex,
    s2: &ScreenVertex,
    weights: Vector3<f32>,
) -> Vector2<f32> {
    let tex = s0.tex * weights.x + s1.tex * weights.y + s2.tex * weights.z;
    return vector![tex.x / tex.z, tex.y / tex.z];
}

impl SoftwareRasteriser {
    /// Draws every primitive of the object into the buffer being drawn into, using the
    /// current matrices and raster state. Vertices left over after the last whole primitive
    /// are ignored.
    pub fn draw_object(&mut self, object: &RenderObject) {
        let mesh = object.mesh();
        let mvp = self.view_proj_matrix * object.model_matrix();
        let vertices: Vec<ClipVertex> = mesh
            .positions()
            .iter()
            .enumerate()
            .map(|(i, position)| ClipVertex {
                position: mvp * position,
                colour: mesh.colour_at(i),
                tex_coord: mesh.tex_coord_at(i),
            })
            .collect();
        let texture = object.texture();
        let n = vertices.len();

        match mesh.primitive() {
            PrimitiveType::Points => self.rasterise_points(&vertices),
            PrimitiveType::Lines => {
                for pair in vertices.chunks_exact(2) {
                    self.rasterise_clipped_line(pair[0], pair[1]);
                }
            }
            PrimitiveType::Triangles => {
                for tri in vertices.chunks_exact(3) {
                    self.rasterise_clipped_tri(tri[0], tri[1], tri[2], texture);
                }
            }
            PrimitiveType::TriangleStrip => {
                for i in 0..n.saturating_sub(2) {
                    let (v0, v1, v2) = (vertices[i], vertices[i + 1], vertices[i + 2]);
                    self.rasterise_clipped_tri(v0, v1, v2, texture);
                }
            }
            PrimitiveType::TriangleFan => {
                for i in 1..n.saturating_sub(1) {
                    self.rasterise_clipped_tri(vertices[0], vertices[i], vertices[i + 1], texture);
                }
            }
        }
    }

    /// Perspective division and viewport mapping. `None` when the result isn't finite.
    fn project(&self, v: &ClipVertex) -> Option<ScreenVertex> {
        let w = v.position.w;
        let ndc = divide_by_w(v.position);
        let screen = self.viewport_matrix * vector![ndc.x, ndc.y, ndc.z, 1.0];
        let tex = vector![v.tex_coord.x, v.tex_coord.y, 1.0] / w;
        let finite = screen.x.is_finite() && screen.y.is_finite() && screen.z.is_finite();
        if !(finite && tex.z.is_finite()) {
            return None;
        }
        return Some(ScreenVertex {
            position: vector![screen.x, screen.y, screen.z, w],
            colour: v.colour,
            tex,
        });
    }

    /// Points are written without a depth test.
    fn rasterise_points(&mut self, vertices: &[ClipVertex]) {
        for v in vertices {
            if let Some(s) = self.project(v) {
                let x = s.position.x.round() as i32;
                let y = s.position.y.round() as i32;
                self.buffers.blend_pixel(x, y, s.colour, self.state.blend_mode);
            }
        }
    }

    fn rasterise_clipped_line(&mut self, mut a: ClipVertex, mut b: ClipVertex) {
        if self.state.clip_lines && !cohen_sutherland_line(&mut a, &mut b) {
            return;
        }
        if let (Some(s0), Some(s1)) = (self.project(&a), self.project(&b)) {
            self.rasterise_line(&s0, &s1);
        }
    }

    /// Steps one pixel at a time along the major axis, moving along the minor axis whenever
    /// the accumulated error reaches half a pixel. Colour and depth are interpolated linearly.
    fn rasterise_line(&mut self, v0: &ScreenVertex, v1: &ScreenVertex) {
        // Unclipped lines can reach arbitrarily far off screen, step only the visible part.
        let (v0, v1) = match fit_line_to_frame(v0, v1, self.buffers.width, self.buffers.height) {
            Some(fitted) => fitted,
            None => return,
        };
        let (v0, v1) = (&v0, &v1);
        let dir = v1.position - v0.position;
        let x_dir = if dir.x < 0.0 { -1 } else { 1 };
        let y_dir = if dir.y < 0.0 { -1 } else { 1 };
        let mut x = v0.position.x.round() as i32;
        let mut y = v0.position.y.round() as i32;

        let x_major = dir.x.abs() >= dir.y.abs();
        let (major, minor) = match x_major {
            true => (dir.x, dir.y),
            false => (dir.y, dir.x),
        };
        let range = major.abs().round() as i32;
        let abs_slope = match major == 0.0 {
            true => 0.0,
            false => (minor / major).abs(),
        };

        let mut error = 0.0;
        for i in 0..=range {
            let t = match range {
                0 => 0.0,
                _ => i as f32 / range as f32,
            };
            let depth = v0.position.z + (v1.position.z - v0.position.z) * t;
            if self.buffers.depth_func(x, y, depth) {
                self.buffers.shade_pixel(x, y, Colour::lerp(v0.colour, v1.colour, t));
            }

            error += abs_slope;
            let minor_step = error >= 0.5;
            if minor_step {
                error -= 1.0;
            }
            if x_major {
                x += x_dir;
                if minor_step {
                    y += y_dir;
                }
            } else {
                y += y_dir;
                if minor_step {
                    x += x_dir;
                }
            }
        }
    }

    /// Clips the triangle when it pokes out of the view volume and draws what is left as a fan.
    fn rasterise_clipped_tri(
        &mut self,
        v0: ClipVertex,
        v1: ClipVertex,
        v2: ClipVertex,
        texture: Option<&Texture>,
    ) {
        let outside = homogeneous_outcode(&v0.position)
            | homogeneous_outcode(&v1.position)
            | homogeneous_outcode(&v2.position);
        if !self.state.clip_triangles || outside == INSIDE {
            self.rasterise_projected_tri(&v0, &v1, &v2, texture);
            return;
        }

        let polygon = sutherland_hodgman_tri(v0, v1, v2);
        for i in 1..polygon.len().saturating_sub(1) {
            self.rasterise_projected_tri(&polygon[0], &polygon[i], &polygon[i + 1], texture);
        }
    }

    fn rasterise_projected_tri(
        &mut self,
        v0: &ClipVertex,
        v1: &ClipVertex,
        v2: &ClipVertex,
        texture: Option<&Texture>,
    ) {
        let projected = (self.project(v0), self.project(v1), self.project(v2));
        if let (Some(s0), Some(s1), Some(s2)) = projected {
            self.rasterise_tri(&s0, &s1, &s2, texture);
        }
    }

    fn bounding_box(
        &self,
        p0: &Vector4<f32>,
        p1: &Vector4<f32>,
        p2: &Vector4<f32>,
    ) -> Option<BoundingBox> {
        if self.buffers.width == 0 || self.buffers.height == 0 {
            return None;
        }
        let max_x_limit = (self.buffers.width - 1) as f32;
        let max_y_limit = (self.buffers.height - 1) as f32;
        let min_x = p0.x.min(p1.x).min(p2.x).floor().max(0.0);
        let min_y = p0.y.min(p1.y).min(p2.y).floor().max(0.0);
        let max_x = p0.x.max(p1.x).max(p2.x).ceil().min(max_x_limit);
        let max_y = p0.y.max(p1.y).max(p2.y).ceil().min(max_y_limit);
        if min_x > max_x || min_y > max_y {
            return None;
        }
        return Some(BoundingBox {
            min_x: min_x as i32,
            min_y: min_y as i32,
            max_x: max_x as i32,
            max_y: max_y as i32,
        });
    }

    /// Bounding box scan with an area based inside test, early depth test, then texture or
    /// colour shading through the current blend mode.
    fn rasterise_tri(
        &mut self,
        s0: &ScreenVertex,
        s1: &ScreenVertex,
        s2: &ScreenVertex,
        texture: Option<&Texture>,
    ) {
        let (p0, p1, p2) = (&s0.position, &s1.position, &s2.position);
        let tri_area = signed_area(p0, p1, p2).abs();
        // Also rejects NaN.
        if !(tri_area >= MIN_TRIANGLE_AREA) {
            return;
        }
        let area_recip = 1.0 / tri_area;
        let bbox = match self.bounding_box(p0, p1, p2) {
            Some(bbox) => bbox,
            None => return,
        };

        for y in bbox.min_y..=bbox.max_y {
            for x in bbox.min_x..=bbox.max_x {
                let screen_pos = vector![x as f32, y as f32, 0.0, 1.0];
                let sub_tri_area = [
                    signed_area(p0, &screen_pos, p1).abs(),
                    signed_area(p1, &screen_pos, p2).abs(),
                    signed_area(p2, &screen_pos, p0).abs(),
                ];
                let tri_sum: f64 = sub_tri_area.iter().sum();
                if tri_sum > tri_area + INSIDE_EPSILON {
                    continue;
                }

                let weights = vector![
                    (sub_tri_area[1] * area_recip) as f32,
                    (sub_tri_area[2] * area_recip) as f32,
                    (sub_tri_area[0] * area_recip) as f32
                ];
                let depth = p0.z * weights.x + p1.z * weights.y + p2.z * weights.z;
                if !self.buffers.depth_func(x, y, depth) {
                    continue;
                }

                let colour = match texture {
                    Some(texture) => self.sample_texture(texture, s0, s1, s2, &screen_pos, weights),
                    None => {
                        let (c0, c1, c2) = (s0.colour, s1.colour, s2.colour);
                        Colour::interpolate(c0, c1, c2, weights.x, weights.y, weights.z)
                    }
                };
                self.buffers.blend_pixel(x, y, colour, self.state.blend_mode);
            }
        }
    }

    fn sample_texture(
        &self,
        texture: &Texture,
        s0: &ScreenVertex,
        s1: &ScreenVertex,
        s2: &ScreenVertex,
        screen_pos: &Vector4<f32>,
        weights: Vector3<f32>,
    ) -> Colour {
        let uv = perspective_uv(s0, s1, s2, weights);
        let level = match self.state.sample_mode.uses_mipmaps() {
            true => mip_level(texture, s0, s1, s2, screen_pos, uv),
            false => 0,
        };
        return match self.state.sample_mode {
            SampleMode::Nearest | SampleMode::MipmapNearest => texture.nearest_sample(uv, level),
            SampleMode::Bilinear | SampleMode::MipmapBilinear => texture.bilinear_sample(uv, level),
        };
    }
}

/// Mip level from how far the texture coordinate moves one pixel right and one pixel up,
/// measured in texels of the full size image.
fn mip_level(
    texture: &Texture,
    s0: &ScreenVertex,
    s1: &ScreenVertex,
    s2: &ScreenVertex,
    screen_pos: &Vector4<f32>,
    uv: Vector2<f32>,
) -> usize {
    let (p0, p1, p2) = (&s0.position, &s1.position, &s2.position);
    let x_weights = calculate_weights(p0, p1, p2, &(screen_pos + vector![1.0, 0.0, 0.0, 0.0]));
    let y_weights = calculate_weights(p0, p1, p2, &(screen_pos + vector![0.0, 1.0, 0.0, 0.0]));
    let (x_weights, y_weights) = match (x_weights, y_weights) {
        (Some(x_weights), Some(y_weights)) => (x_weights, y_weights),
        _ => return 0,
    };

    let x_deriv = perspective_uv(s0, s1, s2, x_weights) - uv;
    let y_deriv = perspective_uv(s0, s1, s2, y_weights) - uv;
    let max_u = x_deriv.x.abs().max(y_deriv.x.abs()) * texture.width() as f32;
    let max_v = x_deriv.y.abs().max(y_deriv.y.abs()) * texture.height() as f32;
    let max_change = max_u.max(max_v);
    // Also catches NaN.
    if !(max_change > 1.0) {
        return 0;
    }
    return max_change.log2() as usize;
}
