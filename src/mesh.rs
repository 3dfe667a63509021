use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::Context;
use log::{debug, warn};
use nalgebra as na;
use na::{vector, Vector2, Vector3, Vector4};
use obj::{load_obj, Obj, TexturedVertex};

use crate::colour::Colour;
use crate::util::{circle_points, to_hom_point};

/// Defines how consecutive vertices of a mesh are grouped into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Points,
    Lines,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

/// Flat vertex buffer: positions plus optional per-vertex colours and texture coordinates.
///
/// Colours and texture coordinates are either absent or hold exactly one entry per vertex.
#[derive(Debug, Clone)]
pub struct Mesh {
    primitive: PrimitiveType,
    positions: Vec<Vector4<f32>>,
    colours: Option<Vec<Colour>>,
    tex_coords: Option<Vec<Vector2<f32>>>,
}

impl Mesh {
    /// Builds a mesh from raw arrays. An attribute array whose length differs from the
    /// number of positions is dropped as a whole.
    pub fn new(
        primitive: PrimitiveType,
        positions: Vec<Vector4<f32>>,
        colours: Option<Vec<Colour>>,
        tex_coords: Option<Vec<Vector2<f32>>>,
    ) -> Mesh {
        let n = positions.len();
        let colours = colours.filter(|c| {
            if c.len() != n {
                debug!("Dropping colour array of length {} for mesh of {} vertices", c.len(), n);
            }
            c.len() == n
        });
        let tex_coords = tex_coords.filter(|t| {
            if t.len() != n {
                debug!("Dropping texcoord array of length {} for mesh of {} vertices", t.len(), n);
            }
            t.len() == n
        });
        return Mesh { primitive, positions, colours, tex_coords };
    }

    /// Helper for generators: positions in 3D, every attribute filled in.
    fn from_parts(
        primitive: PrimitiveType,
        positions: &[Vector3<f32>],
        colours: Vec<Colour>,
        tex_coords: Vec<Vector2<f32>>,
    ) -> Mesh {
        let positions = positions.iter().map(|p| to_hom_point(*p)).collect();
        return Mesh::new(primitive, positions, Some(colours), Some(tex_coords));
    }

    pub fn primitive(&self) -> PrimitiveType {
        return self.primitive;
    }

    pub fn vertex_count(&self) -> usize {
        return self.positions.len();
    }

    pub fn positions(&self) -> &[Vector4<f32>] {
        return &self.positions[..];
    }

    pub fn colours(&self) -> Option<&[Colour]> {
        return self.colours.as_deref();
    }

    pub fn tex_coords(&self) -> Option<&[Vector2<f32>]> {
        return self.tex_coords.as_deref();
    }

    /// Colour of vertex `i`, white if the mesh carries no colours.
    pub fn colour_at(&self, i: usize) -> Colour {
        return match &self.colours {
            Some(colours) => colours[i],
            None => Colour::WHITE,
        };
    }

    /// Texture coordinate of vertex `i`, (0, 0) if the mesh carries none.
    pub fn tex_coord_at(&self, i: usize) -> Vector2<f32> {
        return match &self.tex_coords {
            Some(tex_coords) => tex_coords[i],
            None => vector![0.0, 0.0],
        };
    }

    /// Single point.
    pub fn point(pos: Vector3<f32>, colour: Colour) -> Mesh {
        let tex_coords = vec![vector![0.0, 0.0]];
        return Mesh::from_parts(PrimitiveType::Points, &[pos], vec![colour], tex_coords);
    }

    /// Single white line segment.
    pub fn line(from: Vector3<f32>, to: Vector3<f32>) -> Mesh {
        return Mesh::from_parts(
            PrimitiveType::Lines,
            &[from, to],
            vec![Colour::WHITE; 2],
            vec![vector![0.0, 0.0], vector![1.0, 1.0]],
        );
    }

    /// Outline of a regular n-gon inscribed in the unit circle, as `n` separate line segments.
    pub fn n_sided(n: usize) -> Mesh {
        let rim = circle_points(1.0, n);
        let mut positions = Vec::with_capacity(2 * n);
        for i in 0..n {
            positions.push(rim[i]);
            positions.push(rim[i + 1]);
        }
        let tex_coords = positions.iter().map(|p| planar_uv(*p, 1.0)).collect();
        let colours = vec![Colour::WHITE; 2 * n];
        return Mesh::from_parts(PrimitiveType::Lines, &positions, colours, tex_coords);
    }

    /// Red, green and blue cornered triangle.
    pub fn triangle() -> Mesh {
        return Mesh::from_parts(
            PrimitiveType::Triangles,
            &[vector![0.0, 0.5, 0.0], vector![0.5, -0.5, 0.0], vector![-0.5, -0.5, 0.0]],
            vec![Colour::RED, Colour::GREEN, Colour::BLUE],
            vec![vector![0.5, 0.0], vector![1.0, 1.0], vector![0.0, 1.0]],
        );
    }

    /// Unit quad made of two triangles in strip order.
    pub fn triangle_strip() -> Mesh {
        return Mesh::from_parts(
            PrimitiveType::TriangleStrip,
            &[
                vector![-0.5, 0.5, 0.0],
                vector![-0.5, -0.5, 0.0],
                vector![0.5, 0.5, 0.0],
                vector![0.5, -0.5, 0.0],
            ],
            vec![Colour::RED, Colour::GREEN, Colour::BLUE, Colour::WHITE],
            vec![vector![0.0, 0.0], vector![0.0, 1.0], vector![1.0, 0.0], vector![1.0, 1.0]],
        );
    }

    /// Hexagon as a fan around its centre.
    pub fn triangle_fan() -> Mesh {
        let mut fan = Mesh::disc_2d(0.5, 6);
        // Centre stays white, rim alternates so the six slices are distinguishable.
        if let Some(colours) = fan.colours.as_mut() {
            for (i, colour) in colours.iter_mut().enumerate().skip(1) {
                *colour = if i % 2 == 0 { Colour::RED } else { Colour::BLUE };
            }
        }
        return fan;
    }

    /// UV sphere of radius 1 as a plain triangle list. Vertex colours follow the position.
    pub fn sphere(stacks: usize, slices: usize) -> Mesh {
        let stacks = stacks.max(2);
        let slices = slices.max(3);
        let at = |stack: usize, slice: usize| -> (Vector3<f32>, Vector2<f32>) {
            let theta = std::f32::consts::PI * stack as f32 / stacks as f32;
            let phi = 2.0 * std::f32::consts::PI * slice as f32 / slices as f32;
            let pos = vector![theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin()];
            let uv = vector![slice as f32 / slices as f32, stack as f32 / stacks as f32];
            (pos, uv)
        };

        let mut positions = Vec::with_capacity(stacks * slices * 6);
        let mut tex_coords = Vec::with_capacity(stacks * slices * 6);
        for i in 0..stacks {
            for j in 0..slices {
                let quad = [at(i, j), at(i + 1, j), at(i + 1, j + 1), at(i, j + 1)];
                for k in [0, 1, 2, 0, 2, 3] {
                    positions.push(quad[k].0);
                    tex_coords.push(quad[k].1);
                }
            }
        }
        let colours = positions
            .iter()
            .map(|p| {
                let [r, g, b] = [p.x, p.y, p.z].map(channel_from_unit);
                Colour::new(r, g, b, 255)
            })
            .collect();
        return Mesh::from_parts(PrimitiveType::Triangles, &positions, colours, tex_coords);
    }

    /// Filled disc in the z = 0 plane: centre vertex followed by the closed rim.
    pub fn disc_2d(radius: f32, segments: usize) -> Mesh {
        let mut positions = vec![vector![0.0, 0.0, 0.0]];
        positions.extend(circle_points(radius, segments.max(3)));
        let tex_coords = positions.iter().map(|p| planar_uv(*p, radius)).collect();
        let colours = vec![Colour::WHITE; positions.len()];
        return Mesh::from_parts(PrimitiveType::TriangleFan, &positions, colours, tex_coords);
    }

    /// Annulus in the z = 0 plane, alternating inner and outer rim vertices.
    pub fn ring_2d(inner: f32, outer: f32, segments: usize) -> Mesh {
        let inner_rim = circle_points(inner, segments.max(3));
        let outer_rim = circle_points(outer, segments.max(3));
        let mut positions = Vec::with_capacity(2 * inner_rim.len());
        for (i, o) in inner_rim.iter().zip(outer_rim.iter()) {
            positions.push(*i);
            positions.push(*o);
        }
        let tex_coords = positions.iter().map(|p| planar_uv(*p, outer)).collect();
        let colours = vec![Colour::WHITE; positions.len()];
        return Mesh::from_parts(PrimitiveType::TriangleStrip, &positions, colours, tex_coords);
    }

    /// Loads a mesh in the plain text format:
    /// `count has_tex has_colour`, then `count` positions (x y z), then colours (r g b a,
    /// 0..255) if present, then texture coordinates (u v) if present.
    ///
    /// Returns `None` if the file can't be read. The vertex count is capped by the position
    /// tokens actually present. Ranges aren't validated, missing or unparsable values read as 0.
    pub fn load_mesh_file<P: AsRef<Path>>(path: P) -> Option<Mesh> {
        let path = path.as_ref();
        let mut contents = String::new();
        let read_result = File::open(path).and_then(|mut file| file.read_to_string(&mut contents));
        if let Err(e) = read_result {
            warn!("Couldn't load mesh {}: {}", path.display(), e);
            return None;
        }

        let mut tokens = contents.split_whitespace();
        // A vertex needs at least part of its position after the header.
        let max_count = (tokens.clone().count().saturating_sub(3) + 2) / 3;
        let mut next_f32 = move || -> f32 {
            tokens.next().and_then(|t| t.parse().ok()).unwrap_or(0.0)
        };

        let declared = next_f32().max(0.0) as usize;
        let count = declared.min(max_count);
        if count < declared {
            warn!("Mesh {} declares {} vertices, reading {}", path.display(), declared, count);
        }
        let has_tex = next_f32() != 0.0;
        let has_colour = next_f32() != 0.0;

        let positions: Vec<Vector4<f32>> = (0..count)
            .map(|_| vector![next_f32(), next_f32(), next_f32(), 1.0])
            .collect();
        let colours: Option<Vec<Colour>> = match has_colour {
            true => Some(
                (0..count)
                    .map(|_| {
                        let mut channel = || next_f32().round().clamp(0.0, 255.0) as u8;
                        Colour { r: channel(), g: channel(), b: channel(), a: channel() }
                    })
                    .collect(),
            ),
            false => None,
        };
        let tex_coords: Option<Vec<Vector2<f32>>> = match has_tex {
            true => Some((0..count).map(|_| vector![next_f32(), next_f32()]).collect()),
            false => None,
        };

        debug!("Loaded mesh {} with {} vertices", path.display(), count);
        return Some(Mesh::new(PrimitiveType::Triangles, positions, colours, tex_coords));
    }

    /// Imports a triangulated OBJ file with texture coordinates and normals as a flat
    /// triangle list.
    pub fn from_obj<P: AsRef<Path>>(path: P) -> anyhow::Result<Mesh> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let model: Obj<TexturedVertex, u32> =
            load_obj(BufReader::new(file)).with_context(|| format!("parsing {}", path.display()))?;

        let mut positions = Vec::with_capacity(model.indices.len());
        let mut tex_coords = Vec::with_capacity(model.indices.len());
        for index in &model.indices {
            let vertex = &model.vertices[*index as usize];
            let [x, y, z] = vertex.position;
            positions.push(vector![x, y, z, 1.0]);
            tex_coords.push(vector![vertex.texture[0], vertex.texture[1]]);
        }
        debug!(
            "Imported {}: {} vertices, {} indices",
            path.display(),
            model.vertices.len(),
            model.indices.len()
        );
        let colours = vec![Colour::WHITE; positions.len()];
        return Ok(Mesh::new(PrimitiveType::Triangles, positions, Some(colours), Some(tex_coords)));
    }
}

/// Maps x, y in [-r, r] onto [0, 1] texture space.
fn planar_uv(p: Vector3<f32>, r: f32) -> Vector2<f32> {
    return vector![p.x / (2.0 * r) + 0.5, 0.5 - p.y / (2.0 * r)];
}

fn channel_from_unit(v: f32) -> u8 {
    return ((v * 0.5 + 0.5) * 255.0).clamp(0.0, 255.0) as u8;
}
