use nalgebra as na;
use na::Matrix4;

use crate::mesh::Mesh;
use crate::texture::Texture;

/// A mesh placed in the world by its model matrix, optionally textured.
/// Owns its mesh and texture: dropping the object drops both.
#[derive(Debug, Clone)]
pub struct RenderObject {
    mesh: Mesh,
    texture: Option<Texture>,
    model_matrix: Matrix4<f32>,
}

impl RenderObject {
    pub fn new(mesh: Mesh) -> RenderObject {
        return RenderObject {
            mesh,
            texture: None,
            model_matrix: Matrix4::identity(),
        };
    }

    pub fn with_texture(mut self, texture: Texture) -> RenderObject {
        self.texture = Some(texture);
        return self;
    }

    pub fn with_model_matrix(mut self, model_matrix: Matrix4<f32>) -> RenderObject {
        self.model_matrix = model_matrix;
        return self;
    }

    pub fn mesh(&self) -> &Mesh {
        return &self.mesh;
    }

    pub fn texture(&self) -> Option<&Texture> {
        return self.texture.as_ref();
    }

    pub fn model_matrix(&self) -> &Matrix4<f32> {
        return &self.model_matrix;
    }

    pub fn set_model_matrix(&mut self, model_matrix: Matrix4<f32>) {
        self.model_matrix = model_matrix;
    }
}
