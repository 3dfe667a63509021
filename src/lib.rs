//! Software rasteriser: projects, clips and shades points, lines and triangles into
//! CPU owned colour and depth buffers.

pub mod colour;
pub mod mesh;
pub mod rasteriser;
pub mod render_object;
pub mod texture;
mod util;

pub use colour::Colour;
pub use mesh::{Mesh, PrimitiveType};
pub use rasteriser::{BlendMode, Present, RasterState, SampleMode, SoftwareRasteriser};
pub use render_object::RenderObject;
pub use texture::Texture;
