use std::io::Write;

use nalgebra as na;
use na::{vector, Matrix4, Vector2, Vector4};

use soft_rasteriser::{
    BlendMode, Colour, Mesh, Present, PrimitiveType, RenderObject, SampleMode, SoftwareRasteriser,
    Texture,
};

/// Keeps a copy of every presented frame.
struct Recorder {
    frames: Vec<Vec<Colour>>,
}

impl Present for Recorder {
    fn present(&mut self, frame: &[Colour], _width: u32, _height: u32) -> anyhow::Result<()> {
        self.frames.push(frame.to_vec());
        return Ok(());
    }
}

/// Triangle covering the lower left half of the view, in clip space.
fn half_screen(colour: Colour, z: f32) -> Mesh {
    let positions = vec![
        vector![-1.0, -1.0, z, 1.0],
        vector![1.0, -1.0, z, 1.0],
        vector![-1.0, 1.0, z, 1.0],
    ];
    let tex_coords = vec![vector![0.0, 0.0], vector![1.0, 0.0], vector![0.0, 1.0]];
    return Mesh::new(PrimitiveType::Triangles, positions, Some(vec![colour; 3]), Some(tex_coords));
}

/// Triangle of the given colour in the z = 0 plane around the origin.
fn world_triangle(colour: Colour) -> Mesh {
    let positions = vec![
        vector![-1.0, -1.0, 0.0, 1.0],
        vector![1.0, -1.0, 0.0, 1.0],
        vector![0.0, 1.0, 0.0, 1.0],
    ];
    return Mesh::new(PrimitiveType::Triangles, positions, Some(vec![colour; 3]), None);
}

/// `world_triangle` moved along z.
fn triangle_at_depth(colour: Colour, z: f32) -> RenderObject {
    let model_matrix = Matrix4::new_translation(&vector![0.0, 0.0, z]);
    return RenderObject::new(world_triangle(colour)).with_model_matrix(model_matrix);
}

fn perspective_rasteriser(width: u32, height: u32) -> SoftwareRasteriser {
    let mut r = SoftwareRasteriser::new(width, height);
    let aspect = width as f32 / height as f32;
    r.set_projection_matrix(Matrix4::new_perspective(aspect, 45f32.to_radians(), 1.0, 100.0));
    r.set_view_matrix(Matrix4::identity());
    return r;
}

#[test]
fn clear_gives_opaque_black_and_far_depth() {
    let mut r = SoftwareRasteriser::new(7, 5);
    r.draw_object(&RenderObject::new(half_screen(Colour::RED, 0.0)));
    r.clear_buffers();
    assert!(r.colour_buffer().iter().all(|c| c.to_packed() == 0xFF000000));
    assert!(r.depth_buffer().iter().all(|d| *d == u16::MAX));
}

#[test]
fn swap_presents_drawn_frame_and_toggles_back() {
    let mut r = SoftwareRasteriser::new(9, 9);
    let mut recorder = Recorder { frames: Vec::new() };
    let start = r.current_draw_buffer();

    r.clear_buffers();
    r.draw_object(&RenderObject::new(half_screen(Colour::GREEN, 0.0)));
    r.swap_buffers(&mut recorder).unwrap();
    // The other buffer hasn't been drawn into.
    assert_eq!(r.pixel(0, 0), Some(Colour::BLACK));
    r.swap_buffers(&mut recorder).unwrap();

    assert_eq!(r.current_draw_buffer(), start);
    assert_eq!(recorder.frames[0][0], Colour::GREEN);
    assert_eq!(recorder.frames[1][0], Colour::BLACK);
}

#[test]
fn nearer_object_hides_farther_one_in_perspective() {
    let near = triangle_at_depth(Colour::RED, -3.0);
    let far = triangle_at_depth(Colour::BLUE, -6.0);

    let mut r = perspective_rasteriser(32, 32);
    r.clear_buffers();
    r.draw_object(&near);
    r.draw_object(&far);
    assert_eq!(r.pixel(16, 14), Some(Colour::RED));

    r.clear_buffers();
    r.draw_object(&far);
    r.draw_object(&near);
    assert_eq!(r.pixel(16, 14), Some(Colour::RED));
}

#[test]
fn object_behind_camera_is_clipped_away() {
    let behind = triangle_at_depth(Colour::RED, 3.0);
    let mut r = perspective_rasteriser(32, 32);
    r.clear_buffers();
    r.draw_object(&behind);
    assert!(r.colour_buffer().iter().all(|c| *c == Colour::BLACK));
}

#[test]
fn object_crossing_near_plane_is_partially_drawn() {
    // Tilted so that its top pokes through the near plane.
    let positions = vec![
        vector![-1.0, -1.0, -3.0, 1.0],
        vector![1.0, -1.0, -3.0, 1.0],
        vector![0.0, 1.0, 0.5, 1.0],
    ];
    let object = RenderObject::new(Mesh::new(PrimitiveType::Triangles, positions, None, None));
    let mut r = perspective_rasteriser(32, 32);
    r.clear_buffers();
    r.draw_object(&object);
    let drawn = r.colour_buffer().iter().filter(|c| **c == Colour::WHITE).count();
    assert!(drawn > 0);
}

#[test]
fn texture_coordinates_are_perspective_correct() {
    // The second vertex is twice as far away (w = 2), so half way along the bottom edge on
    // screen is only a third of the way along it in texture space.
    let positions: Vec<Vector4<f32>> = vec![
        vector![-1.0, -1.0, 0.0, 1.0],
        vector![2.0, -2.0, 0.0, 2.0],
        vector![-1.0, 1.0, 0.0, 1.0],
    ];
    let tex_coords: Vec<Vector2<f32>> =
        vec![vector![0.0, 0.0], vector![1.0, 0.0], vector![0.0, 1.0]];
    let mesh = Mesh::new(PrimitiveType::Triangles, positions, None, Some(tex_coords));
    let texels = vec![Colour::RED, Colour::GREEN, Colour::BLUE, Colour::WHITE];
    let texture = Texture::from_texels(4, 1, texels);
    let object = RenderObject::new(mesh).with_texture(texture);

    let mut r = SoftwareRasteriser::new(21, 21);
    r.clear_buffers();
    r.draw_object(&object);
    assert_eq!(r.pixel(10, 1), Some(Colour::GREEN));
    assert_eq!(r.pixel(1, 1), Some(Colour::RED));
}

#[test]
fn mipmapping_averages_minified_texture() {
    let texture = Texture::checkerboard(64, 1, Colour::WHITE, Colour::BLACK);
    let object = RenderObject::new(half_screen(Colour::WHITE, 0.0)).with_texture(texture);
    let mut r = SoftwareRasteriser::new(16, 16);

    r.set_sample_mode(SampleMode::Nearest);
    r.clear_buffers();
    r.draw_object(&object);
    let c = r.pixel(4, 4).unwrap();
    assert!(c.r == 0 || c.r == 255);

    for mode in [SampleMode::MipmapNearest, SampleMode::MipmapBilinear] {
        r.set_sample_mode(mode);
        r.clear_buffers();
        r.draw_object(&object);
        let c = r.pixel(4, 4).unwrap();
        assert!(c.r > 100 && c.r < 156, "{:?} gave {:?}", mode, c);
    }
}

#[test]
fn alpha_blending_of_triangles() {
    let mut r = SoftwareRasteriser::new(9, 9);
    r.clear_buffers();
    r.draw_object(&RenderObject::new(half_screen(Colour::RED, 0.5)));

    r.set_blend_mode(BlendMode::Alpha);
    r.draw_object(&RenderObject::new(half_screen(Colour::TRANSPARENT, 0.0)));
    assert_eq!(r.pixel(1, 1), Some(Colour::RED));

    r.draw_object(&RenderObject::new(half_screen(Colour::BLUE, -0.5)));
    assert_eq!(r.pixel(1, 1), Some(Colour::BLUE));
}

#[test]
fn replace_keeps_only_last_write() {
    let mut r = SoftwareRasteriser::new(9, 9);
    r.clear_buffers();
    r.draw_object(&RenderObject::new(half_screen(Colour::RED, 0.0)));
    r.draw_object(&RenderObject::new(half_screen(Colour::GREEN, 0.0)));
    assert_eq!(r.pixel(2, 2), Some(Colour::GREEN));
}

#[test]
fn loaded_mesh_file_renders() {
    let file_name = format!("soft_rasteriser_pipeline_{}.mesh", std::process::id());
    let path = std::env::temp_dir().join(file_name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(b"3 0 1\n-1 -1 0\n1 -1 0\n-1 1 0\n").unwrap();
    file.write_all(b"0 255 0 255\n0 255 0 255\n0 255 0 255\n").unwrap();
    drop(file);

    let mesh = Mesh::load_mesh_file(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert!(mesh.tex_coords().is_none());

    let mut r = SoftwareRasteriser::new(9, 9);
    r.clear_buffers();
    r.draw_object(&RenderObject::new(mesh));
    assert_eq!(r.pixel(1, 1), Some(Colour::GREEN));
}

#[test]
fn moved_object_draws_at_new_place() {
    let mut object = RenderObject::new(Mesh::point(vector![0.0, 0.0, 0.0], Colour::RED));
    let mut r = SoftwareRasteriser::new(5, 5);
    r.clear_buffers();
    r.draw_object(&object);
    assert_eq!(r.pixel(2, 2), Some(Colour::RED));

    object.set_model_matrix(Matrix4::new_translation(&vector![1.0, 1.0, 0.0]));
    r.clear_buffers();
    r.draw_object(&object);
    assert_eq!(r.pixel(2, 2), Some(Colour::BLACK));
    assert_eq!(r.pixel(4, 4), Some(Colour::RED));
}

#[test]
fn resize_then_draw() {
    let mut r = SoftwareRasteriser::new(4, 4);
    r.resize(31, 17);
    r.clear_buffers();
    r.draw_object(&RenderObject::new(Mesh::point(vector![1.0, 1.0, 0.0], Colour::RED)));
    assert_eq!(r.pixel(30, 16), Some(Colour::RED));
}

#[test]
fn generated_shapes_render_without_panicking() {
    let mut r = perspective_rasteriser(64, 48);
    r.clear_buffers();
    let in_front = Matrix4::new_translation(&vector![0.0, 0.0, -4.0]);
    for mesh in [
        Mesh::n_sided(9),
        Mesh::triangle(),
        Mesh::triangle_strip(),
        Mesh::triangle_fan(),
        Mesh::sphere(8, 12),
        Mesh::disc_2d(1.0, 16),
        Mesh::ring_2d(0.5, 1.0, 16),
    ] {
        r.draw_object(&RenderObject::new(mesh).with_model_matrix(in_front));
    }
    assert!(r.colour_buffer().iter().any(|c| *c != Colour::BLACK));
}
