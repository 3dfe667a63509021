use std::time;

use anyhow::Context;
use log::info;
use nalgebra as na;
use na::{vector, Matrix4, Vector3};
use show_image::{create_window, event, ImageInfo, ImageView, WindowOptions, WindowProxy};

use soft_rasteriser::{Colour, Mesh, Present, RenderObject, SoftwareRasteriser, Texture};

/// Execution context of the demo.
pub struct Params {
    pub width: u32,
    pub height: u32,
    pub print_fps: bool,
    pub texture_path: Option<String>,
    pub mesh_path: Option<String>,
    pub obj_path: Option<String>,
}

/// Keys the demo reacts to.
enum Action {
    Exit,
    Move(Vector3<f32>),
    SwitchFiltering,
    SwitchBlending,
    ToggleClipping,
}

/// Shows presented frames in a show-image window.
struct WindowPresenter {
    window: WindowProxy,
    // rgba8, top row first.
    image_data: Vec<u8>,
}

impl Present for WindowPresenter {
    fn present(&mut self, frame: &[Colour], width: u32, height: u32) -> anyhow::Result<()> {
        let row_length = width as usize;
        self.image_data.clear();
        // Frame rows go bottom to top, the window wants them top to bottom.
        for row in frame.chunks_exact(row_length.max(1)).rev() {
            for colour in row {
                self.image_data.extend_from_slice(&colour.to_bytes());
            }
        }
        let image_view = ImageView::new(ImageInfo::rgba8(width, height), &self.image_data);
        self.window.set_image("image", image_view)?;
        return Ok(());
    }
}

/// Maps a window event to a demo action.
fn to_action(window_event: event::WindowEvent) -> Option<Action> {
    const STEP: f32 = 0.05;

    let event = match window_event {
        event::WindowEvent::KeyboardInput(event) => event,
        _ => return None,
    };
    if !event.input.state.is_pressed() {
        return None;
    }
    return match event.input.key_code? {
        event::VirtualKeyCode::Escape => Some(Action::Exit),
        event::VirtualKeyCode::A => Some(Action::Move(vector![-STEP, 0.0, 0.0])),
        event::VirtualKeyCode::D => Some(Action::Move(vector![STEP, 0.0, 0.0])),
        event::VirtualKeyCode::W => Some(Action::Move(vector![0.0, -STEP, 0.0])),
        event::VirtualKeyCode::S => Some(Action::Move(vector![0.0, STEP, 0.0])),
        event::VirtualKeyCode::Up => Some(Action::Move(vector![0.0, 0.0, STEP])),
        event::VirtualKeyCode::Down => Some(Action::Move(vector![0.0, 0.0, -STEP])),
        event::VirtualKeyCode::F => Some(Action::SwitchFiltering),
        event::VirtualKeyCode::E => Some(Action::SwitchBlending),
        event::VirtualKeyCode::C => Some(Action::ToggleClipping),
        _ => None,
    };
}

/// Objects to draw every frame: whatever was asked for on the command line, otherwise four
/// triangles, one of them textured.
fn build_scene(params: &Params) -> anyhow::Result<Vec<RenderObject>> {
    let texture = match &params.texture_path {
        Some(path) => Texture::from_file(path)?,
        None => Texture::checkerboard(64, 8, Colour::WHITE, Colour::new(180, 60, 40, 255)),
    };
    let in_front = Matrix4::new_translation(&vector![0.0, 0.0, -3.0]);

    if let Some(path) = &params.obj_path {
        let mesh = Mesh::from_obj(path)?;
        return Ok(vec![RenderObject::new(mesh).with_texture(texture).with_model_matrix(in_front)]);
    }
    if let Some(path) = &params.mesh_path {
        let mesh = Mesh::load_mesh_file(path)
            .with_context(|| format!("couldn't open mesh {}", path))?;
        return Ok(vec![RenderObject::new(mesh).with_model_matrix(in_front)]);
    }

    let rotated = Matrix4::new_translation(&vector![0.0, 0.0, -2.5])
        * Matrix4::from_axis_angle(&Vector3::y_axis(), std::f32::consts::PI);
    return Ok(vec![
        RenderObject::new(Mesh::triangle()).with_model_matrix(rotated),
        RenderObject::new(Mesh::triangle())
            .with_texture(texture)
            .with_model_matrix(Matrix4::new_translation(&vector![-0.6, 0.6, -2.0])),
        RenderObject::new(Mesh::triangle())
            .with_model_matrix(Matrix4::new_translation(&vector![0.6, -0.6, -2.0])),
        RenderObject::new(Mesh::triangle())
            .with_model_matrix(Matrix4::new_translation(&vector![0.6, 0.6, -2.0])),
        RenderObject::new(Mesh::n_sided(7)).with_model_matrix(
            Matrix4::new_translation(&vector![-0.6, -0.6, -3.0]) * Matrix4::new_scaling(0.4),
        ),
    ]);
}

/// Actualy launches the window, showing the rendered frames.
pub fn run(params: Params) -> anyhow::Result<()> {
    let mut rasteriser = SoftwareRasteriser::new(params.width, params.height);
    let aspect = params.width as f32 / params.height.max(1) as f32;
    let projection = Matrix4::new_perspective(aspect, 45f32.to_radians(), 1.0, 100.0);
    rasteriser.set_projection_matrix(projection);

    let mut objects = build_scene(&params)?;
    // The first object spins about its own y axis.
    let spin_base = objects.first().map(|object| *object.model_matrix());
    let start_time = time::Instant::now();

    let window_options: WindowOptions = WindowOptions {
        size: Some([params.width, params.height]),
        ..Default::default()
    };
    let window = create_window("output", window_options)?;
    let event_channel = window.event_channel()?;
    let mut presenter = WindowPresenter { window, image_data: Vec::new() };

    let mut camera = vector![0.0, 0.0, 0.0];
    let mut frame_counter_time_begin = time::Instant::now();
    let mut frame_counter: u32 = 0;
    'frames: loop {
        // Unloading all the events that have piled up since the last frame.
        for action in event_channel.try_iter().filter_map(to_action) {
            match action {
                Action::Exit => break 'frames,
                Action::Move(step) => camera += step,
                Action::SwitchFiltering => {
                    info!("Sampling: {:?}", rasteriser.switch_texture_filtering())
                }
                Action::SwitchBlending => info!("Blending: {:?}", rasteriser.switch_blend_state()),
                Action::ToggleClipping => {
                    let state = rasteriser.state_mut();
                    state.clip_lines = !state.clip_lines;
                    state.clip_triangles = !state.clip_triangles;
                    info!("Clipping: {}", state.clip_triangles);
                }
            }
        }

        if let (Some(base), Some(spinning)) = (spin_base, objects.first_mut()) {
            let angle = start_time.elapsed().as_secs_f32();
            spinning.set_model_matrix(base * Matrix4::from_axis_angle(&Vector3::y_axis(), angle));
        }
        rasteriser.set_view_matrix(Matrix4::new_translation(&camera));
        rasteriser.clear_buffers();
        for object in &objects {
            rasteriser.draw_object(object);
        }
        rasteriser.swap_buffers(&mut presenter)?;

        if params.print_fps {
            // Counting frames to printout stats every seconds.
            frame_counter += 1;
            if time::Instant::now()
            .duration_since(frame_counter_time_begin)
            .as_secs_f32() > 1.0 {
                info!("FPS --- {}", frame_counter);
                frame_counter_time_begin = time::Instant::now();
                frame_counter = 0;
            }
        }
    }

    return Ok(());
}
