pub mod clip;
mod buffer;
mod raster;
mod state;

use log::debug;
use nalgebra as na;
use na::{vector, Matrix4};

use crate::colour::Colour;

pub use buffer::{FrameBuffers, DEPTH_MAX};
pub use raster::{calculate_weights, screen_area_of_tri};
pub use state::{BlendMode, RasterState, SampleMode};

/// Receiver of finished frames, e.g. a window.
///
/// `frame` is row-major with the bottom row first.
pub trait Present {
    fn present(&mut self, frame: &[Colour], width: u32, height: u32) -> anyhow::Result<()>;
}

/// CPU rasteriser drawing render objects into double buffered colour buffers with a
/// shared 16 bit depth buffer.
pub struct SoftwareRasteriser {
    buffers: FrameBuffers,
    state: RasterState,
    view_matrix: Matrix4<f32>,
    projection_matrix: Matrix4<f32>,
    // Kept up to date by the setters, projection * view.
    view_proj_matrix: Matrix4<f32>,
    // Depends only on the frame size.
    viewport_matrix: Matrix4<f32>,
}

/// Maps NDC x, y in [-1, 1] to pixel coordinates [0, size - 1] and z in [-1, 1] to
/// depth [0, DEPTH_MAX].
fn viewport_matrix(width: u32, height: u32) -> Matrix4<f32> {
    let half = vector![
        width.saturating_sub(1) as f32 * 0.5,
        height.saturating_sub(1) as f32 * 0.5,
        DEPTH_MAX as f32 * 0.5
    ];
    return Matrix4::new_translation(&half) * Matrix4::new_nonuniform_scaling(&half);
}

impl SoftwareRasteriser {
    pub fn new(width: u32, height: u32) -> SoftwareRasteriser {
        debug!("Creating {}x{} rasteriser", width, height);
        return SoftwareRasteriser {
            buffers: FrameBuffers::new(width, height),
            state: RasterState::default(),
            view_matrix: Matrix4::identity(),
            projection_matrix: Matrix4::identity(),
            view_proj_matrix: Matrix4::identity(),
            viewport_matrix: viewport_matrix(width, height),
        };
    }

    /// Reallocates every buffer for the new size and recomputes the viewport matrix.
    pub fn resize(&mut self, width: u32, height: u32) {
        debug!("Resizing rasteriser to {}x{}", width, height);
        self.buffers.resize(width, height);
        self.viewport_matrix = viewport_matrix(width, height);
    }

    pub fn width(&self) -> u32 {
        return self.buffers.width;
    }

    pub fn height(&self) -> u32 {
        return self.buffers.height;
    }

    /// Clears the buffer being drawn into to opaque black and the depth buffer to far.
    pub fn clear_buffers(&mut self) {
        self.buffers.clear();
    }

    /// Hands the buffer being drawn into to `target`, then starts drawing into the other one.
    /// The buffers are flipped even if presenting fails.
    pub fn swap_buffers<P: Present + ?Sized>(&mut self, target: &mut P) -> anyhow::Result<()> {
        let (width, height) = (self.buffers.width, self.buffers.height);
        let result = target.present(self.buffers.current(), width, height);
        self.buffers.swap();
        return result;
    }

    pub fn set_view_matrix(&mut self, m: Matrix4<f32>) {
        self.view_matrix = m;
        self.view_proj_matrix = self.projection_matrix * self.view_matrix;
    }

    pub fn set_projection_matrix(&mut self, m: Matrix4<f32>) {
        self.projection_matrix = m;
        self.view_proj_matrix = self.projection_matrix * self.view_matrix;
    }

    pub fn view_matrix(&self) -> &Matrix4<f32> {
        return &self.view_matrix;
    }

    pub fn projection_matrix(&self) -> &Matrix4<f32> {
        return &self.projection_matrix;
    }

    pub fn view_proj_matrix(&self) -> &Matrix4<f32> {
        return &self.view_proj_matrix;
    }

    pub fn viewport_matrix(&self) -> &Matrix4<f32> {
        return &self.viewport_matrix;
    }

    pub fn state(&self) -> &RasterState {
        return &self.state;
    }

    pub fn state_mut(&mut self) -> &mut RasterState {
        return &mut self.state;
    }

    pub fn sample_mode(&self) -> SampleMode {
        return self.state.sample_mode;
    }

    pub fn set_sample_mode(&mut self, mode: SampleMode) {
        self.state.sample_mode = mode;
    }

    pub fn blend_mode(&self) -> BlendMode {
        return self.state.blend_mode;
    }

    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        self.state.blend_mode = mode;
    }

    /// Advances to the next sampling mode and returns it.
    pub fn switch_texture_filtering(&mut self) -> SampleMode {
        self.state.sample_mode = self.state.sample_mode.next();
        return self.state.sample_mode;
    }

    /// Advances to the next blend mode and returns it.
    pub fn switch_blend_state(&mut self) -> BlendMode {
        self.state.blend_mode = self.state.blend_mode.next();
        return self.state.blend_mode;
    }

    /// Index (0 or 1) of the colour buffer being drawn into.
    pub fn current_draw_buffer(&self) -> usize {
        return self.buffers.current_draw_buffer();
    }

    /// Colour buffer being drawn into, bottom row first.
    pub fn colour_buffer(&self) -> &[Colour] {
        return self.buffers.current();
    }

    pub fn depth_buffer(&self) -> &[u16] {
        return self.buffers.depth();
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Colour> {
        return self.buffers.pixel(x, y);
    }

    pub fn depth(&self, x: i32, y: i32) -> Option<u16> {
        return self.buffers.depth_at(x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder {
        frames: Vec<Vec<Colour>>,
    }

    impl Present for Recorder {
        fn present(&mut self, frame: &[Colour], width: u32, height: u32) -> anyhow::Result<()> {
            assert_eq!(frame.len(), (width * height) as usize);
            self.frames.push(frame.to_vec());
            return Ok(());
        }
    }

    struct Failing;

    impl Present for Failing {
        fn present(&mut self, _frame: &[Colour], _width: u32, _height: u32) -> anyhow::Result<()> {
            anyhow::bail!("no surface");
        }
    }

    #[test]
    fn view_proj_is_recomputed_eagerly() {
        let mut r = SoftwareRasteriser::new(4, 4);
        let view = Matrix4::new_translation(&vector![1.0, 2.0, 3.0]);
        let projection = Matrix4::new_perspective(1.0, 1.0, 0.1, 10.0);
        r.set_view_matrix(view);
        assert_eq!(*r.view_proj_matrix(), view);
        r.set_projection_matrix(projection);
        assert_eq!(*r.view_proj_matrix(), projection * view);
    }

    #[test]
    fn viewport_maps_ndc_corners() {
        let r = SoftwareRasteriser::new(101, 51);
        let low = r.viewport_matrix() * vector![-1.0, -1.0, -1.0, 1.0];
        let high = r.viewport_matrix() * vector![1.0, 1.0, 1.0, 1.0];
        assert!((low - vector![0.0, 0.0, 0.0, 1.0]).norm() < 1e-3);
        assert!((high - vector![100.0, 50.0, DEPTH_MAX as f32, 1.0]).norm() < 1e-2);
    }

    #[test]
    fn swap_presents_current_and_flips() {
        let mut r = SoftwareRasteriser::new(2, 2);
        let mut recorder = Recorder { frames: Vec::new() };
        let start = r.current_draw_buffer();
        r.clear_buffers();
        r.swap_buffers(&mut recorder).unwrap();
        assert_ne!(r.current_draw_buffer(), start);
        r.swap_buffers(&mut recorder).unwrap();
        assert_eq!(r.current_draw_buffer(), start);
        assert_eq!(recorder.frames.len(), 2);
        assert!(recorder.frames[0].iter().all(|c| *c == Colour::BLACK));
    }

    #[test]
    fn failed_present_still_flips() {
        let mut r = SoftwareRasteriser::new(2, 2);
        assert!(r.swap_buffers(&mut Failing).is_err());
        assert_eq!(r.current_draw_buffer(), 1);
    }

    #[test]
    fn resize_recomputes_viewport() {
        let mut r = SoftwareRasteriser::new(11, 11);
        r.resize(21, 41);
        assert_eq!(r.colour_buffer().len(), 21 * 41);
        let high = r.viewport_matrix() * vector![1.0, 1.0, 0.0, 1.0];
        assert!((high.x - 20.0).abs() < 1e-4);
        assert!((high.y - 40.0).abs() < 1e-4);
    }

    #[test]
    fn mode_switches_cycle() {
        let mut r = SoftwareRasteriser::new(1, 1);
        assert_eq!(r.switch_texture_filtering(), SampleMode::Bilinear);
        assert_eq!(r.switch_blend_state(), BlendMode::Alpha);
        r.set_blend_mode(BlendMode::Replace);
        assert_eq!(r.blend_mode(), BlendMode::Replace);
    }
}
