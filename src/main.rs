mod app;

use std::env;

const WIDTH: u32  = 800;
const HEIGHT: u32 = 600;

#[show_image::main]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Default values.
    let mut params = app::Params {
        width: WIDTH,
        height: HEIGHT,
        print_fps: false,
        texture_path: None,
        mesh_path: None,
        obj_path: None,
    };

    let args: Vec<String> = env::args().collect();
    let value = |i: usize| args.get(i + 1).cloned();
    for i in 1..args.len() {
        match args[i].as_str() {
            "-w" => { params.width = value(i).and_then(|v| v.parse().ok()).unwrap_or(WIDTH); }
            "-h" => { params.height = value(i).and_then(|v| v.parse().ok()).unwrap_or(HEIGHT); }
            "-t" => { params.texture_path = value(i); }
            "-m" => { params.mesh_path = value(i); }
            "-o" => { params.obj_path = value(i); }
            "-fps" => { params.print_fps = true; }
            _ => ()
        }
    }

    app::run(params)?;

    return Ok(());
}
