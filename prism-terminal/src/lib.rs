//! Terminal front end: draws a rotating scene through the prism pipeline
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent},
    execute, queue,
    style::{Color as TermColor, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use nalgebra::{Point3, Vector3};
use prism_core::{
    AffineTransformer3, Camera, Cap, Color, Decomposer2, GeometryError, LineStyle, Projector,
    RotationState, Scene, SurfaceStyle, Target3,
};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

pub mod renderer;

pub use renderer::AsciiCanvas;

const FACE_COLORS: [Color; 6] = [
    Color::rgb(220, 60, 60),
    Color::rgb(110, 30, 30),
    Color::rgb(60, 200, 80),
    Color::rgb(30, 100, 40),
    Color::rgb(80, 120, 240),
    Color::rgb(40, 60, 120),
];

fn to_io(err: GeometryError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err)
}

/// Record a cube of edge `size` with beads on its corners and an axle
/// through its center.
pub fn record_cube<T: Target3>(target: &mut T, size: f32) -> prism_core::Result<()> {
    let h = size * 0.5;
    for axis in 0..3 {
        for (k, sign) in [1.0f32, -1.0].into_iter().enumerate() {
            // (u, v, n) is right-handed so corners wind counter-clockwise
            // seen from outside.
            let n = Vector3::ith(axis, sign);
            let u = Vector3::ith((axis + 1) % 3, 1.0);
            let v = Vector3::ith((axis + 2) % 3, sign);
            let c = Point3::from(n * h);
            let corners = [
                c - u * h - v * h,
                c + u * h - v * h,
                c + u * h + v * h,
                c - u * h + v * h,
            ];
            let style =
                SurfaceStyle::fill(FACE_COLORS[axis * 2 + k]).with_outline(Color::WHITE, 0.08);
            target.draw_surface(&corners, &style)?;
        }
    }

    let bead = SurfaceStyle::fill(Color::rgb(250, 220, 60));
    for i in 0..8 {
        let corner = Point3::new(
            if i & 1 == 0 { -h } else { h },
            if i & 2 == 0 { -h } else { h },
            if i & 4 == 0 { -h } else { h },
        );
        target.draw_sphere(corner, size * 0.15, &bead)?;
    }

    let axle = LineStyle::solid(Color::rgb(200, 200, 200)).with_caps(Cap::Round, Cap::Round);
    target.draw_segment(
        Point3::new(0.0, -size * 0.9, 0.0),
        Point3::new(0.0, size * 0.9, 0.0),
        size * 0.05,
        &axle,
    )
}

/// Main application struct for terminal rendering
pub struct TerminalApp {
    size: f32,
    rotation: RotationState,
    camera: Camera,
    canvas: AsciiCanvas,
    scene: Scene,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(size: f32) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        let canvas = AsciiCanvas::new(width as usize, height as usize);
        let (pixel_width, pixel_height) = canvas.pixel_size();

        Ok(Self {
            size,
            rotation: RotationState::new(0.3, 0.3, 0.0),
            camera: Camera::new(pixel_width as u32, pixel_height as u32),
            canvas,
            scene: Scene::new(),
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.running {
            let frame_start = Instant::now();

            if event::poll(Duration::from_millis(0))? {
                self.handle_input()?;
            }

            self.update();
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_input(&mut self) -> io::Result<()> {
        if let Event::Key(KeyEvent { code, .. }) = event::read()? {
            match code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.running = false;
                }
                KeyCode::Char('w') | KeyCode::Up => {
                    self.rotation.rotate(0.1, 0.0, 0.0);
                }
                KeyCode::Char('s') | KeyCode::Down => {
                    self.rotation.rotate(-0.1, 0.0, 0.0);
                }
                KeyCode::Char('a') | KeyCode::Left => {
                    self.rotation.rotate(0.0, -0.1, 0.0);
                }
                KeyCode::Char('d') | KeyCode::Right => {
                    self.rotation.rotate(0.0, 0.1, 0.0);
                }
                KeyCode::Char('e') => {
                    self.rotation.rotate(0.0, 0.0, 0.1);
                }
                KeyCode::Char('r') => {
                    self.rotation.rotate(0.0, 0.0, -0.1);
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn update(&mut self) {
        // Continuous slow rotation for demo effect
        self.rotation.rotate(0.01, 0.015, 0.0);
    }

    /// Record this frame's scene in world space.
    fn record(&mut self) -> prism_core::Result<()> {
        self.scene.clear();
        let mut placed = AffineTransformer3::new(self.rotation.to_affine(), &mut self.scene)?;
        record_cube(&mut placed, self.size)
    }

    fn rasterize(&mut self) -> prism_core::Result<()> {
        self.canvas.clear();
        let (width, height) = self.canvas.pixel_size();
        let mut projector =
            Projector::from_camera(&self.camera, width, height, Decomposer2::new(&mut self.canvas))?;
        projector.draw_scene(&self.scene)
    }

    fn render(&mut self) -> io::Result<()> {
        self.record().map_err(to_io)?;
        self.rasterize().map_err(to_io)?;

        // Output to terminal
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;

        self.canvas.draw(&mut stdout)?;

        // Draw UI overlay
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(TermColor::Yellow),
            Print(format!(
                "Prism Terminal | {} shapes | FPS: {:.1} | WASD/Arrows=Rotate E/R=Roll Q=Quit",
                self.scene.len(),
                self.fps
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::DrawCommand;

    #[test]
    fn test_cube_recording() {
        let mut scene = Scene::new();
        record_cube(&mut scene, 2.0).unwrap();
        let surfaces: Vec<_> = scene
            .commands()
            .iter()
            .filter(|recorded| matches!(recorded.command, DrawCommand::Surface { .. }))
            .collect();
        assert_eq!(surfaces.len(), 6);
        assert_eq!(scene.len(), 6 + 8 + 1);

        // Every face winds counter-clockwise seen from outside.
        for recorded in surfaces {
            if let DrawCommand::Surface { points, .. } = &recorded.command {
                let normal = (points[1] - points[0]).cross(&(points[2] - points[1]));
                assert!(normal.dot(&recorded.center.coords) > 0.0);
            }
        }
    }

    #[test]
    fn test_cube_reaches_the_canvas() {
        let mut scene = Scene::new();
        record_cube(&mut scene, 2.0).unwrap();
        let mut canvas = AsciiCanvas::new(40, 12);
        let (width, height) = canvas.pixel_size();
        let camera = Camera::new(width as u32, height as u32);
        Projector::from_camera(&camera, width, height, Decomposer2::new(&mut canvas))
            .unwrap()
            .draw_scene(&scene)
            .unwrap();
        assert_ne!(canvas.glyph_at(20, 6), Some(' '));
        assert_eq!(canvas.glyph_at(0, 0), Some(' '));
    }
}
