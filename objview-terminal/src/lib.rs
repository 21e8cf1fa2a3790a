/// Terminal-based ASCII viewer for editable OBJ meshes
use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use nalgebra::{Point3, Vector3};
use objview_core::{Camera, HostDevice, MeshGeometry, MeshStore, ModelTransform};
use std::io::{stdout, Write};
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub mod renderer;

pub use renderer::{AsciiRenderer, ShadingMode};

/// Model scale change per key press
pub const SCALE_STEP: f32 = 0.05;
/// Model translation per key press
pub const TRANSLATE_STEP: f32 = 0.05;
/// Model rotation per key press, in degrees
pub const ROTATION_STEP: f32 = 5.0;
/// Auto-rotation per frame about y, in degrees
pub const SPIN_STEP: f32 = 0.9;

/// Viewer start-up settings.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub model: ModelTransform,
    pub shading: ShadingMode,
    pub spin: bool,
    pub target_fps: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            model: ModelTransform::identity(),
            shading: ShadingMode::Flat,
            spin: false,
            target_fps: 30,
        }
    }
}

/// Edits applied to the stored geometry, as opposed to the model transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeometryEdit {
    Translate(Vector3<f32>),
    Rotate { axis: Vector3<f32>, degrees: f32 },
    Scale(Vector3<f32>),
    Reflect { point: Point3<f32>, normal: Vector3<f32> },
}

impl GeometryEdit {
    /// The edit bound to a digit key, if any.
    pub fn for_key(c: char) -> Option<Self> {
        match c {
            '0' => Some(GeometryEdit::Translate(Vector3::new(0.0, 0.05, 0.01))),
            '9' => Some(GeometryEdit::Rotate {
                axis: Vector3::new(1.0, 1.0, 1.0),
                degrees: 2.0,
            }),
            '8' => Some(GeometryEdit::Scale(Vector3::new(1.001, 1.0, 1.0))),
            '7' => Some(GeometryEdit::Reflect {
                point: Point3::origin(),
                normal: Vector3::z(),
            }),
            _ => None,
        }
    }

    pub fn apply(&self, store: &mut MeshStore<HostDevice>) -> objview_core::Result<()> {
        match *self {
            GeometryEdit::Translate(delta) => store.translate(delta),
            GeometryEdit::Rotate { axis, degrees } => store.rotate(axis, degrees),
            GeometryEdit::Scale(s) => store.scale(s.x, s.y, s.z),
            GeometryEdit::Reflect { point, normal } => store.reflect(point, normal),
        }
    }
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    store: MeshStore<HostDevice>,
    model: ModelTransform,
    camera: Camera,
    renderer: AsciiRenderer,
    shading: ShadingMode,
    spin: bool,
    frame_time: Duration,
    status: Option<String>,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(geometry: MeshGeometry, config: ViewerConfig) -> Result<Self> {
        let (width, height) = terminal::size().context("Failed to query terminal size")?;
        let store = MeshStore::new(geometry, HostDevice::new())?;

        Ok(Self {
            store,
            model: config.model,
            camera: Camera::new(width as u32, height as u32),
            renderer: AsciiRenderer::new(width as usize, height as usize),
            shading: config.shading,
            spin: config.spin,
            frame_time: Duration::from_millis(1000 / config.target_fps.max(1)),
            status: None,
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn store(&self) -> &MeshStore<HostDevice> {
        &self.store
    }

    pub fn run(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> Result<()> {
        while self.running {
            let frame_start = Instant::now();

            // Handle input
            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?);
            }

            // Update
            self.update();

            // Render
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < self.frame_time {
                std::thread::sleep(self.frame_time - elapsed);
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

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press | KeyEventKind::Repeat,
                ..
            }) => self.handle_key(code),
            Event::Resize(width, height) => {
                self.camera.set_viewport(width as u32, height as u32);
                self.renderer.resize(width as usize, height as usize);
            }
            _ => {}
        }
    }

    /// Apply one key press to the model transform or the stored geometry.
    pub fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
            }
            KeyCode::Char(' ') => {
                self.shading = self.shading.next();
                info!(shading = self.shading.name(), "shading mode changed");
            }
            KeyCode::Char('e') => self.model.scale_by(SCALE_STEP),
            KeyCode::Char('r') => self.model.scale_by(-SCALE_STEP),
            KeyCode::Char('t') => self.model.translate_by(TRANSLATE_STEP, 0.0, 0.0),
            KeyCode::Char('y') => self.model.translate_by(-TRANSLATE_STEP, 0.0, 0.0),
            KeyCode::Char('u') => self.model.translate_by(0.0, TRANSLATE_STEP, 0.0),
            KeyCode::Char('i') => self.model.translate_by(0.0, -TRANSLATE_STEP, 0.0),
            KeyCode::Char('o') => self.model.translate_by(0.0, 0.0, TRANSLATE_STEP),
            KeyCode::Char('p') => self.model.translate_by(0.0, 0.0, -TRANSLATE_STEP),
            KeyCode::Char('a') | KeyCode::Up => self.model.rotate_by(ROTATION_STEP, 0.0, 0.0),
            KeyCode::Char('s') | KeyCode::Down => self.model.rotate_by(-ROTATION_STEP, 0.0, 0.0),
            KeyCode::Char('d') | KeyCode::Right => self.model.rotate_by(0.0, ROTATION_STEP, 0.0),
            KeyCode::Char('f') | KeyCode::Left => self.model.rotate_by(0.0, -ROTATION_STEP, 0.0),
            KeyCode::Char('g') => self.model.rotate_by(0.0, 0.0, ROTATION_STEP),
            KeyCode::Char('h') => self.model.rotate_by(0.0, 0.0, -ROTATION_STEP),
            KeyCode::Char(c) => {
                if let Some(edit) = GeometryEdit::for_key(c) {
                    self.status = match edit.apply(&mut self.store) {
                        Ok(()) => None,
                        Err(e) => {
                            warn!(error = %e, ?edit, "geometry edit failed");
                            Some(e.to_string())
                        }
                    };
                }
            }
            _ => {}
        }
    }

    fn update(&mut self) {
        if self.spin {
            self.model.rotate_by(0.0, SPIN_STEP, 0.0);
        }
    }

    fn render(&mut self) -> Result<()> {
        let model = self.model.model_matrix();

        // Clear renderer
        self.renderer.clear();

        // Render the derived buffer, if the last rebuild produced one
        if let Some(buffer) = self.store.buffer() {
            self.renderer
                .render_buffer(buffer, &model, &self.camera, self.shading);
        }

        // Output to terminal
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;

        self.renderer.draw(&mut stdout)?;

        // Draw UI overlay
        let geometry = self.store.geometry();
        let header = match &self.status {
            Some(message) => format!("objview | error: {}", message),
            None => format!(
                "objview | FPS: {:.1} | V: {} F: {} | shading: {} | E/R scale T-P move A-H rotate 0/9/8/7 edit mesh SPACE shading Q quit",
                self.fps,
                geometry.vertex_count(),
                geometry.face_count(),
                self.shading.name(),
            ),
        };
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(header),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}
