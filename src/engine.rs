use log::{debug, trace};

use crate::area::{AreaDef, AreaError, ScriptLibrary};
use crate::input::{ControlMap, Controls};
use crate::renderer::{SheetLayouts, Surface, draw_world};
use crate::world::{TickReport, World};

/// Longest wall-clock gap one `advance` will simulate.  Anything longer
/// (debugger pause, window drag) is dropped instead of replayed.
pub const MAX_FRAME_TIME: f64 = 0.25;

// ── FrameLoop ────────────────────────────────────────────────────────────────

/// Fixed-timestep accumulator: wall-clock time goes in, whole logic ticks
/// come out.
#[derive(Debug, Clone)]
pub struct FrameLoop {
    fixed_dt: f64,
    accumulator: f64,
    tick: u64,
}

impl FrameLoop {
    /// `ups` is clamped to at least 1.
    pub fn new(ups: u32) -> Self {
        Self { fixed_dt: 1.0 / ups.max(1) as f64, accumulator: 0.0, tick: 0 }
    }

    pub fn fixed_dt(&self) -> f64 { self.fixed_dt }

    /// Ticks released by [`advance`](Self::advance) since creation.
    pub fn tick(&self) -> u64 { self.tick }

    /// Fraction of a tick left in the accumulator, in `[0, 1)`.
    pub fn alpha(&self) -> f64 { self.accumulator / self.fixed_dt }

    /// Add `elapsed` seconds (capped at [`MAX_FRAME_TIME`]) and return how
    /// many whole ticks are now due.  The caller runs that many ticks.
    pub fn advance(&mut self, elapsed: f64) -> u32 {
        self.accumulator += elapsed.clamp(0.0, MAX_FRAME_TIME);
        let mut due = 0;
        while self.accumulator >= self.fixed_dt {
            self.accumulator -= self.fixed_dt;
            self.tick += 1;
            due += 1;
        }
        due
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

// ── Engine ───────────────────────────────────────────────────────────────────

/// The running game: world, input and timing.
///
/// A windowed host forwards events with `controls.handle_window_event`,
/// calls [`Engine::update`] with the frame's elapsed time and then
/// [`Engine::render`].
pub struct Engine {
    pub world: World,
    pub controls: Controls,
    pub library: ScriptLibrary,
    frame_loop: FrameLoop,
    ticks: u64,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn frame_loop(&self) -> &FrameLoop { &self.frame_loop }

    /// Logic ticks run so far, whether due from [`update`](Self::update) or
    /// called directly.
    pub fn ticks(&self) -> u64 { self.ticks }

    /// Run one logic tick now, outside the accumulator.
    pub fn tick(&mut self) -> TickReport {
        self.ticks += 1;
        trace!("tick {}", self.ticks);
        self.world.step(&self.controls)
    }

    /// Advance wall-clock time by `elapsed` seconds and run every tick that
    /// became due.  Reports of failing ticks are collected in order.
    pub fn update(&mut self, elapsed: f64) -> Vec<TickReport> {
        let due = self.frame_loop.advance(elapsed);
        (0..due).map(|_| self.tick()).filter(|r| !r.is_clean()).collect()
    }

    /// Draw the current world state.  Never interleaves with a tick.
    pub fn render(&self, surface: &mut dyn Surface, layouts: &SheetLayouts, camera: (i32, i32)) {
        draw_world(surface, &self.world, layouts, camera);
    }

    /// Unload the current area and load `area` in its place.  On error the
    /// current area stays loaded.
    pub fn load_area(&mut self, area: &AreaDef) -> Result<(), AreaError> {
        area.load_into(&mut self.world, &self.library, &self.controls)?;
        self.frame_loop.reset();
        Ok(())
    }

    pub fn unload(&mut self) {
        self.world.clear();
        self.frame_loop.reset();
    }
}

// ── EngineBuilder ───────────────────────────────────────────────────────────

pub struct EngineBuilder {
    target_ups: u32,
    area: Option<AreaDef>,
    controls: ControlMap,
    library: ScriptLibrary,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            target_ups: 60,
            area: None,
            controls: ControlMap::default_bindings(),
            library: ScriptLibrary::new(),
        }
    }
}

impl EngineBuilder {
    pub fn with_ups(mut self, ups: u32) -> Self { self.target_ups = ups; self }
    pub fn with_area(mut self, area: AreaDef) -> Self { self.area = Some(area); self }
    pub fn with_controls(mut self, controls: ControlMap) -> Self { self.controls = controls; self }
    pub fn with_library(mut self, library: ScriptLibrary) -> Self { self.library = library; self }

    /// Load every `*.jos` script under `path` into the library.
    pub fn with_script_folder(mut self, path: &str) -> Result<Self, AreaError> {
        self.library.load_folder(path)?;
        Ok(self)
    }

    pub fn build(self) -> Result<Engine, AreaError> {
        let mut engine = Engine {
            world: World::new(),
            controls: Controls::new(self.controls),
            library: self.library,
            frame_loop: FrameLoop::new(self.target_ups),
            ticks: 0,
        };
        if let Some(area) = &self.area {
            engine.load_area(area)?;
        }
        debug!("engine ready at {} ups", self.target_ups.max(1));
        Ok(engine)
    }
}
