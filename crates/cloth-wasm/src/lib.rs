use cloth_core::{
    ClothConfig, ClothSimulation, ClothVertex, ColliderScene, FixedStepScheduler, FrameStats,
    PinPattern, Pose, PoseHandle, SolveMode,
};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use wasm_bindgen::prelude::*;

fn js_err(e: cloth_core::ClothError) -> JsError {
    JsError::new(&e.to_string())
}

/// Gust parameters: direction plus an intensity range.
struct Gust {
    direction: Vec3,
    min: f32,
    max: f32,
}

#[wasm_bindgen]
pub struct ClothWorld {
    cloth: ClothSimulation,
    scene: ColliderScene,
    scheduler: FixedStepScheduler,
    stats: FrameStats,
    sphere_pose: PoseHandle,
    rng: StdRng,
    wind: Vec3,
    gust: Option<Gust>,
    last_frame: Option<f64>,
    /// Wall time spent in the last `frame` call, in milliseconds.
    step_ms: f64,
    vertex_buffer: Vec<ClothVertex>,
}

#[wasm_bindgen]
impl ClothWorld {
    #[wasm_bindgen(constructor)]
    pub fn new(dim: u32, spacing: f32) -> Result<ClothWorld, JsError> {
        let world = Self::build(dim, spacing).map_err(js_err)?;
        web_sys::console::log_1(
            &format!(
                "WASM ClothWorld created: {} particles, {} constraints",
                world.cloth.particles().count,
                world.cloth.constraints().len()
            )
            .into(),
        );
        Ok(world)
    }

    /// Start the fixed-step clock at `now` (seconds).
    #[wasm_bindgen]
    pub fn start(&mut self, now: f64) {
        self.scheduler.start(now);
        self.last_frame = Some(now);
    }

    #[wasm_bindgen]
    pub fn pause(&mut self) {
        self.scheduler.pause();
    }

    #[wasm_bindgen]
    pub fn resume(&mut self, now: f64) {
        self.scheduler.resume(now);
        self.last_frame = Some(now);
    }

    /// Run every fixed tick due before `now` (seconds) and refresh the vertex
    /// buffer. Returns the number of ticks executed.
    #[wasm_bindgen]
    pub fn frame(&mut self, now: f64) -> u32 {
        if let Some(last) = self.last_frame.replace(now) {
            self.stats.record(now - last);
        }

        let start = js_sys::Date::now();
        let report = self.scheduler.advance(now, |dt| {
            if self.wind != Vec3::ZERO {
                self.cloth.wind_force(self.wind);
            }
            if let Some(gust) = &self.gust {
                self.cloth
                    .add_random_force(&mut self.rng, gust.direction, gust.min, gust.max);
            }
            self.cloth.step(dt, &self.scene);
        });

        if report.ticks > 0 {
            self.write_gpu_output();
        }
        self.step_ms = js_sys::Date::now() - start;
        report.ticks
    }

    #[wasm_bindgen]
    pub fn set_sphere_position(&mut self, x: f32, y: f32, z: f32) {
        self.scene
            .set_pose(self.sphere_pose, Pose::from_translation(Vec3::new(x, y, z)));
    }

    #[wasm_bindgen]
    pub fn set_wind(&mut self, x: f32, y: f32, z: f32) {
        self.wind = Vec3::new(x, y, z);
    }

    /// Random-intensity gust along `(x, y, z)`; pass `min == max == 0` to disable.
    #[wasm_bindgen]
    pub fn set_gust(&mut self, x: f32, y: f32, z: f32, min: f32, max: f32) {
        self.gust = if min == 0.0 && max == 0.0 {
            None
        } else {
            Some(Gust {
                direction: Vec3::new(x, y, z),
                min,
                max,
            })
        };
    }

    /// Rebuild the cloth from new parameters.
    ///
    /// `solve_mode`: 0 = positional, 1 = force, 2 = force with friction.
    #[wasm_bindgen]
    pub fn configure(
        &mut self,
        dim: u32,
        spacing: f32,
        stiffness: f32,
        friction: f32,
        constraint_iterations: u32,
        collision_iterations: u32,
        constraint_level: u32,
        cuttable: bool,
        cut_multiplier: f32,
        solve_mode: u8,
    ) -> Result<(), JsError> {
        let config = ClothConfig {
            dim,
            spacing,
            stiffness,
            friction,
            constraint_iterations,
            collision_iterations,
            constraint_level,
            cuttable,
            cut_multiplier,
            solve_mode: match solve_mode {
                1 => SolveMode::Force,
                2 => SolveMode::ForceWithFriction,
                _ => SolveMode::Positional,
            },
            pin: PinPattern::TopCorners(dim.min(3)),
            ..self.cloth.config().clone()
        };
        self.cloth.reconfigure(config).map_err(js_err)?;
        self.write_gpu_output();
        Ok(())
    }

    #[wasm_bindgen]
    pub fn pin(&mut self, x: u32, y: u32) -> Result<(), JsError> {
        self.cloth.pin(x, y).map_err(js_err)
    }

    #[wasm_bindgen]
    pub fn unpin(&mut self, x: u32, y: u32) -> Result<(), JsError> {
        self.cloth.unpin(x, y).map_err(js_err)
    }

    #[wasm_bindgen]
    pub fn move_particle(&mut self, x: u32, y: u32, px: f32, py: f32, pz: f32) -> Result<(), JsError> {
        self.cloth
            .move_particle(x, y, Vec3::new(px, py, pz))
            .map_err(js_err)?;
        self.write_gpu_output();
        Ok(())
    }

    #[wasm_bindgen]
    pub fn cut_particle(&mut self, x: u32, y: u32) -> Result<bool, JsError> {
        self.cloth.cut_particle(x, y).map_err(js_err)
    }

    #[wasm_bindgen]
    pub fn get_vertex_buffer_ptr(&self) -> *const f32 {
        self.vertex_buffer.as_ptr() as *const f32
    }

    #[wasm_bindgen]
    pub fn get_vertex_buffer_byte_length(&self) -> usize {
        bytemuck::cast_slice::<ClothVertex, u8>(&self.vertex_buffer).len()
    }

    #[wasm_bindgen]
    pub fn get_index_buffer_ptr(&self) -> *const u32 {
        self.cloth.indices().as_ptr()
    }

    #[wasm_bindgen]
    pub fn index_count(&self) -> usize {
        self.cloth.indices().len()
    }

    /// Changes whenever the index buffer must be re-uploaded.
    #[wasm_bindgen]
    pub fn topology_version(&self) -> u64 {
        self.cloth.topology_version()
    }

    #[wasm_bindgen]
    pub fn particle_count(&self) -> usize {
        self.cloth.particles().count
    }

    #[wasm_bindgen]
    pub fn framerate(&self) -> f64 {
        self.stats.framerate()
    }

    #[wasm_bindgen]
    pub fn step_time_ms(&self) -> f64 {
        self.step_ms
    }
}

impl ClothWorld {
    /// Cloth with the default scene: a ground plane at y = -2 and a unit
    /// sphere at the origin.
    fn build(dim: u32, spacing: f32) -> cloth_core::Result<ClothWorld> {
        let config = ClothConfig {
            dim,
            spacing,
            pin: PinPattern::TopCorners(dim.min(3)),
            ..ClothConfig::default()
        };
        let cloth = ClothSimulation::new(config)?;

        let mut scene = ColliderScene::new();
        let ground = scene.add_pose(Pose::from_translation(Vec3::new(0.0, -2.0, 0.0)));
        scene.add_plane(ground)?;
        let sphere_pose = scene.add_pose(Pose::from_translation(Vec3::ZERO));
        scene.add_sphere(sphere_pose, 1.0)?;

        let mut world = ClothWorld {
            cloth,
            scene,
            scheduler: FixedStepScheduler::default(),
            stats: FrameStats::new(60, 30),
            sphere_pose,
            rng: StdRng::from_entropy(),
            wind: Vec3::ZERO,
            gust: None,
            last_frame: None,
            step_ms: 0.0,
            vertex_buffer: Vec::new(),
        };
        world.write_gpu_output();
        Ok(world)
    }

    fn write_gpu_output(&mut self) {
        self.cloth.write_vertices(&mut self.vertex_buffer);
    }
}
