use glam::Vec3;
use rand::Rng;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::collider::ColliderScene;
use crate::config::{ClothConfig, PinPattern};
use crate::constraints::distance::{solve_distance_constraints, DistanceConstraint, SolveParams};
use crate::cut::CutQueue;
use crate::error::{ClothError, Result};
use crate::forces::wind::{apply_wind, random_gust};
use crate::mesh::{accumulate_normals, build_triangle_indices, export_vertices, grid_index, ClothVertex};
use crate::particle::ParticleSet;
use crate::pose::Pose;

/// A square mass-spring cloth.
///
/// Particle `(x, y)` lives at index `x * dim + y` for the lifetime of the
/// simulation. Constraints reference particles by index; cutting removes
/// constraints and hides particles but never reorders the particle array.
pub struct ClothSimulation {
    config: ClothConfig,
    particles: ParticleSet,
    constraints: Vec<DistanceConstraint>,
    cuts: CutQueue,
    /// Triangle list over renderable particles, rebuilt on every topology change.
    indices: Vec<u32>,
    topology_version: u64,
    ticks: u64,
}

impl ClothSimulation {
    /// Validate `config` and build the particle grid and its constraints.
    pub fn new(config: ClothConfig) -> Result<Self> {
        config.validate()?;

        let particles = build_particles(&config);
        let constraints = build_constraints(&config, &particles);

        log::debug!(
            "cloth built: {0}x{0} grid, {1} particles, {2} constraints",
            config.dim,
            particles.count,
            constraints.len()
        );

        let mut cloth = Self {
            config,
            particles,
            constraints,
            cuts: CutQueue::new(),
            indices: Vec::new(),
            topology_version: 0,
            ticks: 0,
        };
        cloth.rebuild_indices();
        accumulate_normals(&mut cloth.particles, &cloth.indices);
        Ok(cloth)
    }

    /// Rebuild the whole simulation from new parameters.
    ///
    /// On error the current state is left untouched.
    pub fn reconfigure(&mut self, config: ClothConfig) -> Result<()> {
        let rebuilt = Self::new(config)?;
        let version = self.topology_version + 1;
        *self = rebuilt;
        self.topology_version = version;
        log::debug!("cloth reconfigured");
        Ok(())
    }

    /// Advance the cloth by one fixed tick of `dt` seconds.
    ///
    /// Forces, then integration, then constraint relaxation, then collisions,
    /// then cuts. Non-positive or non-finite `dt` is ignored.
    pub fn step(&mut self, dt: f32, scene: &ColliderScene) {
        if !(dt.is_finite() && dt > 1.0e-9) {
            log::trace!("ignoring step with dt={dt}");
            return;
        }

        // STEP 1: Forces (externally queued forces are already accumulated)
        self.particles.add_acceleration_all(self.config.gravity);

        // STEP 2: Verlet integration
        self.particles.integrate(dt, self.config.damping);

        // STEP 3: Constraint relaxation
        self.particles.display_force.fill(0.0);
        let params = SolveParams {
            mode: self.config.solve_mode,
            stiffness: self.config.stiffness,
            friction: self.config.friction,
            dt,
        };
        for _iter in 0..self.config.constraint_iterations {
            solve_distance_constraints(&self.constraints, &mut self.particles, &params, &mut self.cuts);
        }

        // STEP 4: Collisions
        if !scene.is_empty() {
            for _iter in 0..self.config.collision_iterations {
                self.resolve_collisions(scene);
            }
        }

        // STEP 5: Cuts
        self.process_cuts();

        accumulate_normals(&mut self.particles, &self.indices);
        self.ticks += 1;
    }

    fn resolve_collisions(&mut self, scene: &ColliderScene) {
        let skin = self.config.collision_skin;

        #[cfg(feature = "parallel")]
        {
            self.particles
                .position
                .par_iter_mut()
                .zip(self.particles.movable.par_iter())
                .for_each(|(pos, &movable)| {
                    if movable {
                        *pos = scene.resolve_point(*pos, skin);
                    }
                });
        }

        #[cfg(not(feature = "parallel"))]
        {
            for i in 0..self.particles.count {
                if self.particles.movable[i] {
                    self.particles.position[i] = scene.resolve_point(self.particles.position[i], skin);
                }
            }
        }
    }

    /// Drain the cut queue: detach every flagged particle from all its
    /// constraints and hide it from the mesh. Returns the number of
    /// constraints removed.
    fn process_cuts(&mut self) -> usize {
        if self.cuts.is_empty() {
            return 0;
        }

        let mut flagged = vec![false; self.particles.count];
        let mut hidden = 0;
        for p in self.cuts.drain() {
            let p = p as usize;
            flagged[p] = true;
            if self.particles.renderable[p] {
                self.particles.renderable[p] = false;
                hidden += 1;
            }
        }

        let before = self.constraints.len();
        self.constraints
            .retain(|c| !flagged[c.i as usize] && !flagged[c.j as usize]);
        let removed = before - self.constraints.len();

        if hidden > 0 || removed > 0 {
            log::debug!("cut {hidden} particles, removed {removed} constraints");
            self.rebuild_indices();
            self.topology_version += 1;
        }
        removed
    }

    fn rebuild_indices(&mut self) {
        self.indices = build_triangle_indices(self.config.dim, &self.particles.renderable);
    }

    // ---------- external forces ----------

    /// Add `f` to every particle; consumed by the next step.
    pub fn add_force(&mut self, f: Vec3) {
        self.particles.add_force_all(f);
    }

    /// Add wind along `direction`, weighted per triangle by projected area.
    pub fn wind_force(&mut self, direction: Vec3) {
        apply_wind(&mut self.particles, &self.indices, direction);
    }

    /// Add a gust along `direction` with random intensity in `[min, max)`.
    pub fn add_random_force<R: Rng + ?Sized>(&mut self, rng: &mut R, direction: Vec3, min: f32, max: f32) {
        let gust = random_gust(rng, direction, min, max);
        self.particles.add_force_all(gust);
    }

    // ---------- grid queries ----------

    /// Linear particle index of grid coordinate `(x, y)`.
    pub fn index(&self, x: u32, y: u32) -> Result<usize> {
        let dim = self.config.dim;
        if x >= dim || y >= dim {
            return Err(ClothError::CoordinateOutOfRange { x, y, dim });
        }
        Ok(grid_index(dim, x, y))
    }

    pub fn particle_position(&self, x: u32, y: u32) -> Result<Vec3> {
        Ok(self.particles.position[self.index(x, y)?])
    }

    pub fn pin(&mut self, x: u32, y: u32) -> Result<()> {
        let i = self.index(x, y)?;
        self.particles.pin(i);
        Ok(())
    }

    pub fn unpin(&mut self, x: u32, y: u32) -> Result<()> {
        let i = self.index(x, y)?;
        self.particles.unpin(i);
        Ok(())
    }

    /// Teleport particle `(x, y)`, e.g. to drag a pinned corner.
    pub fn move_particle(&mut self, x: u32, y: u32, position: Vec3) -> Result<()> {
        let i = self.index(x, y)?;
        self.particles.set_position(i, position);
        Ok(())
    }

    /// Detach particle `(x, y)` immediately. Cutting an already detached
    /// particle is a no-op. Returns `true` if the topology changed.
    pub fn cut_particle(&mut self, x: u32, y: u32) -> Result<bool> {
        let i = self.index(x, y)?;
        let version = self.topology_version;
        self.cuts.push(i as u32);
        self.process_cuts();
        Ok(self.topology_version != version)
    }

    // ---------- accessors ----------

    pub fn config(&self) -> &ClothConfig {
        &self.config
    }

    pub fn dim(&self) -> u32 {
        self.config.dim
    }

    /// World placement of grid coordinate (0, 0) and the grid plane.
    pub fn pose(&self) -> Pose {
        Pose::new(self.config.origin, self.config.rotation)
    }

    pub fn particles(&self) -> &ParticleSet {
        &self.particles
    }

    pub fn constraints(&self) -> &[DistanceConstraint] {
        &self.constraints
    }

    /// Number of completed ticks since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Incremented whenever the triangle list changes.
    pub fn topology_version(&self) -> u64 {
        self.topology_version
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.particles.position
    }

    /// Accumulated, non-normalized normals.
    pub fn normals(&self) -> &[Vec3] {
        &self.particles.normal
    }

    pub fn display_forces(&self) -> &[f32] {
        &self.particles.display_force
    }

    /// Triangle list over renderable particles.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Fill `out` with one vertex per particle, in particle order.
    pub fn write_vertices(&self, out: &mut Vec<ClothVertex>) {
        export_vertices(&self.particles, out);
    }

    pub fn vertices(&self) -> Vec<ClothVertex> {
        let mut out = Vec::with_capacity(self.particles.count);
        self.write_vertices(&mut out);
        out
    }
}

fn build_particles(config: &ClothConfig) -> ParticleSet {
    let dim = config.dim;
    let mut positions = Vec::with_capacity((dim * dim) as usize);
    for x in 0..dim {
        for y in 0..dim {
            let local = Vec3::new(-(x as f32) * config.spacing, -(y as f32) * config.spacing, 0.0);
            positions.push(config.origin + config.rotation * local);
        }
    }
    let mut particles = ParticleSet::from_positions(&positions, config.particle_mass);

    match &config.pin {
        PinPattern::None => {}
        PinPattern::TopCorners(n) => {
            for i in 0..*n {
                particles.pin(grid_index(dim, i, 0));
                particles.pin(grid_index(dim, dim - 1 - i, 0));
            }
        }
        PinPattern::TopEdge => {
            for x in 0..dim {
                particles.pin(grid_index(dim, x, 0));
            }
        }
        PinPattern::Points(points) => {
            for &(x, y) in points {
                particles.pin(grid_index(dim, x, y));
            }
        }
    }
    particles
}

/// Connect each particle to its axis-aligned and diagonal neighbors at every
/// radius from 1 to `constraint_level`.
fn build_constraints(config: &ClothConfig, particles: &ParticleSet) -> Vec<DistanceConstraint> {
    let dim = config.dim;
    let idx = |x: u32, y: u32| grid_index(dim, x, y) as u32;
    let make = |a: u32, b: u32| {
        let c = DistanceConstraint::between(particles, a, b);
        if config.cuttable {
            c.with_cutting(config.cut_multiplier)
        } else {
            c
        }
    };

    let mut constraints = Vec::new();
    for r in 1..=config.constraint_level {
        for x in 0..dim {
            for y in 0..dim {
                let right = x + r < dim;
                let down = y + r < dim;
                if right {
                    constraints.push(make(idx(x, y), idx(x + r, y)));
                }
                if down {
                    constraints.push(make(idx(x, y), idx(x, y + r)));
                }
                if right && down {
                    constraints.push(make(idx(x, y), idx(x + r, y + r)));
                    constraints.push(make(idx(x + r, y), idx(x, y + r)));
                }
            }
        }
    }
    constraints
}
