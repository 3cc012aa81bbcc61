use cloth_core::collider::ColliderScene;
use cloth_core::config::{ClothConfig, PinPattern, FIXED_TIME_STEP};
use cloth_core::error::ClothError;
use cloth_core::pose::Pose;
use cloth_core::ClothSimulation;
use glam::{Quat, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn small(dim: u32) -> ClothConfig {
    ClothConfig {
        dim,
        pin: PinPattern::None,
        constraint_level: 1,
        ..ClothConfig::default()
    }
}

fn empty_scene() -> ColliderScene {
    ColliderScene::new()
}

#[test]
fn test_grid_construction() {
    let cloth = ClothSimulation::new(small(5)).unwrap();
    let particles = cloth.particles();

    assert_eq!(particles.count, 25, "5x5 grid should have 25 particles");
    // 20 horizontal + 20 vertical + 32 diagonal
    assert_eq!(cloth.constraints().len(), 72, "5x5 level-1 grid should have 72 constraints");
    assert_eq!(cloth.indices().len(), 4 * 4 * 6);
    assert_eq!(cloth.ticks(), 0);
    assert_eq!(cloth.topology_version(), 0);

    let origin = ClothConfig::default().origin;
    assert_eq!(cloth.particle_position(0, 0).unwrap(), origin);
    let p = cloth.particle_position(2, 3).unwrap();
    assert!((p - (origin + Vec3::new(-0.5, -0.75, 0.0))).length() < 1e-6);
    assert_eq!(cloth.index(2, 3).unwrap(), 13);
}

#[test]
fn test_second_level_constraints() {
    let config = ClothConfig {
        constraint_level: 2,
        ..small(5)
    };
    let cloth = ClothSimulation::new(config).unwrap();
    // Level 2 adds 15 + 15 axis pairs and 18 diagonals.
    assert_eq!(cloth.constraints().len(), 120);

    let spacing = cloth.config().spacing;
    let longest = cloth
        .constraints()
        .iter()
        .map(|c| c.rest_length())
        .fold(0.0_f32, f32::max);
    assert!((longest - 2.0 * spacing * 2.0_f32.sqrt()).abs() < 1e-5);
}

#[test]
fn test_single_particle_cloth() {
    let cloth = ClothSimulation::new(ClothConfig {
        dim: 1,
        pin: PinPattern::None,
        ..ClothConfig::default()
    })
    .unwrap();

    assert_eq!(cloth.particles().count, 1);
    assert!(cloth.constraints().is_empty());
    assert!(cloth.indices().is_empty());
}

#[test]
fn test_top_corner_pins() {
    let cloth = ClothSimulation::new(ClothConfig::default()).unwrap();
    let movable = &cloth.particles().movable;

    let pinned: Vec<usize> = (0..movable.len()).filter(|&i| !movable[i]).collect();
    assert_eq!(pinned, vec![0, 20, 40, 340, 360, 380]);
}

#[test]
fn test_construction_errors() {
    let base = small(4);
    let cases = [
        ClothConfig { dim: 0, ..base.clone() },
        ClothConfig { spacing: 0.0, ..base.clone() },
        ClothConfig { spacing: f32::NAN, ..base.clone() },
        ClothConfig { particle_mass: -1.0, ..base.clone() },
        ClothConfig { damping: 1.0, ..base.clone() },
        ClothConfig { stiffness: -0.1, ..base.clone() },
        ClothConfig { friction: f32::INFINITY, ..base.clone() },
        ClothConfig { cut_multiplier: 0.5, ..base.clone() },
        ClothConfig { collision_skin: 0.9, ..base.clone() },
        ClothConfig { constraint_level: 4, ..base.clone() },
        ClothConfig { pin: PinPattern::TopCorners(5), ..base.clone() },
        ClothConfig { pin: PinPattern::Points(vec![(0, 4)]), ..base.clone() },
        ClothConfig { dim: 70_000, ..base.clone() },
        ClothConfig { collision_skin: 1.0, ..base.clone() },
        ClothConfig { gravity: Vec3::new(0.0, f32::NAN, 0.0), ..base.clone() },
        ClothConfig { origin: Vec3::splat(f32::INFINITY), ..base.clone() },
        ClothConfig { rotation: Quat::from_xyzw(0.0, 0.0, 0.0, 2.0), ..base.clone() },
        ClothConfig { rotation: Quat::from_xyzw(f32::NAN, 0.0, 0.0, 1.0), ..base.clone() },
    ];

    let results: Vec<_> = cases.into_iter().map(ClothSimulation::new).collect();
    assert!(matches!(results[0], Err(ClothError::InvalidDimension(0))));
    assert!(matches!(results[1], Err(ClothError::InvalidSpacing(_))));
    assert!(matches!(results[2], Err(ClothError::InvalidSpacing(_))));
    assert!(matches!(results[3], Err(ClothError::InvalidMass(_))));
    assert!(matches!(results[4], Err(ClothError::InvalidDamping(_))));
    assert!(matches!(results[5], Err(ClothError::InvalidCoefficient { name: "stiffness", .. })));
    assert!(matches!(results[6], Err(ClothError::InvalidCoefficient { name: "friction", .. })));
    assert!(matches!(results[7], Err(ClothError::InvalidCutMultiplier(_))));
    assert!(matches!(results[8], Err(ClothError::InvalidCollisionSkin(_))));
    assert!(matches!(
        results[9],
        Err(ClothError::NeighborRadiusOutOfRange { level: 4, dim: 4 })
    ));
    assert!(matches!(results[10], Err(ClothError::PinOutOfRange { x: 5, y: 0, dim: 4 })));
    assert!(matches!(results[11], Err(ClothError::PinOutOfRange { x: 0, y: 4, dim: 4 })));
    assert!(
        matches!(results[12], Err(ClothError::InvalidDimension(70_000))),
        "a grid whose particle count overflows u32 must be rejected, not panic"
    );
    assert!(matches!(results[13], Err(ClothError::InvalidCollisionSkin(_))));
    assert!(matches!(results[14], Err(ClothError::NonFiniteVector { name: "gravity" })));
    assert!(matches!(results[15], Err(ClothError::NonFiniteVector { name: "origin" })));
    assert!(matches!(results[16], Err(ClothError::InvalidRotation)));
    assert!(matches!(results[17], Err(ClothError::InvalidRotation)));
}

#[test]
fn test_largest_square_grid_passes_validation() {
    let config = ClothConfig {
        dim: 65_535,
        ..small(4)
    };
    assert_eq!(config.validate(), Ok(()), "65535^2 still fits in a u32 index");

    let config = ClothConfig { dim: 65_536, ..small(4) };
    assert_eq!(config.validate(), Err(ClothError::InvalidDimension(65_536)));
}

#[test]
fn test_rejected_reconfigure_keeps_finite_state() {
    let mut cloth = ClothSimulation::new(small(3)).unwrap();
    let result = cloth.reconfigure(ClothConfig {
        gravity: Vec3::new(f32::NAN, 0.0, 0.0),
        ..small(3)
    });
    assert!(result.is_err());

    cloth.step(FIXED_TIME_STEP, &empty_scene());
    assert!(cloth.positions().iter().all(|p| p.is_finite()));
}

#[test]
fn test_coordinate_queries_reject_out_of_range() {
    let mut cloth = ClothSimulation::new(small(3)).unwrap();

    assert!(matches!(
        cloth.index(3, 0),
        Err(ClothError::CoordinateOutOfRange { x: 3, y: 0, dim: 3 })
    ));
    assert!(cloth.pin(0, 3).is_err());
    assert!(cloth.unpin(7, 7).is_err());
    assert!(cloth.move_particle(3, 3, Vec3::ZERO).is_err());
    assert!(cloth.cut_particle(0, 9).is_err());
    assert!(cloth.particle_position(9, 0).is_err());
}

#[test]
fn test_grid_at_rest_is_unchanged() {
    let config = ClothConfig {
        spacing: 1.0,
        gravity: Vec3::ZERO,
        constraint_iterations: 0,
        ..small(4)
    };
    let mut cloth = ClothSimulation::new(config).unwrap();
    let before = cloth.positions().to_vec();

    cloth.step(FIXED_TIME_STEP, &empty_scene());

    for (i, (a, b)) in before.iter().zip(cloth.positions()).enumerate() {
        assert!((*a - *b).length() < 1e-6, "particle {i} moved from {a} to {b}");
    }
    assert_eq!(cloth.ticks(), 1);
}

#[test]
fn test_relaxation_at_rest_is_unchanged() {
    let config = ClothConfig {
        gravity: Vec3::ZERO,
        constraint_level: 2,
        ..small(5)
    };
    let mut cloth = ClothSimulation::new(config).unwrap();
    let before = cloth.positions().to_vec();

    for _ in 0..10 {
        cloth.step(FIXED_TIME_STEP, &empty_scene());
    }

    for (a, b) in before.iter().zip(cloth.positions()) {
        assert!((*a - *b).length() < 1e-5);
    }
}

#[test]
fn test_free_fall_preserves_shape() {
    let mut cloth = ClothSimulation::new(small(4)).unwrap();
    let before = cloth.positions().to_vec();

    for _ in 0..30 {
        cloth.step(FIXED_TIME_STEP, &empty_scene());
    }

    let drop = cloth.positions()[0] - before[0];
    assert!(drop.y < 0.0, "unpinned cloth should fall");
    for (a, b) in before.iter().zip(cloth.positions()) {
        assert!(
            ((*b - *a) - drop).length() < 1e-4,
            "uniform gravity should translate every particle equally"
        );
    }
}

#[test]
fn test_pinned_particles_never_move() {
    let config = ClothConfig {
        dim: 8,
        pin: PinPattern::TopCorners(2),
        ..ClothConfig::default()
    };
    let mut cloth = ClothSimulation::new(config).unwrap();

    let mut scene = ColliderScene::new();
    let floor = scene.add_pose(Pose::from_translation(Vec3::new(0.0, 2.0, 0.0)));
    scene.add_plane(floor).unwrap();
    let ball = scene.add_pose(Pose::from_translation(Vec3::new(1.6, 3.0, 0.0)));
    scene.add_sphere(ball, 0.5).unwrap();
    // Sphere overlapping a pinned corner.
    let corner = scene.add_pose(Pose::from_translation(cloth.particle_position(0, 0).unwrap()));
    scene.add_sphere(corner, 0.2).unwrap();

    let pinned: Vec<(usize, Vec3)> = (0..cloth.particles().count)
        .filter(|&i| !cloth.particles().movable[i])
        .map(|i| (i, cloth.positions()[i]))
        .collect();
    assert_eq!(pinned.len(), 4);

    let mut rng = StdRng::seed_from_u64(7);
    for tick in 0..120 {
        cloth.wind_force(Vec3::new(0.0, 0.0, 3.0));
        cloth.add_random_force(&mut rng, Vec3::X, -0.5, 5.5);
        cloth.step(FIXED_TIME_STEP, &scene);

        for &(i, p) in &pinned {
            assert_eq!(cloth.positions()[i], p, "pinned particle {i} moved at tick {tick}");
        }
    }

    for p in cloth.positions() {
        assert!(p.is_finite(), "simulation produced {p}");
    }
}

#[test]
fn test_hanging_cloth_sags() {
    let config = ClothConfig {
        dim: 6,
        pin: PinPattern::TopEdge,
        ..small(6)
    };
    let mut cloth = ClothSimulation::new(config).unwrap();
    let top = cloth.particle_position(3, 0).unwrap();
    let bottom = cloth.particle_position(3, 5).unwrap();

    for _ in 0..60 {
        cloth.step(FIXED_TIME_STEP, &empty_scene());
    }

    assert_eq!(cloth.particle_position(3, 0).unwrap(), top);
    assert!(
        cloth.particle_position(3, 5).unwrap().y < bottom.y,
        "bottom row should sag under gravity"
    );
}

#[test]
fn test_cloth_rests_on_plane() {
    let config = ClothConfig {
        origin: Vec3::ZERO,
        ..small(5)
    };
    let mut cloth = ClothSimulation::new(config).unwrap();

    let mut scene = ColliderScene::new();
    let floor = scene.add_pose(Pose::from_translation(Vec3::new(0.0, -1.5, 0.0)));
    scene.add_plane(floor).unwrap();

    for tick in 0..180 {
        cloth.step(FIXED_TIME_STEP, &scene);
        for (i, p) in cloth.positions().iter().enumerate() {
            assert!(p.y >= -1.5 - 1e-5, "particle {i} below the floor at tick {tick}: {p}");
        }
    }
}

#[test]
fn test_zero_and_invalid_dt_are_ignored() {
    let mut cloth = ClothSimulation::new(small(3)).unwrap();
    let before = cloth.positions().to_vec();

    cloth.step(0.0, &empty_scene());
    cloth.step(-1.0, &empty_scene());
    cloth.step(f32::NAN, &empty_scene());

    assert_eq!(cloth.positions(), &before[..]);
    assert_eq!(cloth.ticks(), 0);
}

#[test]
fn test_cut_keeps_indices_stable() {
    let mut cloth = ClothSimulation::new(small(4)).unwrap();
    let target = cloth.index(1, 1).unwrap();
    let surviving = cloth
        .constraints()
        .iter()
        .filter(|c| !c.involves(target as u32))
        .count();
    let positions = cloth.positions().to_vec();

    assert!(cloth.cut_particle(1, 1).unwrap(), "first cut changes topology");

    assert_eq!(cloth.index(1, 1).unwrap(), target);
    assert_eq!(cloth.positions(), &positions[..], "cutting must not move particles");
    assert_eq!(cloth.constraints().len(), surviving);
    assert!(cloth.constraints().iter().all(|c| !c.involves(target as u32)));
    assert!(!cloth.particles().renderable[target]);
    assert_eq!(
        cloth.particles().renderable.iter().filter(|&&r| r).count(),
        15,
        "only the cut particle is hidden"
    );
    // The six triangles around an interior particle disappear.
    assert_eq!(cloth.indices().len(), 54 - 18);
    assert!(cloth.indices().iter().all(|&i| i as usize != target));
    assert_eq!(cloth.topology_version(), 1);
}

#[test]
fn test_cut_is_idempotent() {
    let mut cloth = ClothSimulation::new(small(4)).unwrap();

    assert!(cloth.cut_particle(2, 2).unwrap());
    let constraints = cloth.constraints().len();
    let indices = cloth.indices().to_vec();

    assert!(!cloth.cut_particle(2, 2).unwrap(), "second cut is a no-op");
    assert_eq!(cloth.constraints().len(), constraints);
    assert_eq!(cloth.indices(), &indices[..]);
    assert_eq!(cloth.topology_version(), 1);
}

#[test]
fn test_overstretched_cloth_tears() {
    let config = ClothConfig {
        pin: PinPattern::Points(vec![(0, 0)]),
        gravity: Vec3::ZERO,
        cuttable: true,
        cut_multiplier: 1.5,
        ..small(5)
    };
    let mut cloth = ClothSimulation::new(config).unwrap();
    let constraints = cloth.constraints().len();
    let anchor = cloth.particle_position(0, 0).unwrap();

    cloth.move_particle(0, 0, anchor + Vec3::new(5.0, 0.0, 0.0)).unwrap();
    cloth.step(FIXED_TIME_STEP, &empty_scene());

    assert!(cloth.constraints().len() < constraints, "stretched constraints should break");
    assert!(cloth.topology_version() > 0);
    assert!(cloth.particles().renderable[0], "pinned anchor is never cut");

    let neighbor = cloth.index(0, 1).unwrap() as u32;
    assert!(!cloth.particles().renderable[neighbor as usize]);
    assert!(cloth.constraints().iter().all(|c| !c.involves(neighbor)));
}

#[test]
fn test_uncuttable_cloth_never_tears() {
    let config = ClothConfig {
        pin: PinPattern::Points(vec![(0, 0)]),
        gravity: Vec3::ZERO,
        cut_multiplier: 1.5,
        ..small(5)
    };
    let mut cloth = ClothSimulation::new(config).unwrap();
    let constraints = cloth.constraints().len();
    let anchor = cloth.particle_position(0, 0).unwrap();

    cloth.move_particle(0, 0, anchor + Vec3::new(5.0, 0.0, 0.0)).unwrap();
    for _ in 0..5 {
        cloth.step(FIXED_TIME_STEP, &empty_scene());
    }

    assert_eq!(cloth.constraints().len(), constraints);
    assert_eq!(cloth.topology_version(), 0);
}

#[test]
fn test_reconfigure() {
    let mut cloth = ClothSimulation::new(small(4)).unwrap();
    cloth.step(FIXED_TIME_STEP, &empty_scene());

    let err = cloth.reconfigure(ClothConfig { dim: 0, ..small(4) });
    assert_eq!(err, Err(ClothError::InvalidDimension(0)));
    assert_eq!(cloth.dim(), 4, "failed reconfigure keeps the old cloth");
    assert_eq!(cloth.ticks(), 1);

    cloth.reconfigure(small(6)).unwrap();
    assert_eq!(cloth.dim(), 6);
    assert_eq!(cloth.particles().count, 36);
    assert_eq!(cloth.ticks(), 0);
    assert_eq!(cloth.topology_version(), 1, "buffers must be re-uploaded");
}

#[test]
fn test_pin_and_unpin_at_runtime() {
    let mut cloth = ClothSimulation::new(small(3)).unwrap();
    let start = cloth.particle_position(1, 1).unwrap();

    cloth.pin(1, 1).unwrap();
    for _ in 0..10 {
        cloth.step(FIXED_TIME_STEP, &empty_scene());
    }
    assert_eq!(cloth.particle_position(1, 1).unwrap(), start);

    cloth.unpin(1, 1).unwrap();
    cloth.step(FIXED_TIME_STEP, &empty_scene());
    assert!(cloth.particle_position(1, 1).unwrap().y < start.y);
}

#[test]
fn test_wind_pushes_cloth_downwind() {
    let config = ClothConfig {
        gravity: Vec3::ZERO,
        ..small(5)
    };
    let mut cloth = ClothSimulation::new(config).unwrap();
    let mean_z = |c: &ClothSimulation| c.positions().iter().map(|p| p.z).sum::<f32>() / c.positions().len() as f32;
    let before = mean_z(&cloth);

    for _ in 0..5 {
        cloth.wind_force(Vec3::new(0.0, 0.0, 2.0));
        cloth.step(FIXED_TIME_STEP, &empty_scene());
    }

    assert!(mean_z(&cloth) > before, "wind along +Z should push the cloth along +Z");
}

#[test]
fn test_random_force_is_reproducible() {
    let run = |seed: u64| {
        let mut cloth = ClothSimulation::new(small(4)).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        for _ in 0..10 {
            cloth.add_random_force(&mut rng, Vec3::X, -0.5, 5.5);
            cloth.step(FIXED_TIME_STEP, &empty_scene());
        }
        cloth.positions().to_vec()
    };

    assert_eq!(run(42), run(42));
}

#[test]
fn test_vertex_export() {
    let mut cloth = ClothSimulation::new(small(4)).unwrap();
    let vertices = cloth.vertices();

    assert_eq!(vertices.len(), 16);
    for (v, p) in vertices.iter().zip(cloth.positions()) {
        assert_eq!(v.position, p.to_array());
        let n = Vec3::from_array(v.normal);
        assert!((n.length() - 1.0).abs() < 1e-5, "exported normals are unit length");
        assert!(n.z.abs() > 0.999, "flat grid in the XY plane faces along Z");
    }

    cloth.cut_particle(0, 0).unwrap();
    let mut buffer = Vec::new();
    cloth.write_vertices(&mut buffer);
    assert_eq!(buffer.len(), 16, "vertex count is fixed, only indices shrink");
    assert!(cloth.indices().len() < 54);
}
