use glam::Vec2;
use gridbonk::*;

fn main() -> Result<(), CollisionError> {
    env_logger::init();

    let mut layers = LayerRegistry::new();
    let player = layers.register("Player")?;
    let enemy = layers.register("Enemy")?;
    let wall = layers.register("Wall")?;

    let cfg = WorldConfig::from_toml_str("cell_size = 16.0\n")?;
    let mut world = CollisionWorld::new(cfg)?;

    let mut set = ColliderSet::new();
    let hero = set.insert(BoxCollider::new(0.0, 0.0, 10.0, 20.0).with_layer(player).dynamic());
    let grunt = set.insert(BoxCollider::new(30.0, 0.0, 10.0, 20.0).with_layer(enemy).dynamic());
    let bullet = set.insert(
        BoxCollider::new(-60.0, 40.0, 2.0, 2.0)
            .with_layer(player)
            .dynamic()
            .with_detection(DetectionType::Continuous),
    );
    set.insert(BoxCollider::new(20.0, 30.0, 1.0, 30.0).with_layer(wall));

    let handles: Vec<ColliderHandle> = set.iter().map(|(h, _)| h).collect();
    for h in handles {
        world.add_collider(&set, h)?;
    }

    let names = layers.clone();
    let report = move |c: &ContactInfo| {
        println!(
            "  {:?} ({}) -> {:?} ({}) n=({:.0},{:.0}) depth={:.2}",
            c.a,
            names.name_of(c.layer_a).unwrap_or("?"),
            c.b,
            names.name_of(c.layer_b).unwrap_or("?"),
            c.normal.x,
            c.normal.y,
            c.depth
        );
    };
    let mut profile = CollisionProfile::new();
    profile.on(player, enemy, report.clone());
    profile.on(player, wall, report);
    world.set_profile(profile);

    for tick in 1..=5 {
        println!("tick {}", tick);
        world.check_for_collisions(&set, 1.0 / 60.0);

        set.get_mut(hero).unwrap().translate(Vec2::new(5.0, 0.0));
        set.get_mut(grunt).unwrap().translate(Vec2::new(-5.0, 0.0));
        set.get_mut(bullet).unwrap().translate(Vec2::new(45.0, 0.0));
        for h in [hero, grunt, bullet] {
            world.update_collider(&set, h)?;
        }
    }

    let stats = world.debug_stats();
    println!(
        "colliders={} dynamic={} cells={} entries={} candidate_pairs={}",
        stats.colliders, stats.dynamic, stats.cells, stats.grid_entries, stats.candidate_pairs
    );
    Ok(())
}
