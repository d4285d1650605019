//! The BVH must answer every ray exactly like a linear scan of the roots.

use lux_math::{Color, Interval, Ray, Vec3};
use lux_renderer::primitives::Axis;
use lux_renderer::{AaRect, BvhNode, Lambertian, Primitive, Scene};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_point(rng: &mut StdRng, extent: f32) -> Vec3 {
    Vec3::new(
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
    )
}

fn random_scene(rng: &mut StdRng, count: usize) -> Scene {
    let mut scene = Scene::new();
    let grey = scene.add_material(Lambertian::new(Color::splat(0.5)));
    for i in 0..count {
        let center = random_point(rng, 10.0);
        match i % 4 {
            0 => {
                scene.add(Primitive::sphere(center, rng.gen_range(0.1..1.5), grey));
            }
            1 => {
                let size = rng.gen_range(0.2..2.0);
                scene.add(Primitive::rect(
                    AaRect::xy((center.x, center.x + size), (center.y, center.y + size), center.z),
                    grey,
                ));
            }
            2 => {
                let corner = center + Vec3::splat(rng.gen_range(0.2..1.5));
                scene.add(Primitive::cuboid(center, corner, grey));
            }
            _ => {
                let sphere = scene.push(Primitive::sphere(Vec3::ZERO, rng.gen_range(0.2..1.0), grey));
                let turned = scene.push(Primitive::rotate(sphere, Axis::Y, rng.gen_range(0.0..6.0)));
                scene.add(Primitive::translate(turned, center));
            }
        }
    }
    scene
}

#[test]
fn test_bvh_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(42);
    let scene = random_scene(&mut rng, 200);
    let bvh = BvhNode::build(&scene, &mut rng).expect("scene is not empty");
    assert!(bvh.bounds_are_tight());

    let interval = Interval::new(1e-3, f32::INFINITY);
    let mut hits = 0;
    for _ in 0..5_000 {
        let origin = random_point(&mut rng, 15.0);
        let direction = random_point(&mut rng, 1.0);
        if direction.length_squared() < 1e-6 {
            continue;
        }
        let ray = Ray::new(origin, direction);
        let fast = bvh.hit(&scene, &ray, interval);
        let slow = scene.hit_brute_force(&ray, interval);
        match (fast, slow) {
            (None, None) => {}
            (Some(a), Some(b)) => {
                hits += 1;
                assert!((a.t - b.t).abs() <= 1e-4 * b.t.max(1.0), "t {} vs {}", a.t, b.t);
                if (a.t - b.t).abs() > 1e-6 {
                    assert_eq!(a.primitive, b.primitive);
                }
            }
            (a, b) => panic!("bvh {:?} vs brute force {:?}", a.map(|h| h.t), b.map(|h| h.t)),
        }
    }
    assert!(hits > 500, "only {hits} rays hit anything");
}

#[test]
fn test_bvh_depth_is_logarithmic() {
    let mut rng = StdRng::seed_from_u64(42);
    let scene = random_scene(&mut rng, 256);
    let bvh = BvhNode::build(&scene, &mut rng).expect("scene is not empty");
    assert_eq!(bvh.node_count(), 255);
    // Median splits keep the tree balanced.
    assert!(bvh.depth() <= 9, "depth {}", bvh.depth());
}
