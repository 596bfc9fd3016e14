//! World-space observation rays: pixel unprojection, the slab ray/box
//! test, and footprint-adaptive ray subdivision.

use nalgebra::{Point3, Vector3, Vector4};

use crate::camera::Camera;
use crate::error::Result;
use crate::Voxel;

/// A ray cast from a camera's optical center through a motion pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Origin; coincides with the camera position.
    pub origin: Point3<f64>,
    /// Unit direction.
    pub direction: Vector3<f64>,
    /// Index of the source camera in the frame set.
    pub camera_id: usize,
    /// Angular width this ray covers (radians).
    ///
    /// Vertical FOV over vertical resolution: a square-pixel approximation,
    /// isotropic by assumption. Used to decide when a single ray must be
    /// replaced by a small pencil of rays to avoid aliasing.
    pub footprint: f64,
}

impl Ray {
    /// Parametric entry/exit distances into an axis-aligned cube, by the
    /// slab method, or `None` if the ray misses it.
    ///
    /// Entry is clamped to zero, so an origin inside the cube reports
    /// `t_enter == 0` and intersections strictly behind the origin are
    /// rejected. Axis-parallel directions rely on IEEE ±∞ division.
    pub fn intersect(&self, voxel: &Voxel) -> Option<(f64, f64)> {
        let mut t_enter = 0.0_f64;
        let mut t_exit = f64::INFINITY;
        for i in 0..3 {
            let lo = voxel.center[i] - voxel.half_extent;
            let hi = voxel.center[i] + voxel.half_extent;
            let t1 = (lo - self.origin[i]) / self.direction[i];
            let t2 = (hi - self.origin[i]) / self.direction[i];
            t_enter = t_enter.max(t1.min(t2));
            t_exit = t_exit.min(t1.max(t2));
        }
        (t_exit >= t_enter).then_some((t_enter, t_exit))
    }

    /// Whether the world-space width this ray covers at `t_enter` is too
    /// coarse for cells of side `cell_side`.
    pub(crate) fn needs_split(&self, t_enter: f64, cell_side: f64, footprint_ratio: f64) -> bool {
        t_enter * self.footprint > footprint_ratio * cell_side
    }

    /// Replace this ray by a 2×2 pencil of sub-rays covering its footprint.
    ///
    /// Directions are `d ± (φ/4)·u ± (φ/4)·v` for an orthonormal basis
    /// (u, v) perpendicular to `d`, renormalized; each sub-ray carries half
    /// the footprint and the same camera id.
    pub(crate) fn split(&self) -> [Ray; 4] {
        let d = self.direction;
        let seed = if d.z.abs() >= 0.9 {
            Vector3::x()
        } else {
            Vector3::z()
        };
        let u = (seed - d * seed.dot(&d)).normalize();
        let v = d.cross(&u);
        let step = self.footprint / 4.0;
        [(1.0, 1.0), (1.0, -1.0), (-1.0, 1.0), (-1.0, -1.0)].map(|(su, sv)| Ray {
            origin: self.origin,
            direction: (d + u * (su * step) + v * (sv * step)).normalize(),
            camera_id: self.camera_id,
            footprint: self.footprint / 2.0,
        })
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.origin.iter().all(|c| c.is_finite())
            && self.direction.iter().all(|c| c.is_finite())
            && self.footprint.is_finite()
    }
}

/// Unproject motion pixels of a `width × height` frame into world rays.
///
/// Each pixel maps to normalized device coordinates, through the inverse
/// view-projection onto the far plane, and then to a unit direction from
/// the camera position. Pixels whose unprojection degenerates to a
/// non-finite position or direction are dropped rather than failing the
/// call.
pub fn generate_rays(
    camera: &Camera,
    width: u32,
    height: u32,
    pixels: &[(u32, u32)],
    camera_id: usize,
) -> Result<Vec<Ray>> {
    let inv_vp = camera.inverse_view_projection()?;
    let footprint = camera.pixel_footprint(height);
    let origin = camera.position;

    let mut rays = Vec::with_capacity(pixels.len());
    for &(x, y) in pixels {
        let ndc_x = 2.0 * f64::from(x) / f64::from(width) - 1.0;
        let ndc_y = 1.0 - 2.0 * f64::from(y) / f64::from(height);
        let world = inv_vp * Vector4::new(ndc_x, ndc_y, 1.0, 1.0);
        if world.w == 0.0 {
            continue;
        }
        let point = world.xyz() / world.w;
        let direction = point - origin.coords;
        let norm = direction.norm();
        if !norm.is_finite() || norm == 0.0 {
            continue;
        }
        rays.push(Ray {
            origin,
            direction: direction / norm,
            camera_id,
            footprint,
        });
    }
    Ok(rays)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn through(origin: Point3<f64>, point: Point3<f64>, camera_id: usize) -> Ray {
        Ray {
            origin,
            direction: (point - origin).normalize(),
            camera_id,
            footprint: 1e-3,
        }
    }

    #[test]
    fn interior_origin_enters_at_zero() {
        let v = Voxel::new(Point3::new(1.0, -2.0, 0.5), 2.0);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let p = Point3::new(
                v.center.x + rng.gen_range(-1.9..1.9),
                v.center.y + rng.gen_range(-1.9..1.9),
                v.center.z + rng.gen_range(-1.9..1.9),
            );
            let d = Vector3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            );
            if d.norm() < 1e-3 {
                continue;
            }
            let ray = Ray {
                origin: p,
                direction: d.normalize(),
                camera_id: 0,
                footprint: 1e-3,
            };
            let (t_enter, t_exit) = ray.intersect(&v).unwrap();
            assert_eq!(t_enter, 0.0);
            assert!(t_exit > 0.0);
        }
    }

    #[test]
    fn box_behind_origin_is_missed() {
        let v = Voxel::new(Point3::new(-5.0, 0.0, 0.0), 1.0);
        let ray = through(Point3::origin(), Point3::new(1.0, 0.0, 0.0), 0);
        assert!(ray.intersect(&v).is_none());
    }

    #[test]
    fn axis_parallel_ray_hits_through_slabs() {
        let v = Voxel::new(Point3::new(3.0, 0.2, 0.2), 0.5);
        let ray = Ray {
            origin: Point3::origin(),
            direction: Vector3::x(),
            camera_id: 0,
            footprint: 1e-3,
        };
        let (t_enter, t_exit) = ray.intersect(&v).unwrap();
        assert_relative_eq!(t_enter, 2.5);
        assert_relative_eq!(t_exit, 3.5);
    }

    #[test]
    fn axis_parallel_ray_outside_slab_misses() {
        let v = Voxel::new(Point3::new(3.0, 2.0, 0.0), 0.5);
        let ray = Ray {
            origin: Point3::origin(),
            direction: Vector3::x(),
            camera_id: 0,
            footprint: 1e-3,
        };
        assert!(ray.intersect(&v).is_none());
    }

    #[test]
    fn split_basis_is_orthonormal() {
        for dir in [
            Vector3::new(0.3, -0.4, 0.86),
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(1.0, 0.1, 0.0),
        ] {
            let ray = Ray {
                origin: Point3::origin(),
                direction: dir.normalize(),
                camera_id: 2,
                footprint: 0.01,
            };
            for sub in ray.split() {
                assert_relative_eq!(sub.direction.norm(), 1.0, epsilon = 1e-12);
                assert_eq!(sub.camera_id, 2);
                assert_relative_eq!(sub.footprint, 0.005);
                // The pencil stays within the parent's angular footprint.
                let angle = sub.direction.dot(&ray.direction).clamp(-1.0, 1.0).acos();
                assert!(angle <= ray.footprint);
            }
        }
    }

    #[test]
    fn split_directions_are_distinct() {
        let ray = Ray {
            origin: Point3::origin(),
            direction: Vector3::new(0.0, 1.0, 0.0),
            camera_id: 0,
            footprint: 0.02,
        };
        let subs = ray.split();
        for i in 0..4 {
            for j in i + 1..4 {
                assert!((subs[i].direction - subs[j].direction).norm() > 1e-6);
            }
        }
    }

    #[test]
    fn footprint_split_triggers_at_range() {
        // A 0.01 rad ray hitting a cell grid at 100 m covers ~1 m, far above
        // a fifth of a 0.125 m child cell.
        let ray = Ray {
            origin: Point3::origin(),
            direction: Vector3::x(),
            camera_id: 0,
            footprint: 0.01,
        };
        assert!(ray.needs_split(100.0, 0.125, 0.2));
        // The same ray entering at the cell scale does not split.
        assert!(!ray.needs_split(1.0, 0.125, 0.2));
    }

    #[test]
    fn center_pixel_ray_points_at_target() {
        let camera = Camera::looking_at(Point3::new(10.0, 3.0, -4.0), Point3::origin());
        let rays = generate_rays(&camera, 640, 640, &[(320, 320)], 5).unwrap();
        assert_eq!(rays.len(), 1);
        let expected = (Point3::origin() - camera.position).normalize();
        assert_relative_eq!(rays[0].direction, expected, epsilon = 1e-9);
        assert_eq!(rays[0].origin, camera.position);
        assert_eq!(rays[0].camera_id, 5);
    }

    #[test]
    fn edge_pixels_produce_finite_rays() {
        let camera = Camera::looking_at(Point3::new(0.0, 2.0, 8.0), Point3::origin());
        let rays = generate_rays(
            &camera,
            320,
            240,
            &[(0, 0), (319, 0), (0, 239), (319, 239)],
            0,
        )
        .unwrap();
        assert_eq!(rays.len(), 4);
        for ray in &rays {
            assert!(ray.is_finite());
            assert_relative_eq!(ray.direction.norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn degenerate_camera_is_rejected() {
        let mut camera = Camera::default();
        camera.target = camera.position;
        assert!(generate_rays(&camera, 64, 64, &[(1, 1)], 0).is_err());
    }
}
