//! Reference CPU rasterizer
//!
//! A z-buffered triangle rasterizer with per-pixel Phong shading, usable as
//! a [`Rasterizer`] when no native backend is available. Pixel `(row, col)`
//! samples the image point `(u, v) = (col, row)`. Triangles with a vertex
//! at or behind the camera plane are skipped rather than clipped.

use nalgebra::{Matrix3, Matrix3x4, Vector3};
use ndarray::{Array2, Array3};
use rayon::prelude::*;
use viewcrate_core::{Error, Result};

use crate::properties::{LightingProperties, MaterialProperties};
use crate::rasterizer::{RasterJob, RawImages, Rasterizer};

/// Vertices nearer than this to the camera plane are not rasterized
const NEAR_PLANE: f64 = 1e-6;

/// Ambient light present regardless of the light source
const SCENE_AMBIENT: f32 = 0.2;

/// CPU implementation of [`Rasterizer`]; the views of one `render` call are
/// rasterized in parallel
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareRasterizer;

impl SoftwareRasterizer {
    pub fn new() -> Self {
        Self
    }
}

impl Rasterizer for SoftwareRasterizer {
    fn render(&self, job: &RasterJob<'_>) -> Result<RawImages> {
        if job.material_params.len() < MaterialProperties::PARAM_COUNT {
            return Err(Error::Backend(format!(
                "expected {} material parameters, got {}",
                MaterialProperties::PARAM_COUNT,
                job.material_params.len()
            )));
        }
        if job.light_params.len() < LightingProperties::PARAM_COUNT {
            return Err(Error::Backend(format!(
                "expected {} light parameters, got {}",
                LightingProperties::PARAM_COUNT,
                job.light_params.len()
            )));
        }
        if job.normals.len() != job.vertices.len() {
            return Err(Error::Backend(format!(
                "{} normals for {} vertices",
                job.normals.len(),
                job.vertices.len()
            )));
        }
        if let Some(face) = job
            .triangles
            .iter()
            .find(|face| face.iter().any(|&i| i >= job.vertices.len()))
        {
            return Err(Error::Backend(format!(
                "triangle {:?} indexes past the vertex array",
                face,
            )));
        }

        let shading = Shading::from_params(job.material_params, job.light_params);
        let views = job
            .projection_matrices
            .par_iter()
            .map(|projection| render_view(projection, job, &shading))
            .collect::<Result<Vec<_>>>()?;

        let (color, depth) = views.into_iter().unzip();
        Ok(RawImages { color, depth })
    }
}

#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    u: f64,
    v: f64,
    z: f64,
}

/// Twice the signed area of `(a, b, p)`
fn edge(a: &ScreenVertex, b: &ScreenVertex, u: f64, v: f64) -> f64 {
    (b.u - a.u) * (v - a.v) - (b.v - a.v) * (u - a.u)
}

fn render_view(
    projection: &Matrix3x4<f64>,
    job: &RasterJob<'_>,
    shading: &Shading,
) -> Result<(Array3<u8>, Array2<f32>)> {
    let (height, width) = (job.height, job.width);
    let mut color = Array3::<u8>::zeros((height, width, 3));
    let mut depth = Array2::<f32>::zeros((height, width));
    let mut zbuf = Array2::<f64>::from_elem((height, width), f64::INFINITY);

    // camera center in the object frame: the null space of P
    let m: Matrix3<f64> = projection.fixed_view::<3, 3>(0, 0).into_owned();
    let m_inv = m
        .try_inverse()
        .ok_or_else(|| Error::Backend("singular projection matrix".to_string()))?;
    let eye = -(m_inv * projection.column(3));
    let eye = Vector3::new(eye.x as f32, eye.y as f32, eye.z as f32);

    let screen: Vec<Option<ScreenVertex>> = job
        .vertices
        .iter()
        .map(|vertex| {
            let q = projection * vertex.cast::<f64>().to_homogeneous();
            (q.z > NEAR_PLANE).then(|| ScreenVertex {
                u: q.x / q.z,
                v: q.y / q.z,
                z: q.z,
            })
        })
        .collect();

    let mut drawn = 0usize;
    for face in job.triangles {
        let (Some(a), Some(b), Some(c)) = (screen[face[0]], screen[face[1]], screen[face[2]]) else {
            continue;
        };
        let area = edge(&a, &b, c.u, c.v);
        if area.abs() < f64::EPSILON {
            continue;
        }

        let u_min = a.u.min(b.u).min(c.u).ceil().max(0.0);
        let v_min = a.v.min(b.v).min(c.v).ceil().max(0.0);
        let u_max = a.u.max(b.u).max(c.u).floor().min(width as f64 - 1.0);
        let v_max = a.v.max(b.v).max(c.v).floor().min(height as f64 - 1.0);
        if u_min > u_max || v_min > v_max {
            continue;
        }
        drawn += 1;

        for row in v_min as usize..=v_max as usize {
            for col in u_min as usize..=u_max as usize {
                let (u, v) = (col as f64, row as f64);
                let w0 = edge(&b, &c, u, v) / area;
                let w1 = edge(&c, &a, u, v) / area;
                let w2 = edge(&a, &b, u, v) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let inv_z = w0 / a.z + w1 / b.z + w2 / c.z;
                let z = 1.0 / inv_z;
                if z >= zbuf[[row, col]] {
                    continue;
                }
                zbuf[[row, col]] = z;
                depth[[row, col]] = z as f32;

                let rgb = if job.enable_lighting {
                    // perspective-correct barycentric weights
                    let weights = [
                        (w0 / a.z * z) as f32,
                        (w1 / b.z * z) as f32,
                        (w2 / c.z * z) as f32,
                    ];
                    let mut point = Vector3::<f32>::zeros();
                    let mut normal = Vector3::<f32>::zeros();
                    for (k, &w) in face.iter().zip(weights.iter()) {
                        point += job.vertices[*k].coords * w;
                        normal += job.normals[*k] * w;
                    }
                    shading.shade(&point, &normal, &eye)
                } else {
                    shading.color
                };

                for ch in 0..3 {
                    color[[row, col, ch]] = (rgb[ch].clamp(0.0, 1.0) * 255.0).round() as u8;
                }
            }
        }
    }

    if job.debug {
        log::debug!(
            "Rasterized {} of {} triangles into {}x{} view",
            drawn,
            job.triangles.len(),
            width,
            height
        );
    }

    Ok((color, depth))
}

/// Phong shading terms unpacked from the flat parameter arrays
#[derive(Debug, Clone, Copy)]
struct Shading {
    color: Vector3<f32>,
    ambient: f32,
    diffuse: f32,
    specular: f32,
    shininess: f32,
    light_ambient: f32,
    light_diffuse: f32,
    light_specular: f32,
    light_position: Vector3<f32>,
    light_direction: Vector3<f32>,
    cos_cutoff: Option<f32>,
}

impl Shading {
    fn from_params(material: &[f32], light: &[f32]) -> Self {
        let cutoff = light[9];
        Self {
            color: Vector3::new(material[0], material[1], material[2]),
            ambient: material[3],
            diffuse: material[4],
            specular: material[5],
            shininess: material[6],
            light_ambient: light[0],
            light_diffuse: light[1],
            light_specular: light[2],
            light_position: Vector3::new(light[3], light[4], light[5]),
            light_direction: Vector3::new(light[6], light[7], light[8]),
            cos_cutoff: (cutoff < 180.0).then(|| cutoff.to_radians().cos()),
        }
    }

    fn shade(
        &self,
        point: &Vector3<f32>,
        normal: &Vector3<f32>,
        eye: &Vector3<f32>,
    ) -> Vector3<f32> {
        let ambient = self.color * self.ambient * (SCENE_AMBIENT + self.light_ambient);

        let (Some(to_eye), Some(to_light), Some(mut n)) = (
            (eye - point).try_normalize(f32::EPSILON),
            (self.light_position - point).try_normalize(f32::EPSILON),
            normal.try_normalize(f32::EPSILON),
        ) else {
            return ambient;
        };

        // two-sided: shade the side facing the camera
        if n.dot(&to_eye) < 0.0 {
            n = -n;
        }

        if let Some(cos_cutoff) = self.cos_cutoff {
            if self.light_direction.dot(&-to_light) < cos_cutoff {
                return ambient;
            }
        }

        let lambert = n.dot(&to_light);
        if lambert <= 0.0 {
            return ambient;
        }
        let diffuse = self.color * self.diffuse * self.light_diffuse * lambert;

        let reflected = n * (2.0 * lambert) - to_light;
        let highlight = reflected.dot(&to_eye).max(0.0).powf(self.shininess);
        let specular = Vector3::repeat(self.specular * self.light_specular * highlight);

        ambient + diffuse + specular
    }
}
