//! Render a procedural cube from a grid of virtual cameras
//!
//! Reads an optional JSON job describing the camera, the pose grid and the
//! render mode, renders with the software rasterizer and writes one PNG per
//! pose plus a `poses.json` with the camera-to-object transform of each image.
//!
//! ```text
//! cargo run -p viewcrate-demos --bin render_views -- --job job.json --output renders
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use viewcrate_core::{
    CameraIntrinsics, ColorImage, Point3f, RigidTransform, StablePose, TriangleMesh, CAMERA_FRAME,
    DEFAULT_FRAME,
};
use viewcrate_render::{
    GridRange, PlanarWorksurfaceDiscretizer, RenderMode, RenderOptions, RenderRecord,
    RenderedImage, SceneObject, SoftwareRasterizer, SphericalGrid, ViewsphereDiscretizer,
    VirtualCamera,
};

#[derive(Debug, Parser)]
#[command(name = "render_views", about = "Render a cube from discretized camera poses")]
struct Args {
    /// JSON job file; a small viewsphere job is used when omitted
    #[arg(long)]
    job: Option<PathBuf>,

    /// Directory the images are written to
    #[arg(long, default_value = "renders")]
    output: PathBuf,

    /// Override the job's render mode (e.g. segmask, depth_scene)
    #[arg(long)]
    mode: Option<RenderMode>,
}

/// Everything one demo run renders
#[derive(Debug, Deserialize)]
struct RenderJob {
    intrinsics: CameraIntrinsics,
    #[serde(default = "default_mode")]
    mode: RenderMode,
    viewsphere: Option<ViewsphereDiscretizer>,
    planar: Option<PlanarWorksurfaceDiscretizer>,
    #[serde(default)]
    stable_pose: Option<StablePose>,
    #[serde(default)]
    options: RenderOptions,
    #[serde(default = "default_half_extent")]
    cube_half_extent: f32,
    /// Add a table below the cube for the scene modes
    #[serde(default)]
    table: bool,
}

fn default_mode() -> RenderMode {
    RenderMode::Color
}

fn default_half_extent() -> f32 {
    0.05
}

impl RenderJob {
    fn fallback() -> Result<Self> {
        let viewsphere = ViewsphereDiscretizer::new(
            SphericalGrid::new(
                GridRange::single(0.5),
                GridRange::new(0.0, std::f64::consts::FRAC_PI_3, 3),
            )
            .with_azimuth(GridRange::full_turn(4)),
        )?;
        Ok(Self {
            intrinsics: CameraIntrinsics::new(CAMERA_FRAME, 300.0, 300.0, 159.5, 119.5, 320, 240)?,
            mode: default_mode(),
            viewsphere: Some(viewsphere),
            planar: None,
            stable_pose: None,
            options: RenderOptions::default(),
            cube_half_extent: default_half_extent(),
            table: true,
        })
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut job = match &args.job {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading job file {}", path.display()))?;
            serde_json::from_str::<RenderJob>(&text)
                .with_context(|| format!("parsing job file {}", path.display()))?
        }
        None => RenderJob::fallback()?,
    };
    if let Some(mode) = args.mode {
        job.mode = mode;
    }

    let mesh = create_cube(job.cube_half_extent);
    let mut camera = VirtualCamera::new(job.intrinsics.clone(), SoftwareRasterizer::new())?;
    if job.table {
        let table = create_table(-job.cube_half_extent, 1.0);
        camera.add_to_scene(
            "table",
            SceneObject::new(
                Arc::new(table),
                RigidTransform::identity(DEFAULT_FRAME, DEFAULT_FRAME),
            ),
        );
    }

    let records = match (&job.viewsphere, &job.planar) {
        (Some(viewsphere), None) => camera.wrapped_images_viewsphere(
            &mesh,
            viewsphere,
            job.mode,
            job.stable_pose.as_ref(),
            &job.options,
        )?,
        (None, Some(planar)) => {
            camera
                .wrapped_images_planar_worksurface(
                    &mesh,
                    planar,
                    job.mode,
                    job.stable_pose.as_ref(),
                    &job.options,
                )?
                .records
        }
        _ => bail!("the job must name exactly one of `viewsphere` or `planar`"),
    };

    fs::create_dir_all(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    for (i, record) in records.iter().enumerate() {
        save_record(record, &args.output, i)?;
    }
    let poses: Vec<&RigidTransform> = records.iter().map(|r| &r.camera_to_object).collect();
    fs::write(args.output.join("poses.json"), serde_json::to_string_pretty(&poses)?)?;

    log::info!(
        "Wrote {} {} images to {}",
        records.len(),
        job.mode,
        args.output.display()
    );
    Ok(())
}

fn save_record(record: &RenderRecord, dir: &Path, index: usize) -> Result<()> {
    match &record.image {
        RenderedImage::Binary(mask) => {
            let (height, width) = mask.data().dim();
            let im = image::GrayImage::from_raw(
                width as u32,
                height as u32,
                mask.data().iter().copied().collect(),
            )
            .context("mask buffer does not match its shape")?;
            im.save(dir.join(format!("segmask_{:04}.png", index)))?;
        }
        RenderedImage::Color(color) => {
            save_color(color, &dir.join(format!("color_{:04}.png", index)))?;
        }
        RenderedImage::Depth(depth) => {
            save_color(&depth.to_color(), &dir.join(format!("depth_{:04}.png", index)))?;
        }
        RenderedImage::Rgbd(rgbd) => {
            save_color(rgbd.color(), &dir.join(format!("color_{:04}.png", index)))?;
            save_color(&rgbd.depth().to_color(), &dir.join(format!("depth_{:04}.png", index)))?;
        }
    }
    Ok(())
}

fn save_color(color: &ColorImage, path: &Path) -> Result<()> {
    let im = image::RgbImage::from_raw(
        color.width() as u32,
        color.height() as u32,
        color.data().iter().copied().collect(),
    )
    .context("color buffer does not match its shape")?;
    im.save(path)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Axis-aligned cube centered on the origin
fn create_cube(half: f32) -> TriangleMesh {
    let mut mesh = TriangleMesh::new();
    for &z in &[-half, half] {
        for &y in &[-half, half] {
            for &x in &[-half, half] {
                mesh.add_vertex(Point3f::new(x, y, z));
            }
        }
    }
    #[rustfmt::skip]
    let faces = [
        [0, 2, 1], [1, 2, 3],
        [4, 5, 6], [5, 7, 6],
        [0, 1, 4], [1, 5, 4],
        [2, 6, 3], [3, 6, 7],
        [0, 4, 2], [2, 4, 6],
        [1, 3, 5], [3, 7, 5],
    ];
    for face in faces {
        mesh.add_face(face);
    }
    mesh
}

/// Square table top in the z = `z` plane
fn create_table(z: f32, half: f32) -> TriangleMesh {
    TriangleMesh::from_vertices_and_faces(
        vec![
            Point3f::new(-half, -half, z),
            Point3f::new(half, -half, z),
            Point3f::new(half, half, z),
            Point3f::new(-half, half, z),
        ],
        vec![[0, 1, 2], [0, 2, 3]],
    )
}
