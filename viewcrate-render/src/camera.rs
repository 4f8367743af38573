//! Virtual camera: raw and typed rendering of meshes and scenes

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use viewcrate_core::{
    BinaryImage, CameraIntrinsics, ColorImage, DepthImage, Error, Result, RgbdImage,
    RigidTransform, StablePose, TriangleMesh, DEFAULT_FRAME, OBJECT_FRAME, STABLE_POSE_FRAME,
};

use crate::planar::PlanarWorksurfaceDiscretizer;
use crate::properties::{LightingProperties, MaterialProperties, RenderOptions};
use crate::rasterizer::{RasterJob, RawImages, Rasterizer};
use crate::render_mode::RenderMode;
use crate::viewsphere::ViewsphereDiscretizer;

/// A mesh placed in the world, rendered alongside the primary object in
/// the `*Scene` render modes
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub mesh: Arc<TriangleMesh>,
    /// Mesh-to-world transform
    pub object_to_world: RigidTransform,
    pub material: MaterialProperties,
}

impl SceneObject {
    pub fn new(mesh: Arc<TriangleMesh>, object_to_world: RigidTransform) -> Self {
        Self {
            mesh,
            object_to_world,
            material: MaterialProperties::default(),
        }
    }

    pub fn with_material(mut self, material: MaterialProperties) -> Self {
        self.material = material;
        self
    }
}

/// An image wrapped according to its render mode
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedImage {
    Binary(BinaryImage),
    Color(ColorImage),
    Depth(DepthImage),
    Rgbd(RgbdImage),
}

impl RenderedImage {
    pub fn frame(&self) -> &str {
        match self {
            RenderedImage::Binary(im) => im.frame(),
            RenderedImage::Color(im) => im.frame(),
            RenderedImage::Depth(im) => im.frame(),
            RenderedImage::Rgbd(im) => im.frame(),
        }
    }

    pub fn as_binary(&self) -> Option<&BinaryImage> {
        match self {
            RenderedImage::Binary(im) => Some(im),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<&ColorImage> {
        match self {
            RenderedImage::Color(im) => Some(im),
            _ => None,
        }
    }

    pub fn as_depth(&self) -> Option<&DepthImage> {
        match self {
            RenderedImage::Depth(im) => Some(im),
            _ => None,
        }
    }

    pub fn as_rgbd(&self) -> Option<&RgbdImage> {
        match self {
            RenderedImage::Rgbd(im) => Some(im),
            _ => None,
        }
    }

    /// Composite a scene object's render of the same kind into this image
    fn composite(&mut self, scene: &RenderedImage) -> Result<()> {
        match (self, scene) {
            (RenderedImage::Color(primary), RenderedImage::Color(other)) => {
                primary.fill_background_from(other)
            }
            (RenderedImage::Depth(primary), RenderedImage::Depth(other)) => {
                *primary = primary.combine_with(other)?;
                Ok(())
            }
            (RenderedImage::Rgbd(primary), RenderedImage::Rgbd(other)) => {
                *primary = primary.combine_with(other)?;
                Ok(())
            }
            _ => Err(Error::InvalidData(
                "scene image kind does not match the primary image".to_string(),
            )),
        }
    }
}

/// An image together with the camera pose it was taken from
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRecord {
    pub image: RenderedImage,
    /// Camera-to-object transform of the rendering camera
    pub camera_to_object: RigidTransform,
}

/// Output of [`VirtualCamera::wrapped_images_planar_worksurface`]
#[derive(Debug, Clone, PartialEq)]
pub struct PlanarRenders {
    pub records: Vec<RenderRecord>,
    /// Displaced object-to-camera poses, parallel to `records`
    pub object_to_camera_poses: Vec<RigidTransform>,
    /// Recentered intrinsics each record was rendered with
    pub shifted_intrinsics: Vec<CameraIntrinsics>,
}

/// A scene object resolved against the primary render's cameras
struct ScenePass<'a> {
    name: &'a str,
    object: &'a SceneObject,
    object_to_camera_poses: Vec<RigidTransform>,
}

/// A pinhole camera that renders meshes through a [`Rasterizer`].
///
/// The camera owns its scene: named objects composited into renders made in
/// the `*Scene` modes. A removed name keeps its slot, marked absent.
/// Mutating the scene requires `&mut self`, so it cannot change during a
/// render.
pub struct VirtualCamera<R> {
    intrinsics: CameraIntrinsics,
    rasterizer: R,
    scene: BTreeMap<String, Option<SceneObject>>,
}

impl<R: Rasterizer> VirtualCamera<R> {
    /// Create a camera, failing if the intrinsics do not describe a usable camera
    pub fn new(intrinsics: CameraIntrinsics, rasterizer: R) -> Result<Self> {
        intrinsics.validate()?;
        Ok(Self {
            intrinsics,
            rasterizer,
            scene: BTreeMap::new(),
        })
    }

    pub fn intrinsics(&self) -> &CameraIntrinsics {
        &self.intrinsics
    }

    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    /// Add an object to the scene, replacing any object of the same name
    pub fn add_to_scene(&mut self, name: impl Into<String>, object: SceneObject) {
        self.scene.insert(name.into(), Some(object));
    }

    /// Mark an object as removed from the scene
    pub fn remove_from_scene(&mut self, name: &str) {
        self.scene.insert(name.to_string(), None);
    }

    /// Look up a present scene object
    pub fn scene_object(&self, name: &str) -> Option<&SceneObject> {
        self.scene.get(name).and_then(Option::as_ref)
    }

    /// Present scene objects in name order
    pub fn scene_objects(&self) -> impl Iterator<Item = (&str, &SceneObject)> {
        self.scene
            .iter()
            .filter_map(|(name, entry)| entry.as_ref().map(|object| (name.as_str(), object)))
    }

    /// Render raw color and depth buffers of `mesh` from each object-to-camera pose
    pub fn images(
        &self,
        mesh: &TriangleMesh,
        object_to_camera_poses: &[RigidTransform],
        options: &RenderOptions,
        enable_lighting: bool,
    ) -> Result<RawImages> {
        self.images_with(
            &self.intrinsics,
            mesh,
            object_to_camera_poses,
            &options.material,
            &options.lighting,
            enable_lighting,
            options.debug,
        )
    }

    /// Render raw buffers from every pose of a viewsphere, with lighting
    pub fn images_viewsphere(
        &self,
        mesh: &TriangleMesh,
        discretizer: &ViewsphereDiscretizer,
        options: &RenderOptions,
    ) -> Result<RawImages> {
        self.images(mesh, &discretizer.object_to_camera_poses(), options, true)
    }

    /// Render typed images of `mesh` from each object-to-camera pose.
    ///
    /// With a stable pose the input poses are stable-pose-to-camera
    /// transforms and the object is first placed in its resting
    /// orientation. Records carry the inverse of the input poses, in input
    /// order.
    pub fn wrapped_images(
        &self,
        mesh: &TriangleMesh,
        object_to_camera_poses: &[RigidTransform],
        mode: RenderMode,
        stable_pose: Option<&StablePose>,
        options: &RenderOptions,
    ) -> Result<Vec<RenderRecord>> {
        self.wrapped_images_with(
            &self.intrinsics,
            mesh,
            object_to_camera_poses,
            mode,
            stable_pose,
            options,
        )
    }

    /// Typed images from every pose of a viewsphere
    pub fn wrapped_images_viewsphere(
        &self,
        mesh: &TriangleMesh,
        discretizer: &ViewsphereDiscretizer,
        mode: RenderMode,
        stable_pose: Option<&StablePose>,
        options: &RenderOptions,
    ) -> Result<Vec<RenderRecord>> {
        self.wrapped_images(
            mesh,
            &discretizer.object_to_camera_poses(),
            mode,
            stable_pose,
            options,
        )
    }

    /// Typed images over a planar worksurface, each rendered with the
    /// recentered intrinsics of its pose so the displaced object stays in
    /// the image center. The camera's own intrinsics are never modified.
    pub fn wrapped_images_planar_worksurface(
        &self,
        mesh: &TriangleMesh,
        discretizer: &PlanarWorksurfaceDiscretizer,
        mode: RenderMode,
        stable_pose: Option<&StablePose>,
        options: &RenderOptions,
    ) -> Result<PlanarRenders> {
        let poses = discretizer.object_to_camera_poses(&self.intrinsics)?;
        log::info!("Rendering {} images", poses.len());

        let mut records = Vec::with_capacity(poses.len());
        for (pose, intrinsics) in poses
            .object_to_camera_poses
            .iter()
            .zip(&poses.shifted_intrinsics)
        {
            records.extend(self.wrapped_images_with(
                intrinsics,
                mesh,
                std::slice::from_ref(pose),
                mode,
                stable_pose,
                options,
            )?);
        }

        Ok(PlanarRenders {
            records,
            object_to_camera_poses: poses.object_to_camera_poses,
            shifted_intrinsics: poses.shifted_intrinsics,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn images_with(
        &self,
        intrinsics: &CameraIntrinsics,
        mesh: &TriangleMesh,
        object_to_camera_poses: &[RigidTransform],
        material: &MaterialProperties,
        lighting: &LightingProperties,
        enable_lighting: bool,
        debug: bool,
    ) -> Result<RawImages> {
        mesh.validate()?;
        let normals = mesh.vertex_normals();
        let material_params = material.to_params();
        let height = intrinsics.height as usize;
        let width = intrinsics.width as usize;
        let k = intrinsics.proj_matrix();

        let mut lighting = lighting.clone();
        let mut images = RawImages::default();
        let render_start = Instant::now();
        for object_to_camera in object_to_camera_poses {
            let projection = k * object_to_camera.extrinsics();

            lighting.set_pose(object_to_camera);
            let light_params = lighting.to_params();

            let job = RasterJob {
                projection_matrices: std::slice::from_ref(&projection),
                height,
                width,
                vertices: &mesh.vertices,
                triangles: &mesh.faces,
                normals: &normals,
                material_params: &material_params,
                light_params: &light_params,
                enable_lighting,
                debug,
            };
            let rendered = self.rasterizer.render(&job)?;
            check_raw_images(&rendered, 1, height, width)?;
            images.extend(rendered);
        }
        log::debug!(
            "Rendering took {:.3} sec",
            render_start.elapsed().as_secs_f64()
        );

        Ok(images)
    }

    fn wrapped_images_with(
        &self,
        intrinsics: &CameraIntrinsics,
        mesh: &TriangleMesh,
        object_to_camera_poses: &[RigidTransform],
        mode: RenderMode,
        stable_pose: Option<&StablePose>,
        options: &RenderOptions,
    ) -> Result<Vec<RenderRecord>> {
        // the input poses double as world-to-camera transforms for the scene
        let passes = match mode.scene_base() {
            Some(_) => self.scene_passes(object_to_camera_poses),
            None => Vec::new(),
        };

        let render_poses = match stable_pose {
            Some(stable_pose) => {
                let object_to_stable = stable_pose.object_to_stable_pose(OBJECT_FRAME);
                object_to_camera_poses
                    .iter()
                    .map(|stable_to_camera| {
                        stable_to_camera
                            .as_frames(STABLE_POSE_FRAME, stable_to_camera.to_frame.clone())
                            .dot(&object_to_stable)
                    })
                    .collect()
            }
            None => object_to_camera_poses.to_vec(),
        };

        let mut images = self.typed_images(
            intrinsics,
            mesh,
            &render_poses,
            mode,
            &options.material,
            &options.lighting,
            options.debug,
        )?;

        if let Some(base) = mode.scene_base() {
            for pass in &passes {
                log::trace!("Compositing scene object {}", pass.name);
                let scene_images = self.typed_images(
                    intrinsics,
                    &pass.object.mesh,
                    &pass.object_to_camera_poses,
                    base,
                    &pass.object.material,
                    &options.lighting,
                    options.debug,
                )?;
                for (image, scene_image) in images.iter_mut().zip(&scene_images) {
                    image.composite(scene_image)?;
                }
            }
        }

        Ok(images
            .into_iter()
            .zip(object_to_camera_poses)
            .map(|(image, object_to_camera)| RenderRecord {
                image,
                camera_to_object: object_to_camera.inverse(),
            })
            .collect())
    }

    /// Snapshot of the present scene objects with their poses in the
    /// cameras of the primary render
    fn scene_passes(&self, world_to_camera_poses: &[RigidTransform]) -> Vec<ScenePass<'_>> {
        self.scene_objects()
            .map(|(name, object)| ScenePass {
                name,
                object,
                object_to_camera_poses: world_to_camera_poses
                    .iter()
                    .map(|pose| {
                        pose.as_frames(DEFAULT_FRAME, pose.to_frame.clone())
                            .dot(&object.object_to_world)
                    })
                    .collect(),
            })
            .collect()
    }

    /// Render and wrap without scene compositing; scene modes wrap as
    /// their base mode
    #[allow(clippy::too_many_arguments)]
    fn typed_images(
        &self,
        intrinsics: &CameraIntrinsics,
        mesh: &TriangleMesh,
        object_to_camera_poses: &[RigidTransform],
        mode: RenderMode,
        material: &MaterialProperties,
        lighting: &LightingProperties,
        debug: bool,
    ) -> Result<Vec<RenderedImage>> {
        let raw = self.images_with(
            intrinsics,
            mesh,
            object_to_camera_poses,
            material,
            lighting,
            mode.lighting_enabled(),
            debug,
        )?;
        wrap_images(raw, mode, &intrinsics.frame)
    }
}

/// Wrap raw buffers into the image type of `mode`
fn wrap_images(raw: RawImages, mode: RenderMode, frame: &str) -> Result<Vec<RenderedImage>> {
    let RawImages { color, depth } = raw;
    match mode {
        RenderMode::Segmask => Ok(color
            .iter()
            .map(|c| {
                let first_channel = c.index_axis(ndarray::Axis(2), 0).to_owned();
                RenderedImage::Binary(BinaryImage::from_channel(&first_channel, 0, frame))
            })
            .collect()),
        RenderMode::Color | RenderMode::ColorScene => color
            .into_iter()
            .map(|c| ColorImage::new(c, frame).map(RenderedImage::Color))
            .collect(),
        RenderMode::Depth | RenderMode::DepthScene => Ok(depth
            .into_iter()
            .map(|d| RenderedImage::Depth(DepthImage::new(d, frame)))
            .collect()),
        RenderMode::Rgbd | RenderMode::RgbdScene => color
            .into_iter()
            .zip(depth)
            .map(|(c, d)| {
                let c = ColorImage::new(c, frame)?;
                let d = DepthImage::new(d, frame);
                RgbdImage::from_color_and_depth(c, d).map(RenderedImage::Rgbd)
            })
            .collect(),
        RenderMode::ScaledDepth => Ok(depth
            .into_iter()
            .map(|d| RenderedImage::Color(DepthImage::new(d, frame).to_color()))
            .collect()),
    }
}

/// Reject backend output that breaks the one-pair-per-matrix contract
fn check_raw_images(raw: &RawImages, expected: usize, height: usize, width: usize) -> Result<()> {
    if raw.color.len() != expected || raw.depth.len() != expected {
        return Err(Error::Backend(format!(
            "expected {} color and depth buffers, got {} and {}",
            expected,
            raw.color.len(),
            raw.depth.len()
        )));
    }
    if let Some(c) = raw.color.iter().find(|c| c.dim() != (height, width, 3)) {
        return Err(Error::Backend(format!(
            "color buffer has shape {:?}, expected ({}, {}, 3)",
            c.dim(),
            height,
            width
        )));
    }
    if let Some(d) = raw.depth.iter().find(|d| d.dim() != (height, width)) {
        return Err(Error::Backend(format!(
            "depth buffer has shape {:?}, expected ({}, {})",
            d.dim(),
            height,
            width
        )));
    }
    Ok(())
}
