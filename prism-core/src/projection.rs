//! Camera configuration and the perspective projector stage
use nalgebra::{Isometry3, Matrix4, Point2, Point3, Vector2, Vector3, Vector4};

use crate::affine::AffineTransformer3;
use crate::clip::{all_inside, clip_polygon, clip_segment, HalfSpace, NearPlane};
use crate::decompose::Decomposer3;
use crate::error::{GeometryError, Result};
use crate::geometry::{ensure_finite3, ensure_finite_sizes};
use crate::scene::{depth_order, Scene};
use crate::style::{scale_width, AssetStyle, LineStyle, SurfaceStyle};
use crate::target::{Asset3, Target2, Target3};
use crate::tessellate::Lod;
use crate::transform::{Affine2, Affine3};

/// Camera configuration for 3D rendering
///
/// View space is left-handed: x right, y up, z along the view direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 5.0),
            target: Point3::new(0.0, 0.0, 0.0),
            up: Vector3::new(0.0, 1.0, 0.0),
            fov: std::f32::consts::PI / 4.0, // 45 degrees
            aspect: width as f32 / height as f32,
            near: 0.1,
            far: 100.0,
        }
    }

    /// Camera-to-world transform; identity for a camera at the origin
    /// looking along +Z with +Y up.
    pub fn pose_matrix(&self) -> Matrix4<f32> {
        Isometry3::face_towards(&self.position, &self.target, &self.up).to_homogeneous()
    }

    /// World-to-camera transform
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Isometry3::face_towards(&self.position, &self.target, &self.up)
            .inverse()
            .to_homogeneous()
    }

    /// Perspective projection whose `w` is the view depth.
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        perspective(self.aspect, self.fov, self.near, self.far)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

/// Left-handed perspective matrix mapping depth `near..far` to `0..1` and
/// copying view depth into `w`.
pub fn perspective(aspect: f32, fov: f32, near: f32, far: f32) -> Matrix4<f32> {
    let f = 1.0 / (fov * 0.5).tan();
    let range = far / (far - near);
    Matrix4::new(
        f / aspect,
        0.0,
        0.0,
        0.0,
        0.0,
        f,
        0.0,
        0.0,
        0.0,
        0.0,
        range,
        -near * range,
        0.0,
        0.0,
        1.0,
        0.0,
    )
}

fn to_screen(viewport: &Affine2, clip: &Vector4<f32>) -> Point2<f32> {
    viewport.transform_point(&Point2::new(clip.x / clip.w, clip.y / clip.w))
}

/// Converts 3D calls into 2D calls: projection, near-plane clipping and
/// perspective division, with sizes corrected for depth.
///
/// Face culling is not applied; both sides of every surface are drawn.
pub struct Projector<T> {
    view_projection: Matrix4<f32>,
    projection_scale: f32,
    viewport: Affine2,
    viewport_scale: f32,
    near: NearPlane,
    lod: Lod,
    target: T,
    homogeneous: Vec<Vector4<f32>>,
    clipped: Vec<Vector4<f32>>,
    screen: Vec<Point2<f32>>,
}

impl<T: Target2> Projector<T> {
    /// `camera_pose` is the camera-to-world transform; the projector uses
    /// `projection * camera_pose^-1`. `viewport` maps normalized device
    /// coordinates to target coordinates.
    pub fn new(
        projection: Matrix4<f32>,
        camera_pose: Matrix4<f32>,
        viewport: Affine2,
        near: f32,
        target: T,
    ) -> Result<Self> {
        if !(near.is_finite() && near > 0.0) {
            return Err(GeometryError::InvalidNearPlane(near));
        }
        let view = camera_pose
            .try_inverse()
            .ok_or(GeometryError::NonInvertible)?;
        let view_projection = projection * view;
        if view_projection.iter().any(|v| !v.is_finite()) {
            return Err(GeometryError::NonFinite("Projector::new"));
        }
        let projection_scale = Vector3::new(
            view_projection[(1, 0)],
            view_projection[(1, 1)],
            view_projection[(1, 2)],
        )
        .norm();
        let viewport_scale = viewport.transform_vector(&Vector2::y()).norm();
        log::debug!(
            "projector: near={near}, projection scale={projection_scale}, viewport scale={viewport_scale}"
        );

        Ok(Self {
            view_projection,
            projection_scale,
            viewport,
            viewport_scale,
            near: NearPlane { near },
            lod: Lod::default(),
            target,
            homogeneous: Vec::new(),
            clipped: Vec::new(),
            screen: Vec::new(),
        })
    }

    /// Projector for `camera` rendering into a `width` x `height` pixel viewport.
    pub fn from_camera(camera: &Camera, width: f32, height: f32, target: T) -> Result<Self> {
        Self::new(
            camera.projection_matrix(),
            camera.pose_matrix(),
            Affine2::viewport(width, height)?,
            camera.near,
            target,
        )
    }

    /// LOD used when an asset has to be decomposed before projection.
    pub fn with_lod(mut self, lod: Lod) -> Self {
        self.lod = lod;
        self
    }

    pub fn into_inner(self) -> T {
        self.target
    }

    /// Homogeneous clip-space position of `point`.
    pub fn project(&self, point: &Point3<f32>) -> Vector4<f32> {
        self.view_projection * point.to_homogeneous()
    }

    /// Pixels per world unit at homogeneous depth `w`.
    fn size_factor(&self, w: f32) -> f32 {
        self.projection_scale * self.viewport_scale / w
    }

    /// Replay `scene` back to front.
    pub fn draw_scene(&mut self, scene: &Scene) -> Result<()> {
        let order = depth_order(&self.view_projection, scene);
        for index in order {
            scene.commands()[index].command.replay(self)?;
        }
        Ok(())
    }

    fn draw_asset_decomposed(
        &mut self,
        xform: &Affine3,
        asset: &dyn Asset3,
        style: &AssetStyle,
    ) -> Result<()> {
        let lod = self.lod;
        let mut decomposer = Decomposer3::with_lod(&mut *self, lod);
        let mut placed = AffineTransformer3::new(*xform, &mut decomposer)?;
        asset.replay(&mut placed, style)
    }
}

impl<T: Target2> Target3 for Projector<T> {
    fn draw_asset(
        &mut self,
        xform: &Affine3,
        asset: &dyn Asset3,
        style: &AssetStyle,
    ) -> Result<()> {
        if !style.is_visible() {
            return Ok(());
        }
        let Some(bounds) = asset.bounding_sphere() else {
            return self.draw_asset_decomposed(xform, asset, style);
        };

        let center = xform.transform_point(&bounds.center);
        let radius = bounds.radius * xform.size_scale();
        let distance = self.near.signed_distance(&self.project(&center));
        if distance > radius {
            let mut placed = AffineTransformer3::new(*xform, &mut *self)?;
            asset.replay(&mut placed, style)
        } else if distance < -radius {
            log::trace!("asset entirely behind the near plane, skipped");
            Ok(())
        } else {
            self.draw_asset_decomposed(xform, asset, style)
        }
    }

    fn draw_segment(
        &mut self,
        a: Point3<f32>,
        b: Point3<f32>,
        diameter: f32,
        style: &LineStyle,
    ) -> Result<()> {
        if !style.is_visible() {
            return Ok(());
        }
        ensure_finite3(&[a, b], "draw_segment")?;
        ensure_finite_sizes(&[diameter, style.outline_width], "draw_segment")?;

        let Some((ca, cb)) = clip_segment(&self.near, self.project(&a), self.project(&b)) else {
            log::trace!("segment behind the near plane, dropped");
            return Ok(());
        };
        let factor = self.size_factor((ca.w + cb.w) * 0.5);
        let points = [to_screen(&self.viewport, &ca), to_screen(&self.viewport, &cb)];
        self.target.draw_lines(
            &points,
            scale_width(diameter, factor),
            &style.scaled(factor),
        )
    }

    fn draw_sphere(
        &mut self,
        center: Point3<f32>,
        diameter: f32,
        style: &SurfaceStyle,
    ) -> Result<()> {
        if !style.is_visible() {
            return Ok(());
        }
        ensure_finite3(&[center], "draw_sphere")?;
        ensure_finite_sizes(&[diameter, style.outline_width], "draw_sphere")?;

        let clip = self.project(&center);
        if self.near.signed_distance(&clip) < 0.0 {
            log::trace!("sphere center behind the near plane, dropped");
            return Ok(());
        }
        let factor = self.size_factor(clip.w);
        let size = scale_width(diameter, factor);
        self.target.draw_ellipse(
            to_screen(&self.viewport, &clip),
            size,
            size,
            &style.to_polygon_style(scale_width(style.outline_width, factor)),
        )
    }

    fn draw_surface(&mut self, points: &[Point3<f32>], style: &SurfaceStyle) -> Result<()> {
        if !style.is_visible() {
            return Ok(());
        }
        match points.len() {
            0 | 1 => return Ok(()),
            2 => {
                let width = style.outline_width.max(0.0);
                return self.draw_segment(points[0], points[1], width, &style.as_line_style());
            }
            _ => {}
        }
        ensure_finite3(points, "draw_surface")?;
        ensure_finite_sizes(&[style.outline_width], "draw_surface")?;

        self.homogeneous.clear();
        let view_projection = self.view_projection;
        self.homogeneous
            .extend(points.iter().map(|p| view_projection * p.to_homogeneous()));

        let survivors: &[Vector4<f32>] = if all_inside(&self.near, &self.homogeneous) {
            &self.homogeneous
        } else if clip_polygon(&self.near, &self.homogeneous, &mut self.clipped) >= 3 {
            &self.clipped
        } else {
            log::trace!("surface behind the near plane, dropped");
            return Ok(());
        };

        let average_w = survivors.iter().map(|v| v.w).sum::<f32>() / survivors.len() as f32;
        let factor = self.projection_scale * self.viewport_scale / average_w;
        let viewport = self.viewport;
        self.screen.clear();
        self.screen
            .extend(survivors.iter().map(|v| to_screen(&viewport, v)));

        self.target.draw_polygon(
            &self.screen,
            &style.to_polygon_style(scale_width(style.outline_width, factor)),
        )
    }
}
