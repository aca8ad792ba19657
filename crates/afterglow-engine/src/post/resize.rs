//! Viewport sizing of pipeline-owned resources.

use crate::camera::PerspectiveCamera;

use super::backend::{Backend, GpuContext, TargetKind};
use super::error::{FrameError, ResourceError};

/// Size in device pixels.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either side is zero (minimized window).
    #[inline]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn aspect(self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

const SCENE_LABEL: &str = "afterglow scene target";
const STAGE_LABELS: [&str; 2] = ["afterglow stage target A", "afterglow stage target B"];

/// Offscreen targets owned by the pipeline, all of one extent.
///
/// Stage outputs alternate between the two stage targets; the scene target is only
/// ever written by the scene render, so it stays readable for the whole frame.
pub struct RenderResources<T> {
    extent: Extent,
    scene: T,
    stages: [T; 2],
}

impl<T> RenderResources<T> {
    /// Allocates every target at `extent`. Nothing is returned unless all succeed.
    pub fn allocate<B, G>(gpu: &mut G, extent: Extent) -> Result<Self, ResourceError>
    where
        B: Backend<Target = T>,
        G: GpuContext<B>,
    {
        let scene = gpu.create_target(SCENE_LABEL, TargetKind::Scene, extent)?;
        let a = gpu.create_target(STAGE_LABELS[0], TargetKind::Stage, extent)?;
        let b = gpu.create_target(STAGE_LABELS[1], TargetKind::Stage, extent)?;
        Ok(Self { extent, scene, stages: [a, b] })
    }

    #[inline]
    pub fn extent(&self) -> Extent {
        self.extent
    }

    #[inline]
    pub fn scene(&self) -> &T {
        &self.scene
    }

    /// Output target for the `n`-th executed stage of a frame.
    #[inline]
    pub fn stage_output(&self, n: usize) -> &T {
        &self.stages[n % 2]
    }

    /// Checks that every target still matches `expected`.
    pub fn verify<B>(&self, expected: Extent) -> Result<(), FrameError>
    where
        B: Backend<Target = T>,
    {
        let targets = [
            (SCENE_LABEL, &self.scene),
            (STAGE_LABELS[0], &self.stages[0]),
            (STAGE_LABELS[1], &self.stages[1]),
        ];
        for (label, target) in targets {
            let found = B::target_extent(target);
            if found != expected {
                return Err(FrameError::ExtentMismatch { target: label, expected, found });
            }
        }
        Ok(())
    }
}

/// What a viewport change did.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ResizeOutcome {
    /// Surface, camera and targets now match the new extent.
    Resized,
    /// Targets already matched; at most the surface was reconfigured.
    Unchanged,
    /// Zero-sized viewport; rendering is suspended until a non-empty resize.
    Suspended,
}

/// Applies a viewport change to the surface, the camera and the render targets together.
pub struct ResizeCoordinator;

impl ResizeCoordinator {
    /// Resizes everything to `extent`.
    ///
    /// Targets are allocated before anything else is modified; on error the surface,
    /// camera and previous targets are left as they were.
    pub fn apply<B, G>(
        gpu: &mut G,
        camera: &mut PerspectiveCamera,
        resources: &mut Option<RenderResources<B::Target>>,
        extent: Extent,
    ) -> Result<ResizeOutcome, ResourceError>
    where
        B: Backend,
        G: GpuContext<B>,
    {
        if extent.is_empty() {
            gpu.resize_surface(extent);
            log::debug!("viewport {}x{} is empty; rendering suspended", extent.width, extent.height);
            return Ok(ResizeOutcome::Suspended);
        }

        let current = resources.as_ref().map(RenderResources::extent);
        if current == Some(extent) {
            if gpu.surface_extent() == extent {
                return Ok(ResizeOutcome::Unchanged);
            }
            // Restored from a minimize at the old size: targets and camera still fit.
            gpu.resize_surface(extent);
            log::debug!("surface restored at {}x{}", extent.width, extent.height);
            return Ok(ResizeOutcome::Resized);
        }

        let fresh = RenderResources::allocate::<B, G>(gpu, extent)?;

        gpu.resize_surface(extent);
        camera.set_aspect(extent.aspect());
        // Previous targets are released here.
        *resources = Some(fresh);

        log::debug!("viewport resized to {}x{}", extent.width, extent.height);
        Ok(ResizeOutcome::Resized)
    }
}
