//! Cameras and their orbit controls.
//!
//! The export may declare several cameras; exactly one camera/control pair is
//! active at a time and only its control reacts to input.

use crate::constants::{
    DEFAULT_CAMERA_FAR, DEFAULT_CAMERA_FOV_DEGREES, DEFAULT_CAMERA_NEAR, DEFAULT_CAMERA_POSITION,
};
use crate::data::{CameraSpec, ProjectionSpec};
use crate::error::{Result, SceneError};
use glam::DVec3;

#[derive(Clone, Debug, PartialEq)]
pub enum Projection {
    Perspective {
        fovy_degrees: f64,
        aspect: f64,
    },
    Orthographic {
        frustum_size: f64,
        left: f64,
        right: f64,
        top: f64,
        bottom: f64,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub eye: DVec3,
    pub target: DVec3,
    pub up: DVec3,
}

/// Right-handed camera description.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub projection: Projection,
    pub pose: Pose,
    pub znear: f64,
    pub zfar: f64,
    initial: Pose,
}

impl Camera {
    pub fn new(projection: Projection, pose: Pose, znear: f64, zfar: f64) -> Self {
        Self {
            projection,
            pose,
            znear,
            zfar,
            initial: pose,
        }
    }

    pub fn from_spec(spec: &CameraSpec) -> Self {
        let projection = match spec.projection {
            ProjectionSpec::Perspective { fov } => Projection::Perspective {
                fovy_degrees: fov,
                aspect: 1.0,
            },
            ProjectionSpec::Orthographic { frustum_size } => Projection::Orthographic {
                frustum_size,
                left: -frustum_size / 2.0,
                right: frustum_size / 2.0,
                top: frustum_size / 2.0,
                bottom: -frustum_size / 2.0,
            },
        };
        let pose = Pose {
            eye: DVec3::from_array(spec.position),
            target: DVec3::from_array(spec.target),
            up: DVec3::from_array(spec.up),
        };
        Self::new(projection, pose, spec.near, spec.far)
    }

    /// Recompute the projection parameters for a viewport aspect ratio.
    pub fn update_projection(&mut self, aspect: f64) {
        match &mut self.projection {
            Projection::Perspective { aspect: a, .. } => *a = aspect,
            Projection::Orthographic {
                frustum_size,
                left,
                right,
                top,
                bottom,
            } => {
                *left = *frustum_size * aspect / -2.0;
                *right = *frustum_size * aspect / 2.0;
                *top = *frustum_size / 2.0;
                *bottom = -*frustum_size / 2.0;
            }
        }
    }

    pub fn reset(&mut self) {
        self.pose = self.initial;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(
            Projection::Perspective {
                fovy_degrees: DEFAULT_CAMERA_FOV_DEGREES,
                aspect: 1.0,
            },
            Pose {
                eye: DEFAULT_CAMERA_POSITION,
                target: DVec3::ZERO,
                up: DVec3::Y,
            },
            DEFAULT_CAMERA_NEAR,
            DEFAULT_CAMERA_FAR,
        )
    }
}

/// Orbit-style control state attached to one camera.
#[derive(Clone, Debug, PartialEq)]
pub struct Control {
    pub target: DVec3,
    pub enabled: bool,
}

#[derive(Debug)]
pub struct CameraRig {
    cameras: Vec<Camera>,
    controls: Vec<Control>,
    active: usize,
}

impl CameraRig {
    /// One camera per spec, or a single default camera when none are given.
    /// The first camera starts active.
    pub fn from_specs(specs: &[CameraSpec]) -> Self {
        let cameras: Vec<Camera> = if specs.is_empty() {
            vec![Camera::default()]
        } else {
            specs.iter().map(Camera::from_spec).collect()
        };
        let controls = cameras
            .iter()
            .enumerate()
            .map(|(i, c)| Control {
                target: c.pose.target,
                enabled: i == 0,
            })
            .collect();
        Self {
            cameras,
            controls,
            active: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active(&self) -> &Camera {
        &self.cameras[self.active]
    }

    pub fn active_mut(&mut self) -> &mut Camera {
        &mut self.cameras[self.active]
    }

    pub fn active_control(&self) -> &Control {
        &self.controls[self.active]
    }

    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    /// Make camera `index` active, enable only its control and refit its
    /// projection to `aspect`.
    pub fn switch(&mut self, index: usize, aspect: f64) -> Result<()> {
        if index >= self.cameras.len() {
            return Err(SceneError::UnknownCamera(index));
        }
        self.active = index;
        for (i, control) in self.controls.iter_mut().enumerate() {
            control.enabled = i == index;
        }
        self.update_projection(aspect);
        log::info!("[ui] camera {} active", index);
        Ok(())
    }

    pub fn update_projection(&mut self, aspect: f64) {
        self.active_mut().update_projection(aspect);
    }

    /// Point the active control (and its camera) at `target`.
    pub fn look_at(&mut self, target: DVec3) {
        self.controls[self.active].target = target;
        self.cameras[self.active].pose.target = target;
    }

    /// Adopt the eye and target an interactive orbit left the active pair at.
    pub fn orbit_to(&mut self, eye: DVec3, target: DVec3) {
        let active = self.active;
        self.controls[active].target = target;
        let pose = &mut self.cameras[active].pose;
        pose.eye = eye;
        pose.target = target;
    }

    /// Return every camera and control to its exported pose.
    pub fn reset(&mut self) {
        for (camera, control) in self.cameras.iter_mut().zip(&mut self.controls) {
            camera.reset();
            control.target = camera.pose.target;
        }
    }
}
