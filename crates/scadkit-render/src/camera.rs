//! Camera parameters and the fixed set of matrix viewpoints
//!
//! OpenSCAD's gimbal camera is `translate, rotate, distance`: the translation
//! is the point looked at, the rotation is in degrees about X, Y and Z, and
//! the distance is measured from that point. A rotation of `(0, 0, 0)` looks
//! straight down the Z axis.

use glam::Vec3;
use scadkit_core::Bounds;

/// OpenSCAD's own default view rotation
pub const DEFAULT_ROTATION: Vec3 = Vec3::new(55.0, 0.0, 25.0);

/// Distance as a multiple of the bounding box diagonal
pub const FRAMING_MARGIN: f32 = 2.2;

/// Smallest distance ever used, so tiny parts still render
pub const MIN_DISTANCE: f32 = 1.0;

/// A resolved OpenSCAD gimbal camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Point the camera looks at
    pub target: Vec3,
    /// Rotation about X, Y, Z in degrees
    pub rotation: Vec3,
    pub distance: f32,
    /// Let OpenSCAD center the view on the model instead of `target`
    pub autocenter: bool,
    /// Let OpenSCAD pick the distance that fits the whole model
    pub viewall: bool,
}

impl Camera {
    /// Camera that frames `bounds` from `rotation`
    pub fn framing(bounds: &Bounds, rotation: Vec3) -> Self {
        Self {
            target: bounds.center(),
            rotation,
            distance: framing_distance(bounds),
            autocenter: false,
            viewall: false,
        }
    }

    /// Camera that leaves centering and zoom to OpenSCAD
    pub fn fit_model(rotation: Vec3) -> Self {
        Self {
            target: Vec3::ZERO,
            rotation,
            distance: MIN_DISTANCE,
            autocenter: true,
            viewall: true,
        }
    }

    /// Value for OpenSCAD's `--camera` flag
    pub fn to_arg(&self) -> String {
        format!(
            "--camera={},{},{},{},{},{},{}",
            self.target.x,
            self.target.y,
            self.target.z,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
            self.distance
        )
    }

    /// All camera-related flags
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![self.to_arg()];
        if self.viewall {
            args.push("--viewall".to_string());
        }
        if self.autocenter {
            args.push("--autocenter".to_string());
        }
        args
    }
}

/// Distance that keeps the whole bounding box in view
pub fn framing_distance(bounds: &Bounds) -> f32 {
    (bounds.diagonal() * FRAMING_MARGIN).max(MIN_DISTANCE)
}

/// Camera parameters supplied by the caller; any may be omitted
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraOverrides {
    pub rotation_x: Option<f32>,
    pub rotation_y: Option<f32>,
    pub rotation_z: Option<f32>,
    pub distance: Option<f32>,
}

impl CameraOverrides {
    /// True when every parameter was supplied and no probe is needed
    pub fn is_complete(&self) -> bool {
        self.rotation_x.is_some()
            && self.rotation_y.is_some()
            && self.rotation_z.is_some()
            && self.distance.is_some()
    }

    fn rotation(&self) -> Vec3 {
        Vec3::new(
            self.rotation_x.unwrap_or(DEFAULT_ROTATION.x),
            self.rotation_y.unwrap_or(DEFAULT_ROTATION.y),
            self.rotation_z.unwrap_or(DEFAULT_ROTATION.z),
        )
    }

    /// Resolve into a camera
    ///
    /// With probed `bounds` the view targets the box center and a missing
    /// distance is derived from its size. Without bounds the camera looks
    /// at the origin and OpenSCAD autocenters on the model; a missing
    /// distance is left to `--viewall`.
    pub fn resolve(&self, bounds: Option<&Bounds>) -> Camera {
        let rotation = self.rotation();
        match bounds {
            Some(bounds) => {
                let framed = Camera::framing(bounds, rotation);
                Camera {
                    distance: self.distance.unwrap_or(framed.distance),
                    ..framed
                }
            }
            None => Camera {
                target: Vec3::ZERO,
                rotation,
                distance: self.distance.unwrap_or(MIN_DISTANCE),
                autocenter: true,
                viewall: self.distance.is_none(),
            },
        }
    }
}

/// The fourteen fixed viewpoints of the views matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewAngle {
    Top,
    Bottom,
    Front,
    Back,
    Left,
    Right,
    IsoFrontLeftTop,
    IsoFrontRightTop,
    IsoBackLeftTop,
    IsoBackRightTop,
    IsoFrontLeftBottom,
    IsoFrontRightBottom,
    IsoBackLeftBottom,
    IsoBackRightBottom,
}

impl ViewAngle {
    /// Every view, in matrix order
    pub const ALL: [ViewAngle; 14] = [
        Self::Top,
        Self::Bottom,
        Self::Front,
        Self::Back,
        Self::Left,
        Self::Right,
        Self::IsoFrontLeftTop,
        Self::IsoFrontRightTop,
        Self::IsoBackLeftTop,
        Self::IsoBackRightTop,
        Self::IsoFrontLeftBottom,
        Self::IsoFrontRightBottom,
        Self::IsoBackLeftBottom,
        Self::IsoBackRightBottom,
    ];

    /// Label drawn under the view in the matrix
    pub fn label(self) -> &'static str {
        match self {
            Self::Top => "Top",
            Self::Bottom => "Bottom",
            Self::Front => "Front",
            Self::Back => "Back",
            Self::Left => "Left",
            Self::Right => "Right",
            Self::IsoFrontLeftTop => "Iso-FrontLeftTop",
            Self::IsoFrontRightTop => "Iso-FrontRightTop",
            Self::IsoBackLeftTop => "Iso-BackLeftTop",
            Self::IsoBackRightTop => "Iso-BackRightTop",
            Self::IsoFrontLeftBottom => "Iso-FrontLeftBottom",
            Self::IsoFrontRightBottom => "Iso-FrontRightBottom",
            Self::IsoBackLeftBottom => "Iso-BackLeftBottom",
            Self::IsoBackRightBottom => "Iso-BackRightBottom",
        }
    }

    /// Gimbal rotation in degrees
    ///
    /// `rx = 90` tilts the camera to the horizon; `rz` then swings it from
    /// the front (-Y side) toward +X.
    pub fn rotation(self) -> Vec3 {
        const ISO_TOP: f32 = 55.0;
        const ISO_BOTTOM: f32 = 125.0;

        let (rx, rz) = match self {
            Self::Top => (0.0, 0.0),
            Self::Bottom => (180.0, 0.0),
            Self::Front => (90.0, 0.0),
            Self::Back => (90.0, 180.0),
            Self::Left => (90.0, 270.0),
            Self::Right => (90.0, 90.0),
            Self::IsoFrontLeftTop => (ISO_TOP, 315.0),
            Self::IsoFrontRightTop => (ISO_TOP, 45.0),
            Self::IsoBackLeftTop => (ISO_TOP, 225.0),
            Self::IsoBackRightTop => (ISO_TOP, 135.0),
            Self::IsoFrontLeftBottom => (ISO_BOTTOM, 315.0),
            Self::IsoFrontRightBottom => (ISO_BOTTOM, 45.0),
            Self::IsoBackLeftBottom => (ISO_BOTTOM, 225.0),
            Self::IsoBackRightBottom => (ISO_BOTTOM, 135.0),
        };
        Vec3::new(rx, 0.0, rz)
    }

    /// Parse a view from its label, case-insensitively
    ///
    /// The `Iso-` dash is optional, so `isofrontlefttop` also works.
    pub fn parse(s: &str) -> Option<Self> {
        let wanted: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        Self::ALL.into_iter().find(|view| {
            view.label()
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .eq_ignore_ascii_case(&wanted)
        })
    }

    /// Labels of every view, in matrix order
    pub fn all_labels() -> [&'static str; 14] {
        Self::ALL.map(Self::label)
    }
}

impl std::str::FromStr for ViewAngle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            format!(
                "Unknown view '{}'. Valid options: {}",
                s,
                Self::all_labels().join(", ")
            )
        })
    }
}

impl std::fmt::Display for ViewAngle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box() -> Bounds {
        Bounds::from_points(&[Vec3::ZERO, Vec3::new(2.0, 2.0, 1.0)], 12).unwrap()
    }

    #[test]
    fn labels_are_in_fixed_order() {
        assert_eq!(
            ViewAngle::all_labels(),
            [
                "Top",
                "Bottom",
                "Front",
                "Back",
                "Left",
                "Right",
                "Iso-FrontLeftTop",
                "Iso-FrontRightTop",
                "Iso-BackLeftTop",
                "Iso-BackRightTop",
                "Iso-FrontLeftBottom",
                "Iso-FrontRightBottom",
                "Iso-BackLeftBottom",
                "Iso-BackRightBottom",
            ]
        );
    }

    #[test]
    fn views_have_distinct_rotations() {
        for (i, a) in ViewAngle::ALL.iter().enumerate() {
            for b in &ViewAngle::ALL[i + 1..] {
                assert_ne!(a.rotation(), b.rotation(), "{a} and {b} share a rotation");
            }
        }
    }

    #[test]
    fn parse_views() {
        assert_eq!(ViewAngle::parse("top"), Some(ViewAngle::Top));
        assert_eq!(ViewAngle::parse("Iso-BackLeftTop"), Some(ViewAngle::IsoBackLeftTop));
        assert_eq!(ViewAngle::parse("isofrontrightbottom"), Some(ViewAngle::IsoFrontRightBottom));
        assert_eq!(ViewAngle::parse("sideways"), None);
        assert!("sideways".parse::<ViewAngle>().unwrap_err().contains("Valid options"));
    }

    #[test]
    fn framing_targets_box_center() {
        let camera = Camera::framing(&unit_box(), ViewAngle::Front.rotation());
        assert_eq!(camera.target, Vec3::new(1.0, 1.0, 0.5));
        assert_relative_eq!(camera.distance, 3.0 * FRAMING_MARGIN);
        assert!(!camera.autocenter);
    }

    #[test]
    fn tiny_parts_use_minimum_distance() {
        let tiny = Bounds::from_points(&[Vec3::ZERO, Vec3::splat(0.01)], 1).unwrap();
        assert_relative_eq!(framing_distance(&tiny), MIN_DISTANCE);
    }

    #[test]
    fn camera_arg_format() {
        let camera = Camera {
            target: Vec3::new(1.0, 2.0, 3.0),
            rotation: Vec3::new(55.0, 0.0, 25.0),
            distance: 140.5,
            autocenter: false,
            viewall: false,
        };
        assert_eq!(camera.to_arg(), "--camera=1,2,3,55,0,25,140.5");
        assert_eq!(camera.to_args().len(), 1);
    }

    #[test]
    fn overrides_fill_missing_values() {
        let overrides = CameraOverrides {
            rotation_z: Some(90.0),
            ..Default::default()
        };
        assert!(!overrides.is_complete());
        let camera = overrides.resolve(Some(&unit_box()));
        assert_eq!(camera.rotation, Vec3::new(55.0, 0.0, 90.0));
        assert_relative_eq!(camera.distance, 3.0 * FRAMING_MARGIN);
    }

    #[test]
    fn complete_overrides_autocenter_without_bounds() {
        let overrides = CameraOverrides {
            rotation_x: Some(10.0),
            rotation_y: Some(20.0),
            rotation_z: Some(30.0),
            distance: Some(50.0),
        };
        assert!(overrides.is_complete());
        let camera = overrides.resolve(None);
        assert_eq!(camera.target, Vec3::ZERO);
        assert_eq!(camera.distance, 50.0);
        assert!(camera.autocenter);
        assert!(!camera.viewall);
        assert_eq!(camera.to_args()[1], "--autocenter");
    }

    #[test]
    fn missing_distance_without_bounds_uses_viewall() {
        let camera = CameraOverrides::default().resolve(None);
        assert_eq!(camera.rotation, DEFAULT_ROTATION);
        assert!(camera.viewall);
        assert_eq!(&camera.to_args()[1..], ["--viewall", "--autocenter"]);
    }
}
