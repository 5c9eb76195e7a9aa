//! Transform request model and queue wire format.
//!
//! A [`TransformSpec`] is an ordered, all-optional set of operations. It is
//! validated once on submission and then travels inside a [`TransformTask`]
//! through the queue unchanged.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct Crop {
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub width: u32,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct Resize {
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub width: u32,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub height: u32,
}

/// Fill colour for the area uncovered by a non right-angle rotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct Background {
    #[validate(range(max = 255, message = "must be between 0 and 255"))]
    pub r: u16,
    #[validate(range(max = 255, message = "must be between 0 and 255"))]
    pub g: u16,
    #[validate(range(max = 255, message = "must be between 0 and 255"))]
    pub b: u16,
    #[validate(range(min = 0.0, max = 1.0, message = "must be between 0 and 1"))]
    pub alpha: f32,
}

impl Default for Background {
    fn default() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            alpha: 0.0,
        }
    }
}

impl Background {
    pub fn to_rgba(&self) -> [u8; 4] {
        [
            self.r.min(255) as u8,
            self.g.min(255) as u8,
            self.b.min(255) as u8,
            (self.alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct Rotate {
    /// Clockwise rotation in degrees.
    pub angle: f32,
    #[serde(default)]
    #[validate(nested)]
    pub background: Background,
}

/// Largest accepted blur sigma. Blur cost grows linearly with sigma.
pub const MAX_BLUR_SIGMA: f32 = 1000.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Filters {
    #[serde(default)]
    pub grayscale: bool,
    #[serde(default)]
    pub sepia: bool,
}

/// Requested operations. Absent fields are skipped by the engine, which
/// always applies the present ones in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct TransformSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub crop: Option<Crop>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub resize: Option<Resize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub rotate: Option<Rotate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 1000.0, message = "must be between 0 and 1000"))]
    pub blur: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Filters>,
}

impl TransformSpec {
    pub fn is_empty(&self) -> bool {
        self.crop.is_none()
            && self.resize.is_none()
            && self.rotate.is_none()
            && self.blur.is_none()
            && self.filters.is_none()
    }
}

/// Field order used when reporting violations: pipeline order first, then
/// the order fields are declared in their structs.
const FIELD_ORDER: &[&str] = &[
    "crop",
    "resize",
    "rotate",
    "blur",
    "filters",
    "width",
    "height",
    "x",
    "y",
    "angle",
    "background",
    "r",
    "g",
    "b",
    "alpha",
];

fn field_rank(name: &str) -> usize {
    FIELD_ORDER
        .iter()
        .position(|f| *f == name)
        .unwrap_or(FIELD_ORDER.len())
}

/// Returns the first violation as `path.to.field: reason`.
///
/// `ValidationErrors` is backed by a hash map, so fields are ranked explicitly
/// to keep the reported violation stable between requests.
pub fn first_violation(errors: &ValidationErrors) -> Option<String> {
    first_violation_at(errors, "")
}

fn first_violation_at(errors: &ValidationErrors, prefix: &str) -> Option<String> {
    let mut fields: Vec<(String, &ValidationErrorsKind)> = errors
        .errors()
        .iter()
        .map(|(field, kind)| (field.to_string(), kind))
        .collect();
    fields.sort_by(|a, b| field_rank(&a.0).cmp(&field_rank(&b.0)).then(a.0.cmp(&b.0)));

    for (field, kind) in fields {
        let path = if prefix.is_empty() {
            field
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                if let Some(err) = errs.first() {
                    let reason = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| err.code.to_string());
                    return Some(format!("{}: {}", path, reason));
                }
            }
            ValidationErrorsKind::Struct(inner) => {
                if let Some(found) = first_violation_at(inner, &path) {
                    return Some(found);
                }
            }
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    if let Some(found) = first_violation_at(inner, &format!("{}[{}]", path, index))
                    {
                        return Some(found);
                    }
                }
            }
        }
    }

    None
}

/// A queued transform job.
///
/// Serialized as `{taskId, imageId, transformPayload}`; `attempts` counts
/// failed processing attempts and is absent on first submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformTask {
    pub task_id: Uuid,
    pub image_id: Uuid,
    pub transform_payload: TransformSpec,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub attempts: u32,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

impl TransformTask {
    pub fn new(image_id: Uuid, transform_payload: TransformSpec) -> Self {
        Self {
            task_id: Uuid::new_v4(),
            image_id,
            transform_payload,
            attempts: 0,
        }
    }
}
