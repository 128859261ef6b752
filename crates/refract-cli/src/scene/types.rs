//! Wire types of the demo scene.

use refract_adapter::math::{Plane, Vector2i, Vector3d};
use refract_adapter::{JsonMessage, MessageBuilder, json_enum, json_message};
use refract_rpc::ChunkedUpload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shading {
    None,
    #[default]
    Diffuse,
    Electron,
}

json_enum!(Shading {
    "none" => Shading::None,
    "diffuse" => Shading::Diffuse,
    "electron" => Shading::Electron,
});

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub current: String,
    pub position: Vector3d,
    pub target: Vector3d,
    pub up: Vector3d,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            current: "perspective".into(),
            position: [0.0, 0.0, 1.0],
            target: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
        }
    }
}

impl JsonMessage for Camera {
    fn register(message: &mut MessageBuilder<Self>) {
        message.title("Camera");
        message
            .field("current", |c| &c.current, |c| &mut c.current)
            .description("Camera type");
        message
            .field("position", |c| &c.position, |c| &mut c.position)
            .description("Eye position");
        message
            .field("target", |c| &c.target, |c| &mut c.target)
            .description("Point the camera looks at");
        message
            .field("up", |c| &c.up, |c| &mut c.up)
            .description("Up vector");
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipPlane {
    pub id: u32,
    pub plane: Plane,
}

impl JsonMessage for ClipPlane {
    fn register(message: &mut MessageBuilder<Self>) {
        message.title("ClipPlane");
        message
            .field("id", |p| &p.id, |p| &mut p.id)
            .description("Plane ID")
            .required()
            .read_only();
        message
            .field("plane", |p| &p.plane, |p| &mut p.plane)
            .description("Plane coefficients [a, b, c, d]")
            .required();
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelInfo {
    pub id: u32,
    pub name: String,
    pub size: u64,
    pub visible: bool,
}

impl JsonMessage for ModelInfo {
    fn register(message: &mut MessageBuilder<Self>) {
        message.title("Model");
        message
            .field("id", |m| &m.id, |m| &mut m.id)
            .description("Model ID")
            .required()
            .read_only();
        message
            .field("name", |m| &m.name, |m| &mut m.name)
            .description("Model name");
        message
            .field("size", |m| &m.size, |m| &mut m.size)
            .description("Payload size in bytes")
            .read_only();
        message
            .field("visible", |m| &m.visible, |m| &mut m.visible)
            .description("Whether the model is rendered");
    }
}

/// Params of `upload-model`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelUpload {
    pub chunks_id: String,
    pub size: u64,
    pub name: String,
}

impl JsonMessage for ModelUpload {
    fn register(message: &mut MessageBuilder<Self>) {
        message
            .field("chunks_id", |u| &u.chunks_id, |u| &mut u.chunks_id)
            .description("Name to select with the chunk method")
            .required();
        message
            .field("size", |u| &u.size, |u| &mut u.size)
            .description("Total payload size in bytes")
            .required();
        message
            .field("name", |u| &u.name, |u| &mut u.name)
            .description("Model name");
    }
}

impl ChunkedUpload for ModelUpload {
    fn chunks_id(&self) -> &str {
        &self.chunks_id
    }

    fn size(&self) -> u64 {
        self.size
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotParams {
    pub size: Vector2i,
    pub samples_per_pixel: u32,
}

impl Default for SnapshotParams {
    fn default() -> Self {
        Self {
            size: [64, 64],
            samples_per_pixel: 1,
        }
    }
}

impl JsonMessage for SnapshotParams {
    fn register(message: &mut MessageBuilder<Self>) {
        message
            .field("size", |s| &s.size, |s| &mut s.size)
            .description("Image size in pixels");
        message
            .field("samples_per_pixel", |s| &s.samples_per_pixel, |s| &mut s.samples_per_pixel)
            .description("Samples accumulated per pixel")
            .minimum(1.0);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub size: Vector2i,
    pub samples: u32,
    pub shading: Shading,
    pub models: u32,
}

impl JsonMessage for Snapshot {
    fn register(message: &mut MessageBuilder<Self>) {
        message.field("size", |s| &s.size, |s| &mut s.size);
        message.field("samples", |s| &s.samples, |s| &mut s.samples);
        message.field("shading", |s| &s.shading, |s| &mut s.shading);
        message
            .field("models", |s| &s.models, |s| &mut s.models)
            .description("Visible models in the frame");
    }
}

/// Params of `set-shading`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShadingParams {
    pub shading: Shading,
}

impl JsonMessage for ShadingParams {
    fn register(message: &mut MessageBuilder<Self>) {
        message
            .field("shading", |s| &s.shading, |s| &mut s.shading)
            .required();
    }
}

json_message!(Camera, ClipPlane, ModelInfo, ModelUpload, SnapshotParams, Snapshot, ShadingParams);
