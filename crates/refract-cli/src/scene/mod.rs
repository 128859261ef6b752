//! Demo scene service served by `rfx`.
//!
//! The scene is plain in-memory state behind a mutex. Every endpoint is a
//! thin closure over it; rendering and model loading are simulated so the
//! task, progress, cancellation and upload paths all have real callers.

mod types;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use refract_adapter::math::Plane;
use refract_adapter::property::{
    PropertyMap, PropertyMetadata, PropertyValue, property_map_schema, property_map_to_json,
    update_property_map,
};
use refract_adapter::{JsonAdapter, deserialize_into};
use refract_core::JsonValue;
use refract_rpc::{Dispatcher, RpcError, TaskContext, TaskError};
use refract_schema::JsonSchema;

use types::{
    Camera, ClipPlane, ModelInfo, ModelUpload, Shading, ShadingParams, Snapshot, SnapshotParams,
};

/// Simulated time per accumulated sample.
const SAMPLE_TIME: Duration = Duration::from_millis(10);

#[derive(Debug)]
struct SceneState {
    camera: Camera,
    renderer: PropertyMap,
    shading: Shading,
    clip_planes: Vec<ClipPlane>,
    next_plane_id: u32,
    models: Vec<ModelInfo>,
    next_model_id: u32,
}

impl Default for SceneState {
    fn default() -> Self {
        Self {
            camera: Camera::default(),
            renderer: default_renderer(),
            shading: Shading::default(),
            clip_planes: Vec::new(),
            next_plane_id: 0,
            models: Vec::new(),
            next_model_id: 0,
        }
    }
}

fn default_renderer() -> PropertyMap {
    let mut renderer = PropertyMap::new();
    renderer
        .add(
            "samplesPerPixel",
            1_u32,
            PropertyMetadata::new("Samples per pixel").with_bounds(1.0, 256.0),
        )
        .add(
            "maxRayDepth",
            3_i32,
            PropertyMetadata::new("Max ray depth").with_bounds(1.0, 32.0),
        )
        .add(
            "backgroundColor",
            [0.0, 0.0, 0.0],
            PropertyMetadata::new("Background color"),
        )
        .add(
            "alphaCorrection",
            0.5,
            PropertyMetadata::new("Alpha correction").with_bounds(0.001, 1.0),
        )
        .add(
            "denoiser",
            PropertyValue::Enum("none".into()),
            PropertyMetadata::new("Denoiser").with_options(["none", "fast", "accurate"]),
        )
        .add(
            "engineVersion",
            env!("CARGO_PKG_VERSION"),
            PropertyMetadata::new("Engine version").read_only(),
        );
    renderer
}

/// Shared handle on the scene, cloned into every endpoint.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    state: Arc<Mutex<SceneState>>,
}

/// A dispatcher with a fresh scene bound to it.
pub fn dispatcher() -> Dispatcher {
    let mut dispatcher = Dispatcher::new();
    Scene::default().bind(&mut dispatcher);
    dispatcher
}

impl Scene {
    fn state(&self) -> MutexGuard<'_, SceneState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn bind(&self, dispatcher: &mut Dispatcher) {
        self.bind_camera(dispatcher);
        self.bind_renderer(dispatcher);
        self.bind_clip_planes(dispatcher);
        self.bind_models(dispatcher);
        self.bind_rendering(dispatcher);
    }

    fn bind_camera(&self, dispatcher: &mut Dispatcher) {
        let scene = self.clone();
        dispatcher.bind_request("get-camera", "Get the current camera", move |(): ()| {
            Ok(scene.state().camera.clone())
        });

        let scene = self.clone();
        dispatcher.bind_raw_request(
            "set-camera",
            "Update the camera; omitted fields keep their value",
            Camera::schema(),
            JsonSchema::null(),
            move |params| {
                deserialize_into(&params, &mut scene.state().camera)?;
                Ok(JsonValue::Null)
            },
        );
    }

    fn bind_renderer(&self, dispatcher: &mut Dispatcher) {
        let schema = property_map_schema(&self.state().renderer);

        let scene = self.clone();
        dispatcher.bind_raw_request(
            "get-renderer-params",
            "Get the renderer parameters",
            JsonSchema::null(),
            schema.clone(),
            move |_| Ok(property_map_to_json(&scene.state().renderer)),
        );

        let scene = self.clone();
        dispatcher.bind_raw_request(
            "set-renderer-params",
            "Update some renderer parameters, all or nothing",
            schema,
            JsonSchema::null(),
            move |params| {
                update_property_map(&mut scene.state().renderer, &params)
                    .map_err(|error| RpcError::invalid_params(error.to_string()))?;
                Ok(JsonValue::Null)
            },
        );
    }

    fn bind_clip_planes(&self, dispatcher: &mut Dispatcher) {
        let scene = self.clone();
        dispatcher.bind_request("add-clip-plane", "Add a clip plane", move |plane: Plane| {
            let mut state = scene.state();
            let clip_plane = ClipPlane {
                id: state.next_plane_id,
                plane,
            };
            state.next_plane_id += 1;
            state.clip_planes.push(clip_plane.clone());
            Ok(clip_plane)
        });

        let scene = self.clone();
        dispatcher.bind_request("get-clip-planes", "Get all clip planes", move |(): ()| {
            Ok(scene.state().clip_planes.clone())
        });

        let scene = self.clone();
        dispatcher.bind_request(
            "remove-clip-planes",
            "Remove clip planes by ID, unknown IDs are ignored",
            move |ids: Vec<u32>| {
                scene
                    .state()
                    .clip_planes
                    .retain(|plane| !ids.contains(&plane.id));
                Ok(())
            },
        );
    }

    fn bind_models(&self, dispatcher: &mut Dispatcher) {
        let scene = self.clone();
        dispatcher.bind_request("get-models", "Get all models", move |(): ()| {
            Ok(scene.state().models.clone())
        });

        let scene = self.clone();
        dispatcher.bind_request("remove-model", "Remove models by ID", move |ids: Vec<u32>| {
            let mut state = scene.state();
            if let Some(missing) = ids
                .iter()
                .find(|id| !state.models.iter().any(|model| model.id == **id))
            {
                return Err(RpcError::not_found(format!("Model {missing} not found")));
            }
            state.models.retain(|model| !ids.contains(&model.id));
            Ok(())
        });

        let scene = self.clone();
        dispatcher.bind_upload(
            "upload-model",
            "Upload a model as binary chunks",
            move |upload: ModelUpload, context: &TaskContext| {
                let mut received = 0_u64;
                while received < upload.size {
                    let chunk = context.receive_chunk()?;
                    received += chunk.len() as u64;
                    context.progress("Receiving model", received as f64 / upload.size as f64);
                }
                if received != upload.size {
                    return Err(TaskError::failed(format!(
                        "Received {received} bytes, {} announced",
                        upload.size
                    )));
                }

                let mut state = scene.state();
                let model = ModelInfo {
                    id: state.next_model_id,
                    name: upload.name,
                    size: received,
                    visible: true,
                };
                state.next_model_id += 1;
                state.models.push(model.clone());
                tracing::info!(id = model.id, bytes = received, "model uploaded");
                Ok(model)
            },
        );
    }

    fn bind_rendering(&self, dispatcher: &mut Dispatcher) {
        let scene = self.clone();
        dispatcher.bind_notification(
            "set-shading",
            "Change the shading mode",
            move |params: ShadingParams| {
                scene.state().shading = params.shading;
                Ok(())
            },
        );

        let scene = self.clone();
        dispatcher.bind_task(
            "snapshot",
            "Render a frame",
            move |params: SnapshotParams, context: &TaskContext| {
                if params.size.iter().any(|extent| *extent <= 0) {
                    return Err(TaskError::failed("Snapshot size must be positive"));
                }
                let samples = params.samples_per_pixel.max(1);
                for sample in 1..=samples {
                    context.check_cancelled()?;
                    std::thread::sleep(SAMPLE_TIME);
                    context.progress("Rendering snapshot", f64::from(sample) / f64::from(samples));
                }

                let state = scene.state();
                let models = state.models.iter().filter(|model| model.visible).count();
                Ok(Snapshot {
                    size: params.size,
                    samples,
                    shading: state.shading,
                    models: u32::try_from(models).unwrap_or(u32::MAX),
                })
            },
        );
    }
}

#[cfg(test)]
mod tests;
