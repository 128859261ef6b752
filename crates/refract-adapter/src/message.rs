//! Message reflection: aggregates with a registered field list.
//!
//! A message type implements [`JsonMessage::register`] once, naming each
//! field with its accessor pair and documentation. [`json_message!`]
//! then implements [`JsonAdapter`] for it by delegating to the cached
//! [`MessageInfo`].
//!
//! ```
//! use refract_adapter::{JsonMessage, MessageBuilder, json_message, serialize};
//! use refract_adapter::math::Vector3d;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! pub struct Camera {
//!     pub current: String,
//!     pub position: Vector3d,
//! }
//!
//! impl Default for Camera {
//!     fn default() -> Self {
//!         Self { current: "perspective".into(), position: [0.0, 0.0, 1.0] }
//!     }
//! }
//!
//! impl JsonMessage for Camera {
//!     fn register(message: &mut MessageBuilder<Self>) {
//!         message.title("Camera");
//!         message
//!             .field("current", |c| &c.current, |c| &mut c.current)
//!             .description("Camera type")
//!             .required();
//!         message
//!             .field("position", |c| &c.position, |c| &mut c.position)
//!             .description("Camera position");
//!     }
//! }
//!
//! json_message!(Camera);
//!
//! let json = serialize(&Camera::default()).unwrap();
//! assert_eq!(json.to_string(), r#"{"current":"perspective","position":[0.0,0.0,1.0]}"#);
//! ```
//!
//! Deserialization is open-world: unknown keys are ignored, missing keys
//! keep the field's current value, and a field that fails to decode is
//! left unchanged. `required` is schema metadata only.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{LazyLock, PoisonError, RwLock};

use refract_core::{JsonObject, JsonType, JsonValue};
use refract_schema::JsonSchema;

use crate::adapter::JsonAdapter;
use crate::error::AdapterError;

type FieldReader<M> = Box<dyn Fn(&M) -> Result<JsonValue, AdapterError> + Send + Sync>;
type FieldWriter<M> = Box<dyn Fn(&mut M, &JsonValue) -> Result<(), AdapterError> + Send + Sync>;

/// An aggregate whose fields are declared once and reflected from then on.
pub trait JsonMessage: Default + Send + Sync + 'static {
    /// Declare title, description and fields in wire order.
    fn register(message: &mut MessageBuilder<Self>);
}

/// One registered field: wire name, schema and type-erased accessors.
pub struct FieldInfo<M> {
    name: String,
    schema: JsonSchema,
    required: bool,
    read: FieldReader<M>,
    write: FieldWriter<M>,
}

impl<M> FieldInfo<M> {
    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        self.schema.description = description.into();
        self
    }

    pub fn title(&mut self, title: impl Into<String>) -> &mut Self {
        self.schema.title = title.into();
        self
    }

    /// Mark the field as required in the schema. Decoding does not enforce it.
    pub const fn required(&mut self) -> &mut Self {
        self.required = true;
        self
    }

    pub const fn minimum(&mut self, minimum: f64) -> &mut Self {
        self.schema.minimum = Some(minimum);
        self
    }

    pub const fn maximum(&mut self, maximum: f64) -> &mut Self {
        self.schema.maximum = Some(maximum);
        self
    }

    /// Item-count bounds for sequence fields.
    pub const fn items(&mut self, min: usize, max: usize) -> &mut Self {
        self.schema.min_items = Some(min);
        self.schema.max_items = Some(max);
        self
    }

    pub const fn read_only(&mut self) -> &mut Self {
        self.schema.read_only = true;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn schema(&self) -> &JsonSchema {
        &self.schema
    }

    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }
}

/// Collects the field list during [`JsonMessage::register`].
pub struct MessageBuilder<M> {
    title: String,
    description: String,
    fields: Vec<FieldInfo<M>>,
}

impl<M: 'static> MessageBuilder<M> {
    const fn new() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            fields: Vec::new(),
        }
    }

    pub fn title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = title.into();
        self
    }

    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = description.into();
        self
    }

    /// Register a field. Registering the same name twice replaces the earlier
    /// registration in place.
    pub fn field<F: JsonAdapter + 'static>(
        &mut self,
        name: &str,
        get: fn(&M) -> &F,
        get_mut: fn(&mut M) -> &mut F,
    ) -> &mut FieldInfo<M> {
        let field = FieldInfo {
            name: name.to_owned(),
            schema: F::schema(),
            required: false,
            read: Box::new(move |message| get(message).to_json()),
            write: Box::new(move |message, json| get_mut(message).update_from_json(json)),
        };

        let index = match self.fields.iter().position(|existing| existing.name == name) {
            Some(index) => {
                self.fields[index] = field;
                index
            }
            None => {
                self.fields.push(field);
                self.fields.len() - 1
            }
        };
        &mut self.fields[index]
    }

    /// Register every field of another message, e.g. a shared base.
    pub fn extend<B: JsonMessage>(&mut self, base: fn(&M) -> &B, base_mut: fn(&mut M) -> &mut B) {
        for field in &message_info::<B>().fields {
            let name = field.name.clone();
            let read_name = name.clone();
            let write_name = name.clone();
            self.fields.retain(|existing| existing.name != name);
            self.fields.push(FieldInfo {
                name,
                schema: field.schema.clone(),
                required: field.required,
                read: Box::new(move |message| {
                    message_info::<B>().read_field(base(message), &read_name)
                }),
                write: Box::new(move |message, json| {
                    message_info::<B>().write_field(base_mut(message), &write_name, json)
                }),
            });
        }
    }

    /// Remove a previously registered field. Returns whether it existed.
    pub fn remove_field(&mut self, name: &str) -> bool {
        let before = self.fields.len();
        self.fields.retain(|field| field.name != name);
        before != self.fields.len()
    }
}

/// The reflected field list of a message type, built once per process.
pub struct MessageInfo<M> {
    schema: JsonSchema,
    fields: Vec<FieldInfo<M>>,
}

impl<M: JsonMessage> MessageInfo<M> {
    fn build() -> Self {
        let mut builder = MessageBuilder::new();
        M::register(&mut builder);

        let sample = M::default();
        let mut schema = JsonSchema::object()
            .with_title(builder.title)
            .with_description(builder.description);
        for field in &mut builder.fields {
            if let Ok(default) = (field.read)(&sample) {
                field.schema.default = Some(default);
            }
            schema.add_property(field.name.clone(), field.schema.clone(), field.required);
        }

        Self {
            schema,
            fields: builder.fields,
        }
    }

    /// Object schema with one property per field, in registration order.
    #[must_use]
    pub const fn schema(&self) -> &JsonSchema {
        &self.schema
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldInfo<M>> {
        self.fields.iter()
    }

    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.name.as_str()).collect()
    }

    /// Encode every field. Fields that have no value (`None`) are omitted.
    ///
    /// # Errors
    ///
    /// Any other field failure is reported as `AdapterError::Field`.
    pub fn serialize(&self, message: &M) -> Result<JsonValue, AdapterError> {
        let mut object = JsonObject::new();
        for field in &self.fields {
            match (field.read)(message) {
                Ok(value) => {
                    object.insert(field.name.clone(), value);
                }
                Err(AdapterError::Empty) => {}
                Err(error) => {
                    return Err(AdapterError::Field {
                        field: field.name.clone(),
                        source: Box::new(error),
                    });
                }
            }
        }
        Ok(JsonValue::Object(object))
    }

    /// Decode the fields present in `json` into `message`.
    ///
    /// # Errors
    ///
    /// Only a non-object input is an error; per-field failures are logged
    /// and the field keeps its value.
    pub fn deserialize(&self, json: &JsonValue, message: &mut M) -> Result<(), AdapterError> {
        let object = json
            .as_object()
            .ok_or_else(|| AdapterError::mismatch(JsonType::Object, json))?;
        for field in &self.fields {
            let Some(value) = object.get(&field.name) else {
                continue;
            };
            if let Err(error) = (field.write)(message, value) {
                tracing::debug!(
                    message = %self.schema.title,
                    field = %field.name,
                    %error,
                    "field left unchanged"
                );
            }
        }
        Ok(())
    }

    fn find(&self, name: &str) -> Option<&FieldInfo<M>> {
        self.fields.iter().find(|field| field.name == name)
    }

    fn read_field(&self, message: &M, name: &str) -> Result<JsonValue, AdapterError> {
        self.find(name)
            .map_or(Err(AdapterError::Empty), |field| (field.read)(message))
    }

    fn write_field(&self, message: &mut M, name: &str, json: &JsonValue) -> Result<(), AdapterError> {
        self.find(name)
            .map_or(Ok(()), |field| (field.write)(message, json))
    }
}

type Registry = HashMap<TypeId, &'static (dyn Any + Send + Sync)>;

static REGISTRY: LazyLock<RwLock<Registry>> = LazyLock::new(|| RwLock::new(HashMap::new()));

/// The process-wide [`MessageInfo`] of `M`, built on first use.
///
/// Registration runs outside the registry lock so that messages nesting
/// other messages can resolve them while registering. If two threads race,
/// the first insert wins and every caller gets the same instance.
///
/// # Panics
///
/// Panics if the registry holds an entry of the wrong type for `M`, which
/// cannot happen since entries are keyed by `TypeId`.
#[must_use]
pub fn message_info<M: JsonMessage>() -> &'static MessageInfo<M> {
    let key = TypeId::of::<M>();

    let cached = REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
        .copied();
    let entry = if let Some(entry) = cached {
        entry
    } else {
        let built: &'static (dyn Any + Send + Sync) =
            Box::leak(Box::new(MessageInfo::<M>::build()));
        let mut registry = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
        *registry.entry(key).or_insert(built)
    };

    entry
        .downcast_ref::<MessageInfo<M>>()
        .expect("message registry entries are keyed by TypeId")
}

/// Implement [`JsonAdapter`](crate::JsonAdapter) for one or more
/// [`JsonMessage`] types.
#[macro_export]
macro_rules! json_message {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::JsonAdapter for $ty {
            fn schema() -> $crate::JsonSchema {
                $crate::message::message_info::<Self>().schema().clone()
            }

            fn to_json(&self) -> ::core::result::Result<$crate::JsonValue, $crate::AdapterError> {
                $crate::message::message_info::<Self>().serialize(self)
            }

            fn update_from_json(
                &mut self,
                json: &$crate::JsonValue,
            ) -> ::core::result::Result<(), $crate::AdapterError> {
                $crate::message::message_info::<Self>().deserialize(json, self)
            }
        }
    )+};
}
