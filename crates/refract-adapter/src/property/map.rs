//! The property map container.

use indexmap::IndexMap;

use super::error::PropertyError;
use super::value::{PropertyKind, PropertyType, PropertyValue};

/// Documentation and constraints attached to a property.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyMetadata {
    pub label: String,
    pub description: String,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    /// Allowed names for enum properties.
    pub options: Vec<String>,
    pub read_only: bool,
}

impl PropertyMetadata {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub const fn with_bounds(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    #[must_use]
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub value: PropertyValue,
    pub metadata: PropertyMetadata,
}

impl Property {
    #[must_use]
    pub const fn kind(&self) -> PropertyKind {
        self.value.kind()
    }
}

/// Ordered, name-keyed set of runtime-typed properties.
///
/// Once added, a property keeps its kind: [`set`](Self::set),
/// [`update`](Self::update) and [`merge`](Self::merge) refuse or skip values
/// of another kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyMap {
    properties: IndexMap<String, Property>,
}

impl PropertyMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a property, kind and metadata included.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
        metadata: PropertyMetadata,
    ) -> &mut Self {
        self.properties.insert(
            name.into(),
            Property {
                value: value.into(),
                metadata,
            },
        );
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    /// Typed read.
    ///
    /// # Errors
    ///
    /// `Unknown` if absent, `KindMismatch` if the stored kind is not `T`'s.
    pub fn get_as<T: PropertyType>(&self, name: &str) -> Result<T, PropertyError> {
        let property = self
            .get(name)
            .ok_or_else(|| PropertyError::Unknown(name.to_owned()))?;
        T::from_value(&property.value).ok_or_else(|| PropertyError::KindMismatch {
            name: name.to_owned(),
            kind: T::KIND,
        })
    }

    /// Store a value, adding the property with default metadata if absent.
    ///
    /// # Errors
    ///
    /// `KindMismatch` if the property exists with another kind.
    pub fn set(
        &mut self,
        name: &str,
        value: impl Into<PropertyValue>,
    ) -> Result<(), PropertyError> {
        let value = value.into();
        match self.properties.get_mut(name) {
            Some(property) => replace_value(name, property, value),
            None => {
                self.add(name, value, PropertyMetadata::default());
                Ok(())
            }
        }
    }

    /// Replace the value of an existing property, keeping its metadata.
    ///
    /// # Errors
    ///
    /// `Unknown` if absent, `KindMismatch` if the kinds differ.
    pub fn update(
        &mut self,
        name: &str,
        value: impl Into<PropertyValue>,
    ) -> Result<(), PropertyError> {
        let property = self
            .properties
            .get_mut(name)
            .ok_or_else(|| PropertyError::Unknown(name.to_owned()))?;
        replace_value(name, property, value.into())
    }

    /// Copy values from `other` into same-named properties of the same
    /// kind. Other properties are left alone.
    pub fn merge(&mut self, other: &Self) {
        for (name, incoming) in &other.properties {
            if let Some(property) = self.properties.get_mut(name) {
                if property.kind() == incoming.kind() {
                    property.value.clone_from(&incoming.value);
                }
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Property> {
        self.properties.shift_remove(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.properties
            .iter()
            .map(|(name, property)| (name.as_str(), property))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

fn replace_value(
    name: &str,
    property: &mut Property,
    value: PropertyValue,
) -> Result<(), PropertyError> {
    if property.kind() != value.kind() {
        return Err(PropertyError::KindMismatch {
            name: name.to_owned(),
            kind: property.kind(),
        });
    }
    property.value = value;
    Ok(())
}
