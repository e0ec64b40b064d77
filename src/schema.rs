//! Model and data schema generation
//!
//! Types describe their own shape through [`SchemaType`], either by hand or
//! with the [`model_schema!`](crate::model_schema) macro. The
//! [`SchemaGenerator`] flattens that description into an ordered list of
//! field-name/type-name pairs. Nested structures contribute one entry for the
//! field itself followed by their own fields under a dotted path.
//!
//! ```rust
//! use mlops_core::model_schema;
//! use mlops_core::schema::SchemaGenerator;
//!
//! struct Address { city: String }
//! struct Input { age: u32, address: Option<Address> }
//!
//! model_schema!(Address { city: String });
//! model_schema!(Input { age: u32, address: Option<Address> });
//!
//! let definition = SchemaGenerator::new().generate::<Input>("ModelInput");
//! let names: Vec<&str> = definition.fields().iter().map(|f| f.name()).collect();
//! assert_eq!(names, ["age", "address", "address.city"]);
//! ```

use serde::{Deserialize, Serialize};

/// Self-description of a type used by the schema generator.
pub trait SchemaType {
    /// Display name of the type, e.g. `f32` or `Option<String>`.
    fn type_name() -> String;

    /// Fields of a structured type, in declaration order. Scalars have none.
    fn fields() -> Vec<FieldDescriptor> {
        Vec::new()
    }

    /// Identity of the structured type whose fields [`SchemaType::fields`]
    /// returns. Wrappers such as `Option<T>` report the identity of `T`.
    fn schema_key() -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// A described field: name, type name and (for structured types) children.
///
/// Children are expanded on demand so self-referential types can be
/// described.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    name: String,
    type_name: String,
    schema_key: &'static str,
    children: fn() -> Vec<FieldDescriptor>,
}

impl FieldDescriptor {
    /// Describe field `name` of type `T`.
    #[must_use]
    pub fn of<T: SchemaType + ?Sized>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: T::type_name(),
            schema_key: T::schema_key(),
            children: T::fields,
        }
    }

    /// Field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

/// One flattened field of a generated schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldDefinition {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
}

impl FieldDefinition {
    /// Create a field definition.
    #[must_use]
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }

    /// Field path (dotted for nested fields).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

/// Generated, serializable schema of a type in a given role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemaDefinition {
    name: String,
    fields: Vec<FieldDefinition>,
}

impl SchemaDefinition {
    /// Create a definition from already flattened fields.
    #[must_use]
    pub fn new(name: impl Into<String>, fields: Vec<FieldDefinition>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Role name, e.g. `ModelInput`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Flattened fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    /// Look a field up by (dotted) name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// JSON form of the definition.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Serialization`] if encoding fails.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Flattens [`SchemaType`] descriptions into [`SchemaDefinition`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaGenerator;

impl SchemaGenerator {
    /// Create a generator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Generate the definition of `T` under the role name `name`.
    #[must_use]
    pub fn generate<T: SchemaType + ?Sized>(&self, name: &str) -> SchemaDefinition {
        let mut fields = Vec::new();
        let mut expanding = vec![T::schema_key()];
        flatten(&T::fields(), None, &mut expanding, &mut fields);
        SchemaDefinition::new(name, fields)
    }
}

/// `expanding` holds the types on the current path; a field whose type is
/// already on it is emitted without children.
fn flatten(
    descriptors: &[FieldDescriptor],
    prefix: Option<&str>,
    expanding: &mut Vec<&'static str>,
    out: &mut Vec<FieldDefinition>,
) {
    for descriptor in descriptors {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{}", descriptor.name),
            None => descriptor.name.clone(),
        };
        out.push(FieldDefinition::new(path.clone(), descriptor.type_name.clone()));
        if expanding.contains(&descriptor.schema_key) {
            continue;
        }
        expanding.push(descriptor.schema_key);
        flatten(&(descriptor.children)(), Some(&path), expanding, out);
        expanding.pop();
    }
}

macro_rules! scalar_schema_type {
    ($($ty:ty),* $(,)?) => {
        $(
            impl SchemaType for $ty {
                fn type_name() -> String {
                    stringify!($ty).to_string()
                }
            }
        )*
    };
}

scalar_schema_type!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, String,
);

impl SchemaType for str {
    fn type_name() -> String {
        "String".to_string()
    }
}

impl<T: SchemaType> SchemaType for Option<T> {
    fn type_name() -> String {
        format!("Option<{}>", T::type_name())
    }

    fn fields() -> Vec<FieldDescriptor> {
        T::fields()
    }

    fn schema_key() -> &'static str {
        T::schema_key()
    }
}

impl<T: SchemaType> SchemaType for Box<T> {
    fn type_name() -> String {
        format!("Box<{}>", T::type_name())
    }

    fn fields() -> Vec<FieldDescriptor> {
        T::fields()
    }

    fn schema_key() -> &'static str {
        T::schema_key()
    }
}

impl<T: SchemaType> SchemaType for Vec<T> {
    fn type_name() -> String {
        format!("Vec<{}>", T::type_name())
    }

    fn fields() -> Vec<FieldDescriptor> {
        T::fields()
    }

    fn schema_key() -> &'static str {
        T::schema_key()
    }
}

impl<T: SchemaType, const N: usize> SchemaType for [T; N] {
    fn type_name() -> String {
        format!("[{}; {N}]", T::type_name())
    }

    fn fields() -> Vec<FieldDescriptor> {
        T::fields()
    }

    fn schema_key() -> &'static str {
        T::schema_key()
    }
}

/// Implement [`SchemaType`] for a struct by listing its fields.
///
/// ```rust
/// use mlops_core::model_schema;
///
/// struct Prediction { label: bool, score: f32 }
/// model_schema!(Prediction { label: bool, score: f32 });
/// ```
#[macro_export]
macro_rules! model_schema {
    ($ty:ident { $($field:ident : $fty:ty),* $(,)? }) => {
        impl $crate::schema::SchemaType for $ty {
            fn type_name() -> ::std::string::String {
                ::std::string::String::from(stringify!($ty))
            }

            fn fields() -> ::std::vec::Vec<$crate::schema::FieldDescriptor> {
                ::std::vec![
                    $($crate::schema::FieldDescriptor::of::<$fty>(stringify!($field))),*
                ]
            }
        }
    };
}
