#![deny(missing_docs)]

//! # Native Composite Binding
//!
//! Bridges design types and externally defined Rust structs.
//!
//! Rust has no runtime reflection, so native types describe themselves
//! through the [`Reflect`] trait. The description is then *lifted* into the
//! same `Type` vocabulary the design uses (see `lift`), after which the
//! regular checker and synthesizer apply unchanged (see `binding`).
//!
//! ```
//! use cdd_bridge_core::native::{NativeRegistry, NativeType, Reflect};
//!
//! struct Account {
//!     id: u64,
//!     owner: Option<Box<Account>>,
//! }
//!
//! impl Reflect for Account {
//!     fn describe(registry: &mut NativeRegistry) -> NativeType {
//!         registry.describe_struct("Account", |s| {
//!             s.field::<u64>("id").field::<Option<Box<Account>>>("owner");
//!         })
//!     }
//! }
//!
//! let mut registry = NativeRegistry::new();
//! assert_eq!(registry.describe::<Account>(), NativeType::Struct("Account".into()));
//! assert_eq!(registry.fields("Account").map(|f| f.len()), Some(2));
//! ```

/// Lifting native descriptions into the type vocabulary.
pub mod lift;

/// Checks and synthesis between design and native shapes.
pub mod binding;

use crate::types::PrimitiveKind;
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap};
use std::time::SystemTime;

pub use binding::NativeBinding;
pub use lift::{lift, LiftedNative};

/// Shape of a native Rust type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeType {
    /// A scalar the design vocabulary knows.
    Primitive(PrimitiveKind),
    /// `Vec<T>` and friends.
    Sequence(Box<NativeType>),
    /// Hash or ordered map.
    Map(Box<NativeType>, Box<NativeType>),
    /// A struct registered under its name.
    Struct(String),
    /// `Option<T>`: a nullable slot.
    Pointer(Box<NativeType>),
    /// A type outside the vocabulary, e.g. `u8` outside of a byte vector.
    Opaque(&'static str),
}

/// A field of a native struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeField {
    /// Field name as the design refers to it.
    pub name: String,
    /// Field type.
    pub ty: NativeType,
}

/// Self-description of a native type.
pub trait Reflect {
    /// Describes the type, registering any struct it reaches.
    fn describe(registry: &mut NativeRegistry) -> NativeType;
}

/// Registry of described native structs.
#[derive(Debug, Default, Clone)]
pub struct NativeRegistry {
    structs: IndexMap<String, Vec<NativeField>>,
}

impl NativeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Describes `T`.
    pub fn describe<T: Reflect + ?Sized>(&mut self) -> NativeType {
        T::describe(self)
    }

    /// Registers a struct and its fields.
    ///
    /// The name is registered before `build` runs, so a struct reaching
    /// itself through its fields is described once.
    pub fn describe_struct<F>(&mut self, name: &str, build: F) -> NativeType
    where
        F: FnOnce(&mut StructBuilder<'_>),
    {
        if !self.structs.contains_key(name) {
            self.structs.insert(name.to_string(), Vec::new());
            let mut builder = StructBuilder {
                registry: self,
                fields: Vec::new(),
            };
            build(&mut builder);
            let fields = builder.fields;
            self.structs.insert(name.to_string(), fields);
        }
        NativeType::Struct(name.to_string())
    }

    /// Fields of a registered struct.
    pub fn fields(&self, name: &str) -> Option<&[NativeField]> {
        self.structs.get(name).map(Vec::as_slice)
    }

    /// Registered struct names, in registration order.
    pub fn struct_names(&self) -> impl Iterator<Item = &str> {
        self.structs.keys().map(String::as_str)
    }
}

/// Collects the fields of a struct being described.
pub struct StructBuilder<'r> {
    registry: &'r mut NativeRegistry,
    fields: Vec<NativeField>,
}

impl StructBuilder<'_> {
    /// Adds a field of type `T`.
    pub fn field<T: Reflect + ?Sized>(&mut self, name: &str) -> &mut Self {
        let ty = T::describe(self.registry);
        self.fields.push(NativeField {
            name: name.to_string(),
            ty,
        });
        self
    }
}

macro_rules! reflect_primitive {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Reflect for $ty {
                fn describe(_: &mut NativeRegistry) -> NativeType {
                    NativeType::Primitive(PrimitiveKind::$kind)
                }
            }
        )*
    };
}

reflect_primitive! {
    bool => Boolean,
    isize => Int,
    i32 => Int32,
    i64 => Int64,
    usize => UInt,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
    String => String,
}

macro_rules! reflect_opaque {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Reflect for $ty {
                fn describe(_: &mut NativeRegistry) -> NativeType {
                    NativeType::Opaque(stringify!($ty))
                }
            }
        )*
    };
}

reflect_opaque!(u8, u16, i8, i16, char, ());

impl<T: Reflect> Reflect for Vec<T> {
    fn describe(registry: &mut NativeRegistry) -> NativeType {
        match T::describe(registry) {
            NativeType::Opaque("u8") => NativeType::Primitive(PrimitiveKind::Bytes),
            elem => NativeType::Sequence(Box::new(elem)),
        }
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn describe(registry: &mut NativeRegistry) -> NativeType {
        NativeType::Pointer(Box::new(T::describe(registry)))
    }
}

impl<T: Reflect + ?Sized> Reflect for Box<T> {
    fn describe(registry: &mut NativeRegistry) -> NativeType {
        T::describe(registry)
    }
}

impl<K: Reflect, V: Reflect, S> Reflect for HashMap<K, V, S> {
    fn describe(registry: &mut NativeRegistry) -> NativeType {
        NativeType::Map(Box::new(K::describe(registry)), Box::new(V::describe(registry)))
    }
}

impl<K: Reflect, V: Reflect> Reflect for BTreeMap<K, V> {
    fn describe(registry: &mut NativeRegistry) -> NativeType {
        NativeType::Map(Box::new(K::describe(registry)), Box::new(V::describe(registry)))
    }
}

impl<K: Reflect, V: Reflect, S> Reflect for IndexMap<K, V, S> {
    fn describe(registry: &mut NativeRegistry) -> NativeType {
        NativeType::Map(Box::new(K::describe(registry)), Box::new(V::describe(registry)))
    }
}

impl Reflect for SystemTime {
    fn describe(registry: &mut NativeRegistry) -> NativeType {
        // Opaque timestamp: a struct without visible fields.
        registry.describe_struct("SystemTime", |_| {})
    }
}
