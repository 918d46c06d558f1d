//! # Native Binding
//!
//! Pairs a design shape with a lifted native shape.
//!
//! Direction decides which side must be fully covered: converting *from* a
//! native value needs every design attribute to find a native field (extra
//! native fields are ignored), converting *to* a native value needs every
//! native field to find a design attribute.

use crate::compat::check;
use crate::error::EngineResult;
use crate::native::lift::{lift, LiftedNative};
use crate::native::{NativeRegistry, NativeType, Reflect};
use crate::transform::helpers::HelperRegistry;
use crate::transform::{synthesize, Binding, Direction, Options, Plan};
use crate::types::Shape;

/// A design shape bound to a native type.
#[derive(Debug, Clone)]
pub struct NativeBinding<'d> {
    design: Shape<'d>,
    native: LiftedNative,
}

impl<'d> NativeBinding<'d> {
    /// Binds `design` to the native type `T`.
    pub fn new<T: Reflect>(design: Shape<'d>) -> EngineResult<Self> {
        let mut registry = NativeRegistry::new();
        let root = registry.describe::<T>();
        Self::from_description(design, &registry, &root)
    }

    /// Binds `design` to an already described native type.
    pub fn from_description(
        design: Shape<'d>,
        registry: &NativeRegistry,
        root: &NativeType,
    ) -> EngineResult<Self> {
        Ok(Self {
            design,
            native: lift(registry, root)?,
        })
    }

    /// The design side.
    pub fn design(&self) -> Shape<'d> {
        self.design
    }

    /// The lifted native side.
    pub fn native(&self) -> Shape<'_> {
        self.native.shape()
    }

    /// Checks that design values convert into native values.
    pub fn check_to_native(&self) -> EngineResult<()> {
        check(self.design, self.native())
    }

    /// Checks that native values convert into design values.
    pub fn check_from_native(&self) -> EngineResult<()> {
        check(self.native(), self.design)
    }

    /// Synthesizes the design to native conversion.
    pub fn to_native(
        &self,
        design: &Binding,
        native: &Binding,
        registry: &mut HelperRegistry,
    ) -> EngineResult<Plan> {
        let native = self.native_binding(native);
        synthesize(
            self.design,
            self.native(),
            design,
            &native,
            &Options::new(Direction::ToNative),
            registry,
        )
    }

    /// Synthesizes the native to design conversion.
    pub fn from_native(
        &self,
        native: &Binding,
        design: &Binding,
        registry: &mut HelperRegistry,
    ) -> EngineResult<Plan> {
        let native = self.native_binding(native);
        synthesize(
            self.native(),
            self.design,
            &native,
            design,
            &Options::new(Direction::FromNative),
            registry,
        )
    }

    /// A native root lifted from `Option<Struct>` is optional.
    fn native_binding(&self, binding: &Binding) -> Binding {
        let mut binding = binding.clone();
        binding.optional |= self.native.is_optional();
        binding
    }
}
