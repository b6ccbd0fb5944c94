//! Version-tolerant member access.
//!
//! Host libraries rename members between releases (`current`, `Current`, `m_current`).
//! An [`AmbiguousMemberResolver`] is bound once to the first of an ordered list of
//! candidate names that exists with the required capabilities and a compatible value
//! type. A resolver that found nothing stays inert: reads return the default value and
//! writes do nothing.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use dotbridge::{
//!     config::BridgeConfig,
//!     diagnostics::DiagnosticSink,
//!     interop::{AmbiguousMemberResolver, MemberAccess},
//!     metadata::{catalog::TypeCatalog, typesystem::{FieldFlags, FieldInfo, TypeBuilder}},
//!     value::{Object, Value},
//! };
//!
//! let catalog = TypeCatalog::new(&BridgeConfig::default(), DiagnosticSink::silent());
//! let int = catalog.lookup("System.Int32").unwrap();
//! let cursor = TypeBuilder::class("Game", "Cursor")
//!     .field(FieldInfo::new("m_current", int.clone(), FieldFlags::INIT_ONLY))
//!     .build();
//!
//! let resolver = AmbiguousMemberResolver::<i32>::new(
//!     &catalog, &cursor, &int, &["current", "Current"], MemberAccess::READ, true,
//! )?;
//! assert_eq!(resolver.member_name(), Some("m_current"));
//!
//! let instance = Value::Object(Arc::new(Object::new(cursor)));
//! if let Value::Object(object) = &instance {
//!     object.set_field_value("m_current", Value::I32(7));
//! }
//! assert_eq!(resolver.get(&instance), 7);
//! # Ok::<(), dotbridge::Error>(())
//! ```

use std::marker::PhantomData;

use bitflags::bitflags;

use crate::{
    metadata::{
        catalog::TypeCatalog,
        typesystem::{FieldRc, PropertyRc, TypeRecordRc},
    },
    value::Value,
    Error, Result,
};

bitflags! {
    /// Capabilities a resolved member must offer
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct MemberAccess: u8 {
        /// Readable
        const READ = 0x01;
        /// Writable
        const WRITE = 0x02;
    }
}

#[derive(Clone)]
enum MemberBinding {
    Property(PropertyRc),
    Field {
        declaring: TypeRecordRc,
        field: FieldRc,
    },
}

/// Field or property resolved from an ordered list of historical names.
pub struct AmbiguousMemberResolver<T> {
    binding: Option<MemberBinding>,
    access: MemberAccess,
    _value: PhantomData<fn() -> T>,
}

impl<T> AmbiguousMemberResolver<T>
where
    T: TryFrom<Value> + Into<Value> + Default,
{
    /// Bind to the first matching candidate on `declaring`.
    ///
    /// For each candidate name, in order, a property of that name is tried, then a field,
    /// then (with `backing_field_variants`) the fields `m_<name>`, `_<name>` and
    /// `<name>k__BackingField`. Literal fields never match.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if `candidates` is empty.
    pub fn new(
        catalog: &TypeCatalog,
        declaring: &TypeRecordRc,
        value_type: &TypeRecordRc,
        candidates: &[&str],
        access: MemberAccess,
        backing_field_variants: bool,
    ) -> Result<Self> {
        if candidates.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "no candidate member names given for {}",
                declaring.fullname_str()
            )));
        }

        let binding = candidates.iter().find_map(|name| {
            Self::bind_property(catalog, declaring, value_type, name, access).or_else(|| {
                Self::field_names(name, backing_field_variants)
                    .iter()
                    .find_map(|field| {
                        Self::bind_field(catalog, declaring, value_type, field, access)
                    })
            })
        });

        Ok(AmbiguousMemberResolver {
            binding,
            access,
            _value: PhantomData,
        })
    }

    fn field_names(name: &str, variants: bool) -> Vec<String> {
        let mut names = vec![name.to_string()];
        if variants {
            names.push(format!("m_{name}"));
            names.push(format!("_{name}"));
            names.push(format!("<{name}>k__BackingField"));
        }
        names
    }

    fn bind_property(
        catalog: &TypeCatalog,
        declaring: &TypeRecordRc,
        value_type: &TypeRecordRc,
        name: &str,
        access: MemberAccess,
    ) -> Option<MemberBinding> {
        let property = catalog.find_property(declaring, name)?;
        if access.contains(MemberAccess::READ) && !property.can_read() {
            return None;
        }
        if access.contains(MemberAccess::WRITE) && !property.can_write() {
            return None;
        }
        if !catalog.is_assignable_from(value_type, &property.value_type) {
            return None;
        }
        Some(MemberBinding::Property(property))
    }

    fn bind_field(
        catalog: &TypeCatalog,
        declaring: &TypeRecordRc,
        value_type: &TypeRecordRc,
        name: &str,
        access: MemberAccess,
    ) -> Option<MemberBinding> {
        let (owner, field) = catalog.find_field(declaring, name)?;
        if field.is_literal() {
            return None;
        }
        if access.contains(MemberAccess::WRITE) && !field.is_writable() {
            return None;
        }
        if !catalog.is_assignable_from(value_type, &field.value_type) {
            return None;
        }
        Some(MemberBinding::Field {
            declaring: owner,
            field,
        })
    }

    /// Name of the bound member
    pub fn member_name(&self) -> Option<&str> {
        match &self.binding {
            Some(MemberBinding::Property(property)) => Some(&property.name),
            Some(MemberBinding::Field { field, .. }) => Some(&field.name),
            None => None,
        }
    }

    /// Whether a member was found
    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// Whether reads reach a member
    pub fn can_read(&self) -> bool {
        match &self.binding {
            Some(MemberBinding::Property(property)) => property.can_read(),
            Some(MemberBinding::Field { .. }) => true,
            None => false,
        }
    }

    /// Whether writes reach a member
    pub fn can_write(&self) -> bool {
        match &self.binding {
            Some(MemberBinding::Property(property)) => property.can_write(),
            Some(MemberBinding::Field { field, .. }) => field.is_writable(),
            None => false,
        }
    }

    /// Requested capabilities
    pub fn access(&self) -> MemberAccess {
        self.access
    }

    /// Read the member of `instance` (`Value::Null` for statics).
    ///
    /// Returns `T::default()` when unbound or when the read or conversion fails.
    pub fn get(&self, instance: &Value) -> T {
        self.read(instance)
            .and_then(|value| T::try_from(value).ok())
            .unwrap_or_default()
    }

    /// Raw value of the member, `None` when unbound or on failure.
    pub fn read(&self, instance: &Value) -> Option<Value> {
        let result = match self.binding.as_ref()? {
            MemberBinding::Property(property) => property.get(instance),
            MemberBinding::Field { declaring, field } => field.get(declaring, instance),
        };
        result.ok()
    }

    /// Write the member of `instance`. Does nothing when unbound; failures are ignored.
    pub fn set(&self, instance: &Value, value: T) {
        let Some(binding) = &self.binding else {
            return;
        };
        let _ = match binding {
            MemberBinding::Property(property) => property.set(instance, value.into()),
            MemberBinding::Field { declaring, field } => {
                field.set(declaring, instance, value.into())
            }
        };
    }
}

/// Value of the property or field `name` of an object, searched along its base chain.
pub(crate) fn read_member(catalog: &TypeCatalog, instance: &Value, name: &str) -> Result<Value> {
    let object = instance
        .as_object()
        .ok_or_else(|| Error::MemberNotFound(format!("{name} on a {} value", instance.kind_name())))?;
    let ty = object.ty();

    if let Some(property) = catalog.find_property(ty, name) {
        return property.get(instance);
    }
    if let Some((declaring, field)) = catalog.find_field(ty, name) {
        return field.get(&declaring, instance);
    }
    Err(Error::MemberNotFound(format!("{}.{name}", ty.fullname_str())))
}

/// Whether the object's type declares a property or field `name`.
pub(crate) fn has_member(catalog: &TypeCatalog, instance: &Value, name: &str) -> bool {
    instance.as_object().is_some_and(|object| {
        catalog.find_property(object.ty(), name).is_some()
            || catalog.find_field(object.ty(), name).is_some()
    })
}
