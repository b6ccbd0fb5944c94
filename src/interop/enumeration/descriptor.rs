//! Reflective discovery of enumerator operations.

use crate::{
    metadata::{
        catalog::TypeCatalog,
        typesystem::{MethodRc, PropertyRc, TypeRecordRc},
    },
    value::Value,
    Error, Result,
};

const GET_ENUMERATOR: [&str; 2] = ["GetEnumerator", "System.Collections.IEnumerable.GetEnumerator"];
const MOVE_NEXT: [&str; 2] = ["MoveNext", "System.Collections.IEnumerator.MoveNext"];
const CURRENT: [&str; 2] = ["Current", "System.Collections.IEnumerator.Current"];

/// How the current element of an enumerator is read.
#[derive(Clone)]
pub enum CurrentAccessor {
    /// A readable `Current` property
    Property(PropertyRc),
    /// A `get_Current` method
    Method(MethodRc),
}

/// Cached move-forward and current-value operations of one enumerator type.
///
/// Immutable once created.
#[derive(Clone)]
pub struct EnumeratorDescriptor {
    /// The enumerator type this descriptor was discovered on
    pub enumerator_type: TypeRecordRc,
    /// `MoveNext`
    pub move_next: MethodRc,
    /// `Current`
    pub current: CurrentAccessor,
}

impl EnumeratorDescriptor {
    /// Discover the operations of `enumerator_type`.
    ///
    /// Explicit interface implementations are accepted when the public names are missing.
    ///
    /// # Errors
    /// Returns [`Error::MemberNotFound`] if either operation is missing.
    pub fn discover(catalog: &TypeCatalog, enumerator_type: &TypeRecordRc) -> Result<Self> {
        let move_next = MOVE_NEXT
            .iter()
            .find_map(|name| catalog.find_method(enumerator_type, name))
            .ok_or_else(|| {
                Error::MemberNotFound(format!("{}.MoveNext", enumerator_type.fullname_str()))
            })?;

        let current = CURRENT
            .iter()
            .find_map(|name| {
                catalog
                    .find_property(enumerator_type, name)
                    .filter(|property| property.can_read())
                    .map(CurrentAccessor::Property)
            })
            .or_else(|| {
                CURRENT.iter().find_map(|name| {
                    catalog
                        .find_method(enumerator_type, &Self::getter_name(name))
                        .map(CurrentAccessor::Method)
                })
            })
            .ok_or_else(|| {
                Error::MemberNotFound(format!("{}.Current", enumerator_type.fullname_str()))
            })?;

        Ok(EnumeratorDescriptor {
            enumerator_type: enumerator_type.clone(),
            move_next,
            current,
        })
    }

    fn getter_name(property: &str) -> String {
        match property.rsplit_once('.') {
            Some((interface, name)) => format!("{interface}.get_{name}"),
            None => format!("get_{property}"),
        }
    }

    /// Advance the enumerator.
    ///
    /// # Errors
    /// Propagates the invoker's failure, or [`Error::ValueConversion`] if `MoveNext` did
    /// not return a boolean.
    pub fn move_next(&self, enumerator: &Value) -> Result<bool> {
        match self.move_next.invoke(enumerator, &[])? {
            Value::Bool(moved) => Ok(moved),
            other => Err(Error::ValueConversion {
                source_type: other.kind_name(),
                target_type: "bool",
            }),
        }
    }

    /// Element the enumerator is positioned on.
    ///
    /// # Errors
    /// Propagates the getter's failure.
    pub fn current(&self, enumerator: &Value) -> Result<Value> {
        match &self.current {
            CurrentAccessor::Property(property) => property.get(enumerator),
            CurrentAccessor::Method(method) => method.invoke(enumerator, &[]),
        }
    }
}

/// `GetEnumerator` of a collection type, if any.
pub(crate) fn find_get_enumerator(catalog: &TypeCatalog, ty: &TypeRecordRc) -> Option<MethodRc> {
    GET_ENUMERATOR
        .iter()
        .find_map(|name| catalog.find_method(ty, name))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::BridgeConfig,
        diagnostics::DiagnosticSink,
        metadata::typesystem::{MethodInfo, PropertyInfo, TypeBuilder},
    };

    fn catalog() -> TypeCatalog {
        TypeCatalog::new(&BridgeConfig::default(), DiagnosticSink::silent())
    }

    #[test]
    fn test_discover_explicit_interface_members() {
        let catalog = catalog();
        let ty = TypeBuilder::class("A", "Enumerator")
            .method(MethodInfo::new(
                "System.Collections.IEnumerator.MoveNext",
                None,
                Arc::new(|_: &Value, _: &[Value]| Ok(Value::Bool(true))),
            ))
            .method(MethodInfo::new(
                "System.Collections.IEnumerator.get_Current",
                None,
                Arc::new(|_: &Value, _: &[Value]| Ok(Value::I32(3))),
            ))
            .build();

        let descriptor = EnumeratorDescriptor::discover(&catalog, &ty).unwrap();
        assert!(matches!(descriptor.current, CurrentAccessor::Method(_)));
        assert!(descriptor.move_next(&Value::Null).unwrap());
        assert_eq!(descriptor.current(&Value::Null).unwrap(), Value::I32(3));
    }

    #[test]
    fn test_property_preferred() {
        let catalog = catalog();
        let object = catalog.lookup("System.Object").unwrap();
        let ty = TypeBuilder::class("A", "Enumerator")
            .method(MethodInfo::new("MoveNext", None, Arc::new(|_: &Value, _: &[Value]| Ok(Value::I32(1)))))
            .property(
                PropertyInfo::new("Current", object).with_getter(Arc::new(|_: &Value| Ok(Value::I32(5)))),
            )
            .build();

        let descriptor = EnumeratorDescriptor::discover(&catalog, &ty).unwrap();
        assert!(matches!(descriptor.current, CurrentAccessor::Property(_)));
        // A non-boolean MoveNext result is an error, not "true"
        assert!(descriptor.move_next(&Value::Null).is_err());
    }

    #[test]
    fn test_missing_members() {
        let catalog = catalog();
        let ty = TypeBuilder::class("A", "NotAnEnumerator").build();
        assert!(matches!(
            EnumeratorDescriptor::discover(&catalog, &ty),
            Err(Error::MemberNotFound(_))
        ));
        assert!(find_get_enumerator(&catalog, &ty).is_none());
    }
}
