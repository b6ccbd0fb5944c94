//! Member lookup along the base chain.

use crate::metadata::{
    catalog::TypeCatalog,
    typesystem::{FieldRc, MethodRc, PropertyRc, TypeRecordRc},
};

impl TypeCatalog {
    /// Iterates `ty` followed by its base chain, resolving lazy bases on the way.
    fn with_base_chain<R>(
        &self,
        ty: &TypeRecordRc,
        mut find: impl FnMut(&TypeRecordRc) -> Option<R>,
    ) -> Option<R> {
        let mut current = Some(ty.clone());
        let mut depth = 0;
        while let Some(candidate) = current {
            if let Some(found) = find(&candidate) {
                return Some(found);
            }
            // Guard against cyclic base declarations in malformed input
            depth += 1;
            if depth > 256 {
                return None;
            }
            current = self.base_type(&candidate);
        }
        None
    }

    /// Field named `name` on `ty` or a base, with its declaring type.
    pub fn find_field(&self, ty: &TypeRecordRc, name: &str) -> Option<(TypeRecordRc, FieldRc)> {
        self.with_base_chain(ty, |candidate| {
            candidate
                .field(name)
                .map(|field| (candidate.clone(), field))
        })
    }

    /// Property named `name` on `ty` or a base.
    pub fn find_property(&self, ty: &TypeRecordRc, name: &str) -> Option<PropertyRc> {
        self.with_base_chain(ty, |candidate| candidate.property(name))
    }

    /// Method named `name` on `ty` or a base.
    pub fn find_method(&self, ty: &TypeRecordRc, name: &str) -> Option<MethodRc> {
        self.with_base_chain(ty, |candidate| candidate.method(name))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        config::BridgeConfig,
        diagnostics::DiagnosticSink,
        metadata::{
            catalog::TypeCatalog,
            typesystem::{FieldFlags, FieldInfo, MethodInfo, TypeBuilder},
        },
        value::Value,
    };

    #[test]
    fn test_inherited_members() {
        let catalog = TypeCatalog::new(&BridgeConfig::default(), DiagnosticSink::silent());
        let int = catalog.lookup("System.Int32").unwrap();
        let base = TypeBuilder::class("A", "Base")
            .field(FieldInfo::new("id", int, FieldFlags::empty()))
            .method(MethodInfo::new("Ping", None, Arc::new(|_: &Value, _: &[Value]| Ok(Value::Null))))
            .build();
        catalog.insert(base).unwrap();
        let derived = TypeBuilder::class("A", "Derived").extends_named("A.Base").build();
        catalog.insert(derived.clone()).unwrap();

        let (declaring, field) = catalog.find_field(&derived, "id").unwrap();
        assert_eq!(declaring.fullname(), "A.Base");
        assert_eq!(field.name, "id");
        assert!(catalog.find_method(&derived, "Ping").is_some());
        assert!(catalog.find_property(&derived, "Missing").is_none());
    }
}
