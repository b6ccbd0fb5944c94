//! Modules delivered to the catalog.

use crate::metadata::typesystem::TypeRecordRc;

/// Who produced a module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModuleOrigin {
    /// Loaded by the host application
    Host,
    /// Synthesized by the bridge itself (e.g. injected proxy types); never re-indexed
    Bridge,
}

/// A loaded module and the types that could be recovered from it.
///
/// A partially loadable module simply carries fewer types; the catalog consumes whatever
/// it is given.
#[derive(Clone, Debug)]
pub struct ModuleInfo {
    /// Module name
    pub name: String,
    /// Producer of the module
    pub origin: ModuleOrigin,
    /// Exported types
    pub types: Vec<TypeRecordRc>,
}

impl ModuleInfo {
    /// A module loaded by the host
    pub fn new(name: &str, types: Vec<TypeRecordRc>) -> Self {
        ModuleInfo {
            name: name.to_string(),
            origin: ModuleOrigin::Host,
            types,
        }
    }

    /// A module synthesized by the bridge
    pub fn bridge(name: &str, types: Vec<TypeRecordRc>) -> Self {
        ModuleInfo {
            name: name.to_string(),
            origin: ModuleOrigin::Bridge,
            types,
        }
    }

    /// Whether the catalog must skip this module
    pub fn is_bridge_generated(&self) -> bool {
        self.origin == ModuleOrigin::Bridge
    }
}
