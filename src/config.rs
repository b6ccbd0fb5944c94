//! Bridge configuration types.
//!
//! # Overview
//!
//! - [`BridgeConfig`] - Top-level configuration container
//! - [`Backend`] - Which object model the host runs on
//!
//! # Configuration Presets
//!
//! - [`BridgeConfig::managed()`] - Homogeneous managed runtime, no foreign objects
//! - [`BridgeConfig::dual_model()`] - Managed proxies over a native object model
//!
//! # Example
//!
//! ```rust
//! use dotbridge::config::{Backend, BridgeConfig};
//!
//! // Use a preset
//! let config = BridgeConfig::dual_model();
//! assert_eq!(config.backend, Backend::DualModel);
//!
//! // Or customize
//! let config = BridgeConfig::dual_model()
//!     .with_shadow_namespace_prefix("Cpp")
//!     .with_backing_field_variants(false);
//! assert_eq!(config.shadow_type_name("System.String"), "CppSystem.String");
//! ```

use strum::{Display, EnumString};

/// The object model the host process runs on.
///
/// Selected once when the [`crate::BridgeContext`] is built; hot paths never ask again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
pub enum Backend {
    /// Every object is a plain managed object described by its own type record.
    Managed,
    /// Managed objects may be thin proxies over natively allocated objects that carry
    /// their own class metadata.
    DualModel,
}

/// Configuration for a [`crate::BridgeContext`].
///
/// # Default Configuration
///
/// The default is the [`dual_model()`](Self::dual_model) preset:
/// - shadow namespace prefix `Il2Cpp`, foreign standard namespace `System`
/// - obfuscated names read from `ObfuscatedNameAttribute`
/// - compiler-generated markers `<`, `DisplayClass`, `PrivateImplementationDetails`
/// - backing-field name variants enabled
#[derive(Clone, Debug)]
pub struct BridgeConfig {
    /// Object model in use.
    pub backend: Backend,

    /// Prefix host-side proxies of the foreign standard library carry, e.g. `Il2Cpp`
    /// turns `System.String` into `Il2CppSystem.String`.
    pub shadow_namespace_prefix: String,

    /// Root namespace of the foreign standard library as the foreign runtime reports it.
    pub foreign_std_namespace: String,

    /// Simple name of the attribute that stores a type's original obfuscated name.
    pub obfuscated_name_attribute: String,

    /// Full-name fragments marking compiler-generated types, excluded from
    /// implementation queries.
    pub excluded_name_markers: Vec<String>,

    /// Full name of the foreign hashtable type enumerated through its bucket array.
    pub hashtable_type: String,

    /// Full name of the foreign nullable wrapper definition.
    pub nullable_type: String,

    /// Whether member resolvers also try `m_name`, `_name` and auto-property backing
    /// fields for each candidate name.
    pub backing_field_variants: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::dual_model()
    }
}

impl BridgeConfig {
    /// Preset for a homogeneous managed runtime.
    #[must_use]
    pub fn managed() -> Self {
        Self {
            backend: Backend::Managed,
            ..Self::dual_model()
        }
    }

    /// Preset for a dual-model runtime with `Il2Cpp`-prefixed proxies.
    #[must_use]
    pub fn dual_model() -> Self {
        Self {
            backend: Backend::DualModel,
            shadow_namespace_prefix: "Il2Cpp".to_string(),
            foreign_std_namespace: "System".to_string(),
            obfuscated_name_attribute: "ObfuscatedNameAttribute".to_string(),
            excluded_name_markers: vec![
                "<".to_string(),
                "DisplayClass".to_string(),
                "PrivateImplementationDetails".to_string(),
            ],
            hashtable_type: "Il2CppSystem.Collections.Hashtable".to_string(),
            nullable_type: "Il2CppSystem.Nullable`1".to_string(),
            backing_field_variants: true,
        }
    }

    /// Sets the backend.
    #[must_use]
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Sets the shadow namespace prefix.
    ///
    /// The hashtable and nullable type names are rebased onto the new prefix.
    #[must_use]
    pub fn with_shadow_namespace_prefix(mut self, prefix: &str) -> Self {
        let rebase = |name: &str, old: &str| match name.strip_prefix(old) {
            Some(rest) => format!("{prefix}{rest}"),
            None => name.to_string(),
        };
        self.hashtable_type = rebase(&self.hashtable_type, &self.shadow_namespace_prefix);
        self.nullable_type = rebase(&self.nullable_type, &self.shadow_namespace_prefix);
        self.shadow_namespace_prefix = prefix.to_string();
        self
    }

    /// Sets the obfuscated-name attribute name.
    #[must_use]
    pub fn with_obfuscated_name_attribute(mut self, name: &str) -> Self {
        self.obfuscated_name_attribute = name.to_string();
        self
    }

    /// Adds a compiler-generated name marker.
    #[must_use]
    pub fn with_excluded_marker(mut self, marker: &str) -> Self {
        self.excluded_name_markers.push(marker.to_string());
        self
    }

    /// Enables or disables backing-field name variants.
    #[must_use]
    pub fn with_backing_field_variants(mut self, enabled: bool) -> Self {
        self.backing_field_variants = enabled;
        self
    }

    /// Host-side proxy name of a foreign standard-library type.
    #[must_use]
    pub fn shadow_type_name(&self, fullname: &str) -> String {
        format!("{}{}", self.shadow_namespace_prefix, fullname)
    }

    /// Whether `fullname` lives in the foreign standard-library namespace.
    #[must_use]
    pub fn is_foreign_std_name(&self, fullname: &str) -> bool {
        let root = self.foreign_std_namespace.as_str();
        fullname == root
            || fullname
                .strip_prefix(root)
                .is_some_and(|rest| rest.starts_with('.'))
    }

    /// Whether `fullname` contains a compiler-generated marker.
    #[must_use]
    pub fn is_excluded_name(&self, fullname: &str) -> bool {
        self.excluded_name_markers
            .iter()
            .any(|marker| fullname.contains(marker.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_presets() {
        assert_eq!(BridgeConfig::managed().backend, Backend::Managed);
        assert_eq!(BridgeConfig::default().backend, Backend::DualModel);
        assert_eq!(Backend::from_str("DualModel").unwrap(), Backend::DualModel);
    }

    #[test]
    fn test_foreign_std_names() {
        let config = BridgeConfig::dual_model();
        assert!(config.is_foreign_std_name("System.Int32"));
        assert!(config.is_foreign_std_name("System"));
        assert!(!config.is_foreign_std_name("SystemX.Int32"));
        assert!(!config.is_foreign_std_name("MyGame.System"));
        assert_eq!(config.shadow_type_name("System.Int32"), "Il2CppSystem.Int32");
    }

    #[test]
    fn test_prefix_rebases_known_types() {
        let config = BridgeConfig::dual_model().with_shadow_namespace_prefix("Cpp");
        assert_eq!(config.hashtable_type, "CppSystem.Collections.Hashtable");
        assert_eq!(config.nullable_type, "CppSystem.Nullable`1");
    }

    #[test]
    fn test_excluded_markers() {
        let config = BridgeConfig::default();
        assert!(config.is_excluded_name("A.<>c__DisplayClass0_0"));
        assert!(config.is_excluded_name("<PrivateImplementationDetails>"));
        assert!(config.is_excluded_name("A.Foo+<Run>d__3"));
        assert!(!config.is_excluded_name("A.Foo"));
    }
}
