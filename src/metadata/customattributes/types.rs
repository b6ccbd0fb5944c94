//! Custom attribute data attached to type records.

/// A custom attribute applied to a type
#[derive(Debug, Clone)]
pub struct CustomAttribute {
    /// Full name of the attribute type, e.g. `Il2CppInterop.Common.ObfuscatedNameAttribute`
    pub type_name: String,
    /// Fixed arguments from the constructor signature
    pub fixed_args: Vec<CustomAttributeArgument>,
    /// Named arguments (fields and properties)
    pub named_args: Vec<CustomAttributeNamedArgument>,
}

/// Represents a single custom attribute argument value
#[derive(Debug, Clone, PartialEq)]
pub enum CustomAttributeArgument {
    /// Boolean value
    Bool(bool),
    /// Signed 32-bit integer
    I4(i32),
    /// Signed 64-bit integer
    I8(i64),
    /// UTF-8 string
    String(String),
    /// Type reference (as string)
    Type(String),
    /// Array of arguments
    Array(Vec<CustomAttributeArgument>),
}

/// Represents a named argument (field or property) in a custom attribute
#[derive(Debug, Clone)]
pub struct CustomAttributeNamedArgument {
    /// Whether this is a field (true) or property (false)
    pub is_field: bool,
    /// Name of the field or property
    pub name: String,
    /// Value of the argument
    pub value: CustomAttributeArgument,
}

impl CustomAttribute {
    /// Create an attribute without arguments
    pub fn new(type_name: &str) -> Self {
        CustomAttribute {
            type_name: type_name.to_string(),
            fixed_args: Vec::new(),
            named_args: Vec::new(),
        }
    }

    /// Append a fixed argument
    #[must_use]
    pub fn with_arg(mut self, arg: CustomAttributeArgument) -> Self {
        self.fixed_args.push(arg);
        self
    }

    /// Append a named property argument
    #[must_use]
    pub fn with_named(mut self, name: &str, value: CustomAttributeArgument) -> Self {
        self.named_args.push(CustomAttributeNamedArgument {
            is_field: false,
            name: name.to_string(),
            value,
        });
        self
    }

    /// Attribute type name without its namespace
    pub fn simple_name(&self) -> &str {
        self.type_name
            .rsplit_once('.')
            .map_or(self.type_name.as_str(), |(_, name)| name)
    }

    /// First fixed argument that is a string
    pub fn first_string_arg(&self) -> Option<&str> {
        self.fixed_args.iter().find_map(|arg| match arg {
            CustomAttributeArgument::String(value) => Some(value.as_str()),
            _ => None,
        })
    }

    /// Value of a named argument
    pub fn named_arg(&self, name: &str) -> Option<&CustomAttributeArgument> {
        self.named_args
            .iter()
            .find(|arg| arg.name == name)
            .map(|arg| &arg.value)
    }
}
