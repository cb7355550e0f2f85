//! Utility functions shared by the Weave crates

/// Naming convention utilities for properties and generated classes
pub mod naming {
    /// Converts a PascalCase name to camelCase.
    ///
    /// # Examples
    ///
    /// ```
    /// use weave_core::utils::naming::to_camel_case;
    ///
    /// assert_eq!(to_camel_case("FirstName"), "firstName");
    /// assert_eq!(to_camel_case("A"), "a");
    /// assert_eq!(to_camel_case(""), "");
    /// ```
    pub fn to_camel_case(s: &str) -> String {
        let mut chars = s.chars();
        match chars.next() {
            None => String::new(),
            Some(first) => {
                let mut result = String::with_capacity(s.len());
                result.extend(first.to_lowercase());
                result.push_str(chars.as_str());
                result
            }
        }
    }

    /// Converts a camelCase name to PascalCase.
    ///
    /// ```
    /// use weave_core::utils::naming::to_pascal_case;
    ///
    /// assert_eq!(to_pascal_case("firstName"), "FirstName");
    /// ```
    pub fn to_pascal_case(s: &str) -> String {
        let mut chars = s.chars();
        match chars.next() {
            None => String::new(),
            Some(first) => {
                let mut result = String::with_capacity(s.len());
                result.extend(first.to_uppercase());
                result.push_str(chars.as_str());
                result
            }
        }
    }

    /// Derives the property name from an accessor method name.
    ///
    /// Recognises the `get`, `is` and `set` prefixes; the character after the
    /// prefix must be uppercase.
    ///
    /// ```
    /// use weave_core::utils::naming::property_name;
    ///
    /// assert_eq!(property_name("getFirstName").as_deref(), Some("firstName"));
    /// assert_eq!(property_name("isActive").as_deref(), Some("active"));
    /// assert_eq!(property_name("setAge").as_deref(), Some("age"));
    /// assert_eq!(property_name("settle"), None);
    /// ```
    pub fn property_name(accessor: &str) -> Option<String> {
        ["get", "set", "is"].iter().find_map(|prefix| {
            let rest = accessor.strip_prefix(prefix)?;
            rest.chars()
                .next()
                .filter(|c| c.is_uppercase())
                .map(|_| to_camel_case(rest))
        })
    }

    /// Getter name for a property.
    pub fn getter_name(property: &str) -> String {
        format!("get{}", to_pascal_case(property))
    }

    /// Setter name for a property.
    pub fn setter_name(property: &str) -> String {
        format!("set{}", to_pascal_case(property))
    }

    /// Whether a method name looks like a setter.
    pub fn is_setter_name(name: &str) -> bool {
        name.strip_prefix("set")
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| c.is_uppercase())
    }

    /// A short, stable hexadecimal hash used to make generated class names unique.
    ///
    /// FNV-1a over the input, so the same key always yields the same suffix.
    pub fn stable_hash(input: &str) -> String {
        let mut hash: u32 = 0x811c_9dc5;
        for byte in input.bytes() {
            hash ^= u32::from(byte);
            hash = hash.wrapping_mul(0x0100_0193);
        }
        format!("{:08x}", hash)
    }
}

#[cfg(test)]
mod tests {
    use super::naming::*;

    #[test]
    fn test_accessor_names_round_trip() {
        assert_eq!(getter_name("firstName"), "getFirstName");
        assert_eq!(setter_name("firstName"), "setFirstName");
        assert_eq!(property_name(&setter_name("age")).as_deref(), Some("age"));
    }

    #[test]
    fn test_is_setter_name() {
        assert!(is_setter_name("setName"));
        assert!(!is_setter_name("set"));
        assert!(!is_setter_name("settle"));
        assert!(!is_setter_name("getName"));
    }

    #[test]
    fn test_stable_hash() {
        assert_eq!(stable_hash("Person"), stable_hash("Person"));
        assert_ne!(stable_hash("Person"), stable_hash("Persons"));
        assert_eq!(stable_hash("").len(), 8);
    }
}
