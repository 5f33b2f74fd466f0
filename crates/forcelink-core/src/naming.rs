//! Column naming conventions and the canonical <-> remote name resolver.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ForceError;

/// Suffix the remote API uses for custom fields and objects.
const CUSTOM_SUFFIX: &str = "__c";

/// How canonical column names are spelled for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingConvention {
    /// Lowercase words joined by underscores (`created_date`).
    #[default]
    SnakeCase,
    /// The remote API's exact field spelling (`CreatedDate`).
    ApiNative,
}

impl NamingConvention {
    /// Name of the column holding the record identifier.
    pub fn identifier_column(&self) -> &'static str {
        match self {
            NamingConvention::SnakeCase => "id",
            NamingConvention::ApiNative => "Id",
        }
    }

    /// Canonical name for a remote field discovered at runtime.
    pub fn canonical_for(&self, remote: &str) -> String {
        match self {
            NamingConvention::SnakeCase => to_snake_case(remote),
            NamingConvention::ApiNative => remote.to_string(),
        }
    }
}

impl fmt::Display for NamingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamingConvention::SnakeCase => write!(f, "snake_case"),
            NamingConvention::ApiNative => write!(f, "api_native"),
        }
    }
}

impl FromStr for NamingConvention {
    type Err = ForceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "snake_case" => Ok(NamingConvention::SnakeCase),
            "api_native" => Ok(NamingConvention::ApiNative),
            other => Err(ForceError::Config(format!(
                "invalid naming convention '{}', expected 'snake_case' or 'api_native'",
                other
            ))),
        }
    }
}

/// Split a remote CamelCase field name into lowercase words joined by `_`.
///
/// Acronyms stay together (`LastCURequestDate` -> `last_cu_request_date`),
/// digits form their own word (`Pricebook2Id` -> `pricebook_2_id`) and
/// custom fields keep their spelling, lowercased (`Region__c` -> `region__c`).
pub fn to_snake_case(name: &str) -> String {
    if name.ends_with(CUSTOM_SUFFIX) {
        return name.to_lowercase();
    }

    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && chars[i - 1] != '_' && c != '_' {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = (c.is_uppercase() && (prev.is_lowercase() || prev.is_ascii_digit()))
                || (c.is_uppercase() && prev.is_uppercase() && next_is_lower)
                || (c.is_ascii_digit() && prev.is_alphabetic());
            if boundary {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }

    out
}

/// Derive a CamelCase remote spelling from a snake_case name.
///
/// Only a fallback: acronyms cannot be recovered (`last_cu_request_date`
/// becomes `LastCuRequestDate`), so declared fields should carry their
/// remote spelling explicitly.
pub fn to_camel_case(name: &str) -> String {
    if name.ends_with(CUSTOM_SUFFIX) {
        return name.to_string();
    }

    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Bidirectional lookup between canonical column names and remote field names.
///
/// Built once per table by the schema merger and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ColumnResolver {
    convention: NamingConvention,
    to_remote: HashMap<String, String>,
    to_canonical: HashMap<String, String>,
}

impl ColumnResolver {
    pub fn new(convention: NamingConvention) -> Self {
        Self {
            convention,
            to_remote: HashMap::new(),
            to_canonical: HashMap::new(),
        }
    }

    pub fn convention(&self) -> NamingConvention {
        self.convention
    }

    /// Bind a canonical name to a remote field.
    ///
    /// Returns `false` and leaves the table untouched when either side is
    /// already bound.
    pub fn insert(&mut self, canonical: &str, remote: &str) -> bool {
        if self.to_remote.contains_key(canonical) || self.to_canonical.contains_key(remote) {
            return false;
        }
        self.to_remote.insert(canonical.to_string(), remote.to_string());
        self.to_canonical.insert(remote.to_string(), canonical.to_string());
        true
    }

    /// Remote field name for a canonical column. Unknown names pass through unchanged.
    pub fn remote_name<'a>(&'a self, canonical: &'a str) -> &'a str {
        self.to_remote
            .get(canonical)
            .map(String::as_str)
            .unwrap_or(canonical)
    }

    /// Canonical column name for a remote field. Unknown names pass through unchanged.
    pub fn canonical_name<'a>(&'a self, remote: &'a str) -> &'a str {
        self.to_canonical
            .get(remote)
            .map(String::as_str)
            .unwrap_or(remote)
    }

    /// Whether a canonical name has an explicit mapping.
    pub fn contains(&self, canonical: &str) -> bool {
        self.to_remote.contains_key(canonical)
    }

    pub fn len(&self) -> usize {
        self.to_remote.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_remote.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_snake_case_simple() {
        assert_eq!(to_snake_case("Id"), "id");
        assert_eq!(to_snake_case("CreatedDate"), "created_date");
        assert_eq!(to_snake_case("IsEmailBounced"), "is_email_bounced");
        assert_eq!(to_snake_case("SystemModstamp"), "system_modstamp");
    }

    #[test]
    fn test_to_snake_case_acronyms() {
        assert_eq!(to_snake_case("LastCURequestDate"), "last_cu_request_date");
        assert_eq!(to_snake_case("LastCUUpdateDate"), "last_cu_update_date");
        assert_eq!(to_snake_case("PhotoUrl"), "photo_url");
        assert_eq!(to_snake_case("URL"), "url");
    }

    #[test]
    fn test_to_snake_case_digits() {
        assert_eq!(to_snake_case("Pricebook2Id"), "pricebook_2_id");
    }

    #[test]
    fn test_to_snake_case_custom_field() {
        assert_eq!(to_snake_case("Region__c"), "region__c");
        assert_eq!(to_snake_case("Account_Tier__c"), "account_tier__c");
    }

    #[test]
    fn test_to_camel_case() {
        assert_eq!(to_camel_case("created_date"), "CreatedDate");
        assert_eq!(to_camel_case("id"), "Id");
        assert_eq!(to_camel_case("pricebook_2_id"), "Pricebook2Id");
        assert_eq!(to_camel_case("Region__c"), "Region__c");
        // acronyms are lossy, which is why declared columns carry an explicit mapping
        assert_eq!(to_camel_case("last_cu_request_date"), "LastCuRequestDate");
    }

    #[test]
    fn test_naming_convention_from_str() {
        assert_eq!(
            "snake_case".parse::<NamingConvention>().unwrap(),
            NamingConvention::SnakeCase
        );
        assert_eq!(
            "api_native".parse::<NamingConvention>().unwrap(),
            NamingConvention::ApiNative
        );
        assert_eq!(
            "".parse::<NamingConvention>().unwrap(),
            NamingConvention::SnakeCase
        );
        assert!("camel".parse::<NamingConvention>().is_err());
    }

    #[test]
    fn test_naming_convention_deserialize() {
        let nc: NamingConvention = serde_json::from_str("\"api_native\"").unwrap();
        assert_eq!(nc, NamingConvention::ApiNative);
        assert_eq!(NamingConvention::default(), NamingConvention::SnakeCase);
    }

    #[test]
    fn test_identifier_column() {
        assert_eq!(NamingConvention::SnakeCase.identifier_column(), "id");
        assert_eq!(NamingConvention::ApiNative.identifier_column(), "Id");
    }

    #[test]
    fn test_resolver_both_directions() {
        let mut resolver = ColumnResolver::new(NamingConvention::SnakeCase);
        assert!(resolver.insert("last_cu_request_date", "LastCURequestDate"));
        assert_eq!(
            resolver.remote_name("last_cu_request_date"),
            "LastCURequestDate"
        );
        assert_eq!(
            resolver.canonical_name("LastCURequestDate"),
            "last_cu_request_date"
        );
        assert!(resolver.contains("last_cu_request_date"));
    }

    #[test]
    fn test_resolver_unknown_passes_through() {
        let resolver = ColumnResolver::new(NamingConvention::SnakeCase);
        assert_eq!(resolver.remote_name("mystery_field"), "mystery_field");
        assert_eq!(resolver.canonical_name("MysteryField"), "MysteryField");
        assert!(!resolver.contains("mystery_field"));
    }

    #[test]
    fn test_resolver_rejects_duplicate_bindings() {
        let mut resolver = ColumnResolver::new(NamingConvention::SnakeCase);
        assert!(resolver.insert("name", "Name"));
        assert!(!resolver.insert("name", "FullName"));
        assert!(!resolver.insert("full_name", "Name"));
        assert_eq!(resolver.remote_name("name"), "Name");
        assert_eq!(resolver.len(), 1);
    }
}
