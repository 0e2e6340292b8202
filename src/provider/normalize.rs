//! DNS record normalization
//!
//! Converts backend-neutral [`RawRecord`]s into [`Resource`]s.

use crate::schema::Resource;

/// Record type kept by the DNS providers (IPv4 host records)
pub const ADDRESS_RECORD_TYPE: &str = "A";

/// A DNS record as returned by a backend, before normalization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub name: String,
    pub record_type: String,
    pub values: Vec<String>,
}

/// Strip exactly one trailing root-zone delimiter
pub fn strip_root(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

/// Convert a DNS record into a resource, dropping anything but `A` records
pub fn normalize_record(provider: &str, profile: &str, record: RawRecord) -> Option<Resource> {
    if record.record_type != ADDRESS_RECORD_TYPE {
        return None;
    }

    let public_ipv4 = record.values.into_iter().next().unwrap_or_default();

    Some(Resource {
        provider: provider.to_string(),
        profile: profile.to_string(),
        dns_name: strip_root(&record.name).to_string(),
        public: true,
        public_ipv4,
        private_ipv4: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, record_type: &str, values: &[&str]) -> RawRecord {
        RawRecord {
            name: name.to_string(),
            record_type: record_type.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    #[test]
    fn test_a_record_becomes_public_resource() {
        let resource =
            normalize_record("aws", "staging", record("www.example.com.", "A", &["192.0.2.10"]))
                .unwrap();

        assert_eq!(resource.provider, "aws");
        assert_eq!(resource.profile, "staging");
        assert_eq!(resource.dns_name, "www.example.com");
        assert_eq!(resource.public_ipv4, "192.0.2.10");
        assert!(resource.public);
    }

    #[test]
    fn test_other_types_are_dropped() {
        for record_type in ["AAAA", "CNAME", "MX", "TXT", "a", "A ", "ALIAS"] {
            assert!(
                normalize_record("aws", "", record("x.example.com.", record_type, &["v"])).is_none(),
                "{record_type} should be dropped"
            );
        }
    }

    #[test]
    fn test_record_without_values_is_kept() {
        let resource = normalize_record("aws", "", record("alias.example.com.", "A", &[])).unwrap();
        assert_eq!(resource.public_ipv4, "");
        assert_eq!(resource.dns_name, "alias.example.com");
    }

    #[test]
    fn test_only_first_value_is_used() {
        let resource =
            normalize_record("gcp", "", record("rr.example.com.", "A", &["10.0.0.1", "10.0.0.2"]))
                .unwrap();
        assert_eq!(resource.public_ipv4, "10.0.0.1");
    }

    #[test]
    fn test_strip_root_removes_one_delimiter() {
        assert_eq!(strip_root("example.com."), "example.com");
        assert_eq!(strip_root("example.com.."), "example.com.");
        assert_eq!(strip_root("example.com"), "example.com");
        assert_eq!(strip_root("."), "");
    }
}
