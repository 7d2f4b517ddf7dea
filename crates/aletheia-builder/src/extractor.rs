//! Extracts and normalizes raw host events.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use aletheia_core::{
    AdminEvent, AdminOperation, MappingTable, NormalizedEvent, SubjectEvent, UserLookup, UNKNOWN,
};

/// Type tag used when the host omits one.
const UNKNOWN_TYPE: &str = "UNKNOWN";

/// Filters raw host events and normalizes them into [`NormalizedEvent`]s.
///
/// Subject events are gated on the mapping table's key set; admin events
/// are processed unconditionally (whether they reach the extractor at all
/// is the wiring layer's decision).
#[derive(Debug)]
pub struct EventExtractor {
    table: Arc<MappingTable>,
    lookup: Option<Arc<dyn UserLookup>>,
}

impl EventExtractor {
    /// Creates an extractor over the given mapping table.
    #[must_use]
    pub fn new(table: Arc<MappingTable>) -> Self {
        Self {
            table,
            lookup: None,
        }
    }

    /// Attaches a host user-store lookup for display-name resolution.
    #[must_use]
    pub fn with_lookup(mut self, lookup: Arc<dyn UserLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// Returns true when the event type is configured in the mapping table.
    ///
    /// Empty and unrecognized types are unsupported. `ADMIN_*` tags are
    /// deliberately never table keys: admin events bypass this gate
    /// entirely and always resolve to the default mapping downstream.
    #[must_use]
    pub fn is_supported(&self, event_type: &str) -> bool {
        !event_type.is_empty() && self.table.contains(event_type)
    }

    /// Normalizes a raw subject event.
    ///
    /// Returns `None` for an absent event or an unsupported event type.
    #[must_use]
    pub fn extract_subject_event(&self, event: Option<&SubjectEvent>) -> Option<NormalizedEvent> {
        let Some(event) = event else {
            warn!("Received absent subject event");
            return None;
        };

        let event_type = event.event_type.as_deref().unwrap_or(UNKNOWN_TYPE);
        if !self.is_supported(event_type) {
            debug!(event_type, "Unsupported subject event type");
            return None;
        }

        let username =
            self.resolve_username(&event.details, event.user_id.as_deref(), event.realm_id.as_deref());

        let auth_method = event
            .details
            .get("auth_method")
            .or_else(|| event.details.get("auth_type"))
            .cloned()
            .unwrap_or_else(|| UNKNOWN.to_string());

        Some(NormalizedEvent {
            event_type: event_type.to_string(),
            time: event.time,
            user_id: event.user_id.clone(),
            username,
            ip_address: event
                .ip_address
                .clone()
                .unwrap_or_else(|| UNKNOWN.to_string()),
            realm_id: event.realm_id.clone().unwrap_or_else(|| UNKNOWN.to_string()),
            client_id: event.client_id.clone(),
            session_id: event.session_id.clone(),
            error: event.error.clone(),
            auth_method: Some(auth_method),
            admin: None,
            details: event.details.clone(),
        })
    }

    /// Normalizes a raw admin event.
    ///
    /// Returns `None` only for an absent event; there is no type gate for
    /// admin events. The resulting type tag is `ADMIN_<operation>`.
    #[must_use]
    pub fn extract_admin_event(&self, event: Option<&AdminEvent>) -> Option<NormalizedEvent> {
        let Some(event) = event else {
            warn!("Received absent admin event");
            return None;
        };

        let operation_type = event.operation_type.as_deref().unwrap_or(UNKNOWN_TYPE);
        let resource_type = event.resource_type.as_deref().unwrap_or(UNKNOWN_TYPE);

        let auth = event.auth_details.as_ref();
        let admin_user_id = auth.and_then(|a| a.user_id.clone());

        // No subject id at all means the host could not attribute the
        // operation; "admin" marks that case apart from the generic
        // "unknown" sentinel.
        let username = admin_user_id.as_deref().map_or_else(
            || "admin".to_string(),
            |user_id| {
                self.resolve_username(&HashMap::new(), Some(user_id), event.realm_id.as_deref())
            },
        );

        let representation = event
            .representation
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);
        if representation.is_some() {
            debug!(operation_type, resource_type, "Representation received for admin operation");
        } else {
            debug!(operation_type, resource_type, "No representation for admin operation");
        }

        Some(NormalizedEvent {
            event_type: format!("ADMIN_{operation_type}"),
            time: event.time,
            user_id: admin_user_id,
            username,
            ip_address: auth
                .and_then(|a| a.ip_address.clone())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            realm_id: event.realm_id.clone().unwrap_or_else(|| UNKNOWN.to_string()),
            client_id: auth.and_then(|a| a.client_id.clone()),
            session_id: None,
            error: event.error.clone(),
            auth_method: None,
            admin: Some(AdminOperation {
                resource_type: resource_type.to_string(),
                resource_path: event.resource_path.clone(),
                operation_type: operation_type.to_string(),
                representation,
            }),
            details: HashMap::new(),
        })
    }

    /// Resolves the acting subject's display name.
    ///
    /// Priority order: a non-empty `username` detail (used verbatim, even
    /// when its literal value is `"unknown"`), then a host lookup by
    /// (realm, user id), then the raw user id, then a non-empty `email`
    /// detail, then `"unknown"`. Lookup failures count as "not found" and
    /// the chain continues.
    fn resolve_username(
        &self,
        details: &HashMap<String, String>,
        user_id: Option<&str>,
        realm_id: Option<&str>,
    ) -> String {
        if let Some(username) = details.get("username") {
            if !username.is_empty() {
                return username.clone();
            }
        }

        if let (Some(user_id), Some(realm_id), Some(lookup)) =
            (user_id, realm_id, self.lookup.as_ref())
        {
            match lookup.username(realm_id, user_id) {
                Ok(Some(username)) if !username.is_empty() => {
                    debug!(username = %username, "Resolved username via host lookup");
                    return username;
                }
                Ok(_) => {}
                Err(e) => {
                    debug!(user_id, realm_id, error = %e, "User lookup failed");
                }
            }
        }

        if let Some(user_id) = user_id {
            return user_id.to_string();
        }

        if let Some(email) = details.get("email") {
            if !email.is_empty() {
                return email.clone();
            }
        }

        UNKNOWN.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aletheia_core::{AuthDetails, LookupError, StaticLookup};

    fn extractor() -> EventExtractor {
        EventExtractor::new(Arc::new(MappingTable::load()))
    }

    fn details(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_extract_subject_event_absent_returns_none() {
        assert!(extractor().extract_subject_event(None).is_none());
    }

    #[test]
    fn test_extract_admin_event_absent_returns_none() {
        assert!(extractor().extract_admin_event(None).is_none());
    }

    #[test]
    fn test_is_supported_matches_table_key_set() {
        let table = Arc::new(MappingTable::load());
        let extractor = EventExtractor::new(Arc::clone(&table));

        for event_type in table.supported_event_types() {
            assert!(extractor.is_supported(event_type), "{event_type} should be supported");
        }
    }

    #[test]
    fn test_is_supported_rejects_unknown_and_empty() {
        let extractor = extractor();

        assert!(!extractor.is_supported("UNKNOWN_EVENT"));
        assert!(!extractor.is_supported("IDENTITY_PROVIDER_LOGIN"));
        assert!(!extractor.is_supported(""));
    }

    #[test]
    fn test_admin_types_are_not_table_keys_but_always_extract() {
        let extractor = extractor();

        // Deliberate asymmetry: never supported as subject types...
        assert!(!extractor.is_supported("ADMIN_CREATE"));

        // ...yet admin extraction has no type gate.
        let event = AdminEvent::new("CREATE", 1_700_000_000_000);
        let normalized = extractor.extract_admin_event(Some(&event)).unwrap();
        assert_eq!(normalized.event_type, "ADMIN_CREATE");
    }

    #[test]
    fn test_extract_subject_event_unsupported_type_returns_none() {
        let event = SubjectEvent::new("IDENTITY_PROVIDER_LOGIN", 0);
        assert!(extractor().extract_subject_event(Some(&event)).is_none());
    }

    #[test]
    fn test_extract_subject_event_missing_type_returns_none() {
        let event = SubjectEvent {
            event_type: None,
            ..SubjectEvent::default()
        };
        assert!(extractor().extract_subject_event(Some(&event)).is_none());
    }

    #[test]
    fn test_extract_subject_event_populates_fields() {
        let event = SubjectEvent::new("LOGIN", 1_700_000_000_000)
            .with_user_id("user-123")
            .with_ip_address("192.168.1.100")
            .with_realm_id("test-realm")
            .with_client_id("my-app")
            .with_session_id("session-456")
            .with_detail("username", "john.doe@example.com")
            .with_detail("auth_method", "openid-connect");

        let normalized = extractor().extract_subject_event(Some(&event)).unwrap();

        assert_eq!(normalized.event_type, "LOGIN");
        assert_eq!(normalized.time, 1_700_000_000_000);
        assert_eq!(normalized.user_id.as_deref(), Some("user-123"));
        assert_eq!(normalized.username, "john.doe@example.com");
        assert_eq!(normalized.ip_address, "192.168.1.100");
        assert_eq!(normalized.realm_id, "test-realm");
        assert_eq!(normalized.client_id.as_deref(), Some("my-app"));
        assert_eq!(normalized.session_id.as_deref(), Some("session-456"));
        assert_eq!(normalized.auth_method.as_deref(), Some("openid-connect"));
        assert!(!normalized.is_admin_event());
    }

    #[test]
    fn test_extract_subject_event_defaults_missing_fields() {
        let event = SubjectEvent::new("LOGIN", 0);

        let normalized = extractor().extract_subject_event(Some(&event)).unwrap();

        assert_eq!(normalized.ip_address, "unknown");
        assert_eq!(normalized.realm_id, "unknown");
        assert_eq!(normalized.username, "unknown");
        assert_eq!(normalized.auth_method.as_deref(), Some("unknown"));
    }

    #[test]
    fn test_auth_method_falls_back_to_auth_type() {
        let event = SubjectEvent::new("LOGIN", 0).with_detail("auth_type", "password");

        let normalized = extractor().extract_subject_event(Some(&event)).unwrap();
        assert_eq!(normalized.auth_method.as_deref(), Some("password"));
    }

    #[test]
    fn test_resolve_username_detail_wins_over_user_id() {
        let extractor = extractor();
        let name = extractor.resolve_username(
            &details(&[("username", "a@b.com")]),
            Some("u1"),
            Some("test-realm"),
        );
        assert_eq!(name, "a@b.com");
    }

    #[test]
    fn test_resolve_username_falls_back_to_user_id() {
        let extractor = extractor();
        let name = extractor.resolve_username(&HashMap::new(), Some("u1"), Some("test-realm"));
        assert_eq!(name, "u1");
    }

    #[test]
    fn test_resolve_username_empty_detail_treated_as_absent() {
        let extractor = extractor();
        let name = extractor.resolve_username(
            &details(&[("username", "")]),
            Some("u1"),
            Some("test-realm"),
        );
        assert_eq!(name, "u1");
    }

    #[test]
    fn test_resolve_username_explicit_unknown_wins() {
        // An explicit detail is used verbatim even when it collides with
        // the absence sentinel.
        let extractor = extractor();
        let name = extractor.resolve_username(
            &details(&[("username", "unknown")]),
            Some("u1"),
            Some("test-realm"),
        );
        assert_eq!(name, "unknown");
    }

    #[test]
    fn test_resolve_username_email_fallback() {
        let extractor = extractor();
        let name = extractor.resolve_username(
            &details(&[("email", "user@example.com")]),
            None,
            Some("test-realm"),
        );
        assert_eq!(name, "user@example.com");
    }

    #[test]
    fn test_resolve_username_empty_email_yields_unknown() {
        let extractor = extractor();
        let name = extractor.resolve_username(&details(&[("email", "")]), None, Some("test-realm"));
        assert_eq!(name, "unknown");
    }

    #[test]
    fn test_resolve_username_nothing_yields_unknown() {
        let extractor = extractor();
        let name = extractor.resolve_username(&HashMap::new(), None, Some("test-realm"));
        assert_eq!(name, "unknown");
    }

    #[test]
    fn test_resolve_username_via_lookup() {
        let lookup = StaticLookup::new().with_user("test-realm", "user-123", "john.doe");
        let extractor = EventExtractor::new(Arc::new(MappingTable::load()))
            .with_lookup(Arc::new(lookup));

        let name = extractor.resolve_username(&HashMap::new(), Some("user-123"), Some("test-realm"));
        assert_eq!(name, "john.doe");
    }

    #[derive(Debug)]
    struct FailingLookup;

    impl UserLookup for FailingLookup {
        fn username(&self, _: &str, _: &str) -> Result<Option<String>, LookupError> {
            Err(LookupError("store unavailable".to_string()))
        }
    }

    #[test]
    fn test_lookup_failure_continues_chain() {
        let extractor = EventExtractor::new(Arc::new(MappingTable::load()))
            .with_lookup(Arc::new(FailingLookup));

        let name = extractor.resolve_username(&HashMap::new(), Some("user-123"), Some("test-realm"));
        assert_eq!(name, "user-123");
    }

    #[test]
    fn test_extract_admin_event_populates_fields() {
        let event = AdminEvent::new("CREATE", 1_700_000_000_000)
            .with_realm_id("test-realm")
            .with_resource_type("USER")
            .with_resource_path("users/user-123")
            .with_representation(r#"{"username": "new.user"}"#)
            .with_auth_details(AuthDetails {
                user_id: Some("admin-1".to_string()),
                ip_address: Some("10.0.0.1".to_string()),
                client_id: Some("admin-cli".to_string()),
            });

        let normalized = extractor().extract_admin_event(Some(&event)).unwrap();

        assert_eq!(normalized.event_type, "ADMIN_CREATE");
        assert!(normalized.is_admin_event());
        assert_eq!(normalized.user_id.as_deref(), Some("admin-1"));
        assert_eq!(normalized.username, "admin-1");
        assert_eq!(normalized.ip_address, "10.0.0.1");
        assert_eq!(normalized.client_id.as_deref(), Some("admin-cli"));

        let admin = normalized.admin.unwrap();
        assert_eq!(admin.resource_type, "USER");
        assert_eq!(admin.resource_path.as_deref(), Some("users/user-123"));
        assert_eq!(admin.operation_type, "CREATE");
        assert_eq!(admin.representation.as_deref(), Some(r#"{"username": "new.user"}"#));
    }

    #[test]
    fn test_extract_admin_event_without_subject_uses_admin_fallback() {
        let event = AdminEvent::new("DELETE", 0).with_realm_id("test-realm");

        let normalized = extractor().extract_admin_event(Some(&event)).unwrap();

        assert_eq!(normalized.username, "admin");
        assert!(normalized.user_id.is_none());
        assert_eq!(normalized.ip_address, "unknown");
    }

    #[test]
    fn test_extract_admin_event_resolves_admin_name_via_lookup() {
        let lookup = StaticLookup::new().with_user("test-realm", "admin-1", "root@example.com");
        let extractor = EventExtractor::new(Arc::new(MappingTable::load()))
            .with_lookup(Arc::new(lookup));

        let event = AdminEvent::new("UPDATE", 0)
            .with_realm_id("test-realm")
            .with_auth_details(AuthDetails {
                user_id: Some("admin-1".to_string()),
                ip_address: None,
                client_id: None,
            });

        let normalized = extractor.extract_admin_event(Some(&event)).unwrap();
        assert_eq!(normalized.username, "root@example.com");
    }

    #[test]
    fn test_extract_admin_event_blank_representation_dropped() {
        let event = AdminEvent::new("CREATE", 0)
            .with_resource_type("USER")
            .with_representation("   ");

        let normalized = extractor().extract_admin_event(Some(&event)).unwrap();
        assert!(normalized.admin.unwrap().representation.is_none());
    }

    #[test]
    fn test_extract_admin_event_missing_tags_default_to_unknown() {
        let event = AdminEvent {
            time: 0,
            ..AdminEvent::default()
        };

        let normalized = extractor().extract_admin_event(Some(&event)).unwrap();

        assert_eq!(normalized.event_type, "ADMIN_UNKNOWN");
        assert_eq!(normalized.admin.unwrap().resource_type, "UNKNOWN");
    }
}
