//! Event definitions for the audit bridge.
//!
//! Two raw shapes arrive from the identity-provider host: [`SubjectEvent`]
//! for end-user activity (logins, logouts, password changes) and
//! [`AdminEvent`] for administrative CRUD operations on managed resources.
//! The extractor normalizes both into a single [`NormalizedEvent`], which
//! is the only shape the record builder ever sees.

use std::collections::HashMap;

use serde::Serialize;

use crate::UNKNOWN;

/// A raw end-user lifecycle event as emitted by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubjectEvent {
    /// Event type tag (e.g. `LOGIN`, `LOGOUT`). Absent on malformed events.
    pub event_type: Option<String>,

    /// Event timestamp in epoch milliseconds.
    pub time: i64,

    /// Identifier of the acting user.
    pub user_id: Option<String>,

    /// Client IP address.
    pub ip_address: Option<String>,

    /// Tenant/realm identifier.
    pub realm_id: Option<String>,

    /// Identifier of the client application.
    pub client_id: Option<String>,

    /// Session identifier.
    pub session_id: Option<String>,

    /// Error tag for failure events.
    pub error: Option<String>,

    /// Auxiliary event attributes (e.g. `username`, `auth_method`).
    pub details: HashMap<String, String>,
}

impl SubjectEvent {
    /// Creates a new subject event with the given type and timestamp.
    #[must_use]
    pub fn new(event_type: &str, time: i64) -> Self {
        Self {
            event_type: Some(event_type.to_string()),
            time,
            ..Self::default()
        }
    }

    /// Sets the user id.
    #[must_use]
    pub fn with_user_id(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    /// Sets the client IP address.
    #[must_use]
    pub fn with_ip_address(mut self, ip_address: &str) -> Self {
        self.ip_address = Some(ip_address.to_string());
        self
    }

    /// Sets the realm id.
    #[must_use]
    pub fn with_realm_id(mut self, realm_id: &str) -> Self {
        self.realm_id = Some(realm_id.to_string());
        self
    }

    /// Sets the client id.
    #[must_use]
    pub fn with_client_id(mut self, client_id: &str) -> Self {
        self.client_id = Some(client_id.to_string());
        self
    }

    /// Sets the session id.
    #[must_use]
    pub fn with_session_id(mut self, session_id: &str) -> Self {
        self.session_id = Some(session_id.to_string());
        self
    }

    /// Sets the error tag.
    #[must_use]
    pub fn with_error(mut self, error: &str) -> Self {
        self.error = Some(error.to_string());
        self
    }

    /// Adds an auxiliary detail entry.
    #[must_use]
    pub fn with_detail(mut self, key: &str, value: &str) -> Self {
        self.details.insert(key.to_string(), value.to_string());
        self
    }
}

/// Authentication context of the administrator performing an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthDetails {
    /// Identifier of the authenticated administrator.
    pub user_id: Option<String>,

    /// IP address the operation originated from.
    pub ip_address: Option<String>,

    /// Client application used for the operation.
    pub client_id: Option<String>,
}

/// A raw administrative CRUD event as emitted by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdminEvent {
    /// Event timestamp in epoch milliseconds.
    pub time: i64,

    /// Tenant/realm identifier.
    pub realm_id: Option<String>,

    /// Operation type tag (e.g. `CREATE`, `UPDATE`, `DELETE`, `ACTION`).
    pub operation_type: Option<String>,

    /// Type tag of the affected resource (e.g. `USER`, `CLIENT`).
    pub resource_type: Option<String>,

    /// Path of the affected resource (e.g. `users/user-123`).
    pub resource_path: Option<String>,

    /// Opaque JSON snapshot of the affected resource, if the host was
    /// configured to include one.
    pub representation: Option<String>,

    /// Error tag for failed operations.
    pub error: Option<String>,

    /// Authentication context of the acting administrator.
    pub auth_details: Option<AuthDetails>,
}

impl AdminEvent {
    /// Creates a new admin event with the given operation type and timestamp.
    #[must_use]
    pub fn new(operation_type: &str, time: i64) -> Self {
        Self {
            operation_type: Some(operation_type.to_string()),
            time,
            ..Self::default()
        }
    }

    /// Sets the realm id.
    #[must_use]
    pub fn with_realm_id(mut self, realm_id: &str) -> Self {
        self.realm_id = Some(realm_id.to_string());
        self
    }

    /// Sets the resource type tag.
    #[must_use]
    pub fn with_resource_type(mut self, resource_type: &str) -> Self {
        self.resource_type = Some(resource_type.to_string());
        self
    }

    /// Sets the resource path.
    #[must_use]
    pub fn with_resource_path(mut self, resource_path: &str) -> Self {
        self.resource_path = Some(resource_path.to_string());
        self
    }

    /// Sets the resource representation snapshot.
    #[must_use]
    pub fn with_representation(mut self, representation: &str) -> Self {
        self.representation = Some(representation.to_string());
        self
    }

    /// Sets the error tag.
    #[must_use]
    pub fn with_error(mut self, error: &str) -> Self {
        self.error = Some(error.to_string());
        self
    }

    /// Sets the authentication context.
    #[must_use]
    pub fn with_auth_details(mut self, auth_details: AuthDetails) -> Self {
        self.auth_details = Some(auth_details);
        self
    }
}

/// Admin-only portion of a normalized event.
///
/// Present exactly when the event originated from an administrative
/// operation, so downstream code cannot read admin fields off a
/// subject event by mistake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminOperation {
    /// Type tag of the affected resource.
    pub resource_type: String,

    /// Path of the affected resource.
    pub resource_path: Option<String>,

    /// Operation type tag.
    pub operation_type: String,

    /// Opaque JSON snapshot of the affected resource.
    pub representation: Option<String>,
}

/// Canonical, normalized representation of a host event.
///
/// Constructed once by the extractor per incoming event, consumed once by
/// the record builder, then discarded. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedEvent {
    /// Event type tag (e.g. `LOGIN`, `ADMIN_CREATE`).
    pub event_type: String,

    /// Event timestamp in epoch milliseconds.
    pub time: i64,

    /// Identifier of the acting user.
    pub user_id: Option<String>,

    /// Resolved display name of the acting user. Never empty; falls back
    /// to `"unknown"`.
    pub username: String,

    /// Client IP address, or `"unknown"`.
    pub ip_address: String,

    /// Tenant/realm identifier, or `"unknown"`.
    pub realm_id: String,

    /// Identifier of the client application.
    pub client_id: Option<String>,

    /// Session identifier.
    pub session_id: Option<String>,

    /// Error tag for failure events.
    pub error: Option<String>,

    /// Authentication method used, when the host reported one.
    pub auth_method: Option<String>,

    /// Admin-only fields; `Some` exactly for administrative events.
    pub admin: Option<AdminOperation>,

    /// Auxiliary event attributes carried through from the raw event.
    pub details: HashMap<String, String>,
}

impl NormalizedEvent {
    /// Creates a new normalized event with the given type and timestamp.
    ///
    /// All optional fields start absent and the string fields that must
    /// never be empty start at the `"unknown"` sentinel.
    #[must_use]
    pub fn new(event_type: &str, time: i64) -> Self {
        Self {
            event_type: event_type.to_string(),
            time,
            user_id: None,
            username: UNKNOWN.to_string(),
            ip_address: UNKNOWN.to_string(),
            realm_id: UNKNOWN.to_string(),
            client_id: None,
            session_id: None,
            error: None,
            auth_method: None,
            admin: None,
            details: HashMap::new(),
        }
    }

    /// Returns true when this event originated from an administrative
    /// operation.
    #[must_use]
    pub const fn is_admin_event(&self) -> bool {
        self.admin.is_some()
    }

    /// Sets the user id.
    #[must_use]
    pub fn with_user_id(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    /// Sets the resolved display name.
    #[must_use]
    pub fn with_username(mut self, username: &str) -> Self {
        self.username = username.to_string();
        self
    }

    /// Sets the client IP address.
    #[must_use]
    pub fn with_ip_address(mut self, ip_address: &str) -> Self {
        self.ip_address = ip_address.to_string();
        self
    }

    /// Sets the realm id.
    #[must_use]
    pub fn with_realm_id(mut self, realm_id: &str) -> Self {
        self.realm_id = realm_id.to_string();
        self
    }

    /// Sets the client id.
    #[must_use]
    pub fn with_client_id(mut self, client_id: &str) -> Self {
        self.client_id = Some(client_id.to_string());
        self
    }

    /// Sets the session id.
    #[must_use]
    pub fn with_session_id(mut self, session_id: &str) -> Self {
        self.session_id = Some(session_id.to_string());
        self
    }

    /// Sets the error tag.
    #[must_use]
    pub fn with_error(mut self, error: &str) -> Self {
        self.error = Some(error.to_string());
        self
    }

    /// Sets the authentication method.
    #[must_use]
    pub fn with_auth_method(mut self, auth_method: &str) -> Self {
        self.auth_method = Some(auth_method.to_string());
        self
    }

    /// Attaches the admin-only fields, marking this an admin event.
    #[must_use]
    pub fn with_admin(mut self, admin: AdminOperation) -> Self {
        self.admin = Some(admin);
        self
    }

    /// Replaces the auxiliary detail map.
    #[must_use]
    pub fn with_details(mut self, details: HashMap<String, String>) -> Self {
        self.details = details;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_event_builder() {
        let event = SubjectEvent::new("LOGIN", 1_700_000_000_000)
            .with_user_id("user-123")
            .with_ip_address("192.168.1.100")
            .with_realm_id("test-realm")
            .with_detail("username", "john.doe@example.com");

        assert_eq!(event.event_type.as_deref(), Some("LOGIN"));
        assert_eq!(event.time, 1_700_000_000_000);
        assert_eq!(event.user_id.as_deref(), Some("user-123"));
        assert_eq!(
            event.details.get("username").map(String::as_str),
            Some("john.doe@example.com")
        );
    }

    #[test]
    fn test_admin_event_builder() {
        let event = AdminEvent::new("CREATE", 1_700_000_000_000)
            .with_realm_id("test-realm")
            .with_resource_type("USER")
            .with_resource_path("users/user-123")
            .with_auth_details(AuthDetails {
                user_id: Some("admin-1".to_string()),
                ip_address: Some("10.0.0.1".to_string()),
                client_id: Some("admin-cli".to_string()),
            });

        assert_eq!(event.operation_type.as_deref(), Some("CREATE"));
        assert_eq!(event.resource_path.as_deref(), Some("users/user-123"));
        let auth = event.auth_details.unwrap();
        assert_eq!(auth.user_id.as_deref(), Some("admin-1"));
    }

    #[test]
    fn test_normalized_event_defaults_to_unknown() {
        let event = NormalizedEvent::new("LOGIN", 0);

        assert_eq!(event.username, "unknown");
        assert_eq!(event.ip_address, "unknown");
        assert_eq!(event.realm_id, "unknown");
        assert!(event.user_id.is_none());
        assert!(!event.is_admin_event());
    }

    #[test]
    fn test_normalized_event_admin_discriminator() {
        let event = NormalizedEvent::new("ADMIN_CREATE", 0).with_admin(AdminOperation {
            resource_type: "USER".to_string(),
            resource_path: Some("users/user-123".to_string()),
            operation_type: "CREATE".to_string(),
            representation: None,
        });

        assert!(event.is_admin_event());
        assert_eq!(event.admin.unwrap().resource_type, "USER");
    }

    #[test]
    fn test_subject_event_serializes_for_debug_logging() {
        let event = SubjectEvent::new("LOGIN", 1_700_000_000_000).with_realm_id("test-realm");
        let json = serde_json::to_string(&event).unwrap();

        assert!(json.contains("\"event_type\":\"LOGIN\""));
        assert!(json.contains("\"realm_id\":\"test-realm\""));
    }
}
