//! Outbound registration (uac) adapters
//!
//! Registrations are addressed upstream by `l_uuid`. Callers may supply it;
//! otherwise it is derived from `username@domain` (see
//! [`kamrpc_core::ident`]), which lets an unregister find a registration
//! created by another caller or before a restart.
//!
//! The upstream has no filtered listing, so every list operation dumps all
//! registrations and filters locally.

use crate::{KamailioClient, NotFoundPolicy};
use kamrpc_core::{ident, Result};
use serde::{Deserialize, Serialize};

/// Registration expiry used when the caller gives none, in seconds
pub const DEFAULT_EXPIRES: u32 = 60;

const FLAG_REGISTERED: i64 = 20;
const FLAG_TRYING: i64 = 16;

/// Registration state derived from the upstream flag bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    /// Flag 20
    Registered,
    /// Flag 16
    Trying,
    /// Anything else
    Unregistered,
}

impl RegistrationStatus {
    /// Map the upstream `flags` value
    ///
    /// Unknown values are not errors; the caller logs them.
    pub fn from_flags(flags: i64) -> Self {
        match flags {
            FLAG_REGISTERED => RegistrationStatus::Registered,
            FLAG_TRYING => RegistrationStatus::Trying,
            _ => RegistrationStatus::Unregistered,
        }
    }
}

/// One registration as reported by `uac.reg_dump`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Upstream identifier (`l_uuid`)
    pub id: String,
    /// Local username
    pub username: String,
    /// Local domain
    pub domain: String,
    /// Expiry in seconds
    pub expires: i64,
    /// State derived from the flags
    #[serde(rename = "registration_status")]
    pub status: RegistrationStatus,
}

/// Input for [`KamailioClient::register`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UacRegistration {
    /// Explicit identifier; empty or absent means derive from username@domain
    #[serde(default)]
    pub id: Option<String>,
    /// Username, local and remote
    pub username: String,
    /// Domain, local, remote and realm
    pub domain: String,
    /// Authentication username
    #[serde(default)]
    pub auth_username: String,
    /// Authentication password
    #[serde(default)]
    pub auth_password: String,
    /// Outbound proxy
    #[serde(default, rename = "proxy")]
    pub auth_proxy: String,
    /// Upper bound of the random delay before the first REGISTER, in seconds
    #[serde(default)]
    pub random_delay: u32,
    /// Expiry in seconds; 0 or absent means [`DEFAULT_EXPIRES`]
    #[serde(default)]
    pub expires: Option<u32>,
}

impl UacRegistration {
    /// Registration for `username@domain` with everything else defaulted
    pub fn new(username: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            domain: domain.into(),
            ..Default::default()
        }
    }

    /// Identifier this registration is addressed by upstream
    pub fn resolved_id(&self) -> String {
        ident::resolve_id(self.id.as_deref(), &self.username, &self.domain)
    }

    fn effective_expires(&self) -> u32 {
        self.expires.filter(|e| *e > 0).unwrap_or(DEFAULT_EXPIRES)
    }
}

/// `uac.reg_add` parameters; the upstream expects every field present
#[derive(Serialize)]
struct AddParams<'a> {
    l_uuid: &'a str,
    l_username: &'a str,
    l_domain: &'a str,
    r_username: &'a str,
    r_domain: &'a str,
    realm: &'a str,
    auth_username: &'a str,
    auth_password: &'a str,
    auth_ha1: &'a str,
    auth_proxy: &'a str,
    expires: u32,
    flags: i64,
    reg_delay: u32,
    socket: &'a str,
    contact_addr: &'a str,
}

#[derive(Serialize)]
struct RemoveParams<'a> {
    l_uuid: &'a str,
}

#[derive(Deserialize)]
struct DumpRow {
    #[serde(default)]
    l_uuid: String,
    #[serde(default)]
    l_username: String,
    #[serde(default)]
    l_domain: String,
    #[serde(default)]
    expires: i64,
    #[serde(default)]
    flags: i64,
}

impl From<DumpRow> for Registration {
    fn from(row: DumpRow) -> Self {
        let status = RegistrationStatus::from_flags(row.flags);
        if status == RegistrationStatus::Unregistered {
            tracing::info!(
                flags = row.flags,
                username = %row.l_username,
                domain = %row.l_domain,
                "unmatched flag"
            );
        }
        Self {
            id: row.l_uuid,
            username: row.l_username,
            domain: row.l_domain,
            expires: row.expires,
            status,
        }
    }
}

impl KamailioClient {
    /// Create a registration (`uac.reg_add`)
    ///
    /// Returns the identifier used, derived when none was supplied.
    pub async fn register(&self, registration: &UacRegistration) -> Result<String> {
        let id = registration.resolved_id();
        tracing::debug!(
            id = %id,
            username = %registration.username,
            domain = %registration.domain,
            "uac register"
        );

        let params = AddParams {
            l_uuid: &id,
            l_username: &registration.username,
            l_domain: &registration.domain,
            r_username: &registration.username,
            r_domain: &registration.domain,
            realm: &registration.domain,
            auth_username: &registration.auth_username,
            auth_password: &registration.auth_password,
            auth_ha1: "",
            auth_proxy: &registration.auth_proxy,
            expires: registration.effective_expires(),
            flags: 0,
            reg_delay: registration.random_delay,
            socket: "",
            contact_addr: "",
        };
        self.call_unit("uac.reg_add", Some(params), NotFoundPolicy::Fail)
            .await?;
        Ok(id)
    }

    /// Remove a registration (`uac.reg_remove`)
    ///
    /// Returns the identifier used, derived when `id` is absent or empty.
    pub async fn unregister(&self, id: Option<&str>, username: &str, domain: &str) -> Result<String> {
        let id = ident::resolve_id(id, username, domain);
        tracing::debug!(id = %id, username, domain, "uac unregister");

        self.call_unit(
            "uac.reg_remove",
            Some(RemoveParams { l_uuid: &id }),
            NotFoundPolicy::Fail,
        )
        .await?;
        Ok(id)
    }

    /// Every registration known upstream (`uac.reg_dump`)
    pub async fn list_registrations(&self) -> Result<Vec<Registration>> {
        tracing::debug!("running uac.reg_dump");

        let rows: Option<Vec<DumpRow>> = self.call("uac.reg_dump", None::<()>).await?;
        Ok(rows
            .unwrap_or_default()
            .into_iter()
            .map(Registration::from)
            .collect())
    }

    /// Registrations whose domain equals `domain`
    pub async fn list_registrations_by_domain(&self, domain: &str) -> Result<Vec<Registration>> {
        let mut registrations = self.list_registrations().await?;
        registrations.retain(|r| r.domain == domain);
        Ok(registrations)
    }

    /// The registration of `username@domain`, or of an explicit `id`
    pub async fn list_registrations_by_user(
        &self,
        id: Option<&str>,
        username: &str,
        domain: &str,
    ) -> Result<Vec<Registration>> {
        let id = ident::resolve_id(id, username, domain);
        let mut registrations = self.list_registrations().await?;
        registrations.retain(|r| r.id == id);
        Ok(registrations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_from_flags() {
        assert_eq!(RegistrationStatus::from_flags(20), RegistrationStatus::Registered);
        assert_eq!(RegistrationStatus::from_flags(16), RegistrationStatus::Trying);
        assert_eq!(RegistrationStatus::from_flags(99), RegistrationStatus::Unregistered);
        assert_eq!(RegistrationStatus::from_flags(0), RegistrationStatus::Unregistered);
    }

    #[test]
    fn test_dump_row_conversion() {
        let row: DumpRow = serde_json::from_value(json!({
            "l_uuid": "abc", "l_username": "1000", "l_domain": "test.com",
            "r_username": "1000", "r_domain": "test.com", "realm": "test.com",
            "auth_username": "1000", "auth_password": "secret", "auth_ha1": "",
            "auth_proxy": "sip:proxy", "expires": 60, "flags": 20, "reg_delay": 0,
            "socket": "", "contact_addr": ""
        }))
        .unwrap();

        let registration = Registration::from(row);
        assert_eq!(registration.id, "abc");
        assert_eq!(registration.username, "1000");
        assert_eq!(registration.status, RegistrationStatus::Registered);
    }

    #[test]
    fn test_registration_json_shape() {
        let registration = Registration {
            id: "abc".into(),
            username: "1000".into(),
            domain: "test.com".into(),
            expires: 60,
            status: RegistrationStatus::Trying,
        };
        assert_eq!(
            serde_json::to_value(&registration).unwrap(),
            json!({"id": "abc", "username": "1000", "domain": "test.com",
                   "expires": 60, "registration_status": "trying"})
        );
    }

    #[test]
    fn test_request_body_defaults() {
        let input: UacRegistration =
            serde_json::from_str(r#"{"username":"1000","domain":"test.com","proxy":"sip:p"}"#)
                .unwrap();
        assert_eq!(input.auth_proxy, "sip:p");
        assert_eq!(input.effective_expires(), DEFAULT_EXPIRES);
        assert_eq!(input.resolved_id(), "1648c7d7-278b-174e-9983-62b9463fef1c");

        let input = UacRegistration {
            id: Some("explicit".into()),
            expires: Some(3600),
            ..UacRegistration::new("1000", "test.com")
        };
        assert_eq!(input.resolved_id(), "explicit");
        assert_eq!(input.effective_expires(), 3600);
    }
}
