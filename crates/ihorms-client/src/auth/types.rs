use serde::{Deserialize, Deserializer, Serialize};

/// Platform roles. The set is closed; the backend rejects anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    SuperAdmin,
    OrgAdmin,
    BranchAdmin,
    Doctor,
    Nurse,
    Receptionist,
    PharmacyStaff,
    Patient,
}

impl UserRole {
    pub const ALL: [UserRole; 8] = [
        UserRole::SuperAdmin,
        UserRole::OrgAdmin,
        UserRole::BranchAdmin,
        UserRole::Doctor,
        UserRole::Nurse,
        UserRole::Receptionist,
        UserRole::PharmacyStaff,
        UserRole::Patient,
    ];

    /// Wire name of the role
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::SuperAdmin => "super_admin",
            UserRole::OrgAdmin => "org_admin",
            UserRole::BranchAdmin => "branch_admin",
            UserRole::Doctor => "doctor",
            UserRole::Nurse => "nurse",
            UserRole::Receptionist => "receptionist",
            UserRole::PharmacyStaff => "pharmacy_staff",
            UserRole::Patient => "patient",
        }
    }

    /// Path segment under which the role's resources live, e.g. `/doctor/appointments`
    pub fn api_segment(self) -> &'static str {
        match self {
            UserRole::SuperAdmin => "super-admin",
            UserRole::OrgAdmin => "org-admin",
            UserRole::BranchAdmin => "branch-admin",
            UserRole::Doctor => "doctor",
            UserRole::Nurse => "nurse",
            UserRole::Receptionist => "receptionist",
            UserRole::PharmacyStaff => "pharmacy",
            UserRole::Patient => "patient-portal",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("unknown role: {s}"))
    }
}

/// Snapshot of the authenticated user as returned by the `me` endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Identifier that some deployments send as a number and others as a string
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(id: RawId) -> Self {
        match id {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct RawProfile {
    id: RawId,
    email: String,
    role: UserRole,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    organization_id: Option<RawId>,
    #[serde(default)]
    branch_id: Option<RawId>,
    #[serde(default)]
    is_active: Option<bool>,
}

impl<'de> Deserialize<'de> for UserProfile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawProfile::deserialize(deserializer)?;

        let full_name = raw.full_name.or_else(|| {
            let parts: Vec<&str> = [raw.first_name.as_deref(), raw.last_name.as_deref()]
                .into_iter()
                .flatten()
                .filter(|s| !s.is_empty())
                .collect();
            (!parts.is_empty()).then(|| parts.join(" "))
        });

        Ok(UserProfile {
            id: raw.id.into(),
            email: raw.email,
            role: raw.role,
            full_name,
            organization_id: raw.organization_id.map(Into::into),
            branch_id: raw.branch_id.map(Into::into),
            is_active: raw.is_active,
        })
    }
}

impl UserProfile {
    /// Name to show in the UI, falling back to the email address
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.email)
    }
}

/// How the login exchange encodes credentials
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginEncoding {
    /// `application/x-www-form-urlencoded` with `username` and `password`
    #[default]
    Form,
    /// JSON body `{"email": ..., "password": ...}`
    Json,
}

/// Login credentials
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Reply to the login and refresh exchanges
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}
