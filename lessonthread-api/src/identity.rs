/// Structured claims decoded out of an opaque identity assertion by an
/// external provider. Every field is optional; an absent field is simply
/// skipped when building match candidates.
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct IdentityClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(
        alias = "preferred_username",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub preferred_handle: Option<String>,

    #[serde(alias = "sub", alias = "uid", default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

impl IdentityClaims {
    pub fn is_admin(&self) -> bool {
        self.role
            .as_deref()
            .map_or(false, |role| role.eq_ignore_ascii_case("admin"))
    }

    /// Identity strings to compare against an item's author fields.
    pub fn candidates(&self) -> Vec<&str> {
        [
            self.email.as_deref(),
            self.name.as_deref(),
            self.preferred_handle.as_deref(),
            self.subject.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|c| !c.is_empty())
        .collect()
    }
}
