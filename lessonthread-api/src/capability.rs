use std::ops::BitOr;

/// Resolved permissions for one item and one caller.
///
/// Reporting is open to everyone, so every constructor leaves `can_report`
/// set; only edit/delete depend on who the caller is.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CapabilitySet {
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_report: bool,
}

impl CapabilitySet {
    pub fn owner() -> CapabilitySet {
        Self::all_or_nothing(true)
    }

    pub fn report_only() -> CapabilitySet {
        Self::all_or_nothing(false)
    }

    pub fn all_or_nothing(all: bool) -> CapabilitySet {
        CapabilitySet {
            can_edit: all,
            can_delete: all,
            can_report: true,
        }
    }
}

impl BitOr for CapabilitySet {
    type Output = Self;

    fn bitor(self, rhs: CapabilitySet) -> CapabilitySet {
        CapabilitySet {
            can_edit: self.can_edit || rhs.can_edit,
            can_delete: self.can_delete || rhs.can_delete,
            can_report: self.can_report || rhs.can_report,
        }
    }
}
