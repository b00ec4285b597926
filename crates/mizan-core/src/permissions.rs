//! # Permission Gate
//!
//! Typed permission keys and the capability lookup other components consult
//! before allowing a mutation request to be issued.
//!
//! ## Two-Level Gate
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How a Permission Check Resolves                      │
//! │                                                                         │
//! │  can_perform(ManageSales, Edit)                                        │
//! │       │                                                                 │
//! │       ├── module master enabled?   staff_sales_master                  │
//! │       │        │ no → DENY (every sales sub-permission is inert)       │
//! │       │        ▼ yes                                                    │
//! │       ├── feature view enabled?    manage_sales_view                   │
//! │       │        │ no → DENY (view is the prerequisite for siblings)     │
//! │       │        ▼ yes                                                    │
//! │       └── action itself enabled?   manage_sales_edit                   │
//! │                │ no → DENY                                              │
//! │                ▼ yes                                                    │
//! │              ALLOW                                                      │
//! │                                                                         │
//! │  Evaluated on EVERY mutating request - never cached past a             │
//! │  permission change.                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why Typed Keys?
//! The raw rows are string tags (`"deposited_create"`). Matching those
//! strings at every call site re-derives booleans ad hoc and typos silently
//! deny. The strings are parsed **once** into [`PermissionKey`] when the
//! [`PermissionSet`] is built; everything downstream is enum matching.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use ts_rs::TS;

use crate::error::{LedgerError, LedgerResult};
use crate::types::StaffPermission;

// =============================================================================
// Modules, Features, Actions
// =============================================================================

/// Top-level dashboard module, each gated by one master key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PermissionModule {
    Sales,
    Inventory,
    Expenses,
    Staff,
}

impl PermissionModule {
    /// The raw master key gating this module.
    pub fn master_key(&self) -> &'static str {
        match self {
            PermissionModule::Sales => "staff_sales_master",
            PermissionModule::Inventory => "staff_inventory_master",
            PermissionModule::Expenses => "staff_expenses_master",
            PermissionModule::Staff => "staff_management_master",
        }
    }

    const ALL: [PermissionModule; 4] = [
        PermissionModule::Sales,
        PermissionModule::Inventory,
        PermissionModule::Expenses,
        PermissionModule::Staff,
    ];
}

/// A feature sub-group within a module.
///
/// Within a feature, `View` is the prerequisite for every other action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Sales records (create, edit, delete sales).
    ManageSales,
    /// Cash deposit records.
    Deposits,
    /// Product catalog and stock (restock, corrections).
    ManageInventory,
    /// Damage reports and their approval queue.
    DamageReports,
    /// Expense records.
    ManageExpenses,
    /// Staff accounts and permission assignment.
    ManageStaff,
}

impl Feature {
    /// The module whose master key gates this feature.
    pub fn module(&self) -> PermissionModule {
        match self {
            Feature::ManageSales | Feature::Deposits => PermissionModule::Sales,
            Feature::ManageInventory | Feature::DamageReports => PermissionModule::Inventory,
            Feature::ManageExpenses => PermissionModule::Expenses,
            Feature::ManageStaff => PermissionModule::Staff,
        }
    }

    /// Raw key prefix for this feature's sub-permissions.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            Feature::ManageSales => "manage_sales",
            Feature::Deposits => "deposited",
            Feature::ManageInventory => "manage_inventory",
            Feature::DamageReports => "damage_reports",
            Feature::ManageExpenses => "manage_expenses",
            Feature::ManageStaff => "manage_staff",
        }
    }

    const ALL: [Feature; 6] = [
        Feature::ManageSales,
        Feature::Deposits,
        Feature::ManageInventory,
        Feature::DamageReports,
        Feature::ManageExpenses,
        Feature::ManageStaff,
    ];
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_prefix())
    }
}

/// Coarse capability within a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PermissionAction {
    View,
    Create,
    Edit,
    Delete,
}

impl PermissionAction {
    /// Raw key suffix.
    pub fn key_suffix(&self) -> &'static str {
        match self {
            PermissionAction::View => "view",
            PermissionAction::Create => "create",
            PermissionAction::Edit => "edit",
            PermissionAction::Delete => "delete",
        }
    }

    const ALL: [PermissionAction; 4] = [
        PermissionAction::View,
        PermissionAction::Create,
        PermissionAction::Edit,
        PermissionAction::Delete,
    ];
}

impl fmt::Display for PermissionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_suffix())
    }
}

// =============================================================================
// Permission Key
// =============================================================================

/// A fully-typed permission key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PermissionKey {
    /// Per-module master flag; gates every feature in the module.
    Master(PermissionModule),
    /// Per-feature capability flag.
    Feature {
        feature: Feature,
        action: PermissionAction,
    },
}

impl PermissionKey {
    /// Parses a raw key string (`"manage_sales_edit"`, `"staff_sales_master"`).
    ///
    /// Returns `None` for keys this build does not know - callers log and
    /// skip them rather than guessing.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();

        for module in PermissionModule::ALL {
            if raw == module.master_key() {
                return Some(PermissionKey::Master(module));
            }
        }

        for feature in Feature::ALL {
            let prefix = feature.key_prefix();
            let Some(rest) = raw.strip_prefix(prefix) else {
                continue;
            };
            let Some(suffix) = rest.strip_prefix('_') else {
                continue;
            };
            for action in PermissionAction::ALL {
                if suffix == action.key_suffix() {
                    return Some(PermissionKey::Feature { feature, action });
                }
            }
        }

        None
    }

    /// The raw string form of this key.
    pub fn as_raw(&self) -> String {
        match self {
            PermissionKey::Master(module) => module.master_key().to_string(),
            PermissionKey::Feature { feature, action } => {
                format!("{}_{}", feature.key_prefix(), action.key_suffix())
            }
        }
    }
}

// =============================================================================
// Permission Set
// =============================================================================

/// The set of enabled permission keys for one staff member, built once from
/// the raw rows and consulted on every mutating request.
#[derive(Debug, Clone, Default)]
pub struct PermissionSet {
    enabled: HashSet<PermissionKey>,
    /// Raw keys the parser did not recognize, surfaced for logging.
    unknown_keys: Vec<String>,
}

impl PermissionSet {
    /// Builds the lookup table from raw permission rows.
    ///
    /// Disabled rows and unknown keys never enter the set; unknown keys are
    /// retained verbatim so the service layer can log them.
    pub fn from_raw(rows: &[StaffPermission]) -> Self {
        let mut enabled = HashSet::new();
        let mut unknown_keys = Vec::new();

        for row in rows {
            match PermissionKey::parse(&row.permission_key) {
                Some(key) => {
                    if row.is_enabled {
                        enabled.insert(key);
                    }
                }
                None => unknown_keys.push(row.permission_key.clone()),
            }
        }

        PermissionSet {
            enabled,
            unknown_keys,
        }
    }

    /// Grants every permission - used for owner accounts and tests.
    pub fn allow_all() -> Self {
        let mut enabled = HashSet::new();
        for module in PermissionModule::ALL {
            enabled.insert(PermissionKey::Master(module));
        }
        for feature in Feature::ALL {
            for action in PermissionAction::ALL {
                enabled.insert(PermissionKey::Feature { feature, action });
            }
        }
        PermissionSet {
            enabled,
            unknown_keys: Vec::new(),
        }
    }

    /// Raw keys that failed to parse when this set was built.
    pub fn unknown_keys(&self) -> &[String] {
        &self.unknown_keys
    }

    /// Whether a single key is enabled (no gating applied).
    pub fn is_enabled(&self, key: &PermissionKey) -> bool {
        self.enabled.contains(key)
    }

    /// Resolves the full two-level gate for one capability.
    ///
    /// `false` unconditionally if the feature's module master is disabled.
    /// Otherwise the action must be enabled AND, for non-view actions, the
    /// feature's `View` key must also be enabled (view-gating cascade).
    ///
    /// A disabled master only gates at read time: the fine-grained keys are
    /// left untouched, so re-enabling the master restores them.
    pub fn can_perform(&self, feature: Feature, action: PermissionAction) -> bool {
        if !self.is_enabled(&PermissionKey::Master(feature.module())) {
            return false;
        }

        if !self.is_enabled(&PermissionKey::Feature {
            feature,
            action: PermissionAction::View,
        }) {
            return false;
        }

        self.is_enabled(&PermissionKey::Feature { feature, action })
    }

    /// `Ok(())` or `PermissionDenied` - the form the service layer uses.
    pub fn check(&self, feature: Feature, action: PermissionAction) -> LedgerResult<()> {
        if self.can_perform(feature, action) {
            Ok(())
        } else {
            Err(LedgerError::PermissionDenied { feature, action })
        }
    }

    /// Toggles one key.
    ///
    /// Disabling a feature's `View` key cascades: every sibling action in
    /// that feature is disabled with it, since view is their prerequisite.
    /// Enabling a sibling while view is off is allowed but stays inert
    /// until view is re-enabled.
    pub fn set_enabled(&mut self, key: PermissionKey, enabled: bool) {
        if enabled {
            self.enabled.insert(key);
            return;
        }

        self.enabled.remove(&key);

        if let PermissionKey::Feature {
            feature,
            action: PermissionAction::View,
        } = key
        {
            for action in PermissionAction::ALL {
                self.enabled.remove(&PermissionKey::Feature { feature, action });
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn row(key: &str, enabled: bool) -> StaffPermission {
        StaffPermission {
            staff_id: "staff-1".to_string(),
            permission_key: key.to_string(),
            is_enabled: enabled,
        }
    }

    #[test]
    fn test_parse_round_trip() {
        for raw in [
            "staff_sales_master",
            "manage_sales_view",
            "manage_sales_edit",
            "deposited_create",
            "damage_reports_delete",
        ] {
            let key = PermissionKey::parse(raw).unwrap();
            assert_eq!(key.as_raw(), raw);
        }
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!(PermissionKey::parse("manage_sales_export").is_none());
        assert!(PermissionKey::parse("totally_made_up").is_none());
        assert!(PermissionKey::parse("").is_none());
    }

    #[test]
    fn test_master_off_denies_everything_in_module() {
        // Every sales flag on, but the master is off
        let set = PermissionSet::from_raw(&[
            row("staff_sales_master", false),
            row("manage_sales_view", true),
            row("manage_sales_edit", true),
            row("deposited_view", true),
            row("deposited_create", true),
        ]);

        for action in [
            PermissionAction::View,
            PermissionAction::Create,
            PermissionAction::Edit,
            PermissionAction::Delete,
        ] {
            assert!(!set.can_perform(Feature::ManageSales, action));
            assert!(!set.can_perform(Feature::Deposits, action));
        }
    }

    #[test]
    fn test_view_gates_siblings() {
        let set = PermissionSet::from_raw(&[
            row("staff_sales_master", true),
            row("manage_sales_view", false),
            row("manage_sales_edit", true),
        ]);

        // Edit flag is on, but view is the prerequisite
        assert!(!set.can_perform(Feature::ManageSales, PermissionAction::Edit));
    }

    #[test]
    fn test_grant_resolves() {
        let set = PermissionSet::from_raw(&[
            row("staff_sales_master", true),
            row("manage_sales_view", true),
            row("manage_sales_edit", true),
        ]);

        assert!(set.can_perform(Feature::ManageSales, PermissionAction::View));
        assert!(set.can_perform(Feature::ManageSales, PermissionAction::Edit));
        assert!(!set.can_perform(Feature::ManageSales, PermissionAction::Delete));
        assert!(set.check(Feature::ManageSales, PermissionAction::Edit).is_ok());
        assert!(matches!(
            set.check(Feature::ManageSales, PermissionAction::Delete),
            Err(LedgerError::PermissionDenied { .. })
        ));
    }

    #[test]
    fn test_disabling_view_cascades() {
        let mut set = PermissionSet::from_raw(&[
            row("staff_sales_master", true),
            row("manage_sales_view", true),
            row("manage_sales_edit", true),
            row("manage_sales_delete", true),
        ]);
        assert!(set.can_perform(Feature::ManageSales, PermissionAction::Delete));

        set.set_enabled(
            PermissionKey::Feature {
                feature: Feature::ManageSales,
                action: PermissionAction::View,
            },
            false,
        );

        // Siblings were disabled outright, not just gated
        assert!(!set.is_enabled(&PermissionKey::Feature {
            feature: Feature::ManageSales,
            action: PermissionAction::Edit,
        }));
        assert!(!set.is_enabled(&PermissionKey::Feature {
            feature: Feature::ManageSales,
            action: PermissionAction::Delete,
        }));
    }

    #[test]
    fn test_master_toggle_does_not_zero_subkeys() {
        let mut set = PermissionSet::from_raw(&[
            row("staff_sales_master", true),
            row("manage_sales_view", true),
            row("manage_sales_edit", true),
        ]);

        set.set_enabled(PermissionKey::Master(PermissionModule::Sales), false);
        assert!(!set.can_perform(Feature::ManageSales, PermissionAction::Edit));

        // Re-enabling the master restores the previous fine-grained state
        set.set_enabled(PermissionKey::Master(PermissionModule::Sales), true);
        assert!(set.can_perform(Feature::ManageSales, PermissionAction::Edit));
    }

    #[test]
    fn test_unknown_keys_are_collected() {
        let set = PermissionSet::from_raw(&[
            row("staff_sales_master", true),
            row("legacy_reports_flag", true),
        ]);
        assert_eq!(set.unknown_keys(), ["legacy_reports_flag"]);
    }
}
