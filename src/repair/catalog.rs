//! Static catalog of repair actions and the category filter
//!
//! The actual work of every action is done by `winrep_actions.ps1`; this table
//! only carries what the UI needs to present it.

use std::collections::{BTreeSet, HashSet};

use super::error::{RepairError, Result};

/// Pseudo-category that shows every action
pub const ALL_CATEGORIES: &str = "All";

/// Key of the action that needs a confirmation before it starts
pub const UPGRADE_PRO: &str = "upgrade_pro";

/// Key of the action that offers a restart after success
pub const CHKDSK_C: &str = "chkdsk_c";

/// One entry of the catalog
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionDefinition {
    pub key: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    /// Informational only; the script decides what really runs
    pub command: Option<&'static str>,
}

impl ActionDefinition {
    const fn new(
        key: &'static str,
        title: &'static str,
        description: &'static str,
        category: &'static str,
        command: Option<&'static str>,
    ) -> Self {
        Self {
            key,
            title,
            description,
            category,
            command,
        }
    }
}

const SYSTEM_FILES: &str = "System files / DISM";
const NETWORK: &str = "Network";
const CLEANUP: &str = "Cleanup / Updates";
const TUNING: &str = "Performance / Tuning";
const INFO: &str = "Info & Tools";

const ACTIONS: &[ActionDefinition] = &[
    ActionDefinition::new(
        "dism_scanhealth",
        "Scan the component store for corruption [ScanHealth]",
        "Checks the Windows component store for damage.",
        SYSTEM_FILES,
        Some("DISM /Online /Cleanup-Image /ScanHealth"),
    ),
    ActionDefinition::new(
        "dism_checkhealth",
        "Check whether Windows is flagged as corrupted [CheckHealth]",
        "Shows whether Windows has been marked as damaged.",
        SYSTEM_FILES,
        Some("DISM /Online /Cleanup-Image /CheckHealth"),
    ),
    ActionDefinition::new(
        "dism_restorehealth",
        "Run automatic repair operations [RestoreHealth]",
        "Tries to repair damaged component store files.",
        SYSTEM_FILES,
        Some("DISM /Online /Cleanup-Image /RestoreHealth"),
    ),
    ActionDefinition::new(
        "dism_componentcleanup",
        "Clean up superseded components [ComponentCleanup]",
        "Cleans the component store and removes outdated components.",
        SYSTEM_FILES,
        Some("DISM /Online /Cleanup-Image /StartComponentCleanup"),
    ),
    ActionDefinition::new(
        "sfc_scannow",
        "Check & repair system files [sfc /scannow]",
        "Verifies system files and restores the originals.",
        SYSTEM_FILES,
        Some("sfc /scannow"),
    ),
    ActionDefinition::new(
        "net_reset",
        "Reset network settings [FlushDNS etc.]",
        "Resets the DNS cache, Winsock and the important network stacks.",
        NETWORK,
        None,
    ),
    ActionDefinition::new(
        "wu_reset",
        "Reset Windows Update / clear its cache",
        "Clears the update cache and resets the Windows Update components.",
        CLEANUP,
        None,
    ),
    ActionDefinition::new(
        "temp_cleanup",
        "Clean up temporary files",
        "Deletes TEMP folders and unneeded files.",
        CLEANUP,
        None,
    ),
    ActionDefinition::new(
        UPGRADE_PRO,
        "Upgrade Windows Home to Windows Pro",
        "Sets the product key for the upgrade to Windows Pro.",
        TUNING,
        None,
    ),
    ActionDefinition::new(
        "power_high",
        "Enable the Windows high performance plan",
        "Activates the high performance power plan if available.",
        TUNING,
        None,
    ),
    ActionDefinition::new(
        "sysinfo",
        "Show system information",
        "Shows detailed system information.",
        INFO,
        Some("systeminfo"),
    ),
    ActionDefinition::new(
        CHKDSK_C,
        "Check the file system of C: [chkdsk]",
        "Runs a file system check of drive C: (online /scan).",
        SYSTEM_FILES,
        None,
    ),
    ActionDefinition::new(
        "bitlocker_disable",
        "Disable BitLocker on drive C:",
        "Turns BitLocker off on C:. Warning: decryption can take a long time!",
        INFO,
        None,
    ),
    ActionDefinition::new(
        "battery_info",
        "Show battery information",
        "Shows battery information (charge level, status etc.) if present.",
        INFO,
        None,
    ),
];

const DISPLAY_ORDER: &[&str] = &[
    "dism_scanhealth",
    "dism_checkhealth",
    "dism_restorehealth",
    "dism_componentcleanup",
    "sfc_scannow",
    CHKDSK_C,
    "net_reset",
    "wu_reset",
    "temp_cleanup",
    UPGRADE_PRO,
    "power_high",
    "bitlocker_disable",
    "battery_info",
    "sysinfo",
];

/// The built-in catalog
pub static CATALOG: Catalog = Catalog::new(ACTIONS, DISPLAY_ORDER);

/// Ordered action table plus the fixed presentation order
#[derive(Debug)]
pub struct Catalog {
    actions: &'static [ActionDefinition],
    order: &'static [&'static str],
}

impl Catalog {
    pub const fn new(actions: &'static [ActionDefinition], order: &'static [&'static str]) -> Self {
        Self { actions, order }
    }

    #[cfg(test)]
    pub fn actions(&self) -> &'static [ActionDefinition] {
        self.actions
    }

    pub fn get(&self, key: &str) -> Option<&'static ActionDefinition> {
        self.actions.iter().find(|a| a.key == key)
    }

    /// "All" first, then every category once, alphabetically
    pub fn list_categories(&self) -> Vec<String> {
        let distinct: BTreeSet<&str> = self.actions.iter().map(|a| a.category).collect();
        std::iter::once(ALL_CATEGORIES)
            .chain(distinct)
            .map(str::to_string)
            .collect()
    }

    /// Actions of one category in display order.
    ///
    /// Keys missing from the display order go last, keeping catalog order.
    pub fn filter(&self, category: &str) -> Vec<&'static ActionDefinition> {
        let mut visible: Vec<&'static ActionDefinition> = self
            .actions
            .iter()
            .filter(|a| category.is_empty() || category == ALL_CATEGORIES || a.category == category)
            .collect();
        // sort_by_key is stable, so unknown keys keep their catalog order
        visible.sort_by_key(|a| self.order_index(a.key));
        visible
    }

    fn order_index(&self, key: &str) -> usize {
        self.order
            .iter()
            .position(|k| *k == key)
            .unwrap_or(self.order.len() + 1)
    }

    /// Startup check: unique keys and no dangling display-order entries
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for action in self.actions {
            if !seen.insert(action.key) {
                return Err(RepairError::DuplicateAction(action.key));
            }
        }
        for key in self.order {
            if !seen.contains(key) {
                return Err(RepairError::UnknownOrderKey(key));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(actions: &[&ActionDefinition]) -> Vec<&'static str> {
        actions.iter().map(|a| a.key).collect()
    }

    #[test]
    fn builtin_catalog_is_valid() {
        CATALOG.validate().expect("built-in catalog must validate");
        assert_eq!(CATALOG.actions().len(), 14);
    }

    #[test]
    fn categories_start_with_all_and_are_distinct() {
        let cats = CATALOG.list_categories();
        assert_eq!(cats[0], ALL_CATEGORIES);
        assert_eq!(
            &cats[1..],
            &[
                "Cleanup / Updates",
                "Info & Tools",
                "Network",
                "Performance / Tuning",
                "System files / DISM",
            ]
        );
    }

    #[test]
    fn all_returns_every_action_in_display_order() {
        let all = CATALOG.filter(ALL_CATEGORIES);
        assert_eq!(keys(&all), DISPLAY_ORDER.to_vec());
        assert_eq!(CATALOG.filter("").len(), CATALOG.actions().len());
    }

    #[test]
    fn filter_keeps_only_the_category_in_display_order() {
        for category in CATALOG.list_categories().iter().skip(1) {
            let visible = CATALOG.filter(category);
            assert!(!visible.is_empty());
            assert!(visible.iter().all(|a| a.category == category.as_str()));
        }

        let system = CATALOG.filter("System files / DISM");
        // chkdsk_c sits after sfc_scannow in the catalog too, but the order
        // comes from DISPLAY_ORDER, not from the table
        assert_eq!(
            keys(&system),
            vec![
                "dism_scanhealth",
                "dism_checkhealth",
                "dism_restorehealth",
                "dism_componentcleanup",
                "sfc_scannow",
                "chkdsk_c",
            ]
        );

        let info = CATALOG.filter("Info & Tools");
        assert_eq!(keys(&info), vec!["bitlocker_disable", "battery_info", "sysinfo"]);
    }

    #[test]
    fn unknown_category_is_empty() {
        assert!(CATALOG.filter("Games").is_empty());
    }

    static EXTRA: &[ActionDefinition] = &[
        ActionDefinition::new("zeta", "Zeta", "", "X", None),
        ActionDefinition::new("beta", "Beta", "", "X", None),
        ActionDefinition::new("alpha", "Alpha", "", "X", None),
        ActionDefinition::new("gamma", "Gamma", "", "X", None),
    ];

    #[test]
    fn unknown_keys_go_last_in_catalog_order() {
        let catalog = Catalog::new(EXTRA, &["alpha"]);
        assert_eq!(keys(&catalog.filter("X")), vec!["alpha", "zeta", "beta", "gamma"]);
    }

    #[test]
    fn validate_rejects_duplicates_and_dangling_order() {
        static DUP: &[ActionDefinition] = &[
            ActionDefinition::new("sysinfo", "a", "", "Info", None),
            ActionDefinition::new("sysinfo", "a", "", "Info", None),
        ];
        let err = Catalog::new(DUP, &[]).validate().unwrap_err();
        assert!(matches!(err, RepairError::DuplicateAction("sysinfo")));

        let err = Catalog::new(EXTRA, &["missing"]).validate().unwrap_err();
        assert!(matches!(err, RepairError::UnknownOrderKey("missing")));
    }

    #[test]
    fn lookup_by_key() {
        assert_eq!(CATALOG.get(UPGRADE_PRO).map(|a| a.category), Some("Performance / Tuning"));
        assert!(CATALOG.get("nope").is_none());
    }
}
