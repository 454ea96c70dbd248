//! Navigation bar visibility resolution.
//!
//! Exactly one of three signals decides, highest precedence first:
//!
//! 1. the user's [`NavBarSetting`], unless [`NavBarSetting::Unset`];
//! 2. the [`PlatformOverride`], unless [`PlatformOverride::Absent`];
//! 3. the compiled default.
//!
//! # Example
//!
//! ```
//! use hostkit_kernel::navigation_bar::resolve;
//! use hostkit_types::{NavBarSetting, PlatformOverride};
//!
//! // A user choice beats everything else.
//! assert!(resolve(NavBarSetting::Shown, PlatformOverride::ForceHidden, false));
//! // Hardware keys present: the bar is hidden.
//! assert!(!resolve(NavBarSetting::Unset, PlatformOverride::ForceHidden, true));
//! ```

use hostkit_types::{NavBarSetting, PlatformOverride};
use serde::Serialize;

/// Which signal decided a [`NavBarDecision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavBarSource {
    UserSetting,
    PlatformOverride,
    CompiledDefault,
}

/// A resolved visibility together with the signal that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavBarDecision {
    pub visible: bool,
    pub source: NavBarSource,
}

/// Resolve visibility and report which tier decided.
pub fn decide(
    user_setting: NavBarSetting,
    platform_override: PlatformOverride,
    compiled_default: bool,
) -> NavBarDecision {
    match (user_setting, platform_override) {
        (NavBarSetting::Shown, _) => NavBarDecision {
            visible: true,
            source: NavBarSource::UserSetting,
        },
        (NavBarSetting::Hidden, _) => NavBarDecision {
            visible: false,
            source: NavBarSource::UserSetting,
        },
        (NavBarSetting::Unset, PlatformOverride::ForceShown) => NavBarDecision {
            visible: true,
            source: NavBarSource::PlatformOverride,
        },
        (NavBarSetting::Unset, PlatformOverride::ForceHidden) => NavBarDecision {
            visible: false,
            source: NavBarSource::PlatformOverride,
        },
        (NavBarSetting::Unset, PlatformOverride::Absent) => NavBarDecision {
            visible: compiled_default,
            source: NavBarSource::CompiledDefault,
        },
    }
}

/// Whether the soft navigation bar should be shown.
pub fn resolve(
    user_setting: NavBarSetting,
    platform_override: PlatformOverride,
    compiled_default: bool,
) -> bool {
    decide(user_setting, platform_override, compiled_default).visible
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTINGS: [NavBarSetting; 3] = [
        NavBarSetting::Unset,
        NavBarSetting::Hidden,
        NavBarSetting::Shown,
    ];
    const OVERRIDES: [PlatformOverride; 3] = [
        PlatformOverride::Absent,
        PlatformOverride::ForceHidden,
        PlatformOverride::ForceShown,
    ];

    #[test]
    fn named_examples() {
        assert!(resolve(NavBarSetting::Shown, PlatformOverride::ForceHidden, false));
        assert!(!resolve(NavBarSetting::Unset, PlatformOverride::ForceHidden, true));
        assert!(resolve(NavBarSetting::Unset, PlatformOverride::Absent, true));
        assert!(!resolve(NavBarSetting::Unset, PlatformOverride::Absent, false));
    }

    #[test]
    fn exhaustive_table() {
        use hostkit_types::NavBarSetting as S;
        use hostkit_types::PlatformOverride as O;

        // (setting, override, default) -> visible
        let table = [
            (S::Unset, O::Absent, false, false),
            (S::Unset, O::Absent, true, true),
            (S::Unset, O::ForceHidden, false, false),
            (S::Unset, O::ForceHidden, true, false),
            (S::Unset, O::ForceShown, false, true),
            (S::Unset, O::ForceShown, true, true),
            (S::Hidden, O::Absent, false, false),
            (S::Hidden, O::Absent, true, false),
            (S::Hidden, O::ForceHidden, false, false),
            (S::Hidden, O::ForceHidden, true, false),
            (S::Hidden, O::ForceShown, false, false),
            (S::Hidden, O::ForceShown, true, false),
            (S::Shown, O::Absent, false, true),
            (S::Shown, O::Absent, true, true),
            (S::Shown, O::ForceHidden, false, true),
            (S::Shown, O::ForceHidden, true, true),
            (S::Shown, O::ForceShown, false, true),
            (S::Shown, O::ForceShown, true, true),
        ];
        assert_eq!(table.len(), 18);
        for (setting, over, default, expected) in table {
            assert_eq!(
                resolve(setting, over, default),
                expected,
                "resolve({setting:?}, {over:?}, {default})"
            );
        }
    }

    #[test]
    fn exactly_one_source_decides() {
        for setting in SETTINGS {
            for over in OVERRIDES {
                for default in [false, true] {
                    let d = decide(setting, over, default);
                    let expected = if setting != NavBarSetting::Unset {
                        NavBarSource::UserSetting
                    } else if over != PlatformOverride::Absent {
                        NavBarSource::PlatformOverride
                    } else {
                        NavBarSource::CompiledDefault
                    };
                    assert_eq!(d.source, expected);
                }
            }
        }
    }

    #[test]
    fn user_setting_ignores_lower_tiers() {
        for over in OVERRIDES {
            for default in [false, true] {
                assert!(resolve(NavBarSetting::Shown, over, default));
                assert!(!resolve(NavBarSetting::Hidden, over, default));
            }
        }
    }

    #[test]
    fn override_ignores_compiled_default() {
        for default in [false, true] {
            assert!(resolve(NavBarSetting::Unset, PlatformOverride::ForceShown, default));
            assert!(!resolve(NavBarSetting::Unset, PlatformOverride::ForceHidden, default));
        }
    }

    #[test]
    fn decide_reports_override_source() {
        let d = decide(NavBarSetting::Unset, PlatformOverride::ForceHidden, true);
        assert_eq!(d.source, NavBarSource::PlatformOverride);
        assert!(!d.visible);
    }
}
