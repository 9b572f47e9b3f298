use serde::Serialize;

use super::kind::{ImageKind, classify, is_displayable};

/// Which of the two episode fields supplied the display value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageSource {
    /// The thumbnail image.
    Primary,
    /// The guest image.
    Secondary,
    /// Neither field is displayable.
    None,
}

/// Repair the caller should persist on the thumbnail field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepairAction {
    /// Leave the record untouched.
    None,
    /// Persist `thumbnail := guest image`.
    CopySecondaryToPrimary,
    /// Persist an empty thumbnail in place of a dangling local path.
    ClearPrimary,
}

impl RepairAction {
    /// Stable kebab-case label used in reports and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            RepairAction::None => "none",
            RepairAction::CopySecondaryToPrimary => "copy-secondary-to-primary",
            RepairAction::ClearPrimary => "clear-primary",
        }
    }
}

/// Outcome of [`resolve_display_reference`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayResolution<'a> {
    /// Value to display, or `None` when a placeholder should be shown.
    pub value: Option<&'a str>,
    /// Field the value was taken from.
    pub source: ImageSource,
    /// Mutation the caller is expected to persist.
    pub action: RepairAction,
}

impl<'a> DisplayResolution<'a> {
    /// New thumbnail value implied by the action, if the record must change.
    pub fn repaired_primary(&self) -> Option<&'a str> {
        match self.action {
            RepairAction::None => None,
            RepairAction::CopySecondaryToPrimary => self.value,
            RepairAction::ClearPrimary => Some(""),
        }
    }
}

/// Decide which reference to display for an episode and whether its thumbnail needs repair.
///
/// Rules, first match wins:
///
/// 1. a displayable thumbnail is used as-is;
/// 2. otherwise a displayable guest image is used and should be copied into the thumbnail;
/// 3. otherwise a thumbnail holding a local upload path is cleared;
/// 4. otherwise nothing is displayable and nothing changes.
///
/// Local upload paths are never copied from the guest image.
pub fn resolve_display_reference<'a>(
    primary: Option<&'a str>,
    secondary: Option<&'a str>,
) -> DisplayResolution<'a> {
    if is_displayable(primary) {
        return DisplayResolution {
            value: primary,
            source: ImageSource::Primary,
            action: RepairAction::None,
        };
    }

    if is_displayable(secondary) {
        return DisplayResolution {
            value: secondary,
            source: ImageSource::Secondary,
            action: RepairAction::CopySecondaryToPrimary,
        };
    }

    let action = if classify(primary) == ImageKind::LocalUploadPath {
        RepairAction::ClearPrimary
    } else {
        RepairAction::None
    };

    DisplayResolution {
        value: None,
        source: ImageSource::None,
        action,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &str = "data:image/png;base64,AAA";

    #[test]
    fn valid_primary_always_wins() {
        for secondary in [None, Some(""), Some("https://x/y.jpg"), Some("/uploads/g.jpg")] {
            let resolved = resolve_display_reference(Some(PNG), secondary);
            assert_eq!(resolved, DisplayResolution {
                value: Some(PNG),
                source: ImageSource::Primary,
                action: RepairAction::None,
            });
        }
    }

    #[test]
    fn copies_displayable_secondary() {
        let guest = "data:image/png;base64,ZZZ";
        let resolved = resolve_display_reference(Some(""), Some(guest));
        assert_eq!(resolved, DisplayResolution {
            value: Some(guest),
            source: ImageSource::Secondary,
            action: RepairAction::CopySecondaryToPrimary,
        });
        assert_eq!(resolved.repaired_primary(), Some(guest));
    }

    #[test]
    fn copies_secondary_over_dangling_local_path() {
        let resolved =
            resolve_display_reference(Some("/uploads/old.jpg"), Some("https://cdn/x.jpg"));
        assert_eq!(resolved.action, RepairAction::CopySecondaryToPrimary);
        assert_eq!(resolved.value, Some("https://cdn/x.jpg"));
    }

    #[test]
    fn clears_local_path_without_fallback() {
        let resolved = resolve_display_reference(Some("/uploads/old.jpg"), Some(""));
        assert_eq!(resolved, DisplayResolution {
            value: None,
            source: ImageSource::None,
            action: RepairAction::ClearPrimary,
        });
        assert_eq!(resolved.repaired_primary(), Some(""));
    }

    #[test]
    fn never_copies_local_secondary() {
        let resolved =
            resolve_display_reference(Some("/uploads/old.jpg"), Some("/uploads/guest.jpg"));
        assert_eq!(resolved.action, RepairAction::ClearPrimary);
        assert_eq!(resolved.value, None);

        let resolved = resolve_display_reference(None, Some("/uploads/guest.jpg"));
        assert_eq!(resolved.action, RepairAction::None);
    }

    #[test]
    fn nothing_to_do_without_images() {
        let resolved = resolve_display_reference(Some(""), Some(""));
        assert_eq!(resolved, DisplayResolution {
            value: None,
            source: ImageSource::None,
            action: RepairAction::None,
        });
        assert_eq!(resolved.repaired_primary(), None);

        let resolved = resolve_display_reference(Some("guest.jpg"), None);
        assert_eq!(resolved.action, RepairAction::None);
    }

    #[test]
    fn second_pass_after_copy_is_a_no_op() {
        let guest = "https://cdn.example.com/guest.jpg";
        let first = resolve_display_reference(Some("/uploads/a.jpg"), Some(guest));
        let repaired = first.repaired_primary();
        let second = resolve_display_reference(repaired, Some(guest));
        assert_eq!(second.action, RepairAction::None);
        assert_eq!(second.source, ImageSource::Primary);
    }

    #[test]
    fn second_pass_after_clear_is_a_no_op() {
        let first = resolve_display_reference(Some("/uploads/a.jpg"), None);
        let second = resolve_display_reference(first.repaired_primary(), None);
        assert_eq!(second.action, RepairAction::None);
    }

    #[test]
    fn serialises_labels_in_kebab_case() {
        let resolved = resolve_display_reference(Some(""), Some("http://x"));
        let json = serde_json::to_value(resolved).unwrap();
        assert_eq!(json["source"], "secondary");
        assert_eq!(json["action"], "copy-secondary-to-primary");
        assert_eq!(RepairAction::ClearPrimary.as_str(), "clear-primary");
    }
}
