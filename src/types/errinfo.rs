//! Error-info records attached to `must` and range restrictions.

use smol_str::SmolStr;

/// The four optional error annotation sub-statements a restriction may
/// carry. All fields are copied on clone so a refined copy never aliases
/// the grouping original.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrInfo {
    pub description: Option<String>,
    pub reference: Option<String>,
    pub error_app_tag: Option<SmolStr>,
    pub error_message: Option<String>,
}

impl ErrInfo {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.reference.is_none()
            && self.error_app_tag.is_none()
            && self.error_message.is_none()
    }

    /// Merge fields from `other`, keeping existing values.
    pub fn merge_missing(&mut self, other: &ErrInfo) {
        if self.description.is_none() {
            self.description = other.description.clone();
        }
        if self.reference.is_none() {
            self.reference = other.reference.clone();
        }
        if self.error_app_tag.is_none() {
            self.error_app_tag = other.error_app_tag.clone();
        }
        if self.error_message.is_none() {
            self.error_message = other.error_message.clone();
        }
    }
}
