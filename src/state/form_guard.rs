//! Unsaved-changes guard for the settings form.

use std::collections::BTreeSet;

use crate::effect::{Effect, Effects};
use crate::model::{FieldValue, FormSnapshot};

/// Tracks which fields differ from the load-time snapshot and whether leaving
/// the page should be intercepted.
#[derive(Debug, Clone, Default)]
pub struct UnsavedChangesGuard {
    snapshot: FormSnapshot,
    changed: BTreeSet<String>,
    attached: bool,
}

impl UnsavedChangesGuard {
    pub fn new(snapshot: FormSnapshot) -> Self {
        Self {
            snapshot,
            changed: BTreeSet::new(),
            attached: false,
        }
    }

    pub fn snapshot(&self) -> &FormSnapshot {
        &self.snapshot
    }

    pub fn has_unsaved_changes(&self) -> bool {
        !self.changed.is_empty()
    }

    pub fn is_changed(&self, name: &str) -> bool {
        self.changed.contains(name)
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Whether a page unload should prompt the user right now.
    pub fn should_intercept_unload(&self) -> bool {
        self.attached && self.has_unsaved_changes()
    }

    /// Register the page-unload interception.
    pub fn attach(&mut self, out: &mut Effects) {
        if !self.attached {
            self.attached = true;
            out.push(Effect::InstallUnloadGuard);
        }
    }

    /// Remove the page-unload interception.
    pub fn detach(&mut self, out: &mut Effects) {
        if self.attached {
            self.attached = false;
            out.push(Effect::RemoveUnloadGuard);
        }
    }

    /// Re-evaluate one field after it changed.
    pub fn on_field_change(&mut self, name: &str, value: &FieldValue, out: &mut Effects) {
        let changed = self.snapshot.differs(name, value);
        if changed {
            self.changed.insert(name.to_string());
        } else {
            self.changed.remove(name);
        }
        log::trace!("Field {} changed={}", name, changed);

        out.push(Effect::SetFieldChanged {
            name: name.to_string(),
            changed,
        });
        out.push(Effect::SetFormUnsaved {
            unsaved: self.has_unsaved_changes(),
        });
    }

    /// The form was submitted: everything counts as saved, without re-checking.
    pub fn on_submit(&mut self, out: &mut Effects) {
        for name in std::mem::take(&mut self.changed) {
            out.push(Effect::SetFieldChanged {
                name,
                changed: false,
            });
        }
        out.push(Effect::SetFormUnsaved { unsaved: false });
        log::debug!("💾 Settings submitted");
    }

    /// Put every changed field back to its snapshot value and clear the markers.
    /// Does nothing when no field differs.
    pub fn reset(&mut self, out: &mut Effects) {
        if self.changed.is_empty() {
            return;
        }
        for name in std::mem::take(&mut self.changed) {
            let value = self
                .snapshot
                .get(&name)
                .cloned()
                .unwrap_or(FieldValue::Text(String::new()));
            out.push(Effect::SetFieldValue {
                name: name.clone(),
                value,
            });
            out.push(Effect::SetFieldChanged {
                name,
                changed: false,
            });
        }
        out.push(Effect::SetFormUnsaved { unsaved: false });
    }
}
