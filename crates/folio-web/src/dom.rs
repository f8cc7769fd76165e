#![forbid(unsafe_code)]

//! Page-level class toggles on `<html>` and `<body>`.

use folio_core::ui_mode::{ClassChange, ClassTarget, UiModeContext};
use tracing::trace;
use web_sys::{DomTokenList, Window};

fn class_list(window: &Window, target: ClassTarget) -> Option<DomTokenList> {
    let document = window.document()?;
    match target {
        ClassTarget::Root => document.document_element().map(|e| e.class_list()),
        ClassTarget::Body => document.body().map(|b| b.class_list()),
    }
}

/// Apply `changes`; missing targets are skipped.
pub fn apply_class_changes(changes: &[ClassChange]) {
    let Some(window) = web_sys::window() else {
        return;
    };
    for change in changes {
        if let Some(list) = class_list(&window, change.target) {
            let _ = list.toggle_with_force(change.class, change.enabled);
            trace!(target: "folio.device", class = change.class, enabled = change.enabled, "class toggled");
        }
    }
}

/// Bring the page in line with `mode` from scratch.
pub fn apply_mode(mode: &UiModeContext) {
    apply_class_changes(&mode.changes_from(&UiModeContext {
        smooth_scroll: !mode.smooth_scroll,
        native_cursor_hidden: !mode.native_cursor_hidden,
        reduced_motion: !mode.reduced_motion,
        mobile: !mode.mobile,
    }));
}
