//! The injected stylesheet backstop.
//!
//! Hosts that realize `NodeOp`s by setting `data-kiosk-*` attributes get a
//! declarative, process-wide rule-set enforcing the hidden/disabled
//! presentation even when their own CSS fights back. Loaded once per
//! session, idempotently skipped when already present.

use crate::action::EffectSet;
use crate::host::{HostError, StyleHost};

/// Stylesheet element id.
pub const STYLE_ID: &str = "kiosk-enforcement-backstop";

/// The backstop rule-set.
pub const BACKSTOP_CSS: &str = "\
[data-kiosk-hidden=\"true\"] {\n\
    display: none !important;\n\
    pointer-events: none !important;\n\
}\n\
[data-kiosk-disabled=\"true\"] {\n\
    pointer-events: none !important;\n\
    opacity: 0.4 !important;\n\
    cursor: default !important;\n\
}\n\
[data-kiosk-disabled=\"true\"]:focus {\n\
    outline: none !important;\n\
}\n";

/// Ensure the backstop is present. Idempotent.
pub fn ensure_backstop(styles: &mut dyn StyleHost) -> Result<EffectSet, HostError> {
    if styles.has_style(STYLE_ID) {
        return Ok(EffectSet::NONE);
    }
    styles.inject_style(STYLE_ID, BACKSTOP_CSS)?;
    Ok(EffectSet::STYLE_INJECTED)
}
