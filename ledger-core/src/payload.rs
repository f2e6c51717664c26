//! QR payload printed on tickets
//!
//! The renderer encodes, the scanning client decodes before calling the
//! ledger. Both sides go through this module so the labels cannot drift.

use crate::types::TicketCode;

/// Label of the name line
pub const NAME_LABEL: &str = "Name";

/// Label of the code line
pub const CODE_LABEL: &str = "Code";

/// Name label used on tickets printed before the English labels
const LEGACY_NAME_LABEL: &str = "Noms";

/// Build the text embedded in a ticket's QR code
pub fn encode_qr_payload(name: &str, ticket_code: &TicketCode) -> String {
    format!("{} : {}\n{} : {}", NAME_LABEL, name, CODE_LABEL, ticket_code)
}

/// Extract the ticket code from scanned text
///
/// Accepts the labelled payload produced by [`encode_qr_payload`] (either
/// name label) or a bare ticket code typed by hand.
pub fn decode_qr_payload(text: &str) -> Option<TicketCode> {
    let mut labelled = false;

    for line in text.lines() {
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        match label.trim() {
            CODE_LABEL => {
                let code = TicketCode::new(value);
                return (!code.is_empty()).then_some(code);
            }
            NAME_LABEL | LEGACY_NAME_LABEL => labelled = true,
            _ => {}
        }
    }

    if labelled || text.contains('\n') {
        return None;
    }

    let code = TicketCode::new(text);
    (!code.is_empty()).then_some(code)
}
