//! QR matrices for ticket payloads

use crate::error::{Result, SheetError};
use beneficiary_ledger::{encode_qr_payload, BeneficiaryRecord};
use qrcode::{Color, EcLevel, QrCode};

/// Quiet zone width in modules
pub const QUIET_ZONE: usize = 4;

/// Dark/light module grid, row-major, without quiet zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrMatrix {
    width: usize,
    dark: Vec<bool>,
}

impl QrMatrix {
    /// Encode the payload of one record
    pub fn for_record(record: &BeneficiaryRecord) -> Result<Self> {
        let payload = encode_qr_payload(&record.name, &record.ticket_code);
        let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M).map_err(
            |e| SheetError::Qr {
                ticket_code: record.ticket_code.to_string(),
                detail: e.to_string(),
            },
        )?;

        Ok(Self {
            width: code.width(),
            dark: code.to_colors().into_iter().map(|c| c == Color::Dark).collect(),
        })
    }

    /// Modules per side
    pub fn width(&self) -> usize {
        self.width
    }

    /// Modules per side including the quiet zone on both edges
    pub fn width_with_quiet_zone(&self) -> usize {
        self.width + 2 * QUIET_ZONE
    }

    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.width && self.dark[y * self.width + x]
    }

    /// Coordinates of dark modules, `y = 0` at the top
    pub fn dark_modules(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.dark
            .iter()
            .enumerate()
            .filter(|(_, dark)| **dark)
            .map(move |(i, _)| (i % self.width, i / self.width))
    }
}
