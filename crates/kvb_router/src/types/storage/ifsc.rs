//! Mirrored IFSC directory rows.

use serde::Deserialize;

/// One branch of the IFSC directory, mirrored daily from the partner's
/// dataset.
#[derive(Clone, Debug, Deserialize)]
pub struct IfscEntry {
    pub ifsc_code: String,
    pub bank_name: String,
    pub branch: String,
    pub city: String,
}
