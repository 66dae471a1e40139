use image::RgbImage;
use std::fs;
use std::path::Path;

use super::{PersistError, CURRENT_CARD_IMG, CURRENT_CARD_TXT};
use crate::lookup::CardRecord;

/// `key: value` lines for the text slot.
pub fn format_card(record: &CardRecord) -> String {
    record
        .fields()
        .iter()
        .map(|(key, value)| format!("{}: {}", key, value))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Overwrites the latest-card text and image in `dir`.
pub fn write_current_card(dir: &Path, record: &CardRecord, image: &RgbImage) -> Result<(), PersistError> {
    fs::write(dir.join(CURRENT_CARD_TXT), format_card(record))?;
    image.save(dir.join(CURRENT_CARD_IMG))?;
    Ok(())
}

/// Resets the slot to "No card detected" and removes any stale image.
pub fn clear_current_card(dir: &Path) -> Result<(), PersistError> {
    fs::write(dir.join(CURRENT_CARD_TXT), "No card detected")?;
    let image = dir.join(CURRENT_CARD_IMG);
    if image.exists() {
        fs::remove_file(image)?;
    }
    Ok(())
}
