//! Live Quran radio stations offered on the detail view: the Cairo Quran
//! radio stream, always first, followed by the catalog's stations.

use crate::i18n::{Lang, Text};
use crate::models::Radio;

/// Playback id of the Cairo Quran radio.
pub const CAIRO_SOURCE_ID: &str = "cairo";
pub const CAIRO_STREAM_URL: &str = "https://stream.radiojar.com/8s5u5tpdtwzuv";

/// A playable station with the marker id it publishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioStation {
    pub source_id: String,
    pub name: String,
    pub url: String,
}

impl RadioStation {
    pub fn cairo(lang: Lang) -> Self {
        Self {
            source_id: CAIRO_SOURCE_ID.to_string(),
            name: Text::CairoRadio.get(lang).to_string(),
            url: CAIRO_STREAM_URL.to_string(),
        }
    }

    /// Catalog stations publish `api-{id}`.
    pub fn from_catalog(radio: &Radio) -> Self {
        Self {
            source_id: format!("api-{}", radio.id),
            name: radio.name.trim().to_string(),
            url: radio.url.trim().to_string(),
        }
    }
}

/// The Cairo stream followed by every catalog station that has a stream URL.
pub fn station_list(lang: Lang, radios: &[Radio]) -> Vec<RadioStation> {
    let mut stations = vec![RadioStation::cairo(lang)];
    stations.extend(
        radios
            .iter()
            .filter(|radio| !radio.url.trim().is_empty())
            .map(RadioStation::from_catalog),
    );
    stations
}
