use crate::catalog::{CatalogRequest, Fetched};
use crate::i18n::{Lang, Text};
use crate::models::{Person, Radio, Read, Reciter};
use crate::radios::{station_list, RadioStation};
use crate::reciters::{all_surahs_for, resolve_surah, ResolvedSurah};
use crate::tasbih::TasbihCounter;

/// Clamp `selected + offset` into `0..len`.
fn offset_index(selected: usize, offset: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let new = (selected as isize + offset).clamp(0, len as isize - 1);
    new as usize
}

/// Recitations of the reciter opened on the detail screen.
pub(crate) struct ReciterView {
    pub(crate) reciter: Reciter,
    pub(crate) reads: Vec<Read>,
    pub(crate) surahs: Vec<u32>,
    pub(crate) selected: usize,
}

impl ReciterView {
    fn new(reciter: Reciter, reads: Vec<Read>) -> Self {
        let surahs = all_surahs_for(&reads);
        Self {
            reciter,
            reads,
            surahs,
            selected: 0,
        }
    }

    pub(crate) fn current_surah(&self) -> Option<u32> {
        self.surahs.get(self.selected).copied()
    }

    /// Read and audio URL for the highlighted surah.
    pub(crate) fn resolve_current(&self) -> Option<ResolvedSurah> {
        self.current_surah()
            .and_then(|surah| resolve_surah(&self.reads, surah))
    }

    /// Marker id that playing `surah` from this reciter would publish.
    pub(crate) fn playback_id_for(&self, surah: u32) -> Option<String> {
        resolve_surah(&self.reads, surah).map(|resolved| resolved.playback_id())
    }
}

/// Live stations: the Cairo stream until the catalog answers, then the
/// catalog stations after it.
pub(crate) struct RadioPane {
    pub(crate) stations: Vec<RadioStation>,
    pub(crate) selected: usize,
    pub(crate) loading: bool,
    pub(crate) error: Option<Text>,
}

impl RadioPane {
    fn new(lang: Lang) -> Self {
        Self {
            stations: station_list(lang, &[]),
            selected: 0,
            loading: false,
            error: None,
        }
    }

    pub(crate) fn request(lang: Lang) -> CatalogRequest {
        CatalogRequest::Radios { lang }
    }

    pub(crate) fn begin_request(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub(crate) fn apply(&mut self, lang: Lang, fetched: Fetched<Radio>) {
        self.loading = false;
        self.error = fetched.error.map(|_| Text::RadiosLoadFailed);
        self.stations = station_list(lang, &fetched.items);
        self.selected = offset_index(self.selected, 0, self.stations.len());
    }

    pub(crate) fn current(&self) -> Option<&RadioStation> {
        self.stations.get(self.selected)
    }

    fn move_selection(&mut self, offset: isize) {
        self.selected = offset_index(self.selected, offset, self.stations.len());
    }
}

/// Which pane the list keys act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DetailFocus {
    Recitations,
    Radios,
}

/// Everything the person detail view shows: the person, the reciter catalog,
/// the radio stations and the tasbih counter.
pub(crate) struct DetailScreen {
    pub(crate) person: Person,
    pub(crate) focus: DetailFocus,
    pub(crate) radios: RadioPane,
    pub(crate) reciters: Vec<Reciter>,
    pub(crate) reciter_selected: usize,
    pub(crate) opened: Option<ReciterView>,
    pub(crate) loading: bool,
    pub(crate) error: Option<Text>,
    pub(crate) last_request: Option<CatalogRequest>,
    pub(crate) tasbih: TasbihCounter,
}

impl DetailScreen {
    pub(crate) fn new(person: Person, lang: Lang) -> Self {
        Self {
            person,
            focus: DetailFocus::Recitations,
            radios: RadioPane::new(lang),
            reciters: Vec::new(),
            reciter_selected: 0,
            opened: None,
            loading: false,
            error: None,
            last_request: None,
            tasbih: TasbihCounter::new(),
        }
    }

    /// Mark a catalog request as in flight and remember it for retries.
    pub(crate) fn begin_request(&mut self, request: CatalogRequest) {
        self.loading = true;
        self.error = None;
        self.last_request = Some(request);
    }

    pub(crate) fn reciters_request(lang: Lang) -> CatalogRequest {
        CatalogRequest::Reciters { lang }
    }

    /// Request for the reads of the highlighted reciter.
    pub(crate) fn reads_request(&self, lang: Lang) -> Option<CatalogRequest> {
        self.current_reciter().map(|reciter| CatalogRequest::Reads {
            reciter_id: reciter.id,
            lang,
        })
    }

    pub(crate) fn apply_reciters(&mut self, fetched: Fetched<Reciter>) {
        self.loading = false;
        self.error = fetched.error.map(|_| Text::RecitersLoadFailed);
        self.reciters = fetched.items;
        self.reciter_selected = offset_index(self.reciter_selected, 0, self.reciters.len());
    }

    /// Open the reciter the reads belong to. Reads for a reciter that is no
    /// longer highlighted are ignored.
    pub(crate) fn apply_reads(&mut self, reciter_id: u32, fetched: Fetched<Read>) -> bool {
        let Some(reciter) = self.current_reciter().cloned() else {
            return false;
        };
        if reciter.id != reciter_id {
            return false;
        }
        self.loading = false;
        self.error = fetched.error.map(|_| Text::ReadsLoadFailed);
        self.opened = Some(ReciterView::new(reciter, fetched.items));
        true
    }

    pub(crate) fn current_reciter(&self) -> Option<&Reciter> {
        self.reciters.get(self.reciter_selected)
    }

    /// Back from the surah list to the reciter list.
    pub(crate) fn close_reciter(&mut self) -> bool {
        self.error = None;
        self.opened.take().is_some()
    }

    pub(crate) fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            DetailFocus::Recitations => DetailFocus::Radios,
            DetailFocus::Radios => DetailFocus::Recitations,
        };
    }

    /// Move within the focused list: the stations, the surahs of the open
    /// reciter, or the reciters.
    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.focus == DetailFocus::Radios {
            self.radios.move_selection(offset);
            return;
        }
        match &mut self.opened {
            Some(view) => view.selected = offset_index(view.selected, offset, view.surahs.len()),
            None => {
                self.reciter_selected =
                    offset_index(self.reciter_selected, offset, self.reciters.len())
            }
        }
    }

    pub(crate) fn select_first(&mut self) {
        if self.focus == DetailFocus::Radios {
            self.radios.selected = 0;
            return;
        }
        match &mut self.opened {
            Some(view) => view.selected = 0,
            None => self.reciter_selected = 0,
        }
    }

    pub(crate) fn select_last(&mut self) {
        if self.focus == DetailFocus::Radios {
            self.radios.selected = self.radios.stations.len().saturating_sub(1);
            return;
        }
        match &mut self.opened {
            Some(view) => view.selected = view.surahs.len().saturating_sub(1),
            None => self.reciter_selected = self.reciters.len().saturating_sub(1),
        }
    }

    /// Playback id used by the prayer recording of this person.
    pub(crate) fn prayer_source_id(&self) -> String {
        format!("prayer-{}", self.person.id)
    }
}

/// Selection state of the admin person table.
#[derive(Default)]
pub(crate) struct AdminScreen {
    pub(crate) selected: usize,
}

impl AdminScreen {
    pub(crate) fn move_selection(&mut self, offset: isize, len: usize) {
        self.selected = offset_index(self.selected, offset, len);
    }

    pub(crate) fn ensure_in_bounds(&mut self, len: usize) {
        self.selected = offset_index(self.selected, 0, len);
    }
}
