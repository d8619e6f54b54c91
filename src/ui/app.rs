use std::mem;

use anyhow::{anyhow, Result};
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use rusqlite::Connection;
use tracing::{debug, error, info, warn};

use crate::auth::{AccessError, AuthError, AuthState, Authenticator};
use crate::catalog::{CatalogPayload, CatalogResponse, CatalogWorker};
use crate::db::{fetch_person, fetch_persons};
use crate::i18n::{Lang, Text};
use crate::media::{MediaError, MediaRoot};
use crate::models::Person;
use crate::playback::{AudioChannel, AudioSink, PlaybackMarker, SystemPlayer};
use crate::reciters::surah_name;
use crate::routes::Route;
use crate::tasbih::ROUND;

use super::forms::{AuthField, AuthForm, AuthKind, ConfirmPersonDelete, PersonField, PersonForm};
use super::helpers::{build_person_cover_lines, centered_rect, surface_error};
use super::screens::{AdminScreen, DetailFocus, DetailScreen, RadioPane, ReciterView};

/// Number of person cards shown in each row of the home grid.
const GRID_COLUMNS: usize = 4;
/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Header lines above the detail panes.
const DETAIL_HEADER_HEIGHT: u16 = 5;
/// Rows given to the tasbih pane below the radio stations.
const TASBIH_HEIGHT: u16 = 9;
/// Geometric motifs rotated across the person cards.
const COVER_ART: &[&[&str]] = &[
    &["/\\/\\/", "\\/\\/\\"],
    &["*+*+", "+*+*"],
    &["<>><", "><<>"],
    &["..--", "--.."],
    &["oOo ", " OoO"],
    &["::''", "''::"],
    &["+-+-", "-+-+"],
    &["[]<>", "<>[]"],
];

/// Top-level views, one per route.
enum Screen {
    Home,
    Detail(DetailScreen),
    Admin(AdminScreen),
    NotFound(String),
}

/// Modal state layered over the current screen.
enum Mode {
    Normal,
    Authenticating(AuthForm),
    AddingPerson(PersonForm),
    EditingPerson { id: String, form: PersonForm },
    ConfirmPersonDelete(ConfirmPersonDelete),
}

/// What a key press on the detail screen asks for once the screen borrow is
/// released.
enum DetailAction {
    Nothing,
    Back,
    OpenReciter,
    PlaySurah,
    PlayRadio,
    PlayPrayer,
    Stop,
    Retry,
    RetryRadios,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    conn: Connection,
    lang: Lang,
    persons: Vec<Person>,
    selected: usize,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
    auth: Authenticator,
    catalog: CatalogWorker,
    media: MediaRoot,
    marker: PlaybackMarker,
    surahs: AudioChannel,
    prayer: AudioChannel,
    radio: AudioChannel,
}

impl App {
    pub fn new(
        conn: Connection,
        persons: Vec<Person>,
        auth: Authenticator,
        catalog: CatalogWorker,
        media: MediaRoot,
        lang: Lang,
    ) -> Self {
        let marker = PlaybackMarker::new();
        Self {
            conn,
            lang,
            persons,
            selected: 0,
            screen: Screen::Home,
            mode: Mode::Normal,
            status: None,
            auth,
            catalog,
            media,
            surahs: AudioChannel::new(Box::new(SystemPlayer::new()), marker.clone()),
            prayer: AudioChannel::new(Box::new(SystemPlayer::new()), marker.clone()),
            radio: AudioChannel::new(Box::new(SystemPlayer::new()), marker.clone()),
            marker,
        }
    }

    /// Replace the audio sinks used by the surah list, the prayer recording
    /// and the radio pane.
    pub fn with_players(
        mut self,
        surah_player: Box<dyn AudioSink>,
        prayer_player: Box<dyn AudioSink>,
        radio_player: Box<dyn AudioSink>,
    ) -> Self {
        self.surahs = AudioChannel::new(surah_player, self.marker.clone());
        self.prayer = AudioChannel::new(prayer_player, self.marker.clone());
        self.radio = AudioChannel::new(radio_player, self.marker.clone());
        self
    }

    /// Show the view for `route`.
    pub fn open(&mut self, route: Route) -> Result<()> {
        self.mode = self.navigate(route)?;
        Ok(())
    }

    /// Apply whatever happened since the last frame: catalog responses, or
    /// another source taking over playback.
    pub fn tick(&mut self) {
        while let Some(response) = self.catalog.poll() {
            self.apply_catalog(response);
        }
        self.sync_playback();
    }

    /// Release audio and forget pending fetches before the terminal is
    /// restored.
    pub(crate) fn shutdown(&mut self) {
        self.catalog.abandon();
        self.stop_all();
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mut mode = mem::replace(&mut self.mode, Mode::Normal);

        mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::Authenticating(form) => self.handle_auth_form(code, form)?,
            Mode::AddingPerson(form) => self.handle_add_person(code, form)?,
            Mode::EditingPerson { id, form } => self.handle_edit_person(code, id, form)?,
            Mode::ConfirmPersonDelete(confirm) => {
                self.handle_confirm_person_delete(code, confirm)?
            }
        };

        self.mode = mode;
        Ok(exit)
    }

    /// Switch between signing in and creating an account.
    pub(crate) fn handle_ctrl_t(&mut self) {
        if let Mode::Authenticating(form) = &mut self.mode {
            form.toggle_kind();
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match self.screen {
            Screen::Home => self.handle_home_key(code, exit),
            Screen::Detail(_) => self.handle_detail_key(code, exit),
            Screen::Admin(_) => self.handle_admin_key(code, exit),
            Screen::NotFound(_) => {
                match code {
                    KeyCode::Char('q') => *exit = true,
                    KeyCode::Esc | KeyCode::Enter => return self.navigate(Route::Home),
                    _ => {}
                }
                Ok(Mode::Normal)
            }
        }
    }

    fn handle_home_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                *exit = true;
            }
            KeyCode::Left => self.move_horizontal(-1),
            KeyCode::Right => self.move_horizontal(1),
            KeyCode::Up => self.move_vertical(-1),
            KeyCode::Down => self.move_vertical(1),
            KeyCode::Enter => {
                if let Some(person) = self.current_person() {
                    let route = Route::PersonDetail(person.id.clone());
                    self.clear_status();
                    return self.navigate(route);
                }
                self.set_status(Text::NoPersons.get(self.lang), StatusKind::Error);
            }
            KeyCode::Char('a') | KeyCode::Char('A') => {
                self.clear_status();
                return self.navigate(Route::Admin);
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_detail_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let action = {
            let Screen::Detail(detail) = &mut self.screen else {
                return Ok(Mode::Normal);
            };
            match code {
                KeyCode::Char('q') => {
                    *exit = true;
                    DetailAction::Nothing
                }
                KeyCode::Esc => {
                    if detail.close_reciter() {
                        DetailAction::Nothing
                    } else {
                        DetailAction::Back
                    }
                }
                KeyCode::Backspace => {
                    detail.close_reciter();
                    DetailAction::Nothing
                }
                KeyCode::Tab | KeyCode::BackTab => {
                    detail.toggle_focus();
                    DetailAction::Nothing
                }
                KeyCode::Up => {
                    detail.move_selection(-1);
                    DetailAction::Nothing
                }
                KeyCode::Down => {
                    detail.move_selection(1);
                    DetailAction::Nothing
                }
                KeyCode::PageUp => {
                    detail.move_selection(-10);
                    DetailAction::Nothing
                }
                KeyCode::PageDown => {
                    detail.move_selection(10);
                    DetailAction::Nothing
                }
                KeyCode::Home => {
                    detail.select_first();
                    DetailAction::Nothing
                }
                KeyCode::End => {
                    detail.select_last();
                    DetailAction::Nothing
                }
                KeyCode::Enter if detail.focus == DetailFocus::Radios => DetailAction::PlayRadio,
                KeyCode::Enter if detail.opened.is_some() => DetailAction::PlaySurah,
                KeyCode::Enter => DetailAction::OpenReciter,
                KeyCode::Char(' ') => DetailAction::Stop,
                KeyCode::Char('p') | KeyCode::Char('P') => DetailAction::PlayPrayer,
                KeyCode::Char('t') | KeyCode::Char('T') => {
                    detail.tasbih.increment();
                    DetailAction::Nothing
                }
                KeyCode::Char('r') => {
                    detail.tasbih.reset();
                    DetailAction::Nothing
                }
                KeyCode::Char('R') if detail.focus == DetailFocus::Radios => {
                    DetailAction::RetryRadios
                }
                KeyCode::Char('R') => DetailAction::Retry,
                _ => DetailAction::Nothing,
            }
        };

        match action {
            DetailAction::Nothing => {}
            DetailAction::Back => return self.navigate(Route::Home),
            DetailAction::OpenReciter => self.open_reciter(),
            DetailAction::PlaySurah => self.play_current_surah(),
            DetailAction::PlayRadio => self.play_radio(),
            DetailAction::PlayPrayer => self.play_prayer(),
            DetailAction::Stop => self.stop_playback(),
            DetailAction::Retry => self.retry_fetch(),
            DetailAction::RetryRadios => self.fetch_radios(),
        }
        Ok(Mode::Normal)
    }

    fn handle_admin_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let access = self.auth.require_admin().map(|_| ());
        match code {
            KeyCode::Char('q') => {
                *exit = true;
            }
            KeyCode::Esc => return self.navigate(Route::Home),
            KeyCode::Char('o') | KeyCode::Char('O') if self.auth.session().is_some() => {
                self.auth.sign_out();
                self.set_status(Text::SignedOut.get(self.lang), StatusKind::Info);
                return Ok(self.admin_entry_mode());
            }
            KeyCode::Enter if access == Err(AccessError::NotSignedIn) => {
                return Ok(Mode::Authenticating(AuthForm::default()));
            }
            _ if access.is_err() => {}
            KeyCode::Up => self.move_admin_selection(-1),
            KeyCode::Down => self.move_admin_selection(1),
            KeyCode::PageUp => self.move_admin_selection(-10),
            KeyCode::PageDown => self.move_admin_selection(10),
            KeyCode::Enter => {
                if let Some(person) = self.admin_person() {
                    let route = Route::PersonDetail(person.id.clone());
                    return self.navigate(route);
                }
            }
            KeyCode::Char('+') => {
                self.clear_status();
                return Ok(Mode::AddingPerson(PersonForm::default()));
            }
            KeyCode::Char('e') | KeyCode::Char('E') => {
                if let Some(person) = self.admin_person() {
                    let mode = Mode::EditingPerson {
                        id: person.id.clone(),
                        form: PersonForm::from_person(person),
                    };
                    self.clear_status();
                    return Ok(mode);
                }
                self.set_status(Text::PersonNotFound.get(self.lang), StatusKind::Error);
            }
            KeyCode::Char('-') => {
                if let Some(person) = self.admin_person() {
                    let confirm = ConfirmPersonDelete::from(person);
                    self.clear_status();
                    return Ok(Mode::ConfirmPersonDelete(confirm));
                }
                self.set_status(Text::PersonNotFound.get(self.lang), StatusKind::Error);
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_auth_form(&mut self, code: KeyCode, mut form: AuthForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => return self.navigate(Route::Home),
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => {
                let result = match form.kind {
                    AuthKind::SignIn => self
                        .auth
                        .sign_in(&self.conn, &form.email, &form.password)
                        .map(|_| Text::SignedIn),
                    AuthKind::SignUp => self
                        .auth
                        .sign_up(&self.conn, &form.email, &form.password)
                        .map(|_| Text::SignedUp),
                };
                match result {
                    Ok(text) => {
                        self.set_status(text.get(self.lang), StatusKind::Info);
                        self.ensure_admin_bounds();
                        return Ok(Mode::Normal);
                    }
                    Err(err) => {
                        if let AuthError::Storage(cause) = &err {
                            error!(error = %cause, "account storage failed");
                        }
                        let message = err.text().get(self.lang).to_string();
                        form.password.clear();
                        form.error = Some(message.clone());
                        self.set_status(message, StatusKind::Error);
                    }
                }
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Ok(Mode::Authenticating(form))
    }

    fn handle_add_person(&mut self, code: KeyCode, mut form: PersonForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => keep_open = false,
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_new_person(&form) {
                Ok(_) => keep_open = false,
                Err(err) => self.report_save_error(&mut form, &err),
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::AddingPerson(form))
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_edit_person(&mut self, code: KeyCode, id: String, mut form: PersonForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => keep_open = false,
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_existing_person(&id, &form) {
                Ok(_) => keep_open = false,
                Err(err) => self.report_save_error(&mut form, &err),
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::EditingPerson { id, form })
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_confirm_person_delete(
        &mut self,
        code: KeyCode,
        confirm: ConfirmPersonDelete,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => Ok(Mode::Normal),
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_delete(&confirm) {
                    Ok(_) => Ok(Mode::Normal),
                    Err(err) => {
                        warn!(person_id = %confirm.id, error = %err, "delete failed");
                        let message = format!(
                            "{}: {}",
                            Text::PersonDeleteFailed.get(self.lang),
                            surface_error(&err)
                        );
                        self.set_status(message, StatusKind::Error);
                        Ok(Mode::ConfirmPersonDelete(confirm))
                    }
                }
            }
            _ => Ok(Mode::ConfirmPersonDelete(confirm)),
        }
    }

    /// Leave the current view and enter the one for `route`, returning the
    /// mode it starts in.
    fn navigate(&mut self, route: Route) -> Result<Mode> {
        self.leave_detail();
        info!(path = %route.path(), "navigating");

        match route {
            Route::Home => {
                self.screen = Screen::Home;
                Ok(Mode::Normal)
            }
            Route::PersonDetail(id) => {
                let cached = self.persons.iter().find(|person| person.id == id).cloned();
                let person = match cached {
                    Some(person) => Some(person),
                    None => fetch_person(&self.conn, &id)?,
                };
                match person {
                    Some(person) => {
                        let mut detail = DetailScreen::new(person, self.lang);
                        let request = DetailScreen::reciters_request(self.lang);
                        detail.begin_request(request);
                        self.catalog.request(request);
                        self.screen = Screen::Detail(detail);
                        self.fetch_radios();
                    }
                    None => {
                        self.screen = Screen::NotFound(format!("/person/{id}"));
                        self.set_status(Text::PersonNotFound.get(self.lang), StatusKind::Error);
                    }
                }
                Ok(Mode::Normal)
            }
            Route::Admin => {
                self.auth.refresh_role(&self.conn)?;
                self.screen = Screen::Admin(AdminScreen::default());
                self.ensure_admin_bounds();
                Ok(self.admin_entry_mode())
            }
            Route::NotFound(path) => {
                self.screen = Screen::NotFound(path);
                Ok(Mode::Normal)
            }
        }
    }

    /// Playback stops and pending fetches are abandoned whenever the detail
    /// view is left.
    fn leave_detail(&mut self) {
        if matches!(self.screen, Screen::Detail(_)) {
            self.catalog.abandon();
            self.stop_all();
        }
    }

    fn admin_entry_mode(&self) -> Mode {
        match self.auth.state() {
            AuthState::SignedOut => Mode::Authenticating(AuthForm::default()),
            AuthState::SignedIn { .. } => Mode::Normal,
        }
    }

    fn apply_catalog(&mut self, response: CatalogResponse) {
        let Screen::Detail(detail) = &mut self.screen else {
            debug!(ticket = response.ticket, "catalog response outside the detail view");
            return;
        };
        let error = match response.payload {
            CatalogPayload::Reciters(fetched) => {
                detail.apply_reciters(fetched);
                detail.error
            }
            CatalogPayload::Reads { reciter_id, reads } => {
                if !detail.apply_reads(reciter_id, reads) {
                    debug!(reciter_id, "reads arrived for a reciter that is no longer selected");
                }
                detail.error
            }
            CatalogPayload::Radios(fetched) => {
                detail.radios.apply(self.lang, fetched);
                detail.radios.error
            }
        };
        if let Some(text) = error {
            self.set_status(text.get(self.lang), StatusKind::Error);
        }
    }

    fn fetch_radios(&mut self) {
        let Screen::Detail(detail) = &mut self.screen else {
            return;
        };
        detail.radios.begin_request();
        self.catalog.request(RadioPane::request(self.lang));
    }

    fn sync_playback(&mut self) {
        if self.surahs.yield_if_superseded() {
            debug!("surah playback yielded");
        }
        if self.prayer.yield_if_superseded() {
            debug!("prayer playback yielded");
        }
        if self.radio.yield_if_superseded() {
            debug!("radio playback yielded");
        }
    }

    fn stop_all(&mut self) {
        self.surahs.stop();
        self.prayer.stop();
        self.radio.stop();
    }

    fn open_reciter(&mut self) {
        let Screen::Detail(detail) = &mut self.screen else {
            return;
        };
        if let Some(request) = detail.reads_request(self.lang) {
            detail.begin_request(request);
            self.catalog.request(request);
        }
    }

    fn retry_fetch(&mut self) {
        let Screen::Detail(detail) = &mut self.screen else {
            return;
        };
        if let Some(request) = detail.last_request {
            info!(?request, "retrying catalog request");
            detail.begin_request(request);
            self.catalog.request(request);
        }
    }

    fn play_current_surah(&mut self) {
        let Screen::Detail(detail) = &self.screen else {
            return;
        };
        let Some(view) = &detail.opened else {
            return;
        };
        if view.current_surah().is_none() {
            return;
        }

        let outcome = match view.resolve_current() {
            None => Err(Text::SurahNotFound),
            Some(resolved) => {
                let source_id = resolved.playback_id();
                match self.surahs.start(source_id, &resolved.url) {
                    Ok(()) => Ok(resolved),
                    Err(err) => {
                        warn!(url = %resolved.url, error = %err, "surah playback failed");
                        Err(Text::PlaybackFailed)
                    }
                }
            }
        };

        match outcome {
            Ok(resolved) => {
                info!(read_id = resolved.read_id, surah = resolved.surah, "playing surah");
                self.sync_playback();
                let name = surah_name(resolved.surah)
                    .map(str::to_string)
                    .unwrap_or_else(|| resolved.surah.to_string());
                self.set_status(
                    format!("{}: {name}", Text::NowPlaying.get(self.lang)),
                    StatusKind::Info,
                );
            }
            Err(text) => self.set_status(text.get(self.lang), StatusKind::Error),
        }
    }

    fn play_radio(&mut self) {
        let Screen::Detail(detail) = &self.screen else {
            return;
        };
        let Some(station) = detail.radios.current().cloned() else {
            return;
        };

        match self.radio.start(station.source_id.clone(), &station.url) {
            Ok(()) => {
                info!(source_id = %station.source_id, "playing radio");
                self.sync_playback();
                self.set_status(
                    format!("{}: {}", Text::NowPlaying.get(self.lang), station.name),
                    StatusKind::Info,
                );
            }
            Err(err) => {
                warn!(url = %station.url, error = %err, "radio playback failed");
                self.set_status(surface_error(&err), StatusKind::Error);
            }
        }
    }

    fn play_prayer(&mut self) {
        let (source_id, audio) = match &self.screen {
            Screen::Detail(detail) => (detail.prayer_source_id(), detail.person.prayer_audio.clone()),
            _ => return,
        };
        let target = match audio.as_deref().map(|source| self.media.resolve(source)) {
            None | Some(Err(MediaError::Empty)) => {
                self.set_status(Text::NoPrayerAudio.get(self.lang), StatusKind::Error);
                return;
            }
            Some(Err(err)) => {
                warn!(error = %err, "prayer recording unavailable");
                self.set_status(Text::PrayerAudioMissing.get(self.lang), StatusKind::Error);
                return;
            }
            Some(Ok(target)) => target,
        };

        match self.prayer.start(source_id, &target) {
            Ok(()) => {
                self.sync_playback();
                self.clear_status();
            }
            Err(err) => {
                warn!(target = %target, error = %err, "prayer playback failed");
                self.set_status(surface_error(&err), StatusKind::Error);
            }
        }
    }

    fn stop_playback(&mut self) {
        self.stop_all();
        self.set_status(Text::Stopped.get(self.lang), StatusKind::Info);
    }

    fn report_save_error(&mut self, form: &mut PersonForm, err: &anyhow::Error) {
        let message = surface_error(err);
        warn!(error = %message, "saving person failed");
        form.error = Some(message.clone());
        self.set_status(
            format!("{}: {message}", Text::PersonSaveFailed.get(self.lang)),
            StatusKind::Error,
        );
    }

    fn save_new_person(&mut self, form: &PersonForm) -> Result<()> {
        let draft = form.parse_inputs()?;
        let admin = self
            .auth
            .require_admin()
            .map_err(|access| anyhow!(access.text().get(self.lang)))?;
        let person = admin.add_person(&self.conn, &draft)?;
        self.reload_persons(Some(&person.id))?;
        self.set_status(Text::PersonAdded.get(self.lang), StatusKind::Info);
        Ok(())
    }

    fn save_existing_person(&mut self, id: &str, form: &PersonForm) -> Result<()> {
        let draft = form.parse_inputs()?;
        let admin = self
            .auth
            .require_admin()
            .map_err(|access| anyhow!(access.text().get(self.lang)))?;
        admin.update_person(&self.conn, id, &draft)?;
        self.reload_persons(Some(id))?;
        self.set_status(Text::PersonUpdated.get(self.lang), StatusKind::Info);
        Ok(())
    }

    fn perform_delete(&mut self, confirm: &ConfirmPersonDelete) -> Result<()> {
        let admin = self
            .auth
            .require_admin()
            .map_err(|access| anyhow!(access.text().get(self.lang)))?;
        admin.delete_person(&self.conn, &confirm.id)?;
        self.reload_persons(None)?;
        self.set_status(Text::PersonDeleted.get(self.lang), StatusKind::Info);
        Ok(())
    }

    fn reload_persons(&mut self, focus_id: Option<&str>) -> Result<()> {
        self.persons = fetch_persons(&self.conn)?;
        if let Some(id) = focus_id {
            if let Some(idx) = self.persons.iter().position(|person| person.id == id) {
                self.selected = idx;
                if let Screen::Admin(admin) = &mut self.screen {
                    admin.selected = idx;
                }
            }
        }
        if self.selected >= self.persons.len() {
            self.selected = self.persons.len().saturating_sub(1);
        }
        self.ensure_admin_bounds();
        Ok(())
    }

    fn ensure_admin_bounds(&mut self) {
        let len = self.persons.len();
        if let Screen::Admin(admin) = &mut self.screen {
            admin.ensure_in_bounds(len);
        }
    }

    fn move_admin_selection(&mut self, offset: isize) {
        let len = self.persons.len();
        if let Screen::Admin(admin) = &mut self.screen {
            admin.move_selection(offset, len);
        }
    }

    fn admin_person(&self) -> Option<&Person> {
        match &self.screen {
            Screen::Admin(admin) => self.persons.get(admin.selected),
            _ => None,
        }
    }

    fn current_person(&self) -> Option<&Person> {
        self.persons.get(self.selected)
    }

    fn row_count(&self) -> usize {
        let cols = GRID_COLUMNS.max(1);
        self.persons.len().div_ceil(cols)
    }

    fn move_horizontal(&mut self, offset: isize) {
        let new_index = self.selected as isize + offset;
        if (0..self.persons.len() as isize).contains(&new_index) {
            self.selected = new_index as usize;
        }
    }

    fn move_vertical(&mut self, offset: isize) {
        let new_index = self.selected as isize + offset * GRID_COLUMNS as isize;
        if (0..self.persons.len() as isize).contains(&new_index) {
            self.selected = new_index as usize;
        }
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Home => self.draw_person_grid(frame, content_area),
            Screen::Detail(detail) => self.draw_detail(frame, content_area, detail),
            Screen::Admin(admin) => self.draw_admin(frame, content_area, admin),
            Screen::NotFound(path) => self.draw_not_found(frame, content_area, path),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::Authenticating(form) => self.draw_auth_form(frame, area, form),
            Mode::AddingPerson(form) => {
                self.draw_person_form(frame, area, Text::AddPerson.get(self.lang), form)
            }
            Mode::EditingPerson { form, .. } => {
                self.draw_person_form(frame, area, Text::EditPerson.get(self.lang), form)
            }
            Mode::ConfirmPersonDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::Normal => {}
        }
    }

    fn draw_person_grid(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::NONE)
            .title(Line::from(Text::AppTitle.get(self.lang)).alignment(Alignment::Center));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.persons.is_empty() {
            let message = Paragraph::new(Text::NoPersons.get(self.lang))
                .alignment(Alignment::Center);
            frame.render_widget(message, inner);
            return;
        }

        let rows = self.split_rows(inner);
        for (row_idx, row_chunk) in rows.into_iter().enumerate() {
            let columns = self.split_columns(row_chunk);
            for (col_idx, column_chunk) in columns.into_iter().enumerate() {
                let index = row_idx * GRID_COLUMNS + col_idx;
                let Some(person) = self.persons.get(index) else {
                    continue;
                };
                let mut block = Block::default()
                    .borders(Borders::ALL)
                    .title(person.lifespan().unwrap_or_default());
                if index == self.selected {
                    block = block.style(Style::default().fg(Color::Yellow));
                }
                let pattern = COVER_ART[index % COVER_ART.len()];
                let lines = build_person_cover_lines(
                    person,
                    pattern,
                    column_chunk.width.saturating_sub(2),
                    column_chunk.height.saturating_sub(2),
                    index == self.selected,
                );
                let card = Paragraph::new(lines).block(block);
                frame.render_widget(card, column_chunk);
            }
        }
    }

    fn draw_detail(&self, frame: &mut Frame, area: Rect, detail: &DetailScreen) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(DETAIL_HEADER_HEIGHT.min(area.height)),
                Constraint::Min(0),
            ])
            .split(area);

        let person = &detail.person;
        let mut header = vec![Line::from(Span::styled(
            person.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        if let Some(lifespan) = person.lifespan() {
            header.push(Line::from(Span::styled(
                lifespan,
                Style::default().fg(Color::Gray),
            )));
        }
        if !person.description.is_empty() {
            header.push(Line::from(person.description.clone()));
        }
        let header_block = Block::default().borders(Borders::BOTTOM);
        frame.render_widget(
            Paragraph::new(header)
                .block(header_block)
                .wrap(Wrap { trim: true }),
            chunks[0],
        );

        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(chunks[1]);
        let side = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(TASBIH_HEIGHT)])
            .split(panes[1]);
        self.draw_catalog_pane(frame, panes[0], detail);
        self.draw_radio_pane(frame, side[0], detail);
        self.draw_tasbih_pane(frame, side[1], detail);
    }

    fn pane_block(&self, title: String, focused: bool) -> Block<'static> {
        let block = Block::default().borders(Borders::ALL).title(title);
        if focused {
            block.border_style(Style::default().fg(Color::Yellow))
        } else {
            block
        }
    }

    fn draw_catalog_pane(&self, frame: &mut Frame, area: Rect, detail: &DetailScreen) {
        let title = match &detail.opened {
            Some(view) => format!("{} · {}", Text::Reciters.get(self.lang), view.reciter.name),
            None => Text::Reciters.get(self.lang).to_string(),
        };
        let block = self.pane_block(title, detail.focus == DetailFocus::Recitations);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if detail.loading {
            frame.render_widget(
                Paragraph::new(Text::Loading.get(self.lang)).alignment(Alignment::Center),
                inner,
            );
            return;
        }

        let items_empty = match &detail.opened {
            Some(view) => view.surahs.is_empty(),
            None => detail.reciters.is_empty(),
        };
        if items_empty {
            let mut lines = Vec::new();
            if let Some(text) = detail.error {
                lines.push(Line::from(Span::styled(
                    text.get(self.lang),
                    Style::default().fg(Color::Red),
                )));
                lines.push(Line::from(format!("[R] {}", Text::Retry.get(self.lang))));
            }
            frame.render_widget(
                Paragraph::new(lines)
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true }),
                inner,
            );
            return;
        }

        let (items, selected): (Vec<ListItem>, usize) = match &detail.opened {
            Some(view) => (self.surah_items(view), view.selected),
            None => (
                detail
                    .reciters
                    .iter()
                    .map(|reciter| ListItem::new(reciter.name.clone()))
                    .collect(),
                detail.reciter_selected,
            ),
        };

        let list = List::new(items)
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        let mut state = ListState::default();
        state.select(Some(selected));
        frame.render_stateful_widget(list, inner, &mut state);
    }

    fn draw_radio_pane(&self, frame: &mut Frame, area: Rect, detail: &DetailScreen) {
        let pane = &detail.radios;
        let block = self.pane_block(
            Text::Radios.get(self.lang).to_string(),
            detail.focus == DetailFocus::Radios,
        );
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let playing = self.radio.source_id();
        let mut items: Vec<ListItem> = pane
            .stations
            .iter()
            .map(|station| {
                let is_playing = playing == Some(station.source_id.as_str());
                let marker = if is_playing { "▶ " } else { "  " };
                let style = if is_playing {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(Span::styled(
                    format!("{marker}{}", station.name),
                    style,
                )))
            })
            .collect();
        if pane.loading {
            items.push(ListItem::new(Line::from(Span::styled(
                Text::Loading.get(self.lang),
                Style::default().fg(Color::Gray),
            ))));
        } else if let Some(text) = pane.error {
            items.push(ListItem::new(Line::from(Span::styled(
                format!("{} [R]", text.get(self.lang)),
                Style::default().fg(Color::Red),
            ))));
        }

        let list = List::new(items)
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        let mut state = ListState::default();
        if detail.focus == DetailFocus::Radios {
            state.select(Some(pane.selected));
        }
        frame.render_stateful_widget(list, inner, &mut state);
    }

    fn surah_items(&self, view: &ReciterView) -> Vec<ListItem<'static>> {
        let playing = self.surahs.source_id();
        view.surahs
            .iter()
            .map(|&surah| {
                let name = surah_name(surah).unwrap_or("-");
                let is_playing = playing.is_some() && view.playback_id_for(surah).as_deref() == playing;
                let marker = if is_playing { "▶ " } else { "  " };
                let style = if is_playing {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(Span::styled(
                    format!("{marker}{surah:03} {name}"),
                    style,
                )))
            })
            .collect()
    }

    fn draw_tasbih_pane(&self, frame: &mut Frame, area: Rect, detail: &DetailScreen) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Text::Tasbih.get(self.lang));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let tasbih = &detail.tasbih;
        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                tasbih.phrase(),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("{} / {ROUND}", tasbih.count())),
            Line::from(Span::styled(
                format!("Σ {}", tasbih.total()),
                Style::default().fg(Color::Gray),
            )),
            Line::from(""),
        ];

        let prayer_id = detail.prayer_source_id();
        if detail.person.prayer_audio.is_some() {
            let playing = self.prayer.is_playing(&prayer_id);
            lines.push(Line::from(if playing { "▶ [p]" } else { "[p]" }));
        } else {
            lines.push(Line::from(Span::styled(
                Text::NoPrayerAudio.get(self.lang),
                Style::default().fg(Color::DarkGray),
            )));
        }

        frame.render_widget(
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            inner,
        );
    }

    fn draw_admin(&self, frame: &mut Frame, area: Rect, admin: &AdminScreen) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Text::AdminPanel.get(self.lang));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let denied = match self.auth.require_admin() {
            Ok(_) => None,
            Err(access) => Some(access),
        };
        if let Some(access) = denied {
            let mut lines = vec![
                Line::from(""),
                Line::from(Span::styled(
                    access.text().get(self.lang),
                    Style::default().fg(Color::Red),
                )),
            ];
            if let Some(session) = self.auth.session() {
                lines.push(Line::from(Span::styled(
                    session.user.email.clone(),
                    Style::default().fg(Color::Gray),
                )));
            }
            frame.render_widget(
                Paragraph::new(lines)
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true }),
                inner,
            );
            return;
        }

        if self.persons.is_empty() {
            frame.render_widget(
                Paragraph::new(Text::NoPersons.get(self.lang)).alignment(Alignment::Center),
                inner,
            );
            return;
        }

        let items: Vec<ListItem> = self
            .persons
            .iter()
            .map(|person| {
                let mut spans = vec![Span::raw(person.name.clone())];
                if let Some(lifespan) = person.lifespan() {
                    spans.push(Span::styled(
                        format!("  {lifespan}"),
                        Style::default().fg(Color::Gray),
                    ));
                }
                spans.push(Span::styled(
                    format!("  /person/{}", person.id),
                    Style::default().fg(Color::DarkGray),
                ));
                ListItem::new(Line::from(spans))
            })
            .collect();
        let list = List::new(items)
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        let mut state = ListState::default();
        state.select(Some(admin.selected));
        frame.render_stateful_widget(list, inner, &mut state);
    }

    fn draw_not_found(&self, frame: &mut Frame, area: Rect, path: &str) {
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                "404",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Text::PageNotFound.get(self.lang)),
            Line::from(Span::styled(
                path.to_string(),
                Style::default().fg(Color::DarkGray),
            )),
        ];
        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let hints: &[(&str, &str)] = match (&self.screen, &self.mode) {
            (_, Mode::Authenticating(_)) => &[
                ("[Enter]", " Submit   "),
                ("[Tab]", " Switch field   "),
                ("[Ctrl+T]", " Sign in / Sign up   "),
                ("[Esc]", " Back"),
            ],
            (_, Mode::AddingPerson(_)) | (_, Mode::EditingPerson { .. }) => &[
                ("[Enter]", " Save   "),
                ("[Tab]", " Next field   "),
                ("[Esc]", " Cancel"),
            ],
            (_, Mode::ConfirmPersonDelete(_)) => &[("[Y]", " Delete   "), ("[N]", " Cancel")],
            (Screen::Home, _) => &[
                ("[←↑↓→]", " Navigate   "),
                ("[Enter]", " Open   "),
                ("[A]", " Admin   "),
                ("[Q]", " Quit"),
            ],
            (Screen::Detail(detail), _) if detail.focus == DetailFocus::Radios => &[
                ("[Enter]", " Play station   "),
                ("[Space]", " Stop   "),
                ("[P]", " Prayer   "),
                ("[R]", " Retry   "),
                ("[Tab]", " Reciters   "),
                ("[Esc]", " Home"),
            ],
            (Screen::Detail(detail), _) if detail.opened.is_some() => &[
                ("[Enter]", " Play   "),
                ("[Space]", " Stop   "),
                ("[Tab]", " Radio   "),
                ("[P]", " Prayer   "),
                ("[T/r]", " Tasbih   "),
                ("[Esc]", " Reciters"),
            ],
            (Screen::Detail(_), _) => &[
                ("[Enter]", " Open reciter   "),
                ("[Space]", " Stop   "),
                ("[Tab]", " Radio   "),
                ("[P]", " Prayer   "),
                ("[T/r]", " Tasbih   "),
                ("[R]", " Retry   "),
                ("[Esc]", " Home"),
            ],
            (Screen::Admin(_), _) if self.auth.require_admin().is_ok() => &[
                ("[+]", " Add   "),
                ("[E]", " Edit   "),
                ("[-]", " Delete   "),
                ("[Enter]", " Open   "),
                ("[O]", " Sign out   "),
                ("[Esc]", " Home"),
            ],
            (Screen::Admin(_), _) if self.auth.session().is_some() => {
                &[("[O]", " Sign out   "), ("[Esc]", " Home")]
            }
            (Screen::Admin(_), _) => &[("[Enter]", " Sign in   "), ("[Esc]", " Home")],
            (Screen::NotFound(_), _) => &[("[Enter]", " Home   "), ("[Q]", " Quit")],
        };

        Line::from(
            hints
                .iter()
                .flat_map(|(key, label)| {
                    [
                        Span::styled(key.to_string(), key_style),
                        Span::raw(label.to_string()),
                    ]
                })
                .collect::<Vec<_>>(),
        )
    }

    fn draw_auth_form(&self, frame: &mut Frame, area: Rect, form: &AuthForm) {
        let popup_area = centered_rect(60, 50, area);
        frame.render_widget(Clear, popup_area);

        let title = match form.kind {
            AuthKind::SignIn => Text::SignIn.get(self.lang),
            AuthKind::SignUp => Text::SignUp.get(self.lang),
        };
        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let email_line = form.build_line(AuthField::Email, self.lang);
        let password_line = form.build_line(AuthField::Password, self.lang);
        let prefix_lens = [email_line.spans[0].content.chars().count(), password_line.spans[0].content.chars().count()];

        let mut lines = vec![email_line, password_line, Line::from("")];
        lines.extend(form.requirement_lines(self.lang));
        if let Some(error) = &form.error {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        }

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

        let (row, prefix) = match form.active {
            AuthField::Email => (0, prefix_lens[0]),
            AuthField::Password => (1, prefix_lens[1]),
        };
        let cursor_x = inner.x + (prefix + form.value_len(form.active)) as u16;
        frame.set_cursor_position((cursor_x, inner.y + row));
    }

    fn draw_person_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &PersonForm) {
        let popup_area = centered_rect(70, 60, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title.to_string()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = PersonField::ALL
            .iter()
            .map(|field| form.build_line(*field, self.lang))
            .collect();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        frame.render_widget(Paragraph::new(lines), inner);

        let prefix = form.active.label(self.lang).chars().count() + 2;
        let cursor_x = inner.x + (prefix + form.value_len(form.active)) as u16;
        let cursor_y = inner.y + form.active.index() as u16;
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmPersonDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Confirm").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(Text::ConfirmDelete.get(self.lang)),
            Line::from(Span::styled(
                confirm.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn split_rows(&self, area: Rect) -> Vec<Rect> {
        let row_count = self.row_count().max(1) as u16;
        let percent = (100 / row_count).max(1);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![Constraint::Percentage(percent); row_count as usize])
            .split(area);
        chunks.iter().cloned().collect()
    }

    fn split_columns(&self, area: Rect) -> Vec<Rect> {
        let columns = GRID_COLUMNS.max(1) as u16;
        let percent = (100 / columns).max(1);
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Percentage(percent); columns as usize])
            .split(area);
        chunks.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    use tempfile::TempDir;

    use super::*;
    use crate::catalog::{CatalogError, CatalogSource};
    use crate::db::{ensure_schema, load_or_seed_persons};
    use crate::models::{Radio, Read, Reciter};
    use crate::radios::CAIRO_STREAM_URL;

    struct StubCatalog;

    impl CatalogSource for StubCatalog {
        fn reciters(&self, _lang: Lang) -> Result<Vec<Reciter>, CatalogError> {
            Ok(vec![Reciter {
                id: 1,
                name: "Reciter".into(),
                ..Reciter::default()
            }])
        }

        fn reads(&self, _reciter_id: u32, _lang: Lang) -> Result<Vec<Read>, CatalogError> {
            Ok(vec![Read {
                id: 5,
                name: String::new(),
                rewaya: String::new(),
                url: "https://server/".into(),
                suras: "2,1".into(),
                letter: None,
            }])
        }

        fn radios(&self, _lang: Lang) -> Result<Vec<Radio>, CatalogError> {
            Ok(vec![Radio {
                id: 12,
                name: "Station".into(),
                url: "https://backup.qurango.net/radio/station".into(),
                recent_date: None,
            }])
        }
    }

    #[derive(Clone, Default)]
    struct SharedSink {
        log: Arc<Mutex<Vec<String>>>,
    }

    impl SharedSink {
        fn events(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    impl AudioSink for SharedSink {
        fn play(&mut self, url: &str) -> Result<()> {
            self.log.lock().unwrap().push(format!("play {url}"));
            Ok(())
        }

        fn stop(&mut self) {
            self.log.lock().unwrap().push("stop".into());
        }
    }

    fn app(admin_emails: Vec<String>) -> (App, SharedSink, SharedSink, SharedSink, TempDir) {
        let dir = TempDir::new().unwrap();
        let conn = ensure_schema(&dir.path().join("test.sqlite")).unwrap();
        let persons = load_or_seed_persons(&conn).unwrap();
        let catalog = CatalogWorker::spawn(Arc::new(StubCatalog)).unwrap();
        let media_dir = dir.path().join("media");
        fs::create_dir_all(media_dir.join("audio")).unwrap();
        fs::write(media_dir.join("audio/doaa.mp3"), b"ID3").unwrap();
        let surah = SharedSink::default();
        let prayer = SharedSink::default();
        let radio = SharedSink::default();
        let app = App::new(
            conn,
            persons,
            Authenticator::new(admin_emails),
            catalog,
            MediaRoot::new(media_dir, None),
            Lang::En,
        )
        .with_players(
            Box::new(surah.clone()),
            Box::new(prayer.clone()),
            Box::new(radio.clone()),
        );
        (app, surah, prayer, radio, dir)
    }

    fn settle(app: &mut App) {
        for _ in 0..200 {
            app.tick();
            if !app.catalog.is_pending() {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("catalog request never completed");
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch)).unwrap();
        }
    }

    fn detail(app: &App) -> &DetailScreen {
        match &app.screen {
            Screen::Detail(detail) => detail,
            _ => panic!("not on the detail screen"),
        }
    }

    #[test]
    fn opening_a_reciter_lists_sorted_surahs_and_plays_them() {
        let (mut app, surah, prayer, _radio, dir) = app(Vec::new());
        app.handle_key(KeyCode::Enter).unwrap();
        settle(&mut app);
        assert_eq!(detail(&app).reciters.len(), 1);

        app.handle_key(KeyCode::Enter).unwrap();
        settle(&mut app);
        assert_eq!(detail(&app).opened.as_ref().unwrap().surahs, vec![1, 2]);

        app.handle_key(KeyCode::Down).unwrap();
        app.handle_key(KeyCode::Enter).unwrap();
        assert!(surah.events().contains(&"play https://server/002.mp3".to_string()));
        assert_eq!(app.surahs.source_id(), Some("surah-5-2"));

        app.handle_key(KeyCode::Char('p')).unwrap();
        app.tick();
        let expected = dir.path().join("media/audio/doaa.mp3");
        assert_eq!(prayer.events(), vec!["stop".to_string(), format!("play {}", expected.display())]);
        assert!(Path::new(&expected).is_absolute());
        assert_eq!(app.surahs.source_id(), None);
        assert_eq!(surah.events().last().map(String::as_str), Some("stop"));
    }

    #[test]
    fn playing_a_radio_makes_the_surah_list_yield() {
        let (mut app, surah, _prayer, radio, _dir) = app(Vec::new());
        app.handle_key(KeyCode::Enter).unwrap();
        settle(&mut app);
        assert_eq!(detail(&app).radios.stations.len(), 2);

        app.handle_key(KeyCode::Enter).unwrap();
        settle(&mut app);
        app.handle_key(KeyCode::Enter).unwrap();
        assert_eq!(app.surahs.source_id(), Some("surah-5-1"));

        app.handle_key(KeyCode::Tab).unwrap();
        app.handle_key(KeyCode::Enter).unwrap();
        app.tick();
        assert!(radio.events().contains(&format!("play {CAIRO_STREAM_URL}")));
        assert_eq!(app.radio.source_id(), Some("cairo"));
        assert_eq!(app.surahs.source_id(), None);
        assert_eq!(surah.events().last().map(String::as_str), Some("stop"));

        app.handle_key(KeyCode::Down).unwrap();
        app.handle_key(KeyCode::Enter).unwrap();
        assert_eq!(app.radio.source_id(), Some("api-12"));
        assert!(radio
            .events()
            .contains(&"play https://backup.qurango.net/radio/station".to_string()));
    }

    #[test]
    fn missing_prayer_recording_is_reported_not_played() {
        let (mut app, _surah, prayer, _radio, dir) = app(Vec::new());
        fs::remove_file(dir.path().join("media/audio/doaa.mp3")).unwrap();
        app.handle_key(KeyCode::Enter).unwrap();
        app.handle_key(KeyCode::Char('p')).unwrap();

        assert!(prayer.events().iter().all(|event| !event.starts_with("play ")));
        let status = app.status.as_ref().map(|status| status.text.clone());
        assert_eq!(status.as_deref(), Some(Text::PrayerAudioMissing.get(Lang::En)));
        assert_eq!(app.prayer.source_id(), None);
    }

    #[test]
    fn leaving_the_detail_view_abandons_fetches() {
        let (mut app, _surah, _prayer, _radio, _dir) = app(Vec::new());
        app.handle_key(KeyCode::Enter).unwrap();
        assert!(app.catalog.is_pending());
        app.handle_key(KeyCode::Esc).unwrap();
        assert!(matches!(app.screen, Screen::Home));
        assert!(!app.catalog.is_pending());
    }

    #[test]
    fn tasbih_keys_drive_the_counter() {
        let (mut app, _surah, _prayer, _radio, _dir) = app(Vec::new());
        app.handle_key(KeyCode::Enter).unwrap();
        app.handle_key(KeyCode::Char('t')).unwrap();
        app.handle_key(KeyCode::Char('t')).unwrap();
        assert_eq!(detail(&app).tasbih.count(), 3);
        app.handle_key(KeyCode::Char('r')).unwrap();
        assert_eq!(detail(&app).tasbih.count(), 1);
    }

    #[test]
    fn unknown_person_shows_not_found() {
        let (mut app, _surah, _prayer, _radio, _dir) = app(Vec::new());
        app.open(Route::PersonDetail("nobody".into())).unwrap();
        assert!(matches!(app.screen, Screen::NotFound(_)));
    }

    #[test]
    fn configured_admin_can_add_a_person() {
        let (mut app, _surah, _prayer, _radio, _dir) = app(vec!["admin@example.org".into()]);
        app.open(Route::Admin).unwrap();
        assert!(matches!(app.mode, Mode::Authenticating(_)));

        app.handle_ctrl_t();
        type_text(&mut app, "admin@example.org");
        app.handle_key(KeyCode::Tab).unwrap();
        type_text(&mut app, "Str0ng!pass");
        app.handle_key(KeyCode::Enter).unwrap();
        assert!(matches!(app.mode, Mode::Normal));
        assert!(app.auth.require_admin().is_ok());

        let before = app.persons.len();
        app.handle_key(KeyCode::Char('+')).unwrap();
        type_text(&mut app, "New Person");
        app.handle_key(KeyCode::Enter).unwrap();
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.persons.len(), before + 1);
        assert_eq!(app.admin_person().map(|person| person.id.as_str()), Some("new-person"));
    }

    #[test]
    fn signed_in_non_admin_cannot_open_the_person_form() {
        let (mut app, _surah, _prayer, _radio, _dir) = app(Vec::new());
        app.open(Route::Admin).unwrap();
        app.handle_ctrl_t();
        type_text(&mut app, "user@example.org");
        app.handle_key(KeyCode::Tab).unwrap();
        type_text(&mut app, "Str0ng!pass");
        app.handle_key(KeyCode::Enter).unwrap();

        assert_eq!(app.auth.require_admin().err(), Some(AccessError::NotAdmin));
        app.handle_key(KeyCode::Char('+')).unwrap();
        assert!(matches!(app.mode, Mode::Normal));

        app.handle_key(KeyCode::Char('o')).unwrap();
        assert!(matches!(app.mode, Mode::Authenticating(_)));
    }
}
