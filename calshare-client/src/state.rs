use chrono::{Datelike, Local};
use url::Url;

use calshare_core::{CalendarConfiguration, DayStates, HolidaySummary, Password, SaveRequest, StateId};

use crate::{Api, PasswordStore};

type ShareCallback = Box<dyn Fn(&Url) + Send + Sync>;

/// Editable calendar configuration mirrored to a calshare server.
///
/// Saving is explicit: [`CalendarState::edit`] saves once per batch of edits,
/// and only when the batch changed something and the configuration already has
/// an identifier. Server and storage failures are logged and leave the holder
/// as it was.
pub struct CalendarState<P> {
    api: Api,
    passwords: P,
    config: CalendarConfiguration,
    id: Option<StateId>,
    has_edit_access: bool,
    viewer: Url,
    on_share: Option<ShareCallback>,
}

impl<P: PasswordStore> CalendarState<P> {
    /// Starts with an empty configuration for the current year.
    pub fn new(api: Api, passwords: P) -> Self {
        let viewer = api.base().clone();
        Self {
            api,
            passwords,
            config: CalendarConfiguration::new(Local::now().year()),
            id: None,
            has_edit_access: false,
            viewer,
            on_share: None,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: CalendarConfiguration) -> Self {
        self.config = config;
        self
    }

    /// Origin of the share links, the API base by default.
    #[must_use]
    pub fn with_viewer(mut self, viewer: Url) -> Self {
        self.viewer = viewer;
        self
    }

    #[must_use]
    pub fn on_share<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Url) + Send + Sync + 'static,
    {
        self.on_share = Some(Box::new(callback));
        self
    }

    pub fn config(&self) -> &CalendarConfiguration {
        &self.config
    }

    pub fn id(&self) -> Option<&StateId> {
        self.id.as_ref()
    }

    pub fn has_edit_access(&self) -> bool {
        self.has_edit_access
    }

    pub fn passwords(&self) -> &P {
        &self.passwords
    }

    /// Loads the configuration named in the link, or creates a new one.
    pub async fn open(&mut self, id: Option<StateId>) {
        match id {
            Some(id) => {
                self.id = Some(id.clone());
                self.load(&id).await;
            }
            None => {
                self.save().await;
            }
        }
    }

    pub async fn load(&mut self, id: &StateId) {
        let config = match self.api.fetch(id).await {
            Ok(config) => config,
            Err(err) => {
                log::error!("Failed to load state `{id}`: {err}");
                return;
            }
        };

        self.has_edit_access = self.passwords.get(id).is_some();
        self.config = config;
        self.id = Some(id.clone());
        log::debug!("Loaded state `{id}` (editable: {})", self.has_edit_access);
    }

    /// Writes the whole configuration. Returns whether the server accepted it.
    pub async fn save(&mut self) -> bool {
        if self.id.is_some() && !self.has_edit_access {
            return false;
        }

        let password = self
            .id
            .as_ref()
            .and_then(|id| self.passwords.get(id))
            .unwrap_or_else(Password::generate);

        let request = SaveRequest {
            state: self.config.clone(),
            id: self.id.clone(),
            password: Some(password.clone()),
        };

        match self.api.save(&request).await {
            Ok(id) => {
                self.passwords.set(&id, &password);
                self.has_edit_access = true;
                log::debug!("Saved state `{id}`");
                self.id = Some(id);
                true
            }
            Err(err) => {
                log::error!("Failed to save state: {err}");
                false
            }
        }
    }

    /// Applies a batch of edits, then saves if anything changed and the
    /// configuration has been created already. Returns whether a save happened.
    pub async fn edit<F>(&mut self, f: F) -> bool
    where
        F: FnOnce(&mut CalendarConfiguration),
    {
        let before = self.config.clone();
        f(&mut self.config);

        if self.config == before || self.id.is_none() {
            return false;
        }

        self.save().await
    }

    pub async fn set_year(&mut self, year: i32) -> bool {
        self.edit(|config| config.selected_year = year).await
    }

    pub async fn set_hide_weekend_colors(&mut self, hide: bool) -> bool {
        self.edit(|config| config.hide_weekend_colors = hide).await
    }

    pub async fn set_holiday_summary(&mut self, summary: HolidaySummary) -> bool {
        self.edit(|config| config.holiday_summary = summary).await
    }

    pub async fn set_day_states(&mut self, day_states: DayStates) -> bool {
        self.edit(|config| config.day_states = day_states).await
    }

    /// Viewer link of the current configuration, handed to the share callback.
    pub fn share(&self) -> Option<Url> {
        let id = self.id.as_ref()?;

        let mut url = self.viewer.clone();
        url.set_path("/");
        url.query_pairs_mut().clear().append_pair("id", id.as_str());

        if let Some(callback) = &self.on_share {
            callback(&url);
        }

        Some(url)
    }
}
