use async_trait::async_trait;
use log::warn;
use std::sync::Arc;

use super::{
    Settings, SettingsRepositoryTrait, SettingsServiceTrait, SettingsUpdate, Theme, CURRENCY_KEY,
    NOTIFICATIONS_KEY, SESSION_USER_KEY, THEME_KEY,
};
use crate::errors::{Error, Result};
use crate::events::{DomainEvent, DomainEventSink, NoOpDomainEventSink};

fn is_currency_code(value: &str) -> bool {
    value.len() == 3 && value.bytes().all(|b| b.is_ascii_uppercase())
}

pub struct SettingsService {
    settings_repository: Arc<dyn SettingsRepositoryTrait>,
    event_sink: Arc<dyn DomainEventSink>,
}

impl SettingsService {
    pub fn new(settings_repository: Arc<dyn SettingsRepositoryTrait>) -> Self {
        Self {
            settings_repository,
            event_sink: Arc::new(NoOpDomainEventSink),
        }
    }

    pub fn with_event_sink(mut self, event_sink: Arc<dyn DomainEventSink>) -> Self {
        self.event_sink = event_sink;
        self
    }
}

#[async_trait]
impl SettingsServiceTrait for SettingsService {
    fn get_settings(&self) -> Result<Settings> {
        let stored = self.settings_repository.list_settings()?;
        let mut settings = Settings::default();

        if let Some(raw) = stored.get(THEME_KEY) {
            match Theme::parse(raw) {
                Some(theme) => settings.theme = theme,
                None => warn!("[Settings] Ignoring unknown theme '{}'", raw),
            }
        }
        if let Some(raw) = stored.get(CURRENCY_KEY) {
            settings.currency = raw.clone();
        }
        if let Some(raw) = stored.get(NOTIFICATIONS_KEY) {
            settings.notifications_enabled = raw == "true";
        }
        Ok(settings)
    }

    async fn update_settings(&self, update: SettingsUpdate) -> Result<Settings> {
        let currency = update
            .currency
            .map(|c| c.trim().to_uppercase())
            .map(|c| {
                if is_currency_code(&c) {
                    Ok(c)
                } else {
                    Err(Error::invalid_input(format!(
                        "'{}' is not a three-letter currency code",
                        c
                    )))
                }
            })
            .transpose()?;

        if let Some(theme) = update.theme {
            self.settings_repository
                .set_setting(THEME_KEY.to_string(), theme.as_str().to_string())
                .await?;
        }
        if let Some(currency) = currency {
            self.settings_repository
                .set_setting(CURRENCY_KEY.to_string(), currency)
                .await?;
        }
        if let Some(enabled) = update.notifications_enabled {
            self.settings_repository
                .set_setting(NOTIFICATIONS_KEY.to_string(), enabled.to_string())
                .await?;
        }

        self.event_sink.emit(DomainEvent::SettingsChanged);
        self.get_settings()
    }

    fn session_user_id(&self) -> Result<Option<String>> {
        self.settings_repository.get_setting(SESSION_USER_KEY)
    }

    async fn set_session_user_id(&self, user_id: Option<String>) -> Result<()> {
        match user_id.clone() {
            Some(id) => {
                self.settings_repository
                    .set_setting(SESSION_USER_KEY.to_string(), id)
                    .await?
            }
            None => {
                self.settings_repository
                    .delete_setting(SESSION_USER_KEY.to_string())
                    .await?;
            }
        }
        self.event_sink.emit(DomainEvent::SessionChanged { user_id });
        Ok(())
    }
}
