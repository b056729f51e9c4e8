//! Routes each inbound chat event to exactly one action.

use crate::core::error::DispatchError;
use crate::core::intake::{self, DialogueState, IntakeFlow};
use crate::core::menu::{
    self, ABOUT_TEXT, CASES_TEXT, Command, DIRECTOR_CAPTION, MAIN_MENU_TEXT, MenuAction,
    NO_ACCESS_TEXT, PHONE_TEXT,
};
use crate::core::reply::{OutboundAction, QuickReplies};
use crate::core::statistics::StatisticsReport;
use crate::core::templates;
use crate::core::traits::{Assistant, Messenger};
use crate::infrastructure::entities::{ActionKind, UserSummary};
use crate::infrastructure::settings::Settings;
use crate::infrastructure::traits::EventStore;
use dashmap::DashMap;
use di::{Ref, inject, injectable};
use log::{error, info, warn};
use minijinja::Environment;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A text message as delivered by the chat transport.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub chat_id: i64,
    pub sender: UserSummary,
    pub text: String,
}

/// Where an inbound text goes, given the chat's dialogue state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Command(Command),
    Intake,
    Menu(MenuAction),
    Question,
}

impl Route {
    /// Commands win in any state; otherwise a pending intake takes the text unmatched.
    pub fn resolve(state: DialogueState, text: &str) -> Route {
        if let Some(command) = Command::parse(text) {
            return Route::Command(command);
        }
        if state == DialogueState::AwaitingPhone {
            return Route::Intake;
        }
        match MenuAction::from_label(text) {
            Some(action) => Route::Menu(action),
            None => Route::Question,
        }
    }
}

pub struct Dispatcher {
    store: Ref<dyn EventStore>,
    assistant: Ref<dyn Assistant>,
    messenger: Ref<dyn Messenger>,
    intake: IntakeFlow,
    operator_id: i64,
    director_photo: PathBuf,
    templates: Arc<Environment<'static>>,
    // Only chats with an event in flight or an intake in progress have an entry.
    dialogues: DashMap<i64, Arc<Mutex<DialogueState>>>,
}

#[injectable]
impl Dispatcher {
    #[inject]
    pub fn create(
        settings: Ref<Settings>,
        store: Ref<dyn EventStore>,
        assistant: Ref<dyn Assistant>,
        messenger: Ref<dyn Messenger>,
    ) -> Dispatcher {
        Dispatcher::new(&settings, store, assistant, messenger)
    }
}

impl Dispatcher {
    pub fn new(
        settings: &Settings,
        store: Ref<dyn EventStore>,
        assistant: Ref<dyn Assistant>,
        messenger: Ref<dyn Messenger>,
    ) -> Dispatcher {
        let templates = Arc::new(templates::environment().unwrap_or_else(|e| {
            error!("built-in templates failed to load: {e}");
            Environment::new()
        }));

        Dispatcher {
            intake: IntakeFlow::new(
                store.clone(),
                messenger.clone(),
                settings.operator_id,
                templates.clone(),
            ),
            store,
            assistant,
            messenger,
            operator_id: settings.operator_id,
            director_photo: settings.director_photo.clone(),
            templates,
            dialogues: DashMap::new(),
        }
    }

    fn dialogue(&self, chat_id: i64) -> Arc<Mutex<DialogueState>> {
        self.dialogues.entry(chat_id).or_default().clone()
    }

    /// Current dialogue state of a chat, waiting for any event in flight.
    pub async fn dialogue_state(&self, chat_id: i64) -> DialogueState {
        let slot = self.dialogues.get(&chat_id).map(|slot| slot.value().clone());
        match slot {
            Some(slot) => *slot.lock().await,
            None => DialogueState::Idle,
        }
    }

    /// Number of chats currently holding dialogue state.
    pub fn tracked_chats(&self) -> usize {
        self.dialogues.len()
    }

    /// Handles one event: user upsert, then exactly one routed action.
    pub async fn handle(&self, event: &InboundEvent) -> Result<OutboundAction, DispatchError> {
        let slot = self.dialogue(event.chat_id);
        let result = {
            // Per-chat lock, held across the AI call too; other chats never wait on it.
            let mut state = slot.lock().await;
            self.route(event, &mut state).await
        };
        drop(slot);

        self.release_if_idle(event.chat_id);
        result
    }

    /// Drops the chat's entry once it is idle and no other event holds it.
    fn release_if_idle(&self, chat_id: i64) {
        self.dialogues.remove_if(&chat_id, |_, slot| {
            Arc::strong_count(slot) == 1
                && slot
                    .try_lock()
                    .is_ok_and(|state| *state == DialogueState::Idle)
        });
    }

    async fn route(
        &self,
        event: &InboundEvent,
        state: &mut DialogueState,
    ) -> Result<OutboundAction, DispatchError> {
        self.store.upsert_user(&event.sender).await?;

        let identity = event.sender.identity;
        match Route::resolve(*state, &event.text) {
            Route::Command(Command::Start) => {
                *state = DialogueState::Idle;
                self.store.append_action(identity, ActionKind::Start).await?;
                Ok(OutboundAction::text(menu::greeting(&event.sender.given_name))
                    .with_quick_replies(QuickReplies::MainMenu))
            }
            Route::Command(Command::Stats) => self.statistics(identity).await,
            Route::Intake => {
                let (next, reply) = self.intake.advance(&event.sender, &event.text).await?;
                *state = next;
                Ok(reply)
            }
            Route::Menu(action) => self.menu(action, identity, state).await,
            Route::Question => self.question(event).await,
        }
    }

    async fn menu(
        &self,
        action: MenuAction,
        identity: i64,
        state: &mut DialogueState,
    ) -> Result<OutboundAction, DispatchError> {
        if let Some(kind) = action.action_kind() {
            self.store.append_action(identity, kind).await?;
        }

        Ok(match action {
            MenuAction::About => OutboundAction::markdown(ABOUT_TEXT),
            MenuAction::Cases => {
                OutboundAction::markdown(CASES_TEXT).with_quick_replies(QuickReplies::IntakeOffer)
            }
            MenuAction::Director => {
                OutboundAction::photo(self.director_photo.clone(), DIRECTOR_CAPTION)
            }
            MenuAction::PhoneNumber => OutboundAction::markdown(PHONE_TEXT),
            MenuAction::BackToMenu => {
                OutboundAction::text(MAIN_MENU_TEXT).with_quick_replies(QuickReplies::MainMenu)
            }
            MenuAction::StartIntake => {
                let (next, reply) = intake::start();
                *state = next;
                reply
            }
        })
    }

    async fn statistics(&self, identity: i64) -> Result<OutboundAction, DispatchError> {
        if identity != self.operator_id {
            info!("statistics denied for {identity}");
            return Ok(OutboundAction::text(NO_ACCESS_TEXT));
        }

        self.store
            .append_action(identity, ActionKind::ViewStatistics)
            .await?;
        let report = StatisticsReport::from(self.store.statistics().await?);

        Ok(OutboundAction::markdown(report.render_chat(&self.templates)?))
    }

    async fn question(&self, event: &InboundEvent) -> Result<OutboundAction, DispatchError> {
        self.store
            .append_action(event.sender.identity, ActionKind::AiQuestion)
            .await?;

        if let Err(e) = self.messenger.show_typing(event.chat_id).await {
            warn!("typing indicator failed for chat {}: {e}", event.chat_id);
        }

        let answer = self.assistant.answer(&event.text).await;
        Ok(OutboundAction::markdown(menu::ai_reply(&answer)))
    }
}
