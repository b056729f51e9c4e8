//! Intake flow: collects a phone number, stores it and tells the operator.
//!
//! ```text
//! Idle --start--> AwaitingPhone --cancel--------> Idle
//!                 AwaitingPhone --invalid-------> AwaitingPhone
//!                 AwaitingPhone --valid phone---> Idle (+ intake record, operator notified)
//! ```

use crate::core::menu::LABEL_CANCEL;
use crate::core::reply::{OutboundAction, QuickReplies};
use crate::core::templates;
use crate::core::traits::Messenger;
use crate::infrastructure::entities::{ActionKind, UserSummary};
use crate::infrastructure::traits::{EventStore, StoreError};
use di::Ref;
use log::{error, warn};
use minijinja::{Environment, context};
use std::sync::Arc;

pub const MIN_PHONE_LENGTH: usize = 11;

pub const INTAKE_PROMPT: &str = "📞 *Оставить заявку*\n\n\
Отлично! Чтобы мы могли с вами связаться, \
пожалуйста, отправьте ваш номер телефона.\n\n\
Формат: +7XXXXXXXXXX или 8XXXXXXXXXX\n\n\
Или нажмите \"Отмена\" для возврата в меню.";

pub const INVALID_PHONE_TEXT: &str = "❌ Неверный формат номера телефона.\n\n\
Пожалуйста, введите номер в формате:\n\
+7XXXXXXXXXX или 8XXXXXXXXXX";

pub const CANCELLED_TEXT: &str = "Заявка отменена. Возвращаю вас в главное меню.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DialogueState {
    #[default]
    Idle,
    AwaitingPhone,
}

/// Keeps digits, plus a `+` if it is the first character kept.
pub fn normalize_phone(text: &str) -> String {
    let mut phone = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_digit() || (c == '+' && phone.is_empty()) {
            phone.push(c);
        }
    }
    phone
}

/// Syntactic check only: at least 11 characters after normalizing, starting with `+7`, `8` or `7`.
///
/// Returns the normalized number when it passes.
pub fn validate_phone(text: &str) -> Option<String> {
    let phone = normalize_phone(text);
    let prefix_ok = ["+7", "8", "7"].iter().any(|p| phone.starts_with(p));

    (phone.chars().count() >= MIN_PHONE_LENGTH && prefix_ok).then_some(phone)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhoneInput {
    Cancel,
    Invalid,
    Valid(String),
}

impl PhoneInput {
    pub fn classify(text: &str) -> PhoneInput {
        if text == LABEL_CANCEL {
            return PhoneInput::Cancel;
        }
        match validate_phone(text) {
            Some(phone) => PhoneInput::Valid(phone),
            None => PhoneInput::Invalid,
        }
    }
}

/// `Idle -> AwaitingPhone`: ask for the number, offer only "cancel".
pub fn start() -> (DialogueState, OutboundAction) {
    (
        DialogueState::AwaitingPhone,
        OutboundAction::markdown(INTAKE_PROMPT).with_quick_replies(QuickReplies::CancelOnly),
    )
}

pub fn thank_you(phone: &str) -> String {
    format!(
        "✅ *Спасибо за вашу заявку!*\n\n\
         Мы получили ваш номер телефона: {phone}\n\n\
         Наш менеджер свяжется с вами в ближайшее время.\n\
         Обычно это занимает не более 15 минут! 🚀"
    )
}

pub struct IntakeFlow {
    store: Ref<dyn EventStore>,
    messenger: Ref<dyn Messenger>,
    operator_id: i64,
    templates: Arc<Environment<'static>>,
}

impl IntakeFlow {
    pub fn new(
        store: Ref<dyn EventStore>,
        messenger: Ref<dyn Messenger>,
        operator_id: i64,
        templates: Arc<Environment<'static>>,
    ) -> Self {
        Self {
            store,
            messenger,
            operator_id,
            templates,
        }
    }

    /// One step from `AwaitingPhone`.
    pub async fn advance(
        &self,
        user: &UserSummary,
        text: &str,
    ) -> Result<(DialogueState, OutboundAction), StoreError> {
        match PhoneInput::classify(text) {
            PhoneInput::Cancel => Ok((
                DialogueState::Idle,
                OutboundAction::text(CANCELLED_TEXT).with_quick_replies(QuickReplies::MainMenu),
            )),
            PhoneInput::Invalid => Ok((
                DialogueState::AwaitingPhone,
                OutboundAction::text(INVALID_PHONE_TEXT),
            )),
            PhoneInput::Valid(phone) => {
                self.store.append_intake(user.identity, &phone).await?;
                self.store
                    .append_action(user.identity, ActionKind::ApplicationSubmitted)
                    .await?;

                self.notify_operator(user.identity, &phone).await;

                Ok((
                    DialogueState::Idle,
                    OutboundAction::markdown(thank_you(&phone))
                        .with_quick_replies(QuickReplies::MainMenu),
                ))
            }
        }
    }

    /// Best effort: every failure is logged and swallowed.
    async fn notify_operator(&self, identity: i64, phone: &str) {
        let summary = match self.store.user_summary(identity).await {
            Ok(Some(summary)) => summary,
            Ok(None) => {
                warn!("intake from unknown user {identity}, operator not notified");
                return;
            }
            Err(e) => {
                error!("failed to look up user {identity} for notification: {e}");
                return;
            }
        };

        let text = self
            .templates
            .get_template(templates::OPERATOR_NOTIFICATION)
            .and_then(|t| {
                t.render(context! {
                    full_name => summary.full_name(),
                    handle => summary.handle_label(),
                    identity => identity,
                    phone => phone,
                })
            });

        let text = match text {
            Ok(text) => text,
            Err(e) => {
                error!("failed to render operator notification: {e}");
                return;
            }
        };

        if let Err(e) = self.messenger.push(self.operator_id, &text).await {
            error!("failed to notify operator about intake from {identity}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_phones() {
        assert_eq!(validate_phone("+79161234567").as_deref(), Some("+79161234567"));
        assert_eq!(validate_phone("89161234567").as_deref(), Some("89161234567"));
        assert_eq!(validate_phone("79161234567").as_deref(), Some("79161234567"));
        assert_eq!(
            validate_phone("+7 (916) 123-45-67").as_deref(),
            Some("+79161234567")
        );
    }

    #[test]
    fn test_invalid_phones() {
        assert_eq!(validate_phone("123"), None);
        assert_eq!(validate_phone("+3312345678"), None);
        assert_eq!(validate_phone(""), None);
        assert_eq!(validate_phone("99161234567"), None);
        assert_eq!(validate_phone("8916123456"), None);
    }

    #[test]
    fn test_long_numbers_stay_accepted() {
        assert!(validate_phone("+79999999999999999").is_some());
    }

    #[test]
    fn test_only_leading_plus_is_kept() {
        assert_eq!(normalize_phone("8+916+1234567"), "89161234567");
        assert_eq!(normalize_phone(" +7-916"), "+7916");
        assert_eq!(normalize_phone("tel: +7 916"), "+7916");
    }

    #[test]
    fn test_classify() {
        assert_eq!(PhoneInput::classify(LABEL_CANCEL), PhoneInput::Cancel);
        assert_eq!(PhoneInput::classify("Отмена"), PhoneInput::Invalid);
        assert_eq!(
            PhoneInput::classify("89161234567"),
            PhoneInput::Valid("89161234567".to_owned())
        );
    }

    #[test]
    fn test_start_awaits_phone_with_cancel_only() {
        let (state, reply) = start();
        assert_eq!(state, DialogueState::AwaitingPhone);
        assert_eq!(reply.quick_replies, Some(QuickReplies::CancelOnly));
        assert!(QuickReplies::CancelOnly.contains(LABEL_CANCEL));
    }

    #[test]
    fn test_thank_you_mentions_phone() {
        assert!(thank_you("89161234567").contains("номер телефона: 89161234567"));
    }
}
