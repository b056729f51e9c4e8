//! Menu vocabulary, commands and the static replies behind them.

use crate::infrastructure::entities::ActionKind;

pub const LABEL_ABOUT: &str = "О нас";
pub const LABEL_CASES: &str = "Кейсы";
pub const LABEL_DIRECTOR: &str = "👤 Руководитель";
pub const LABEL_PHONE: &str = "📞 Номер телефона";
pub const LABEL_BACK: &str = "⬅️ Назад в меню";
pub const LABEL_START_INTAKE: &str = "📞 Оставить заявку";
pub const LABEL_CANCEL: &str = "❌ Отмена";

/// A button of the fixed menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    About,
    Cases,
    Director,
    PhoneNumber,
    BackToMenu,
    StartIntake,
}

impl MenuAction {
    pub const ALL: [MenuAction; 6] = [
        MenuAction::About,
        MenuAction::Cases,
        MenuAction::Director,
        MenuAction::PhoneNumber,
        MenuAction::BackToMenu,
        MenuAction::StartIntake,
    ];

    /// Exact, case-sensitive label match.
    pub fn from_label(text: &str) -> Option<MenuAction> {
        match text {
            LABEL_ABOUT => Some(MenuAction::About),
            LABEL_CASES => Some(MenuAction::Cases),
            LABEL_DIRECTOR => Some(MenuAction::Director),
            LABEL_PHONE => Some(MenuAction::PhoneNumber),
            LABEL_BACK => Some(MenuAction::BackToMenu),
            LABEL_START_INTAKE => Some(MenuAction::StartIntake),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MenuAction::About => LABEL_ABOUT,
            MenuAction::Cases => LABEL_CASES,
            MenuAction::Director => LABEL_DIRECTOR,
            MenuAction::PhoneNumber => LABEL_PHONE,
            MenuAction::BackToMenu => LABEL_BACK,
            MenuAction::StartIntake => LABEL_START_INTAKE,
        }
    }

    /// The action logged for this button. Going back to the menu is not logged.
    pub fn action_kind(&self) -> Option<ActionKind> {
        match self {
            MenuAction::About => Some(ActionKind::ButtonAbout),
            MenuAction::Cases => Some(ActionKind::ButtonCases),
            MenuAction::Director => Some(ActionKind::ButtonDirector),
            MenuAction::PhoneNumber => Some(ActionKind::ButtonPhone),
            MenuAction::BackToMenu => None,
            MenuAction::StartIntake => Some(ActionKind::StartApplication),
        }
    }
}

/// Slash commands, recognized in any dialogue state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stats,
}

impl Command {
    /// Accepts `/start`, `/start@SomeBot` and trailing arguments.
    pub fn parse(text: &str) -> Option<Command> {
        let word = text.split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split_once('@').map_or(name, |(name, _)| name);

        match name {
            "start" => Some(Command::Start),
            "stats" => Some(Command::Stats),
            _ => None,
        }
    }
}

/// True for `/command@name` when `name` is some other bot. Such messages are not for us.
pub fn addressed_elsewhere(text: &str, own_username: &str) -> bool {
    let Some(command) = text.split_whitespace().next().and_then(|w| w.strip_prefix('/')) else {
        return false;
    };

    match command.split_once('@') {
        Some((_, bot)) => !bot.eq_ignore_ascii_case(own_username),
        None => false,
    }
}

pub const ABOUT_TEXT: &str = "📌 *О нас*\n\n\
Мы - команда профессионалов, которая занимается разработкой \
инновационных решений для вашего бизнеса.\n\n\
Наша миссия - делать мир лучше с помощью технологий!";

pub const CASES_TEXT: &str = "💼 *Наши кейсы*\n\n\
1 Разработка мобильного приложения для доставки\n\
2 Создание CRM-системы для автоматизации продаж\n\
3 Внедрение AI-чатбота для службы поддержки\n\n\
Более 100 успешных проектов реализовано!\n\n\
🎁 *Хотите получить наш продукт?*\n\
Оставьте заявку, и мы свяжемся с вами!";

pub const DIRECTOR_CAPTION: &str = "👤 *Наш руководитель*\n\n\
*Иван Иванов*\n\
Генеральный директор\n\n\
• 15+ лет опыта в IT-индустрии\n\
• Управляет командой из 50+ специалистов\n\
• Реализовал более 200 успешных проектов\n\n\
_\"Наша цель - создавать решения, которые меняют бизнес к лучшему!\"_";

pub const PHOTO_UNAVAILABLE_NOTE: &str = "⚠️ _Фото временно недоступно_";

pub const PHONE_TEXT: &str = "📞 *Наш контактный номер телефона:*\n\n\
`88005553535351312`\n\n\
Звоните в любое время! Мы работаем 24/7 🕐";

pub const MAIN_MENU_TEXT: &str = "Главное меню:";

pub const NO_ACCESS_TEXT: &str = "У вас нет доступа к этой команде.";

pub fn greeting(given_name: &str) -> String {
    format!("Привет, {given_name}! 👋\n\nЯ бот-помощник. Выберите интересующий раздел:")
}

pub fn ai_reply(answer: &str) -> String {
    format!("🤖 *Grok AI отвечает:*\n\n{answer}")
}
