//! Templates for the replies that carry data.

use crate::core::reply::escape_markdown;
use minijinja::Environment;

pub const STATISTICS_CHAT: &str = "statistics_chat.md";
pub const STATISTICS_CONSOLE: &str = "statistics_console.txt";
pub const OPERATOR_NOTIFICATION: &str = "operator_notification.md";

const STATISTICS_CHAT_SOURCE: &str = r#"📊 *СТАТИСТИКА БОТА*

👥 Всего пользователей: *{{ total_users }}*

{% if actions %}
📈 *Действия:*
{% for action in actions %}
  • {{ action.name | md }}: {{ action.count }} ({{ action.percentage }}%)
{% endfor %}

✅ Всего действий: *{{ total_actions }}*

{% endif %}
{% if top_users %}
🏆 *ТОП-5 пользователей:*
{% for user in top_users %}
{{ loop.index }}. {{ user.name | md }} ({{ user.handle | md }}) - {{ user.count }} действий
{% endfor %}
{% endif %}"#;

const STATISTICS_CONSOLE_SOURCE: &str = r#"
============================================================
📊 СТАТИСТИКА TELEGRAM-БОТА
============================================================

👥 Всего пользователей: {{ total_users }}

📈 Статистика действий:
------------------------------------------------------------
{% if actions %}
{% for action in actions %}
  {{ action.name }}: {{ action.count }} раз ({{ action.percentage }}%)
{% endfor %}

  ✅ Всего действий: {{ total_actions }}
{% else %}
  Пока нет записанных действий
{% endif %}

🏆 ТОП-10 активных пользователей:
------------------------------------------------------------
{% if top_users %}
{% for user in top_users %}
  {{ loop.index }}. {{ user.name }} ({{ user.handle }})
     ID: {{ user.identity }}, Действий: {{ user.count }}
{% endfor %}
{% else %}
  Пока нет пользователей
{% endif %}

============================================================
📅 Отчет сформирован: {{ generated_at }}
============================================================
"#;

const OPERATOR_NOTIFICATION_SOURCE: &str = r#"🔔 *НОВАЯ ЗАЯВКА!*

👤 Клиент: {{ full_name | md }}
🆔 Username: {{ handle | md }}
🆔 User ID: {{ identity }}
📞 Телефон: `{{ phone }}`

Свяжитесь с клиентом как можно скорее!"#;

/// Environment with every built-in template registered.
pub fn environment() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.add_filter("md", escape_markdown);
    env.add_template(STATISTICS_CHAT, STATISTICS_CHAT_SOURCE)?;
    env.add_template(STATISTICS_CONSOLE, STATISTICS_CONSOLE_SOURCE)?;
    env.add_template(OPERATOR_NOTIFICATION, OPERATOR_NOTIFICATION_SOURCE)?;
    Ok(env)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_templates_compile() {
        let env = environment().unwrap();
        for name in [STATISTICS_CHAT, STATISTICS_CONSOLE, OPERATOR_NOTIFICATION] {
            assert!(env.get_template(name).is_ok(), "{name} missing");
        }
    }

    #[test]
    fn test_notification_escapes_user_fields() {
        let env = environment().unwrap();
        let text = env
            .get_template(OPERATOR_NOTIFICATION)
            .unwrap()
            .render(minijinja::context! {
                full_name => "John *Doe",
                handle => "@john_doe",
                identity => 42,
                phone => "+79161234567",
            })
            .unwrap();

        assert!(text.contains("Клиент: John \\*Doe"));
        assert!(text.contains("Username: @john\\_doe"));
        assert!(text.contains("`+79161234567`"));
    }
}
