// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 文案: 推荐理由、周计划说明、洗护提醒、即时推荐理由、画像提示
// 支持英文（默认）和中文; 语言由 config_kv 的 locale 键在启动时设置
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

use tracing::warn;

/// 缺省语言
pub const DEFAULT_LOCALE: &str = "en";
/// 已提供文案的语言
pub const SUPPORTED_LOCALES: [&str; 2] = ["en", "zh-CN"];

/// 设置文案语言
///
/// # 规则
/// - 语言代码不区分大小写（"zh-cn" → "zh-CN"）
/// - 未提供文案的语言告警后回退到 en
///
/// # 返回
/// 实际生效的语言
pub fn set_locale(locale: &str) -> &'static str {
    let requested = locale.trim();
    let resolved = match SUPPORTED_LOCALES
        .iter()
        .find(|l| l.eq_ignore_ascii_case(requested))
    {
        Some(l) => *l,
        None => {
            warn!(locale = requested, "不支持的语言，使用 en");
            DEFAULT_LOCALE
        }
    };
    rust_i18n::set_locale(resolved);
    resolved
}

/// 翻译消息（无参数）
///
/// # 示例
/// ```no_run
/// use wardrobe_planner::i18n::t;
/// let msg = t("reason.generic");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数）
///
/// # 示例
/// ```no_run
/// use wardrobe_planner::i18n::t_with_args;
/// let msg = t_with_args("plan.events_one", &[("title", "Team offsite")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // rust-i18n 的 locale 为全局状态，且 Rust 测试默认并行执行；
    // 为避免测试互相干扰，这里对 i18n 相关测试串行化。
    static LOCALE_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_set_locale_normalizes_and_falls_back() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        assert_eq!(set_locale("zh-cn"), "zh-CN");
        assert_eq!(&*rust_i18n::locale(), "zh-CN");

        assert_eq!(set_locale("fr"), "en");
        assert_eq!(&*rust_i18n::locale(), "en");

        assert_eq!(set_locale(" EN "), "en");
    }

    #[test]
    fn test_translate_simple() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("en");
        assert_eq!(t("reason.casual_day"), "a relaxed day with no events");

        set_locale("zh-CN");
        assert_eq!(t("reason.casual_day"), "今天没有日程安排，适合轻松穿搭");

        set_locale("en");
    }

    #[test]
    fn test_translate_with_args() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("en");
        let msg = t_with_args("plan.events_one", &[("title", "Board meeting")]);
        assert!(msg.contains("Board meeting"));
        assert!(!msg.contains("%{title}"));

        set_locale("zh-CN");
        let msg = t_with_args("plan.events_one", &[("title", "Board meeting")]);
        assert!(msg.contains("Board meeting"));

        set_locale("en");
    }

    #[test]
    fn test_placeholders_consistent_across_locales() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        let keys = [
            ("laundry.needs_washing", ["name", "day", "worn", "max"].as_slice()),
            ("laundry.at_cleaners", ["name", "day"].as_slice()),
            ("laundry.drying_time", ["name", "status", "day"].as_slice()),
            ("laundry.approaching", ["name", "day", "remaining"].as_slice()),
            ("recommendation.season", ["season"].as_slice()),
            ("recommendation.because", ["reasons"].as_slice()),
            ("reason.matches_events", ["events"].as_slice()),
            ("reason.template", ["reasons"].as_slice()),
            ("plan.events_one", ["title"].as_slice()),
            ("plan.events_many", ["count"].as_slice()),
            ("plan.reasoning", ["weather", "events"].as_slice()),
            ("outfit.generated_name", ["index"].as_slice()),
        ];
        for locale in ["en", "zh-CN"] {
            set_locale(locale);
            for (key, names) in keys {
                let raw = t(key);
                for name in names {
                    assert!(
                        raw.contains(&format!("%{{{}}}", name)),
                        "{} {} missing %{{{}}}",
                        locale,
                        key,
                        name
                    );
                }
            }
        }
        set_locale("en");
    }
}
