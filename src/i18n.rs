// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持英文（默认）和中文
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"en" 或 "zh-CN"）
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// 翻译消息（无参数）
///
/// # 示例
/// ```no_run
/// use academy_console::i18n::t;
/// let msg = t("import.no_rows_selected");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数）
///
/// # 示例
/// ```no_run
/// use academy_console::i18n::t_with_args;
/// let msg = t_with_args("import.rows_missing_required", &[("count", "2")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

// rust-i18n 的 locale 为全局状态，且 Rust 测试默认并行执行；
// 断言具体文案的测试需持有该锁。
#[cfg(test)]
pub(crate) static LOCALE_TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
pub(crate) fn lock_locale() -> std::sync::MutexGuard<'static, ()> {
    LOCALE_TEST_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_locale() {
        let _guard = lock_locale();
        set_locale("zh-CN");
        assert_eq!(current_locale(), "zh-CN");

        set_locale("en");
        assert_eq!(current_locale(), "en");
    }

    #[test]
    fn test_translate_simple() {
        let _guard = lock_locale();
        set_locale("en");
        assert_eq!(t("export.no_participants"), "No participants to export.");

        set_locale("zh-CN");
        assert_eq!(t("export.no_participants"), "没有可导出的学员。");

        // 恢复默认语言
        set_locale("en");
    }

    #[test]
    fn test_message_keys_translated_in_both_locales() {
        let _guard = lock_locale();
        let keys = [
            "import.no_rows_selected",
            "import.rows_missing_required",
            "import.preview_failed",
            "import.confirm_failed",
            "api.session_expired",
            "api.request_failed",
            "export.no_participants",
            "export.failed",
        ];
        for locale in ["en", "zh-CN"] {
            set_locale(locale);
            for key in keys {
                let message = t(key);
                assert!(!message.is_empty());
                assert!(!message.ends_with(key), "{locale} is missing {key}");
            }
        }
        set_locale("en");
    }

    #[test]
    fn test_translate_with_args() {
        let _guard = lock_locale();
        set_locale("en");
        let msg = t_with_args("import.rows_missing_required", &[("count", "3")]);
        assert_eq!(msg, "3 selected row(s) missing required fields");

        set_locale("zh-CN");
        let msg = t_with_args("import.rows_missing_required", &[("count", "3")]);
        assert!(msg.contains('3'));
        assert!(msg.contains("必填"));

        // 恢复默认语言
        set_locale("en");
    }
}
