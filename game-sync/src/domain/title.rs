use chrono::NaiveDate;

/// Template used when the mapping record does not define one.
pub const DEFAULT_TITLE_TEMPLATE: &str = " %game% %date%";

const DATE_TOKEN: &str = "%date%";
const GAME_TOKEN: &str = "%game%";

/// Render a channel title.
///
/// Every `%date%` becomes `now` as `YYYY-MM-DD`, then every `%game%` becomes
/// `game`. Other `%` sequences are left alone.
pub fn format_title(template: &str, game: &str, now: NaiveDate) -> String {
    let date = now.format("%Y-%m-%d").to_string();
    template.replace(DATE_TOKEN, &date).replace(GAME_TOKEN, game)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_format_title() {
        assert_eq!(
            format_title("%game% on %date%", "Chess", date(2024, 1, 5)),
            "Chess on 2024-01-05"
        );
    }

    #[test]
    fn test_template_without_placeholders_is_unchanged() {
        let template = "Chill stream | 100% vibes";
        assert_eq!(format_title(template, "Chess", date(2024, 1, 5)), template);
    }

    #[test]
    fn test_repeated_placeholders() {
        assert_eq!(
            format_title("%game%|%game%|%date%|%date%", "Go", date(2023, 12, 31)),
            "Go|Go|2023-12-31|2023-12-31"
        );
    }

    #[test]
    fn test_game_is_inserted_verbatim() {
        // A game label that looks like a token is not expanded again.
        assert_eq!(
            format_title("[%game%]", "%date% 100%", date(2024, 1, 5)),
            "[%date% 100%]"
        );
    }

    #[test]
    fn test_default_template() {
        assert_eq!(
            format_title(DEFAULT_TITLE_TEMPLATE, "Just Chatting", date(2024, 2, 29)),
            " Just Chatting 2024-02-29"
        );
    }
}
