// src/notify/render.rs
//! Alert message rendering. Deterministic given a match; no delivery logic.

use crate::ingest::normalize;
use crate::ingest::types::NewsMatch;
use chrono::{DateTime, Utc};

const TITLE_MAX_CHARS: usize = 80;
const KEYWORDS_SHOWN: usize = 3;
const ERROR_NOTICE_MAX_CHARS: usize = 100;

pub const STARTUP_MESSAGE: &str = "🤖 Monitor de noticias Ecuador iniciado correctamente ✅";

/// Category emoji for a match, decided on the folded keyword set.
/// First hit wins: institution, then companies, then mining, then
/// indigenous/ancestral territory, else the generic marker.
pub fn category_emoji(keywords: &[String]) -> &'static str {
    let folded = normalize(&keywords.join(" "));
    if folded.contains("conaie") {
        "🏛️"
    } else if ["solgold", "dundee", "pluspetrol"]
        .iter()
        .any(|c| folded.contains(c))
    {
        "💰"
    } else if folded.contains("mineria") || folded.contains("minera") {
        "⛏️"
    } else if folded.contains("indigenas") || folded.contains("ancestral") {
        "🌿"
    } else {
        "📢"
    }
}

/// Cap long headlines at 80 chars (77 + ellipsis).
pub fn truncate_title(title: &str) -> String {
    if title.chars().count() > TITLE_MAX_CHARS {
        let head: String = title.chars().take(TITLE_MAX_CHARS - 3).collect();
        format!("{head}...")
    } else {
        title.to_string()
    }
}

/// Pretty-print RFC 2822 feed dates as UTC; anything else passes through.
pub fn format_pub_date(raw: &str) -> String {
    match DateTime::parse_from_rfc2822(raw) {
        Ok(dt) => dt.with_timezone(&Utc).format("%Y-%m-%d %H:%M UTC").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Markdown alert body for the Telegram `parse_mode: Markdown` send.
pub fn render_markdown(m: &NewsMatch) -> String {
    let emoji = category_emoji(&m.keywords);
    let title = truncate_title(&m.title);
    let shown: Vec<&str> = m
        .keywords
        .iter()
        .take(KEYWORDS_SHOWN)
        .map(String::as_str)
        .collect();
    let tag = m
        .keywords
        .first()
        .map(|k| k.replace(' ', ""))
        .unwrap_or_default();

    format!(
        "{emoji} *NUEVA NOTICIA DETECTADA*\n\
         \n\
         📰 *{title}*\n\
         \n\
         🔗 [Leer completa]({url})\n\
         \n\
         🏷️ *Keywords:* {keywords}\n\
         📅 *Fecha:* {date}\n\
         📋 *Fuente:* {source}\n\
         \n\
         #Ecuador #Noticias #{tag}",
        url = m.url,
        keywords = shown.join(", "),
        date = format_pub_date(&m.published),
        source = m.source,
    )
}

/// Plain fallback used when the Markdown send is rejected.
pub fn render_plain(m: &NewsMatch) -> String {
    format!(
        "{emoji} NUEVA NOTICIA DETECTADA\n\
         \n\
         {title}\n\
         \n\
         Link: {url}\n\
         \n\
         Keywords: {keywords}\n\
         Fuente: {source}",
        emoji = category_emoji(&m.keywords),
        title = truncate_title(&m.title),
        url = m.url,
        keywords = m.keywords.join(", "),
        source = m.source,
    )
}

pub fn summary_message(count: usize) -> String {
    format!("📊 Resumen: {count} noticias nuevas procesadas")
}

/// Best-effort operator notice for a failed cycle; keeps the text short.
pub fn error_message(err: &str) -> String {
    let short: String = err.chars().take(ERROR_NOTICE_MAX_CHARS).collect();
    format!("⚠️ Error en monitor: {short}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::NO_DATE;

    fn sample(keywords: &[&str]) -> NewsMatch {
        NewsMatch {
            title: "CONAIE exige diálogo".into(),
            url: "http://a/1".into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            published: NO_DATE.into(),
            source: "📰 El Comercio".into(),
            id: "deadbeef".into(),
        }
    }

    #[test]
    fn emoji_priority_order() {
        assert_eq!(category_emoji(&["CONAIE".into()]), "🏛️");
        // institution outranks companies even when both matched
        assert_eq!(category_emoji(&["SOLGOLD".into(), "CONAIE".into()]), "🏛️");
        assert_eq!(category_emoji(&["SOLGOLD".into()]), "💰");
        assert_eq!(category_emoji(&["minería Ecuador".into()]), "⛏️");
        assert_eq!(category_emoji(&["concesión minera Ecuador".into()]), "⛏️");
        assert_eq!(category_emoji(&["territorio ancestral".into()]), "🌿");
        assert_eq!(category_emoji(&["otra cosa".into()]), "📢");
    }

    #[test]
    fn long_titles_are_truncated() {
        let long = "x".repeat(120);
        let cut = truncate_title(&long);
        assert_eq!(cut.chars().count(), 80);
        assert!(cut.ends_with("..."));

        let short = "titular corto";
        assert_eq!(truncate_title(short), short);
    }

    #[test]
    fn rfc2822_dates_render_as_utc() {
        assert_eq!(
            format_pub_date("Mon, 12 May 2025 10:30:00 GMT"),
            "2025-05-12 10:30 UTC"
        );
        assert_eq!(
            format_pub_date("Mon, 12 May 2025 10:30:00 -0500"),
            "2025-05-12 15:30 UTC"
        );
        // non-RFC2822 strings pass through untouched
        assert_eq!(format_pub_date("Sin fecha"), "Sin fecha");
        assert_eq!(format_pub_date("2025-05-12"), "2025-05-12");
    }

    #[test]
    fn markdown_body_carries_all_fields() {
        let m = sample(&["CONAIE", "minería Ecuador"]);
        let body = render_markdown(&m);
        assert!(body.starts_with("🏛️ *NUEVA NOTICIA DETECTADA*"));
        assert!(body.contains("*CONAIE exige diálogo*"));
        assert!(body.contains("[Leer completa](http://a/1)"));
        assert!(body.contains("*Keywords:* CONAIE, minería Ecuador"));
        assert!(body.contains("*Fecha:* Sin fecha"));
        assert!(body.contains("*Fuente:* 📰 El Comercio"));
        assert!(body.ends_with("#Ecuador #Noticias #CONAIE"));
    }

    #[test]
    fn markdown_caps_keywords_at_three() {
        let m = sample(&["a b", "c", "d", "e"]);
        let body = render_markdown(&m);
        assert!(body.contains("*Keywords:* a b, c, d\n"));
        // hashtag uses the first keyword with spaces removed
        assert!(body.ends_with("#Ecuador #Noticias #ab"));
    }

    #[test]
    fn plain_body_lists_every_keyword_without_markup() {
        let m = sample(&["a", "b", "c", "d"]);
        let body = render_plain(&m);
        assert!(!body.contains('*'));
        assert!(!body.contains('['));
        assert!(body.contains("Keywords: a, b, c, d"));
    }

    #[test]
    fn service_messages() {
        assert_eq!(
            summary_message(5),
            "📊 Resumen: 5 noticias nuevas procesadas"
        );
        let long_err = "e".repeat(300);
        let notice = error_message(&long_err);
        assert!(notice.chars().count() <= 100 + "⚠️ Error en monitor: ".chars().count());
    }
}
