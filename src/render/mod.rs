use crate::digest::{Digest, DigestEntry, DigestItem, SUMMARY_TITLE};
use crate::types::DATE_FORMAT;
use chrono::NaiveDate;
use std::fmt::Write;

const UNKNOWN_DATE: &str = "Unknown Date";

const STYLE: &str = r#"
        body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; background-color: #f8f9fa; padding: 20px; }
        .container { background-color: white; border-radius: 12px; box-shadow: 0 4px 6px rgba(0, 0, 0, 0.1); overflow: hidden; }
        .header { background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; padding: 30px 20px; text-align: center; }
        .header h1 { margin: 0; font-size: 24px; font-weight: 600; }
        .header .subtitle { margin: 8px 0 0 0; opacity: 0.9; font-size: 16px; }
        .content { padding: 30px 20px; }
        .prayer-card { background: #f8f9fa; border-left: 4px solid #667eea; padding: 20px; margin: 20px 0; border-radius: 8px; }
        .prayer-type { font-weight: 600; color: #667eea; text-transform: uppercase; font-size: 14px; letter-spacing: 0.5px; }
        .prayer-date { color: #666; font-size: 14px; margin-bottom: 10px; }
        .prayer-text { font-size: 16px; line-height: 1.6; margin: 10px 0; }
        .prayer-journal { background: #fff; border-left: 3px solid #764ba2; padding: 15px; margin: 15px 0; font-style: italic; color: #555; }
        .pray-for { background: #e8f4fd; padding: 10px 15px; border-radius: 6px; margin: 10px 0; font-weight: 500; color: #2c5282; }
        .summary-section { background: linear-gradient(135deg, #f093fb 0%, #f5576c 100%); color: white; padding: 20px; margin: 20px 0; border-radius: 8px; }
        .summary-section h3 { margin: 0 0 15px 0; font-size: 18px; }
        .summary-item { background: rgba(255, 255, 255, 0.1); padding: 15px; margin: 10px 0; border-radius: 6px; }
        .summary-item .date { color: #ffed4e; font-size: 12px; font-weight: 600; text-transform: uppercase; }
        .summary-item .prayer-type { color: #ffed4e; font-size: 12px; margin-left: 10px; }
        .footer { background: #f8f9fa; padding: 20px; text-align: center; color: #666; font-size: 14px; }
        .verse { background: #667eea; color: white; padding: 20px; border-radius: 8px; margin: 20px 0; text-align: center; }
        .verse blockquote { font-style: italic; font-size: 16px; margin: 0 0 10px 0; }
        .verse cite { font-size: 14px; opacity: 0.9; }
"#;

/// Renders a digest as a self-contained HTML email.
pub fn render_email_html(digest: &Digest, subject: &str) -> String {
    let subject = escape_html(subject);
    let mut html = String::with_capacity(4096);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("    <meta charset=\"UTF-8\">\n");
    html.push_str(
        "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
    );
    let _ = writeln!(html, "    <title>{}</title>", subject);
    let _ = writeln!(html, "    <style>{}    </style>", STYLE);
    html.push_str("</head>\n<body>\n    <div class=\"container\">\n");
    html.push_str("        <div class=\"header\">\n            <h1>🙏 Prayer App</h1>\n");
    let _ = writeln!(html, "            <div class=\"subtitle\">{}</div>", subject);
    html.push_str("        </div>\n        <div class=\"content\">\n");

    for entry in &digest.entries {
        html.push_str(&render_entry(entry));
    }

    html.push_str(
        r#"            <div class="verse">
                <blockquote>"Pray without ceasing"</blockquote>
                <cite>1 Thessalonians 5:17</cite>
            </div>
        </div>
        <div class="footer">
            <p>Sent with ❤️ from your Prayer App</p>
            <p>This email helps you stay connected to your spiritual journey.</p>
        </div>
    </div>
</body>
</html>
"#,
    );
    html
}

/// One HTML fragment per digest entry.
pub fn render_entry(entry: &DigestEntry) -> String {
    match entry {
        DigestEntry::SummaryHeader => format!(
            "            <div class=\"summary-section\">\n                <h3>📚 {}</h3>\n                <p>Here are all your active prayers and praises:</p>\n            </div>\n",
            SUMMARY_TITLE
        ),
        DigestEntry::SummaryItem(item) => {
            let mut out = String::from("            <div class=\"summary-item\">\n");
            let _ = writeln!(
                out,
                "                <div class=\"date\">{}</div>",
                display_date(&item.date)
            );
            let _ = writeln!(
                out,
                "                <div class=\"prayer-type\">{}</div>",
                kind_label(item)
            );
            let _ = writeln!(
                out,
                "                <div class=\"prayer-text\">{}</div>",
                escape_html(&item.text)
            );
            push_details(&mut out, item);
            out.push_str("            </div>\n");
            out
        }
        DigestEntry::Card(item) => {
            let mut out = String::from("            <div class=\"prayer-card\">\n");
            let _ = writeln!(
                out,
                "                <div class=\"prayer-type\">{}</div>",
                kind_label(item)
            );
            let _ = writeln!(
                out,
                "                <div class=\"prayer-date\">{}</div>",
                display_date(&item.date)
            );
            let _ = writeln!(
                out,
                "                <div class=\"prayer-text\">{}</div>",
                escape_html(&item.text)
            );
            push_details(&mut out, item);
            out.push_str("            </div>\n");
            out
        }
    }
}

fn push_details(out: &mut String, item: &DigestItem) {
    if let Some(pray_for) = &item.pray_for {
        let _ = writeln!(
            out,
            "                <div class=\"pray-for\">🙋 Praying for: {}</div>",
            escape_html(pray_for)
        );
    }
    // "None" was the filler the legacy immediate email used for an empty journal
    if let Some(journal) = item.journal.as_deref().filter(|j| *j != "None") {
        let _ = writeln!(
            out,
            "                <div class=\"prayer-journal\">📝 Journal: {}</div>",
            escape_html(journal)
        );
    }
}

fn kind_label(item: &DigestItem) -> &'static str {
    item.kind.map(|k| k.as_str()).unwrap_or("")
}

fn display_date(date: &str) -> String {
    match NaiveDate::parse_from_str(date.trim(), DATE_FORMAT) {
        Ok(parsed) => parsed.format(DATE_FORMAT).to_string(),
        Err(_) => UNKNOWN_DATE.to_string(),
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
