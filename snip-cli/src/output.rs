use crate::{cli::OutputFormat, error::Result};
#[cfg(feature = "colored-output")]
use colored::*;
use serde::Serialize;
use snippet_relay::RelayConfig;
use std::io::Write;
#[cfg(feature = "table-output")]
use tabled::{Table, Tabled, settings::Style};
use wp_snippets::{Credentials, ListResult, SaveResult, SaveStatus, Snippet, preview};

/// Characters of content shown per row in list output.
const LIST_PREVIEW_CHARS: usize = 60;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

pub struct OutputManager {
    colored: bool,
}

impl OutputManager {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    /// A `{status, message}` outcome (capture ack, save result, settings saved).
    pub fn format_status(
        &self,
        status: SaveStatus,
        message: &str,
        post_id: Option<i64>,
        format: &OutputFormat,
    ) -> Result<String> {
        match format {
            OutputFormat::Json => Self::to_json(&SaveResult {
                status,
                message: message.to_string(),
                post_id,
            }),
            OutputFormat::Pretty | OutputFormat::Table => {
                let mut output = match status {
                    SaveStatus::Success => {
                        format!("{} {}", self.colorize("✓", &Color::Green, true), message)
                    }
                    SaveStatus::Error => {
                        format!("{} {}", self.colorize("✗", &Color::Red, true), message)
                    }
                };
                if let Some(id) = post_id {
                    output.push_str(&format!(
                        " ({} {})",
                        self.colorize("id", &Color::Yellow, false),
                        id
                    ));
                }
                output.push('\n');
                Ok(output)
            }
        }
    }

    pub fn format_captured(&self, text: &str, format: &OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Self::to_json(&serde_json::json!({ "text": text })),
            _ if text.is_empty() => Ok(format!(
                "{}\n",
                self.colorize("Nothing captured yet.", &Color::Yellow, false)
            )),
            _ => Ok(format!("{text}\n")),
        }
    }

    pub fn format_list(&self, list: &ListResult, format: &OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Self::to_json(list),
            #[cfg(feature = "table-output")]
            OutputFormat::Table => Ok(self.format_list_table(list)),
            #[cfg(not(feature = "table-output"))]
            OutputFormat::Table => Ok(self.format_list_pretty(list)),
            OutputFormat::Pretty => Ok(self.format_list_pretty(list)),
        }
    }

    fn format_list_pretty(&self, list: &ListResult) -> String {
        let mut output = String::new();
        if list.items.is_empty() {
            output.push_str(&self.colorize("No snippets found.", &Color::Yellow, false));
            output.push('\n');
        }

        for snippet in &list.items {
            output.push_str(&format!(
                "{} {} {}\n",
                self.colorize(&format!("#{}", snippet.id), &Color::Cyan, true),
                self.colorize(&snippet.title, &Color::Green, true),
                self.colorize(
                    &snippet.date.format(DATE_FORMAT).to_string(),
                    &Color::Blue,
                    false
                )
            ));
            output.push_str(&format!(
                "    {}\n",
                preview(&single_line(&snippet.content), LIST_PREVIEW_CHARS)
            ));
        }

        output.push_str(&self.page_footer(list));
        output
    }

    #[cfg(feature = "table-output")]
    fn format_list_table(&self, list: &ListResult) -> String {
        #[derive(Tabled)]
        struct SnippetRow {
            id: i64,
            date: String,
            title: String,
            categories: String,
            content: String,
        }

        let rows: Vec<SnippetRow> = list
            .items
            .iter()
            .map(|s| SnippetRow {
                id: s.id,
                date: s.date.format(DATE_FORMAT).to_string(),
                title: s.title.clone(),
                categories: s.categories.join(", "),
                content: preview(&single_line(&s.content), LIST_PREVIEW_CHARS),
            })
            .collect();

        let mut output = Table::new(rows).with(Style::modern()).to_string();
        output.push('\n');
        output.push_str(&self.page_footer(list));
        output
    }

    fn page_footer(&self, list: &ListResult) -> String {
        let mut footer = format!(
            "Page {} of {} ({} snippets)",
            list.current_page, list.total_pages, list.total_items
        );
        if list.has_next() {
            footer.push_str(&format!(
                " · next: --page {}",
                list.current_page.saturating_add(1)
            ));
        }
        format!("{}\n", self.colorize(&footer, &Color::Yellow, false))
    }

    /// Preview of a single snippet.
    pub fn format_snippet(&self, snippet: &Snippet, format: &OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Self::to_json(snippet),
            #[cfg(feature = "table-output")]
            OutputFormat::Table => {
                #[derive(Tabled)]
                struct Row<'a> {
                    property: &'a str,
                    value: String,
                }
                let rows = vec![
                    Row {
                        property: "ID",
                        value: snippet.id.to_string(),
                    },
                    Row {
                        property: "Title",
                        value: snippet.title.clone(),
                    },
                    Row {
                        property: "Date",
                        value: snippet.date.format(DATE_FORMAT).to_string(),
                    },
                    Row {
                        property: "Categories",
                        value: snippet.categories.join(", "),
                    },
                    Row {
                        property: "Content",
                        value: snippet.content.clone(),
                    },
                ];
                Ok(format!("{}\n", Table::new(rows).with(Style::modern())))
            }
            _ => {
                let mut output = String::new();
                output.push_str(&self.colorize(&snippet.title, &Color::Green, true));
                output.push('\n');
                output.push_str(&format!(
                    "  {}: {}\n",
                    self.colorize("ID", &Color::Yellow, false),
                    snippet.id
                ));
                output.push_str(&format!(
                    "  {}: {}\n",
                    self.colorize("Date", &Color::Yellow, false),
                    snippet.date.format(DATE_FORMAT)
                ));
                if !snippet.categories.is_empty() {
                    output.push_str(&format!(
                        "  {}: {}\n",
                        self.colorize("Categories", &Color::Yellow, false),
                        self.colorize(&snippet.categories.join(", "), &Color::Cyan, false)
                    ));
                }
                output.push('\n');
                output.push_str(&snippet.content);
                output.push('\n');
                Ok(output)
            }
        }
    }

    /// Effective relay configuration plus credentials, secret masked.
    pub fn format_config(
        &self,
        config: &RelayConfig,
        credentials: &Credentials,
        format: &OutputFormat,
    ) -> Result<String> {
        let masked = Credentials {
            secret: mask(&credentials.secret),
            ..credentials.clone()
        };

        match format {
            OutputFormat::Json => Self::to_json(&serde_json::json!({
                "relay": config,
                "credentials": masked,
            })),
            _ => {
                let mut output = String::new();
                output.push_str(&self.colorize("Credentials:", &Color::Green, true));
                output.push('\n');
                for (label, value) in [
                    ("Site URL", &masked.endpoint_base_url),
                    ("Username", &masked.username),
                    ("Application password", &masked.secret),
                ] {
                    let value = if value.is_empty() { "(not set)" } else { value };
                    output.push_str(&format!(
                        "  {}: {}\n",
                        self.colorize(label, &Color::Yellow, false),
                        value
                    ));
                }
                output.push('\n');
                output.push_str(&self.colorize("Relay:", &Color::Green, true));
                output.push('\n');
                output.push_str(&toml::to_string_pretty(config)?);
                Ok(output)
            }
        }
    }

    fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
        let mut json = serde_json::to_string_pretty(value)?;
        json.push('\n');
        Ok(json)
    }

    fn colorize(&self, text: &str, color: &Color, bold: bool) -> String {
        #[cfg(feature = "colored-output")]
        {
            if self.colored {
                let colored_text = match color {
                    Color::Green => text.green(),
                    Color::Yellow => text.yellow(),
                    Color::Blue => text.blue(),
                    Color::Cyan => text.cyan(),
                    Color::Red => text.red(),
                };
                if bold {
                    colored_text.bold().to_string()
                } else {
                    colored_text.to_string()
                }
            } else {
                text.to_string()
            }
        }

        #[cfg(not(feature = "colored-output"))]
        {
            let _ = (color, bold, self.colored);
            text.to_string()
        }
    }
}

enum Color {
    Green,
    Yellow,
    Blue,
    Cyan,
    Red,
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        "********".to_string()
    }
}

pub fn write_output(content: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(content.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn snippet(id: i64, content: &str) -> Snippet {
        Snippet {
            id,
            title: format!("Snippet {id}"),
            content: content.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            categories: vec!["notes".to_string()],
        }
    }

    fn plain() -> OutputManager {
        OutputManager::new(false)
    }

    #[test]
    fn test_status_pretty() {
        let out = plain()
            .format_status(
                SaveStatus::Success,
                "Text saved successfully!",
                Some(42),
                &OutputFormat::Pretty,
            )
            .unwrap();
        assert_eq!(out, "✓ Text saved successfully! (id 42)\n");
    }

    #[test]
    fn test_status_json() {
        let out = plain()
            .format_status(SaveStatus::Error, "nope", None, &OutputFormat::Json)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value, serde_json::json!({"status": "error", "message": "nope"}));
    }

    #[test]
    fn test_list_pretty() {
        let list = ListResult::from_page(
            vec![snippet(31, "line one\nline   two"), snippet(30, "short")],
            25,
            10,
            1,
        );
        let out = plain().format_list(&list, &OutputFormat::Pretty).unwrap();

        assert!(out.contains("#31 Snippet 31 2024-05-01 09:30"));
        assert!(out.contains("    line one line two\n"));
        assert!(out.contains("Page 1 of 3 (25 snippets) · next: --page 2"));
    }

    #[test]
    fn test_empty_list() {
        let list = ListResult::from_page(Vec::new(), 0, 10, 1);
        let out = plain().format_list(&list, &OutputFormat::Pretty).unwrap();
        assert!(out.starts_with("No snippets found."));
        assert!(!out.contains("next"));
    }

    #[cfg(feature = "table-output")]
    #[test]
    fn test_list_table() {
        let list = ListResult::from_page(vec![snippet(7, "content")], 1, 10, 1);
        let out = plain().format_list(&list, &OutputFormat::Table).unwrap();
        assert!(out.contains("categories"));
        assert!(out.contains("Snippet 7"));
    }

    #[test]
    fn test_snippet_preview() {
        let out = plain()
            .format_snippet(&snippet(30, "Full content\nkept as is"), &OutputFormat::Pretty)
            .unwrap();
        assert!(out.starts_with("Snippet 30\n"));
        assert!(out.contains("Categories: notes"));
        assert!(out.ends_with("Full content\nkept as is\n"));
    }

    #[test]
    fn test_captured_output() {
        let manager = plain();
        assert_eq!(
            manager.format_captured("", &OutputFormat::Pretty).unwrap(),
            "Nothing captured yet.\n"
        );
        assert_eq!(
            manager.format_captured("abc", &OutputFormat::Pretty).unwrap(),
            "abc\n"
        );
    }

    #[test]
    fn test_config_masks_secret() {
        let creds = Credentials::new("https://example.com", "admin", "super secret");
        let out = plain()
            .format_config(&RelayConfig::default(), &creds, &OutputFormat::Json)
            .unwrap();
        assert!(!out.contains("super secret"));
        assert!(out.contains("********"));

        let pretty = plain()
            .format_config(&RelayConfig::default(), &Credentials::default(), &OutputFormat::Pretty)
            .unwrap();
        assert!(pretty.contains("Site URL: (not set)"));
        assert!(pretty.contains("[bridge]"));
    }
}
