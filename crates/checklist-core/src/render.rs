use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::{DateTime, Local, Utc};
use chrono_tz::Tz;
use tracing::{debug, trace};
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::task::{Task, TaskId};

pub const PENDING_PLACEHOLDER: &str = "All done!";
pub const COMPLETED_PLACEHOLDER: &str = "Nothing finished yet.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    Pending,
    Completed,
}

/// What a control does when activated. Carries the task identity directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Delete(TaskId),
    /// `completed` is the state the checkbox shows right now.
    Toggle { id: TaskId, completed: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemControls {
    pub delete: Action,
    pub toggle: Action,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    /// 1-based position in its list as of the last render.
    pub index: usize,
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    pub controls: ItemControls,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListItem {
    Task(TaskItem),
    Placeholder(&'static str),
}

impl ListItem {
    pub fn controls(&self) -> Option<&ItemControls> {
        match self {
            ListItem::Task(item) => Some(&item.controls),
            ListItem::Placeholder(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListView {
    pub heading: String,
    pub items: Vec<ListItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub header: String,
    pub pending: ListView,
    pub completed: ListView,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            header: String::new(),
            pending: ListView {
                heading: pending_heading(0),
                items: vec![],
            },
            completed: ListView {
                heading: completed_heading(0),
                items: vec![],
            },
        }
    }
}

impl Page {
    pub fn list(&self, group: Group) -> &ListView {
        match group {
            Group::Pending => &self.pending,
            Group::Completed => &self.completed,
        }
    }
}

pub fn pending_heading(count: usize) -> String {
    format!("Pending tasks ({count})")
}

pub fn completed_heading(count: usize) -> String {
    format!("Completed tasks ({count})")
}

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    timezone: Option<Tz>,
    page: Page,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        let timezone = match cfg.get("display.timezone") {
            Some(name) if !name.trim().is_empty() => Some(
                name.trim()
                    .parse::<Tz>()
                    .map_err(|err| anyhow!("invalid display.timezone {name}: {err}"))?,
            ),
            _ => None,
        };

        Ok(Self {
            color,
            timezone,
            page: Page::default(),
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Rebuilds both lists from scratch.
    pub fn render(&mut self, pending: &[Task], completed: &[Task]) {
        self.render_at(pending, completed, Utc::now());
    }

    #[tracing::instrument(skip(self, pending, completed, now), fields(pending = pending.len(), completed = completed.len()))]
    pub fn render_at(&mut self, pending: &[Task], completed: &[Task], now: DateTime<Utc>) {
        self.page.header = self.header_line(now);
        self.page.pending.items = build_items(pending, PENDING_PLACEHOLDER);
        self.page.completed.items = build_items(completed, COMPLETED_PLACEHOLDER);
        debug!("page lists rebuilt");
    }

    pub fn update_counts(&mut self, pending: &[Task], completed: &[Task]) {
        self.page.pending.heading = pending_heading(pending.len());
        self.page.completed.heading = completed_heading(completed.len());
        trace!(
            pending = pending.len(),
            completed = completed.len(),
            "headings updated"
        );
    }

    /// Looks up the item shown at `index` (1-based) by the last render.
    pub fn resolve(&self, group: Group, index: usize) -> Option<&TaskItem> {
        self.page
            .list(group)
            .items
            .iter()
            .find_map(|item| match item {
                ListItem::Task(task) if task.index == index => Some(task),
                _ => None,
            })
    }

    #[tracing::instrument(skip(self))]
    pub fn print_page(&self) -> anyhow::Result<()> {
        let out = io::stdout().lock();
        let paint = self.color && io::stdout().is_terminal();
        write_page(out, &self.page, paint)
    }

    fn header_line(&self, now: DateTime<Utc>) -> String {
        let (date, time) = match self.timezone {
            Some(tz) => {
                let local = now.with_timezone(&tz);
                (
                    local.format("%d/%m/%Y").to_string(),
                    local.format("%H:%M:%S").to_string(),
                )
            }
            None => {
                let local = now.with_timezone(&Local);
                (
                    local.format("%d/%m/%Y").to_string(),
                    local.format("%H:%M:%S").to_string(),
                )
            }
        };
        format!("Today is {date} and it is {time}")
    }
}

fn build_items(tasks: &[Task], placeholder: &'static str) -> Vec<ListItem> {
    if tasks.is_empty() {
        return vec![ListItem::Placeholder(placeholder)];
    }

    tasks
        .iter()
        .enumerate()
        .map(|(idx, task)| {
            ListItem::Task(TaskItem {
                index: idx + 1,
                id: task.id.clone(),
                text: task.text.clone(),
                completed: task.completed,
                controls: ItemControls {
                    delete: Action::Delete(task.id.clone()),
                    toggle: Action::Toggle {
                        id: task.id.clone(),
                        completed: task.completed,
                    },
                },
            })
        })
        .collect()
}

/// Writes the page as plain text. `paint` enables ANSI styling.
pub fn write_page<W: Write>(mut writer: W, page: &Page, paint: bool) -> anyhow::Result<()> {
    if !page.header.is_empty() {
        writeln!(writer, "{}", page.header)?;
        writeln!(writer)?;
    }

    write_list(&mut writer, &page.pending, paint)?;
    writeln!(writer)?;
    write_list(&mut writer, &page.completed, paint)?;
    Ok(())
}

fn write_list<W: Write>(writer: &mut W, list: &ListView, paint: bool) -> anyhow::Result<()> {
    writeln!(writer, "{}", list.heading)?;

    let mut rows = Vec::with_capacity(list.items.len());
    for item in &list.items {
        match item {
            ListItem::Placeholder(text) => {
                writeln!(writer, "  {text}")?;
            }
            ListItem::Task(task) => {
                let index = format!("{}.", task.index);
                let index = if paint { style(&index, "33") } else { index };
                let done = if task.completed { "[x]" } else { "[ ]" }.to_string();
                let text = if paint && task.completed {
                    style(&task.text, "9")
                } else {
                    task.text.clone()
                };
                rows.push(vec![index, done, text, task.id.to_string()]);
            }
        }
    }

    if rows.is_empty() {
        return Ok(());
    }

    let headers = vec![
        "#".to_string(),
        "Done".to_string(),
        "Task".to_string(),
        "ID".to_string(),
    ];
    write_table(writer, headers, rows)
}

fn style(text: &str, code: &str) -> String {
    format!("\x1b[{code}m{text}\x1b[0m")
}

fn write_table<W: Write>(
    writer: &mut W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
