//! Standalone HTML projection of a rendered [`Page`].
//!
//! Controls are described with `data-action` / `data-task-id` attributes so
//! whatever script wires them up gets the task id from the element itself.

use std::fmt::{self, Write as _};

use crate::render::{Action, ListItem, ListView, Page};

const STYLE: &str = "body{font-family:sans-serif;max-width:40rem;margin:2rem auto}\
li{display:flex;justify-content:space-between;align-items:center;padding:.25rem 0}\
.task{display:flex;gap:.5rem}.done{text-decoration:line-through}";

pub fn render_document(page: &Page) -> anyhow::Result<String> {
    let mut out = String::with_capacity(2048);
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    out.push_str("<meta charset=\"utf-8\">\n<title>Task list</title>\n");
    writeln!(out, "<style>{STYLE}</style>")?;
    out.push_str("</head>\n<body>\n");

    writeln!(out, "<header><h2>{}</h2></header>", escape_html(&page.header))?;
    write_section(&mut out, "pending", &page.pending)?;
    write_section(&mut out, "completed", &page.completed)?;

    out.push_str("</body>\n</html>\n");
    Ok(out)
}

fn write_section(out: &mut String, id: &str, list: &ListView) -> fmt::Result {
    writeln!(out, "<section id=\"{id}\">")?;
    writeln!(out, "<h1>{}</h1>", escape_html(&list.heading))?;
    out.push_str("<ul>\n");

    for item in &list.items {
        match item {
            ListItem::Placeholder(text) => {
                writeln!(out, "<li class=\"placeholder\">{}</li>", escape_html(text))?;
            }
            ListItem::Task(task) => {
                let id = escape_html(task.id.as_str());
                let text_class = if task.completed { "text done" } else { "text" };
                writeln!(out, "<li data-task-id=\"{id}\">")?;
                writeln!(
                    out,
                    "<div class=\"task\"><span class=\"index\">{}.</span><span class=\"{text_class}\">{}</span></div>",
                    task.index,
                    escape_html(&task.text)
                )?;
                out.push_str("<div class=\"controls\">");
                write_control(out, &task.controls.delete)?;
                write_control(out, &task.controls.toggle)?;
                out.push_str("</div>\n</li>\n");
            }
        }
    }

    out.push_str("</ul>\n</section>\n");
    Ok(())
}

fn write_control(out: &mut String, action: &Action) -> fmt::Result {
    match action {
        Action::Delete(id) => {
            write!(
                out,
                "<button type=\"button\" data-action=\"delete\" data-task-id=\"{}\">Delete</button>",
                escape_html(id.as_str())
            )?;
        }
        Action::Toggle { id, completed } => {
            let checked = if *completed { " checked" } else { "" };
            write!(
                out,
                "<input type=\"checkbox\" data-action=\"toggle\" data-task-id=\"{}\" data-completed=\"{completed}\"{checked}>",
                escape_html(id.as_str())
            )?;
        }
    }
    Ok(())
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
