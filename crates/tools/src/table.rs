//! GitHub-flavoured markdown tables.
//!
//! Numeric columns are right-aligned, text columns left-aligned; every
//! column is at least two characters wider than its header.

use minijira_core::store::Ticket;

const HEADERS: [&str; 5] = ["id", "title", "assignee_id", "assignee", "status"];
const NUMERIC: [bool; 5] = [true, false, true, false, false];
const MIN_PADDING: usize = 2;

/// Render tickets as a table, in the order given.
pub fn tickets(tickets: &[Ticket]) -> String {
    let rows: Vec<[String; 5]> = tickets
        .iter()
        .map(|t| {
            [
                t.id.to_string(),
                t.title.clone(),
                t.assignee_id.to_string(),
                t.assignee.clone(),
                t.status.to_string(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| width(h) + MIN_PADDING);
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(width(cell));
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(line(&HEADERS.map(String::from), &widths));
    lines.push(format!(
        "|{}|",
        widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("|")
    ));
    lines.extend(rows.iter().map(|row| line(row, &widths)));
    lines.join("\n")
}

fn line(cells: &[String; 5], widths: &[usize; 5]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .zip(NUMERIC)
        .map(|((cell, &w), numeric)| {
            let fill = " ".repeat(w - width(cell));
            if numeric {
                format!(" {fill}{cell} ")
            } else {
                format!(" {cell}{fill} ")
            }
        })
        .collect();
    format!("|{}|", padded.join("|"))
}

fn width(s: &str) -> usize {
    s.chars().count()
}
