use std::fmt::Write as _;

use glance_core::{ComposedLine, ReadingView};

/// Status prefix plus the focus word with its fixation letter bracketed, or
/// the whole sentence in sentence mode.
pub(super) fn render_focus(view: &ReadingView<'_>) -> String {
    let mut out = status_prefix(view);
    match (view.sentence, view.focus) {
        (Some(sentence), _) => out.push_str(sentence),
        (None, Some(focus)) => {
            let _ = write!(out, "{}[{}]{}", focus.before, focus.center, focus.after);
        }
        (None, None) => {}
    }
    out
}

/// Past lines, the focus line and future lines, one string each.
pub(super) fn render_lines(view: &ReadingView<'_>) -> Vec<String> {
    let lines = &view.lines;
    let mut out = Vec::with_capacity(lines.past_lines.len() + lines.future_lines.len() + 2);
    out.push(status_prefix(view));

    for line in &view.lines.past_lines {
        out.push(format!("  {}", line_text(view, line)));
    }

    let focus_index = view.focus.map(|focus| focus.index);
    let focus_line = view
        .lines
        .focus_line
        .words
        .iter()
        .map(|word| {
            let text = view.text_of(word);
            if Some(word.index) == focus_index {
                format!("*{text}*")
            } else {
                text.to_owned()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    out.push(format!("> {focus_line}"));

    for line in &view.lines.future_lines {
        out.push(format!("  {}", line_text(view, line)));
    }
    out
}

fn line_text(view: &ReadingView<'_>, line: &ComposedLine) -> String {
    line.words
        .iter()
        .map(|word| view.text_of(word))
        .collect::<Vec<_>>()
        .join(" ")
}

fn status_prefix(view: &ReadingView<'_>) -> String {
    let status = &view.status;
    format!(
        "[{} {} {}wpm {}/{}] ",
        status.mode_label,
        if status.playing { ">" } else { "||" },
        status.wpm,
        status.page,
        status.total_pages
    )
}
