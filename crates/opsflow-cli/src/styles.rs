//! Terminal palette for clap's help and the command listing.

use anstyle::{AnsiColor, Color, Style};

/// Section titles: clap headings, "Commands:", "Examples:".
pub const HEADING: Style = Style::new()
    .fg_color(Some(Color::Ansi(AnsiColor::Green)))
    .bold();

/// Flags, placeholders and example invocations.
pub const LITERAL: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan)));

/// Mnemonic names in the listing.
pub const MNEMONIC: Style = LITERAL.bold();

/// One-line descriptions and example comments.
pub const NOTE: Style = Style::new().dimmed();

pub fn get_clap_styles() -> clap::builder::Styles {
    clap::builder::Styles::styled()
        .header(HEADING)
        .usage(HEADING)
        .literal(LITERAL)
        .placeholder(LITERAL)
}

/// Wraps `text` in `style` when `colored`, otherwise returns it unchanged.
pub fn paint(style: Style, text: &str, colored: bool) -> String {
    if colored {
        format!("{}{}{}", style.render(), text, style.render_reset())
    } else {
        text.to_string()
    }
}
