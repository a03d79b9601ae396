use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

use juridique_core::i18n::role_header;
use juridique_core::{
    tr, BlockKind, Language, Locale, RenderedMessage, Role, SpanKind, Theme, UiText,
};

use crate::app::{App, InputMode};

/// Colors for one theme
struct Palette {
    fg: Color,
    bg: Color,
    muted: Color,
    bar_bg: Color,
    user: Color,
    assistant: Color,
    legal: Color,
    link: Color,
    recommendation: Color,
    error: Color,
    border_active: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                fg: Color::White,
                bg: Color::Reset,
                muted: Color::DarkGray,
                bar_bg: Color::DarkGray,
                user: Color::Cyan,
                assistant: Color::Yellow,
                legal: Color::LightMagenta,
                link: Color::LightBlue,
                recommendation: Color::LightGreen,
                error: Color::LightRed,
                border_active: Color::Yellow,
            },
            Theme::Light => Self {
                fg: Color::Black,
                bg: Color::White,
                muted: Color::Gray,
                bar_bg: Color::Gray,
                user: Color::Blue,
                assistant: Color::Rgb(150, 90, 0),
                legal: Color::Magenta,
                link: Color::Blue,
                recommendation: Color::Green,
                error: Color::Red,
                border_active: Color::Rgb(150, 90, 0),
            },
        }
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let palette = Palette::for_theme(app.conversation.view.theme);
    let locale = app.locale();

    frame.render_widget(
        Block::default().style(Style::default().fg(palette.fg).bg(palette.bg)),
        area,
    );

    let rendered = app.conversation.rendered();
    let sources = latest_sources(&rendered);

    let show_filter =
        app.input_mode == InputMode::Filtering || !app.conversation.view.filter.is_empty();
    let banner = app.conversation.banner().or_else(|| app.notice.clone());

    let [header_area, filter_area, chat_area, sources_area, banner_area, input_area, footer_area] =
        Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(if show_filter { 3 } else { 0 }),
            Constraint::Min(3),
            Constraint::Length(if sources.is_empty() { 0 } else { sources.len().min(5) as u16 + 2 }),
            Constraint::Length(if banner.is_some() { 1 } else { 0 }),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .areas(area);

    render_header(app, &palette, frame, header_area);
    if show_filter {
        render_filter(app, &palette, frame, filter_area);
    }
    render_chat(app, &rendered, &palette, frame, chat_area);
    if !sources.is_empty() {
        render_sources(sources, locale, &palette, frame, sources_area);
    }
    if let Some(text) = banner {
        let style = if app.conversation.last_error().is_some() {
            Style::default().fg(palette.error).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.muted)
        };
        frame.render_widget(Paragraph::new(format!(" {}", text)).style(style), banner_area);
    }
    render_input(app, &palette, frame, input_area);
    render_footer(app, frame, footer_area);
}

/// Sources cited by the newest visible assistant reply
fn latest_sources(rendered: &[RenderedMessage]) -> &[String] {
    rendered
        .iter()
        .rev()
        .find(|m| m.role == Role::Assistant)
        .map(|m| m.sources.as_slice())
        .unwrap_or(&[])
}

fn language_label(language: Language, locale: Locale) -> &'static str {
    let key = match language {
        Language::Auto => UiText::LanguageAuto,
        Language::French => UiText::LanguageFrench,
        Language::Tunisian => UiText::LanguageTunisian,
    };
    tr(key, locale)
}

fn render_header(app: &App, palette: &Palette, frame: &mut Frame, area: Rect) {
    let locale = app.locale();
    let view = &app.conversation.view;
    let theme = match view.theme {
        Theme::Light => tr(UiText::ThemeLight, locale),
        Theme::Dark => tr(UiText::ThemeDark, locale),
    };

    let title = Line::from(vec![
        Span::styled(format!(" {} ", tr(UiText::Title, locale)), Style::default().fg(palette.user).bold()),
        Span::styled(
            format!("{}: {} ", tr(UiText::LanguageLabel, locale), language_label(view.language, locale)),
            Style::default().fg(Color::White),
        ),
        Span::styled(format!("[{}] ", theme), Style::default().fg(Color::White)),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(palette.bar_bg));
    frame.render_widget(header, area);
}

fn render_filter(app: &App, palette: &Palette, frame: &mut Frame, area: Rect) {
    let active = app.input_mode == InputMode::Filtering;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if active { palette.border_active } else { palette.muted }))
        .title(tr(UiText::FilterTitle, app.locale()));

    let filter = &app.conversation.view.filter;
    frame.render_widget(Paragraph::new(filter.as_str()).block(block), area);

    if active {
        let inner_width = area.width.saturating_sub(2);
        let cursor_x = (filter.chars().count() as u16).min(inner_width.saturating_sub(1));
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn message_lines(msg: &RenderedMessage, locale: Locale, palette: &Palette) -> Vec<Line<'static>> {
    let header_color = match msg.role {
        Role::User => palette.user,
        Role::Assistant => palette.assistant,
        Role::System => palette.muted,
    };
    let mut lines = vec![Line::from(Span::styled(
        format!("{}:", role_header(msg.role, locale)),
        Style::default().fg(header_color).add_modifier(Modifier::BOLD),
    ))];

    for block in &msg.blocks {
        let base = match block.kind {
            BlockKind::Heading => Style::default().fg(palette.assistant).add_modifier(Modifier::BOLD),
            BlockKind::Recommendation => Style::default().fg(palette.recommendation),
            BlockKind::Bullet | BlockKind::Paragraph | BlockKind::Blank => Style::default(),
        };

        let mut spans: Vec<Span<'static>> = match block.kind {
            BlockKind::Bullet => vec![Span::raw("  • ")],
            BlockKind::Recommendation => {
                vec![Span::styled("▌ ", Style::default().fg(palette.recommendation))]
            }
            _ => Vec::new(),
        };

        spans.extend(block.spans.iter().map(|span| {
            let style = match &span.kind {
                SpanKind::Plain => base,
                SpanKind::Strong => base.add_modifier(Modifier::BOLD),
                SpanKind::LegalReference => base.fg(palette.legal).add_modifier(Modifier::BOLD),
                SpanKind::Link { .. } => base.fg(palette.link).add_modifier(Modifier::UNDERLINED),
            };
            Span::styled(span.text.clone(), style)
        }));

        lines.push(Line::from(spans));
    }

    lines.push(Line::default());
    lines
}

/// Rows the chat text takes once wrapped to `width`
fn wrapped_height(lines: &[Line], width: u16) -> u16 {
    let wrap_width = if width > 0 { width as usize } else { 50 };
    let total: usize = lines
        .iter()
        .map(|line| {
            let char_count: usize = line.spans.iter().map(|s| s.content.chars().count()).sum();
            if char_count == 0 {
                1
            } else {
                char_count.div_ceil(wrap_width)
            }
        })
        .sum();
    total.min(u16::MAX as usize) as u16
}

fn render_chat(
    app: &mut App,
    rendered: &[RenderedMessage],
    palette: &Palette,
    frame: &mut Frame,
    area: Rect,
) {
    let locale = app.locale();

    // Store areas for mouse hit-testing and scroll calculations
    app.chat_area = Some(area);
    app.chat_height = area.height.saturating_sub(2);
    let chat_width = area.width.saturating_sub(2);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.muted))
        .title(format!(" {} ", tr(UiText::Subtitle, locale)));

    let mut lines: Vec<Line> = Vec::new();
    if rendered.is_empty() {
        lines.push(Line::from(Span::styled(
            tr(UiText::NoMatches, locale),
            Style::default().fg(palette.muted).add_modifier(Modifier::ITALIC),
        )));
    }
    for msg in rendered {
        lines.extend(message_lines(msg, locale, palette));
    }

    if app.is_loading() {
        lines.push(Line::from(Span::styled(
            format!("{}:", role_header(Role::Assistant, locale)),
            Style::default().fg(palette.assistant).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("{}{}", tr(UiText::Thinking, locale), dots),
            Style::default().fg(palette.muted).add_modifier(Modifier::ITALIC),
        )));
    }

    app.clamp_scroll(wrapped_height(&lines, chat_width));

    let chat = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_sources(sources: &[String], locale: Locale, palette: &Palette, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.legal))
        .title(tr(UiText::SourcesTitle, locale));

    let items: Vec<ListItem> = sources
        .iter()
        .enumerate()
        .map(|(i, source)| ListItem::new(format!(" {}. {} ", i + 1, source)))
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

fn render_input(app: &App, palette: &Palette, frame: &mut Frame, area: Rect) {
    let locale = app.locale();
    let editing = app.input_mode == InputMode::Editing;

    let title = if app.is_loading() {
        format!(" {} ", tr(UiText::Sending, locale))
    } else {
        tr(UiText::InputTitle, locale).to_string()
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if editing { palette.border_active } else { palette.muted }))
        .title(title);

    let input_text = app.conversation.input();
    if input_text.is_empty() {
        let placeholder = Paragraph::new(tr(UiText::InputPlaceholder, locale))
            .style(Style::default().fg(palette.muted).add_modifier(Modifier::ITALIC))
            .block(input_block);
        frame.render_widget(placeholder, area);
        if editing {
            frame.set_cursor_position((area.x + 1, area.y + 1));
        }
        return;
    }

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = input_text
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(palette.user))
        .block(input_block);

    frame.render_widget(input, area);

    // Show cursor when editing
    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let locale = app.locale();

    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" INSERT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
        InputMode::Filtering => (" FILTER ", Style::default().bg(Color::Magenta).fg(Color::White)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hint = |key: &'static str, label: UiText| {
        [Span::styled(key, key_style), Span::styled(tr(label, locale), label_style)]
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    match app.input_mode {
        InputMode::Normal => {
            spans.extend(hint(" i ", UiText::HintEdit));
            spans.extend(hint(" / ", UiText::HintSearch));
            spans.extend(hint(" j/k ", UiText::HintScroll));
            spans.extend(hint(" n ", UiText::HintNew));
            if !app.is_loading() {
                spans.extend(hint(" e ", UiText::HintExport));
            }
            spans.extend(hint(" l ", UiText::HintLanguage));
            spans.extend(hint(" t ", UiText::HintTheme));
            spans.extend(hint(" q ", UiText::HintQuit));
        }
        InputMode::Editing => {
            if app.is_loading() {
                spans.push(Span::styled(tr(UiText::HintWait, locale), label_style));
            } else {
                spans.extend(hint(" Enter ", UiText::HintSend));
            }
            spans.extend(hint(" Esc ", UiText::HintStopTyping));
        }
        InputMode::Filtering => {
            spans.extend(hint(" Enter ", UiText::HintDone));
            spans.extend(hint(" Esc ", UiText::HintClear));
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
