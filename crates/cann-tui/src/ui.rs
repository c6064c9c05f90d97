use cann_core::content::{self, CAPABILITIES, FEATURES, USAGE_NOTES};
use cann_core::highlight::{Highlighter, TokenKind};
use cann_core::{ChatRole, Theme, QUICK_QUESTIONS};
use ratatui::{
    layout::{Constraint, Layout, Margin, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Clear, List, ListItem, Paragraph, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Wrap,
    },
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, FormField, InputMode, QaFocus, Screen};

/// Colors for one theme.
struct Palette {
    bg: Color,
    text: Color,
    muted: Color,
    accent: Color,
    user: Color,
    assistant: Color,
    border: Color,
    focus: Color,
    keyword: Color,
    string: Color,
    preprocessor: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                bg: Color::White,
                text: Color::Black,
                muted: Color::Gray,
                accent: Color::Blue,
                user: Color::Blue,
                assistant: Color::Magenta,
                border: Color::Gray,
                focus: Color::Blue,
                keyword: Color::Magenta,
                string: Color::Green,
                preprocessor: Color::Red,
            },
            Theme::Dark => Self {
                bg: Color::Reset,
                text: Color::White,
                muted: Color::DarkGray,
                accent: Color::Cyan,
                user: Color::Cyan,
                assistant: Color::Yellow,
                border: Color::DarkGray,
                focus: Color::Cyan,
                keyword: Color::LightMagenta,
                string: Color::LightGreen,
                preprocessor: Color::LightYellow,
            },
        }
    }

    fn token_style(&self, kind: TokenKind) -> Style {
        match kind {
            TokenKind::Plain => Style::default().fg(self.text),
            TokenKind::Keyword => Style::default().fg(self.keyword).add_modifier(Modifier::BOLD),
            TokenKind::Str => Style::default().fg(self.string),
            TokenKind::Comment => Style::default().fg(self.muted).add_modifier(Modifier::ITALIC),
            TokenKind::Preprocessor => Style::default().fg(self.preprocessor),
        }
    }
}

/// Terminal columns taken by `s`.
fn display_width(s: &str) -> u16 {
    s.width().min(u16::MAX as usize) as u16
}

/// Parse a line of text and convert **bold** and `code` markdown to styled spans
fn parse_markdown_line(text: &str, palette: &Palette) -> Line<'static> {
    if let Some(heading) = text.trim_start().strip_prefix('#') {
        let heading = heading.trim_start_matches('#').trim();
        return Line::from(Span::styled(
            heading.to_string(),
            Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
        ));
    }

    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            // Consume the second *
            chars.next();

            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;
            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next();
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(bold_text, Style::default().add_modifier(Modifier::BOLD)));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else if c == '`' {
            let mut code = String::new();
            let mut found_close = false;
            for c in chars.by_ref() {
                if c == '`' {
                    found_close = true;
                    break;
                }
                code.push(c);
            }
            if found_close {
                if !current_text.is_empty() {
                    spans.push(Span::raw(std::mem::take(&mut current_text)));
                }
                spans.push(Span::styled(code, Style::default().fg(palette.string)));
            } else {
                current_text.push('`');
                current_text.push_str(&code);
            }
        } else {
            current_text.push(c);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

fn highlighted_line(highlighter: &mut Highlighter, line: &str, palette: &Palette) -> Vec<Span<'static>> {
    highlighter
        .highlight_line(line)
        .into_iter()
        .map(|(kind, text)| Span::styled(text.to_string(), palette.token_style(kind)))
        .collect()
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let palette = Palette::for_theme(app.theme);

    frame.render_widget(Block::default().style(Style::default().bg(palette.bg).fg(palette.text)), area);

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area, &palette);

    app.chat_area = None;
    app.code_area = None;
    match app.screen {
        Screen::Home => render_home_screen(frame, body_area, &palette),
        Screen::Qa => render_qa_screen(app, frame, body_area, &palette),
        Screen::OperatorDev => render_operator_screen(app, frame, body_area, &palette),
    }

    render_footer(app, frame, footer_area);

    if let Some(toast) = &app.toast {
        render_toast(&toast.message, frame, body_area, &palette);
    }
    if let Some(alert) = &app.alert {
        render_alert(&alert.title, &alert.message, frame, area, &palette);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let mut spans = vec![Span::styled(
        format!(" {} ", content::TITLE),
        Style::default().fg(palette.accent).bold(),
    )];

    for (i, screen) in [Screen::Home, Screen::Qa, Screen::OperatorDev].iter().enumerate() {
        let style = if *screen == app.screen {
            Style::default().fg(Color::White).bg(palette.accent).bold()
        } else {
            Style::default().fg(palette.muted)
        };
        spans.push(Span::raw(" "));
        spans.push(Span::styled(format!(" {} {} ", i + 1, screen.title()), style));
    }

    let theme_label = match app.theme {
        Theme::Light => "浅色",
        Theme::Dark => "深色",
    };
    spans.push(Span::styled(format!("   主题: {} ", theme_label), Style::default().fg(palette.muted)));
    spans.push(Span::styled(
        format!("v{}", env!("CARGO_PKG_VERSION")),
        Style::default().fg(palette.muted),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.screen {
        Screen::Home => " HOME ",
        Screen::Qa => " QA ",
        Screen::OperatorDev => " OP ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let pairs: Vec<(&str, &str)> = match (app.screen, app.input_mode) {
        (Screen::Home, _) => vec![
            ("2/a", "问答"),
            ("3/o", "算子开发"),
            ("t", "主题"),
            ("q", "退出"),
        ],
        (Screen::Qa, InputMode::Normal) => {
            let mut pairs = vec![("Tab", "焦点")];
            match app.qa_focus {
                QaFocus::Input => pairs.extend([("i", "输入"), ("j/k", "滚动")]),
                QaFocus::QuickQuestions | QaFocus::Recent => {
                    pairs.extend([("j/k", "选择"), ("Enter", "填入")])
                }
            }
            pairs.extend([
                ("c", "复制"),
                ("y/n", "反馈"),
                ("e", "导出"),
                ("t", "主题"),
                ("Esc", "首页"),
            ]);
            pairs
        }
        (Screen::Qa, InputMode::Editing) => vec![("Enter", "发送"), ("Esc", "停止输入")],
        (Screen::OperatorDev, InputMode::Normal) => {
            let mut pairs = vec![("j/k", "字段")];
            if app.form_field.is_text() {
                pairs.push(("Enter", "编辑"));
            } else {
                pairs.push(("h/l", "切换"));
            }
            pairs.extend([
                ("g", "生成"),
                ("c", "复制"),
                ("s", "下载"),
                ("T", "模板"),
                ("p", "示例"),
                ("Esc", "首页"),
            ]);
            pairs
        }
        (Screen::OperatorDev, InputMode::Editing) => {
            vec![("Enter", "确定"), ("Tab", "下一项"), ("Esc", "停止输入")]
        }
    };

    let hints = pairs.into_iter().flat_map(|(key, label)| {
        [
            Span::styled(format!(" {} ", key), key_style),
            Span::styled(format!(" {} ", label), label_style),
        ]
    });

    let footer_content = Line::from(
        vec![Span::styled(mode_text, mode_style), Span::styled(" ", label_style)]
            .into_iter()
            .chain(hints)
            .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn card_lines(cards: &[content::Card], palette: &Palette) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for card in cards {
        lines.push(Line::from(vec![
            Span::styled("  • ", Style::default().fg(palette.accent)),
            Span::styled(card.title, Style::default().fg(palette.text).bold()),
        ]));
        lines.push(Line::from(Span::styled(
            format!("    {}", card.description),
            Style::default().fg(palette.muted),
        )));
    }
    lines
}

fn render_home_screen(frame: &mut Frame, area: Rect, palette: &Palette) {
    let [hero_area, cards_area] = Layout::vertical([Constraint::Length(7), Constraint::Min(0)]).areas(area);

    let hero = Text::from(vec![
        Line::default(),
        Line::from(Span::styled(content::TITLE, Style::default().fg(palette.accent).bold())).centered(),
        Line::from(Span::styled(content::SUBTITLE, Style::default().fg(palette.text).bold())).centered(),
        Line::from(Span::styled(content::TAGLINE, Style::default().fg(palette.muted))).centered(),
        Line::default(),
        Line::from(Span::styled(
            "按 2 开始智能问答，按 3 进入算子开发",
            Style::default().fg(palette.accent),
        ))
        .centered(),
    ]);
    frame.render_widget(Paragraph::new(hero).wrap(Wrap { trim: true }), hero_area);

    let [caps_area, features_area] =
        Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)]).areas(cards_area);

    let caps = Paragraph::new(card_lines(CAPABILITIES, palette))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.border))
                .title(" 核心能力 "),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(caps, caps_area);

    let features = Paragraph::new(card_lines(FEATURES, palette))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.border))
                .title(" 功能入口 "),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(features, features_area);
}

fn render_qa_screen(app: &mut App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let [sidebar_area, main_area] =
        Layout::horizontal([Constraint::Length(34), Constraint::Min(0)]).areas(area);

    render_qa_sidebar(app, frame, sidebar_area, palette);

    let [chat_area, input_area] = Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(main_area);

    // Store areas for mouse hit-testing and scroll calculations
    app.chat_area = Some(chat_area);
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    render_chat(app, frame, chat_area, palette);
    render_qa_input(app, frame, input_area, palette);
}

fn render_qa_sidebar(app: &mut App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let quick_height = QUICK_QUESTIONS.len() as u16 + 2;
    let [quick_area, recent_area] =
        Layout::vertical([Constraint::Length(quick_height), Constraint::Min(0)]).areas(area);

    let highlight = Style::default().bg(palette.accent).fg(Color::White).add_modifier(Modifier::BOLD);

    let quick_focused = app.qa_focus == QaFocus::QuickQuestions;
    let quick_items: Vec<ListItem> = QUICK_QUESTIONS.iter().map(|q| ListItem::new(format!(" {} ", q))).collect();
    let mut quick = List::new(quick_items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if quick_focused { palette.focus } else { palette.border }))
            .title(" 快捷问题 "),
    );
    if quick_focused {
        quick = quick.highlight_style(highlight).highlight_symbol("> ");
    }
    frame.render_stateful_widget(quick, quick_area, &mut app.quick_state);

    let recent_focused = app.qa_focus == QaFocus::Recent;
    let recent_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if recent_focused { palette.focus } else { palette.border }))
        .title(" 最近问题 ");

    if app.recent.is_empty() {
        let placeholder = Paragraph::new(" 暂无历史问题")
            .style(Style::default().fg(palette.muted))
            .block(recent_block);
        frame.render_widget(placeholder, recent_area);
        return;
    }

    let recent_items: Vec<ListItem> = app.recent.iter().map(|q| ListItem::new(format!(" {} ", q))).collect();
    let mut recent = List::new(recent_items).block(recent_block);
    if recent_focused {
        recent = recent.highlight_style(highlight).highlight_symbol("> ");
    }
    frame.render_stateful_widget(recent, recent_area, &mut app.recent_state);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .title(" AI问答 ");

    if app.chat.is_empty() && !app.is_replying() {
        let welcome = Text::from(vec![
            Line::from(Span::styled("您好！我是CANN助手", Style::default().fg(palette.accent).bold())),
            Line::default(),
            Line::from(Span::styled(
                "可以询问安装部署、Ascend C API、算子精度调试、性能优化等问题。",
                Style::default().fg(palette.muted),
            )),
            Line::from(Span::styled(
                "按 i 开始输入，或按 Tab 从左侧选择快捷问题。",
                Style::default().fg(palette.muted),
            )),
        ]);
        frame.render_widget(Paragraph::new(welcome).block(chat_block).wrap(Wrap { trim: false }), area);
        return;
    }

    // Keep in step with App::chat_line_count
    let mut lines: Vec<Line> = Vec::new();
    for msg in app.chat.messages() {
        let time = msg.timestamp.format("%H:%M:%S").to_string();
        match msg.role {
            ChatRole::User => {
                lines.push(Line::from(vec![
                    Span::styled("您", Style::default().fg(palette.user).add_modifier(Modifier::BOLD)),
                    Span::styled(format!(" · {}", time), Style::default().fg(palette.muted)),
                ]));
                for line in msg.content.lines() {
                    lines.push(Line::from(line.to_string()));
                }
            }
            ChatRole::Assistant => {
                let topic = msg.topic.map(|t| t.label()).unwrap_or("通用");
                lines.push(Line::from(vec![
                    Span::styled("CANN助手", Style::default().fg(palette.assistant).add_modifier(Modifier::BOLD)),
                    Span::styled(format!(" · {} · {}", topic, time), Style::default().fg(palette.muted)),
                ]));

                let mut in_code = false;
                let mut highlighter = Highlighter::new();
                for line in msg.content.lines() {
                    if line.trim_start().starts_with("```") {
                        in_code = !in_code;
                        highlighter = Highlighter::new();
                        lines.push(Line::from(Span::styled(line.to_string(), Style::default().fg(palette.muted))));
                    } else if in_code {
                        lines.push(Line::from(highlighted_line(&mut highlighter, line, palette)));
                    } else {
                        lines.push(parse_markdown_line(line, palette));
                    }
                }

                if !msg.sources.is_empty() {
                    let refs: Vec<String> = msg.sources.iter().map(|s| format!("{} ({})", s.title, s.url)).collect();
                    lines.push(Line::from(vec![
                        Span::styled("参考资料: ", Style::default().fg(palette.accent)),
                        Span::styled(refs.join("，"), Style::default().fg(palette.muted)),
                    ]));
                }
            }
        }
        lines.push(Line::default());
    }

    if app.is_replying() {
        lines.push(Line::from(Span::styled(
            "CANN助手",
            Style::default().fg(palette.assistant).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("CANN助手正在思考{}", dots),
            Style::default().fg(palette.muted).add_modifier(Modifier::ITALIC),
        )));
    }

    let total_lines = app.chat_line_count();
    let chat = Paragraph::new(lines)
        .block(chat_block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, area);

    if total_lines > app.chat_height {
        render_scrollbar(frame, area, total_lines as usize, app.chat_scroll as usize);
    }
}

fn render_qa_input(app: &App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let editing = app.input_mode == InputMode::Editing;
    let input_focused = app.qa_focus == QaFocus::Input;
    let border_color = if editing { Color::Yellow } else if input_focused { palette.focus } else { palette.border };

    let title = if app.is_replying() { " 提问 (等待回答中) " } else { " 提问 (i 输入, Enter 发送) " };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scroll keeps the cursor visible
    let inner_width = area.width.saturating_sub(2);
    let before_cursor: String = app.qa_input.chars().take(app.qa_cursor).collect();
    let mut skip = 0;
    while skip < app.qa_cursor
        && display_width(&before_cursor.chars().skip(skip).collect::<String>()) >= inner_width
    {
        skip += 1;
    }

    let input = if app.qa_input.is_empty() && !editing {
        Paragraph::new("请输入您的问题...").style(Style::default().fg(palette.muted))
    } else {
        let visible: String = app.qa_input.chars().skip(skip).collect();
        Paragraph::new(visible).style(Style::default().fg(palette.user))
    };
    frame.render_widget(input.block(input_block), area);

    if editing {
        let cursor_x = display_width(&before_cursor.chars().skip(skip).collect::<String>());
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_operator_screen(app: &mut App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let [form_area, code_area] =
        Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)]).areas(area);

    render_form(app, frame, form_area, palette);

    app.code_area = Some(code_area);
    app.code_height = code_area.height.saturating_sub(2);
    render_code(app, frame, code_area, palette);
}

fn render_form(app: &App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .title(" 算子配置 ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut constraints: Vec<Constraint> = FormField::all().iter().map(|_| Constraint::Length(3)).collect();
    constraints.push(Constraint::Min(0));
    let rows = Layout::vertical(constraints).split(inner);

    for (field, row) in FormField::all().iter().zip(rows.iter()) {
        let selected = *field == app.form_field;
        let editing = selected && app.input_mode == InputMode::Editing;
        let border_color = if editing {
            Color::Yellow
        } else if selected {
            palette.focus
        } else {
            palette.border
        };

        let title = if field.is_text() {
            format!(" {} ", field.label())
        } else {
            format!(" {} ◀ ▶ ", field.label())
        };
        let field_block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(title);

        let value = app.form_value(*field);
        let paragraph = if value.is_empty() && !editing {
            Paragraph::new(field.placeholder()).style(Style::default().fg(palette.muted))
        } else {
            Paragraph::new(value.clone()).style(Style::default().fg(palette.text))
        };
        frame.render_widget(paragraph.block(field_block), *row);

        if editing {
            let before: String = value.chars().take(app.form_cursor).collect();
            let cursor_x = display_width(&before).min(row.width.saturating_sub(3));
            frame.set_cursor_position((row.x + cursor_x + 1, row.y + 1));
        }
    }

    let info_area = rows[rows.len() - 1];
    let mut info = vec![
        Line::from(vec![
            Span::styled("类型说明: ", Style::default().fg(palette.accent)),
            Span::styled(app.form.category.description(), Style::default().fg(palette.muted)),
        ]),
        Line::from(vec![
            Span::styled("代码模板: ", Style::default().fg(palette.accent)),
            Span::styled(app.template_kind.display_name(), Style::default().fg(palette.text)),
            Span::styled(" (T 切换)", Style::default().fg(palette.muted)),
        ]),
        Line::default(),
    ];
    if app.is_generating() {
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        info.push(Line::from(Span::styled(
            format!("正在生成代码{}", dots),
            Style::default().fg(palette.assistant).add_modifier(Modifier::ITALIC),
        )));
    } else {
        info.push(Line::from(Span::styled(
            "按 g 生成代码，按 p 加载示例模板",
            Style::default().fg(palette.muted),
        )));
    }
    frame.render_widget(Paragraph::new(info).wrap(Wrap { trim: true }), info_area);
}

fn render_code(app: &App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let Some(code) = &app.generated else {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border))
            .title(" 生成的代码 ");

        let mut lines = vec![
            Line::from(Span::styled(
                if app.is_generating() { "正在生成代码，请稍候..." } else { "填写左侧配置后按 g 生成代码" },
                Style::default().fg(palette.muted),
            )),
            Line::default(),
            Line::from(Span::styled("使用说明", Style::default().fg(palette.accent).bold())),
        ];
        lines.extend(USAGE_NOTES.iter().map(|note| {
            Line::from(Span::styled(format!("  • {}", note), Style::default().fg(palette.muted)))
        }));
        frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
        return;
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.focus))
        .title(format!(" {} · {} ", code.file_name, code.language_label));

    let total = code.source.lines().count();
    let gutter = total.to_string().len();
    let mut highlighter = Highlighter::new();
    let lines: Vec<Line> = code
        .source
        .lines()
        .enumerate()
        .map(|(i, line)| {
            let mut spans = vec![Span::styled(
                format!("{:>width$} ", i + 1, width = gutter),
                Style::default().fg(palette.muted),
            )];
            spans.extend(highlighted_line(&mut highlighter, line, palette));
            Line::from(spans)
        })
        .collect();

    let paragraph = Paragraph::new(lines).block(block).scroll((app.code_scroll, 0));
    frame.render_widget(paragraph, area);

    if total > app.code_height as usize {
        render_scrollbar(frame, area, total, app.code_scroll as usize);
    }
}

fn render_scrollbar(frame: &mut Frame, area: Rect, total: usize, position: usize) {
    let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
        .begin_symbol(Some("^"))
        .end_symbol(Some("v"));

    let mut scrollbar_state = ScrollbarState::new(total).position(position);

    frame.render_stateful_widget(
        scrollbar,
        area.inner(Margin {
            vertical: 1,
            horizontal: 0,
        }),
        &mut scrollbar_state,
    );
}

fn render_toast(message: &str, frame: &mut Frame, area: Rect, palette: &Palette) {
    let width = (display_width(message) + 4).min(area.width);
    let height = 3.min(area.height);
    let toast_area = Rect::new(
        area.x + area.width.saturating_sub(width + 1),
        area.y + area.height.saturating_sub(height),
        width,
        height,
    );

    frame.render_widget(Clear, toast_area);
    let toast = Paragraph::new(message.to_string())
        .style(Style::default().fg(palette.text).bg(palette.bg))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.accent)),
        );
    frame.render_widget(toast, toast_area);
}

fn render_alert(title: &str, message: &str, frame: &mut Frame, area: Rect, palette: &Palette) {
    // Calculate popup size and position (centered)
    let popup_width = (display_width(message) + 6).max(30).min(area.width.saturating_sub(4));
    let popup_height = 5.min(area.height);

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(format!(" {} ", title));

    let text = Text::from(vec![
        Line::from(Span::styled(message.to_string(), Style::default().fg(palette.text).bold())).centered(),
        Line::default(),
        Line::from(Span::styled("按任意键关闭", Style::default().fg(palette.muted))).centered(),
    ]);

    frame.render_widget(
        Paragraph::new(text)
            .style(Style::default().bg(palette.bg))
            .block(block)
            .wrap(Wrap { trim: true }),
        popup_area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_markdown_bold_and_code() {
        let palette = Palette::for_theme(Theme::Dark);
        let line = parse_markdown_line("运行 `npu-smi info` 查看 **设备**", &palette);
        let texts: Vec<&str> = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(texts, vec!["运行 ", "npu-smi info", " 查看 ", "设备"]);
    }

    #[test]
    fn test_parse_markdown_unclosed_is_literal() {
        let palette = Palette::for_theme(Theme::Light);
        let line = parse_markdown_line("**未闭合", &palette);
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "**未闭合");
    }

    #[test]
    fn test_heading_strips_hashes() {
        let palette = Palette::for_theme(Theme::Light);
        let line = parse_markdown_line("## 安装步骤", &palette);
        assert_eq!(line.spans[0].content, "安装步骤");
    }

    #[test]
    fn test_display_width() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("昇腾"), 4);
        assert_eq!(display_width("• ◀ ▶ ·"), 7);
    }
}
