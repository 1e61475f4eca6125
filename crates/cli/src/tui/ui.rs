//! Rendering

use super::{
    app::{App, Field, Focus, Tab},
    highlight::highlight,
};
use ethers::utils::format_ether;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame,
};
use sneko_core::{Language, Severity};

const ACCENT: Color = Color::Yellow;

const BINDINGS: &[(&str, &str)] = &[
    ("f", "Toggle Files"),
    ("e", "Collapse Editor"),
    ("tab", "Focus"),
    ("1/2", "Tabs"),
    ("c", "Compile"),
    ("d", "Deploy"),
    ("s", "Script"),
    ("a", "Ape Project"),
    ("^p", "Copy Code"),
    ("y/b", "Copy ABI/Bytecode"),
    ("q", "Quit"),
];

pub fn draw(f: &mut Frame, app: &App) {
    let editor = if app.editor_collapsed {
        Constraint::Length(1)
    } else {
        Constraint::Percentage(45)
    };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            editor,
            Constraint::Min(8),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_header(f, app, rows[0]);
    draw_editor(f, app, rows[1]);
    draw_tabs(f, app, rows[2]);
    draw_notification(f, app, rows[3]);
    draw_footer(f, rows[4]);
}

fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(ACCENT)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let file = app
        .session
        .active_file()
        .map(|file| file.path.display().to_string())
        .unwrap_or_else(|| app.tree.root().display().to_string());
    let header = Line::from(vec![
        Span::styled(
            format!(" sneko v{} ", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Black).bg(ACCENT),
        ),
        Span::raw(format!(" {file}")),
    ]);
    f.render_widget(Paragraph::new(header), area);
}

fn draw_editor(f: &mut Frame, app: &App, area: Rect) {
    if app.editor_collapsed {
        let line = Paragraph::new("▶ Editor (e to expand)").style(Style::default().fg(Color::Gray));
        f.render_widget(line, area);
        return;
    }

    let code_area = if app.show_tree {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
            .split(area);
        draw_tree(f, app, columns[0]);
        columns[1]
    } else {
        area
    };
    draw_code(f, app, code_area);
}

fn draw_tree(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .tree
        .visible()
        .iter()
        .map(|entry| {
            let icon = match (entry.is_dir, app.tree.is_expanded(&entry.path)) {
                (true, true) => "▼ ",
                (true, false) => "▶ ",
                (false, _) => "  ",
            };
            let style = match entry.path.extension().and_then(|e| e.to_str()) {
                Some(ext) if Language::from_extension(ext).is_some() => Style::default(),
                _ if entry.is_dir => Style::default().add_modifier(Modifier::BOLD),
                _ => Style::default().fg(Color::DarkGray),
            };
            ListItem::new(format!("{}{icon}{}", "  ".repeat(entry.depth), entry.name)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Files")
                .border_style(border_style(app.focus == Focus::Tree)),
        )
        .highlight_style(Style::default().bg(ACCENT).fg(Color::Black));

    let mut state = ListState::default();
    state.select(Some(app.tree.cursor()));
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_code(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Editor;
    let Some(file) = app.session.active_file() else {
        let empty = Paragraph::new("Select a contract in the file tree")
            .style(Style::default().fg(Color::Gray))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Code")
                    .border_style(border_style(focused)),
            );
        f.render_widget(empty, area);
        return;
    };

    let buffer = &file.buffer;
    let mut title = file.name.clone();
    if buffer.is_read_only() {
        title.push_str(" [read-only]");
    } else if buffer.is_modified() {
        title.push_str(" [modified]");
    }

    let gutter = buffer.lines().len().to_string().len();
    let height = area.height.saturating_sub(2) as usize;
    let (row, col) = buffer.cursor();
    let offset = row.saturating_sub(height.saturating_sub(1));

    let lines: Vec<Line> = highlight(buffer.lines(), file.language)
        .into_iter()
        .enumerate()
        .skip(offset)
        .take(height)
        .map(|(i, spans)| {
            let mut line = vec![Span::styled(
                format!("{:>gutter$} ", i + 1),
                Style::default().fg(Color::DarkGray),
            )];
            line.extend(spans);
            Line::from(line)
        })
        .collect();

    let code = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(border_style(focused)),
    );
    f.render_widget(code, area);

    if focused {
        let x = area.x + 1 + (gutter + 1 + col) as u16;
        let y = area.y + 1 + (row - offset) as u16;
        f.set_cursor_position((x.min(area.right().saturating_sub(2)), y));
    }
}

fn draw_tabs(f: &mut Frame, app: &App, area: Rect) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let selected = match app.tab {
        Tab::Compile => 0,
        Tab::Playground => 1,
    };
    let tabs = Tabs::new(vec!["Compile (1)", "Playground (2)"])
        .select(selected)
        .highlight_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, parts[0]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app.focus == Focus::Panel));
    match app.tab {
        Tab::Compile => draw_compile_tab(f, app, parts[1], block),
        Tab::Playground => draw_playground_tab(f, app, parts[1], block),
    }
}

fn button(label: &str, enabled: bool, selected: bool) -> Span<'static> {
    let style = match (enabled, selected) {
        (_, true) => Style::default().bg(ACCENT).fg(Color::Black),
        (true, false) => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        (false, false) => Style::default().fg(Color::DarkGray),
    };
    Span::styled(format!("[ {label} ]"), style)
}

fn dim(text: impl Into<String>) -> Span<'static> {
    Span::styled(text.into(), Style::default().fg(Color::DarkGray))
}

fn draw_compile_tab(f: &mut Frame, app: &App, area: Rect, block: Block) {
    let session = &app.session;
    let compiled = session.can_deploy();

    let label = session
        .compiler_label()
        .unwrap_or("Compiler version ~")
        .to_string();
    let abi = if compiled {
        Span::raw(session.abi_view().to_string())
    } else {
        dim("ABI ~")
    };
    let bytecode = match session.artifact() {
        Some(artifact) => Span::raw(format!(
            "({} bytes) {}",
            artifact.bytecode_len(),
            artifact.bytecode
        )),
        None => dim("Deployment bytecode ~"),
    };

    let lines = vec![
        Line::from(vec![
            button("Compile (c)", session.can_compile(), false),
            Span::raw(" "),
            dim(label),
        ]),
        Line::from(vec![button("Copy ABI (y)", compiled, false), Span::raw(" "), abi]),
        Line::from(vec![
            button("Copy Bytecode (b)", compiled, false),
            Span::raw(" "),
            bytecode,
        ]),
        Line::from(vec![
            button("Generate Script (s)", compiled, false),
            Span::raw(" "),
            button("Generate Ape Project (a)", compiled, false),
        ]),
    ];

    let block = block.title("Compile");
    let inner = block.inner(area);
    f.render_widget(block, area);
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(inner);
    f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }),
        parts[0],
    );

    let output = if let Some(diagnostics) = session.diagnostics() {
        let text: Vec<Line> = diagnostics
            .lines()
            .map(|l| Line::styled(l.to_string(), Style::default().fg(Color::Red)))
            .collect();
        Paragraph::new(text).block(
            Block::default()
                .borders(Borders::TOP)
                .title("Compiler output (PgUp/PgDn to scroll)"),
        )
    } else if compiled {
        let text: Vec<Line> = session
            .interface_view()
            .lines()
            .map(|l| Line::from(l.to_string()))
            .collect();
        Paragraph::new(text).block(Block::default().borders(Borders::TOP).title("Interface"))
    } else {
        return;
    };
    f.render_widget(
        output
            .wrap(Wrap { trim: false })
            .scroll((app.compile_scroll, 0)),
        parts[1],
    );
}

fn input(text: &str, placeholder: &str, selected: bool) -> Span<'static> {
    let style = if selected {
        Style::default().add_modifier(Modifier::UNDERLINED).fg(ACCENT)
    } else {
        Style::default()
    };
    if text.is_empty() {
        Span::styled(format!("{placeholder} "), style.fg(Color::DarkGray))
    } else {
        Span::styled(format!("{text} "), style)
    }
}

fn draw_playground_tab(f: &mut Frame, app: &App, area: Rect, block: Block) {
    let session = &app.session;
    let current = app.current_field();
    let is = |field: Field| current == Some(field);

    let mut lines = Vec::new();
    let mut cursor_line = 0;

    lines.push(Line::from(vec![
        dim("Network: "),
        Span::raw(app.network_name().unwrap_or("(not connected)").to_string()),
    ]));

    let account = match session.active_account() {
        Some(account) => format!(
            "< {}/{}  {:?}  {} ETH >",
            session.active_account_index() + 1,
            session.accounts().len(),
            account.address,
            account.balance_ether()
        ),
        None => "(no accounts)".to_string(),
    };
    if is(Field::Account) {
        cursor_line = lines.len();
    }
    lines.push(Line::from(vec![
        dim("Account: "),
        input(&account, "", is(Field::Account)),
    ]));

    if is(Field::Constructor) {
        cursor_line = lines.len();
    }
    lines.push(Line::from(vec![
        dim("Constructor: "),
        input(
            &session.constructor_args,
            &session.constructor_placeholder(),
            is(Field::Constructor),
        ),
    ]));

    if is(Field::Deploy) {
        cursor_line = lines.len();
    }
    lines.push(Line::from(vec![button(
        "Deploy (d)",
        session.can_deploy(),
        is(Field::Deploy),
    )]));

    match (session.deployed_address(), session.contract_balance()) {
        (Some(address), balance) => lines.push(Line::from(vec![
            dim("Deployed at: "),
            Span::raw(format!("{address:?}")),
            dim("  Balance: "),
            Span::raw(balance.map(|b| format!("{} ETH", format_ether(b))).unwrap_or_default()),
        ])),
        (None, _) => lines.push(Line::from(dim("No contract deployed"))),
    }

    for control in session.controls() {
        lines.push(Line::from(""));
        if is(Field::Invoke(control.id)) {
            cursor_line = lines.len();
        }
        let mut spans = vec![button(
            &control.label(),
            true,
            is(Field::Invoke(control.id)),
        )];
        if control.class.is_payable() {
            spans.push(dim(" payable"));
        } else if !control.class.is_transaction() {
            spans.push(dim(" view"));
        }
        if let Some(result) = session.result(control.id) {
            spans.push(Span::raw(format!("  → {result}")));
        }
        lines.push(Line::from(spans));

        if let Some(placeholder) = &control.args_placeholder {
            if is(Field::Args(control.id)) {
                cursor_line = lines.len();
            }
            lines.push(Line::from(vec![
                dim("    args: "),
                input(&control.args_input, placeholder, is(Field::Args(control.id))),
            ]));
        }
        if control.has_value_field {
            if is(Field::Value(control.id)) {
                cursor_line = lines.len();
            }
            lines.push(Line::from(vec![
                dim("    value: "),
                input(&control.value_input, "wei", is(Field::Value(control.id))),
            ]));
        }
    }

    let height = area.height.saturating_sub(2) as usize;
    let scroll = cursor_line.saturating_sub(height.saturating_sub(1));
    let panel = Paragraph::new(lines)
        .block(block.title("Playground"))
        .scroll((scroll as u16, 0));
    f.render_widget(panel, area);
}

fn draw_notification(f: &mut Frame, app: &App, area: Rect) {
    let Some(notification) = app.session.notifications().last() else {
        return;
    };
    let color = match notification.severity {
        Severity::Info => Color::Green,
        Severity::Warning => Color::Yellow,
        Severity::Error => Color::Red,
    };
    let text = notification.to_string();
    let mut first = text.lines().next().unwrap_or_default().to_string();
    if text.lines().nth(1).is_some() && app.session.diagnostics().is_some() {
        first.push_str("  (full output in the Compile tab)");
    }
    f.render_widget(
        Paragraph::new(first).style(Style::default().fg(color)),
        area,
    );
}

fn draw_footer(f: &mut Frame, area: Rect) {
    let spans: Vec<Span> = BINDINGS
        .iter()
        .flat_map(|(key, action)| {
            [
                Span::styled(format!(" {key} "), Style::default().fg(Color::Black).bg(Color::Gray)),
                Span::raw(format!(" {action} ")),
            ]
        })
        .collect();
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::{backend::TestBackend, Terminal};
    use sneko_core::Config;
    use std::fs;
    use tempfile::TempDir;

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn app() -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Greeter.sol"), "contract Greeter {}\n").unwrap();
        let config = Config::builder().contracts_dir(dir.path()).build().unwrap();
        let app = App::new(config, dir.path().to_path_buf()).unwrap();
        (dir, app)
    }

    #[test]
    fn test_initial_screen() {
        let (_dir, app) = app();
        let screen = render(&app);
        assert!(screen.contains("Greeter.sol"));
        assert!(screen.contains("Compile (1)"));
        assert!(screen.contains("Select a contract in the file tree"));
        assert!(screen.contains("Collapse Editor"));
    }

    #[test]
    fn test_playground_placeholder() {
        let (_dir, mut app) = app();
        app.tab = Tab::Playground;
        let screen = render(&app);
        assert!(screen.contains("(Compile contract first!)"));
        assert!(screen.contains("No contract deployed"));
    }

    #[test]
    fn test_compiler_output_is_shown_in_full() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Greeter.sol"), "contract Greeter {}\n").unwrap();
        let config = Config::builder()
            .contracts_dir(dir.path())
            .solc("sneko-test-missing-solc")
            .build()
            .unwrap();
        let mut app = App::new(config, dir.path().to_path_buf()).unwrap();
        app.on_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE));

        let screen = render(&app);
        assert!(screen.contains("Compiler output"));
        // the notification keeps only the first line
        assert!(screen.contains("(full output in the Compile tab)"));
        assert!(screen.contains("sneko-test-missing-solc: command not found"));
    }

    #[test]
    fn test_code_view_is_highlighted() {
        let (_dir, mut app) = app();
        app.on_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();
        let buffer = terminal.backend().buffer();
        let cells: Vec<_> = (0..buffer.area.height)
            .flat_map(|y| (0..buffer.area.width).map(move |x| (x, y)))
            .filter(|&(x, y)| buffer[(x, y)].symbol() == "c")
            .collect();
        // "contract" in the code pane is drawn as a keyword
        assert!(cells
            .iter()
            .any(|&(x, y)| buffer[(x, y)].fg == Color::Magenta));
    }
}
