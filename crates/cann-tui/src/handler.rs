use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, FormField, InputMode, QaFocus, Screen};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Apply a cursor-movement or insert/delete key to a single-line text buffer.
/// Returns false when the key is not a text-editing key.
fn edit_text(text: &mut String, cursor: &mut usize, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Backspace => {
            if *cursor > 0 {
                *cursor -= 1;
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            if *cursor < text.chars().count() {
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        }
        KeyCode::Left => *cursor = cursor.saturating_sub(1),
        KeyCode::Right => *cursor = (*cursor + 1).min(text.chars().count()),
        KeyCode::Home => *cursor = 0,
        KeyCode::End => *cursor = text.chars().count(),
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            text.clear();
            *cursor = 0;
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(text, *cursor);
            text.insert(byte_pos, c);
            *cursor += 1;
        }
        _ => return false,
    }
    true
}

fn insert_str(text: &mut String, cursor: &mut usize, pasted: &str) {
    let clean: String = pasted.chars().filter(|c| *c != '\n' && *c != '\r').collect();
    let byte_pos = char_to_byte_index(text, *cursor);
    text.insert_str(byte_pos, &clean);
    *cursor += clean.chars().count();
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key)?,
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Paste(text) => handle_paste(app, &text),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick(),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) -> Result<()> {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.request_quit();
        return Ok(());
    }

    // Alerts swallow the key that dismisses them
    if app.alert.is_some() {
        app.alert = None;
        return Ok(());
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key)?,
        InputMode::Editing => handle_editing_mode(app, key),
    }

    Ok(())
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) -> Result<()> {
    match key.code {
        KeyCode::Char('q') => {
            app.request_quit();
            return Ok(());
        }
        KeyCode::Char('1') => {
            app.switch_screen(Screen::Home);
            return Ok(());
        }
        KeyCode::Char('2') => {
            app.switch_screen(Screen::Qa);
            return Ok(());
        }
        KeyCode::Char('3') => {
            app.switch_screen(Screen::OperatorDev);
            return Ok(());
        }
        KeyCode::Char('t') => {
            app.toggle_theme();
            return Ok(());
        }
        _ => {}
    }

    match app.screen {
        Screen::Home => handle_home_normal(app, key),
        Screen::Qa => handle_qa_normal(app, key)?,
        Screen::OperatorDev => handle_operator_normal(app, key)?,
    }
    Ok(())
}

fn handle_home_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('a') | KeyCode::Enter => app.switch_screen(Screen::Qa),
        KeyCode::Char('o') => app.switch_screen(Screen::OperatorDev),
        _ => {}
    }
}

fn handle_qa_normal(app: &mut App, key: KeyEvent) -> Result<()> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let half_page = (app.chat_height / 2).max(1) as i32;

    match key.code {
        KeyCode::Tab => app.cycle_qa_focus(),
        KeyCode::Char('i') => {
            app.qa_focus = QaFocus::Input;
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Enter => {
            if app.qa_focus == QaFocus::Input {
                app.input_mode = InputMode::Editing;
            } else {
                app.insert_selected_question();
            }
        }

        // Chat scrolling
        KeyCode::Char('d') if ctrl => app.scroll_chat(half_page),
        KeyCode::Char('u') if ctrl => app.scroll_chat(-half_page),
        KeyCode::PageDown => app.scroll_chat(half_page),
        KeyCode::PageUp => app.scroll_chat(-half_page),
        KeyCode::Char('G') => app.scroll_chat_to_bottom(),

        KeyCode::Char('j') | KeyCode::Down => {
            if app.qa_focus == QaFocus::Input {
                app.scroll_chat(1);
            } else {
                app.qa_list_down();
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            if app.qa_focus == QaFocus::Input {
                app.scroll_chat(-1);
            } else {
                app.qa_list_up();
            }
        }

        KeyCode::Char('c') => app.copy_last_reply(),
        KeyCode::Char('y') => app.feedback(true),
        KeyCode::Char('n') => app.feedback(false),
        KeyCode::Char('e') => app.export_chat()?,
        KeyCode::Esc => app.switch_screen(Screen::Home),
        _ => {}
    }
    Ok(())
}

fn handle_operator_normal(app: &mut App, key: KeyEvent) -> Result<()> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let half_page = (app.code_height / 2).max(1) as i32;

    match key.code {
        KeyCode::Char('j') | KeyCode::Down | KeyCode::Tab => app.form_field = app.form_field.next(),
        KeyCode::Char('k') | KeyCode::Up | KeyCode::BackTab => app.form_field = app.form_field.prev(),
        KeyCode::Char('h') | KeyCode::Left => app.cycle_field_value(false),
        KeyCode::Char('l') | KeyCode::Right => app.cycle_field_value(true),
        KeyCode::Char('i') | KeyCode::Enter => {
            if app.form_field.is_text() {
                app.begin_field_edit();
            } else {
                app.cycle_field_value(true);
            }
        }

        KeyCode::Char('g') => app.generate_code(),
        KeyCode::Char('c') => app.copy_code(),
        KeyCode::Char('s') => app.download_code()?,
        KeyCode::Char('T') => app.toggle_template(),
        KeyCode::Char('p') => app.load_next_preset(),

        // Code panel scrolling
        KeyCode::Char('d') if ctrl => app.scroll_code(half_page),
        KeyCode::Char('u') if ctrl => app.scroll_code(-half_page),
        KeyCode::PageDown => app.scroll_code(half_page),
        KeyCode::PageUp => app.scroll_code(-half_page),

        KeyCode::Esc => app.switch_screen(Screen::Home),
        _ => {}
    }
    Ok(())
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match app.screen {
        Screen::Qa => handle_qa_editing(app, key),
        Screen::OperatorDev => handle_operator_editing(app, key),
        Screen::Home => app.input_mode = InputMode::Normal,
    }
}

fn handle_qa_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => app.submit_question(),
        _ => {
            if edit_text(&mut app.qa_input, &mut app.qa_cursor, key) {
                app.quit_armed = false;
            }
        }
    }
}

fn handle_operator_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter | KeyCode::Tab => {
            // Commit and move on; the next text field keeps editing
            app.input_mode = InputMode::Normal;
            app.form_field = app.form_field.next();
            if key.code == KeyCode::Tab && app.form_field.is_text() {
                app.begin_field_edit();
            }
        }
        _ => {
            let mut cursor = app.form_cursor;
            if let Some(text) = app.form_text_mut() {
                edit_text(text, &mut cursor, key);
            }
            app.form_cursor = cursor;
        }
    }
}

fn handle_paste(app: &mut App, pasted: &str) {
    if app.input_mode != InputMode::Editing {
        return;
    }
    match app.screen {
        Screen::Qa => insert_str(&mut app.qa_input, &mut app.qa_cursor, pasted),
        Screen::OperatorDev => {
            let mut cursor = app.form_cursor;
            if let Some(text) = app.form_text_mut() {
                insert_str(text, &mut cursor, pasted);
            }
            app.form_cursor = cursor;
        }
        Screen::Home => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    let in_chat = app.chat_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_code = app.code_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    let delta = match mouse.kind {
        MouseEventKind::ScrollDown => 3,
        MouseEventKind::ScrollUp => -3,
        _ => return,
    };

    match app.screen {
        Screen::Qa if in_chat => app.scroll_chat(delta),
        Screen::OperatorDev if in_code => app.scroll_code(delta),
        _ => {}
    }
}
