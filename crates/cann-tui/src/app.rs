use std::time::{Duration, Instant};

use anyhow::Result;
use cann_core::error::Result as CoreResult;
use cann_core::export;
use cann_core::operator::PRESETS;
use cann_core::{
    render, select_response, ChatLog, ChatMessage, ChatRole, Config, GeneratedCode, OperatorPreset,
    OperatorSpec, RecentQuestions, Reply, TemplateKind, Theme, QUICK_QUESTIONS,
};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::task::JoinHandle;
use unicode_width::UnicodeWidthStr;

use crate::clipboard::copy_to_clipboard;

pub const GENERIC_ERROR_TOAST: &str = "发生了一个错误，请重试";
const TOAST_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Qa,
    OperatorDev,
}

impl Screen {
    pub fn title(&self) -> &'static str {
        match self {
            Screen::Home => "首页",
            Screen::Qa => "AI问答",
            Screen::OperatorDev => "算子开发",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QaFocus {
    Input,
    QuickQuestions,
    Recent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Category,
    Description,
    DataType,
    InputShape,
    OutputShape,
}

impl FormField {
    const ORDER: [FormField; 6] = [
        FormField::Name,
        FormField::Category,
        FormField::Description,
        FormField::DataType,
        FormField::InputShape,
        FormField::OutputShape,
    ];

    pub fn all() -> &'static [FormField] {
        &Self::ORDER
    }

    pub fn label(&self) -> &'static str {
        match self {
            FormField::Name => "算子名称",
            FormField::Category => "算子类型",
            FormField::Description => "功能描述",
            FormField::DataType => "数据类型",
            FormField::InputShape => "输入形状",
            FormField::OutputShape => "输出形状",
        }
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            FormField::Name => "例如: MyAddKernel",
            FormField::Description => "描述算子的具体功能...",
            FormField::InputShape | FormField::OutputShape => "例如: [1024, 512]",
            FormField::Category | FormField::DataType => "",
        }
    }

    /// Free-text fields enter editing mode; the others cycle through fixed values.
    pub fn is_text(&self) -> bool {
        !matches!(self, FormField::Category | FormField::DataType)
    }

    pub fn next(&self) -> Self {
        let idx = Self::ORDER.iter().position(|f| f == self).unwrap_or(0);
        Self::ORDER[(idx + 1) % Self::ORDER.len()]
    }

    pub fn prev(&self) -> Self {
        let idx = Self::ORDER.iter().position(|f| f == self).unwrap_or(0);
        Self::ORDER[(idx + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub expires_at: Instant,
}

/// Blocking dialog; any key dismisses it.
#[derive(Debug, Clone)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub quit_armed: bool,
    pub screen: Screen,
    pub input_mode: InputMode,
    pub config: Config,
    pub theme: Theme,

    // Q&A state
    pub chat: ChatLog,
    pub recent: RecentQuestions,
    pub qa_input: String,
    pub qa_cursor: usize, // cursor position in qa_input, in chars
    pub qa_focus: QaFocus,
    pub quick_state: ListState,
    pub recent_state: ListState,
    pub reply_task: Option<JoinHandle<Reply>>,
    pub chat_scroll: u16,
    pub chat_height: u16, // inner height of the chat panel
    pub chat_width: u16,  // inner width of the chat panel

    // Operator form state
    pub form: OperatorSpec,
    pub form_field: FormField,
    pub form_cursor: usize,
    pub template_kind: TemplateKind,
    pub preset_idx: Option<usize>,
    pub generated: Option<GeneratedCode>,
    pub generate_task: Option<JoinHandle<CoreResult<GeneratedCode>>>,
    pub code_scroll: u16,
    pub code_height: u16,

    // Chrome
    pub animation_frame: u8, // 0-2 for ellipsis animation
    pub toast: Option<Toast>,
    pub alert: Option<Alert>,

    // Panel areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub code_area: Option<Rect>,
}

impl App {
    pub fn new(config: Config) -> Self {
        let mut quick_state = ListState::default();
        quick_state.select(Some(0));

        Self {
            should_quit: false,
            quit_armed: false,
            screen: Screen::Home,
            input_mode: InputMode::Normal,
            theme: config.theme,
            template_kind: config.template,
            config,

            chat: ChatLog::new(),
            recent: RecentQuestions::new(),
            qa_input: String::new(),
            qa_cursor: 0,
            qa_focus: QaFocus::Input,
            quick_state,
            recent_state: ListState::default(),
            reply_task: None,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            form: OperatorSpec::default(),
            form_field: FormField::Name,
            form_cursor: 0,
            preset_idx: None,
            generated: None,
            generate_task: None,
            code_scroll: 0,
            code_height: 0,

            animation_frame: 0,
            toast: None,
            alert: None,

            chat_area: None,
            code_area: None,
        }
    }

    pub fn switch_screen(&mut self, screen: Screen) {
        self.screen = screen;
        self.input_mode = InputMode::Normal;
        self.quit_armed = false;
    }

    pub fn show_toast(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast {
            message: message.into(),
            expires_at: Instant::now() + TOAST_TTL,
        });
    }

    pub fn show_alert(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.alert = Some(Alert {
            title: title.into(),
            message: message.into(),
        });
    }

    pub fn is_replying(&self) -> bool {
        self.reply_task.is_some()
    }

    pub fn is_generating(&self) -> bool {
        self.generate_task.is_some()
    }

    /// Tick animation frame and expire toasts (called by Tick event)
    pub fn tick(&mut self) {
        if self.is_replying() || self.is_generating() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        if self.toast.as_ref().is_some_and(|t| Instant::now() >= t.expires_at) {
            self.toast = None;
        }
    }

    /// Ask to quit. Unsent text in the question box needs a second request.
    pub fn request_quit(&mut self) {
        if !self.qa_input.trim().is_empty() && !self.quit_armed {
            self.quit_armed = true;
            self.show_toast("输入框中还有未发送的内容，再按一次退出");
            return;
        }
        self.should_quit = true;
    }

    // Q&A actions

    pub fn submit_question(&mut self) {
        let question = self.qa_input.trim().to_string();
        if question.is_empty() || self.is_replying() {
            return;
        }

        self.chat.push(ChatMessage::user(question.clone()));
        self.recent.push(question.clone());
        self.qa_input.clear();
        self.qa_cursor = 0;
        self.quit_armed = false;

        // Scroll to bottom so the typing indicator is visible
        self.scroll_chat_to_bottom();

        let delay = Duration::from_millis(self.config.reply_delay_ms);
        self.reply_task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            select_response(&question)
        }));
    }

    /// Put a canned or recent question into the input box for editing.
    pub fn insert_question(&mut self, question: &str) {
        self.qa_input = question.to_string();
        self.qa_cursor = self.qa_input.chars().count();
        self.qa_focus = QaFocus::Input;
        self.input_mode = InputMode::Editing;
    }

    pub fn insert_selected_question(&mut self) {
        let question = match self.qa_focus {
            QaFocus::QuickQuestions => self
                .quick_state
                .selected()
                .and_then(|i| QUICK_QUESTIONS.get(i).copied())
                .map(str::to_string),
            QaFocus::Recent => self
                .recent_state
                .selected()
                .and_then(|i| self.recent.get(i))
                .map(str::to_string),
            QaFocus::Input => None,
        };
        if let Some(q) = question {
            self.insert_question(&q);
        }
    }

    pub fn cycle_qa_focus(&mut self) {
        self.qa_focus = match self.qa_focus {
            QaFocus::Input => QaFocus::QuickQuestions,
            QaFocus::QuickQuestions if !self.recent.is_empty() => {
                if self.recent_state.selected().is_none() {
                    self.recent_state.select(Some(0));
                }
                QaFocus::Recent
            }
            QaFocus::QuickQuestions | QaFocus::Recent => QaFocus::Input,
        };
    }

    pub fn qa_list_down(&mut self) {
        let (state, len) = match self.qa_focus {
            QaFocus::QuickQuestions => (&mut self.quick_state, QUICK_QUESTIONS.len()),
            QaFocus::Recent => (&mut self.recent_state, self.recent.len()),
            QaFocus::Input => return,
        };
        if len > 0 {
            let i = state.selected().unwrap_or(0);
            state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn qa_list_up(&mut self) {
        let state = match self.qa_focus {
            QaFocus::QuickQuestions => &mut self.quick_state,
            QaFocus::Recent => &mut self.recent_state,
            QaFocus::Input => return,
        };
        let i = state.selected().unwrap_or(0);
        state.select(Some(i.saturating_sub(1)));
    }

    pub fn copy_last_reply(&mut self) {
        let Some(text) = self.chat.last_assistant().map(|m| m.content.clone()) else {
            self.show_toast("还没有可复制的回答");
            return;
        };
        self.copy_text(&text, "回答已复制到剪贴板");
    }

    pub fn feedback(&mut self, helpful: bool) {
        let Some(msg) = self.chat.last_assistant() else {
            return;
        };
        let topic = msg.topic.map(|t| t.as_str()).unwrap_or("fallback");
        tracing::info!(
            "Feedback for reply at {}: {} (topic: {})",
            msg.timestamp.to_rfc3339(),
            if helpful { "like" } else { "dislike" },
            topic
        );
        self.show_toast(if helpful { "感谢您的反馈：有帮助" } else { "感谢您的反馈：没帮助" });
    }

    pub fn export_chat(&mut self) -> Result<()> {
        if self.chat.is_empty() {
            self.show_toast("聊天记录为空");
            return Ok(());
        }
        let path = export::write_chat_history(&self.config.output_dir(), &self.chat)?;
        self.show_toast(format!("聊天记录已导出到 {}", path.display()));
        Ok(())
    }

    pub fn scroll_chat_to_bottom(&mut self) {
        let total_lines = self.chat_line_count();
        let visible_height = if self.chat_height > 0 { self.chat_height } else { 20 };
        self.chat_scroll = total_lines.saturating_sub(visible_height);
    }

    /// Estimate rendered chat height, mirroring the layout in `ui::render_chat`.
    pub fn chat_line_count(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 { self.chat_width as usize } else { 50 };

        let mut total_lines: usize = 0;
        for msg in self.chat.messages() {
            total_lines += 1; // header line
            for line in msg.content.lines() {
                total_lines += wrapped_rows(line, wrap_width);
            }
            if msg.role == ChatRole::Assistant && !msg.sources.is_empty() {
                total_lines += 1;
            }
            total_lines += 1; // blank line after message
        }
        if self.is_replying() {
            total_lines += 2;
        }
        total_lines.min(u16::MAX as usize) as u16
    }

    pub fn scroll_chat(&mut self, delta: i32) {
        let max = self.chat_line_count();
        self.chat_scroll = (self.chat_scroll as i32 + delta).clamp(0, max as i32) as u16;
    }

    // Operator form actions

    pub fn form_text_mut(&mut self) -> Option<&mut String> {
        match self.form_field {
            FormField::Name => Some(&mut self.form.name),
            FormField::Description => Some(&mut self.form.description),
            FormField::InputShape => Some(&mut self.form.input_shape),
            FormField::OutputShape => Some(&mut self.form.output_shape),
            FormField::Category | FormField::DataType => None,
        }
    }

    pub fn form_value(&self, field: FormField) -> String {
        match field {
            FormField::Name => self.form.name.clone(),
            FormField::Category => self.form.category.label().to_string(),
            FormField::Description => self.form.description.clone(),
            FormField::DataType => self.form.data_type.as_str().to_string(),
            FormField::InputShape => self.form.input_shape.clone(),
            FormField::OutputShape => self.form.output_shape.clone(),
        }
    }

    pub fn begin_field_edit(&mut self) {
        if let Some(len) = self.form_text_mut().map(|t| t.chars().count()) {
            self.form_cursor = len;
            self.input_mode = InputMode::Editing;
        }
    }

    /// Left/right on an enum field.
    pub fn cycle_field_value(&mut self, forward: bool) {
        match self.form_field {
            FormField::Category => {
                self.form.category = if forward { self.form.category.next() } else { self.form.category.prev() };
            }
            FormField::DataType => {
                self.form.data_type = if forward { self.form.data_type.next() } else { self.form.data_type.prev() };
            }
            _ => {}
        }
    }

    pub fn load_next_preset(&mut self) {
        let idx = self.preset_idx.map(|i| (i + 1) % PRESETS.len()).unwrap_or(0);
        self.load_preset(PRESETS[idx].key);
    }

    pub fn load_preset(&mut self, key: &str) {
        let Some(preset) = OperatorPreset::find(key) else {
            return;
        };
        self.form = preset.to_spec();
        self.preset_idx = PRESETS.iter().position(|p| p.key == key);
        self.show_toast(format!("已加载 {} 模板", preset.name));
    }

    pub fn toggle_template(&mut self) {
        self.template_kind = self.template_kind.toggle();
        self.config.template = self.template_kind;
        if let Err(e) = Config::save_template(self.template_kind) {
            tracing::warn!("Failed to persist template choice: {}", e);
        }
        self.show_toast(format!("代码模板: {}", self.template_kind.display_name()));
    }

    /// Validate the form, then render after the simulated delay.
    ///
    /// Validation failures open an alert and leave any earlier output as is.
    pub fn generate_code(&mut self) {
        if self.is_generating() {
            return;
        }
        if let Err(e) = self.form.validate() {
            self.show_alert("提示", e.to_string());
            return;
        }

        let spec = self.form.clone();
        let kind = self.template_kind;
        let delay = Duration::from_millis(self.config.generate_delay_ms);
        tracing::info!(
            "Generating {} for {} ({}, {})",
            kind.display_name(),
            spec.name,
            spec.category.key(),
            spec.data_type.as_str()
        );

        self.generate_task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            render(kind, &spec)
        }));
    }

    pub fn copy_code(&mut self) {
        let Some(source) = self.generated.as_ref().map(|c| c.source.clone()) else {
            self.show_toast("请先生成代码");
            return;
        };
        self.copy_text(&source, "代码已复制到剪贴板");
    }

    pub fn download_code(&mut self) -> Result<()> {
        let Some(code) = self.generated.as_ref() else {
            self.show_toast("请先生成代码");
            return Ok(());
        };
        let path = export::write_code(&self.config.output_dir(), code)?;
        tracing::info!("Downloaded code to {}", path.display());
        let file_name = code.file_name.clone();
        self.show_toast(format!("代码已下载为 {}", file_name));
        Ok(())
    }

    pub fn scroll_code(&mut self, delta: i32) {
        let max = self
            .generated
            .as_ref()
            .map(|c| c.source.lines().count())
            .unwrap_or(0)
            .saturating_sub(self.code_height as usize) as i32;
        self.code_scroll = (self.code_scroll as i32 + delta).clamp(0, max.max(0)) as u16;
    }

    // Shared

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggle();
        self.config.theme = self.theme;
        if let Err(e) = Config::save_theme(self.theme) {
            tracing::warn!("Failed to persist theme: {}", e);
        }
    }

    fn copy_text(&mut self, text: &str, success: &str) {
        match copy_to_clipboard(text) {
            Ok(()) => self.show_toast(success),
            Err(e) => {
                // No recovery path; the failure only goes to the log
                tracing::warn!("复制失败: {}", e);
                self.show_toast("复制失败");
            }
        }
    }

    /// Collect finished background tasks.
    pub async fn poll_tasks(&mut self) -> Result<()> {
        if self.reply_task.as_ref().is_some_and(|t| t.is_finished()) {
            if let Some(task) = self.reply_task.take() {
                let reply = task.await?;
                tracing::info!(
                    "Reply selected: {}",
                    reply.topic.map(|t| t.as_str()).unwrap_or("fallback")
                );
                self.chat.push(ChatMessage::assistant(reply));
                self.scroll_chat_to_bottom();
            }
        }

        if self.generate_task.as_ref().is_some_and(|t| t.is_finished()) {
            if let Some(task) = self.generate_task.take() {
                match task.await? {
                    Ok(code) => {
                        self.code_scroll = 0;
                        self.show_toast(format!("已生成 {}", code.file_name));
                        self.generated = Some(code);
                    }
                    Err(e) if e.is_validation() => self.show_alert("提示", e.to_string()),
                    Err(e) => return Err(e.into()),
                }
            }
        }

        Ok(())
    }
}

/// Terminal rows taken by `line` when wrapped to `width` columns.
pub fn wrapped_rows(line: &str, width: usize) -> usize {
    let columns = line.width();
    if columns == 0 {
        1
    } else {
        columns.div_ceil(width.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cann_core::Topic;
    use tempfile::TempDir;

    fn test_app(dir: &TempDir) -> App {
        let mut config = Config::new();
        config.reply_delay_ms = 0;
        config.generate_delay_ms = 0;
        config.output_dir = Some(dir.path().to_path_buf());
        App::new(config)
    }

    async fn settle(app: &mut App) {
        for _ in 0..200 {
            app.poll_tasks().await.unwrap();
            if !app.is_replying() && !app.is_generating() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("background task did not finish");
    }

    #[tokio::test]
    async fn test_submit_appends_question_and_reply() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        app.insert_question("如何配置CANN开发环境？");
        app.submit_question();

        assert_eq!(app.chat.len(), 1);
        assert!(app.qa_input.is_empty());
        assert_eq!(app.recent.get(0), Some("如何配置CANN开发环境？"));

        settle(&mut app).await;
        assert_eq!(app.chat.len(), 2);
        assert_eq!(app.chat.last_assistant().unwrap().topic, Some(Topic::Installation));
    }

    #[tokio::test]
    async fn test_submit_ignored_while_pending_or_blank() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        app.qa_input = "   ".to_string();
        app.submit_question();
        assert!(app.chat.is_empty());

        app.config.reply_delay_ms = 10_000;
        app.qa_input = "first".to_string();
        app.submit_question();
        app.qa_input = "second".to_string();
        app.submit_question();

        assert_eq!(app.chat.len(), 1);
        assert_eq!(app.qa_input, "second");
        if let Some(task) = app.reply_task.take() {
            task.abort();
        }
    }

    #[tokio::test]
    async fn test_recent_list_capped_through_app() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        for i in 0..7 {
            app.qa_input = format!("q{}", i);
            app.submit_question();
            settle(&mut app).await;
        }
        assert_eq!(app.recent.len(), 5);
        assert_eq!(app.recent.get(0), Some("q6"));
        assert_eq!(app.chat.len(), 14);
    }

    #[tokio::test]
    async fn test_empty_name_keeps_previous_code() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        app.load_preset("conv2d");
        app.generate_code();
        settle(&mut app).await;
        let previous = app.generated.clone().unwrap();

        app.form.name.clear();
        app.generate_code();
        assert!(app.alert.is_some());
        assert!(!app.is_generating());
        assert_eq!(app.generated, Some(previous));
    }

    #[tokio::test]
    async fn test_download_writes_file() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        app.load_preset("matmul");
        app.generate_code();
        settle(&mut app).await;

        app.download_code().unwrap();
        let path = dir.path().join("MatMulOperator.cpp");
        let source = std::fs::read_to_string(path).unwrap();
        assert!(source.contains("class MatMulOperator"));
        assert!(app.toast.as_ref().unwrap().message.contains("MatMulOperator.cpp"));
    }

    #[tokio::test]
    async fn test_export_chat() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        app.qa_input = "性能".to_string();
        app.submit_question();
        settle(&mut app).await;

        app.export_chat().unwrap();
        assert!(dir.path().join(export::CHAT_HISTORY_FILE).exists());
    }

    #[test]
    fn test_quit_needs_confirmation_with_unsent_text() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        app.qa_input = "draft".to_string();

        app.request_quit();
        assert!(!app.should_quit);
        assert!(app.quit_armed);

        app.request_quit();
        assert!(app.should_quit);
    }

    // Sole user of the config env var in this crate's tests
    #[test]
    fn test_toggles_persist_to_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::env::set_var(cann_core::config::CONFIG_ENV, &path);

        let mut app = test_app(&dir);
        app.toggle_theme();
        app.toggle_template();

        let saved = Config::load_from(&path).unwrap();
        assert_eq!(saved.theme, Theme::Dark);
        assert_eq!(saved.template, TemplateKind::AscendKernel);
        assert_eq!(app.theme, Theme::Dark);

        // A file that fails to parse keeps its contents; the app still toggles
        std::fs::write(&path, "{ oops").unwrap();
        app.toggle_theme();
        assert_eq!(app.theme, Theme::Light);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ oops");

        std::env::remove_var(cann_core::config::CONFIG_ENV);
    }

    #[test]
    fn test_presets_cycle() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        for preset in PRESETS.iter().chain(PRESETS.first()) {
            app.load_next_preset();
            assert_eq!(app.form.name, preset.name);
        }
    }

    #[test]
    fn test_form_field_cycle() {
        assert_eq!(FormField::OutputShape.next(), FormField::Name);
        assert_eq!(FormField::Name.prev(), FormField::OutputShape);
        assert!(!FormField::DataType.is_text());
    }

    #[test]
    fn test_wrapped_rows_counts_wide_chars() {
        assert_eq!(wrapped_rows("", 10), 1);
        assert_eq!(wrapped_rows("abcdefghij", 10), 1);
        assert_eq!(wrapped_rows("abcdefghijk", 10), 2);
        assert_eq!(wrapped_rows("昇腾昇腾昇腾", 10), 2);
        // Narrow symbols stay one column
        assert_eq!(wrapped_rows("••••••••••", 10), 1);
    }
}
