use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph, Wrap},
};
use std::io::stdout;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{info, warn};

use crate::ai::{tailor_resume, AIProvider, TailorError};
use crate::app::{App, AppStatus, Field, SubmitOutcome, TailorRequest};
use crate::input::{display_name, expand_home, read_text_file, Edit};
use crate::models::TailoringResult;
use crate::report;

const TICK: Duration = Duration::from_millis(100);
const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];
const BENEFITS: [&str; 4] = [
    "Beat Applicant Tracking Systems (ATS)",
    "Tailor bullet points to job requirements",
    "Highlight high-impact keywords automatically",
    "Maintain a professional, polished tone",
];

enum WorkerEvent {
    Tailored(Result<TailoringResult, TailorError>),
    FileLoaded {
        file_name: String,
        result: Result<String>,
    },
}

#[derive(Debug, PartialEq)]
enum Command {
    None,
    Quit,
    Tailor(TailorRequest),
    LoadFile(PathBuf),
    SaveReport,
    CopyResume,
}

struct UiState {
    app: App,
    focus: Field,
    path_prompt: Option<String>,
    notice: Option<String>,
    scroll_offset: u16,
    tick: usize,
    model: String,
}

impl UiState {
    fn new(app: App, model: String) -> Self {
        Self {
            app,
            focus: Field::Resume,
            path_prompt: None,
            notice: None,
            scroll_offset: 0,
            tick: 0,
            model,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Command {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')) {
            return Command::Quit;
        }

        if self.path_prompt.is_some() {
            return self.handle_prompt_key(key);
        }

        if self.app.status() == AppStatus::Result {
            return self.handle_result_key(key);
        }

        match key.code {
            KeyCode::Char('s') if ctrl => self.submit(),
            KeyCode::F(5) => self.submit(),
            KeyCode::Char('o') if ctrl => {
                self.path_prompt = Some(String::new());
                Command::None
            }
            KeyCode::Char('u') if ctrl => {
                self.app.edit(self.focus, Edit::Clear);
                Command::None
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = self.focus.toggle();
                Command::None
            }
            KeyCode::Esc => Command::Quit,
            KeyCode::Enter => {
                self.app.edit(self.focus, Edit::Newline);
                Command::None
            }
            KeyCode::Backspace => {
                self.app.edit(self.focus, Edit::Backspace);
                Command::None
            }
            KeyCode::Char(c) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                self.app.edit(self.focus, Edit::Insert(c));
                Command::None
            }
            _ => Command::None,
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) -> Command {
        let Some(buffer) = self.path_prompt.as_mut() else {
            return Command::None;
        };
        match key.code {
            KeyCode::Esc => {
                self.path_prompt = None;
                Command::None
            }
            KeyCode::Enter => {
                let raw = buffer.trim().to_string();
                self.path_prompt = None;
                if raw.is_empty() {
                    return Command::None;
                }
                if !self.app.begin_file_load() {
                    self.notice = Some("A file is already loading".to_string());
                    return Command::None;
                }
                self.notice = Some("Loading file...".to_string());
                Command::LoadFile(expand_home(&raw))
            }
            KeyCode::Backspace => {
                buffer.pop();
                Command::None
            }
            KeyCode::Char(c) => {
                buffer.push(c);
                Command::None
            }
            _ => Command::None,
        }
    }

    fn handle_result_key(&mut self, key: KeyEvent) -> Command {
        match key.code {
            KeyCode::Char('q') => Command::Quit,
            KeyCode::Char('b') | KeyCode::Esc | KeyCode::Backspace => {
                self.app.reset();
                self.scroll_offset = 0;
                self.notice = None;
                Command::None
            }
            KeyCode::Char('s') => Command::SaveReport,
            KeyCode::Char('c') => Command::CopyResume,
            KeyCode::Down | KeyCode::Char('j') => {
                self.scroll_offset = self.scroll_offset.saturating_add(1);
                Command::None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
                Command::None
            }
            KeyCode::PageDown | KeyCode::Char('J') => {
                self.scroll_offset = self.scroll_offset.saturating_add(10);
                Command::None
            }
            KeyCode::PageUp | KeyCode::Char('K') => {
                self.scroll_offset = self.scroll_offset.saturating_sub(10);
                Command::None
            }
            _ => Command::None,
        }
    }

    fn handle_paste(&mut self, text: &str) {
        if let Some(buffer) = self.path_prompt.as_mut() {
            buffer.push_str(text.trim());
        } else {
            self.app.edit(self.focus, Edit::Paste(text));
        }
    }

    fn submit(&mut self) -> Command {
        match self.app.submit() {
            SubmitOutcome::Started(request) => {
                self.notice = None;
                Command::Tailor(request)
            }
            SubmitOutcome::Invalid | SubmitOutcome::Busy => Command::None,
        }
    }

    fn apply(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Tailored(outcome) => {
                self.app.complete(outcome);
                self.scroll_offset = 0;
            }
            WorkerEvent::FileLoaded { file_name, result } => {
                match self.app.finish_file_load(file_name.clone(), result) {
                    Ok(()) => {
                        self.focus = Field::Resume;
                        self.notice = Some(format!("Loaded {}", file_name));
                    }
                    Err(e) => {
                        warn!("file load failed: {e:#}");
                        self.notice = Some(format!("{:#}", e));
                    }
                }
            }
        }
    }

    fn copy_resume<F>(&mut self, write: F)
    where
        F: FnOnce(&str) -> Result<()>,
    {
        let Some(result) = self.app.result() else {
            return;
        };
        match write(&result.tailored_resume) {
            Ok(()) => {
                info!(chars = result.tailored_resume.len(), "copied resume to clipboard");
                self.notice = Some("Copied to clipboard".to_string());
            }
            Err(e) => {
                warn!("clipboard copy failed: {e:#}");
                self.notice = Some(format!("{:#}", e));
            }
        }
    }

    fn save_report(&mut self, dir: &Path) {
        let Some(result) = self.app.result() else {
            return;
        };
        let path = report::default_report_path(dir, chrono::Local::now());
        match report::write_report(&path, result, self.app.job()) {
            Ok(()) => {
                info!(path = %path.display(), "saved report");
                self.notice = Some(format!("Saved to {}", path.display()));
            }
            Err(e) => {
                warn!("saving report failed: {e:#}");
                self.notice = Some(format!("{:#}", e));
            }
        }
    }
}

pub fn run(app: App, provider: Arc<dyn AIProvider>, runtime: &Handle) -> Result<()> {
    let mut state = UiState::new(app, provider.model_name().to_string());

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableBracketedPaste)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state, provider, runtime);

    // Restore terminal
    stdout().execute(DisableBracketedPaste)?;
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut UiState,
    provider: Arc<dyn AIProvider>,
    runtime: &Handle,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    // Held for the whole session: on X11 the copied text lives as long as its owner.
    let mut clipboard: Option<arboard::Clipboard> = None;

    loop {
        while let Ok(event) = rx.try_recv() {
            state.apply(event);
        }

        terminal.draw(|frame| draw(frame, state))?;
        state.tick = state.tick.wrapping_add(1);

        if !event::poll(TICK)? {
            continue;
        }

        let command = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => state.handle_key(key),
            Event::Paste(text) => {
                state.handle_paste(&text);
                Command::None
            }
            _ => Command::None,
        };

        match command {
            Command::None => {}
            Command::Quit => break,
            Command::Tailor(request) => {
                spawn_tailor(runtime, provider.clone(), request, tx.clone())
            }
            Command::LoadFile(path) => spawn_file_load(runtime, path, tx.clone()),
            Command::SaveReport => state.save_report(Path::new(".")),
            Command::CopyResume => state.copy_resume(|text| write_clipboard(&mut clipboard, text)),
        }
    }
    Ok(())
}

fn write_clipboard(clipboard: &mut Option<arboard::Clipboard>, text: &str) -> Result<()> {
    if clipboard.is_none() {
        *clipboard = Some(arboard::Clipboard::new().context("Clipboard unavailable")?);
    }
    if let Some(clipboard) = clipboard.as_mut() {
        clipboard
            .set_text(text.to_string())
            .context("Failed to copy to clipboard")?;
    }
    Ok(())
}

fn spawn_tailor(
    runtime: &Handle,
    provider: Arc<dyn AIProvider>,
    request: TailorRequest,
    tx: UnboundedSender<WorkerEvent>,
) {
    runtime.spawn(async move {
        let outcome = tailor_resume(provider.as_ref(), &request.resume, &request.job).await;
        let _ = tx.send(WorkerEvent::Tailored(outcome));
    });
}

fn spawn_file_load(runtime: &Handle, path: PathBuf, tx: UnboundedSender<WorkerEvent>) {
    runtime.spawn(async move {
        let result = read_text_file(&path).await;
        let _ = tx.send(WorkerEvent::FileLoaded {
            file_name: display_name(&path),
            result,
        });
    });
}

fn draw(frame: &mut Frame, state: &UiState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let header = Line::from(vec![
        Span::styled(
            " ResumeTailor AI ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  {}", state.model), Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(header), rows[0]);

    match state.app.result() {
        Some(result) if state.app.status() == AppStatus::Result => {
            draw_result(frame, rows[1], state, result)
        }
        _ => draw_editor(frame, rows[1], state),
    }

    let help = if state.path_prompt.is_some() {
        " Enter:load  Esc:cancel"
    } else if state.app.status() == AppStatus::Result {
        " b/Esc:back to editor  j/k:scroll  c:copy resume  s:save markdown  q:quit"
    } else {
        " Tab:switch field  Ctrl+S:optimize  Ctrl+O:load .txt  Ctrl+U:clear field  Esc:quit"
    };
    frame.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        rows[2],
    );

    if let Some(buffer) = &state.path_prompt {
        draw_path_prompt(frame, buffer);
    }
}

fn draw_editor(frame: &mut Frame, area: Rect, state: &UiState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(columns[0]);

    let resume = state.app.resume();
    let mut resume_title = String::from(" Your Resume ");
    if let Some(name) = &resume.file_name {
        resume_title.push_str(&format!("[{}] ", name));
    }
    if state.app.is_file_loading() {
        resume_title.push_str("(loading file...) ");
    }
    draw_text_area(
        frame,
        left[0],
        &resume_title,
        &resume.content,
        "Paste your current resume here, or press Ctrl+O to load a .txt file...",
        state.focus == Field::Resume,
    );

    let job = state.app.job();
    let job_title = match job.label() {
        Some(label) => format!(" Job Description: {} ", label),
        None => " Job Description ".to_string(),
    };
    draw_text_area(
        frame,
        left[1],
        &job_title,
        &job.text,
        "Paste the job requirements, responsibilities, and qualifications here...",
        state.focus == Field::Job,
    );

    let message = if let Some(error) = state.app.error() {
        Line::from(Span::styled(format!(" ! {}", error), Style::default().fg(Color::Red)))
    } else if let Some(notice) = &state.notice {
        Line::from(Span::styled(format!(" {}", notice), Style::default().fg(Color::Yellow)))
    } else {
        Line::from("")
    };
    frame.render_widget(Paragraph::new(message), left[2]);

    let button = if state.app.status() == AppStatus::Loading {
        Paragraph::new(format!(
            "{} Analyzing & Re-writing...",
            SPINNER[state.tick % SPINNER.len()]
        ))
        .style(Style::default().fg(Color::DarkGray))
    } else {
        Paragraph::new("* Optimize My Resume  [Ctrl+S]").style(
            Style::default()
                .fg(Color::White)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD),
        )
    };
    frame.render_widget(
        button
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL)),
        left[3],
    );

    frame.render_widget(explainer(&state.model), columns[1]);
}

fn draw_text_area(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    content: &str,
    placeholder: &str,
    focused: bool,
) {
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title.to_string())
        .border_style(border_style);

    let inner_width = area.width.saturating_sub(2).max(1) as usize;
    let inner_height = area.height.saturating_sub(2) as usize;

    let text = if content.is_empty() {
        Text::from(Line::from(Span::styled(
            placeholder.to_string(),
            Style::default().fg(Color::DarkGray),
        )))
    } else {
        let mut display = content.to_string();
        if focused {
            display.push('_');
        }
        Text::from(tail_lines(&display, inner_width, inner_height))
    };

    frame.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

/// Wraps `content` to `width` and keeps the last `height` lines, so the end
/// of the text (where typing happens) stays visible.
fn tail_lines(content: &str, width: usize, height: usize) -> Vec<Line<'static>> {
    let wrapped: Vec<String> = content
        .split('\n')
        .flat_map(|line| {
            if line.is_empty() {
                vec![String::new()]
            } else {
                textwrap::wrap(line, width)
                    .into_iter()
                    .map(|l| l.into_owned())
                    .collect()
            }
        })
        .collect();

    let skip = wrapped.len().saturating_sub(height);
    wrapped.into_iter().skip(skip).map(Line::from).collect()
}

fn explainer(model: &str) -> Paragraph<'static> {
    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                "Land your dream job with ",
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "AI precision.",
                Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from(
            "The AI re-writes your resume to highlight exactly what recruiters are looking for, \
             using real industry keywords and quantified results.",
        ),
        Line::from(""),
    ];

    for benefit in BENEFITS {
        lines.push(Line::from(vec![
            Span::styled(" ✓ ", Style::default().fg(Color::Green)),
            Span::raw(benefit),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("Powered by {}", model),
        Style::default().fg(Color::DarkGray),
    )));

    Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" Why tailor? "))
}

fn draw_result(frame: &mut Frame, area: Rect, state: &UiState, result: &TailoringResult) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let header = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(24)])
        .split(rows[0]);

    let subtitle = match state.app.job().label() {
        Some(label) => format!("We've tailored your resume to better match {}.", label),
        None => "We've tailored your resume to better match the role.".to_string(),
    };
    let title = Paragraph::new(vec![
        Line::from(Span::styled(
            "Optimization Complete!",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(subtitle, Style::default().fg(Color::DarkGray))),
    ]);
    frame.render_widget(title, header[0]);

    frame.render_widget(score_gauge(result), header[1]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(rows[1]);

    let preview = Paragraph::new(markdown_lines(&result.tailored_resume))
        .block(Block::default().borders(Borders::ALL).title(" Preview "))
        .wrap(Wrap { trim: false })
        .scroll((state.scroll_offset, 0));
    frame.render_widget(preview, body[0]);

    let sidebar = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(6)])
        .split(body[1]);

    let change_width = sidebar[0].width.saturating_sub(6).max(10) as usize;
    let items: Vec<ListItem> = result
        .key_changes
        .iter()
        .map(|change| {
            let mut lines = Vec::new();
            for (i, line) in textwrap::wrap(change, change_width).into_iter().enumerate() {
                let marker = if i == 0 {
                    Span::styled(" ✓ ", Style::default().fg(Color::Green))
                } else {
                    Span::raw("   ")
                };
                lines.push(Line::from(vec![marker, Span::raw(line.into_owned())]));
            }
            ListItem::new(Text::from(lines))
        })
        .collect();
    let changes = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Key AI Optimizations "),
    );
    frame.render_widget(changes, sidebar[0]);

    let next_steps = Paragraph::new(
        "Review the content for accuracy before sending. Small personal touches can make a big difference. Press c to copy the resume or s to save it as markdown.",
    )
    .wrap(Wrap { trim: true })
    .block(Block::default().borders(Borders::ALL).title(" Next Steps "));
    frame.render_widget(next_steps, sidebar[1]);

    if let Some(notice) = &state.notice {
        frame.render_widget(
            Paragraph::new(format!(" {}", notice)).style(Style::default().fg(Color::Yellow)),
            rows[2],
        );
    }
}

fn score_gauge(result: &TailoringResult) -> Gauge<'static> {
    // The stored score is never altered; only the bar is clamped.
    let ratio = if result.match_score.is_finite() {
        (result.match_score / 100.0).clamp(0.0, 1.0)
    } else {
        0.0
    };
    Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Match Score "))
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(ratio)
        .label(result.score_label())
}

fn markdown_lines(markdown: &str) -> Vec<Line<'static>> {
    markdown
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            if trimmed.starts_with('#') {
                Line::from(Span::styled(
                    trimmed.trim_start_matches('#').trim().to_string(),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ))
            } else if let Some(item) = trimmed
                .strip_prefix("- ")
                .or_else(|| trimmed.strip_prefix("* "))
            {
                let indent = &line[..line.len() - trimmed.len()];
                Line::from(format!("{}• {}", indent, item))
            } else {
                Line::from(line.to_string())
            }
        })
        .collect()
}

fn draw_path_prompt(frame: &mut Frame, buffer: &str) {
    let area = frame.area();
    let width = area.width.saturating_sub(4).min(70);
    let popup = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + area.height.saturating_sub(3) / 2,
        width,
        height: 3.min(area.height),
    };
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(format!("{}_", buffer)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Load resume (.txt) ")
                .border_style(Style::default().fg(Color::Cyan)),
        ),
        popup,
    );
}
