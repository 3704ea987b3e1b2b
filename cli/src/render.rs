use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use common::{format_timestamp, or_missing, ActionKind, Job, JobExecution, StatusVariant};
use jobctl_client::controllers::{ExecutionsState, JobDetailState, JobsViewState};
use jobctl_client::theme::Theme;

pub const NO_JOBS: &str = "No jobs found. Run `jobctl register` to create one.";
pub const NO_EXECUTIONS: &str = "No executions found.";
pub const JOB_NOT_FOUND: &str = "Job not found.";
pub const BACK_TO_JOBS: &str = "Back to Jobs: jobctl list";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Plain,
    Strong,
    Muted,
}

/// A rendered cell value, optionally drawn as a status badge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub badge: Option<StatusVariant>,
}

impl Rendered {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), badge: None }
    }

    pub fn badge(text: impl Into<String>, variant: StatusVariant) -> Self {
        Self { text: text.into(), badge: Some(variant) }
    }
}

/// Declarative column: header, how to pull a value out of a row, and styling.
pub struct Column<'a, T> {
    pub header: &'static str,
    pub extract: Box<dyn Fn(&T) -> Rendered + 'a>,
    pub style: Style,
}

impl<'a, T> Column<'a, T> {
    pub fn new(header: &'static str, style: Style, extract: impl Fn(&T) -> Rendered + 'a) -> Self {
        Self {
            header,
            extract: Box::new(extract),
            style,
        }
    }
}

pub struct Renderer {
    theme: Theme,
    color: bool,
}

impl Renderer {
    pub fn new(theme: Theme, color: bool) -> Self {
        Self { theme, color }
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    fn badge_color(&self, variant: StatusVariant) -> Color {
        match (self.theme, variant) {
            (Theme::Dark, StatusVariant::Success) => Color::Green,
            (Theme::Dark, StatusVariant::Error) => Color::Red,
            (Theme::Dark, StatusVariant::Warning) => Color::Yellow,
            (Theme::Dark, StatusVariant::Info) => Color::Cyan,
            (Theme::Dark, StatusVariant::Default) => Color::Grey,
            (Theme::Light, StatusVariant::Success) => Color::DarkGreen,
            (Theme::Light, StatusVariant::Error) => Color::DarkRed,
            (Theme::Light, StatusVariant::Warning) => Color::DarkYellow,
            (Theme::Light, StatusVariant::Info) => Color::DarkCyan,
            (Theme::Light, StatusVariant::Default) => Color::DarkGrey,
        }
    }

    fn cell(&self, value: Rendered, style: Style) -> Cell {
        let mut cell = match value.badge {
            Some(variant) => Cell::new(format!("● {}", value.text))
                .fg(self.badge_color(variant))
                .add_attribute(Attribute::Bold),
            None => Cell::new(value.text),
        };
        cell = match style {
            Style::Plain => cell,
            Style::Strong => cell.add_attribute(Attribute::Bold),
            Style::Muted => cell.add_attribute(Attribute::Dim),
        };
        cell
    }

    fn new_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        if self.color {
            table.enforce_styling();
        } else {
            table.force_no_tty();
        }
        table
    }

    pub fn table<T>(&self, columns: &[Column<'_, T>], rows: &[T], loading: bool, empty: &str) -> String {
        if loading {
            return "Loading...".to_string();
        }
        if rows.is_empty() {
            return empty.to_string();
        }

        let mut table = self.new_table();
        table.set_header(
            columns
                .iter()
                .map(|c| Cell::new(c.header).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
        for row in rows {
            table.add_row(
                columns
                    .iter()
                    .map(|c| self.cell((c.extract)(row), c.style))
                    .collect::<Vec<_>>(),
            );
        }
        table.to_string()
    }

    fn card(&self, title: &str, fields: Vec<(&str, Rendered)>) -> String {
        let mut table = self.new_table();
        table.set_header(vec![Cell::new(title).add_attribute(Attribute::Bold), Cell::new("")]);
        for (label, value) in fields {
            table.add_row(vec![Cell::new(label).add_attribute(Attribute::Dim), self.cell(value, Style::Plain)]);
        }
        table.to_string()
    }

    pub fn jobs_view(&self, state: &JobsViewState) -> String {
        if state.loading {
            return "Loading jobs...".to_string();
        }

        let columns = vec![
            Column::new("ID", Style::Muted, |job: &Job| Rendered::text(job.id.to_string())),
            Column::new("Name", Style::Strong, |job: &Job| Rendered::text(job.name.clone())),
            Column::new("Type", Style::Plain, |job: &Job| {
                Rendered::badge(or_missing(job.job_type.as_deref()), StatusVariant::Default)
            }),
            Column::new("State", Style::Plain, |job: &Job| state_badge(job)),
            Column::new("Last Run", Style::Muted, |job: &Job| {
                Rendered::text(or_missing(job.last_action_time.as_deref()))
            }),
            Column::new("Actions", Style::Plain, |job: &Job| {
                Rendered::text(action_buttons(&ActionKind::ROW_ACTIONS, |a| state.is_action_busy(job.id, a)))
            }),
        ];

        self.table(&columns, &state.jobs, false, NO_JOBS)
    }

    pub fn detail_view(&self, state: &JobDetailState) -> String {
        if state.loading {
            return "Loading job details...".to_string();
        }
        if state.error.is_some() {
            return BACK_TO_JOBS.to_string();
        }
        let Some(job) = &state.job else {
            return format!("{}\n{}", JOB_NOT_FOUND, BACK_TO_JOBS);
        };

        let details = self.card(
            &format!("{} (#{})", job.name, job.id),
            vec![
                ("Type", Rendered::badge(or_missing(job.job_type.as_deref()), StatusVariant::Default)),
                ("State", state_badge(job)),
                ("Description", Rendered::text(or_missing(job.description.as_deref()))),
                ("Payload", Rendered::text(or_missing(job.payload.as_deref()))),
                ("Submitted By", Rendered::text(or_missing(job.submitted_by.as_deref()))),
                ("Dependency", Rendered::text(
                    job.dependency.as_ref().map(|d| format!("{} (#{})", d.name, d.id)).unwrap_or_else(|| or_missing(None)),
                )),
                ("Host Pool", Rendered::text(
                    job.host_pool.as_ref().filter(|h| !h.is_empty()).map(|h| h.join(", ")).unwrap_or_else(|| or_missing(None)),
                )),
                ("Assigned Host", Rendered::text(or_missing(job.assigned_host.as_deref()))),
            ],
        );

        let busy = |a: ActionKind| state.action_loading == Some(a);
        let actions = self.card(
            "Actions",
            vec![
                ("Job Control", Rendered::text(action_buttons(&[ActionKind::Run, ActionKind::Kill, ActionKind::Clean], busy))),
                ("Advanced", Rendered::text(action_buttons(&[ActionKind::Manual, ActionKind::ForceRun], busy))),
                ("Last Modified", Rendered::text(or_missing(job.last_action_time.as_deref()))),
                ("Modified By", Rendered::text(or_missing(job.last_modified_by.as_deref()))),
                ("Last Action", Rendered::text(or_missing(job.last_action.as_deref()))),
            ],
        );

        format!(
            "{}\n{}\nExecution History\n{}",
            details,
            actions,
            self.table(&execution_columns(false), &state.executions, false, NO_EXECUTIONS)
        )
    }

    pub fn executions_view(&self, state: &ExecutionsState) -> String {
        format!(
            "Executions for job #{}\n{}",
            state.job_id,
            self.table(&execution_columns(true), &state.executions, state.loading, NO_EXECUTIONS)
        )
    }
}

fn state_badge(job: &Job) -> Rendered {
    let text = job.state.map(|s| s.to_string()).unwrap_or_else(|| or_missing(None));
    Rendered::badge(text, StatusVariant::for_state(job.state))
}

fn action_buttons(actions: &[ActionKind], busy: impl Fn(ActionKind) -> bool) -> String {
    actions
        .iter()
        .map(|a| if busy(*a) { format!("[{}…]", a.label()) } else { format!("[{}]", a.label()) })
        .collect::<Vec<_>>()
        .join(" ")
}

fn execution_columns(with_job: bool) -> Vec<Column<'static, JobExecution>> {
    let mut columns = vec![Column::new("ID", Style::Muted, |e: &JobExecution| Rendered::text(e.id.to_string()))];
    if with_job {
        columns.push(Column::new("Job", Style::Strong, |e: &JobExecution| {
            Rendered::text(e.job.as_ref().map(|j| format!("{} (#{})", j.name, j.id)).unwrap_or_else(|| or_missing(None)))
        }));
    }
    columns.extend([
        Column::new("Status", Style::Plain, |e: &JobExecution| {
            Rendered::badge(e.status.clone(), StatusVariant::for_status(&e.status))
        }),
        Column::new("Started", Style::Muted, |e: &JobExecution| Rendered::text(format_timestamp(e.started_at.as_deref()))),
        Column::new("Finished", Style::Muted, |e: &JobExecution| Rendered::text(format_timestamp(e.finished_at.as_deref()))),
        Column::new("Action", Style::Muted, |e: &JobExecution| Rendered::text(or_missing(e.action.as_deref()))),
        Column::new("Triggered By", Style::Muted, |e: &JobExecution| Rendered::text(or_missing(e.triggered_by.as_deref()))),
    ]);
    columns
}
