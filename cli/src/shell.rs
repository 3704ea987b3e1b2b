use crate::render::Renderer;
use common::{ActionKind, JobId, Route};
use jobctl_client::theme;
use jobctl_client::{
    Dispatch, ExecutionsController, FormField, JobDetailController, JobsController, RegisterForm, Session,
    ViewGuard, ViewToken,
};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

const HELP: &str = "\
Commands:
  open <route>             /jobs, /jobs/<id>, /executions (or just type the route)
  list | show <id> | executions [id]
  refresh                  re-fetch the current view
  run|kill|clean|manual|force-run [id]
                           id is required on the jobs list, implied on a job page
  select <id>              pick the job on the executions view
  register name=<n> [type=<t>] [description=<d>] [payload=<p>]
  user <name>              acting user for this session
  theme                    toggle light/dark
  help | quit";

#[derive(Clone)]
enum View {
    Jobs(JobsController),
    Detail(JobDetailController),
    Executions(ExecutionsController),
}

impl View {
    fn token(&self) -> ViewToken {
        match self {
            View::Jobs(c) => c.token(),
            View::Detail(c) => c.token(),
            View::Executions(c) => c.token(),
        }
    }
}

struct Active {
    view: View,
    _guard: ViewGuard,
}

/// A background operation finished for the view owning `ViewToken`.
type Settled = (ViewToken, Option<String>);

struct Shell<'r> {
    session: Session,
    renderer: &'r mut Renderer,
    user: Option<String>,
    active: Option<Active>,
    tx: mpsc::UnboundedSender<Settled>,
}

pub async fn run(session: Session, renderer: &mut Renderer, user: Option<String>) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Settled>();
    let mut theme_rx = theme::subscribe();
    let user = user.or_else(|| session.config.user.clone());

    let mut shell = Shell {
        session,
        renderer,
        user,
        active: None,
        tx,
    };
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", HELP);
    shell.navigate(Route::Jobs);

    loop {
        prompt();
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !shell.handle(line.trim()).await {
                    break;
                }
            }
            Some((token, note)) = rx.recv() => {
                // Views navigated away from stay silent.
                if token.is_live() {
                    println!();
                    if let Some(note) = note {
                        println!("{}", note);
                    }
                    shell.render();
                }
            }
            Ok(()) = theme_rx.changed() => {
                let current = *theme_rx.borrow_and_update();
                shell.renderer.set_theme(current);
                println!("\nTheme: {:?}", current);
            }
        }
    }

    Ok(())
}

fn prompt() {
    print!("jobctl> ");
    std::io::stdout().flush().ok();
}

impl Shell<'_> {
    fn navigate(&mut self, route: Route) {
        let view = match route {
            Route::Jobs => View::Jobs(self.session.jobs()),
            Route::JobDetail(id) => View::Detail(self.session.job_detail(id)),
            Route::Executions => View::Executions(self.session.executions(None)),
        };
        log::debug!("Navigating to {}", route.path());
        self.mount(view);
    }

    fn mount(&mut self, view: View) {
        // Replacing the active view drops its guard and tears its token down.
        self.active = Some(Active {
            view: view.clone(),
            _guard: ViewGuard::new(view.token()),
        });
        self.spawn(view.token(), async move {
            match view {
                View::Jobs(c) => c.mount().await,
                View::Detail(c) => c.mount().await,
                View::Executions(c) => c.mount().await,
            }
            None
        });
    }

    fn spawn<F>(&self, token: ViewToken, work: F)
    where
        F: std::future::Future<Output = Option<String>> + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let note = work.await;
            let _ = tx.send((token, note));
        });
    }

    fn render(&self) {
        let Some(active) = &self.active else { return };
        let (body, error) = match &active.view {
            View::Jobs(c) => {
                let s = c.snapshot();
                (self.renderer.jobs_view(&s), s.error)
            }
            View::Detail(c) => {
                let s = c.snapshot();
                (self.renderer.detail_view(&s), s.error)
            }
            View::Executions(c) => {
                let s = c.snapshot();
                (self.renderer.executions_view(&s), s.error)
            }
        };
        if let Some(error) = error {
            println!("Error: {}", error);
        }
        println!("{}", body);
    }

    fn acting_user(&self) -> Option<common::ActingUser> {
        match self.session.config.acting_user(self.user.as_deref()) {
            Ok(user) => Some(user),
            Err(e) => {
                println!("Error: {} (set one with `user <name>`)", e);
                None
            }
        }
    }

    /// Returns `false` to leave the shell.
    async fn handle(&mut self, line: &str) -> bool {
        let mut parts = line.splitn(2, char::is_whitespace);
        let cmd = parts.next().unwrap_or("");
        let rest = parts.next().unwrap_or("").trim();

        match cmd {
            "" => {}
            "quit" | "exit" => return false,
            "help" => println!("{}", HELP),
            "theme" => {
                theme::toggle_theme();
            }
            "user" => match common::ActingUser::new(rest) {
                Ok(user) => {
                    println!("Acting as {}", user);
                    self.user = Some(user.to_string());
                }
                Err(e) => println!("Error: {}", e),
            },
            "list" => self.navigate(Route::Jobs),
            "show" => match rest.parse::<JobId>() {
                Ok(id) => self.navigate(Route::JobDetail(id)),
                Err(_) => println!("Usage: show <id>"),
            },
            "executions" => match rest.parse::<JobId>() {
                Ok(id) => self.mount(View::Executions(self.session.executions(Some(id)))),
                Err(_) => self.navigate(Route::Executions),
            },
            "select" => match rest.parse::<JobId>() {
                Ok(id) => self.select(id),
                Err(_) => println!("Usage: select <id>"),
            },
            "open" => self.open(rest),
            path if path.starts_with('/') => self.open(path),
            "refresh" => self.refresh(),
            "register" => self.register(rest).await,
            other => match other.parse::<ActionKind>() {
                Ok(action) => self.act(action, rest),
                Err(_) => println!("Unknown command: {} (try `help`)", other),
            },
        }
        true
    }

    fn open(&mut self, path: &str) {
        match Route::parse(path) {
            Some(route) => self.navigate(route),
            None => println!("Unknown route: {}", path),
        }
    }

    fn refresh(&self) {
        let Some(active) = &self.active else { return };
        let view = active.view.clone();
        self.spawn(view.token(), async move {
            match view {
                View::Jobs(c) => {
                    c.refresh().await;
                }
                View::Detail(c) => {
                    c.refresh().await;
                }
                View::Executions(c) => {
                    c.refresh().await;
                }
            }
            None
        });
    }

    fn select(&self, id: JobId) {
        let Some(Active { view: View::Executions(c), .. }) = &self.active else {
            println!("`select` only applies to the executions view");
            return;
        };
        let c = c.clone();
        self.spawn(c.token(), async move {
            c.select(id).await;
            None
        });
    }

    fn act(&self, action: ActionKind, rest: &str) {
        let Some(active) = &self.active else { return };
        let Some(user) = self.acting_user() else { return };

        match &active.view {
            View::Jobs(c) => {
                let Ok(id) = rest.parse::<JobId>() else {
                    println!("Usage: {} <id>", action);
                    return;
                };
                if c.is_action_busy(id, action) {
                    println!("{} on job {} is already in progress", action.label(), id);
                    return;
                }
                let c = c.clone();
                self.spawn(c.token(), async move {
                    let outcome = c.dispatch(id, action, &user).await;
                    describe(action, id, outcome)
                });
            }
            View::Detail(c) => {
                let c = c.clone();
                let id = c.id();
                self.spawn(c.token(), async move {
                    let outcome = c.dispatch(action, &user).await;
                    describe(action, id, outcome)
                });
            }
            View::Executions(_) => println!("Open /jobs or /jobs/<id> to run actions"),
        }
    }

    async fn register(&self, rest: &str) {
        let Some(Active { view: View::Jobs(c), .. }) = &self.active else {
            println!("Open /jobs to register a job");
            return;
        };
        let jobs = c.clone();

        let fields = match parse_fields(rest) {
            Ok(fields) => fields,
            Err(e) => {
                println!("{}", e);
                return;
            }
        };
        let mut form = RegisterForm::new();
        for (field, value) in fields {
            form.set_field(field, value);
        }
        form.set_field(FormField::User, self.user.clone().unwrap_or_default());

        jobs.open_register();
        if form.submit(&jobs).await {
            println!("Job registered.");
            self.render();
        } else {
            jobs.close_register();
            println!("Error: {}", form.error.unwrap_or_default());
        }
    }
}

fn form_field(key: &str) -> Option<FormField> {
    match key {
        "name" => Some(FormField::Name),
        "type" => Some(FormField::Type),
        "description" => Some(FormField::Description),
        "payload" => Some(FormField::Payload),
        _ => None,
    }
}

/// `key=value` pairs; words without a known `key=` continue the previous value.
fn parse_fields(rest: &str) -> Result<Vec<(FormField, String)>, String> {
    let mut fields: Vec<(FormField, String)> = Vec::new();
    for word in rest.split_whitespace() {
        let known = word.split_once('=').and_then(|(k, v)| form_field(k).map(|f| (f, v)));
        if let Some((field, value)) = known {
            fields.push((field, value.to_string()));
            continue;
        }
        match fields.last_mut() {
            Some((_, value)) => {
                value.push(' ');
                value.push_str(word);
            }
            None => return Err(format!("Expected key=value, got {}", word)),
        }
    }
    for (_, value) in fields.iter_mut() {
        *value = value.trim_matches(|c: char| c == '"' || c == '\'').to_string();
    }
    Ok(fields)
}

fn describe(action: ActionKind, id: JobId, outcome: Dispatch) -> Option<String> {
    match outcome {
        Dispatch::Completed => Some(format!("{} on job {} accepted", action.label(), id)),
        Dispatch::Failed => None,
        Dispatch::Busy => Some(format!("{} on job {} is already in progress", action.label(), id)),
        Dispatch::Skipped => Some("No job loaded".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fields_keeps_spaces_in_last_value() {
        let fields = parse_fields("name=etl description=nightly backup").unwrap();
        assert_eq!(
            fields,
            vec![
                (FormField::Name, "etl".to_string()),
                (FormField::Description, "nightly backup".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_fields_strips_quotes() {
        let fields = parse_fields("description=\"two words\" type=SHELL name=x").unwrap();
        assert_eq!(fields[0], (FormField::Description, "two words".to_string()));
        assert_eq!(fields[1], (FormField::Type, "SHELL".to_string()));
    }

    #[test]
    fn test_parse_fields_rejects_leading_word() {
        assert_eq!(parse_fields("backup name=x"), Err("Expected key=value, got backup".to_string()));
    }
}
