use super::JobsController;
use common::{ActingUser, NewJob};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Description,
    Type,
    Payload,
    User,
}

/// Field buffer for the register dialog; nothing is sent until `submit`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterForm {
    pub name: String,
    pub description: String,
    pub job_type: String,
    pub payload: String,
    pub user: String,
    pub error: Option<String>,
}

fn non_blank(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl RegisterForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_field(&mut self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FormField::Name => self.name = value,
            FormField::Description => self.description = value,
            FormField::Type => self.job_type = value,
            FormField::Payload => self.payload = value,
            FormField::User => self.user = value,
        }
    }

    pub fn to_new_job(&self) -> NewJob {
        NewJob {
            name: self.name.trim().to_string(),
            description: non_blank(&self.description),
            job_type: non_blank(&self.job_type),
            payload: non_blank(&self.payload),
        }
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    /// Validates locally, then registers through the list controller.
    /// Returns `true` when the job was created and the form reset.
    pub async fn submit(&mut self, jobs: &JobsController) -> bool {
        self.error = None;

        if self.name.trim().is_empty() {
            self.error = Some("Job name is required".to_string());
            return false;
        }

        let user = match ActingUser::new(&self.user) {
            Ok(user) => user,
            Err(e) => {
                self.error = Some(e.to_string());
                return false;
            }
        };

        match jobs.register(&self.to_new_job(), &user).await {
            Ok(_) => {
                self.clear();
                true
            }
            Err(e) => {
                self.error = Some(e.to_string());
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::fake::FakeJobsApi;
    use crate::locks::ActionLocks;
    use std::sync::Arc;

    fn setup() -> (Arc<FakeJobsApi>, JobsController) {
        let fake = Arc::new(FakeJobsApi::default());
        let jobs = JobsController::new(fake.clone(), ActionLocks::default());
        (fake, jobs)
    }

    #[tokio::test]
    async fn test_blank_name_never_hits_network() {
        let (fake, jobs) = setup();
        let mut form = RegisterForm::new();
        form.set_field(FormField::Name, "   ");
        form.set_field(FormField::User, "alice");

        assert!(!form.submit(&jobs).await);
        assert_eq!(form.error.as_deref(), Some("Job name is required"));
        assert_eq!(fake.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_blank_user_never_hits_network() {
        let (fake, jobs) = setup();
        let mut form = RegisterForm::new();
        form.set_field(FormField::Name, "backup");

        assert!(!form.submit(&jobs).await);
        assert_eq!(form.error.as_deref(), Some("User is required"));
        assert_eq!(fake.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_success_clears_form() {
        let (fake, jobs) = setup();
        jobs.open_register();
        let mut form = RegisterForm::new();
        form.set_field(FormField::Name, "backup");
        form.set_field(FormField::Type, "SHELL");
        form.set_field(FormField::User, "alice");

        assert!(form.submit(&jobs).await);
        assert_eq!(form, RegisterForm::default());
        assert_eq!(fake.count("register:backup:alice"), 1);
        assert!(!jobs.snapshot().register_open);
        assert_eq!(jobs.snapshot().jobs[0].job_type.as_deref(), Some("SHELL"));
    }

    #[tokio::test]
    async fn test_server_rejection_keeps_fields() {
        let (fake, jobs) = setup();
        fake.fail_register(422);
        let mut form = RegisterForm::new();
        form.set_field(FormField::Name, "backup");
        form.set_field(FormField::User, "alice");

        assert!(!form.submit(&jobs).await);
        assert_eq!(form.name, "backup");
        assert_eq!(form.user, "alice");
        assert_eq!(form.error.as_deref(), Some("Request failed with status code 422"));
    }

    #[test]
    fn test_blank_optionals_are_omitted() {
        let mut form = RegisterForm::new();
        form.set_field(FormField::Name, " etl ");
        form.set_field(FormField::Description, "  ");
        form.set_field(FormField::Payload, "echo hi");
        let job = form.to_new_job();
        assert_eq!(job.name, "etl");
        assert!(job.description.is_none());
        assert_eq!(job.payload.as_deref(), Some("echo hi"));
    }
}
