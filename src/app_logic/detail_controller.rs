use super::view_commands::{MessageSeverity, ViewCommand};
use crate::core::app_details::{self, AppDetails};
use crate::core::package_source::{self, CatalogError, PackageDetailOperations};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

struct PendingLoad {
    package_id: String,
    receiver: Receiver<package_source::Result<AppDetails>>,
}

/*
 * Presenter for the detail view of one package. Loading walks the package's
 * storage directories, so `open` hands it to a worker thread and returns at once;
 * `poll_details` picks up the result. Opening a package either shows its full
 * details or reports the failure and navigates back; a partially loaded record
 * is never rendered. Opening another package while one is loading abandons the
 * earlier load.
 */
pub struct AppDetailController {
    detail_source: Arc<dyn PackageDetailOperations>,
    current: Option<AppDetails>,
    pending: Option<PendingLoad>,
}

impl AppDetailController {
    pub fn new(detail_source: Arc<dyn PackageDetailOperations>) -> Self {
        AppDetailController {
            detail_source,
            current: None,
            pending: None,
        }
    }

    pub fn current(&self) -> Option<&AppDetails> {
        self.current.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    fn fail_and_leave(&mut self, text: String) -> Vec<ViewCommand> {
        self.current = None;
        vec![
            ViewCommand::ShowMessage {
                severity: MessageSeverity::Error,
                text,
            },
            ViewCommand::NavigateBack,
        ]
    }

    /* Starts loading `package_id` in the background. */
    pub fn open(&mut self, package_id: &str) -> Vec<ViewCommand> {
        let package_id = package_id.trim();
        self.current = None;
        if let Some(previous) = self.pending.take() {
            log::debug!(
                "AppDetailController: Abandoning load for '{}'.",
                previous.package_id
            );
        }
        if package_id.is_empty() {
            log::warn!("AppDetailController: Asked to open an empty package id.");
            return self.fail_and_leave("No application selected.".to_string());
        }

        let (sender, receiver) = mpsc::channel();
        let detail_source = Arc::clone(&self.detail_source);
        let worker_package_id = package_id.to_string();
        let spawn_result = thread::Builder::new()
            .name(format!("details-{package_id}"))
            .spawn(move || {
                let result = detail_source.load_details(&worker_package_id);
                if sender.send(result).is_err() {
                    log::debug!(
                        "AppDetailController: Load for '{worker_package_id}' finished after being abandoned."
                    );
                }
            });

        if let Err(e) = spawn_result {
            log::error!("AppDetailController: Failed to spawn detail worker: {e}");
            return self.fail_and_leave(format!("Failed to load '{package_id}': {e}"));
        }
        log::debug!("AppDetailController: Loading details for '{package_id}'.");
        self.pending = Some(PendingLoad {
            package_id: package_id.to_string(),
            receiver,
        });
        vec![ViewCommand::SetLoading(true)]
    }

    /* Collects a finished load without blocking. */
    pub fn poll_details(&mut self) -> Vec<ViewCommand> {
        let Some(pending) = self.pending.take() else {
            return Vec::new();
        };
        let result = match pending.receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => {
                self.pending = Some(pending);
                return Vec::new();
            }
            Err(TryRecvError::Disconnected) => Err(CatalogError::EnumerationUnavailable(
                "detail worker stopped without a result".to_string(),
            )),
        };

        let package_id = pending.package_id;
        let mut commands = vec![ViewCommand::SetLoading(false)];
        match result {
            Ok(details) => {
                log::debug!("AppDetailController: Showing details for '{package_id}'.");
                self.current = Some(details.clone());
                commands.push(ViewCommand::ShowDetails(Box::new(details)));
            }
            Err(e) if e.is_not_found() => {
                log::warn!("AppDetailController: Package '{package_id}' is no longer installed.");
                commands.extend(
                    self.fail_and_leave(format!("Application '{package_id}' is not installed.")),
                );
            }
            Err(e) => {
                log::error!("AppDetailController: Failed to load '{package_id}': {e}");
                commands.extend(self.fail_and_leave(format!("Failed to load '{package_id}': {e}")));
            }
        }
        commands
    }

    /* Manifest summary of the package currently shown. */
    pub fn show_manifest(&self) -> Vec<ViewCommand> {
        match &self.current {
            Some(details) => vec![ViewCommand::ShowManifest(app_details::manifest_summary(
                details,
            ))],
            None => vec![ViewCommand::ShowMessage {
                severity: MessageSeverity::Warning,
                text: "No application is open.".to_string(),
            }],
        }
    }

    pub fn close(&mut self) -> Vec<ViewCommand> {
        self.current = None;
        self.pending = None;
        vec![ViewCommand::NavigateBack]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{ApplicationRecord, PackageDescriptor};
    use crate::core::package_source::Result as CatalogResult;
    use std::io;
    use std::sync::Mutex;
    use std::sync::mpsc::Sender;
    use std::time::{Duration, Instant};

    struct MockDetailSource {
        calls: Mutex<Vec<String>>,
        gate: Mutex<Option<Receiver<()>>>,
    }

    impl MockDetailSource {
        fn new() -> Self {
            MockDetailSource {
                calls: Mutex::new(Vec::new()),
                gate: Mutex::new(None),
            }
        }
        /* The next load blocks until the returned sender fires. */
        fn gated() -> (Self, Sender<()>) {
            let (tx, rx) = mpsc::channel();
            let source = Self::new();
            *source.gate.lock().unwrap() = Some(rx);
            (source, tx)
        }
    }

    impl PackageDetailOperations for MockDetailSource {
        fn load_details(&self, package_id: &str) -> CatalogResult<AppDetails> {
            let gate = self.gate.lock().unwrap().take();
            self.calls.lock().unwrap().push(package_id.to_string());
            if let Some(gate) = gate {
                let _ = gate.recv();
            }
            match package_id {
                "com.example.mail" => {
                    let descriptor = PackageDescriptor {
                        package_name: package_id.to_string(),
                        label: Some("Mail".to_string()),
                        requested_permissions: vec!["android.permission.INTERNET".to_string()],
                        ..PackageDescriptor::default()
                    };
                    Ok(AppDetails::from_descriptor(&descriptor).unwrap())
                }
                "com.example.broken" => Err(CatalogError::Io(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "denied",
                ))),
                other => Err(CatalogError::NotFound(other.to_string())),
            }
        }
    }

    fn controller() -> (AppDetailController, Arc<MockDetailSource>) {
        let source = Arc::new(MockDetailSource::new());
        (AppDetailController::new(source.clone()), source)
    }

    fn wait_for_result(controller: &mut AppDetailController) -> Vec<ViewCommand> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let commands = controller.poll_details();
            if !commands.is_empty() {
                return commands;
            }
            assert!(Instant::now() < deadline, "detail load did not finish in time");
            thread::sleep(Duration::from_millis(2));
        }
    }

    /* Opens `package_id`, waits for the worker and returns every command except loading toggles. */
    fn open_and_wait(controller: &mut AppDetailController, package_id: &str) -> Vec<ViewCommand> {
        let mut commands = controller.open(package_id);
        if controller.is_loading() {
            commands.extend(wait_for_result(controller));
        }
        commands.retain(|command| !matches!(command, ViewCommand::SetLoading(_)));
        commands
    }

    fn assert_error_then_back(commands: &[ViewCommand]) {
        assert_eq!(commands.len(), 2, "commands: {commands:?}");
        assert!(matches!(
            commands[0],
            ViewCommand::ShowMessage {
                severity: MessageSeverity::Error,
                ..
            }
        ));
        assert_eq!(commands[1], ViewCommand::NavigateBack);
    }

    #[test]
    fn test_open_returns_before_source_responds() {
        let (source, release) = MockDetailSource::gated();
        let mut controller = AppDetailController::new(Arc::new(source));

        assert_eq!(
            controller.open("com.example.mail"),
            vec![ViewCommand::SetLoading(true)]
        );
        assert!(controller.is_loading());
        assert!(controller.poll_details().is_empty());
        assert!(controller.current().is_none());

        release.send(()).unwrap();
        let commands = wait_for_result(&mut controller);
        assert_eq!(commands[0], ViewCommand::SetLoading(false));
        assert!(matches!(commands[1], ViewCommand::ShowDetails(_)));
        assert!(!controller.is_loading());
        assert!(controller.current().is_some());
    }

    #[test]
    fn test_reopening_abandons_earlier_load() {
        let (source, release) = MockDetailSource::gated();
        let source = Arc::new(source);
        let mut controller = AppDetailController::new(source.clone());
        controller.open("com.example.gone");
        // The first worker holds the gate once its call is recorded.
        let deadline = Instant::now() + Duration::from_secs(5);
        while source.calls.lock().unwrap().is_empty() {
            assert!(Instant::now() < deadline, "first load never started");
            thread::sleep(Duration::from_millis(2));
        }
        let commands = open_and_wait(&mut controller, "com.example.mail");
        assert!(matches!(commands.as_slice(), [ViewCommand::ShowDetails(_)]));
        let _ = release.send(());
        assert!(controller.poll_details().is_empty());
        assert!(controller.current().is_some());
    }

    #[test]
    fn test_open_installed_package_shows_details() {
        let (mut controller, _) = controller();
        let commands = open_and_wait(&mut controller, "com.example.mail");
        match commands.as_slice() {
            [ViewCommand::ShowDetails(details)] => {
                assert_eq!(
                    details.record,
                    ApplicationRecord::new("com.example.mail", "Mail")
                        .with_footprint(Some(0))
                );
            }
            other => panic!("Expected ShowDetails, got {other:?}"),
        }
        assert!(controller.current().is_some());
    }

    #[test]
    fn test_open_uninstalled_package_navigates_back() {
        let (mut controller, _) = controller();
        open_and_wait(&mut controller, "com.example.mail");
        let commands = open_and_wait(&mut controller, "com.example.gone");
        assert_error_then_back(&commands);
        if let ViewCommand::ShowMessage { text, .. } = &commands[0] {
            assert!(text.contains("not installed"));
        }
        assert!(controller.current().is_none());
    }

    #[test]
    fn test_open_with_source_failure_navigates_back() {
        let (mut controller, _) = controller();
        assert_error_then_back(&open_and_wait(&mut controller, "com.example.broken"));
        assert!(controller.current().is_none());
    }

    #[test]
    fn test_open_empty_id_does_not_query_source() {
        let (mut controller, source) = controller();
        assert_error_then_back(&controller.open("   "));
        assert!(!controller.is_loading());
        assert!(source.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_show_manifest_requires_open_package() {
        let (mut controller, _) = controller();
        assert!(matches!(
            controller.show_manifest().as_slice(),
            [ViewCommand::ShowMessage {
                severity: MessageSeverity::Warning,
                ..
            }]
        ));

        open_and_wait(&mut controller, "com.example.mail");
        match controller.show_manifest().as_slice() {
            [ViewCommand::ShowManifest(text)] => {
                assert!(text.contains("package=\"com.example.mail\""));
                assert!(text.contains("android.permission.INTERNET"));
            }
            other => panic!("Expected ShowManifest, got {other:?}"),
        }

        assert_eq!(controller.close(), vec![ViewCommand::NavigateBack]);
        assert!(controller.current().is_none());
    }
}
