use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use pkgimage::image::{DeployObserver, DeployState};
use pkgimage::package::PackageIdentity;
use std::path::Path;

/// Terminal progress for fetches and deployment phases
pub struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    pub fn new() -> Self {
        let bar = ProgressBar::hidden();
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} packages {msg}")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        Self { bar }
    }

    /// Print above the bar, whether or not it is drawn
    fn message(&self, message: &str) {
        self.bar.suspend(|| eprintln!("{}", message));
    }
}

impl DeployObserver for ProgressObserver {
    fn state_changed(&self, state: DeployState) {
        match state {
            DeployState::Uninstalling => self.message("Uninstalling packages..."),
            DeployState::Installing => self.message("Installing packages..."),
            DeployState::Done | DeployState::Cancelled | DeployState::Failed => {
                self.bar.finish_and_clear()
            }
            DeployState::Idle | DeployState::DiffComputed => {}
        }
    }

    fn info(&self, message: &str) {
        self.message(message);
    }

    fn fetch_started(&self, count: usize) {
        self.bar.reset();
        self.bar.set_length(count as u64);
        self.bar.set_draw_target(ProgressDrawTarget::stderr());
    }

    fn package_resolved(&self, package: &PackageIdentity, _path: &Path) {
        self.bar.set_message(package.name.clone());
        self.bar.inc(1);
        if self.bar.length() == Some(self.bar.position()) {
            self.bar.finish_and_clear();
        }
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}
