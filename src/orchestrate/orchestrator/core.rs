//! Core Orchestrator struct and basic methods

use crate::train::callback::{CallbackManager, ProgressCallback, TrainerCallback};
use crate::train::TrainingArgs;

use crate::orchestrate::RunEnvironment;

/// Drives a student through one combined compression run
pub struct Orchestrator {
    pub(crate) env: RunEnvironment,
    pub(crate) args: TrainingArgs,
    pub(crate) callbacks: CallbackManager,
}

impl Orchestrator {
    /// Create an orchestrator.
    ///
    /// Installs a [`ProgressCallback`] unless the environment disables
    /// external reporting.
    pub fn new(env: RunEnvironment, args: TrainingArgs) -> Self {
        let mut callbacks = CallbackManager::new();
        if !env.disable_external_reporting {
            callbacks.add(ProgressCallback::new(args.logging_steps));
        }
        Self { env, args, callbacks }
    }

    /// Add a trainer callback
    pub fn add_callback<C: TrainerCallback + 'static>(&mut self, callback: C) {
        self.callbacks.add(callback);
    }

    pub fn with_callback<C: TrainerCallback + 'static>(mut self, callback: C) -> Self {
        self.add_callback(callback);
        self
    }

    pub fn env(&self) -> &RunEnvironment {
        &self.env
    }

    pub fn args(&self) -> &TrainingArgs {
        &self.args
    }

    pub fn callbacks(&self) -> &CallbackManager {
        &self.callbacks
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("env", &self.env)
            .field("args", &self.args)
            .field("callbacks", &self.callbacks.names())
            .finish()
    }
}
