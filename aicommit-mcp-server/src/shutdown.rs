// aicommit-mcp-server/src/shutdown.rs

//! Shutdown hooks run once by the server's stop routine.

use tracing::debug;

type Hook = Box<dyn FnOnce() + Send>;

#[derive(Default)]
pub struct ShutdownHooks {
    hooks: Vec<(String, Hook)>,
}

impl ShutdownHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, hook: impl FnOnce() + Send + 'static) {
        self.hooks.push((name.into(), Box::new(hook)));
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Runs every hook in registration order.
    pub fn run(self) {
        for (name, hook) in self.hooks {
            debug!(hook = %name, "Running shutdown hook");
            hook();
        }
    }
}
