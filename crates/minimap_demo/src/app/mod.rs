pub(crate) mod args;
pub(crate) mod bootstrap;
pub(crate) mod headless;
pub(crate) mod loop_runner;
pub(crate) mod scenario;
pub(crate) mod scene;
