/*!
 * Logging Module
 * Centralized logging configuration and request logging middleware
 */
pub mod config;
pub mod middleware;

pub use config::LogConfig;

use std::io;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing::Subscriber;
use tracing_subscriber::{filter::LevelFilter, fmt, layer::SubscriberExt, EnvFilter, Layer};

/// Boxed subscriber so both environment stacks have one type.
pub type BoxedSubscriber = Box<dyn Subscriber + Send + Sync>;

/// Initialize the logging system.
///
/// The returned guards flush the background writers when dropped, so the
/// caller must keep them alive for as long as the process runs.
pub fn init(config: &LogConfig) -> Vec<WorkerGuard> {
    let (subscriber, guards) = build_subscriber(config);
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("logging already initialized: {}", e);
    }

    tracing::info!(
        environment = %config.environment,
        directory = %config.directory.display(),
        "Logging initialized"
    );

    guards
}

/// File, error-file and console layers for `config`, not yet installed.
pub fn build_subscriber(config: &LogConfig) -> (BoxedSubscriber, Vec<WorkerGuard>) {
    if let Err(e) = std::fs::create_dir_all(&config.directory) {
        eprintln!(
            "cannot create log directory {}: {}",
            config.directory.display(),
            e
        );
    }

    // All logs
    let (file_writer, file_guard) = non_blocking(rolling::daily(&config.directory, "app.log"));
    // Errors only
    let (error_writer, error_guard) = non_blocking(rolling::daily(&config.directory, "error.log"));
    let (console_writer, console_guard) = non_blocking(io::stdout());

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter_directive()));

    // Errors only, JSON in every environment
    let error_layer = fmt::layer()
        .json()
        .with_writer(error_writer)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(LevelFilter::ERROR);

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(error_layer);

    let subscriber: BoxedSubscriber = if config.is_production() {
        let file_layer = fmt::layer()
            .json()
            .with_writer(file_writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        let console_layer = fmt::layer()
            .json()
            .with_writer(console_writer)
            .with_target(false);

        Box::new(subscriber.with(file_layer).with(console_layer))
    } else {
        let file_layer = fmt::layer()
            .with_writer(file_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false);

        let console_layer = fmt::layer()
            .with_writer(console_writer)
            .with_target(true)
            .pretty();

        Box::new(subscriber.with(file_layer).with(console_layer))
    };

    (subscriber, vec![file_guard, error_guard, console_guard])
}
