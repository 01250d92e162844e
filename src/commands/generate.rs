//! Generate static files

use anyhow::Result;
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode, DebouncedEvent};
use std::path::Path;
use std::sync::mpsc::channel;
use std::time::Duration;

use crate::generator::Generator;
use crate::{Blog, CONFIG_FILE};

/// Quiet period before a burst of file events triggers a rebuild
const DEBOUNCE: Duration = Duration::from_millis(500);

/// Generate the static site
pub fn run(blog: &Blog) -> Result<()> {
    let start = std::time::Instant::now();

    let report = Generator::new(blog)?.generate()?;

    tracing::info!(
        "Listed {} posts, wrote {} article pages, copied {} assets",
        report.posts_listed,
        report.pages_written,
        report.assets_copied
    );
    if report.pages_failed > 0 {
        tracing::warn!("{} posts failed to render", report.pages_failed);
    }

    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(())
}

/// Watch for file changes and regenerate
pub async fn watch(blog: &Blog) -> Result<()> {
    let blog = blog.clone();
    tokio::task::spawn_blocking(move || watch_blocking(&blog)).await?
}

fn watch_blocking(blog: &Blog) -> Result<()> {
    let (tx, rx) = channel();
    let mut debouncer = new_debouncer(DEBOUNCE, tx)?;

    if blog.content_dir.exists() {
        debouncer
            .watcher()
            .watch(&blog.content_dir, RecursiveMode::Recursive)?;
    }
    if blog.static_dir.exists() {
        debouncer
            .watcher()
            .watch(&blog.static_dir, RecursiveMode::Recursive)?;
    }
    let config_path = blog.base_dir.join(CONFIG_FILE);
    if config_path.exists() {
        debouncer
            .watcher()
            .watch(&config_path, RecursiveMode::NonRecursive)?;
    }

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                if !needs_rebuild(&events, &blog.public_dir) {
                    continue;
                }
                tracing::info!("File changed, regenerating...");
                // the config may have changed too
                let result = Blog::new(&blog.base_dir).and_then(|blog| run(&blog));
                if let Err(e) = result {
                    tracing::error!("Generation failed: {:#}", e);
                }
            }
            Ok(Err(e)) => {
                tracing::error!("Watch error: {:?}", e);
            }
            Err(_) => break,
        }
    }

    Ok(())
}

/// Whether a debounced batch holds a change worth rebuilding for
pub(crate) fn needs_rebuild(events: &[DebouncedEvent], public_dir: &Path) -> bool {
    events.iter().any(|event| {
        let path_str = event.path.to_string_lossy();
        !event.path.starts_with(public_dir)
            && !path_str.contains(".DS_Store")
            && !path_str.ends_with('~')
    })
}
