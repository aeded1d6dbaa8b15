//! Persona context assembled from local text files.
//!
//! The files are re-read at startup and on the reload command. A missing or
//! unreadable file degrades persona fidelity but must never take the bot
//! offline, so failures are logged and the remaining files still contribute.

use std::fs;
use std::path::PathBuf;

#[derive(Debug)]
pub struct StaticContext {
    sources: Vec<PathBuf>,
    current: String,
}

impl StaticContext {
    /// Build the context holder and perform the initial load.
    pub fn load(sources: &[String]) -> Self {
        let mut ctx = Self {
            sources: sources.iter().map(PathBuf::from).collect(),
            current: String::new(),
        };
        ctx.reload();
        ctx
    }

    /// Re-read every source file and replace the current context string.
    ///
    /// Best-effort: unreadable sources are skipped, the readable ones are
    /// concatenated in their configured order, each preceded by a newline.
    pub fn reload(&mut self) -> &str {
        let mut new_context = String::new();
        let mut loaded = 0usize;

        for path in &self.sources {
            match fs::read_to_string(path) {
                Ok(contents) => {
                    new_context.push('\n');
                    new_context.push_str(&contents);
                    loaded += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to read context file {:?}: {}", path, e);
                }
            }
        }

        if loaded == self.sources.len() {
            tracing::info!("Reloaded {} context file(s)", loaded);
        } else {
            tracing::warn!(
                "Reloaded context with {}/{} file(s); continuing with partial context",
                loaded,
                self.sources.len()
            );
        }

        self.current = new_context;
        &self.current
    }

    /// The context string as of the last reload.
    pub fn current(&self) -> &str {
        &self.current
    }

    #[cfg(test)]
    pub fn source_paths(&self) -> &[PathBuf] {
        &self.sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> String {
        let path = dir.path().join(name);
        let mut f = fs::File::create(&path).unwrap();
        write!(f, "{}", contents).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn concatenates_sources_in_configured_order() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "contexto.txt", "base");
        let b = write_file(&dir, "ref1.txt", "referencia");

        let ctx = StaticContext::load(&[a, b]);
        assert_eq!(ctx.current(), "\nbase\nreferencia");
    }

    #[test]
    fn reload_is_idempotent_for_unchanged_sources() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "contexto.txt", "hola");

        let mut ctx = StaticContext::load(&[a]);
        let first = ctx.current().to_string();
        let second = ctx.reload().to_string();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_source_is_skipped_and_order_preserved() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a.txt", "primero");
        let missing = dir
            .path()
            .join("no_existe.txt")
            .to_string_lossy()
            .into_owned();
        let c = write_file(&dir, "c.txt", "tercero");

        let ctx = StaticContext::load(&[a, missing, c]);
        assert_eq!(ctx.current(), "\nprimero\ntercero");
    }

    #[test]
    fn all_sources_missing_yields_empty_context() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nada.txt").to_string_lossy().into_owned();

        let ctx = StaticContext::load(&[missing]);
        assert_eq!(ctx.current(), "");
        assert_eq!(ctx.source_paths().len(), 1);
    }

    #[test]
    fn reload_picks_up_changed_contents() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "contexto.txt", "antes");

        let mut ctx = StaticContext::load(&[a.clone()]);
        assert_eq!(ctx.current(), "\nantes");

        fs::write(&a, "despues").unwrap();
        ctx.reload();
        assert_eq!(ctx.current(), "\ndespues");
    }
}
