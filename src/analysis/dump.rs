//! Writing analysis graphs to `.dot` files.
//!
//! [`GraphDumper`] renders the control flow graph, post-dominator tree and
//! control dependence graph of a method into one file each:
//!
//! - `<prefix><name>.cfg.dot`
//! - `<prefix><name>.dom.dot`
//! - `<prefix><name>.cdg.dot`
//!
//! Method names are turned into file names by replacing `;`, `/`, `\`, `<` and
//! `>` with `_`, and path separators in the prefix become `_` as well. An I/O
//! failure aborts only the dump it happened in.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{analysis::MethodAnalysis, Error, Result};

/// Replaces the characters of a method signature that are unsafe in file names.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            ';' | '/' | '\\' | '<' | '>' => '_',
            c => c,
        })
        .collect()
}

/// Writes per-method graphs in DOT format into a directory.
///
/// # Examples
///
/// ```rust
/// use dexscope::{
///     analysis::{GraphDumper, MethodAnalysis},
///     code::{AnalyzedInstruction, Opcode},
/// };
///
/// # let out = tempfile::tempdir()?;
/// let method = MethodAnalysis::new(
///     "Lcom/example/A;->f()V",
///     vec![AnalyzedInstruction::builder(0, Opcode::RETURN_VOID).build()?],
/// );
/// let dumper = GraphDumper::new(out.path());
/// let written = dumper.dump(&method)?;
/// assert_eq!(written[0], out.path().join("Lcom_example_A_-_f()V.cfg.dot"));
/// # Ok::<(), dexscope::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphDumper {
    /// Output directory, created on first dump if missing
    pub dir: PathBuf,
    /// Prepended to every file name
    pub prefix: String,
    /// Write `<name>.cfg.dot`
    pub dump_cfg: bool,
    /// Write `<name>.dom.dot` (post-dominator tree)
    pub dump_dom: bool,
    /// Write `<name>.cdg.dot`
    pub dump_cdg: bool,
    /// Dump the graph variants with uncaught-exception edges
    pub include_exceptions: bool,
}

impl GraphDumper {
    /// A dumper writing all three graphs, without uncaught-exception edges, into `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        GraphDumper {
            dir: dir.into(),
            prefix: String::new(),
            dump_cfg: true,
            dump_dom: true,
            dump_cdg: true,
            include_exceptions: false,
        }
    }

    /// Sets the file name prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Dumps the graph variants with uncaught-exception edges.
    #[must_use]
    pub fn with_exceptions(mut self, include: bool) -> Self {
        self.include_exceptions = include;
        self
    }

    /// The path of the file with `extension` for the method `name`.
    #[must_use]
    pub fn path_for(&self, name: &str, extension: &str) -> PathBuf {
        let prefix: String = self
            .prefix
            .chars()
            .map(|c| if c == '/' || std::path::is_separator(c) { '_' } else { c })
            .collect();
        self.dir
            .join(format!("{prefix}{}.{extension}", sanitize_file_name(name)))
    }

    /// Writes the enabled graphs of `method` and returns the written paths.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileError`] if the output directory cannot be created,
    /// exists but is not a directory, or a file cannot be written. Analysis
    /// failures of the method are returned as they are.
    pub fn dump(&self, method: &MethodAnalysis) -> Result<Vec<PathBuf>> {
        if !(self.dump_cfg || self.dump_dom || self.dump_cdg) {
            return Ok(Vec::new());
        }
        self.prepare_dir()?;

        let include = self.include_exceptions;
        let cfg = method.cfg(include)?;
        let mut written = Vec::new();

        if self.dump_cfg {
            written.push(self.write(method.name(), "cfg.dot", &cfg.to_dot())?);
        }
        if self.dump_dom {
            let dot = method
                .post_dominators(include)?
                .to_dot(Some(cfg.name()), |node| cfg.label(node));
            written.push(self.write(method.name(), "dom.dot", &dot)?);
        }
        if self.dump_cdg {
            let dot = method.cdg(include)?.to_dot(|node| cfg.label(node));
            written.push(self.write(method.name(), "cdg.dot", &dot)?);
        }

        debug!(method = method.name(), files = written.len(), "dumped graphs");
        Ok(written)
    }

    fn prepare_dir(&self) -> Result<()> {
        if self.dir.exists() && !self.dir.is_dir() {
            return Err(Error::FileError(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("{} exists and is not a directory", self.dir.display()),
            )));
        }
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    fn write(&self, name: &str, extension: &str, contents: &str) -> Result<PathBuf> {
        let path = self.path_for(name, extension);
        write_dot(&path, contents)?;
        Ok(path)
    }
}

/// Writes `dot` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`Error::FileError`] on any I/O failure.
pub fn write_dot(path: &Path, dot: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, dot)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::diamond_method;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(
            sanitize_file_name("Lcom/example/A;-><init>()V"),
            "Lcom_example_A_-__init_()V"
        );
        assert_eq!(sanitize_file_name(r"a\b"), "a_b");
    }

    #[test]
    fn test_dump_writes_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("graphs");
        let dumper = GraphDumper::new(&out).with_prefix("t_");
        let method = MethodAnalysis::new("La;->f()V", diamond_method());

        let written = dumper.dump(&method).unwrap();
        assert_eq!(
            written,
            vec![
                out.join("t_La_-_f()V.cfg.dot"),
                out.join("t_La_-_f()V.dom.dot"),
                out.join("t_La_-_f()V.cdg.dot"),
            ]
        );

        let cfg = fs::read_to_string(&written[0]).unwrap();
        assert!(cfg.starts_with("digraph CFG {"));
        let cdg = fs::read_to_string(&written[2]).unwrap();
        assert!(cdg.contains("CD"));
    }

    #[test]
    fn test_dump_selected_graphs() {
        let dir = tempfile::tempdir().unwrap();
        let mut dumper = GraphDumper::new(dir.path());
        dumper.dump_dom = false;
        dumper.dump_cdg = false;
        let method = MethodAnalysis::new("m", diamond_method());

        let written = dumper.with_exceptions(true).dump(&method).unwrap();
        assert_eq!(written, vec![dir.path().join("m.cfg.dot")]);
        assert!(method.is_cached(true));
    }

    #[test]
    fn test_nothing_selected() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("unused");
        let mut dumper = GraphDumper::new(&out);
        dumper.dump_cfg = false;
        dumper.dump_dom = false;
        dumper.dump_cdg = false;
        let method = MethodAnalysis::new("m", diamond_method());

        assert!(dumper.dump(&method).unwrap().is_empty());
        assert!(!out.exists());
        assert!(!method.is_cached(false));
    }

    #[test]
    fn test_separator_in_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let dumper = GraphDumper::new(dir.path()).with_prefix("a/b_");
        let method = MethodAnalysis::new("m", diamond_method());

        let written = dumper.dump(&method).unwrap();
        assert_eq!(written[0], dir.path().join("a_b_m.cfg.dot"));
        assert!(written.iter().all(|path| path.is_file()));
    }

    #[test]
    fn test_file_in_place_of_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("taken");
        fs::write(&file, "x").unwrap();

        let dumper = GraphDumper::new(&file);
        let method = MethodAnalysis::new("m", diamond_method());
        assert!(matches!(dumper.dump(&method), Err(Error::FileError(_))));
    }

    #[test]
    fn test_write_dot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("g.dot");
        write_dot(&path, "digraph G {}\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "digraph G {}\n");
    }
}
